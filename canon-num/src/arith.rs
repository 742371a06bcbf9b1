//! Total binary arithmetic over the numeric tower.
//!
//! Every operation accepts any two tower members. Operands are first classified into a coercion
//! class (exact, machine float, decimal, complex) and the operation runs in the *lowest* class
//! that captures the result exactly:
//!
//! - exact `op` exact stays exact, promoting machine pairs to big rationals on overflow;
//! - exact `op` machine float runs in machine floats;
//! - anything `op` decimal runs in arbitrary-precision decimals;
//! - anything `op` complex runs in complex, and a provably-zero imaginary part collapses back
//!   out on canonicalization.
//!
//! Division by an exact zero produces the signed-infinity / NaN sentinels; nothing here panics
//! or wraps.

use rug::{ops::Pow, Integer, Rational};
use std::cmp::Ordering;
use super::primitive::{complex, float, int};
use super::value::Numeric;

/// The default tolerance used by [`chop`] to absorb floating-point noise.
pub const CHOP_TOLERANCE: f64 = 1e-10;

/// The coercion class of a pair of operands, in promotion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    Exact,
    MachineFloat,
    Decimal,
    Complex,
}

fn class_of(n: &Numeric) -> Class {
    match n {
        Numeric::Int(_) | Numeric::Rational(_, _) | Numeric::BigRational(_) => Class::Exact,
        Numeric::Float(_) => Class::MachineFloat,
        Numeric::Decimal(_) => Class::Decimal,
        Numeric::Complex(_) => Class::Complex,
    }
}

fn common_class(a: &Numeric, b: &Numeric) -> Class {
    class_of(a).max(class_of(b))
}

/// Adds two values.
pub fn add(a: &Numeric, b: &Numeric) -> Numeric {
    match common_class(a, b) {
        Class::Exact => {
            if let (Numeric::Int(x), Numeric::Int(y)) = (a, b) {
                if let Some(sum) = x.checked_add(*y) {
                    return Numeric::Int(sum);
                }
            }
            exact_rational(a) // overflow or non-integer operands take the big path
                .map(|x| Numeric::from(x + exact_rational(b).unwrap()))
                .unwrap()
        },
        Class::MachineFloat => Numeric::Float(machine(a) + machine(b)),
        Class::Decimal => Numeric::Decimal(a.to_decimal() + b.to_decimal()),
        Class::Complex => Numeric::from(a.to_complex() + b.to_complex()),
    }
}

/// Subtracts `b` from `a`.
pub fn sub(a: &Numeric, b: &Numeric) -> Numeric {
    add(a, &neg(b))
}

/// Multiplies two values.
pub fn mul(a: &Numeric, b: &Numeric) -> Numeric {
    match common_class(a, b) {
        Class::Exact => {
            if let (Numeric::Int(x), Numeric::Int(y)) = (a, b) {
                if let Some(product) = x.checked_mul(*y) {
                    return Numeric::Int(product);
                }
            }
            exact_rational(a)
                .map(|x| Numeric::from(x * exact_rational(b).unwrap()))
                .unwrap()
        },
        Class::MachineFloat => Numeric::Float(machine(a) * machine(b)),
        Class::Decimal => Numeric::Decimal(a.to_decimal() * b.to_decimal()),
        Class::Complex => Numeric::from(a.to_complex() * b.to_complex()),
    }
}

/// Divides `a` by `b`.
///
/// Division of an exact value by the exact zero yields the signed-infinity sentinel (NaN for
/// `0/0`). Complex division by exact zero yields a complex whose parts are NaN; the engine maps
/// that to its `ComplexInfinity` symbol.
pub fn div(a: &Numeric, b: &Numeric) -> Numeric {
    if b.is_zero() && b.is_exact() {
        return match a {
            Numeric::Complex(_) => {
                Numeric::complex_unchecked(complex((f64::NAN, f64::NAN)))
            },
            _ if a.is_zero() => Numeric::Float(f64::NAN),
            _ => match a.sign() {
                Some(super::Sign::Negative) => Numeric::Float(f64::NEG_INFINITY),
                _ => Numeric::Float(f64::INFINITY),
            },
        };
    }

    match common_class(a, b) {
        Class::Exact => exact_rational(a)
            .map(|x| Numeric::from(x / exact_rational(b).unwrap()))
            .unwrap(),
        Class::MachineFloat => Numeric::Float(machine(a) / machine(b)),
        Class::Decimal => Numeric::Decimal(a.to_decimal() / b.to_decimal()),
        Class::Complex => Numeric::from(a.to_complex() / b.to_complex()),
    }
}

/// Negates a value, staying in its representation.
pub fn neg(a: &Numeric) -> Numeric {
    match a {
        Numeric::Int(n) => match n.checked_neg() {
            Some(n) => Numeric::Int(n),
            None => Numeric::from(-int(*n)),
        },
        Numeric::Float(n) => Numeric::Float(-n),
        Numeric::Rational(n, d) => match n.checked_neg() {
            Some(n) => Numeric::Rational(n, *d),
            None => Numeric::from(-Rational::from((*n, *d))),
        },
        Numeric::BigRational(r) => Numeric::BigRational(Rational::from(-r)),
        Numeric::Decimal(f) => Numeric::Decimal(float(-f)),
        Numeric::Complex(c) => Numeric::Complex(complex(-c)),
    }
}

/// The absolute value.
pub fn abs(a: &Numeric) -> Numeric {
    match a {
        Numeric::Complex(c) => Numeric::Decimal(complex(c.abs_ref()).into_real_imag().0).canonical(),
        _ => match a.sign() {
            Some(super::Sign::Negative) => neg(a),
            _ => a.clone(),
        },
    }
}

/// Raises `a` to the power `b`.
///
/// Exact bases raised to machine-integer exponents stay exact. Everything else runs through the
/// complex power, which is total; the result collapses back to a real representation when the
/// imaginary part is provably zero.
pub fn pow(a: &Numeric, b: &Numeric) -> Numeric {
    if let Some(exp) = b.as_i64() {
        if a.is_exact() {
            return exact_pow(a, exp);
        }
    }

    // a negative real base with a fractional exponent leaves the reals, so those operands
    // dispatch through complex and collapse afterwards
    let fractional_exp = match b {
        Numeric::Float(n) => n.fract() != 0.0,
        Numeric::Decimal(f) => !f.is_integer(),
        _ => !b.is_integer(),
    };

    match common_class(a, b) {
        _ if matches!(a.sign(), Some(super::Sign::Negative)) && fractional_exp => {
            Numeric::from(a.to_complex().pow(b.to_complex())).canonical()
        },
        Class::Complex => Numeric::from(a.to_complex().pow(b.to_complex())).canonical(),
        Class::Decimal | Class::Exact => {
            Numeric::Decimal(a.to_decimal().pow(b.to_decimal()))
        },
        Class::MachineFloat => Numeric::Float(machine(a).powf(machine(b))),
    }
}

fn exact_pow(a: &Numeric, exp: i64) -> Numeric {
    if exp == 0 {
        return if a.is_zero() {
            // 0^0 is indeterminate
            Numeric::Float(f64::NAN)
        } else {
            Numeric::Int(1)
        };
    }

    if a.is_zero() && exp < 0 {
        return Numeric::Float(f64::INFINITY);
    }

    let r = a.to_rational().unwrap();
    let (mut numer, mut denom) = r.into_numer_denom();
    if exp < 0 {
        std::mem::swap(&mut numer, &mut denom);
    }

    let exp = exp.unsigned_abs();
    match u32::try_from(exp) {
        Ok(exp) => {
            let powered = Rational::from((numer.pow(exp), denom.pow(exp)));
            Numeric::from(powered)
        },
        // an exponent beyond u32 would allocate an astronomically large exact result; fall back
        // to the decimal approximation
        Err(_) => Numeric::Decimal(
            (float(numer) / float(denom)).pow(float(exp)),
        ),
    }
}

/// Compares two values numerically. Complex values with a nonzero imaginary part are unordered
/// relative to everything, as are NaNs.
pub fn try_cmp(a: &Numeric, b: &Numeric) -> Option<Ordering> {
    match (a, b) {
        (Numeric::Complex(_), _) | (_, Numeric::Complex(_)) => {
            if a == b {
                Some(Ordering::Equal)
            } else {
                None
            }
        },
        _ => {
            if a.is_exact() && b.is_exact() {
                return Some(a.to_rational().unwrap().cmp(&b.to_rational().unwrap()));
            }
            a.to_decimal().partial_cmp(&b.to_decimal())
        },
    }
}

/// Rounds floating-point noise to zero: any approximate component smaller in magnitude than
/// `tol` becomes an exact zero. Used by approximate ("N") evaluation before zero-comparison.
pub fn chop(a: &Numeric, tol: f64) -> Numeric {
    match a {
        Numeric::Float(n) if n.abs() < tol => Numeric::Float(0.0),
        Numeric::Decimal(f) if f.clone().abs() < tol => Numeric::Decimal(float(0)),
        Numeric::Complex(c) => {
            let (re, im) = c.clone().into_real_imag();
            let re = if float(re.abs_ref()) < tol { float(0) } else { re };
            let im = if float(im.abs_ref()) < tol { float(0) } else { im };
            Numeric::from(complex((re, im)))
        },
        _ => a.clone(),
    }
}

/// Converts any real operand to a machine float.
fn machine(a: &Numeric) -> f64 {
    match a {
        Numeric::Int(n) => *n as f64,
        Numeric::Float(n) => *n,
        Numeric::Rational(n, d) => *n as f64 / *d as f64,
        Numeric::BigRational(r) => r.to_f64(),
        Numeric::Decimal(f) => f.to_f64(),
        Numeric::Complex(c) => c.real().to_f64(),
    }
}

fn exact_rational(a: &Numeric) -> Option<Rational> {
    a.to_rational()
}

/// Exact factorial of a non-negative machine integer, promoting to a big integer as it grows.
pub fn factorial(n: u64) -> Integer {
    let mut result = int(1);
    let mut k = int(n);
    while k > 1 {
        result *= &k;
        k -= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use assert_float_eq::{
        afe_abs,
        afe_absolute_error_msg,
        afe_is_absolute_eq,
        assert_float_absolute_eq,
    };
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn rational_addition_is_exact() {
        // add(a/b, c/d) == (ad + bc) / bd, cross-checked against rug
        let cases = [(1i64, 3i64, 1i64, 6i64), (2, 7, 3, 5), (-4, 9, 5, 12), (7, 2, -7, 2)];
        for (a, b, c, d) in cases {
            let lhs = add(&Numeric::rational(a, b), &Numeric::rational(c, d));
            let expected = Rational::from((a, b)) + Rational::from((c, d));
            assert_eq!(lhs.to_rational().unwrap(), expected);
        }
    }

    #[test]
    fn rational_sum_collapses_to_integer() {
        let sum = add(&Numeric::rational(1, 2), &Numeric::rational(1, 2));
        assert_eq!(sum, Numeric::Int(1));
    }

    #[test]
    fn machine_overflow_promotes() {
        let sum = add(&Numeric::Int(i64::MAX), &Numeric::Int(1));
        assert_eq!(sum.as_integer().unwrap(), int(i64::MAX) + 1);

        let product = mul(&Numeric::Int(i64::MAX), &Numeric::Int(2));
        assert_eq!(product.as_integer().unwrap(), int(i64::MAX) * 2);
    }

    #[test]
    fn rational_times_decimal_is_decimal() {
        let product = mul(&Numeric::rational(1, 2), &Numeric::Decimal(float(4)));
        assert_eq!(product, Numeric::Decimal(float(2)));
    }

    #[test]
    fn rational_times_machine_float_is_machine_float() {
        let product = mul(&Numeric::rational(1, 2), &Numeric::Float(4.0));
        assert_eq!(product, Numeric::Float(2.0));
    }

    #[test]
    fn division_by_exact_zero() {
        assert_eq!(div(&Numeric::Int(3), &Numeric::Int(0)), Numeric::Float(f64::INFINITY));
        assert_eq!(div(&Numeric::Int(-3), &Numeric::Int(0)), Numeric::Float(f64::NEG_INFINITY));
        assert!(div(&Numeric::Int(0), &Numeric::Int(0)).is_nan());
    }

    #[test]
    fn exact_division() {
        assert_eq!(div(&Numeric::Int(10), &Numeric::Int(4)), Numeric::Rational(5, 2));
        assert_eq!(div(&Numeric::Int(10), &Numeric::Int(5)), Numeric::Int(2));
    }

    #[test]
    fn integer_power_stays_exact() {
        assert_eq!(pow(&Numeric::Int(2), &Numeric::Int(10)), Numeric::Int(1024));
        assert_eq!(
            pow(&Numeric::rational(2, 3), &Numeric::Int(-2)),
            Numeric::Rational(9, 4),
        );
        assert_eq!(
            pow(&Numeric::Int(2), &Numeric::Int(100)).as_integer().unwrap(),
            int(2).pow(100),
        );
    }

    #[test]
    fn zero_to_the_zero_is_nan() {
        assert!(pow(&Numeric::Int(0), &Numeric::Int(0)).is_nan());
    }

    #[test]
    fn negative_base_fractional_exponent_promotes_to_complex() {
        let result = pow(&Numeric::Int(-1), &Numeric::rational(1, 2));
        match result {
            Numeric::Complex(c) => {
                assert_float_absolute_eq!(c.real().to_f64(), 0.0, 1e-30);
                assert_float_absolute_eq!(c.imag().to_f64(), 1.0, 1e-30);
            },
            other => panic!("expected complex, got {:?}", other),
        }
    }

    #[test]
    fn comparison_across_representations() {
        assert_eq!(try_cmp(&Numeric::rational(1, 2), &Numeric::Float(0.75)), Some(Ordering::Less));
        assert_eq!(try_cmp(&Numeric::Int(2), &Numeric::rational(7, 3)), Some(Ordering::Less));
        assert_eq!(try_cmp(&Numeric::Int(2), &Numeric::Decimal(float(2))), Some(Ordering::Equal));
        assert_eq!(try_cmp(&Numeric::Float(f64::NAN), &Numeric::Int(0)), None);
    }

    #[test]
    fn chop_absorbs_noise() {
        assert_eq!(chop(&Numeric::Float(1e-12), CHOP_TOLERANCE), Numeric::Float(0.0));
        assert_eq!(chop(&Numeric::Float(0.1), CHOP_TOLERANCE), Numeric::Float(0.1));
    }

    #[test]
    fn factorial_exact() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(factorial(25), int(15511210043330985984000000u128));
    }
}
