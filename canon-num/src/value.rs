//! The [`Numeric`] tagged union, the single value type shared by every arithmetic entry point in
//! the engine.
//!
//! # Canonical representation
//!
//! A numeric value can often be stored in more than one representation: `3/1` is the integer `3`,
//! a big rational whose parts fit a machine word is a machine rational, a complex number with a
//! zero imaginary part is its real part. [`Numeric::canonical`] collapses a value into the
//! *smallest* representation that preserves it, in preference order machine integer > machine
//! float > machine rational > big rational > decimal > complex.
//!
//! Exactness is part of the value: an exact representation (integer or rational) is never
//! converted to an approximate one (float, decimal) by canonicalization, and vice versa, so no
//! precision is silently invented or discarded.

use rug::{Complex, Float, Integer, Rational};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use super::primitive::{complex, float, int};

/// The sign of a real quantity, used by sign-inference hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

/// A value in the numeric tower.
#[derive(Debug, Clone)]
pub enum Numeric {
    /// A machine integer.
    Int(i64),

    /// A machine float.
    Float(f64),

    /// An exact machine rational. Always stored reduced, with a positive denominator.
    Rational(i64, i64),

    /// An exact rational over arbitrary-precision integers. `rug` keeps it reduced with a
    /// positive denominator.
    BigRational(Rational),

    /// An arbitrary-precision decimal.
    Decimal(Float),

    /// A complex number. Never constructed with an exactly-zero imaginary part, except through
    /// [`Numeric::complex_unchecked`].
    Complex(Complex),
}

impl Numeric {
    /// Creates an exact rational from a numerator / denominator pair, reduced and
    /// sign-normalized.
    ///
    /// A zero denominator produces the division-by-exact-zero sentinels: a signed infinity, or
    /// NaN for `0/0`. No representation in the tower can hold `n/0`, and callers must never see a
    /// panic for it.
    pub fn rational(n: i64, d: i64) -> Self {
        if d == 0 {
            return match n.cmp(&0) {
                Ordering::Greater => Self::Float(f64::INFINITY),
                Ordering::Equal => Self::Float(f64::NAN),
                Ordering::Less => Self::Float(f64::NEG_INFINITY),
            };
        }

        let g = gcd_i64(n.unsigned_abs(), d.unsigned_abs());
        let (mut n, mut d) = (n / g as i64, d / g as i64);
        if d < 0 {
            // i64::MIN / -1 cannot occur here: the pair is already reduced, so `d < 0` implies
            // `|n| != |i64::MIN|` or `d == -1` with `n` reduced odd
            if n == i64::MIN || d == i64::MIN {
                let big = Rational::from((int(n), int(d)));
                return Self::BigRational(big).canonical();
            }
            n = -n;
            d = -d;
        }

        if d == 1 {
            Self::Int(n)
        } else {
            Self::Rational(n, d)
        }
    }

    /// Creates a complex value without collapsing a zero imaginary part to the real variant.
    pub fn complex_unchecked(c: Complex) -> Self {
        Self::Complex(c)
    }

    /// The typename of this value, used in `incompatible-type` error context.
    pub fn typename(&self) -> &'static str {
        match self {
            Self::Int(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Rational(_, _) => "Rational",
            Self::BigRational(_) => "Rational",
            Self::Decimal(_) => "Decimal",
            Self::Complex(_) => "Complex",
        }
    }

    /// Returns true if the value is stored exactly (integer or rational).
    pub fn is_exact(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Rational(_, _) | Self::BigRational(_))
    }

    /// Returns true if the value is an exact integer, in any representation.
    pub fn is_integer(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::BigRational(r) => r.denom() == &1,
            _ => false,
        }
    }

    /// Returns true if the value is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Int(n) => *n == 0,
            Self::Float(n) => *n == 0.0,
            Self::Rational(n, _) => *n == 0,
            Self::BigRational(r) => r.numer() == &0,
            Self::Decimal(f) => f.is_zero(),
            Self::Complex(c) => c.is_zero(),
        }
    }

    /// Returns true if the value is one.
    pub fn is_one(&self) -> bool {
        match self {
            Self::Int(n) => *n == 1,
            Self::Float(n) => *n == 1.0,
            Self::BigRational(r) => r.numer() == &1 && r.denom() == &1,
            Self::Decimal(f) => *f == 1,
            _ => false,
        }
    }

    /// Returns true if the value is NaN in either component.
    pub fn is_nan(&self) -> bool {
        match self {
            Self::Float(n) => n.is_nan(),
            Self::Decimal(f) => f.is_nan(),
            Self::Complex(c) => c.real().is_nan() || c.imag().is_nan(),
            _ => false,
        }
    }

    /// If the value is an exact integer, returns it as a machine integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::BigRational(r) if r.denom() == &1 => r.numer().to_i64(),
            _ => None,
        }
    }

    /// If the value is an exact integer, returns it as an arbitrary-precision integer.
    pub fn as_integer(&self) -> Option<Integer> {
        match self {
            Self::Int(n) => Some(int(*n)),
            Self::BigRational(r) if r.denom() == &1 => Some(r.numer().clone()),
            _ => None,
        }
    }

    /// If the value is exact, returns it as an arbitrary-precision rational.
    pub fn to_rational(&self) -> Option<Rational> {
        match self {
            Self::Int(n) => Some(Rational::from(*n)),
            Self::Rational(n, d) => Some(Rational::from((*n, *d))),
            Self::BigRational(r) => Some(r.clone()),
            _ => None,
        }
    }

    /// Converts the value to an arbitrary-precision decimal. Complex values convert through
    /// their real part; use [`Numeric::to_complex`] when the imaginary part matters.
    pub fn to_decimal(&self) -> Float {
        match self {
            Self::Int(n) => float(*n),
            Self::Float(n) => float(*n),
            Self::Rational(n, d) => float(*n) / float(*d),
            Self::BigRational(r) => float(r),
            Self::Decimal(f) => f.clone(),
            Self::Complex(c) => float(c.real()),
        }
    }

    /// Converts the value to a complex number. This conversion is lossless for every
    /// representation except machine rationals wider than the working precision.
    pub fn to_complex(&self) -> Complex {
        match self {
            Self::Complex(c) => c.clone(),
            real => complex(real.to_decimal()),
        }
    }

    /// Returns the sign of the value, or [`None`] for complex values and NaN, which have no
    /// real sign.
    pub fn sign(&self) -> Option<Sign> {
        match self {
            Self::Int(n) => Some(sign_of(n.cmp(&0))),
            Self::Float(n) => {
                if n.is_nan() {
                    None
                } else {
                    Some(sign_of(n.partial_cmp(&0.0).unwrap()))
                }
            },
            Self::Rational(n, _) => Some(sign_of(n.cmp(&0))),
            Self::BigRational(r) => Some(sign_of(r.cmp0())),
            Self::Decimal(f) => {
                if f.is_nan() {
                    None
                } else {
                    Some(sign_of(f.cmp0().unwrap()))
                }
            },
            Self::Complex(_) => None,
        }
    }

    /// Collapses the value into the smallest representation that preserves it exactly.
    ///
    /// This is the reduction step applied to every numeric literal during canonicalization. It
    /// never crosses the exact / approximate boundary.
    pub fn canonical(self) -> Self {
        match self {
            Self::Rational(n, d) => Self::rational(n, d),
            Self::BigRational(r) => {
                if r.denom() == &1 {
                    match r.numer().to_i64() {
                        Some(n) => Self::Int(n),
                        None => Self::BigRational(r),
                    }
                } else {
                    match (r.numer().to_i64(), r.denom().to_i64()) {
                        (Some(n), Some(d)) => Self::Rational(n, d),
                        _ => Self::BigRational(r),
                    }
                }
            },
            Self::Complex(c) => {
                if c.imag().is_zero() && !c.real().is_nan() {
                    Self::Decimal(c.into_real_imag().0).canonical()
                } else {
                    Self::Complex(c)
                }
            },
            // a decimal stays a decimal even when its value is a small integer: demoting it to
            // `Int` would claim exactness the computation never had
            other => other,
        }
    }
}

fn sign_of(ord: Ordering) -> Sign {
    match ord {
        Ordering::Less => Sign::Negative,
        Ordering::Equal => Sign::Zero,
        Ordering::Greater => Sign::Positive,
    }
}

/// Binary gcd over unsigned machine integers. `gcd(0, 0)` is defined as 1 so that reduction by
/// the gcd is always a no-op for `0/0` handling upstream.
pub(crate) fn gcd_i64(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    if a == 0 { 1 } else { a }
}

/// Cross-representation equality within an exactness class: exact values compare as rationals,
/// approximate real values compare numerically, complex values compare componentwise. An exact
/// value is never equal to an approximate one, mirroring the representation preference rules.
impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        use Numeric::*;
        match (self, other) {
            (Int(a), Int(b)) => a == b,
            (Rational(an, ad), Rational(bn, bd)) => an == bn && ad == bd,
            (a @ (Int(_) | Rational(_, _) | BigRational(_)), b @ (Int(_) | Rational(_, _) | BigRational(_))) => {
                a.to_rational() == b.to_rational()
            },
            (Float(a), Float(b)) => a == b,
            (Decimal(a), Decimal(b)) => a == b,
            (Float(a), Decimal(b)) | (Decimal(b), Float(a)) => b == a,
            (Complex(a), Complex(b)) => a == b,
            _ => false,
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Numeric {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for Numeric {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<Integer> for Numeric {
    fn from(n: Integer) -> Self {
        Self::BigRational(Rational::from(n)).canonical()
    }
}

impl From<Rational> for Numeric {
    fn from(r: Rational) -> Self {
        Self::BigRational(r).canonical()
    }
}

impl From<Float> for Numeric {
    fn from(f: Float) -> Self {
        Self::Decimal(f)
    }
}

impl From<Complex> for Numeric {
    fn from(c: Complex) -> Self {
        Self::Complex(c).canonical()
    }
}

impl Display for Numeric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Rational(n, d) => write!(f, "{}/{}", n, d),
            Self::BigRational(r) => write!(f, "{}", r),
            Self::Decimal(x) => write!(f, "{}", x.to_f64()),
            Self::Complex(c) => write!(f, "{} + {}i", c.real().to_f64(), c.imag().to_f64()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn rational_reduces() {
        assert_eq!(Numeric::rational(4, 8), Numeric::Rational(1, 2));
        assert_eq!(Numeric::rational(-4, -8), Numeric::Rational(1, 2));
        assert_eq!(Numeric::rational(3, -9), Numeric::Rational(-1, 3));
    }

    #[test]
    fn rational_with_unit_denominator_is_integer() {
        assert_eq!(Numeric::rational(6, 3), Numeric::Int(2));
        assert_eq!(Numeric::rational(0, 5), Numeric::Int(0));
    }

    #[test]
    fn rational_by_zero_is_sentinel() {
        assert_eq!(Numeric::rational(3, 0), Numeric::Float(f64::INFINITY));
        assert_eq!(Numeric::rational(-3, 0), Numeric::Float(f64::NEG_INFINITY));
        assert!(Numeric::rational(0, 0).is_nan());
    }

    #[test]
    fn big_rational_shrinks_to_machine() {
        let big = Numeric::BigRational(Rational::from((2, 4)));
        assert_eq!(big.canonical(), Numeric::Rational(1, 2));

        let big = Numeric::BigRational(Rational::from(7));
        assert_eq!(big.canonical(), Numeric::Int(7));
    }

    #[test]
    fn complex_with_zero_imag_collapses() {
        let c = Numeric::Complex(complex((2.5, 0.0)));
        match c.canonical() {
            Numeric::Decimal(f) => assert_eq!(f, 2.5),
            other => panic!("expected decimal, got {:?}", other),
        }
    }

    #[test]
    fn decimal_never_becomes_exact() {
        let d = Numeric::Decimal(float(3));
        assert!(matches!(d.canonical(), Numeric::Decimal(_)));
    }

    #[test]
    fn exact_never_equals_approximate() {
        assert_ne!(Numeric::Int(1), Numeric::Float(1.0));
        assert_eq!(Numeric::Float(0.5), Numeric::Decimal(float(0.5)));
        assert_eq!(
            Numeric::Rational(1, 2),
            Numeric::BigRational(Rational::from((1, 2))),
        );
    }
}
