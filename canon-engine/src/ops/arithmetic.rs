//! Arithmetic operators over the numeric tower: `Add`, `Subtract`, `Negate`, `Multiply`,
//! `Divide`, `Power`, `Sqrt`, `Root`, `Abs`, and `Sign`.
//!
//! Exactness is load-bearing throughout: an all-exact application folds to an exact literal or
//! stays symbolic, never to an approximation. `Sqrt` and `Root` of an exact integer extract the
//! largest perfect-power factor (`sqrt(75)` is `5 sqrt(3)`) and leave the rest under the
//! radical.

use canon_num::{arith, factor, Numeric, Sign};
use rug::Integer;
use crate::canonical::{canonical_variadic, canonicalize, canonicalize_ops};
use crate::ctxt::Context;
use crate::error::ErrorCode;
use crate::eval::sgn;
use crate::expr::{Expr, ExprKind};
use crate::scope::{OperatorAttrs, OperatorDef, Signature};
use crate::types::Type;
use crate::validate::check_arity;

pub(super) fn defs() -> Vec<(&'static str, OperatorDef)> {
    let variadic = OperatorAttrs {
        associative: true,
        commutative: true,
        pure: true,
        hold: false,
    };
    let pure = OperatorAttrs {
        pure: true,
        ..OperatorAttrs::default()
    };

    vec![
        (
            "Add",
            OperatorDef::new(Signature::variadic(Type::Number, Type::Number), variadic)
                .with_canonical(canonical_add)
                .with_evaluate(eval_add)
                .with_sgn(sgn_add),
        ),
        (
            "Subtract",
            OperatorDef::new(Signature::required(&[Type::Number, Type::Number], Type::Number), pure)
                .with_canonical(canonical_subtract),
        ),
        (
            "Negate",
            OperatorDef::new(Signature::required(&[Type::Number], Type::Number), pure)
                .with_canonical(canonical_negate)
                .with_sgn(sgn_negate),
        ),
        (
            "Multiply",
            OperatorDef::new(Signature::variadic(Type::Number, Type::Number), variadic)
                .with_canonical(canonical_multiply)
                .with_evaluate(eval_multiply)
                .with_sgn(sgn_multiply),
        ),
        (
            "Divide",
            OperatorDef::new(Signature::required(&[Type::Number, Type::Number], Type::Number), pure)
                .with_canonical(canonical_divide),
        ),
        (
            "Power",
            OperatorDef::new(Signature::required(&[Type::Number, Type::Number], Type::Number), pure)
                .with_canonical(canonical_power),
        ),
        (
            "Sqrt",
            OperatorDef::new(Signature::required(&[Type::Number], Type::Number), pure)
                .with_canonical(canonical_sqrt)
                .with_sgn(sgn_abs),
        ),
        (
            "Root",
            OperatorDef::new(Signature::required(&[Type::Number, Type::Integer], Type::Number), pure)
                .with_canonical(canonical_root),
        ),
        (
            "Abs",
            OperatorDef::new(Signature::required(&[Type::Number], Type::Number), pure)
                .with_evaluate(eval_abs)
                .with_sgn(sgn_abs),
        ),
        (
            "Sign",
            OperatorDef::new(Signature::required(&[Type::Number], Type::Integer), pure)
                .with_evaluate(eval_sign)
                .with_sgn(sgn_sign),
        ),
    ]
}

fn canonical_add(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    canonical_variadic(ctxt, "Add", ops, Numeric::Int(0), arith::add)
}

fn canonical_multiply(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    canonical_variadic(ctxt, "Multiply", ops, Numeric::Int(1), arith::mul)
}

fn canonical_subtract(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = check_arity(&ops, 2, ctxt.strict);
    if ops.len() != 2 {
        let ops = canonicalize_ops(ctxt, &ops);
        return Expr::into_canonical(ExprKind::Call("Subtract".to_string(), ops));
    }
    let b = ops.pop().unwrap();
    let a = ops.pop().unwrap();
    canonicalize(ctxt, &Expr::call("Add", vec![a, Expr::call("Negate", vec![b])]))
}

fn canonical_negate(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = check_arity(&ops, 1, ctxt.strict);
    if ops.len() != 1 {
        let ops = canonicalize_ops(ctxt, &ops);
        return Expr::into_canonical(ExprKind::Call("Negate".to_string(), ops));
    }
    let op = ops.pop().unwrap();
    canonicalize(ctxt, &Expr::call("Multiply", vec![Expr::num(-1), op]))
}

fn canonical_divide(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = check_arity(&ops, 2, ctxt.strict);
    if ops.len() != 2 {
        let ops = canonicalize_ops(ctxt, &ops);
        return Expr::into_canonical(ExprKind::Call("Divide".to_string(), ops));
    }
    let b = canonicalize(ctxt, &ops.pop().unwrap());
    let a = canonicalize(ctxt, &ops.pop().unwrap());

    if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
        // a complex numerator over an exact zero has no signed direction to diverge in
        if y.is_exact() && y.is_zero() && matches!(x, Numeric::Complex(_)) {
            return Expr::into_canonical(ExprKind::Symbol("ComplexInfinity".to_string()));
        }
        return Expr::into_canonical(ExprKind::Num(arith::div(x, y).canonical()));
    }

    // a / b rewrites to a * b^-1 so products over quotients share one normal form
    canonicalize(ctxt, &Expr::call("Multiply", vec![
        a,
        Expr::call("Power", vec![b, Expr::num(-1)]),
    ]))
}

fn canonical_power(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = check_arity(&ops, 2, ctxt.strict);
    if ops.len() != 2 {
        let ops = canonicalize_ops(ctxt, &ops);
        return Expr::into_canonical(ExprKind::Call("Power".to_string(), ops));
    }
    let exp = canonicalize(ctxt, &ops.pop().unwrap());
    let base = canonicalize(ctxt, &ops.pop().unwrap());

    if let (Some(b), Some(e)) = (base.as_num(), exp.as_num()) {
        return fold_power(ctxt, &base, &exp, b, e);
    }

    // symbolic shortcuts
    match exp.as_num() {
        Some(e) if e.is_one() => return base,
        Some(Numeric::Int(0)) => return Expr::into_canonical(ExprKind::Num(Numeric::Int(1))),
        _ => {},
    }
    if matches!(base.as_num(), Some(n) if n.is_one() && n.is_exact()) {
        return base;
    }

    Expr::into_canonical(ExprKind::Call("Power".to_string(), vec![base, exp]))
}

/// Folds a fully numeric power, preferring exact radical extraction for exact bases raised to
/// machine-rational exponents.
fn fold_power(ctxt: &mut Context, base: &Expr, exp: &Expr, b: &Numeric, e: &Numeric) -> Expr {
    if let (true, Numeric::Rational(p, q)) = (b.is_exact(), e) {
        if let Some(extracted) = rational_power(ctxt, b, *p, *q) {
            return extracted;
        }
        // exact base, machine-rational exponent, nothing extractable: stay symbolic so
        // exactness survives
        return Expr::into_canonical(ExprKind::Call(
            "Power".to_string(),
            vec![base.clone(), exp.clone()],
        ));
    }
    if b.is_exact() && e.is_exact() && !e.is_integer() {
        // big-rational exponents have no radical form worth chasing; leave them symbolic
        return Expr::into_canonical(ExprKind::Call(
            "Power".to_string(),
            vec![base.clone(), exp.clone()],
        ));
    }

    let folded = arith::pow(b, e).canonical();
    if matches!(folded, Numeric::Complex(_))
        && !ctxt.allow_complex
        && !matches!(b, Numeric::Complex(_))
        && !matches!(e, Numeric::Complex(_))
    {
        return Expr::error(
            ErrorCode::IncompatibleType {
                expected: Type::Real.to_string(),
                actual: Type::Complex.to_string(),
            },
            Some(Expr::call("Power", vec![base.clone(), exp.clone()])),
        );
    }
    Expr::into_canonical(ExprKind::Num(folded))
}

/// `b^(p/q)` for an exact base: extract the `q`-th root of the integer part and raise the
/// result to `p`. Returns `None` when the base is a non-integer rational whose parts are not
/// both perfect `q`-th powers (the radical form would not simplify).
fn rational_power(ctxt: &mut Context, b: &Numeric, p: i64, q: i64) -> Option<Expr> {
    let k = u32::try_from(q).ok()?;
    let root = match b.as_integer() {
        Some(n) => extract_root(ctxt, n, k)?,
        None => {
            let r = b.to_rational()?;
            if r < 0 {
                return None;
            }
            let (outside_n, inside_n) = factor::factor_root(r.numer(), k);
            let (outside_d, inside_d) = factor::factor_root(r.denom(), k);
            if inside_n != 1 || inside_d != 1 {
                return None;
            }
            Expr::into_canonical(ExprKind::Num(
                Numeric::from(rug::Rational::from((outside_n, outside_d))).canonical(),
            ))
        },
    };
    if p == 1 {
        return Some(root);
    }
    Some(canonical_power(ctxt, vec![root, Expr::num(p)]))
}

/// Extracts the largest perfect `k`-th-power factor of an integer: the result is either a
/// literal, a bare radical, or `Multiply(outside, radical)`. Returns `None` when the extraction
/// must stay symbolic (negative base under an even root beyond the square).
fn extract_root(ctxt: &mut Context, n: Integer, k: u32) -> Option<Expr> {
    if n < 0 {
        let positive = extract_root(ctxt, -n.clone(), k)?;
        if k % 2 == 1 {
            return Some(canonicalize(ctxt, &Expr::call("Multiply", vec![
                Expr::num(-1),
                positive,
            ])));
        }
        if k == 2 {
            if !ctxt.allow_complex {
                return Some(Expr::error(
                    ErrorCode::IncompatibleType {
                        expected: Type::Real.to_string(),
                        actual: Type::Complex.to_string(),
                    },
                    Some(Expr::call("Sqrt", vec![Expr::num(Numeric::from(n))])),
                ));
            }
            let i = Expr::num(Numeric::complex_unchecked(canon_num::primitive::complex((0, 1))));
            return Some(canonicalize(ctxt, &Expr::call("Multiply", vec![i, positive])));
        }
        // higher even roots of a negative base have no single-radical form
        return None;
    }

    let (outside, inside) = factor::factor_root(&n, k);
    if inside == 1 {
        return Some(Expr::into_canonical(ExprKind::Num(Numeric::from(outside).canonical())));
    }

    let radicand = Expr::into_canonical(ExprKind::Num(Numeric::from(inside).canonical()));
    let radical = if k == 2 {
        Expr::into_canonical(ExprKind::Call("Sqrt".to_string(), vec![radicand]))
    } else {
        Expr::into_canonical(ExprKind::Call("Root".to_string(), vec![
            radicand,
            Expr::into_canonical(ExprKind::Num(Numeric::Int(i64::from(k)))),
        ]))
    };
    if outside == 1 {
        return Some(radical);
    }
    Some(Expr::into_canonical(ExprKind::Call("Multiply".to_string(), vec![
        Expr::into_canonical(ExprKind::Num(Numeric::from(outside).canonical())),
        radical,
    ])))
}

fn canonical_sqrt(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    canonical_radical(ctxt, ops, 1)
}

fn canonical_root(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    canonical_radical(ctxt, ops, 2)
}

/// Shared `Sqrt`/`Root` canonicalization; `arity` distinguishes the two surface forms.
fn canonical_radical(ctxt: &mut Context, ops: Vec<Expr>, arity: usize) -> Expr {
    let head = if arity == 1 { "Sqrt" } else { "Root" };
    let mut ops = check_arity(&ops, arity, ctxt.strict);
    if ops.len() != arity {
        let ops = canonicalize_ops(ctxt, &ops);
        return Expr::into_canonical(ExprKind::Call(head.to_string(), ops));
    }

    let k = if arity == 2 {
        let degree = canonicalize(ctxt, &ops.pop().unwrap());
        let literal = degree.as_num().and_then(Numeric::as_i64);
        match literal {
            Some(k) if k >= 1 && u32::try_from(k).is_ok() => k as u32,
            _ => {
                let base = canonicalize(ctxt, &ops.pop().unwrap());
                let err = Expr::error(
                    ErrorCode::IncompatibleType {
                        expected: Type::Integer.to_string(),
                        actual: ctxt.type_of(&degree).to_string(),
                    },
                    Some(degree),
                );
                return Expr::into_canonical(ExprKind::Call(head.to_string(), vec![base, err]));
            },
        }
    } else {
        2
    };

    let base = canonicalize(ctxt, &ops.pop().unwrap());
    match base.as_num() {
        Some(n) if n.is_exact() => {
            if let Some(extracted) = rational_power(ctxt, n, 1, i64::from(k)) {
                return extracted;
            }
        },
        Some(n) => {
            // approximate bases fold numerically
            return fold_power(ctxt, &base, &Expr::num(Numeric::rational(1, i64::from(k))), n, &Numeric::rational(1, i64::from(k)));
        },
        None => {},
    }

    let mut radical = vec![base];
    if arity == 2 {
        radical.push(Expr::into_canonical(ExprKind::Num(Numeric::Int(i64::from(k)))));
    }
    Expr::into_canonical(ExprKind::Call(head.to_string(), radical))
}

fn eval_add(_: &mut Context, ops: &[Expr]) -> Option<Expr> {
    fold_literals(ops, arith::add)
}

fn eval_multiply(_: &mut Context, ops: &[Expr]) -> Option<Expr> {
    fold_literals(ops, arith::mul)
}

fn fold_literals(ops: &[Expr], f: fn(&Numeric, &Numeric) -> Numeric) -> Option<Expr> {
    let mut acc: Option<Numeric> = None;
    for op in ops {
        let n = op.as_num()?;
        acc = Some(match &acc {
            Some(acc) => f(acc, n),
            None => n.clone(),
        });
    }
    acc.map(|n| Expr::into_canonical(ExprKind::Num(n.canonical())))
}

fn eval_abs(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    match ops.first()?.as_num() {
        Some(n) => Some(Expr::into_canonical(ExprKind::Num(arith::abs(n).canonical()))),
        // |x| of a symbol with a known sign still resolves
        None => match sgn(ctxt, ops.first()?)? {
            Sign::Negative => Some(crate::eval::evaluate(
                ctxt,
                &Expr::call("Negate", vec![ops[0].clone()]),
            )),
            _ => None,
        },
    }
}

fn eval_sign(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let value = match sgn(ctxt, ops.first()?)? {
        Sign::Negative => -1,
        Sign::Zero => 0,
        Sign::Positive => 1,
    };
    Some(Expr::into_canonical(ExprKind::Num(Numeric::Int(value))))
}

fn sgn_add(ctxt: &mut Context, ops: &[Expr]) -> Option<Sign> {
    let mut acc = Sign::Zero;
    for op in ops {
        let s = sgn(ctxt, op)?;
        if s == Sign::Zero {
            continue;
        }
        if acc == Sign::Zero {
            acc = s;
        } else if acc != s {
            return None;
        }
    }
    Some(acc)
}

fn sgn_multiply(ctxt: &mut Context, ops: &[Expr]) -> Option<Sign> {
    let mut acc = Sign::Positive;
    for op in ops {
        match sgn(ctxt, op)? {
            Sign::Zero => return Some(Sign::Zero),
            Sign::Negative => {
                acc = match acc {
                    Sign::Positive => Sign::Negative,
                    _ => Sign::Positive,
                };
            },
            Sign::Positive => {},
        }
    }
    Some(acc)
}

fn sgn_negate(ctxt: &mut Context, ops: &[Expr]) -> Option<Sign> {
    Some(match sgn(ctxt, ops.first()?)? {
        Sign::Negative => Sign::Positive,
        Sign::Zero => Sign::Zero,
        Sign::Positive => Sign::Negative,
    })
}

fn sgn_abs(ctxt: &mut Context, ops: &[Expr]) -> Option<Sign> {
    Some(match sgn(ctxt, ops.first()?)? {
        Sign::Zero => Sign::Zero,
        _ => Sign::Positive,
    })
}

fn sgn_sign(ctxt: &mut Context, ops: &[Expr]) -> Option<Sign> {
    sgn(ctxt, ops.first()?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::eval::evaluate;
    use super::*;

    fn canon(expr: Expr) -> Expr {
        let mut ctxt = Context::default();
        canonicalize(&mut ctxt, &expr)
    }

    #[test]
    fn sqrt_extracts_perfect_square_factors() {
        // sqrt(75) = 5 sqrt(3)
        let result = canon(Expr::call("Sqrt", vec![Expr::num(75)]));
        assert_eq!(result, Expr::call("Multiply", vec![
            Expr::num(5),
            Expr::call("Sqrt", vec![Expr::num(3)]),
        ]));
    }

    #[test]
    fn sqrt_of_perfect_square_is_exact() {
        assert_eq!(canon(Expr::call("Sqrt", vec![Expr::num(144)])), Expr::num(12));
    }

    #[test]
    fn sqrt_with_no_extractable_factor_stays_radical() {
        let result = canon(Expr::call("Sqrt", vec![Expr::num(7)]));
        assert_eq!(result, Expr::call("Sqrt", vec![Expr::num(7)]));
    }

    #[test]
    fn cube_root_extraction() {
        // 24 = 2^3 * 3
        let result = canon(Expr::call("Root", vec![Expr::num(24), Expr::num(3)]));
        assert_eq!(result, Expr::call("Multiply", vec![
            Expr::num(2),
            Expr::call("Root", vec![Expr::num(3), Expr::num(3)]),
        ]));
    }

    #[test]
    fn odd_root_of_negative_base_stays_real() {
        let result = canon(Expr::call("Root", vec![Expr::num(-8), Expr::num(3)]));
        assert_eq!(result, Expr::num(-2));
    }

    #[test]
    fn sqrt_of_negative_base_promotes_to_complex() {
        let mut ctxt = Context::default();
        let result = canonicalize(&mut ctxt, &Expr::call("Sqrt", vec![Expr::num(-9)]));
        // 3i, carried as a complex literal
        match result.as_num() {
            Some(Numeric::Complex(c)) => {
                assert_eq!(c.real().to_f64(), 0.0);
                assert_eq!(c.imag().to_f64(), 3.0);
            },
            other => panic!("expected a complex literal, got {:?}", other),
        }
    }

    #[test]
    fn sqrt_of_negative_base_errors_when_complex_is_disallowed() {
        let mut ctxt = Context::default();
        ctxt.allow_complex = false;
        let result = canonicalize(&mut ctxt, &Expr::call("Sqrt", vec![Expr::num(-9)]));
        assert_eq!(result.error_code(), Some("incompatible-type"));
    }

    #[test]
    fn subtract_rewrites_through_add() {
        assert_eq!(canon(Expr::call("Subtract", vec![Expr::num(10), Expr::num(4)])), Expr::num(6));

        let symbolic = canon(Expr::call("Subtract", vec![Expr::symbol("x"), Expr::symbol("y")]));
        assert_eq!(symbolic.head(), Some("Add"));
    }

    #[test]
    fn divide_keeps_exact_quotients_exact() {
        let result = canon(Expr::call("Divide", vec![Expr::num(6), Expr::num(4)]));
        assert_eq!(result, Expr::num(Numeric::rational(3, 2)));
    }

    #[test]
    fn divide_by_exact_zero_diverges() {
        let result = canon(Expr::call("Divide", vec![Expr::num(1), Expr::num(0)]));
        assert_eq!(result.as_num(), Some(&Numeric::Float(f64::INFINITY)));

        let result = canon(Expr::call("Divide", vec![Expr::num(0), Expr::num(0)]));
        assert!(result.as_num().is_some_and(Numeric::is_nan));
    }

    #[test]
    fn complex_over_zero_is_complex_infinity() {
        let i = Expr::num(Numeric::complex_unchecked(canon_num::primitive::complex((0, 1))));
        let result = canon(Expr::call("Divide", vec![i, Expr::num(0)]));
        assert_eq!(result, Expr::symbol("ComplexInfinity"));
    }

    #[test]
    fn symbolic_divide_normalizes_to_product_of_power() {
        let result = canon(Expr::call("Divide", vec![Expr::symbol("x"), Expr::symbol("y")]));
        assert_eq!(result.head(), Some("Multiply"));
        assert!(result.ops().iter().any(|op| op.head() == Some("Power")));
    }

    #[test]
    fn power_of_one_and_zero_exponents() {
        assert_eq!(canon(Expr::call("Power", vec![Expr::symbol("x"), Expr::num(1)])), Expr::symbol("x"));
        assert_eq!(canon(Expr::call("Power", vec![Expr::symbol("x"), Expr::num(0)])), Expr::num(1));
    }

    #[test]
    fn exact_integer_power() {
        assert_eq!(canon(Expr::call("Power", vec![Expr::num(2), Expr::num(10)])), Expr::num(1024));
        assert_eq!(
            canon(Expr::call("Power", vec![Expr::num(2), Expr::num(-2)])),
            Expr::num(Numeric::rational(1, 4)),
        );
    }

    #[test]
    fn abs_folds_and_infers() {
        let mut ctxt = Context::default();
        let result = evaluate(&mut ctxt, &Expr::call("Abs", vec![Expr::num(-5)]));
        assert_eq!(result, Expr::num(5));
    }

    #[test]
    fn sign_of_symbolic_product() {
        let mut ctxt = Context::default();
        ctxt.assign("x", Expr::num(-3));
        ctxt.assign("y", Expr::num(2));
        let result = evaluate(&mut ctxt, &Expr::call("Sign", vec![
            Expr::call("Multiply", vec![Expr::symbol("x"), Expr::symbol("y")]),
        ]));
        assert_eq!(result, Expr::num(-1));
    }

    #[test]
    fn negation_folds_through_multiply() {
        assert_eq!(canon(Expr::call("Negate", vec![Expr::num(7)])), Expr::num(-7));
        let symbolic = canon(Expr::call("Negate", vec![Expr::symbol("x")]));
        assert_eq!(symbolic, Expr::call("Multiply", vec![Expr::num(-1), Expr::symbol("x")]));
    }
}
