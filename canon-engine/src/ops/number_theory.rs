//! Number-theoretic operators: `Gcd`, `Lcm`, `IsPrime`, `Factorial`, and the bounded fold
//! loops `Sum` and `Product`.
//!
//! The loops run under the context's iteration budget: exhausting it substitutes an
//! `iteration-limit-exceeded` error rather than hanging the caller. `IsPrime` is tri-state
//! underneath ([`Primality::Unknown`] for large candidates the probabilistic test cannot
//! settle); an unknown verdict leaves the application symbolic instead of guessing.

use canon_num::{arith, factor, prime, Numeric, Primality};
use rug::Integer;
use crate::ctxt::Context;
use crate::error::ErrorCode;
use crate::eval::Budget;
use crate::expr::{Expr, ExprKind};
use crate::lambda;
use crate::scope::{OperatorAttrs, OperatorDef, Signature};
use crate::types::Type;

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
            "Gcd",
            OperatorDef::new(Signature::variadic(Type::Integer, Type::Integer), variadic)
                .with_evaluate(eval_gcd),
        ),
        (
            "Lcm",
            OperatorDef::new(Signature::variadic(Type::Integer, Type::Integer), variadic)
                .with_evaluate(eval_lcm),
        ),
        (
            "IsPrime",
            OperatorDef::new(Signature::required(&[Type::Integer], Type::Boolean), pure)
                .with_evaluate(eval_is_prime),
        ),
        (
            "Factorial",
            OperatorDef::new(Signature::required(&[Type::Integer], Type::Integer), pure)
                .with_evaluate(eval_factorial),
        ),
        (
            "Sum",
            OperatorDef::new(
                Signature::required(&[Type::Anything, Type::Integer], Type::Number),
                OperatorAttrs::default(),
            )
            .with_evaluate(eval_sum),
        ),
        (
            "Product",
            OperatorDef::new(
                Signature::required(&[Type::Anything, Type::Integer], Type::Number),
                OperatorAttrs::default(),
            )
            .with_evaluate(eval_product),
        ),
    ]
}

fn integers(ops: &[Expr]) -> Option<Vec<Integer>> {
    ops.iter()
        .map(|op| op.as_num().and_then(Numeric::as_integer))
        .collect()
}

fn eval_gcd(_: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let ns = integers(ops)?;
    let folded = ns
        .into_iter()
        .reduce(|a, b| factor::gcd(&a, &b))?;
    Some(Expr::into_canonical(ExprKind::Num(Numeric::from(folded).canonical())))
}

fn eval_lcm(_: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let ns = integers(ops)?;
    let folded = ns
        .into_iter()
        .reduce(|a, b| factor::lcm(&a, &b))?;
    Some(Expr::into_canonical(ExprKind::Num(Numeric::from(folded).canonical())))
}

fn eval_is_prime(_: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let n = ops.first()?.as_num().and_then(Numeric::as_integer)?;
    match prime::is_prime(&n) {
        Primality::Prime => Some(Expr::into_canonical(ExprKind::Symbol("True".to_string()))),
        Primality::Composite => Some(Expr::into_canonical(ExprKind::Symbol("False".to_string()))),
        // no proof either way: stay symbolic
        Primality::Unknown => None,
    }
}

fn eval_factorial(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let op = ops.first()?;
    let n = op.as_num().filter(|n| n.is_exact()).and_then(Numeric::as_i64)?;
    if n < 0 {
        return None;
    }

    let mut budget = Budget::new(ctxt);
    let mut acc = Integer::from(1);
    for k in 2..=n {
        if !budget.step() {
            return Some(Expr::error(
                ErrorCode::IterationLimitExceeded,
                Some(Expr::call("Factorial", vec![op.clone()])),
            ));
        }
        acc *= k;
    }
    Some(Expr::into_canonical(ExprKind::Num(Numeric::from(acc).canonical())))
}

fn eval_sum(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    fold_range(ctxt, ops, "Sum", Numeric::Int(0), arith::add)
}

fn eval_product(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    fold_range(ctxt, ops, "Product", Numeric::Int(1), arith::mul)
}

/// `Sum(f, n)` / `Product(f, n)`: fold `f(1) .. f(n)` through the tower under the iteration
/// budget. A body application that stays symbolic leaves the whole loop symbolic.
fn fold_range(
    ctxt: &mut Context,
    ops: &[Expr],
    head: &str,
    identity: Numeric,
    fold: fn(&Numeric, &Numeric) -> Numeric,
) -> Option<Expr> {
    let [f, bound] = ops else {
        return None;
    };
    if matches!(f.kind(), ExprKind::Num(_) | ExprKind::Str(_)) {
        return Some(Expr::error(ErrorCode::ExpectedPureExpression, Some(f.clone())));
    }
    let n = bound.as_num().filter(|n| n.is_exact()).and_then(Numeric::as_i64)?;

    let mut budget = Budget::new(ctxt);
    let mut acc = identity;
    for k in 1..=n {
        if !budget.step() {
            return Some(Expr::error(
                ErrorCode::IterationLimitExceeded,
                Some(Expr::call(head, ops.to_vec())),
            ));
        }
        let term = lambda::apply(ctxt, f, &[Expr::num(k)])?;
        let term = term.as_num()?;
        acc = fold(&acc, term);
    }
    Some(Expr::into_canonical(ExprKind::Num(acc.canonical())))
}
