//! Structural operators: evaluation control (`Hold`, `ReleaseHold`, `Block`), the error
//! carriers (`Error`, `ErrorCode`), function literals and application (`Function`, `Apply`),
//! grouping (`Tuple`, `Delimiter`, `Sequence`), juxtaposition (`InvisibleOperator`), and
//! `Subscript`.

use canon_num::{primitive::complex, Numeric};
use crate::canonical::{canonicalize, canonicalize_ops, fold_pair};
use crate::ctxt::Context;
use crate::error::ErrorCode;
use crate::eval::evaluate;
use crate::expr::{Expr, ExprKind, ERROR_CODE_HEAD, ERROR_HEAD};
use crate::lambda;
use crate::scope::{Definition, OperatorAttrs, OperatorDef, Signature};
use crate::types::Type;
use crate::validate::flatten_sequences;

pub(super) fn defs() -> Vec<(&'static str, OperatorDef)> {
    let hold = OperatorAttrs {
        hold: true,
        ..OperatorAttrs::default()
    };

    vec![
        (
            "Hold",
            OperatorDef::new(Signature::required(&[Type::Anything], Type::Anything), hold)
                .with_canonical(canonical_hold),
        ),
        (
            "ReleaseHold",
            OperatorDef::new(Signature::required(&[Type::Anything], Type::Anything), hold)
                .with_canonical(canonical_release_hold)
                .with_evaluate(eval_release_hold),
        ),
        (
            ERROR_HEAD,
            OperatorDef::new(Signature::variadic(Type::Anything, Type::Nothing), hold)
                .with_canonical(canonical_error),
        ),
        (
            ERROR_CODE_HEAD,
            OperatorDef::new(Signature::variadic(Type::Str, Type::Nothing), hold)
                .with_canonical(canonical_error_code),
        ),
        (
            lambda::FUNCTION_HEAD,
            OperatorDef::new(
                Signature {
                    params: vec![crate::scope::Param::required(Type::Anything)],
                    variadic: Some(Type::Symbol),
                    result: Type::Function,
                },
                hold,
            )
            .with_canonical(lambda::canonical_function),
        ),
        (
            "Apply",
            OperatorDef::new(
                Signature {
                    params: vec![crate::scope::Param::required(Type::Function)],
                    variadic: Some(Type::Anything),
                    result: Type::Unknown,
                },
                OperatorAttrs::default(),
            )
            .with_canonical(canonical_apply)
            .with_evaluate(eval_apply),
        ),
        (
            "Block",
            OperatorDef::new(Signature::variadic(Type::Anything, Type::Unknown), hold)
                .with_canonical(canonical_block)
                .with_evaluate(eval_block),
        ),
        (
            "Tuple",
            OperatorDef::new(
                Signature::variadic(Type::Anything, Type::Collection),
                OperatorAttrs::default(),
            ),
        ),
        (
            "Delimiter",
            OperatorDef::new(
                Signature::variadic(Type::Anything, Type::Unknown),
                OperatorAttrs::default(),
            )
            .with_canonical(canonical_delimiter),
        ),
        (
            "Sequence",
            OperatorDef::new(
                Signature::variadic(Type::Anything, Type::Unknown),
                OperatorAttrs::default(),
            )
            .with_canonical(canonical_sequence),
        ),
        (
            "InvisibleOperator",
            OperatorDef::new(
                Signature::variadic(Type::Anything, Type::Unknown),
                OperatorAttrs::default(),
            )
            .with_canonical(canonical_invisible),
        ),
        (
            "Subscript",
            OperatorDef::new(
                Signature::required(&[Type::Anything, Type::Anything], Type::Unknown),
                OperatorAttrs::default(),
            )
            .with_canonical(canonical_subscript),
        ),
    ]
}

// Hold operators mark the node canonical without touching the operands. The per-head hooks
// share one body through this macro since a hook has no access to the node's head.
macro_rules! verbatim_hook {
    ($name:ident, $head:expr) => {
        fn $name(_: &mut Context, ops: Vec<Expr>) -> Expr {
            Expr::into_canonical(ExprKind::Call($head.to_string(), ops))
        }
    };
}

verbatim_hook!(canonical_hold, "Hold");
verbatim_hook!(canonical_error, ERROR_HEAD);
verbatim_hook!(canonical_error_code, ERROR_CODE_HEAD);
verbatim_hook!(canonical_block, "Block");

fn canonical_release_hold(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let ops = canonicalize_ops(ctxt, &ops);
    Expr::into_canonical(ExprKind::Call("ReleaseHold".to_string(), ops))
}

fn eval_release_hold(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let op = ops.first()?;
    let inner = if op.head() == Some("Hold") {
        op.ops().first()?.clone()
    } else {
        op.clone()
    };
    Some(evaluate(ctxt, &inner))
}

fn canonical_apply(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let ops = canonicalize_ops(ctxt, &ops);
    Expr::into_canonical(ExprKind::Call("Apply".to_string(), ops))
}

fn eval_apply(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    let (f, args) = ops.split_first()?;
    lambda::apply(ctxt, f, args)
}

/// `Block` evaluates its operands in sequence inside a fresh scope; the last value is the
/// block's value.
fn eval_block(ctxt: &mut Context, ops: &[Expr]) -> Option<Expr> {
    ctxt.push_scope();
    let mut result = Expr::into_canonical(ExprKind::Symbol("Nothing".to_string()));
    for op in ops {
        result = evaluate(ctxt, op);
    }
    ctxt.pop_scope();
    Some(result)
}

/// A delimiter group is transparent: one item unwraps, several become a `Tuple`, none is a
/// syntax-level error.
fn canonical_delimiter(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = canonicalize_ops(ctxt, &ops);
    match ops.len() {
        0 => Expr::error(ErrorCode::InvalidDelimiter, None),
        1 => ops.pop().unwrap(),
        _ => Expr::into_canonical(ExprKind::Call("Tuple".to_string(), ops)),
    }
}

fn canonical_sequence(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let ops = canonicalize_ops(ctxt, &ops);
    Expr::into_canonical(ExprKind::Call("Sequence".to_string(), ops))
}

/// Juxtaposition. Two-operand special cases run on the raw operands, in order:
///
/// 1. `sym group` where `sym` is not bound as a value: a function application.
/// 2. `int rational`: a mixed number, folded through `Add`.
/// 3. `num ImaginaryUnit`: a complex literal.
///
/// Otherwise juxtaposition of number-typed operands is multiplication, and anything else is a
/// `Tuple`.
fn canonical_invisible(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let ops = flatten_sequences(&ops);

    if ops.len() == 2 {
        if let (Some(name), Some("Delimiter")) = (ops[0].as_symbol(), ops[1].head()) {
            if !matches!(ctxt.lookup(name), Some(Definition::Value(_))) {
                return canonicalize(ctxt, &Expr::call(name.to_string(), ops[1].ops().to_vec()));
            }
        }

        let a = canonicalize(ctxt, &ops[0]);
        let b = canonicalize(ctxt, &ops[1]);
        if let (Some(x), Some(y)) = (a.as_num(), b.as_num()) {
            if x.is_exact() && x.is_integer() && y.is_exact() && !y.is_integer() {
                return fold_pair(x, y, canon_num::arith::add);
            }
        }
        if let (Some(x), Some("ImaginaryUnit")) = (a.as_num(), b.as_symbol()) {
            return Expr::into_canonical(ExprKind::Num(
                Numeric::complex_unchecked(complex((0, x.to_decimal()))).canonical(),
            ));
        }
    }

    let ops = canonicalize_ops(ctxt, &ops);
    if ops.iter().all(|op| ctxt.type_of(op).matches(Type::Number)) {
        return canonicalize(ctxt, &Expr::call("Multiply", ops));
    }
    // a scalar against a collection still multiplies, but it cannot go through the registry
    // hook: `Multiply`'s signature is Number-variadic
    let scalable = ops.iter().all(|op| {
        let ty = ctxt.type_of(op);
        ty.matches(Type::Number) || ty.matches(Type::Collection)
    });
    if scalable {
        return Expr::into_canonical(ExprKind::Call("Multiply".to_string(), ops));
    }
    Expr::into_canonical(ExprKind::Call("Tuple".to_string(), ops))
}

/// `Subscript(x, k)` with a symbol base and an exact-integer-literal subscript folds into the
/// compound symbol `x_k`; anything else stays an application.
fn canonical_subscript(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    if ops.len() == 2 {
        let literal_index = ops[1]
            .as_num()
            .filter(|n| n.is_exact() && n.is_integer())
            .and_then(Numeric::as_i64);
        if let (Some(name), Some(k)) = (ops[0].as_symbol(), literal_index) {
            return canonicalize(ctxt, &Expr::symbol(format!("{name}_{k}")));
        }
    }
    let ops = canonicalize_ops(ctxt, &ops);
    Expr::into_canonical(ExprKind::Call("Subscript".to_string(), ops))
}
