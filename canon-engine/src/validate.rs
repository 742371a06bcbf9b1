//! Arity and type checking for operator applications.
//!
//! Validation never throws and never aborts a whole tree: an offending operand is replaced by
//! an in-graph `Error` node *in its original position*, so error placement survives downstream
//! pretty-printing, and the remaining siblings are still processed.
//!
//! Type inference is deferred: an operand whose type is still unknown is provisionally
//! accepted, and only once every other operand has validated does [`validate_arguments`] write
//! the inferred types back into the registry. A single invalid sibling therefore never pollutes
//! the types of its valid neighbors.

use crate::canonical::canonicalize;
use crate::ctxt::Context;
use crate::error::ErrorCode;
use crate::expr::Expr;
use crate::scope::{ParamKind, Signature};
use crate::types::Type;

/// Splices `Sequence(...)` markers into the surrounding operand list.
pub fn flatten_sequences(ops: &[Expr]) -> Vec<Expr> {
    let mut flat = Vec::with_capacity(ops.len());
    for op in ops {
        if op.head() == Some("Sequence") {
            flat.extend(flatten_sequences(op.ops()));
        } else {
            flat.push(op.clone());
        }
    }
    flat
}

/// Checks that an operand list has exactly `count` operands.
///
/// In non-strict mode the (sequence-flattened) operands are returned unchanged: the fast path.
/// In strict mode, missing trailing operands are padded with `missing` errors and extras are
/// tagged as `unexpected-argument` errors in place, preserving positional alignment.
pub fn check_arity(ops: &[Expr], count: usize, strict: bool) -> Vec<Expr> {
    let mut ops = flatten_sequences(ops);
    if !strict {
        return ops;
    }

    for extra in ops.iter_mut().skip(count) {
        if !extra.is_error() {
            *extra = Expr::error(ErrorCode::UnexpectedArgument, Some(extra.clone()));
        }
    }
    while ops.len() < count {
        ops.push(Expr::error(ErrorCode::Missing, None));
    }
    ops
}

/// Canonicalizes an operand and checks it against an expected type. A mismatch replaces the
/// operand with an `incompatible-type` error carrying both types; an operand that is already an
/// `Error` is never touched.
pub fn check_type(ctxt: &mut Context, op: &Expr, expected: Type) -> Expr {
    if op.is_error() {
        return op.clone();
    }

    let op = canonicalize(ctxt, op);
    let actual = ctxt.type_of(&op);
    if actual.matches(expected) {
        op
    } else {
        Expr::error(
            ErrorCode::IncompatibleType {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            Some(op),
        )
    }
}

/// Checks a list of operands against a list of expected types, element-wise.
pub fn check_types(ctxt: &mut Context, ops: &[Expr], expected: &[Type]) -> Vec<Expr> {
    ops.iter()
        .zip(expected)
        .map(|(op, ty)| check_type(ctxt, op, *ty))
        .collect()
}

/// Validates an operand list against an operator signature.
///
/// Walks required, then optional, then variadic parameter slots. Operands whose type is still
/// unknown are provisionally accepted; only when every slot validates does the routine write
/// inferred types into the registry. Returns the (possibly error-substituted) operands and
/// whether the application validated.
pub fn validate_arguments(
    ctxt: &mut Context,
    ops: &[Expr],
    sig: &Signature,
    lazy: bool,
) -> (Vec<Expr>, bool) {
    let ops = flatten_sequences(ops);
    let mut out = Vec::with_capacity(ops.len());
    let mut valid = true;

    // (symbol name, slot type) pairs awaiting inference
    let mut pending = Vec::new();

    let mut slots = sig.params.iter();
    for op in &ops {
        let expected = match slots.next() {
            Some(param) => param.ty,
            None => match sig.variadic {
                Some(ty) => ty,
                None => {
                    out.push(Expr::error(ErrorCode::UnexpectedArgument, Some(op.clone())));
                    valid = false;
                    continue;
                },
            },
        };

        if op.is_error() {
            out.push(op.clone());
            valid = false;
            continue;
        }

        let op = if lazy { op.clone() } else { canonicalize(ctxt, op) };
        let actual = ctxt.type_of(&op);
        if actual == Type::Unknown {
            if let Some(name) = op.as_symbol() {
                pending.push((name.to_string(), expected));
            }
            out.push(op);
        } else if actual.matches(expected) {
            out.push(op);
        } else {
            out.push(Expr::error(
                ErrorCode::IncompatibleType {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                },
                Some(op),
            ));
            valid = false;
        }
    }

    for param in slots {
        if param.kind == ParamKind::Required {
            out.push(Expr::error(ErrorCode::Missing, None));
            valid = false;
        }
    }

    // inference runs only on a fully valid application, so one bad sibling cannot pin a
    // neighbor's type
    if valid {
        for (name, ty) in pending {
            if ty != Type::Unknown && ty != Type::Anything {
                ctxt.infer_type(&name, ty);
            }
        }
    }

    (out, valid)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::scope::{Definition, Param, ValueDef};
    use super::*;

    fn abc() -> Vec<Expr> {
        vec![Expr::symbol("a"), Expr::symbol("b"), Expr::symbol("c")]
    }

    #[test]
    fn arity_fast_path_returns_ops_unchanged() {
        let ops = abc();
        assert_eq!(check_arity(&ops, 2, false), ops);
    }

    #[test]
    fn strict_arity_tags_extras() {
        let ops = check_arity(&abc(), 2, true);
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], Expr::symbol("a"));
        assert_eq!(ops[1], Expr::symbol("b"));
        assert_eq!(ops[2].error_code(), Some("unexpected-argument"));
        // the offending operand rides along as context
        assert_eq!(ops[2].ops()[1], Expr::symbol("c"));
    }

    #[test]
    fn strict_arity_pads_missing() {
        let ops = check_arity(&[Expr::symbol("a")], 2, true);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0], Expr::symbol("a"));
        assert_eq!(ops[1].error_code(), Some("missing"));
    }

    #[test]
    fn arity_flattens_sequences() {
        let ops = vec![
            Expr::symbol("a"),
            Expr::call("Sequence", vec![Expr::symbol("b"), Expr::symbol("c")]),
        ];
        assert_eq!(check_arity(&ops, 3, false), abc());
    }

    #[test]
    fn type_mismatch_is_substituted_in_place() {
        let mut ctxt = Context::default();
        let checked = check_type(&mut ctxt, &Expr::str("hi"), Type::Number);
        assert_eq!(checked.error_code(), Some("incompatible-type"));
    }

    #[test]
    fn already_invalid_operand_is_untouched() {
        let mut ctxt = Context::default();
        let err = Expr::error(ErrorCode::Missing, None);
        assert_eq!(check_type(&mut ctxt, &err, Type::Number), err);
    }

    #[test]
    fn inference_is_deferred_until_all_validate() {
        let mut ctxt = Context::default();
        ctxt.declare("n", Definition::Value(ValueDef::unknown())).unwrap();
        let sig = Signature {
            params: vec![Param::required(Type::Integer), Param::required(Type::Integer)],
            variadic: None,
            result: Type::Integer,
        };

        // invalid sibling: no inference happens
        let (_, valid) = validate_arguments(
            &mut ctxt,
            &[Expr::symbol("n"), Expr::str("bad")],
            &sig,
            false,
        );
        assert!(!valid);
        assert_eq!(ctxt.type_of(&Expr::symbol("n")), Type::Unknown);

        // all siblings valid: n is inferred
        let (_, valid) = validate_arguments(
            &mut ctxt,
            &[Expr::symbol("n"), Expr::num(2)],
            &sig,
            false,
        );
        assert!(valid);
        assert_eq!(ctxt.type_of(&Expr::symbol("n")), Type::Integer);
    }

    #[test]
    fn missing_required_operand() {
        let mut ctxt = Context::default();
        let sig = Signature::required(&[Type::Number, Type::Number], Type::Number);
        let (ops, valid) = validate_arguments(&mut ctxt, &[Expr::num(1)], &sig, false);
        assert!(!valid);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].error_code(), Some("missing"));
    }
}
