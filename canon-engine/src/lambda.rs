//! Function literals and their application.
//!
//! A canonical function literal is `Function(body, param...)` where the body is wrapped in a
//! `Block` and every parameter is a symbol. Literals are hold expressions: the body stays raw
//! until application. The literal retains a handle to the scope it canonicalized in, so a
//! closure evaluated later (or from another scope entirely) still resolves its captures against
//! the frames that were live at its creation.

use std::collections::HashMap;
use crate::canonical::canonicalize;
use crate::ctxt::Context;
use crate::error::ErrorCode;
use crate::eval::evaluate;
use crate::expr::{Expr, ExprKind};
use crate::scope::{Definition, ValueDef};

pub(crate) const FUNCTION_HEAD: &str = "Function";
const BLOCK_HEAD: &str = "Block";

/// Canonical hook for `Function`. Normalizes the literal: synthesizes the parameter list from
/// `_`, `_1`, `_2`, ... placeholders when none was given, wraps the body in a `Block`, and
/// stamps the node with the current scope.
pub(crate) fn canonical_function(ctxt: &mut Context, ops: Vec<Expr>) -> Expr {
    let mut ops = ops.into_iter();
    let Some(mut body) = ops.next() else {
        return Expr::error(ErrorCode::Missing, None);
    };

    let mut params: Vec<Expr> = ops.collect();
    if params.is_empty() {
        let names = placeholder_params(&body);
        if names.iter().any(|name| name == "_") {
            // `_` is shorthand for `_1`
            let mut rename = HashMap::new();
            rename.insert("_".to_string(), Expr::symbol("_1"));
            body = substitute(&body, &rename);
        }
        // `_` and an explicit `_1` in the same body collapse to one parameter
        let mut seen = Vec::new();
        for name in names {
            let name = if name == "_" { "_1".to_string() } else { name };
            if !seen.contains(&name) {
                seen.push(name);
            }
        }
        params = seen.into_iter().map(Expr::symbol).collect();
    }

    for param in &params {
        if param.as_symbol().is_none() {
            return Expr::error(
                ErrorCode::IncompatibleType {
                    expected: crate::types::Type::Symbol.to_string(),
                    actual: ctxt.type_of(param).to_string(),
                },
                Some(param.clone()),
            );
        }
    }

    if body.head() != Some(BLOCK_HEAD) {
        body = Expr::call(BLOCK_HEAD, vec![body]);
    }

    let mut literal = vec![body];
    literal.extend(params);
    Expr::into_canonical_scoped(
        ExprKind::Call(FUNCTION_HEAD.to_string(), literal),
        ctxt.current_scope(),
    )
}

/// Collects the distinct anonymous-parameter placeholders of a body, in first-occurrence
/// order. `_` and numbered `_k` placeholders may mix; nested function literals keep their own.
fn placeholder_params(body: &Expr) -> Vec<String> {
    let mut names = Vec::new();
    collect_placeholders(body, &mut names);
    names
}

fn collect_placeholders(expr: &Expr, names: &mut Vec<String>) {
    match expr.kind() {
        ExprKind::Symbol(name) if is_placeholder(name) => {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        },
        ExprKind::Call(head, ops) => {
            // a nested literal's placeholders belong to the nested literal
            if head == FUNCTION_HEAD {
                return;
            }
            for op in ops {
                collect_placeholders(op, names);
            }
        },
        _ => {},
    }
}

fn is_placeholder(name: &str) -> bool {
    match name.strip_prefix('_') {
        Some("") => true,
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Applies a function to an argument list.
///
/// Returns `None` when the application cannot proceed: the callee is not a function, too many
/// arguments were supplied, or (in strict mode) an argument evaluated to an error. Fewer
/// arguments than parameters curries: the supplied arguments are substituted into the body and
/// a fresh literal over the remaining parameters is returned.
pub fn apply(ctxt: &mut Context, f: &Expr, args: &[Expr]) -> Option<Expr> {
    match f.kind() {
        ExprKind::Symbol(name) => match ctxt.lookup(name)? {
            Definition::Value(ValueDef { value: Some(value), .. }) => apply(ctxt, &value, args),
            Definition::Operator(_) => {
                Some(evaluate(ctxt, &Expr::call(name.clone(), args.to_vec())))
            },
            _ => None,
        },
        ExprKind::Call(head, _) if head == FUNCTION_HEAD => {
            let literal = if f.is_canonical() {
                f.clone()
            } else {
                canonicalize(ctxt, f)
            };
            apply_literal(ctxt, &literal, args)
        },
        _ => None,
    }
}

fn apply_literal(ctxt: &mut Context, literal: &Expr, args: &[Expr]) -> Option<Expr> {
    let ops = literal.ops();
    let body = ops.first()?;
    let params = &ops[1..];

    if args.len() > params.len() {
        return None;
    }

    // arguments evaluate in the caller's scope, before any frame switching
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        let value = evaluate(ctxt, arg);
        if ctxt.strict && !value.errors().is_empty() {
            return None;
        }
        values.push(value);
    }

    let captured = literal.scope().unwrap_or_else(|| ctxt.current_scope());

    if values.len() < params.len() {
        // the smaller literal must keep the original's captured scope, not the caller's
        let caller = ctxt.swap_scope(captured);
        let curried = curry(ctxt, body, params, values);
        ctxt.swap_scope(caller);
        return Some(curried);
    }

    let caller = ctxt.swap_scope(captured);
    ctxt.push_scope();
    for (param, value) in params.iter().zip(values) {
        let name = param.as_symbol().unwrap_or_default().to_string();
        let ty = ctxt.type_of(&value);
        // the frame is fresh, so the declaration cannot collide
        let _ = ctxt.declare(&name, Definition::Value(ValueDef::bound(ty, value)));
    }
    let result = evaluate(ctxt, body);
    ctxt.pop_scope();
    ctxt.swap_scope(caller);
    Some(result)
}

/// Builds the partial-application literal: supplied parameters substitute their values into
/// the body, remaining parameters are renamed to fresh symbols so repeated curries of the same
/// literal cannot capture each other.
fn curry(ctxt: &mut Context, body: &Expr, params: &[Expr], values: Vec<Expr>) -> Expr {
    let supplied = values.len();
    let mut subst = HashMap::new();
    for (param, value) in params.iter().zip(values) {
        if let Some(name) = param.as_symbol() {
            subst.insert(name.to_string(), value);
        }
    }

    let mut avoid: Vec<String> = free_symbols(body);
    let mut fresh_params = Vec::with_capacity(params.len() - supplied);
    for param in &params[supplied..] {
        let avoid_refs: Vec<&str> = avoid.iter().map(String::as_str).collect();
        let fresh = ctxt.fresh_name(&avoid_refs);
        if let Some(name) = param.as_symbol() {
            subst.insert(name.to_string(), Expr::symbol(fresh.clone()));
        }
        avoid.push(fresh.clone());
        fresh_params.push(Expr::symbol(fresh));
    }

    let mut literal = vec![substitute(body, &subst)];
    literal.extend(fresh_params);
    canonical_function(ctxt, literal)
}

/// Capture-aware substitution of symbols. Descending into a nested function literal drops the
/// bindings its parameter list shadows.
pub(crate) fn substitute(expr: &Expr, subst: &HashMap<String, Expr>) -> Expr {
    if subst.is_empty() {
        return expr.clone();
    }
    match expr.kind() {
        ExprKind::Symbol(name) => match subst.get(name) {
            Some(replacement) => replacement.clone(),
            None => expr.clone(),
        },
        ExprKind::Call(head, ops) if head == FUNCTION_HEAD && ops.len() > 1 => {
            let mut inner = subst.clone();
            for param in &ops[1..] {
                if let Some(name) = param.as_symbol() {
                    inner.remove(name);
                }
            }
            let ops = ops.iter().map(|op| substitute(op, &inner)).collect();
            Expr::call(head.clone(), ops)
        },
        ExprKind::Call(head, ops) => {
            let ops = ops.iter().map(|op| substitute(op, subst)).collect();
            Expr::call(head.clone(), ops)
        },
        _ => expr.clone(),
    }
}

fn free_symbols(expr: &Expr) -> Vec<String> {
    let mut names = Vec::new();
    collect_symbols(expr, &mut names);
    names
}

fn collect_symbols(expr: &Expr, names: &mut Vec<String>) {
    match expr.kind() {
        ExprKind::Symbol(name) => {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        },
        ExprKind::Call(_, ops) => {
            for op in ops {
                collect_symbols(op, names);
            }
        },
        _ => {},
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn add_xy() -> Expr {
        Expr::call("Function", vec![
            Expr::call("Add", vec![Expr::symbol("x"), Expr::symbol("y")]),
            Expr::symbol("x"),
            Expr::symbol("y"),
        ])
    }

    #[test]
    fn literal_normalizes_into_block_body() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &add_xy());
        assert!(f.is_canonical());
        assert_eq!(f.ops()[0].head(), Some("Block"));
        assert_eq!(f.ops().len(), 3);
        assert!(f.scope().is_some());
    }

    #[test]
    fn anonymous_placeholders_synthesize_parameters() {
        let mut ctxt = Context::default();
        // _2 appears before _1: first-occurrence order wins
        let f = canonicalize(&mut ctxt, &Expr::call("Function", vec![
            Expr::call("Subtract", vec![Expr::symbol("_2"), Expr::symbol("_1")]),
        ]));
        assert_eq!(f.ops()[1], Expr::symbol("_2"));
        assert_eq!(f.ops()[2], Expr::symbol("_1"));

        // first-occurrence order: _2 binds the first argument
        let result = apply(&mut ctxt, &f, &[Expr::num(10), Expr::num(4)]).unwrap();
        assert_eq!(result, Expr::num(6));
    }

    #[test]
    fn bare_underscore_is_first_parameter() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &Expr::call("Function", vec![
            Expr::call("Multiply", vec![Expr::symbol("_"), Expr::symbol("_")]),
        ]));
        assert_eq!(f.ops().len(), 2);
        assert_eq!(f.ops()[1], Expr::symbol("_1"));

        let result = apply(&mut ctxt, &f, &[Expr::num(7)]).unwrap();
        assert_eq!(result, Expr::num(49));
    }

    #[test]
    fn exact_application() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &add_xy());
        let result = apply(&mut ctxt, &f, &[Expr::num(1), Expr::num(2)]).unwrap();
        assert_eq!(result, Expr::num(3));
    }

    #[test]
    fn too_many_arguments_is_no_result() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &add_xy());
        assert_eq!(apply(&mut ctxt, &f, &[Expr::num(1), Expr::num(2), Expr::num(3)]), None);
    }

    #[test]
    fn currying_binds_prefix_and_returns_literal() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &add_xy());
        let g = apply(&mut ctxt, &f, &[Expr::num(1)]).unwrap();
        assert_eq!(g.head(), Some("Function"));
        assert_eq!(g.ops().len(), 2);

        let result = apply(&mut ctxt, &g, &[Expr::num(2)]).unwrap();
        assert_eq!(result, Expr::num(3));
    }

    #[test]
    fn application_restores_the_caller_scope() {
        let mut ctxt = Context::default();
        let before = ctxt.current_scope();
        let f = canonicalize(&mut ctxt, &add_xy());
        apply(&mut ctxt, &f, &[Expr::num(1), Expr::num(2)]).unwrap();
        apply(&mut ctxt, &f, &[Expr::num(1)]).unwrap();
        assert_eq!(ctxt.current_scope(), before);
    }

    #[test]
    fn curried_literal_keeps_the_captured_scope() {
        let mut ctxt = Context::default();
        ctxt.push_scope();
        ctxt.assign("k", Expr::num(10));
        let f = canonicalize(&mut ctxt, &Expr::call("Function", vec![
            Expr::call("Add", vec![Expr::symbol("k"), Expr::symbol("x"), Expr::symbol("y")]),
            Expr::symbol("x"),
            Expr::symbol("y"),
        ]));
        ctxt.pop_scope();

        // partial application from outside the closure's frame
        let g = apply(&mut ctxt, &f, &[Expr::num(1)]).unwrap();
        assert_eq!(g.head(), Some("Function"));
        assert_eq!(g.scope(), f.scope());

        let result = apply(&mut ctxt, &g, &[Expr::num(2)]).unwrap();
        assert_eq!(result, Expr::num(13));
    }

    #[test]
    fn closures_resolve_against_the_captured_scope() {
        let mut ctxt = Context::default();
        ctxt.push_scope();
        ctxt.assign("k", Expr::num(10));
        let f = canonicalize(&mut ctxt, &Expr::call("Function", vec![
            Expr::call("Add", vec![Expr::symbol("k"), Expr::symbol("x")]),
            Expr::symbol("x"),
        ]));
        ctxt.pop_scope();

        // `k` is out of (lexical) scope here, but the literal still sees it
        let result = apply(&mut ctxt, &f, &[Expr::num(5)]).unwrap();
        assert_eq!(result, Expr::num(15));
    }

    #[test]
    fn non_symbol_parameter_is_an_error() {
        let mut ctxt = Context::default();
        let f = canonicalize(&mut ctxt, &Expr::call("Function", vec![
            Expr::symbol("x"),
            Expr::num(1),
        ]));
        assert_eq!(f.error_code(), Some("incompatible-type"));
    }
}
