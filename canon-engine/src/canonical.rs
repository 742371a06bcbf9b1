//! The canonicalizer: an idempotent map from raw expressions to canonical form.
//!
//! The operator-independent pipeline is:
//!
//! 1. Atoms canonicalize in place: numeric literals reduce to their smallest representation,
//!    unbound symbols auto-declare themselves in the current scope, strings pass through.
//! 2. If the operator has a registered canonical hook, the hook alone decides how (and whether)
//!    the operands canonicalize. This is how hold operators such as `Hold`, `Error`, and
//!    `Function` keep their operands raw.
//! 3. Otherwise: nested applications of the same associative operator flatten into one operand
//!    list; commutative operand lists sort by [`Expr::canonical_cmp`] so semantically identical
//!    expressions become structurally identical trees; the operand list is validated against
//!    the operator's signature; and an all-literal application of a pure operator folds to a
//!    literal through its evaluation hook.
//! 4. An unbound symbol in operator position auto-declares an operator definition of unknown
//!    signature, after its arguments have been processed.

use canon_num::Numeric;
use crate::ctxt::Context;
use crate::expr::{Expr, ExprKind};
use crate::scope::{Definition, OperatorDef};
use crate::validate::{flatten_sequences, validate_arguments};

/// Canonicalizes an expression. Canonicalizing an already-canonical expression is a no-op that
/// returns a shared handle.
pub fn canonicalize(ctxt: &mut Context, expr: &Expr) -> Expr {
    if expr.is_canonical() {
        return expr.clone();
    }

    match expr.kind() {
        ExprKind::Num(n) => Expr::into_canonical(ExprKind::Num(n.clone().canonical())),
        ExprKind::Str(s) => Expr::into_canonical(ExprKind::Str(s.clone())),
        ExprKind::Symbol(name) => {
            ctxt.auto_declare_value(name);
            Expr::into_canonical(ExprKind::Symbol(name.clone()))
        },
        ExprKind::Call(head, ops) => canonicalize_call(ctxt, head, ops),
    }
}

fn canonicalize_call(ctxt: &mut Context, head: &str, ops: &[Expr]) -> Expr {
    match ctxt.lookup(head) {
        Some(Definition::Operator(def)) => {
            if let Some(hook) = def.canonical {
                return hook(ctxt, ops.to_vec());
            }
            generic_call(ctxt, head, ops, &def)
        },
        // the head is bound as a value (e.g. a symbol holding a function literal): the call is
        // an application, resolved at evaluation time
        Some(Definition::Value(_)) => {
            let ops = canonicalize_ops(ctxt, ops);
            Expr::into_canonical(ExprKind::Call(head.to_string(), ops))
        },
        None => {
            // arguments are processed before the head is declared, so `x(x + 1)`-style
            // self-reference resolves against the argument's auto-declaration
            let ops = canonicalize_ops(ctxt, ops);
            ctxt.auto_declare_operator(head);
            Expr::into_canonical(ExprKind::Call(head.to_string(), ops))
        },
    }
}

/// The generic (hook-less) canonicalization path.
fn generic_call(ctxt: &mut Context, head: &str, ops: &[Expr], def: &OperatorDef) -> Expr {
    let mut ops = canonicalize_ops(ctxt, ops);

    if def.attrs.associative {
        ops = flatten_head(head, ops);
    }

    if !def.signature.is_unknown() {
        ops = validate_arguments(ctxt, &ops, &def.signature, false).0;
    }

    if def.attrs.commutative {
        ops.sort_by(Expr::canonical_cmp);
    }

    if def.attrs.pure && ops.iter().all(|op| op.as_num().is_some()) {
        if let Some(folded) = def.evaluate.and_then(|f| f(ctxt, &ops)) {
            return canonicalize(ctxt, &folded);
        }
    }

    Expr::into_canonical(ExprKind::Call(head.to_string(), ops))
}

/// Canonicalizes an operand list, splicing `Sequence` markers.
pub(crate) fn canonicalize_ops(ctxt: &mut Context, ops: &[Expr]) -> Vec<Expr> {
    flatten_sequences(ops)
        .iter()
        .map(|op| canonicalize(ctxt, op))
        .collect()
}

/// Flattens nested applications of the same associative operator into one operand list.
pub(crate) fn flatten_head(head: &str, ops: Vec<Expr>) -> Vec<Expr> {
    let mut flat = Vec::with_capacity(ops.len());
    for op in ops {
        if op.head() == Some(head) {
            flat.extend(flatten_head(head, op.ops().to_vec()));
        } else {
            flat.push(op);
        }
    }
    flat
}

/// Shared canonicalization for variadic, associative, commutative, pure arithmetic operators
/// (`Add`, `Multiply`): flatten, sort, fold every numeric literal into one through the tower,
/// drop the identity element, and collapse degenerate argument lists.
pub(crate) fn canonical_variadic(
    ctxt: &mut Context,
    head: &str,
    ops: Vec<Expr>,
    identity: Numeric,
    fold: fn(&Numeric, &Numeric) -> Numeric,
) -> Expr {
    let ops = canonicalize_ops(ctxt, &ops);
    let ops = flatten_head(head, ops);
    let sig = crate::scope::Signature::variadic(crate::types::Type::Number, crate::types::Type::Number);
    let (ops, _) = validate_arguments(ctxt, &ops, &sig, false);

    let mut folded: Option<Numeric> = None;
    let mut rest = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(n) = op.as_num() {
            folded = Some(match &folded {
                Some(acc) => fold(acc, n),
                None => n.clone(),
            });
            continue;
        }
        rest.push(op);
    }

    let folded = folded.map(Numeric::canonical);
    if let Some(n) = &folded {
        // an exact zero annihilates a product outright
        if head == "Multiply" && n.is_zero() && n.is_exact() {
            return Expr::into_canonical(ExprKind::Num(Numeric::Int(0)));
        }
    }

    let mut terms = Vec::with_capacity(rest.len() + 1);
    if let Some(n) = folded {
        if n != identity || rest.is_empty() {
            terms.push(Expr::into_canonical(ExprKind::Num(n)));
        }
    }
    terms.extend(rest);
    terms.sort_by(Expr::canonical_cmp);

    match terms.len() {
        0 => Expr::into_canonical(ExprKind::Num(identity)),
        1 => terms.pop().unwrap(),
        _ => Expr::into_canonical(ExprKind::Call(head.to_string(), terms)),
    }
}

/// Folds `Add(int, rational)` and friends for literal arithmetic without going through the
/// registry; used by the invisible-operator rules.
pub(crate) fn fold_pair(a: &Numeric, b: &Numeric, f: fn(&Numeric, &Numeric) -> Numeric) -> Expr {
    Expr::into_canonical(ExprKind::Num(f(a, b).canonical()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use crate::eval::evaluate;
    use super::*;

    fn canon(ctxt: &mut Context, expr: &Expr) -> Expr {
        canonicalize(ctxt, expr)
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let mut ctxt = Context::default();
        let exprs = vec![
            Expr::num(Numeric::rational(6, 4)),
            Expr::call("Add", vec![Expr::symbol("x"), Expr::num(2), Expr::symbol("a")]),
            Expr::call("Multiply", vec![
                Expr::call("Add", vec![Expr::symbol("y"), Expr::num(1)]),
                Expr::num(3),
            ]),
            Expr::call("Sqrt", vec![Expr::num(75)]),
            Expr::call("Hold", vec![Expr::call("Add", vec![Expr::num(1), Expr::num(2)])]),
        ];

        for expr in exprs {
            let once = canon(&mut ctxt, &expr);
            let twice = canon(&mut ctxt, &once);
            assert_eq!(once, twice);
            assert!(once.is_canonical());
        }
    }

    #[test]
    fn commutative_ordering_is_permutation_stable() {
        let mut ctxt = Context::default();
        let ops = vec![Expr::symbol("x"), Expr::num(3), Expr::symbol("a"), Expr::num(1)];

        let reference = canon(&mut ctxt, &Expr::call("Add", ops.clone()));
        // a handful of distinct permutations
        let permutations: Vec<Vec<usize>> = vec![
            vec![0, 1, 2, 3],
            vec![3, 2, 1, 0],
            vec![1, 3, 0, 2],
            vec![2, 0, 3, 1],
        ];
        for p in permutations {
            let permuted: Vec<Expr> = p.into_iter().map(|i| ops[i].clone()).collect();
            assert_eq!(canon(&mut ctxt, &Expr::call("Add", permuted)), reference);
        }
    }

    #[test]
    fn associative_flattening() {
        let mut ctxt = Context::default();
        let nested = Expr::call("Add", vec![
            Expr::symbol("x"),
            Expr::call("Add", vec![Expr::symbol("y"), Expr::call("Add", vec![Expr::symbol("z")])]),
        ]);
        let flat = canon(&mut ctxt, &nested);
        assert_eq!(flat.head(), Some("Add"));
        assert_eq!(flat.ops().len(), 3);
    }

    #[test]
    fn literal_folding() {
        let mut ctxt = Context::default();
        let sum = canon(&mut ctxt, &Expr::call("Add", vec![
            Expr::num(1),
            Expr::num(Numeric::rational(1, 2)),
            Expr::num(Numeric::rational(1, 2)),
        ]));
        assert_eq!(sum, Expr::num(2));

        let mixed = canon(&mut ctxt, &Expr::call("Add", vec![
            Expr::num(2),
            Expr::symbol("x"),
            Expr::num(3),
        ]));
        assert_eq!(mixed, Expr::call("Add", vec![Expr::num(5), Expr::symbol("x")]));
    }

    #[test]
    fn identity_elements_are_dropped() {
        let mut ctxt = Context::default();
        let sum = canon(&mut ctxt, &Expr::call("Add", vec![Expr::num(0), Expr::symbol("x")]));
        assert_eq!(sum, Expr::symbol("x"));

        let product = canon(&mut ctxt, &Expr::call("Multiply", vec![Expr::num(1), Expr::symbol("x")]));
        assert_eq!(product, Expr::symbol("x"));
    }

    #[test]
    fn exact_zero_annihilates_product() {
        let mut ctxt = Context::default();
        let product = canon(&mut ctxt, &Expr::call("Multiply", vec![Expr::num(0), Expr::symbol("x")]));
        assert_eq!(product, Expr::num(0));
    }

    #[test]
    fn hold_skips_operand_canonicalization() {
        let mut ctxt = Context::default();
        let inner = Expr::call("Add", vec![Expr::num(2), Expr::num(1)]);
        let held = canon(&mut ctxt, &Expr::call("Hold", vec![inner.clone()]));
        assert!(held.is_canonical());
        // the operand is untouched: not folded, not reordered
        assert_eq!(held.ops()[0], inner);
    }

    #[test]
    fn unbound_head_auto_declares() {
        let mut ctxt = Context::default();
        let call = canon(&mut ctxt, &Expr::call("f", vec![Expr::symbol("x")]));
        assert_eq!(call.head(), Some("f"));
        assert!(matches!(ctxt.lookup("f"), Some(Definition::Operator(_))));
        // and evaluation leaves the unknown call intact
        assert_eq!(evaluate(&mut ctxt, &call), call);
    }

    #[test]
    fn error_operand_does_not_abort_siblings() {
        let mut ctxt = Context::default();
        ctxt.strict = true;
        // Factorial is unary; the inner arity error must not stop the outer Add from folding
        // its remaining literals
        let expr = Expr::call("Add", vec![
            Expr::num(1),
            Expr::num(2),
            Expr::call("Factorial", vec![]),
        ]);
        let canonical = canon(&mut ctxt, &expr);
        assert_eq!(canonical.head(), Some("Add"));
        assert_eq!(canonical.ops()[0], Expr::num(3));
        assert_eq!(canonical.errors().len(), 1);
    }
}
