//! Evaluation of canonical expressions.
//!
//! Evaluation is canonicalize-then-reduce: operands reduce bottom-up (bound symbols replaced by
//! their values, sub-applications reduced), the node re-canonicalizes whenever an operand
//! changed, and finally the operator's evaluation hook runs. A hook returning `None` means the
//! application cannot reduce further; the expression stays in symbolic form, which is an
//! ordinary outcome and not an error.
//!
//! [`evaluate_num`] additionally pushes every exact literal into the approximate side of the
//! tower (machine floats or arbitrary-precision decimals, per [`PrecisionMode`]), prefers
//! operators' numeric hooks, and chops negligible residue from the result.

use std::time::Instant;
use canon_num::{arith, Numeric, Sign};
use crate::canonical::canonicalize;
use crate::ctxt::{Context, PrecisionMode};
use crate::expr::{Expr, ExprKind};
use crate::scope::{Definition, ValueDef};

/// Evaluates an expression symbolically. Exact stays exact.
pub fn evaluate(ctxt: &mut Context, expr: &Expr) -> Expr {
    let expr = canonicalize(ctxt, expr);
    reduce(ctxt, &expr, false).unwrap_or(expr)
}

/// Evaluates an expression numerically: every exact literal converts to the approximate
/// representation selected by the context's precision mode before operators reduce.
pub fn evaluate_num(ctxt: &mut Context, expr: &Expr) -> Expr {
    let expr = canonicalize(ctxt, expr);
    let reduced = reduce(ctxt, &expr, true).unwrap_or(expr);

    let approx = approximate(ctxt.precision, &reduced);
    let approx = canonicalize(ctxt, &approx);
    let reduced = reduce(ctxt, &approx, true).unwrap_or(approx);
    chop(&reduced)
}

fn reduce(ctxt: &mut Context, expr: &Expr, numeric: bool) -> Option<Expr> {
    match expr.kind() {
        ExprKind::Num(_) | ExprKind::Str(_) => None,
        ExprKind::Symbol(name) => match ctxt.lookup(name) {
            Some(Definition::Value(ValueDef { value: Some(value), approximation, .. }))
                if value != *expr && (numeric || !approximation) =>
            {
                // the stored value may itself be a raw or reducible expression
                let value = canonicalize(ctxt, &value);
                Some(reduce(ctxt, &value, numeric).unwrap_or(value))
            },
            _ => None,
        },
        ExprKind::Call(head, ops) => {
            if expr.is_error() {
                return None;
            }
            match ctxt.lookup(head) {
                Some(Definition::Operator(def)) => {
                    if !def.attrs.hold {
                        let mut changed = false;
                        let reduced: Vec<Expr> = ops
                            .iter()
                            .map(|op| match reduce(ctxt, op, numeric) {
                                Some(op) => {
                                    changed = true;
                                    op
                                },
                                None => op.clone(),
                            })
                            .collect();
                        if changed {
                            let expr = canonicalize(ctxt, &Expr::call(head.clone(), reduced));
                            return Some(reduce(ctxt, &expr, numeric).unwrap_or(expr));
                        }
                    }
                    let hook = if numeric {
                        def.evaluate_num.or(def.evaluate)
                    } else {
                        def.evaluate
                    };
                    hook.and_then(|f| f(ctxt, ops))
                },
                // a symbol bound to a function literal used in operator position
                Some(Definition::Value(ValueDef { value: Some(value), .. })) => {
                    crate::lambda::apply(ctxt, &value, ops)
                },
                _ => None,
            }
        },
    }
}

/// Rewrites every exact literal in the tree to its approximate counterpart. The rebuilt tree
/// is raw so re-canonicalization can fold what just became foldable.
fn approximate(mode: PrecisionMode, expr: &Expr) -> Expr {
    match expr.kind() {
        ExprKind::Num(n) => {
            let n = match mode {
                PrecisionMode::Machine => match n {
                    Numeric::Float(_) | Numeric::Complex(_) => return expr.clone(),
                    Numeric::Decimal(f) => Numeric::Float(f.to_f64()),
                    exact => Numeric::Float(exact.to_decimal().to_f64()),
                },
                PrecisionMode::Arbitrary => {
                    if !n.is_exact() {
                        return expr.clone();
                    }
                    Numeric::Decimal(n.to_decimal())
                },
            };
            Expr::num(n)
        },
        ExprKind::Call(head, ops) if !expr.is_error() && head != crate::lambda::FUNCTION_HEAD => {
            Expr::call(head.clone(), ops.iter().map(|op| approximate(mode, op)).collect())
        },
        _ => expr.clone(),
    }
}

/// Chops numeric residue below [`arith::CHOP_TOLERANCE`] out of every literal in the tree.
fn chop(expr: &Expr) -> Expr {
    match expr.kind() {
        ExprKind::Num(n) => {
            let chopped = arith::chop(n, arith::CHOP_TOLERANCE).canonical();
            if &chopped == n {
                expr.clone()
            } else {
                Expr::num(chopped)
            }
        },
        ExprKind::Call(head, ops) if !expr.is_error() => {
            Expr::into_canonical(ExprKind::Call(
                head.clone(),
                ops.iter().map(chop).collect(),
            ))
        },
        _ => expr.clone(),
    }
}

/// Infers the sign of an expression without fully evaluating it: literals report their own
/// sign, bound symbols defer to their values, applications defer to the operator's sign hook.
pub fn sgn(ctxt: &mut Context, expr: &Expr) -> Option<Sign> {
    match expr.kind() {
        ExprKind::Num(n) => n.sign(),
        ExprKind::Symbol(name) => match ctxt.lookup(name) {
            Some(Definition::Value(ValueDef { value: Some(value), .. })) if value != *expr => {
                sgn(ctxt, &value)
            },
            _ => None,
        },
        ExprKind::Call(head, ops) => match ctxt.lookup(head) {
            Some(Definition::Operator(def)) => def.sgn.and_then(|f| f(ctxt, ops)),
            _ => None,
        },
        ExprKind::Str(_) => None,
    }
}

/// A cooperative budget for unbounded operator loops. Counts iterations against the context's
/// limit and polls the wall-clock deadline every 256 steps.
pub(crate) struct Budget {
    remaining: usize,
    deadline: Option<Instant>,
    tick: u32,
}

impl Budget {
    pub fn new(ctxt: &Context) -> Self {
        Self {
            remaining: ctxt.iteration_limit,
            deadline: ctxt.deadline,
            tick: 0,
        }
    }

    /// Accounts one loop step. Returns `false` once the budget is exhausted; the loop must
    /// stop and report [`ErrorCode::IterationLimitExceeded`](crate::error::ErrorCode).
    pub fn step(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.tick = self.tick.wrapping_add(1);
        if self.tick % 256 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.remaining = 0;
                    return false;
                }
            }
        }
        true
    }
}
