//! Boxed-expression canonicalization and evaluation engine.
//!
//! The engine turns raw expression trees (symbols, strings, numeric literals, and operator
//! applications, as produced by any front-end parser) into **canonical form**: an immutable
//! [`Expr`](expr::Expr) graph in which associative operators are flattened, commutative operand
//! lists are sorted by a total order, numeric literals are stored in their smallest
//! precision-preserving representation, and every operand list satisfies its operator's declared
//! signature or carries explicit in-graph `Error` nodes.
//!
//! Canonicalization is idempotent: canonicalizing a canonical expression is a cheap no-op, and
//! semantically identical inputs produce structurally identical trees. On top of the canonical
//! form, the engine provides symbolic evaluation ([`eval::evaluate`]), approximate numeric
//! evaluation ([`eval::evaluate_num`]), and a function-literal/application engine with currying
//! and anonymous parameters ([`lambda`]).
//!
//! Errors are never thrown: every failure mode is represented *inside* the expression graph as
//! an `Error` function node (see [`error::ErrorCode`]), so a single malformed operand never
//! aborts processing of its siblings.

pub mod canonical;
pub mod ctxt;
pub mod error;
pub mod eval;
pub mod expr;
pub mod lambda;
pub mod ops;
pub mod scope;
pub mod types;
pub mod validate;

pub use canonical::canonicalize;
pub use ctxt::{Context, PrecisionMode, TrigMode};
pub use error::ErrorCode;
pub use eval::{evaluate, evaluate_num};
pub use expr::Expr;
pub use types::Type;
