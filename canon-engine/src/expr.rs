//! The boxed expression: the immutable node type every component of the engine reads and
//! produces.
//!
//! An [`Expr`] is a cheap clone (a reference-counted handle) over one of four variants: a
//! symbol, a string, a numeric literal from the tower, or a function application (an operator
//! name plus ordered operands). Once constructed a node never changes; the canonicalizer builds
//! new nodes rather than mutating, and marks its outputs with the `canonical` flag so that
//! re-canonicalization is a no-op.
//!
//! A function-literal node may additionally *retain* a handle to the scope it was canonicalized
//! in, for later evaluation of its body. The handle is an index into the engine's scope arena
//! and is lookup-only: it never extends any scope's lifetime, so the graph's ownership stays
//! acyclic even though expressions and scopes cross-reference.

use canon_num::{arith, Numeric};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use crate::error::ErrorCode;
use crate::scope::ScopeId;

/// The head name of in-graph error nodes.
pub const ERROR_HEAD: &str = "Error";

/// The head name of structured error codes (errors that carry more than a bare code string).
pub const ERROR_CODE_HEAD: &str = "ErrorCode";

/// One variant of a boxed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// An identifier, resolved through the scope chain.
    Symbol(String),

    /// An immutable character sequence.
    Str(String),

    /// A numeric literal.
    Num(Numeric),

    /// An operator application: a head name and ordered operands.
    Call(String, Vec<Expr>),
}

#[derive(Debug)]
struct Repr {
    kind: ExprKind,
    canonical: bool,
    scope: Option<ScopeId>,
}

/// An immutable boxed expression. Clones share the underlying node.
#[derive(Debug, Clone)]
pub struct Expr {
    repr: Rc<Repr>,
}

impl Expr {
    fn new(kind: ExprKind, canonical: bool, scope: Option<ScopeId>) -> Self {
        Self {
            repr: Rc::new(Repr { kind, canonical, scope }),
        }
    }

    /// Creates a raw (not yet canonical) symbol.
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Symbol(name.into()), false, None)
    }

    /// Creates a raw string node.
    pub fn str(s: impl Into<String>) -> Self {
        Self::new(ExprKind::Str(s.into()), false, None)
    }

    /// Creates a raw numeric literal.
    pub fn num(n: impl Into<Numeric>) -> Self {
        Self::new(ExprKind::Num(n.into()), false, None)
    }

    /// Creates a raw function application.
    pub fn call(head: impl Into<String>, ops: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(head.into(), ops), false, None)
    }

    /// Rebuilds this node's kind with the canonical flag set. Used by the canonicalizer only.
    pub(crate) fn into_canonical(kind: ExprKind) -> Self {
        Self::new(kind, true, None)
    }

    /// Like [`Expr::into_canonical`], but retaining a scope handle for later body evaluation.
    pub(crate) fn into_canonical_scoped(kind: ExprKind, scope: ScopeId) -> Self {
        Self::new(kind, true, Some(scope))
    }

    /// Builds a numeric literal node from a numeral written in an arbitrary base. A radix
    /// outside 2..=64 or a digit invalid in the radix surfaces as an in-graph `Error` node, the
    /// same way any other malformed operand does.
    pub fn num_from_radix(s: &str, radix: u8) -> Self {
        if !(2..=64).contains(&radix) {
            return Self::error(ErrorCode::UnexpectedBase, Some(Self::str(radix.to_string())));
        }
        match canon_num::primitive::from_str_radix(s, radix) {
            Ok(n) => Self::num(Numeric::from(n)),
            Err((_, digit)) => Self::error(
                ErrorCode::UnexpectedDigit,
                Some(Self::str(digit.to_string())),
            ),
        }
    }

    /// Builds the distinguished in-graph error node. Errors are canonical by construction and
    /// their operands are deliberately left untouched by the canonicalizer, so the offending
    /// expression survives for diagnostics.
    pub fn error(code: ErrorCode, context: Option<Expr>) -> Self {
        let code_expr = match &code {
            ErrorCode::IncompatibleType { expected, actual } => Self::into_canonical(
                ExprKind::Call(ERROR_CODE_HEAD.to_string(), vec![
                    Self::into_canonical(ExprKind::Str(code.code().to_string())),
                    Self::into_canonical(ExprKind::Str(expected.clone())),
                    Self::into_canonical(ExprKind::Str(actual.clone())),
                ]),
            ),
            _ => Self::into_canonical(ExprKind::Str(code.code().to_string())),
        };

        let mut ops = vec![code_expr];
        ops.extend(context);
        Self::new(ExprKind::Call(ERROR_HEAD.to_string(), ops), true, None)
    }

    /// The node's kind.
    pub fn kind(&self) -> &ExprKind {
        &self.repr.kind
    }

    /// Whether the node is already in canonical form.
    pub fn is_canonical(&self) -> bool {
        self.repr.canonical
    }

    /// The scope this node retained at canonicalization time, if any.
    pub fn scope(&self) -> Option<ScopeId> {
        self.repr.scope
    }

    /// If the node is a function application, returns its head name.
    pub fn head(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Call(head, _) => Some(head),
            _ => None,
        }
    }

    /// The node's operands; atoms have none.
    pub fn ops(&self) -> &[Expr] {
        match self.kind() {
            ExprKind::Call(_, ops) => ops,
            _ => &[],
        }
    }

    /// If the node is a symbol, returns its name.
    pub fn as_symbol(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// If the node is a string, returns its contents.
    pub fn as_str(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Str(s) => Some(s),
            _ => None,
        }
    }

    /// If the node is a numeric literal, returns its value.
    pub fn as_num(&self) -> Option<&Numeric> {
        match self.kind() {
            ExprKind::Num(n) => Some(n),
            _ => None,
        }
    }

    /// Returns true if the node is an `Error` application.
    pub fn is_error(&self) -> bool {
        self.head() == Some(ERROR_HEAD)
    }

    /// Collects every `Error` node in the tree, in pre-order. One pass over a canonicalized
    /// tree therefore enumerates everything that went wrong.
    pub fn errors(&self) -> Vec<Expr> {
        let mut found = Vec::new();
        self.collect_errors(&mut found);
        found
    }

    fn collect_errors(&self, found: &mut Vec<Expr>) {
        if self.is_error() {
            found.push(self.clone());
            return;
        }
        for op in self.ops() {
            op.collect_errors(found);
        }
    }

    /// The machine code of an `Error` node (its first operand), if this is one.
    pub fn error_code(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        match self.ops().first().map(Expr::kind) {
            Some(ExprKind::Str(code)) => Some(code),
            Some(ExprKind::Call(head, ops)) if head == ERROR_CODE_HEAD => {
                ops.first().and_then(Expr::as_str)
            },
            _ => None,
        }
    }

    /// The total order used to sort the operands of commutative operators: numbers first,
    /// ordered by value, then strings, then symbols lexically, then applications by head and
    /// then operand-wise. Numerically equal but structurally distinct literals (an exact `1`
    /// and a float `1.0`), and unordered pairs (complex, NaN), tie-break on representation so
    /// the order is total and independent of input order.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        use ExprKind::*;
        match (self.kind(), other.kind()) {
            (Num(a), Num(b)) => match arith::try_cmp(a, b) {
                Some(Ordering::Less) => Ordering::Less,
                Some(Ordering::Greater) => Ordering::Greater,
                Some(Ordering::Equal) | None => numeric_rank(a)
                    .cmp(&numeric_rank(b))
                    .then_with(|| format!("{:?}", a).cmp(&format!("{:?}", b))),
            },
            (Num(_), _) => Ordering::Less,
            (_, Num(_)) => Ordering::Greater,
            (Str(a), Str(b)) => a.cmp(b),
            (Str(_), _) => Ordering::Less,
            (_, Str(_)) => Ordering::Greater,
            (Symbol(a), Symbol(b)) => a.cmp(b),
            (Symbol(_), _) => Ordering::Less,
            (_, Symbol(_)) => Ordering::Greater,
            (Call(ah, aops), Call(bh, bops)) => ah.cmp(bh).then_with(|| {
                for (a, b) in aops.iter().zip(bops.iter()) {
                    match a.canonical_cmp(b) {
                        Ordering::Equal => continue,
                        other => return other,
                    }
                }
                aops.len().cmp(&bops.len())
            }),
        }
    }
}

/// The sort position of a literal's representation: exact before approximate, real before
/// complex.
fn numeric_rank(n: &Numeric) -> u8 {
    match n {
        Numeric::Int(_) => 0,
        Numeric::Rational(..) => 1,
        Numeric::BigRational(_) => 2,
        Numeric::Float(_) => 3,
        Numeric::Decimal(_) => 4,
        Numeric::Complex(_) => 5,
    }
}

/// Structural equality: the canonical flag and any retained scope handle are ignored, so a raw
/// expression and its canonicalized twin compare equal when their structure matches.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.repr, &other.repr) || self.kind() == other.kind()
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ExprKind::Symbol(name) => write!(f, "{}", name),
            ExprKind::Str(s) => write!(f, "{:?}", s),
            ExprKind::Num(n) => write!(f, "{}", n),
            ExprKind::Call(head, ops) => {
                write!(f, "{}(", head)?;
                let mut iter = ops.iter();
                if let Some(op) = iter.next() {
                    write!(f, "{}", op)?;
                    for op in iter {
                        write!(f, ", {}", op)?;
                    }
                }
                write!(f, ")")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn structural_equality_ignores_canonical_flag() {
        let raw = Expr::symbol("x");
        let canonical = Expr::into_canonical(ExprKind::Symbol("x".to_string()));
        assert_eq!(raw, canonical);
    }

    #[test]
    fn error_node_shape() {
        let err = Expr::error(ErrorCode::Missing, None);
        assert!(err.is_error());
        assert_eq!(err.error_code(), Some("missing"));

        let err = Expr::error(
            ErrorCode::IncompatibleType {
                expected: "Number".to_string(),
                actual: "String".to_string(),
            },
            Some(Expr::str("oops")),
        );
        assert_eq!(err.error_code(), Some("incompatible-type"));
        assert_eq!(err.ops().len(), 2);
    }

    #[test]
    fn errors_are_enumerable_in_one_pass() {
        let tree = Expr::call("Add", vec![
            Expr::num(1),
            Expr::error(ErrorCode::Missing, None),
            Expr::call("Multiply", vec![
                Expr::error(ErrorCode::UnexpectedArgument, None),
                Expr::num(2),
            ]),
        ]);
        assert_eq!(tree.errors().len(), 2);
    }

    #[test]
    fn radix_literals_parse_or_carry_errors() {
        assert_eq!(Expr::num_from_radix("ff", 16), Expr::num(255));
        assert_eq!(
            Expr::num_from_radix("12a", 10).error_code(),
            Some("unexpected-digit"),
        );
        assert_eq!(
            Expr::num_from_radix("10", 65).error_code(),
            Some("unexpected-base"),
        );
    }

    #[test]
    fn equal_literals_order_by_representation() {
        let exact = Expr::num(1);
        let approx = Expr::num(1.0);
        // both input orders sort the exact literal first
        for mut ops in [vec![exact.clone(), approx.clone()], vec![approx.clone(), exact.clone()]] {
            ops.sort_by(Expr::canonical_cmp);
            assert_eq!(ops[0], exact);
            assert_eq!(ops[1], approx);
        }
    }

    #[test]
    fn canonical_order_numbers_before_symbols() {
        let mut ops = vec![Expr::symbol("x"), Expr::num(3), Expr::num(1), Expr::symbol("a")];
        ops.sort_by(Expr::canonical_cmp);
        assert_eq!(ops, vec![Expr::num(1), Expr::num(3), Expr::symbol("a"), Expr::symbol("x")]);
    }
}
