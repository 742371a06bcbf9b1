//! The error taxonomy.
//!
//! Errors are kinds, not exceptions: the validator and canonicalizer recover locally by
//! substituting an `Error` function node at the offending position and continuing with the
//! siblings. The `Error` node is an ordinary part of the expression graph (see
//! [`Expr::error`](crate::expr::Expr::error)) and the only "exception channel" the engine has.

use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A machine-readable error code, carried as the first operand of an `Error` node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ErrorCode {
    /// A required operand is absent.
    Missing,

    /// An operand was supplied beyond the operator's arity.
    UnexpectedArgument,

    /// An operand's type does not satisfy the operator's signature.
    IncompatibleType {
        /// The type the signature requires.
        expected: String,

        /// The type the operand actually has.
        actual: String,
    },

    /// A delimiter group is malformed.
    InvalidDelimiter,

    /// A numeric literal specifies an unsupported base.
    UnexpectedBase,

    /// A numeric literal contains a digit invalid in its base.
    UnexpectedDigit,

    /// A bounded loop exhausted its iteration or time budget.
    IterationLimitExceeded,

    /// A function literal was required but the expression is not pure.
    ExpectedPureExpression,
}

impl ErrorCode {
    /// The machine code for this error kind, used as the wire representation.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::UnexpectedArgument => "unexpected-argument",
            Self::IncompatibleType { .. } => "incompatible-type",
            Self::InvalidDelimiter => "invalid-delimiter",
            Self::UnexpectedBase => "unexpected-base",
            Self::UnexpectedDigit => "unexpected-digit",
            Self::IterationLimitExceeded => "iteration-limit-exceeded",
            Self::ExpectedPureExpression => "expected-pure-expression",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
