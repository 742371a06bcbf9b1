//! The type lattice used by the validator.
//!
//! Types are deliberately coarse: they exist to catch ill-typed operator applications during
//! canonicalization and to give the inference step something to write into auto-declared
//! symbols, not to be a full type system. `Unknown` is the type of a symbol that has not been
//! pinned down yet; it provisionally matches everything and is the target of deferred
//! inference (see [`validate`](crate::validate)).

use canon_num::Numeric;
use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coarse expression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// Not yet inferred; provisionally compatible with everything.
    Unknown,

    /// The top type.
    Anything,

    /// Any member of the numeric tower.
    Number,

    /// An exact integer.
    Integer,

    /// An exact rational (includes integers).
    Rational,

    /// A real number (includes rationals and approximate reals).
    Real,

    /// A complex number (includes reals).
    Complex,

    /// A logical value.
    Boolean,

    /// A character string.
    Str,

    /// A bare symbol.
    Symbol,

    /// A function literal or operator.
    Function,

    /// A tuple or other indexable collection.
    Collection,

    /// The bottom type; nothing inhabits it.
    Nothing,
}

impl Type {
    /// Returns true if a value of type `self` satisfies a parameter of type `expected`.
    ///
    /// The numeric chain is Integer ⊂ Rational ⊂ Real ⊂ Complex ⊂ Number ⊂ Anything. `Unknown`
    /// matches in both directions: an unknown operand is provisionally accepted, to be pinned
    /// by inference once its siblings validate.
    pub fn matches(self, expected: Type) -> bool {
        use Type::*;
        if self == expected || expected == Anything || self == Unknown || expected == Unknown {
            return true;
        }
        match expected {
            Number => matches!(self, Integer | Rational | Real | Complex),
            Complex => matches!(self, Integer | Rational | Real),
            Real => matches!(self, Integer | Rational),
            Rational => matches!(self, Integer),
            _ => false,
        }
    }

    /// The type of a numeric literal, by representation.
    pub fn of_numeric(n: &Numeric) -> Type {
        match n {
            Numeric::Int(_) => Type::Integer,
            Numeric::Rational(_, _) | Numeric::BigRational(_) => Type::Rational,
            Numeric::Float(_) | Numeric::Decimal(_) => Type::Real,
            Numeric::Complex(_) => Type::Complex,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Type::Unknown => "unknown",
            Type::Anything => "anything",
            Type::Number => "number",
            Type::Integer => "integer",
            Type::Rational => "rational",
            Type::Real => "real",
            Type::Complex => "complex",
            Type::Boolean => "boolean",
            Type::Str => "string",
            Type::Symbol => "symbol",
            Type::Function => "function",
            Type::Collection => "collection",
            Type::Nothing => "nothing",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_chain() {
        assert!(Type::Integer.matches(Type::Rational));
        assert!(Type::Integer.matches(Type::Number));
        assert!(Type::Rational.matches(Type::Complex));
        assert!(!Type::Complex.matches(Type::Real));
        assert!(!Type::Str.matches(Type::Number));
    }

    #[test]
    fn unknown_is_provisional() {
        assert!(Type::Unknown.matches(Type::Integer));
        assert!(Type::Integer.matches(Type::Unknown));
    }

    #[test]
    fn anything_is_top() {
        assert!(Type::Function.matches(Type::Anything));
        assert!(Type::Nothing.matches(Type::Anything));
    }
}
