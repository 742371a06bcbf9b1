//! Exact numeric tower for the canon computer-algebra engine.
//!
//! The tower is a closed set of numeric representations: machine integers and
//! floats, exact rationals over machine or arbitrary-precision integers,
//! arbitrary-precision decimals, and complex numbers. Binary operations are
//! total over the tower: any two members can be combined, and the result is
//! stored in the lowest-precision representation that captures it exactly,
//! promoting otherwise. See [`Numeric`] for the representation rules.
//!
//! The crate also provides the number-theoretic helpers the canonicalizer
//! relies on: gcd/lcm, prime factorization, exact root extraction (so that
//! `sqrt(75)` becomes `5 sqrt(3)` instead of a decimal), perfect-power
//! detection, and tri-state primality testing.

pub mod arith;
pub mod consts;
pub mod factor;
pub mod primitive;
pub mod prime;
mod value;

pub use prime::Primality;
pub use value::{Numeric, Sign};
