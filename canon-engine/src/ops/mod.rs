//! The built-in operator table.
//!
//! Each submodule contributes `(name, definition)` pairs; [`all`] is the flat table a default
//! [`Context`](crate::ctxt::Context) registers into its global scope. Definitions are plain
//! data (signature, attributes, hooks), so embedders can extend or shadow the table through
//! ordinary scope declarations.

use crate::scope::OperatorDef;

pub mod arithmetic;
pub mod number_theory;
pub mod structure;

/// Every built-in operator definition.
pub fn all() -> Vec<(&'static str, OperatorDef)> {
    let mut table = arithmetic::defs();
    table.extend(structure::defs());
    table.extend(number_theory::defs());
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_no_duplicate_names() {
        let table = all();
        let mut names: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        let len = names.len();
        names.dedup();
        assert_eq!(names.len(), len);
    }
}
