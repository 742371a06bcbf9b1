//! The engine context: configuration, the scope arena, and the definition registry operations.
//!
//! A [`Context`] is one engine instance. It is single-threaded state: boxed expressions are
//! freely shareable, but a context (its scopes and registry) must never be shared across
//! concurrent engine instances.

use canon_num::consts;
use canon_num::Numeric;
use levenshtein::levenshtein;
use std::time::Instant;
use crate::expr::{Expr, ExprKind};
use crate::scope::{Definition, Scope, ScopeId, ValueDef};
use crate::types::Type;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default iteration ceiling for bounded loops.
pub const DEFAULT_ITERATION_LIMIT: usize = 1 << 20;

/// The trigonometric mode of a context, consumed by trigonometric canonical hooks registered
/// through the operator table seam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrigMode {
    /// Use radians.
    #[default]
    Radians,

    /// Use degrees.
    Degrees,
}

impl std::fmt::Display for TrigMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrigMode::Radians => write!(f, "radians"),
            TrigMode::Degrees => write!(f, "degrees"),
        }
    }
}

/// The preferred precision for approximate ("N" mode) evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrecisionMode {
    /// Machine floats.
    #[default]
    Machine,

    /// Arbitrary-precision decimals at the working precision.
    Arbitrary,
}

/// An engine instance: configuration, the scope arena, and the current-scope cursor.
#[derive(Debug, Clone)]
pub struct Context {
    /// The scope arena. Index 0 is the global scope. Frames are never removed: popping a scope
    /// moves the cursor, so handles retained by function literals stay valid.
    scopes: Vec<Scope>,

    /// The current scope.
    current: ScopeId,

    /// In strict mode the validator pads and tags arity mismatches and aborts ill-typed
    /// applications; in non-strict mode those checks take their fast paths.
    pub strict: bool,

    /// Preferred precision for numeric evaluation.
    pub precision: PrecisionMode,

    /// Angular unit consumed by trigonometric hooks.
    pub trig_mode: TrigMode,

    /// Iteration ceiling for bounded loops.
    pub iteration_limit: usize,

    /// Optional deadline polled between chunks of bounded work.
    pub deadline: Option<Instant>,

    /// When false, an operation that fails over the reals produces an `Error` instead of
    /// promoting to complex.
    pub allow_complex: bool,

    /// Counter backing fresh anonymous parameter names.
    fresh_counter: usize,
}

impl Default for Context {
    fn default() -> Self {
        let mut ctxt = Self {
            scopes: vec![Scope::new(None)],
            current: ScopeId(0),
            strict: false,
            precision: PrecisionMode::default(),
            trig_mode: TrigMode::default(),
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            deadline: None,
            allow_complex: true,
            fresh_counter: 0,
        };

        for (name, def) in crate::ops::all() {
            ctxt.scopes[0].defs.insert(name.to_string(), Definition::Operator(def));
        }
        for (name, def) in builtin_values() {
            ctxt.scopes[0].defs.insert(name.to_string(), Definition::Value(def));
        }

        ctxt
    }
}

/// The constants bound in every default context.
fn builtin_values() -> Vec<(&'static str, ValueDef)> {
    vec![
        ("Pi", ValueDef::constant(Type::Real, Expr::num(Numeric::Decimal(consts::PI.clone())))),
        ("ExponentialE", ValueDef::constant(Type::Real, Expr::num(Numeric::Decimal(consts::E.clone())))),
        ("GoldenRatio", ValueDef::constant(Type::Real, Expr::num(Numeric::Decimal(consts::PHI.clone())))),
        (
            "ImaginaryUnit",
            ValueDef::constant(
                Type::Complex,
                Expr::num(Numeric::complex_unchecked(consts::I.clone())),
            ),
        ),
        ("True", ValueDef::of_type(Type::Boolean)),
        ("False", ValueDef::of_type(Type::Boolean)),
        ("NaN", ValueDef::constant(Type::Number, Expr::num(f64::NAN))),
        ("ComplexInfinity", ValueDef::of_type(Type::Number)),
        ("Nothing", ValueDef::of_type(Type::Nothing)),
    ]
}

impl Context {
    /// Creates a context with an empty global scope: no operators, no constants. Mostly useful
    /// in tests; consider [`Default`] instead.
    pub fn empty() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
            ..Default::default()
        }
    }

    /// The current scope.
    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Looks up a definition, walking the parent chain from the current scope outward.
    pub fn lookup(&self, name: &str) -> Option<Definition> {
        self.lookup_in(self.current, name)
    }

    /// Looks up a definition starting from a specific scope.
    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<Definition> {
        let mut at = Some(scope);
        while let Some(id) = at {
            let scope = &self.scopes[id.0];
            if let Some(def) = scope.defs.get(name) {
                return Some(def.clone());
            }
            at = scope.parent;
        }
        None
    }

    /// Declares a definition in the current scope.
    ///
    /// Re-declaring a name in the same scope replaces the old definition only if the old one
    /// was auto-declared by the canonicalizer; replacing an explicit definition is reported as
    /// an in-graph error expression.
    pub fn declare(&mut self, name: &str, def: Definition) -> Result<(), Expr> {
        let scope = &mut self.scopes[self.current.0];
        match scope.defs.get(name) {
            Some(Definition::Value(existing)) if !existing.inferred => {
                Err(Expr::error(
                    crate::error::ErrorCode::IncompatibleType {
                        expected: "undeclared symbol".to_string(),
                        actual: "declared symbol".to_string(),
                    },
                    Some(Expr::symbol(name)),
                ))
            },
            _ => {
                scope.defs.insert(name.to_string(), def);
                Ok(())
            },
        }
    }

    /// Auto-declares an unbound symbol as a value of unknown type. No-op if the name already
    /// resolves through the chain.
    pub fn auto_declare_value(&mut self, name: &str) {
        if self.lookup(name).is_none() {
            self.scopes[self.current.0]
                .defs
                .insert(name.to_string(), Definition::Value(ValueDef::unknown()));
        }
    }

    /// Auto-declares an unbound head as an operator of unknown signature.
    pub fn auto_declare_operator(&mut self, name: &str) {
        if self.lookup(name).is_none() {
            self.scopes[self.current.0].defs.insert(
                name.to_string(),
                Definition::Operator(crate::scope::OperatorDef::unknown()),
            );
        }
    }

    /// Writes the inferred type of a symbol into its existing definition, walking the chain.
    pub fn infer_type(&mut self, name: &str, ty: Type) {
        let mut at = Some(self.current);
        while let Some(id) = at {
            if let Some(Definition::Value(def)) = self.scopes[id.0].defs.get_mut(name) {
                if def.ty == Type::Unknown {
                    def.ty = ty;
                }
                return;
            }
            at = self.scopes[id.0].parent;
        }
    }

    /// Assigns a value to a symbol: mutates the innermost existing value definition in place,
    /// or declares one in the current scope if the symbol is unbound.
    pub fn assign(&mut self, name: &str, value: Expr) {
        let ty = self.type_of(&value);
        let mut at = Some(self.current);
        while let Some(id) = at {
            if let Some(Definition::Value(def)) = self.scopes[id.0].defs.get_mut(name) {
                def.value = Some(value);
                def.ty = ty;
                def.approximation = false;
                return;
            }
            at = self.scopes[id.0].parent;
        }
        self.scopes[self.current.0].defs.insert(
            name.to_string(),
            Definition::Value(ValueDef::bound(ty, value)),
        );
    }

    /// Pushes a fresh scope under the current one and moves the cursor into it.
    pub fn push_scope(&mut self) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(Some(self.current)));
        self.current = id;
        id
    }

    /// Pops the current scope, returning the cursor to the parent. Pushes and pops must be
    /// strictly paired on every exit path.
    pub fn pop_scope(&mut self) {
        let parent = self.scopes[self.current.0].parent;
        debug_assert!(parent.is_some(), "popped the global scope");
        if let Some(parent) = parent {
            self.current = parent;
        }
    }

    /// Moves the cursor to an arbitrary scope (a function literal's captured scope), returning
    /// the previous cursor so the caller can restore it.
    pub fn swap_scope(&mut self, scope: ScopeId) -> ScopeId {
        std::mem::replace(&mut self.current, scope)
    }

    /// Returns names bound anywhere on the chain that are within edit distance 1 of `name`,
    /// for "did you mean" diagnostics.
    pub fn similar_names(&self, name: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut at = Some(self.current);
        while let Some(id) = at {
            let scope = &self.scopes[id.0];
            found.extend(
                scope
                    .defs
                    .keys()
                    .filter(|n| levenshtein(n, name) < 2)
                    .cloned(),
            );
            at = scope.parent;
        }
        found.sort();
        found.dedup();
        found
    }

    /// Returns a fresh symbol name guaranteed not to collide with any of `avoid`. Used when
    /// currying renames leftover parameters.
    pub fn fresh_name(&mut self, avoid: &[&str]) -> String {
        loop {
            self.fresh_counter += 1;
            let candidate = format!("_{}", self.fresh_counter);
            if !avoid.contains(&candidate.as_str()) && self.lookup(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// The coarse type of an expression under this context.
    pub fn type_of(&self, expr: &Expr) -> Type {
        match expr.kind() {
            ExprKind::Num(n) => Type::of_numeric(n),
            ExprKind::Str(_) => Type::Str,
            ExprKind::Symbol(name) => match self.lookup(name) {
                Some(Definition::Value(def)) => def.ty,
                Some(Definition::Operator(_)) => Type::Function,
                None => Type::Unknown,
            },
            ExprKind::Call(head, _) => {
                if expr.is_error() {
                    return Type::Nothing;
                }
                match head.as_str() {
                    "Function" => Type::Function,
                    "Tuple" => Type::Collection,
                    _ => match self.lookup(head) {
                        Some(Definition::Operator(def)) => def.signature.result,
                        _ => Type::Unknown,
                    },
                }
            },
        }
    }
}
