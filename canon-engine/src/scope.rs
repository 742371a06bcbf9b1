//! Lexical scopes and the definitions they hold.
//!
//! A [`Scope`] is an ordered mapping from identifier to [`Definition`] plus a non-owning parent
//! back-reference. Scopes live in an arena owned by the engine [`Context`](crate::ctxt::Context)
//! and are addressed by [`ScopeId`]; popping a scope only moves the context's cursor back to the
//! parent, so a handle retained by a function literal stays valid for later body evaluation
//! without extending any ownership.

use std::collections::HashMap;
use crate::ctxt::Context;
use crate::expr::Expr;
use crate::types::Type;
use canon_num::Sign;

/// A lookup-only handle into the scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(pub(crate) usize);

/// A lexical binding frame.
#[derive(Debug, Clone)]
pub struct Scope {
    /// The enclosing scope, or [`None`] for the global scope.
    pub parent: Option<ScopeId>,

    /// The definitions declared in this scope.
    pub defs: HashMap<String, Definition>,
}

impl Scope {
    pub(crate) fn new(parent: Option<ScopeId>) -> Self {
        Self {
            parent,
            defs: HashMap::new(),
        }
    }
}

/// A registry entry for an identifier.
#[derive(Debug, Clone)]
pub enum Definition {
    /// A symbol with an inferred-or-declared type and, optionally, a bound value.
    Value(ValueDef),

    /// An operator with a signature and behavior hooks.
    Operator(OperatorDef),
}

/// A value definition.
#[derive(Debug, Clone)]
pub struct ValueDef {
    /// The symbol's type. Starts as [`Type::Unknown`] for auto-declared symbols and is written
    /// by inference.
    pub ty: Type,

    /// The bound value, if any. A symbol with no value evaluates to itself.
    pub value: Option<Expr>,

    /// True if the definition was auto-declared by the canonicalizer rather than by the user;
    /// auto-declared entries may be silently replaced by an explicit declaration.
    pub inferred: bool,

    /// True if the bound value is only a numeric approximation of the symbol (the named
    /// constants: `Pi`, `ExponentialE`, ...). Approximations substitute during numeric
    /// evaluation only; symbolic evaluation keeps the symbol.
    pub approximation: bool,
}

impl ValueDef {
    /// An auto-declared symbol of unknown type.
    pub fn unknown() -> Self {
        Self {
            ty: Type::Unknown,
            value: None,
            inferred: true,
            approximation: false,
        }
    }

    /// An explicitly typed, unbound symbol.
    pub fn of_type(ty: Type) -> Self {
        Self {
            ty,
            value: None,
            inferred: false,
            approximation: false,
        }
    }

    /// A symbol bound to a value.
    pub fn bound(ty: Type, value: Expr) -> Self {
        Self {
            ty,
            value: Some(value),
            inferred: false,
            approximation: false,
        }
    }

    /// A named constant: typed, with a numeric approximation that substitutes only during
    /// numeric evaluation.
    pub fn constant(ty: Type, approx: Expr) -> Self {
        Self {
            ty,
            value: Some(approx),
            inferred: false,
            approximation: true,
        }
    }
}

/// A canonicalization hook: receives the raw operands and fully owns the node. Used by hold
/// operators to skip operand canonicalization deliberately.
pub type CanonicalFn = fn(&mut Context, Vec<Expr>) -> Expr;

/// An evaluation hook. Returning [`None`] means "cannot reduce further" and the caller keeps
/// the expression unevaluated; it is *not* an error.
pub type EvalFn = fn(&mut Context, &[Expr]) -> Option<Expr>;

/// A sign-inference hook.
pub type SgnFn = fn(&mut Context, &[Expr]) -> Option<Sign>;

/// Structural attributes consumed by the generic canonicalization path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorAttrs {
    /// Nested applications of the operator flatten into one operand list.
    pub associative: bool,

    /// Operands are sorted by the canonical total order.
    pub commutative: bool,

    /// The operator has no side effects; an all-literal application folds to a literal.
    pub pure: bool,

    /// Operands are not canonicalized or evaluated (`Hold`, `Error`, `Function`).
    pub hold: bool,
}

/// The kind of a signature parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Required,
    Optional,
}

/// A single parameter slot in an operator signature.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub ty: Type,
    pub kind: ParamKind,
}

impl Param {
    pub fn required(ty: Type) -> Self {
        Self { ty, kind: ParamKind::Required }
    }

    pub fn optional(ty: Type) -> Self {
        Self { ty, kind: ParamKind::Optional }
    }
}

/// An operator signature: required then optional parameter slots, an optional variadic tail,
/// and a result type.
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<Param>,
    pub variadic: Option<Type>,
    pub result: Type,
}

impl Signature {
    /// The signature of an operator nothing is known about yet (auto-declared heads): any
    /// number of operands of any type.
    pub fn unknown() -> Self {
        Self {
            params: Vec::new(),
            variadic: Some(Type::Anything),
            result: Type::Unknown,
        }
    }

    /// A fixed-arity signature with the given required parameter types.
    pub fn required(params: &[Type], result: Type) -> Self {
        Self {
            params: params.iter().copied().map(Param::required).collect(),
            variadic: None,
            result,
        }
    }

    /// A variadic signature whose tail operands all have the given type.
    pub fn variadic(tail: Type, result: Type) -> Self {
        Self {
            params: Vec::new(),
            variadic: Some(tail),
            result,
        }
    }

    /// The number of required parameters.
    pub fn required_count(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Required)
            .count()
    }

    /// True if nothing is known about this operator's arity or types.
    pub fn is_unknown(&self) -> bool {
        self.params.is_empty() && self.variadic == Some(Type::Anything) && self.result == Type::Unknown
    }
}

/// An operator definition: signature, structural attributes, and behavior hooks.
#[derive(Debug, Clone)]
pub struct OperatorDef {
    pub signature: Signature,
    pub attrs: OperatorAttrs,

    /// Canonicalization hook; when present it alone decides how the node canonicalizes.
    pub canonical: Option<CanonicalFn>,

    /// Symbolic evaluation hook.
    pub evaluate: Option<EvalFn>,

    /// Numeric ("N" mode) evaluation hook; falls back to `evaluate` when absent.
    pub evaluate_num: Option<EvalFn>,

    /// Sign inference hook.
    pub sgn: Option<SgnFn>,
}

impl OperatorDef {
    /// An operator auto-declared from an unbound head: unknown signature, no attributes, no
    /// hooks.
    pub fn unknown() -> Self {
        Self {
            signature: Signature::unknown(),
            attrs: OperatorAttrs::default(),
            canonical: None,
            evaluate: None,
            evaluate_num: None,
            sgn: None,
        }
    }

    pub fn new(signature: Signature, attrs: OperatorAttrs) -> Self {
        Self {
            signature,
            attrs,
            canonical: None,
            evaluate: None,
            evaluate_num: None,
            sgn: None,
        }
    }

    pub fn with_canonical(mut self, hook: CanonicalFn) -> Self {
        self.canonical = Some(hook);
        self
    }

    pub fn with_evaluate(mut self, hook: EvalFn) -> Self {
        self.evaluate = Some(hook);
        self
    }

    pub fn with_evaluate_num(mut self, hook: EvalFn) -> Self {
        self.evaluate_num = Some(hook);
        self
    }

    pub fn with_sgn(mut self, hook: SgnFn) -> Self {
        self.sgn = Some(hook);
        self
    }
}
