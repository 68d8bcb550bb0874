//! Opaque handles into the symbol database.
//!
//! The symbol database (variables, functions, scopes, user types) is an
//! external collaborator: the token core stores non-owning references to
//! its entities and consults it through the [`SymbolLookup`] capability.
//! The database must outlive every stream that references it; destroying
//! it first leaves dangling refs, the same ordering contract the rest of
//! the analyzer already follows.

use serde::{Deserialize, Serialize};

/// Non-owning reference to a variable in the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef(pub u32);

/// Non-owning reference to a function in the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionRef(pub u32);

/// Non-owning reference to a scope in the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeRef(pub u32);

/// Non-owning reference to a user-defined type in the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub u32);

/// Classification of a scope, as exposed by the symbol database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Global,
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
    Function,
    Block,
}

/// Capability the symbol database exposes to the token core.
///
/// Only the handful of facts the core queries are on this trait; the
/// database itself is free to store whatever it wants behind the refs.
pub trait SymbolLookup {
    /// Scope the variable is declared in, if known.
    fn variable_scope(&self, var: VariableRef) -> Option<ScopeRef>;

    /// Whether the variable has static storage duration.
    fn is_static(&self, var: VariableRef) -> bool;

    /// Whether the variable is a reference.
    fn is_reference(&self, var: VariableRef) -> bool;

    /// Classification of the scope.
    fn scope_kind(&self, scope: ScopeRef) -> ScopeKind;

    /// Enclosing scope, `None` at the global scope.
    fn nested_in(&self, scope: ScopeRef) -> Option<ScopeRef>;

    /// Whether the function is a lambda.
    fn is_lambda(&self, function: FunctionRef) -> bool;

    /// Whether the user type is an enum.
    fn is_enum_type(&self, ttype: TypeRef) -> bool;
}

/// Minimal in-memory symbol table.
///
/// Enough of a symbol database to drive the core's queries in tests and
/// small tools; the production analyzer supplies its own implementation.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<ScopeEntry>,
    variables: Vec<VariableEntry>,
    functions: Vec<FunctionEntry>,
    types: Vec<TypeEntry>,
}

#[derive(Debug)]
struct ScopeEntry {
    kind: ScopeKind,
    nested_in: Option<ScopeRef>,
}

#[derive(Debug)]
struct VariableEntry {
    scope: Option<ScopeRef>,
    is_static: bool,
    is_reference: bool,
}

#[derive(Debug)]
struct FunctionEntry {
    is_lambda: bool,
}

#[derive(Debug)]
struct TypeEntry {
    is_enum: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, kind: ScopeKind, nested_in: Option<ScopeRef>) -> ScopeRef {
        self.scopes.push(ScopeEntry { kind, nested_in });
        ScopeRef((self.scopes.len() - 1) as u32)
    }

    pub fn add_variable(
        &mut self,
        scope: Option<ScopeRef>,
        is_static: bool,
        is_reference: bool,
    ) -> VariableRef {
        self.variables.push(VariableEntry {
            scope,
            is_static,
            is_reference,
        });
        VariableRef((self.variables.len() - 1) as u32)
    }

    pub fn add_function(&mut self, is_lambda: bool) -> FunctionRef {
        self.functions.push(FunctionEntry { is_lambda });
        FunctionRef((self.functions.len() - 1) as u32)
    }

    pub fn add_type(&mut self, is_enum: bool) -> TypeRef {
        self.types.push(TypeEntry { is_enum });
        TypeRef((self.types.len() - 1) as u32)
    }
}

impl SymbolLookup for SymbolTable {
    fn variable_scope(&self, var: VariableRef) -> Option<ScopeRef> {
        self.variables.get(var.0 as usize).and_then(|v| v.scope)
    }

    fn is_static(&self, var: VariableRef) -> bool {
        self.variables
            .get(var.0 as usize)
            .is_some_and(|v| v.is_static)
    }

    fn is_reference(&self, var: VariableRef) -> bool {
        self.variables
            .get(var.0 as usize)
            .is_some_and(|v| v.is_reference)
    }

    fn scope_kind(&self, scope: ScopeRef) -> ScopeKind {
        self.scopes
            .get(scope.0 as usize)
            .map(|s| s.kind)
            .unwrap_or(ScopeKind::Global)
    }

    fn nested_in(&self, scope: ScopeRef) -> Option<ScopeRef> {
        self.scopes.get(scope.0 as usize).and_then(|s| s.nested_in)
    }

    fn is_lambda(&self, function: FunctionRef) -> bool {
        self.functions
            .get(function.0 as usize)
            .is_some_and(|f| f.is_lambda)
    }

    fn is_enum_type(&self, ttype: TypeRef) -> bool {
        self.types.get(ttype.0 as usize).is_some_and(|t| t.is_enum)
    }
}
