use crate::ast::Operation;
use crate::atom::Atom;
use crate::types::{Qualifier, TypeSpecifier};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FullySpecifiedType {
    pub qualifier: Qualifier,
    pub specifier: TypeSpecifier,
}

/// A named storage location.
///
/// `address` is a frame offset for locals and parameters and an absolute
/// byte address for globals. Both `address` and `size` are only meaningful
/// after the frame layout (or global allocation) has visited the variable.
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: FullySpecifiedType,
    pub name: Atom,
    pub array_len: u32,
    pub initializer: Option<Box<Operation>>,
    pub address: u32,
    pub size: u32,
    pub global: bool,
}

impl Variable {
    pub fn new(qualifier: Qualifier, specifier: TypeSpecifier, name: Atom) -> Self {
        Variable {
            ty: FullySpecifiedType {
                qualifier,
                specifier,
            },
            name,
            array_len: 0,
            initializer: None,
            address: 0,
            size: 0,
            global: false,
        }
    }

    pub fn with_array_len(mut self, len: u32) -> Self {
        self.array_len = len;
        self
    }

    pub fn with_initializer(mut self, init: Operation) -> Self {
        self.initializer = Some(Box::new(init));
        self
    }
}

/// Variables introduced at one level, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub variables: Vec<Variable>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, var: Variable) {
        self.variables.push(var);
    }

    pub fn find(&self, name: Atom) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn find_mut(&mut self, name: Atom) -> Option<&mut Variable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Borrowed lexical chain of scopes, innermost first.
///
/// The tree owns its scopes; the chain only exists on the call stack while a
/// subtree is being resolved or assembled.
#[derive(Debug, Clone, Copy)]
pub struct ScopeChain<'s> {
    scope: &'s Scope,
    outer: Option<&'s ScopeChain<'s>>,
}

impl<'s> ScopeChain<'s> {
    pub fn root(scope: &'s Scope) -> Self {
        ScopeChain { scope, outer: None }
    }

    pub fn enter<'b>(&'b self, scope: &'b Scope) -> ScopeChain<'b> {
        ScopeChain {
            scope,
            outer: Some(self),
        }
    }

    pub fn find(&self, name: Atom) -> Option<&'s Variable> {
        match self.scope.find(name) {
            Some(var) => Some(var),
            None => self.outer.and_then(|outer| outer.find(name)),
        }
    }
}
