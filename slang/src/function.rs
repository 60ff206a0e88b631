use std::cell::{Cell, RefCell};

use strum::Display;

use crate::ast::Operation;
use crate::atom::Atom;
use crate::scope::{Scope, Variable};
use crate::types::{Qualifier, StructDef, TypeSpecifier};

/// Address of a function whose body has not been assembled yet.
pub const UNASSEMBLED: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FunctionKind {
    #[default]
    Ordinary,
    Operator,
}

/// A function declaration or definition.
///
/// `parameters` holds the formal parameters first (`param_count` of them).
/// Calls emitted while the function is still unassembled are recorded in
/// `fixups` and patched once its address is known.
#[derive(Debug, Clone)]
pub struct Function {
    pub kind: FunctionKind,
    pub header: Variable,
    pub parameters: Scope,
    pub param_count: usize,
    pub body: Option<Operation>,
    pub address: Cell<u32>,
    pub fixups: RefCell<Vec<u32>>,
}

impl Function {
    pub fn new(name: Atom, ret: TypeSpecifier) -> Self {
        Function {
            kind: FunctionKind::Ordinary,
            header: Variable::new(Qualifier::None, ret, name),
            parameters: Scope::new(),
            param_count: 0,
            body: None,
            address: Cell::new(UNASSEMBLED),
            fixups: RefCell::new(vec![]),
        }
    }

    pub fn operator(name: Atom, ret: TypeSpecifier) -> Self {
        Function {
            kind: FunctionKind::Operator,
            ..Function::new(name, ret)
        }
    }

    pub fn param(mut self, qualifier: Qualifier, spec: TypeSpecifier, name: Atom) -> Self {
        self.parameters.variables.insert(
            self.param_count,
            Variable::new(qualifier, spec, name),
        );
        self.param_count += 1;
        self
    }

    pub fn body(mut self, body: Operation) -> Self {
        self.body = Some(body);
        self
    }

    pub fn name(&self) -> Atom {
        self.header.name
    }

    pub fn ret(&self) -> &TypeSpecifier {
        &self.header.ty.specifier
    }

    pub fn formals(&self) -> &[Variable] {
        &self.parameters.variables[..self.param_count]
    }

    pub fn is_assembled(&self) -> bool {
        self.address.get() != UNASSEMBLED
    }

    /// Same name and parameter types.
    pub fn same_signature(&self, other: &Function) -> bool {
        self.name() == other.name()
            && self.param_count == other.param_count
            && self
                .formals()
                .iter()
                .zip(other.formals())
                .all(|(a, b)| a.ty.specifier == b.ty.specifier)
    }
}

/// Functions of one translation unit, chained to the units it can see.
#[derive(Debug, Clone, Copy)]
pub struct FunctionScope<'a> {
    pub functions: &'a [Function],
    pub outer: Option<&'a FunctionScope<'a>>,
}

impl<'a> FunctionScope<'a> {
    /// Declaration with the same signature as `fun`; `all` searches outer scopes too.
    pub fn find(&self, fun: &Function, all: bool) -> Option<&'a Function> {
        if let Some(i) = self.position(fun) {
            return Some(&self.functions[i]);
        }
        match self.outer {
            Some(outer) if all => outer.find(fun, all),
            _ => None,
        }
    }

    /// Index of the declaration with the same signature as `fun`, this scope only.
    pub fn position(&self, fun: &Function) -> Option<usize> {
        self.functions.iter().position(|f| f.same_signature(fun))
    }

    pub fn find_by_name(&self, name: Atom) -> Option<&'a Function> {
        self.functions
            .iter()
            .find(|f| f.name() == name)
            .or_else(|| self.outer.and_then(|o| o.find_by_name(name)))
    }

    /// Every visible function, innermost scope first.
    pub fn iter(&self) -> impl Iterator<Item = &'a Function> {
        let mut scopes = vec![];
        let mut cur = Some(*self);
        while let Some(scope) = cur {
            scopes.push(scope.functions);
            cur = scope.outer.copied();
        }
        scopes.into_iter().flatten()
    }
}

/// Struct types of one translation unit, chained like functions.
#[derive(Debug, Clone, Copy)]
pub struct StructScope<'a> {
    pub structs: &'a [StructDef],
    pub outer: Option<&'a StructScope<'a>>,
}

impl<'a> StructScope<'a> {
    pub fn find(&self, name: Atom, all: bool) -> Option<&'a StructDef> {
        if let Some(found) = self.structs.iter().find(|s| s.name == Some(name)) {
            return Some(found);
        }
        match self.outer {
            Some(outer) if all => outer.find(name, all),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AtomPool;

    #[test]
    fn signature_lookup_is_scoped() {
        let mut atoms = AtomPool::new();
        let (plus, a, b) = (atoms.atom("+"), atoms.atom("a"), atoms.atom("b"));
        let ff = Function::operator(plus, TypeSpecifier::Float)
            .param(Qualifier::None, TypeSpecifier::Float, a)
            .param(Qualifier::None, TypeSpecifier::Float, b);
        let ii = Function::operator(plus, TypeSpecifier::Int)
            .param(Qualifier::None, TypeSpecifier::Int, a)
            .param(Qualifier::None, TypeSpecifier::Int, b);

        let core = [ff.clone()];
        let core_scope = FunctionScope {
            functions: &core,
            outer: None,
        };
        let user = [ii.clone()];
        let user_scope = FunctionScope {
            functions: &user,
            outer: Some(&core_scope),
        };

        assert!(user_scope.find(&ii, false).is_some());
        assert!(user_scope.find(&ff, false).is_none());
        assert!(user_scope.find(&ff, true).is_some_and(|f| *f.ret() == TypeSpecifier::Float));
        assert_eq!(user_scope.iter().count(), 2);
        assert_eq!(user_scope.position(&ii), Some(0));
        assert_eq!(user_scope.position(&ff), None);
        assert!(user_scope.find_by_name(plus).is_some_and(|f| *f.ret() == TypeSpecifier::Int));
        assert!(!ff.is_assembled());
    }

    #[test]
    fn locals_follow_formals() {
        let mut atoms = AtomPool::new();
        let f = Function::new(atoms.atom("f"), TypeSpecifier::Void)
            .param(Qualifier::Inout, TypeSpecifier::Vec2, atoms.atom("v"));
        assert_eq!(f.formals().len(), 1);
        assert_eq!(f.formals()[0].ty.qualifier, Qualifier::Inout);
    }
}
