use crate::ast::{OpKind, Operation};
use crate::atom::{Atom, AtomPool};
use crate::error::Error;
use crate::function::{Function, FunctionScope, StructScope};
use crate::scope::ScopeChain;
use crate::swizzle::Swizzle;
use crate::types::TypeSpecifier;

/// Static result type of an expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeInfo {
    pub spec: TypeSpecifier,
    pub array_len: u32,
    pub can_be_referenced: bool,
    pub swizzle: Option<Swizzle>,
}

impl TypeInfo {
    fn of(spec: TypeSpecifier) -> Self {
        TypeInfo {
            spec,
            ..Default::default()
        }
    }
}

/// Everything a name can resolve to, apart from variables.
#[derive(Debug, Clone, Copy)]
pub struct Space<'a> {
    pub funs: FunctionScope<'a>,
    pub structs: StructScope<'a>,
    pub atoms: &'a AtomPool,
}

impl<'a> Space<'a> {
    fn id(&self, name: Option<Atom>) -> String {
        name.map_or_else(String::new, |a| self.atoms.id(a).to_string())
    }

    /// Infers the type of `op`. `names` is the scope chain of its parent.
    pub fn type_of(&self, op: &Operation, names: &ScopeChain) -> Result<TypeInfo, Error> {
        use OpKind::*;
        let names = names.enter(&op.locals);
        let child = |i: usize| {
            op.child(i)
                .ok_or_else(|| Error::Internal(format!("{} without operand {i}", op.kind)))
        };

        Ok(match op.kind {
            Block | Declare | Asm | Break | Continue | Discard | Return | If | While | Do
            | For | Void => TypeInfo::of(TypeSpecifier::Void),

            LiteralBool | LogicalOr | LogicalXor | LogicalAnd | Equal | NotEqual | Less
            | Greater | LessEqual | GreaterEqual | Not => TypeInfo::of(TypeSpecifier::Bool),
            LiteralInt => TypeInfo::of(TypeSpecifier::Int),
            LiteralFloat => TypeInfo::of(TypeSpecifier::Float),

            Identifier => {
                let name = op.name.ok_or_else(|| Error::Internal("anonymous identifier".into()))?;
                let var = names
                    .find(name)
                    .ok_or_else(|| Error::UndeclaredIdentifier(self.id(Some(name))))?;
                TypeInfo {
                    spec: var.ty.specifier.clone(),
                    array_len: var.array_len,
                    can_be_referenced: true,
                    swizzle: None,
                }
            }

            Expression | Assign | AddAssign | SubtractAssign | MultiplyAssign | DivideAssign
            | PreIncrement | PreDecrement | Plus => self.type_of(child(0)?, &names)?,

            // Only the first branch is inspected; the other is not cross-checked.
            Sequence | Select => TypeInfo::of(self.type_of(child(1)?, &names)?.spec),
            PostIncrement | PostDecrement => TypeInfo::of(self.type_of(child(0)?, &names)?.spec),

            Add | Subtract | Multiply | Divide | Minus => {
                let oper = op.kind.operator().unwrap_or_default();
                let fun = self
                    .atoms
                    .find(oper)
                    .map(|a| self.locate_function(a, &op.children, &names))
                    .transpose()?
                    .flatten()
                    .ok_or_else(|| Error::UndeclaredFunction(oper.to_string()))?;
                TypeInfo::of(fun.ret().clone())
            }

            Subscript => {
                let master = self.type_of(child(0)?, &names)?;
                let spec = match &master.spec {
                    TypeSpecifier::Array(elem) => (**elem).clone(),
                    spec => spec.row().ok_or(Error::NotSubscriptable)?,
                };
                TypeInfo {
                    spec,
                    array_len: 0,
                    can_be_referenced: master.can_be_referenced,
                    swizzle: None,
                }
            }

            Call => {
                let name = op.name.ok_or_else(|| Error::Internal("anonymous call".into()))?;
                if let Some(fun) = self.locate_function(name, &op.children, &names)? {
                    TypeInfo::of(fun.ret().clone())
                } else {
                    TypeInfo::of(self.constructed_type(name)?)
                }
            }

            Field => {
                let master = self.type_of(child(0)?, &names)?;
                let field = op.name.ok_or_else(|| Error::Internal("anonymous field".into()))?;
                self.field(master, field)?
            }
        })
    }

    fn field(&self, master: TypeInfo, field: Atom) -> Result<TypeInfo, Error> {
        let invalid = || Error::InvalidField(self.id(Some(field)));
        match &master.spec {
            TypeSpecifier::Struct(def) => {
                let var = def.fields.find(field).ok_or_else(invalid)?;
                Ok(TypeInfo {
                    spec: var.ty.specifier.clone(),
                    array_len: var.array_len,
                    can_be_referenced: master.can_be_referenced,
                    swizzle: None,
                })
            }
            spec if spec.is_vector() => {
                let rows = spec.dim();
                let swz = Swizzle::parse(self.atoms.id(field), rows).ok_or_else(invalid)?;
                let spec = TypeSpecifier::vector(&spec.base(), swz.len).ok_or_else(invalid)?;
                Ok(TypeInfo {
                    spec,
                    array_len: 0,
                    can_be_referenced: master.can_be_referenced && swz.is_mask(rows),
                    swizzle: Some(match master.swizzle {
                        Some(outer) => outer.compose(&swz),
                        None => swz,
                    }),
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Type built by a constructor call `name(...)`: a struct first, then a builtin type.
    pub fn constructed_type(&self, name: Atom) -> Result<TypeSpecifier, Error> {
        if let Some(def) = self.structs.find(name, true) {
            return Ok(TypeSpecifier::Struct(Box::new(def.clone())));
        }
        match TypeSpecifier::from_name(self.atoms.id(name)) {
            Some(spec) if !spec.is_void() => Ok(spec),
            _ => Err(Error::UndeclaredFunction(self.id(Some(name)))),
        }
    }

    /// First function named `name` whose parameters accept `args`, innermost scope first.
    pub fn locate_function(
        &self,
        name: Atom,
        args: &[Operation],
        names: &ScopeChain,
    ) -> Result<Option<&'a Function>, Error> {
        for fun in self.funs.iter() {
            if fun.name() == name && self.accepts(fun, args, names)? {
                return Ok(Some(fun));
            }
        }
        Ok(None)
    }

    fn accepts(&self, fun: &Function, args: &[Operation], names: &ScopeChain) -> Result<bool, Error> {
        if fun.param_count != args.len() {
            return Ok(false);
        }
        for (formal, arg) in fun.formals().iter().zip(args) {
            let ti = self.type_of(arg, names)?;
            if ti.spec != formal.ty.specifier {
                return Ok(false);
            }
            if formal.ty.qualifier.is_reference() && !ti.can_be_referenced {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Tree;
    use crate::scope::{Scope, Variable};
    use crate::types::{Qualifier, StructDef};

    struct Fixture {
        atoms: AtomPool,
        vars: Scope,
        funs: Vec<Function>,
        structs: Vec<StructDef>,
    }

    impl Fixture {
        fn new() -> Self {
            let mut atoms = AtomPool::new();
            let mut vars = Scope::new();
            vars.push(Variable::new(Qualifier::None, TypeSpecifier::Vec4, atoms.atom("v")));
            vars.push(Variable::new(Qualifier::None, TypeSpecifier::Float, atoms.atom("f")));

            let mut light = StructDef {
                name: Some(atoms.atom("Light")),
                ..Default::default()
            };
            light.fields.push(Variable::new(Qualifier::None, TypeSpecifier::Vec3, atoms.atom("pos")));
            light.fields.push(
                Variable::new(
                    Qualifier::None,
                    TypeSpecifier::Array(Box::new(TypeSpecifier::Float)),
                    atoms.atom("w"),
                )
                .with_array_len(2),
            );
            vars.push(Variable::new(
                Qualifier::Uniform,
                TypeSpecifier::Struct(Box::new(light.clone())),
                atoms.atom("l"),
            ));

            let (plus, a, b) = (atoms.atom("+"), atoms.atom("a"), atoms.atom("b"));
            let funs = vec![
                Function::operator(plus, TypeSpecifier::Float)
                    .param(Qualifier::None, TypeSpecifier::Float, a)
                    .param(Qualifier::None, TypeSpecifier::Float, b),
                Function::new(atoms.atom("bump"), TypeSpecifier::Int)
                    .param(Qualifier::Inout, TypeSpecifier::Float, a),
                Function::new(atoms.atom("bump"), TypeSpecifier::Bool)
                    .param(Qualifier::None, TypeSpecifier::Float, a),
            ];
            Fixture {
                atoms,
                vars,
                funs,
                structs: vec![light],
            }
        }

        fn type_of(&self, op: &Operation) -> Result<TypeInfo, Error> {
            let space = Space {
                funs: FunctionScope {
                    functions: &self.funs,
                    outer: None,
                },
                structs: StructScope {
                    structs: &self.structs,
                    outer: None,
                },
                atoms: &self.atoms,
            };
            space.type_of(op, &ScopeChain::root(&self.vars))
        }
    }

    #[test]
    fn identifiers_and_literals() {
        let mut fx = Fixture::new();
        let v = Tree::new(&mut fx.atoms).id("v");
        let ti = fx.type_of(&v).unwrap();
        assert_eq!(ti.spec, TypeSpecifier::Vec4);
        assert!(ti.can_be_referenced);
        assert_eq!(fx.type_of(&Operation::int(3)).unwrap().spec, TypeSpecifier::Int);

        let missing = Tree::new(&mut fx.atoms).id("nope");
        assert!(matches!(fx.type_of(&missing), Err(Error::UndeclaredIdentifier(n)) if n == "nope"));
    }

    #[test]
    fn swizzles_compose_and_lose_referenceability() {
        let mut fx = Fixture::new();
        let mut t = Tree::new(&mut fx.atoms);
        let v = t.id("v");
        let wzyx = t.field(v, "wzyx");
        let yx = t.field(wzyx.clone(), "yx");
        let xx = {
            let v = t.id("v");
            t.field(v, "xx")
        };

        let ti = fx.type_of(&yx).unwrap();
        assert_eq!(ti.spec, TypeSpecifier::Vec2);
        assert_eq!(ti.swizzle.map(|s| s.to_string()), Some("zw".into()));
        assert!(ti.can_be_referenced);

        let ti = fx.type_of(&xx).unwrap();
        assert!(!ti.can_be_referenced);

        let bad = Tree::new(&mut fx.atoms).field(wzyx, "m");
        assert!(matches!(fx.type_of(&bad), Err(Error::InvalidField(_))));
    }

    #[test]
    fn struct_fields_and_subscripts() {
        let mut fx = Fixture::new();
        let mut t = Tree::new(&mut fx.atoms);
        let l = t.id("l");
        let w = t.field(l.clone(), "w");
        let pos = t.field(l, "pos");

        let ti = fx.type_of(&w).unwrap();
        assert_eq!(ti.array_len, 2);
        let elem = fx.type_of(&Operation::subscript(w, Operation::int(1))).unwrap();
        assert_eq!(elem.spec, TypeSpecifier::Float);
        assert!(elem.can_be_referenced);

        let row = fx.type_of(&Operation::subscript(pos, Operation::int(0))).unwrap();
        assert_eq!(row.spec, TypeSpecifier::Float);

        let f = Tree::new(&mut fx.atoms).id("f");
        assert!(matches!(
            fx.type_of(&Operation::subscript(f, Operation::int(0))),
            Err(Error::NotSubscriptable)
        ));
    }

    #[test]
    fn operators_and_calls() {
        let mut fx = Fixture::new();
        let mut t = Tree::new(&mut fx.atoms);
        let f = t.id("f");
        let sum = Operation::binary(OpKind::Add, f.clone(), Operation::float(1.0));
        let by_ref = t.call("bump", vec![f]);
        let by_val = t.call("bump", vec![Operation::float(1.0)]);
        let ctor = t.call("Light", vec![]);
        let vec = t.call("vec3", vec![]);
        let unknown = t.call("frob", vec![]);

        assert_eq!(fx.type_of(&sum).unwrap().spec, TypeSpecifier::Float);
        assert!(!fx.type_of(&sum).unwrap().can_be_referenced);
        // an r-value skips the inout overload
        assert_eq!(fx.type_of(&by_ref).unwrap().spec, TypeSpecifier::Int);
        assert_eq!(fx.type_of(&by_val).unwrap().spec, TypeSpecifier::Bool);
        assert!(matches!(fx.type_of(&ctor).unwrap().spec, TypeSpecifier::Struct(_)));
        assert_eq!(fx.type_of(&vec).unwrap().spec, TypeSpecifier::Vec3);
        assert!(matches!(fx.type_of(&unknown), Err(Error::UndeclaredFunction(_))));

        let int_sum = Operation::binary(OpKind::Add, Operation::int(1), Operation::int(2));
        assert!(matches!(fx.type_of(&int_sum), Err(Error::UndeclaredFunction(n)) if n == "+"));
    }
}
