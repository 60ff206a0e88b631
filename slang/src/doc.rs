//! YAML form of a translation unit, the input of `slangc`.
//!
//! ```yaml
//! declarations:
//!   - decl: variable
//!     name: scale
//!     type: float
//!     qualifier: uniform
//!     init: { op: literal_float, value: 2.0 }
//!   - decl: function
//!     name: main
//!     ret: float
//!     body:
//!       op: block
//!       args:
//!         - { op: declare, vars: [{ name: a, type: float, init: { op: literal_float, value: 3.0 } }] }
//!         - op: return
//!           args:
//!             - op: multiply
//!               args: [{ op: identifier, name: a }, { op: identifier, name: scale }]
//! ```
//!
//! Variables listed by a `declare` node belong to the nearest enclosing
//! `block` or `for`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use crate::ast::{OpKind, Operation};
use crate::atom::AtomPool;
use crate::compile::Declaration;
use crate::error::Error;
use crate::function::Function;
use crate::scope::{Scope, Variable};
use crate::types::{Qualifier, StructDef, TypeSpecifier};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub declarations: Vec<DeclDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum DeclDoc {
    Struct {
        name: String,
        fields: Vec<VarDoc>,
    },
    Variable(VarDoc),
    Function {
        name: String,
        #[serde(default = "void")]
        ret: String,
        #[serde(default)]
        params: Vec<VarDoc>,
        #[serde(default)]
        body: Option<NodeDoc>,
    },
}

fn void() -> String {
    "void".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDoc {
    pub name: String,
    /// Type name, with `[n]` for arrays: `vec3`, `float[4]`, `Light`.
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub qualifier: Qualifier,
    #[serde(default)]
    pub init: Option<NodeDoc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDoc {
    pub op: OpKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub args: Vec<NodeDoc>,
    #[serde(default)]
    pub vars: Vec<VarDoc>,
}

impl Document {
    /// Reads a `.json` document, or YAML for any other extension.
    pub fn load(path: &str) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        if path.ends_with(".json") {
            Ok(serde_json::from_reader(reader)?)
        } else {
            Ok(serde_yaml::from_reader(reader)?)
        }
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Interns every name into `atoms` and builds the declarations.
    pub fn lower(&self, atoms: &mut AtomPool) -> Result<Vec<Declaration>, Error> {
        let mut lower = Lower {
            atoms,
            structs: HashMap::new(),
        };
        self.declarations.iter().map(|d| lower.decl(d)).collect()
    }
}

struct Lower<'a> {
    atoms: &'a mut AtomPool,
    structs: HashMap<String, StructDef>,
}

impl<'a> Lower<'a> {
    fn decl(&mut self, decl: &DeclDoc) -> Result<Declaration, Error> {
        Ok(match decl {
            DeclDoc::Struct { name, fields } => {
                let mut scope = Scope::new();
                for field in fields {
                    scope.push(self.var(field)?);
                }
                let def = StructDef {
                    name: Some(self.atoms.atom(name)),
                    fields: scope,
                };
                self.structs.insert(name.clone(), def.clone());
                Declaration::Struct(def)
            }
            DeclDoc::Variable(var) => Declaration::Variable(self.var(var)?),
            DeclDoc::Function {
                name,
                ret,
                params,
                body,
            } => {
                let (ret, _) = self.spec(ret)?;
                let mut fun = Function::new(self.atoms.atom(name), ret);
                for param in params {
                    let var = self.var(param)?;
                    fun = fun.param(var.ty.qualifier, var.ty.specifier, var.name);
                }
                if let Some(body) = body {
                    let mut scope = Scope::new();
                    fun = fun.body(self.node(body, &mut scope)?);
                    fun.parameters.variables.extend(scope.variables);
                }
                Declaration::Function(fun)
            }
        })
    }

    fn spec(&self, ty: &str) -> Result<(TypeSpecifier, u32), Error> {
        let (base, array_len) = match ty.strip_suffix(']').and_then(|t| t.split_once('[')) {
            Some((base, len)) => {
                let len = len
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidLiteral(ty.to_string()))?;
                (base.trim(), Some(len))
            }
            None => (ty.trim(), None),
        };
        let spec = match TypeSpecifier::from_name(base) {
            Some(spec) => spec,
            None => match self.structs.get(base) {
                Some(def) => TypeSpecifier::Struct(Box::new(def.clone())),
                None => return Err(Error::UndeclaredType(base.to_string())),
            },
        };
        Ok(match array_len {
            Some(len) => (TypeSpecifier::Array(Box::new(spec)), len),
            None => (spec, 0),
        })
    }

    fn var(&mut self, doc: &VarDoc) -> Result<Variable, Error> {
        let (spec, array_len) = self.spec(&doc.ty)?;
        let mut var =
            Variable::new(doc.qualifier, spec, self.atoms.atom(&doc.name)).with_array_len(array_len);
        if let Some(init) = &doc.init {
            // initializers cannot declare anything
            let mut scope = Scope::new();
            var = var.with_initializer(self.node(init, &mut scope)?);
        }
        Ok(var)
    }

    /// Lowers `doc`; declarations land in `scope` unless the node opens its own.
    fn node(&mut self, doc: &NodeDoc, scope: &mut Scope) -> Result<Operation, Error> {
        let mut op = Operation::new(doc.op);
        op.literal = doc.value;
        op.name = doc.name.as_deref().map(|n| self.atoms.atom(n));

        match doc.op {
            OpKind::Block | OpKind::For => {
                let mut locals = Scope::new();
                for arg in &doc.args {
                    op.children.push(self.node(arg, &mut locals)?);
                }
                op.locals = locals;
            }
            OpKind::Declare => {
                for var in &doc.vars {
                    let var = self.var(var)?;
                    op.children.push(Operation::ident(var.name));
                    scope.push(var);
                }
            }
            _ => {
                for arg in &doc.args {
                    op.children.push(self.node(arg, scope)?);
                }
            }
        }
        if doc.op == OpKind::If && op.children.len() == 2 {
            op.children.push(Operation::void());
        }
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
declarations:
  - decl: struct
    name: Light
    fields:
      - { name: pos, type: vec3 }
      - { name: w, type: "float[2]" }
  - decl: variable
    name: sun
    type: Light
    qualifier: uniform
  - decl: function
    name: main
    ret: float
    body:
      op: block
      args:
        - op: declare
          vars:
            - { name: a, type: float, init: { op: literal_float, value: 2.0 } }
        - op: if
          args:
            - { op: literal_bool, value: 1 }
            - op: block
              args:
                - { op: declare, vars: [{ name: b, type: int }] }
        - op: return
          args: [{ op: identifier, name: a }]
"#;

    #[test]
    fn lowers_scopes_and_types() {
        let doc = Document::parse(SAMPLE).unwrap();
        let mut atoms = AtomPool::new();
        let decls = doc.lower(&mut atoms).unwrap();
        assert_eq!(decls.len(), 3);

        let Declaration::Variable(sun) = &decls[1] else {
            panic!("expected a variable");
        };
        assert_eq!(sun.ty.qualifier, Qualifier::Uniform);
        let TypeSpecifier::Struct(def) = &sun.ty.specifier else {
            panic!("expected a struct");
        };
        let w = def.fields.find(atoms.find("w").unwrap()).unwrap();
        assert_eq!(w.array_len, 2);

        let Declaration::Function(main) = &decls[2] else {
            panic!("expected a function");
        };
        let body = main.body.as_ref().unwrap();
        assert_eq!(body.locals.len(), 1);
        assert!(body.locals.find(atoms.find("a").unwrap()).is_some());
        let branch = &body.children[1];
        assert_eq!(branch.children.len(), 3);
        assert_eq!(branch.children[1].locals.len(), 1);
        assert_eq!(branch.children[2].kind, OpKind::Void);
    }

    #[test]
    fn unknown_type_is_reported() {
        let doc = Document::parse(
            "declarations:\n  - { decl: variable, name: x, type: vec5 }\n",
        )
        .unwrap();
        let mut atoms = AtomPool::new();
        assert!(matches!(doc.lower(&mut atoms), Err(Error::UndeclaredType(t)) if t == "vec5"));
    }
}
