use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::atom::{Atom, AtomPool};
use crate::scope::{Scope, Variable};

/// Node kinds of the operation tree.
///
/// Children by kind:
/// - `If`: condition, then, else (else may be `Void`)
/// - `While`: condition, body
/// - `Do`: body, condition
/// - `For`: init, condition (`Void` loops forever), increment, body
/// - `Declare`: one `Identifier` per declared variable
/// - `Asm`: the intrinsic arguments, the first one being the destination
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Block,
    Declare,
    Asm,
    Break,
    Continue,
    Discard,
    Return,
    Expression,
    If,
    While,
    Do,
    For,
    #[default]
    Void,
    LiteralBool,
    LiteralInt,
    LiteralFloat,
    Identifier,
    Sequence,
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    Select,
    LogicalOr,
    LogicalXor,
    LogicalAnd,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    PreIncrement,
    PreDecrement,
    Plus,
    Minus,
    Not,
    Subscript,
    Call,
    Field,
    PostIncrement,
    PostDecrement,
}

impl OpKind {
    /// Builtin function name an operator lowers to, if any.
    pub fn operator(&self) -> Option<&'static str> {
        use OpKind::*;
        Some(match self {
            LogicalXor => "^^",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Add => "+",
            Subtract | Minus => "-",
            Multiply => "*",
            Divide => "/",
            Not => "!",
            AddAssign => "+=",
            SubtractAssign => "-=",
            MultiplyAssign => "*=",
            DivideAssign => "/=",
            PreIncrement | PostIncrement => "++",
            PreDecrement | PostDecrement => "--",
            _ => return None,
        })
    }

    pub fn is_statement(&self) -> bool {
        use OpKind::*;
        matches!(
            self,
            Block | Declare | Asm | Break | Continue | Discard | Return | If | While | Do | For
        )
    }
}

/// One node of the operation tree. Children are owned; `locals` holds the
/// variables this node introduces (block or `for` scope).
#[derive(Debug, Clone, Default)]
pub struct Operation {
    pub kind: OpKind,
    pub children: Vec<Operation>,
    pub literal: f64,
    pub name: Option<Atom>,
    pub locals: Scope,
}

impl Operation {
    pub fn new(kind: OpKind) -> Self {
        Operation {
            kind,
            ..Default::default()
        }
    }

    pub fn with(kind: OpKind, children: Vec<Operation>) -> Self {
        Operation {
            kind,
            children,
            ..Default::default()
        }
    }

    pub fn named(kind: OpKind, name: Atom, children: Vec<Operation>) -> Self {
        Operation {
            kind,
            children,
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn void() -> Self {
        Operation::new(OpKind::Void)
    }

    pub fn bool(value: bool) -> Self {
        Operation {
            kind: OpKind::LiteralBool,
            literal: if value { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }

    pub fn int(value: i32) -> Self {
        Operation {
            kind: OpKind::LiteralInt,
            literal: value as f64,
            ..Default::default()
        }
    }

    pub fn float(value: f64) -> Self {
        Operation {
            kind: OpKind::LiteralFloat,
            literal: value,
            ..Default::default()
        }
    }

    pub fn ident(name: Atom) -> Self {
        Operation::named(OpKind::Identifier, name, vec![])
    }

    pub fn call(name: Atom, args: Vec<Operation>) -> Self {
        Operation::named(OpKind::Call, name, args)
    }

    pub fn field(master: Operation, name: Atom) -> Self {
        Operation::named(OpKind::Field, name, vec![master])
    }

    pub fn asm(name: Atom, args: Vec<Operation>) -> Self {
        Operation::named(OpKind::Asm, name, args)
    }

    pub fn unary(kind: OpKind, operand: Operation) -> Self {
        Operation::with(kind, vec![operand])
    }

    pub fn binary(kind: OpKind, left: Operation, right: Operation) -> Self {
        Operation::with(kind, vec![left, right])
    }

    pub fn assign(target: Operation, value: Operation) -> Self {
        Operation::binary(OpKind::Assign, target, value)
    }

    pub fn subscript(master: Operation, index: Operation) -> Self {
        Operation::binary(OpKind::Subscript, master, index)
    }

    pub fn expr(inner: Operation) -> Self {
        Operation::unary(OpKind::Expression, inner)
    }

    pub fn ret(value: Option<Operation>) -> Self {
        Operation::with(OpKind::Return, value.into_iter().collect())
    }

    pub fn if_else(cond: Operation, then: Operation, otherwise: Option<Operation>) -> Self {
        Operation::with(
            OpKind::If,
            vec![cond, then, otherwise.unwrap_or_else(Operation::void)],
        )
    }

    pub fn while_loop(cond: Operation, body: Operation) -> Self {
        Operation::with(OpKind::While, vec![cond, body])
    }

    pub fn do_loop(body: Operation, cond: Operation) -> Self {
        Operation::with(OpKind::Do, vec![body, cond])
    }

    pub fn for_loop(init: Operation, cond: Operation, incr: Operation, body: Operation) -> Self {
        Operation::with(OpKind::For, vec![init, cond, incr, body])
    }

    pub fn child(&self, i: usize) -> Option<&Operation> {
        self.children.get(i)
    }

    /// Number of nodes in the subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Operation::count).sum::<usize>()
    }
}

/// Builds a `Block` whose declarations land in the block's own scope.
#[derive(Debug, Default)]
pub struct BlockBuilder {
    block: Operation,
}

impl BlockBuilder {
    pub fn new() -> Self {
        BlockBuilder {
            block: Operation::new(OpKind::Block),
        }
    }

    /// Declares `var` here and emits the matching `Declare` statement.
    pub fn declare(mut self, var: Variable) -> Self {
        let decl = Operation::with(OpKind::Declare, vec![Operation::ident(var.name)]);
        self.block.locals.push(var);
        self.block.children.push(decl);
        self
    }

    pub fn stmt(mut self, op: Operation) -> Self {
        self.block.children.push(op);
        self
    }

    /// Expression statement.
    pub fn expr(self, op: Operation) -> Self {
        self.stmt(Operation::expr(op))
    }

    pub fn build(self) -> Operation {
        self.block
    }
}

/// Shorthand for trees built by hand: interns names on the fly.
pub struct Tree<'a> {
    pub atoms: &'a mut AtomPool,
}

impl<'a> Tree<'a> {
    pub fn new(atoms: &'a mut AtomPool) -> Self {
        Tree { atoms }
    }

    pub fn id(&mut self, name: &str) -> Operation {
        Operation::ident(self.atoms.atom(name))
    }

    pub fn call(&mut self, name: &str, args: Vec<Operation>) -> Operation {
        Operation::call(self.atoms.atom(name), args)
    }

    pub fn field(&mut self, master: Operation, name: &str) -> Operation {
        Operation::field(master, self.atoms.atom(name))
    }

    pub fn asm(&mut self, name: &str, args: Vec<Operation>) -> Operation {
        Operation::asm(self.atoms.atom(name), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Qualifier, TypeSpecifier};

    #[test]
    fn operator_names() {
        assert_eq!(OpKind::Add.operator(), Some("+"));
        assert_eq!(OpKind::Minus.operator(), Some("-"));
        assert_eq!(OpKind::PostDecrement.operator(), Some("--"));
        assert_eq!(OpKind::Equal.operator(), None);
        assert_eq!("logical_xor".parse::<OpKind>(), Ok(OpKind::LogicalXor));
    }

    #[test]
    fn block_builder_declares_in_block_scope() {
        let mut atoms = AtomPool::new();
        let a = atoms.atom("a");
        let block = BlockBuilder::new()
            .declare(
                Variable::new(Qualifier::None, TypeSpecifier::Float, a)
                    .with_initializer(Operation::float(2.0)),
            )
            .expr(Operation::ident(a))
            .build();
        assert_eq!(block.kind, OpKind::Block);
        assert_eq!(block.locals.len(), 1);
        assert_eq!(block.children[0].kind, OpKind::Declare);
        assert_eq!(block.children[0].children[0].name, Some(a));
        assert_eq!(block.count(), 5);

        let copy = block.clone();
        assert_eq!(copy.count(), block.count());
        assert!(copy.locals.find(a).is_some_and(|v| v.initializer.is_some()));
    }
}
