//! Operation tree to instruction stream.

mod access;
mod asm;
mod assign;
mod constructor;
mod flow;
mod function;

pub use asm::{intrinsic, Intrinsic, INTRINSICS};
pub use function::Frame;

use arch::{InstructionStream, Opcode};
use log::trace;

use crate::ast::{OpKind, Operation};
use crate::error::Error;
use crate::scope::ScopeChain;
use crate::storage::{Aggregate, Leaf};
use crate::swizzle::Swizzle;
use crate::typeinfo::{Space, TypeInfo};

/// What the caller wants on the stack: an address or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefMode {
    Force,
    Forbid,
}

/// Jump targets of the innermost loop and function.
#[derive(Debug, Clone, Copy, Default)]
struct Flow {
    loop_start: Option<u32>,
    loop_end: Option<u32>,
    function_end: u32,
}

pub struct Assembler<'a> {
    pub stream: &'a mut InstructionStream,
    pub space: Space<'a>,
    pub vec4: bool,
    frame: Frame,
    flow: Flow,
}

impl<'a> Assembler<'a> {
    pub fn new(stream: &'a mut InstructionStream, space: Space<'a>, vec4: bool) -> Self {
        Assembler {
            stream,
            space,
            vec4,
            frame: Frame::default(),
            flow: Flow::default(),
        }
    }

    /// Uses `frame` for temporaries, e.g. the scratch frame of a global initializer.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    fn type_of(&self, op: &Operation, names: &ScopeChain) -> Result<TypeInfo, Error> {
        self.space.type_of(op, names)
    }

    fn size_of(&self, ti: &TypeInfo) -> u32 {
        Aggregate::of(&ti.spec, ti.array_len, self.vec4).size()
    }

    fn child<'o>(&self, op: &'o Operation, i: usize) -> Result<&'o Operation, Error> {
        op.child(i)
            .ok_or_else(|| Error::Internal(format!("{} without operand {i}", op.kind)))
    }

    fn name(&self, op: &Operation) -> String {
        op.name
            .map_or_else(String::new, |a| self.space.atoms.id(a).to_string())
    }

    fn local_addr(&mut self, offset: u32, size: u32) {
        self.stream.push_label2(Opcode::LocalAddr, offset, size);
    }

    fn local_free(&mut self, size: u32) {
        self.stream.push_label(Opcode::LocalFree, size);
    }

    /// Assembles `op`, whose parent's scope chain is `outer`.
    ///
    /// In `Force` mode a swizzled l-value leaves the vector's address on the
    /// stack and returns the write mask to apply to it.
    pub fn operation(
        &mut self,
        op: &Operation,
        outer: &ScopeChain,
        mode: RefMode,
    ) -> Result<Option<Swizzle>, Error> {
        use OpKind::*;
        let names = outer.enter(&op.locals);
        let names = &names;
        trace!("assemble {} at {:04}", op.kind, self.stream.len());

        match op.kind {
            Block => {
                for child in &op.children {
                    self.operation(child, names, RefMode::Forbid)?;
                    self.cleanup_stack(child, names)?;
                }
            }
            Declare => self.declare(op, names)?,
            Asm => self.asm(op, names)?,
            Break => {
                let end = self.flow.loop_end.ok_or(Error::OutsideLoop("break"))?;
                self.stream.push_label(Opcode::Jump, end);
            }
            Continue => {
                let start = self.flow.loop_start.ok_or(Error::OutsideLoop("continue"))?;
                self.stream.push_label(Opcode::Jump, start);
            }
            Discard => {
                self.stream.push(Opcode::Discard);
                self.stream.push(Opcode::Exit);
            }
            Return => self.ret(op, names)?,
            Expression => {
                self.value_only(op, mode)?;
                self.operation(self.child(op, 0)?, names, mode)?;
            }
            If => self.if_(op, names)?,
            While => self.while_(op, names)?,
            Do => self.do_(op, names)?,
            For => self.for_(op, names)?,
            Void => {}
            LiteralBool | LiteralInt | LiteralFloat => {
                self.value_only(op, mode)?;
                let opcode = match op.kind {
                    LiteralBool => Opcode::BoolPush,
                    LiteralInt => Opcode::IntPush,
                    _ => Opcode::FloatPush,
                };
                self.stream.push_literal(opcode, op.literal);
            }
            Identifier => self.identifier(op, names, mode)?,
            Sequence => {
                self.value_only(op, mode)?;
                let first = self.child(op, 0)?;
                self.operation(first, names, RefMode::Forbid)?;
                self.cleanup_stack(first, names)?;
                self.operation(self.child(op, 1)?, names, RefMode::Forbid)?;
            }
            Assign => return self.assign(op, names, "=", mode),
            AddAssign | SubtractAssign | MultiplyAssign | DivideAssign | PreIncrement
            | PreDecrement => {
                let oper = op.kind.operator().unwrap_or_default();
                return self.assign(op, names, oper, mode);
            }
            Select => self.select(op, names)?,
            LogicalOr => self.logical_or(op, names)?,
            LogicalAnd => self.logical_and(op, names)?,
            Equal | NotEqual => self.equality(op, names, op.kind == Equal)?,
            LogicalXor | Less | Greater | LessEqual | GreaterEqual | Add | Subtract | Multiply
            | Divide | Minus | Not => {
                let oper = op.kind.operator().unwrap_or_default();
                self.call_name(oper, &op.children, names, false)?;
            }
            Plus => return self.operation(self.child(op, 0)?, names, mode),
            Subscript => self.subscript(op, names, mode)?,
            Call => {
                let name = op.name.ok_or_else(|| Error::Internal("anonymous call".into()))?;
                match self.space.locate_function(name, &op.children, names)? {
                    Some(fun) => self.function_call(fun, &op.children, names, false)?,
                    None => self.constructor(op, names)?,
                }
            }
            Field => return self.field(op, names, mode),
            PostIncrement | PostDecrement => {
                let oper = op.kind.operator().unwrap_or_default();
                let args = [self.child(op, 0)?.clone(), Operation::int(0)];
                self.call_name(oper, &args, names, false)?;
            }
        }
        Ok(None)
    }

    fn value_only(&self, op: &Operation, mode: RefMode) -> Result<(), Error> {
        if mode == RefMode::Force {
            return Err(Error::Internal(format!("{} cannot be referenced", op.kind)));
        }
        Ok(())
    }

    /// Pops the value a statement or argument left behind.
    pub fn cleanup_stack(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let ti = self.type_of(op, names)?;
        let size = Aggregate::of(&ti.spec, 0, self.vec4).size();
        if size != 0 {
            self.local_free(size);
        }
        Ok(())
    }

    fn identifier(&mut self, op: &Operation, names: &ScopeChain, mode: RefMode) -> Result<(), Error> {
        let name = op.name.ok_or_else(|| Error::Internal("anonymous identifier".into()))?;
        let var = names
            .find(name)
            .ok_or_else(|| Error::UndeclaredIdentifier(self.name(op)))?;
        let size = Aggregate::of(&var.ty.specifier, var.array_len, self.vec4).size();

        if mode == RefMode::Forbid {
            self.local_addr(self.frame.addr_tmp, 4);
        }
        if var.global {
            self.stream.push_label(Opcode::GlobalAddr, var.address);
        } else {
            self.local_addr(var.address, size);
        }
        if mode == RefMode::Forbid {
            self.stream.push(Opcode::AddrCopy);
            self.local_free(4);
            self.dereference(op, names)?;
        }
        Ok(())
    }

    fn ret(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        if self.frame.ret_size != 0 {
            let value = self.child(op, 0)?;
            self.local_addr(0, self.frame.ret_size);
            self.operation(value, names, RefMode::Forbid)?;
            self.assignment(value, names, None)?;
            self.local_free(4);
        }
        self.stream.push_label(Opcode::Jump, self.flow.function_end);
        Ok(())
    }

    fn declare(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        for id in &op.children {
            let name = id.name.ok_or_else(|| Error::Internal("anonymous declaration".into()))?;
            let var = names
                .find(name)
                .ok_or_else(|| Error::UndeclaredIdentifier(self.name(id)))?;
            let Some(init) = &var.initializer else {
                continue;
            };
            let assign = Operation::assign(id.clone(), (**init).clone());
            self.assign(&assign, names, "=", RefMode::Forbid)?;
            self.cleanup_stack(&assign, names)?;
        }
        Ok(())
    }

    /// Replaces the address parked in the address temporary by the value it
    /// points to, one leaf at a time from the last one.
    pub fn dereference(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let ti = self.type_of(op, names)?;
        let agg = Aggregate::of(&ti.spec, ti.array_len, self.vec4);
        let mut size = agg.size();

        for leaf in agg.leaves().into_iter().rev() {
            let leaves = match (ti.swizzle, leaf) {
                (Some(_), Leaf::Vec4) => vec![Leaf::Float; 4],
                _ => vec![leaf],
            };
            for leaf in leaves {
                size -= leaf.size();
                let src = match &ti.swizzle {
                    Some(swz) => swz.index[(size / 4) as usize] * 4,
                    None => size,
                };
                self.local_addr(self.frame.addr_tmp, 4);
                self.stream.push(Opcode::AddrDeref);
                if src != 0 {
                    self.stream.push_label(Opcode::AddrPush, src);
                    self.stream.push(Opcode::AddrAdd);
                }
                self.stream.push(deref_op(leaf));
            }
        }
        Ok(())
    }
}

fn deref_op(leaf: Leaf) -> Opcode {
    match leaf {
        Leaf::Bool => Opcode::BoolDeref,
        Leaf::Int => Opcode::IntDeref,
        Leaf::Float => Opcode::FloatDeref,
        Leaf::Vec4 => Opcode::Vec4Deref,
    }
}

fn copy_op(leaf: Leaf) -> Opcode {
    match leaf {
        Leaf::Bool => Opcode::BoolCopy,
        Leaf::Int => Opcode::IntCopy,
        Leaf::Float => Opcode::FloatCopy,
        Leaf::Vec4 => Opcode::Vec4Copy,
    }
}
