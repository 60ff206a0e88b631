use arch::Opcode;

use super::{Assembler, Flow, RefMode};
use crate::ast::{OpKind, Operation};
use crate::error::Error;
use crate::scope::ScopeChain;
use crate::storage::{Aggregate, Leaf};

impl<'a> Assembler<'a> {
    fn value(&mut self, op: &Operation, i: usize, names: &ScopeChain) -> Result<(), Error> {
        self.operation(self.child(op, i)?, names, RefMode::Forbid)?;
        Ok(())
    }

    /// Statement child followed by popping whatever it left.
    fn statement(&mut self, op: &Operation, i: usize, names: &ScopeChain) -> Result<(), Error> {
        let child = self.child(op, i)?;
        self.operation(child, names, RefMode::Forbid)?;
        self.cleanup_stack(child, names)
    }

    /// Runs `body` with `start`/`end` as the targets of `continue`/`break`.
    fn in_loop(
        &mut self,
        start: u32,
        end: u32,
        body: impl FnOnce(&mut Self) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let saved = self.flow;
        self.flow = Flow {
            loop_start: Some(start),
            loop_end: Some(end),
            ..saved
        };
        let result = body(self);
        self.flow = saved;
        result
    }

    pub(super) fn logical_and(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        self.value(op, 0, names)?;
        let zero = self.stream.push(Opcode::JumpIfZero);
        self.value(op, 1, names)?;
        let end = self.stream.push(Opcode::Jump);
        self.stream.patch_here(zero);
        self.stream.push_literal(Opcode::BoolPush, 0.0);
        self.stream.patch_here(end);
        Ok(())
    }

    pub(super) fn logical_or(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        self.value(op, 0, names)?;
        let right = self.stream.push(Opcode::JumpIfZero);
        self.stream.push_literal(Opcode::BoolPush, 1.0);
        let end = self.stream.push(Opcode::Jump);
        self.stream.patch_here(right);
        self.value(op, 1, names)?;
        self.stream.patch_here(end);
        Ok(())
    }

    pub(super) fn select(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        self.value(op, 0, names)?;
        let cond = self.stream.push(Opcode::JumpIfZero);
        self.value(op, 1, names)?;
        let end = self.stream.push(Opcode::Jump);
        self.stream.patch_here(cond);
        self.value(op, 2, names)?;
        self.stream.patch_here(end);
        Ok(())
    }

    /// `==` and `!=` compare the two values leaf by leaf, without a call.
    pub(super) fn equality(&mut self, op: &Operation, names: &ScopeChain, equal: bool) -> Result<(), Error> {
        self.value(op, 0, names)?;
        self.value(op, 1, names)?;

        let ti = self.type_of(self.child(op, 0)?, names)?;
        let agg = Aggregate::of(&ti.spec, 0, self.vec4);
        let size = agg.size();

        let skip = self.stream.push(Opcode::Jump);

        let true_label = self.stream.len();
        self.local_free(2 * size);
        self.stream.push_literal(Opcode::BoolPush, 1.0);
        let true_jump = self.stream.push(Opcode::Jump);

        let false_label = self.stream.len();
        self.local_free(2 * size);
        self.stream.push_literal(Opcode::BoolPush, 0.0);
        let false_jump = self.stream.push(Opcode::Jump);

        self.stream.patch_here(skip);
        let (mismatch, matched) = if equal {
            (false_label, true_label)
        } else {
            (true_label, false_label)
        };
        let mut index = 0;
        for leaf in agg.leaves() {
            let compare = match leaf {
                Leaf::Vec4 => Opcode::Vec4EqualInt,
                _ => Opcode::FloatEqualInt,
            };
            self.stream.push_label2(compare, size + index, index);
            self.stream.push_label(Opcode::JumpIfZero, mismatch);
            index += leaf.size();
        }
        self.stream.push_label(Opcode::Jump, matched);

        self.stream.patch_here(true_jump);
        self.stream.patch_here(false_jump);
        Ok(())
    }

    pub(super) fn if_(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        self.value(op, 0, names)?;
        let cond = self.stream.push(Opcode::JumpIfZero);
        self.statement(op, 1, names)?;
        let end = self.stream.push(Opcode::Jump);
        self.stream.patch_here(cond);
        self.statement(op, 2, names)?;
        self.stream.patch_here(end);
        Ok(())
    }

    pub(super) fn while_(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let skip = self.stream.push(Opcode::Jump);
        let break_label = self.stream.len();
        let break_jump = self.stream.push(Opcode::Jump);
        let cont_label = self.stream.len();
        self.stream.patch(skip, cont_label);

        self.value(op, 0, names)?;
        let cond = self.stream.push(Opcode::JumpIfZero);
        self.in_loop(cont_label, break_label, |a| a.statement(op, 1, names))?;
        self.stream.push_label(Opcode::Jump, cont_label);

        self.stream.patch_here(break_jump);
        self.stream.patch_here(cond);
        Ok(())
    }

    pub(super) fn do_(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let skip = self.stream.push(Opcode::Jump);
        let break_label = self.stream.len();
        let break_jump = self.stream.push(Opcode::Jump);
        let cont_label = self.stream.len();
        let cont_jump = self.stream.push(Opcode::Jump);

        let body = self.stream.len();
        self.stream.patch(skip, body);
        self.in_loop(cont_label, break_label, |a| a.statement(op, 0, names))?;
        self.stream.patch_here(cont_jump);
        self.value(op, 1, names)?;
        let cond = self.stream.push(Opcode::JumpIfZero);
        self.stream.push_label(Opcode::Jump, body);

        self.stream.patch_here(break_jump);
        self.stream.patch_here(cond);
        Ok(())
    }

    /// Children: init, condition, increment, body. A `Void` condition loops
    /// until `break`.
    pub(super) fn for_(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        self.statement(op, 0, names)?;
        let skip = self.stream.push(Opcode::Jump);
        let break_label = self.stream.len();
        let break_jump = self.stream.push(Opcode::Jump);
        let cont_label = self.stream.len();
        self.statement(op, 2, names)?;
        self.stream.patch_here(skip);

        let cond = if self.child(op, 1)?.kind == OpKind::Void {
            None
        } else {
            self.value(op, 1, names)?;
            Some(self.stream.push(Opcode::JumpIfZero))
        };
        self.in_loop(cont_label, break_label, |a| a.statement(op, 3, names))?;
        self.stream.push_label(Opcode::Jump, cont_label);

        self.stream.patch_here(break_jump);
        if let Some(cond) = cond {
            self.stream.patch_here(cond);
        }
        Ok(())
    }
}
