use arch::Opcode;

use super::{copy_op, deref_op, Assembler, RefMode};
use crate::ast::Operation;
use crate::error::Error;
use crate::scope::ScopeChain;
use crate::storage::{size_of, Leaf};
use crate::swizzle::Swizzle;
use crate::types::TypeSpecifier;

impl<'a> Assembler<'a> {
    /// `master[index]` on arrays, vectors and matrices.
    pub(super) fn subscript(&mut self, op: &Operation, names: &ScopeChain, mode: RefMode) -> Result<(), Error> {
        let (master, index) = (self.child(op, 0)?, self.child(op, 1)?);
        let tia = self.type_of(master, names)?;
        let asize = self.size_of(&tia);
        let tie = self.type_of(op, names)?;
        let esize = size_of(&tie.spec, 0, self.vec4);

        self.operation(master, names, mode)?;
        let through_mask = match tia.swizzle {
            Some(swz) if mode == RefMode::Force => Some(swz),
            _ => None,
        };
        if through_mask.is_some() {
            self.local_addr(self.frame.swizzle_tmp, 16);
        }

        self.operation(index, names, RefMode::Forbid)?;

        if let Some(swz) = through_mask {
            // look the component up in a table of the mask's indices
            for (i, &component) in swz.indices().iter().enumerate() {
                self.local_addr(self.frame.swizzle_tmp, 16);
                self.stream.push_label(Opcode::AddrPush, i as u32 * 4);
                self.stream.push(Opcode::AddrAdd);
                self.stream.push_label(Opcode::AddrPush, component);
                self.stream.push(Opcode::AddrCopy);
                self.local_free(4);
            }
            self.stream.push(Opcode::IntToAddr);
            self.stream.push_label(Opcode::AddrPush, 4);
            self.stream.push(Opcode::AddrMultiply);
            self.stream.push(Opcode::AddrAdd);
            self.stream.push(Opcode::AddrDeref);
        } else {
            self.stream.push(Opcode::IntToAddr);
        }

        self.stream.push_label(Opcode::AddrPush, esize);
        self.stream.push(Opcode::AddrMultiply);

        if mode == RefMode::Force {
            self.stream.push(Opcode::AddrAdd);
        } else {
            // slide the element over the far end of the master value, then drop the rest
            for i in (0..esize).step_by(4) {
                self.stream
                    .push_label2(Opcode::FloatMove, asize - esize + i + 4, i + 4);
            }
            self.local_free(4);
            if asize != esize {
                self.local_free(asize - esize);
            }
        }
        Ok(())
    }

    /// Struct member or vector swizzle.
    pub(super) fn field(
        &mut self,
        op: &Operation,
        names: &ScopeChain,
        mode: RefMode,
    ) -> Result<Option<Swizzle>, Error> {
        let master = self.child(op, 0)?;
        let tia = self.type_of(op, names)?;
        let tib = self.type_of(master, names)?;

        if let Some(swz) = tia.swizzle {
            if mode == RefMode::Force {
                self.operation(master, names, mode)?;
                return Ok(Some(swz));
            }
            // the master's value is already swizzled, so apply only this step
            let local = Swizzle::parse(&self.name(op), tib.spec.dim())
                .ok_or_else(|| Error::InvalidField(self.name(op)))?;
            self.local_addr(self.frame.swizzle_tmp, 16);
            self.operation(master, names, mode)?;
            self.constructor_from_swizzle(&local, &tib.spec);
            return Ok(None);
        }

        self.operation(master, names, mode)?;
        let TypeSpecifier::Struct(def) = &tib.spec else {
            return Err(Error::InvalidField(self.name(op)));
        };
        let mut struct_size = 0;
        let (mut field_offset, mut field_size) = (0, 0);
        for var in &def.fields.variables {
            let size = size_of(&var.ty.specifier, var.array_len, self.vec4);
            if Some(var.name) == op.name {
                field_offset = struct_size;
                field_size = size;
            }
            struct_size += size;
        }

        if mode == RefMode::Force {
            if field_offset != 0 {
                self.stream.push_label(Opcode::AddrPush, field_offset);
                self.stream.push(Opcode::AddrAdd);
            }
            return Ok(None);
        }

        let mut free = 0;
        if field_offset != struct_size - field_size {
            // move the field to the far end, last word first
            self.stream.push_label(Opcode::AddrPush, field_offset);
            for i in (4..=field_size).rev().step_by(4) {
                self.stream
                    .push_label2(Opcode::FloatMove, struct_size - field_size + i, i);
            }
            free += 4;
        }
        if field_size != struct_size {
            free += struct_size - field_size;
        }
        if free != 0 {
            self.local_free(free);
        }
        Ok(None)
    }

    /// Repacks the vector on top of the stack through the swizzle temporary,
    /// whose address sits right below it.
    fn constructor_from_swizzle(&mut self, swz: &Swizzle, master: &TypeSpecifier) {
        let rows = master.dim();
        let leaf = match master.base() {
            TypeSpecifier::Bool => Leaf::Bool,
            TypeSpecifier::Int => Leaf::Int,
            _ => Leaf::Float,
        };
        for i in 0..rows {
            self.stream.push_label2(copy_op(leaf), (rows - i) * 4, i * 4);
        }
        self.local_free(4);
        for &component in swz.indices().iter().rev() {
            self.local_addr(self.frame.swizzle_tmp, 16);
            self.stream.push_label(Opcode::AddrPush, component * 4);
            self.stream.push(Opcode::AddrAdd);
            self.stream.push(deref_op(leaf));
        }
    }
}
