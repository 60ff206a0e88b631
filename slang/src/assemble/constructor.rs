use arch::Opcode;

use super::{Assembler, RefMode};
use crate::ast::Operation;
use crate::error::Error;
use crate::scope::ScopeChain;
use crate::storage::size_of;

impl<'a> Assembler<'a> {
    /// `T(args...)` where `T` names a type and no function of that name
    /// matches: the arguments are pushed as the components of the new
    /// value, and whatever the last argument brings beyond `T` is dropped.
    pub(super) fn constructor(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let name = op.name.ok_or_else(|| Error::Internal("anonymous constructor".into()))?;
        let spec = self.space.constructed_type(name)?;
        let size = size_of(&spec, 0, self.vec4);

        let mut sizes = Vec::with_capacity(op.children.len());
        for arg in &op.children {
            let ti = self.type_of(arg, names)?;
            sizes.push(size_of(&ti.spec, 0, self.vec4));
        }
        let total: u32 = sizes.iter().sum();
        let leading = total - sizes.last().copied().unwrap_or(0);
        if leading > size {
            return Err(Error::TooManyArguments(self.name(op)));
        }
        if total < size {
            return Err(Error::NotEnoughArguments(self.name(op)));
        }

        // first component ends up on top
        for (i, arg) in op.children.iter().enumerate().rev() {
            self.operation(arg, names, RefMode::Forbid)?;
            let garbage = total - size;
            if i + 1 == op.children.len() && garbage != 0 {
                let arg_size = sizes[i];
                self.stream.push_label(Opcode::AddrPush, 0);
                for k in (4..=arg_size - garbage).rev().step_by(4) {
                    self.stream.push_label2(Opcode::FloatMove, garbage + k, k);
                }
                self.local_free(garbage + 4);
            }
        }
        Ok(())
    }
}
