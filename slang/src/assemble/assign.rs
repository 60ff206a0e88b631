use arch::Opcode;

use super::{copy_op, Assembler, RefMode};
use crate::ast::Operation;
use crate::error::Error;
use crate::scope::ScopeChain;
use crate::storage::{Aggregate, Leaf};
use crate::swizzle::Swizzle;

impl<'a> Assembler<'a> {
    /// `=` and the compound assignments, which call the operator `oper`
    /// with the target passed by reference.
    pub(super) fn assign(
        &mut self,
        op: &Operation,
        names: &ScopeChain,
        oper: &str,
        mode: RefMode,
    ) -> Result<Option<Swizzle>, Error> {
        let target = self.child(op, 0)?;
        if mode == RefMode::Forbid {
            self.local_addr(self.frame.addr_tmp, 4);
        }

        let mask = if oper == "=" {
            if !self.type_of(target, names)?.can_be_referenced {
                return Err(Error::NotAnLValue);
            }
            let mask = self.operation(target, names, RefMode::Force)?;
            self.operation(self.child(op, 1)?, names, RefMode::Forbid)?;
            self.assignment(target, names, mask)?;
            mask
        } else {
            self.call_name(oper, &op.children, names, true)?;
            None
        };

        if mode == RefMode::Forbid {
            self.stream.push(Opcode::AddrCopy);
            self.local_free(4);
            self.dereference(target, names)?;
        }
        Ok(mask)
    }

    /// Stores the value on top of the stack through the address right below
    /// it, first leaf first. `mask` redirects each component of a swizzle.
    pub(super) fn assignment(
        &mut self,
        op: &Operation,
        names: &ScopeChain,
        mask: Option<Swizzle>,
    ) -> Result<(), Error> {
        let ti = self.type_of(op, names)?;
        let agg = Aggregate::of(&ti.spec, ti.array_len, self.vec4);
        let size = agg.size();

        let mut index = 0;
        for leaf in agg.leaves() {
            let leaves = match (mask, leaf) {
                (Some(_), Leaf::Vec4) => vec![Leaf::Float; 4],
                _ => vec![leaf],
            };
            for leaf in leaves {
                let dst = match &mask {
                    Some(swz) => swz.index[(index / 4) as usize] * 4,
                    None => index,
                };
                self.stream.push_label2(copy_op(leaf), size - index, dst);
                index += leaf.size();
            }
        }
        Ok(())
    }
}
