use arch::Opcode;
use log::debug;

use super::{Assembler, RefMode};
use crate::ast::Operation;
use crate::error::Error;
use crate::function::Function;
use crate::scope::{ScopeChain, Variable};
use crate::storage::size_of;
use crate::swizzle::Swizzle;

/// Byte offsets of one activation record, counted down from the frame base.
///
/// ```text
/// 0              return value (ret_size)
/// ret_size       parameters, an address slot ahead of each out/inout value
/// param_size     return address
/// addr_tmp       4 byte address temporary
/// swizzle_tmp    16 byte swizzle temporary
/// ...            locals of every nested block, never shared
/// local_size
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Frame {
    pub ret_size: u32,
    pub param_size: u32,
    pub addr_tmp: u32,
    pub swizzle_tmp: u32,
    pub local_size: u32,
}

impl Frame {
    /// Frame used to pre-evaluate a global initializer.
    pub fn scratch() -> Self {
        Frame {
            ret_size: 0,
            param_size: 0,
            addr_tmp: 0,
            swizzle_tmp: 4,
            local_size: 20,
        }
    }

    /// Assigns frame offsets to every parameter and local of `fun`.
    pub fn layout(fun: &mut Function, vec4: bool) -> Frame {
        let ret_size = size_of(fun.ret(), 0, vec4);
        let mut param_size = ret_size;
        let formals = fun.param_count;
        for var in &mut fun.parameters.variables[..formals] {
            place(var, &mut param_size, vec4);
        }

        let mut local_size = param_size + 4 + 4 + 16;
        for var in &mut fun.parameters.variables[formals..] {
            place(var, &mut local_size, vec4);
        }
        if let Some(body) = &mut fun.body {
            collect_locals(body, &mut local_size, vec4);
        }

        Frame {
            ret_size,
            param_size,
            addr_tmp: param_size + 4,
            swizzle_tmp: param_size + 8,
            local_size,
        }
    }

    /// Bytes a function allocates on entry, beyond what its caller pushed.
    pub fn locals(&self) -> u32 {
        self.local_size - self.param_size - 4
    }
}

fn place(var: &mut Variable, offset: &mut u32, vec4: bool) {
    let reference = if var.ty.qualifier.is_reference() { 4 } else { 0 };
    var.address = *offset + reference;
    var.size = size_of(&var.ty.specifier, var.array_len, vec4);
    *offset += var.size + reference;
}

fn collect_locals(op: &mut Operation, offset: &mut u32, vec4: bool) {
    for var in &mut op.locals.variables {
        place(var, offset, vec4);
    }
    for child in &mut op.children {
        collect_locals(child, offset, vec4);
    }
}

impl<'a> Assembler<'a> {
    /// Emits `fun`, which must have been laid out as `frame`, and resolves
    /// calls that were emitted before its address was known.
    pub fn function(&mut self, fun: &Function, frame: Frame, globals: &ScopeChain) -> Result<(), Error> {
        let Some(body) = &fun.body else {
            return Ok(());
        };
        let address = self.stream.len();
        fun.address.set(address);
        for pos in fun.fixups.take() {
            self.stream.patch(pos, address);
        }
        self.frame = frame;

        self.stream.push_label(Opcode::LocalAlloc, frame.locals());
        self.stream.push_label(Opcode::Enter, frame.local_size);
        let skip = self.stream.push(Opcode::Jump);
        self.flow.function_end = self.stream.len();
        let cleanup = self.stream.push(Opcode::Jump);
        self.stream.patch_here(skip);

        let params = globals.enter(&fun.parameters);
        self.operation(body, &params, RefMode::Forbid)?;

        self.stream.patch_here(cleanup);
        self.stream.push(Opcode::Leave);
        self.stream.push_label(Opcode::LocalFree, frame.locals());
        self.stream.push(Opcode::Return);

        debug!(
            "{} {} at {:04}, frame {} bytes",
            fun.kind,
            self.space.atoms.id(fun.name()),
            address,
            frame.local_size
        );
        Ok(())
    }

    pub(super) fn call_name(
        &mut self,
        name: &str,
        args: &[Operation],
        names: &ScopeChain,
        assignment: bool,
    ) -> Result<(), Error> {
        let fun = match self.space.atoms.find(name) {
            Some(atom) => self.space.locate_function(atom, args, names)?,
            None => None,
        };
        let fun = fun.ok_or_else(|| Error::UndeclaredFunction(name.to_string()))?;
        self.function_call(fun, args, names, assignment)
    }

    /// Calls `fun` with `args`.
    ///
    /// With `assignment`, the address of the first (out/inout) argument is
    /// left on the stack as the result of the enclosing assignment.
    pub(super) fn function_call(
        &mut self,
        fun: &Function,
        args: &[Operation],
        names: &ScopeChain,
        assignment: bool,
    ) -> Result<(), Error> {
        if !fun.ret().is_void() {
            self.stream
                .push_label(Opcode::LocalAlloc, size_of(fun.ret(), 0, self.vec4));
        }

        let mut masks: Vec<Option<Swizzle>> = Vec::with_capacity(args.len());
        for (i, (arg, formal)) in args.iter().zip(fun.formals()).enumerate() {
            if formal.ty.qualifier.is_reference() {
                self.local_addr(self.frame.addr_tmp, 4);
                masks.push(self.operation(arg, names, RefMode::Force)?);
                self.stream.push(Opcode::AddrCopy);
                self.stream.push(Opcode::AddrDeref);
                if i == 0 && assignment {
                    self.local_addr(self.frame.addr_tmp, 4);
                    self.stream.push(Opcode::AddrDeref);
                }
                self.dereference(arg, names)?;
            } else {
                masks.push(self.operation(arg, names, RefMode::Forbid)?);
            }
        }

        let call = self.stream.push_label(Opcode::Call, fun.address.get());
        if !fun.is_assembled() {
            fun.fixups.borrow_mut().push(call);
        }

        for ((arg, formal), mask) in args.iter().zip(fun.formals()).zip(masks).rev() {
            if formal.ty.qualifier.is_reference() {
                self.assignment(arg, names, mask)?;
                self.local_free(4);
            } else {
                self.cleanup_stack(arg, names)?;
            }
        }
        Ok(())
    }
}
