use arch::Opcode;

use super::{Assembler, RefMode};
use crate::ast::Operation;
use crate::error::Error;
use crate::scope::ScopeChain;

/// An `asm` mnemonic and the one or two opcodes it expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intrinsic {
    pub name: &'static str,
    pub code1: Opcode,
    pub code2: Option<Opcode>,
}

const fn op(name: &'static str, code1: Opcode, code2: Opcode) -> Intrinsic {
    Intrinsic {
        name,
        code1,
        code2: Some(code2),
    }
}

const fn op1(name: &'static str, code1: Opcode) -> Intrinsic {
    Intrinsic {
        name,
        code1,
        code2: None,
    }
}

/// Intrinsics available to `asm` statements of the core library.
pub const INTRINSICS: &[Intrinsic] = &[
    // float
    op("float_add", Opcode::FloatAdd, Opcode::FloatCopy),
    op("float_multiply", Opcode::FloatMultiply, Opcode::FloatCopy),
    op("float_divide", Opcode::FloatDivide, Opcode::FloatCopy),
    op("float_negate", Opcode::FloatNegate, Opcode::FloatCopy),
    op("float_less", Opcode::FloatLess, Opcode::BoolCopy),
    op("float_equal", Opcode::FloatEqualExp, Opcode::BoolCopy),
    op("float_to_int", Opcode::FloatToInt, Opcode::IntCopy),
    op("float_sine", Opcode::FloatSine, Opcode::FloatCopy),
    op("float_arcsine", Opcode::FloatArcsine, Opcode::FloatCopy),
    op("float_arctan", Opcode::FloatArctan, Opcode::FloatCopy),
    op("float_power", Opcode::FloatPower, Opcode::FloatCopy),
    op("float_log2", Opcode::FloatLog2, Opcode::FloatCopy),
    op("float_floor", Opcode::FloatFloor, Opcode::FloatCopy),
    op("float_ceil", Opcode::FloatCeil, Opcode::FloatCopy),
    op("float_noise1", Opcode::FloatNoise1, Opcode::FloatCopy),
    op("float_noise2", Opcode::FloatNoise2, Opcode::FloatCopy),
    op("float_noise3", Opcode::FloatNoise3, Opcode::FloatCopy),
    op("float_noise4", Opcode::FloatNoise4, Opcode::FloatCopy),
    // int
    op("int_to_float", Opcode::IntToFloat, Opcode::FloatCopy),
    // texture
    op1("vec4_tex1d", Opcode::Vec4Tex1d),
    op1("vec4_tex2d", Opcode::Vec4Tex2d),
    op1("vec4_tex3d", Opcode::Vec4Tex3d),
    op1("vec4_texcube", Opcode::Vec4Texcube),
    op1("vec4_shad1d", Opcode::Vec4Shad1d),
    op1("vec4_shad2d", Opcode::Vec4Shad2d),
    // debug
    op("float_print", Opcode::FloatDeref, Opcode::FloatPrint),
    op("int_print", Opcode::IntDeref, Opcode::IntPrint),
    op("bool_print", Opcode::BoolDeref, Opcode::BoolPrint),
    // vec4
    op1("float_to_vec4", Opcode::FloatToVec4),
    op1("vec4_add", Opcode::Vec4Add),
    op1("vec4_subtract", Opcode::Vec4Subtract),
    op1("vec4_multiply", Opcode::Vec4Multiply),
    op1("vec4_divide", Opcode::Vec4Divide),
    op1("vec4_negate", Opcode::Vec4Negate),
    op1("vec4_dot", Opcode::Vec4Dot),
];

pub fn intrinsic(name: &str) -> Option<&'static Intrinsic> {
    INTRINSICS.iter().find(|i| i.name == name)
}

impl<'a> Assembler<'a> {
    /// `asm name dst, src...`: the destination goes by address, the sources
    /// by value, and the address is popped once the opcodes have run.
    pub(super) fn asm(&mut self, op: &Operation, names: &ScopeChain) -> Result<(), Error> {
        let name = self.name(op);
        let info = intrinsic(&name).ok_or(Error::UnknownInstruction(name))?;

        for (i, arg) in op.children.iter().enumerate() {
            let mode = if i == 0 { RefMode::Force } else { RefMode::Forbid };
            self.operation(arg, names, mode)?;
        }

        self.stream.push_label2(info.code1, 4, 0);
        if let Some(code2) = info.code2 {
            self.stream.push_label2(code2, 4, 0);
        }
        self.local_free(4);
        Ok(())
    }
}
