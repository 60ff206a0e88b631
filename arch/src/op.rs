use num_enum::{FromPrimitive, IntoPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Default,
    FromPrimitive,
    IntoPrimitive,
    EnumString,
    Display,
)]
#[repr(u8)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Opcode {
    #[default]
    None,

    FloatCopy,
    FloatMove,
    FloatPush,
    FloatDeref,
    FloatAdd,
    FloatMultiply,
    FloatDivide,
    FloatNegate,
    FloatLess,
    FloatEqualExp,
    FloatEqualInt,
    FloatToInt,
    FloatSine,
    FloatArcsine,
    FloatArctan,
    FloatPower,
    FloatLog2,
    FloatFloor,
    FloatCeil,
    FloatNoise1,
    FloatNoise2,
    FloatNoise3,
    FloatNoise4,

    IntCopy,
    IntMove,
    IntPush,
    IntDeref,
    IntToFloat,
    IntToAddr,

    BoolCopy,
    BoolMove,
    BoolPush,
    BoolDeref,

    AddrCopy,
    AddrPush,
    AddrDeref,
    AddrAdd,
    AddrMultiply,

    Vec4Tex1d,
    Vec4Tex2d,
    Vec4Tex3d,
    Vec4Texcube,
    Vec4Shad1d,
    Vec4Shad2d,

    Jump,
    JumpIfZero,
    Enter,
    Leave,
    LocalAlloc,
    LocalFree,
    LocalAddr,
    GlobalAddr,
    Call,
    Return,
    Discard,
    Exit,

    Vec4Add,
    Vec4Subtract,
    Vec4Multiply,
    Vec4Divide,
    Vec4Negate,
    Vec4Dot,
    Vec4Copy,
    Vec4Deref,
    Vec4EqualInt,
    FloatToVec4,

    FloatPrint,
    IntPrint,
    BoolPrint,
}

impl Opcode {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().parse::<Self>() {
            Ok(Opcode::None) | Err(_) => Err(format!("Undefined opcode: {s}")),
            Ok(op) => Ok(op),
        }
    }
}

/// Which fields of an instruction carry meaning for a given opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    None,
    Literal,
    One,
    Two,
}

impl Opcode {
    pub fn operands(&self) -> Operands {
        use Opcode::*;
        match self {
            FloatPush | IntPush | BoolPush => Operands::Literal,
            FloatCopy | FloatMove | FloatEqualInt | IntCopy | IntMove | BoolCopy | BoolMove
            | LocalAddr | Vec4Copy | Vec4EqualInt => Operands::Two,
            AddrPush | Jump | JumpIfZero | Enter | LocalAlloc | LocalFree | GlobalAddr
            | Call => Operands::One,
            _ => Operands::None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::Jump | Opcode::JumpIfZero | Opcode::Call)
    }
}
