use crate::op::{Opcode, Operands};

use color_print::cformat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub literal: f64,
    #[serde(default)]
    pub param: [u32; 2],
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            ..Default::default()
        }
    }

    pub fn label(opcode: Opcode, p0: u32) -> Self {
        Instruction {
            opcode,
            param: [p0, 0],
            ..Default::default()
        }
    }

    pub fn label2(opcode: Opcode, p0: u32, p1: u32) -> Self {
        Instruction {
            opcode,
            param: [p0, p1],
            ..Default::default()
        }
    }

    pub fn literal(opcode: Opcode, literal: f64) -> Self {
        Instruction {
            opcode,
            literal,
            ..Default::default()
        }
    }

    pub fn cformat(&self) -> String {
        let name = self.opcode.to_string();
        match self.opcode.operands() {
            Operands::None => cformat!("<r>{}</>", name),
            Operands::Literal => cformat!("<r>{:<16}</><y>{}</>", name, self.literal),
            Operands::One if self.opcode.is_branch() => {
                cformat!("<r>{:<16}</><g>@{:04}</>", name, self.param[0])
            }
            Operands::One => cformat!("<r>{:<16}</><b>{}</>", name, self.param[0]),
            Operands::Two => cformat!(
                "<r>{:<16}</><b>{} {}</>",
                name,
                self.param[0],
                self.param[1]
            ),
        }
    }
}
