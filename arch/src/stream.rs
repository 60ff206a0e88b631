use crate::inst::Instruction;
use crate::op::Opcode;

use serde::{Deserialize, Serialize};

/// Append-only instruction log. Positions are stable indices and double as jump targets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionStream(Vec<Instruction>);

/// Marks a stream length that can later be truncated back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePoint(usize);

impl InstructionStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, pos: u32) -> Option<&Instruction> {
        self.0.get(pos as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.0.iter()
    }

    pub fn append(&mut self, inst: Instruction) -> u32 {
        let pos = self.len();
        self.0.push(inst);
        pos
    }

    pub fn push(&mut self, opcode: Opcode) -> u32 {
        self.append(Instruction::new(opcode))
    }

    pub fn push_label(&mut self, opcode: Opcode, p0: u32) -> u32 {
        self.append(Instruction::label(opcode, p0))
    }

    pub fn push_label2(&mut self, opcode: Opcode, p0: u32, p1: u32) -> u32 {
        self.append(Instruction::label2(opcode, p0, p1))
    }

    pub fn push_literal(&mut self, opcode: Opcode, literal: f64) -> u32 {
        self.append(Instruction::literal(opcode, literal))
    }

    /// Rewrites `param[0]` of an already emitted instruction. Positions past the end are ignored.
    pub fn patch(&mut self, pos: u32, p0: u32) {
        if let Some(inst) = self.0.get_mut(pos as usize) {
            inst.param[0] = p0;
        }
    }

    /// Points the jump at `pos` to the current end of the stream.
    pub fn patch_here(&mut self, pos: u32) {
        let here = self.len();
        self.patch(pos, here);
    }

    pub fn save(&self) -> RestorePoint {
        RestorePoint(self.0.len())
    }

    pub fn restore(&mut self, point: RestorePoint) {
        self.0.truncate(point.0);
    }

    pub fn listing(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(pos, inst)| format!("{:04}  {}\n", pos, inst.cformat()))
            .collect()
    }
}

impl From<Vec<Instruction>> for InstructionStream {
    fn from(code: Vec<Instruction>) -> Self {
        InstructionStream(code)
    }
}
