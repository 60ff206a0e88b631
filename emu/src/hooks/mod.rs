pub mod dump;
pub mod trace;

use arch::Instruction;

use crate::model::Machine;

/// Side effects observed around each executed instruction.
pub trait Hook {
    fn init(&mut self, machine: &mut Machine);
    fn exec(&mut self, time: u64, ip: u32, inst: &Instruction, machine: &mut Machine);
    fn exit(&mut self, _machine: &Machine) {}
}
