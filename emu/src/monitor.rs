use arch::InstructionStream;

use crate::error::Error;
use crate::hooks::Hook;
use crate::interp::{Backend, Interpreter};
use crate::model::Machine;

/// Interpreter that runs a set of hooks around every instruction.
pub struct Monitor {
    interp: Interpreter,
    hooks: Vec<Box<dyn Hook>>,
}

impl Monitor {
    pub fn new(interp: Interpreter, hooks: Vec<Box<dyn Hook>>) -> Self {
        Monitor { interp, hooks }
    }
}

impl Backend for Monitor {
    fn run(&mut self, code: &InstructionStream, machine: &mut Machine) -> Result<(), Error> {
        for hook in self.hooks.iter_mut() {
            hook.init(machine);
        }

        let tmax = self.interp.max_steps().unwrap_or(u64::MAX);
        let mut time = 0;
        while !machine.exit {
            if time >= tmax {
                return Err(Error::StepLimit(time));
            }
            let ip = machine.ip;
            let inst = self.interp.step(code, machine)?;
            for hook in self.hooks.iter_mut() {
                hook.exec(time, ip, &inst, machine);
            }
            time += 1;
        }

        for hook in self.hooks.iter_mut() {
            hook.exit(machine);
        }
        Ok(())
    }
}
