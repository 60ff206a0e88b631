use arch::Instruction;

use crate::model::Machine;

use super::Hook;

/// Prints every executed instruction with the frame registers after it ran.
#[derive(Debug, Default)]
pub struct Trace {
    enabled: bool,
    lines: Vec<String>,
    quiet: bool,
}

impl Trace {
    pub fn arg(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    /// Collects lines instead of printing them.
    pub fn quiet() -> Self {
        Self {
            enabled: true,
            quiet: true,
            lines: vec![],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Hook for Trace {
    fn init(&mut self, machine: &mut Machine) {
        if self.enabled && !self.quiet {
            println!(" * Trace from {:04}", machine.ip);
        }
    }

    fn exec(&mut self, time: u64, ip: u32, inst: &Instruction, machine: &mut Machine) {
        if !self.enabled {
            return;
        }
        let line = format!(
            "[{:0>5}] {:04} {:<40} sp={:<5} bp={}",
            time,
            ip,
            inst.opcode.to_string(),
            machine.sp,
            machine.bp
        );
        if self.quiet {
            self.lines.push(line);
        } else {
            println!("{}", line);
        }
    }
}
