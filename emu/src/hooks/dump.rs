use arch::Instruction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use crate::error::Error;
use crate::model::Machine;

use super::Hook;

/// Prints machine state at configured instruction addresses.
#[derive(Debug, Default)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
}

/// Keyed by instruction address, e.g.
///
/// ```yaml
/// 12:
///   stack: true
///   globals: [0, 4, 8]
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct List(HashMap<u32, Config>);

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    #[serde(default)]
    stack: bool,
    #[serde(default)]
    globals: Vec<u32>,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, Error> {
        let list = match &file {
            Some(fname) => serde_yaml::from_reader(BufReader::new(File::open(fname)?))?,
            None => List::default(),
        };
        Ok(Self { file, all, list })
    }

    fn get(&self, ip: u32) -> Option<&Config> {
        self.list.0.get(&ip)
    }
}

impl Hook for Dump {
    fn init(&mut self, _machine: &mut Machine) {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
    }

    fn exec(&mut self, _time: u64, ip: u32, _inst: &Instruction, machine: &mut Machine) {
        if let Some(cfg) = self.get(ip) {
            self.print_reg(machine);
            if cfg.stack {
                self.print_stack(machine);
            }
            self.print_globals(machine, &cfg.globals);
        } else if self.all {
            self.print_reg(machine);
        }
    }

    fn exit(&mut self, machine: &Machine) {
        if self.all {
            self.print_stack(machine);
        }
    }
}

impl Dump {
    fn print_reg(&self, m: &Machine) {
        println!(" +----------+----------+----------+-----------+");
        println!(
            " | ip: {:04} | sp: {:04} | bp: {:04} | kill: {:<4} |",
            m.ip, m.sp, m.bp, m.kill
        );
        println!(" +----------+----------+----------+-----------+");
    }

    fn print_stack(&self, m: &Machine) {
        for k in 0..m.depth() {
            if let Ok(word) = m.top(k) {
                println!(
                    " | {:04} : {:0>8X} {:<14}                |",
                    m.sp + k,
                    word.as_addr(),
                    word.as_float()
                );
            }
        }
        println!(" +---------------------------------------------+");
    }

    fn print_globals(&self, m: &Machine, addrs: &[u32]) {
        for &addr in addrs {
            if let Ok(word) = m.load(addr) {
                println!(
                    " | {:04} : {:0>8X} {:<14}                |",
                    addr,
                    word.as_addr(),
                    word.as_float()
                );
            }
        }
        println!(" +---------------------------------------------+");
    }
}
