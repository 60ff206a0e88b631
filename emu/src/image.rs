use arch::InstructionStream;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

use crate::error::Error;
use crate::model::{Machine, Word, GLOBAL_SIZE, STACK_SIZE};

/// A compiled program as written to disk: code, initialized globals and entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub global_size: u32,
    pub stack_size: u32,
    pub code: InstructionStream,
    pub globals: Vec<Word>,
    pub entries: IndexMap<String, u32>,
}

impl Default for Image {
    fn default() -> Self {
        Image {
            global_size: GLOBAL_SIZE,
            stack_size: STACK_SIZE,
            code: InstructionStream::default(),
            globals: vec![],
            entries: IndexMap::new(),
        }
    }
}

impl Image {
    pub fn load(path: &str) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save(&self, path: &str) -> Result<(), Error> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Result<u32, Error> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownEntry(name.to_string()))
    }

    /// A fresh machine with the image's globals loaded, positioned at `entry`.
    pub fn machine(&self, entry: &str) -> Result<Machine, Error> {
        let mut machine = Machine::new(self.global_size, self.stack_size);
        machine.load_globals(&self.globals)?;
        machine.reset(self.entry(entry)?);
        Ok(machine)
    }
}
