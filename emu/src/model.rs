use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::infolog::InfoLog;

pub const GLOBAL_SIZE: u32 = 3072;
pub const STACK_SIZE: u32 = 1024;

/// One memory cell. Holds either a float or an address, read back by reinterpretation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(u32);

impl Word {
    pub fn float(value: f32) -> Self {
        Word(value.to_bits())
    }

    pub fn addr(value: u32) -> Self {
        Word(value)
    }

    pub fn as_float(self) -> f32 {
        f32::from_bits(self.0)
    }

    pub fn as_addr(self) -> u32 {
        self.0
    }
}

/// Globals occupy words `[0, global_size)`, the stack the `stack_size` words after them.
/// `sp` and `bp` count words from the start of the stack region.
#[derive(Debug, Clone)]
pub struct Machine {
    pub ip: u32,
    pub sp: u32,
    pub bp: u32,
    pub kill: bool,
    pub exit: bool,
    pub infolog: InfoLog,
    global_size: u32,
    stack_size: u32,
    mem: Vec<Word>,
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new(GLOBAL_SIZE, STACK_SIZE)
    }
}

// Lifecycle
impl Machine {
    pub fn new(global_size: u32, stack_size: u32) -> Self {
        Machine {
            ip: 0,
            sp: stack_size,
            bp: 0,
            kill: false,
            exit: false,
            infolog: InfoLog::default(),
            global_size,
            stack_size,
            mem: vec![Word::default(); (global_size + stack_size) as usize],
        }
    }

    /// Prepares a run starting at `entry`. Global memory is kept.
    pub fn reset(&mut self, entry: u32) {
        self.ip = entry;
        self.sp = self.stack_size;
        self.bp = 0;
        self.kill = false;
        self.exit = false;
    }

    pub fn global_size(&self) -> u32 {
        self.global_size
    }

    pub fn stack_size(&self) -> u32 {
        self.stack_size
    }

    /// Byte address of the first stack word.
    pub fn stack_base(&self) -> u32 {
        self.global_size * 4
    }

    pub fn globals(&self) -> &[Word] {
        &self.mem[..self.global_size as usize]
    }

    pub fn load_globals(&mut self, words: &[Word]) -> Result<(), Error> {
        if words.len() > self.global_size as usize {
            return Err(Error::OutOfBounds(words.len() as u32 * 4));
        }
        self.mem[..words.len()].copy_from_slice(words);
        Ok(())
    }
}

// Byte addressed memory
impl Machine {
    fn index(&self, addr: u32) -> Result<usize, Error> {
        let i = (addr / 4) as usize;
        if i < self.mem.len() {
            Ok(i)
        } else {
            Err(Error::OutOfBounds(addr))
        }
    }

    pub fn load(&self, addr: u32) -> Result<Word, Error> {
        Ok(self.mem[self.index(addr)?])
    }

    pub fn store(&mut self, addr: u32, word: Word) -> Result<(), Error> {
        let i = self.index(addr)?;
        self.mem[i] = word;
        Ok(())
    }

    pub fn load_float(&self, addr: u32) -> Result<f32, Error> {
        self.load(addr).map(Word::as_float)
    }

    pub fn store_float(&mut self, addr: u32, value: f32) -> Result<(), Error> {
        self.store(addr, Word::float(value))
    }

    pub fn zero(&mut self, addr: u32, size: u32) -> Result<(), Error> {
        for offset in (0..size).step_by(4) {
            self.store(addr + offset, Word::default())?;
        }
        Ok(())
    }

    /// Copies `size` bytes at `addr` from another machine with the same layout.
    pub fn copy_from(&mut self, other: &Machine, addr: u32, size: u32) -> Result<(), Error> {
        for offset in (0..size).step_by(4) {
            let word = other.load(addr + offset)?;
            self.store(addr + offset, word)?;
        }
        Ok(())
    }
}

// Stack access, relative to sp
impl Machine {
    fn slot(&self, k: u32) -> Result<usize, Error> {
        let i = self.sp.checked_add(k).ok_or(Error::StackUnderflow)?;
        if i < self.stack_size {
            Ok((self.global_size + i) as usize)
        } else {
            Err(Error::StackUnderflow)
        }
    }

    /// `stack[sp + k]`
    pub fn top(&self, k: u32) -> Result<Word, Error> {
        Ok(self.mem[self.slot(k)?])
    }

    pub fn set_top(&mut self, k: u32, word: Word) -> Result<(), Error> {
        let i = self.slot(k)?;
        self.mem[i] = word;
        Ok(())
    }

    pub fn top_float(&self, k: u32) -> Result<f32, Error> {
        self.top(k).map(Word::as_float)
    }

    pub fn alloc(&mut self, words: u32) -> Result<(), Error> {
        self.sp = self.sp.checked_sub(words).ok_or(Error::StackOverflow)?;
        Ok(())
    }

    pub fn free(&mut self, words: u32) -> Result<(), Error> {
        self.sp = self
            .sp
            .checked_add(words)
            .filter(|&sp| sp <= self.stack_size)
            .ok_or(Error::StackUnderflow)?;
        Ok(())
    }

    pub fn push(&mut self, word: Word) -> Result<(), Error> {
        self.alloc(1)?;
        self.set_top(0, word)
    }

    pub fn pop(&mut self) -> Result<Word, Error> {
        let word = self.top(0)?;
        self.free(1)?;
        Ok(word)
    }

    /// Number of words currently on the stack.
    pub fn depth(&self) -> u32 {
        self.stack_size - self.sp
    }
}
