use arch::{Instruction, InstructionStream, Opcode};
use log::{trace, warn};

use crate::error::Error;
use crate::model::{Machine, Word};
use crate::noise;
use crate::sampler::{NullSampler, Sampler};

/// Something that can run an instruction stream on a machine until it exits.
pub trait Backend {
    fn run(&mut self, code: &InstructionStream, machine: &mut Machine) -> Result<(), Error>;
}

/// Reference backend: decodes and executes one instruction at a time.
pub struct Interpreter {
    sampler: Box<dyn Sampler>,
    max_steps: Option<u64>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            sampler: Box::new(NullSampler),
            max_steps: None,
        }
    }

    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> Option<u64> {
        self.max_steps
    }

    /// Fetches the instruction at `ip`, advances `ip`, and executes it.
    pub fn step(&mut self, code: &InstructionStream, m: &mut Machine) -> Result<Instruction, Error> {
        let inst = *code.get(m.ip).ok_or(Error::IpOutOfRange(m.ip))?;
        m.ip += 1;
        self.exec(&inst, m)?;
        Ok(inst)
    }

    pub fn exec(&mut self, inst: &Instruction, m: &mut Machine) -> Result<(), Error> {
        use Opcode::*;
        let [p0, p1] = inst.param;
        match inst.opcode {
            None => return Err(Error::InvalidOpcode(m.ip.saturating_sub(1))),

            FloatCopy | IntCopy | BoolCopy => {
                let dst = m.top(p0 / 4)?.as_addr().wrapping_add(p1);
                let value = m.pop()?;
                m.store(dst, value)?;
            }
            FloatMove | IntMove | BoolMove => {
                let src = m.top(0)?.as_addr().wrapping_add(p1) / 4;
                let value = m.top(src)?;
                m.set_top(p0 / 4, value)?;
            }
            FloatPush | IntPush | BoolPush => m.push(Word::float(inst.literal as f32))?,
            FloatDeref | IntDeref | BoolDeref | AddrDeref => {
                let value = m.load(m.top(0)?.as_addr())?;
                m.set_top(0, value)?;
            }

            FloatAdd => binary(m, |a, b| a + b)?,
            FloatMultiply => binary(m, |a, b| a * b)?,
            FloatDivide => binary(m, |a, b| a / b)?,
            FloatPower => binary(m, f32::powf)?,
            FloatLess => binary(m, |a, b| truth(a < b))?,
            FloatEqualExp => binary(m, |a, b| truth(a == b))?,
            FloatNegate => unary(m, |a| -a)?,
            FloatToInt => unary(m, f32::trunc)?,
            FloatSine => unary(m, f32::sin)?,
            FloatArcsine => unary(m, f32::asin)?,
            FloatArctan => unary(m, f32::atan)?,
            FloatLog2 => unary(m, |a| a.ln() / std::f32::consts::LN_2)?,
            FloatFloor => unary(m, f32::floor)?,
            FloatCeil => unary(m, f32::ceil)?,
            FloatEqualInt => compare(m, p0, p1, 1)?,
            Vec4EqualInt => compare(m, p0, p1, 4)?,

            FloatNoise1 => unary(m, noise::noise1)?,
            FloatNoise2 => {
                let v = noise::noise2(m.top_float(0)?, m.top_float(1)?);
                m.set_top(1, Word::float(v))?;
                m.free(1)?;
            }
            FloatNoise3 => {
                let v = noise::noise3(m.top_float(0)?, m.top_float(1)?, m.top_float(2)?);
                m.set_top(2, Word::float(v))?;
                m.free(2)?;
            }
            FloatNoise4 => {
                let v = noise::noise4(
                    m.top_float(0)?,
                    m.top_float(1)?,
                    m.top_float(2)?,
                    m.top_float(3)?,
                );
                m.set_top(3, Word::float(v))?;
                m.free(3)?;
            }

            IntToFloat => {}
            IntToAddr => {
                let index = m.top_float(0)? as i32;
                m.set_top(0, Word::addr(index as u32))?;
            }

            AddrCopy => {
                let dst = m.top(1)?.as_addr();
                let value = m.pop()?;
                m.store(dst, value)?;
            }
            AddrPush | GlobalAddr => m.push(Word::addr(p0))?,
            AddrAdd => {
                let v = m.top(1)?.as_addr().wrapping_add(m.top(0)?.as_addr());
                m.set_top(1, Word::addr(v))?;
                m.free(1)?;
            }
            AddrMultiply => {
                let v = m.top(1)?.as_addr().wrapping_mul(m.top(0)?.as_addr());
                m.set_top(1, Word::addr(v))?;
                m.free(1)?;
            }

            Vec4Tex1d => {
                let (bias, s) = (m.top_float(0)?, m.top_float(1)?);
                let unit = m.top_float(2)? as u32;
                let texel = self.sampler.texture1d(bias, s, unit);
                let dst = m.top(3)?.as_addr();
                store4(m, dst, texel)?;
                m.free(3)?;
            }
            Vec4Tex2d => {
                let (bias, s, t) = (m.top_float(0)?, m.top_float(1)?, m.top_float(2)?);
                let unit = m.top_float(3)? as u32;
                let texel = self.sampler.texture2d(bias, s, t, unit);
                let dst = m.top(4)?.as_addr();
                store4(m, dst, texel)?;
                m.free(4)?;
            }
            Vec4Tex3d | Vec4Texcube | Vec4Shad1d | Vec4Shad2d => {
                let bias = m.top_float(0)?;
                let (s, t, r) = (m.top_float(1)?, m.top_float(2)?, m.top_float(3)?);
                let unit = m.top_float(4)? as u32;
                let texel = match inst.opcode {
                    Vec4Tex3d => self.sampler.texture3d(bias, s, t, r, unit),
                    Vec4Texcube => self.sampler.texture_cube(bias, s, t, r, unit),
                    Vec4Shad1d => self.sampler.shadow1d(bias, s, t, r, unit),
                    _ => self.sampler.shadow2d(bias, s, t, r, unit),
                };
                let dst = m.top(5)?.as_addr();
                store4(m, dst, texel)?;
                m.free(5)?;
            }

            Jump => m.ip = p0,
            JumpIfZero => {
                if m.pop()?.as_float() == 0.0 {
                    m.ip = p0;
                }
            }
            Enter => {
                m.push(Word::addr(m.bp))?;
                m.bp = m.sp + p0 / 4;
            }
            Leave => m.bp = m.pop()?.as_addr(),
            LocalAlloc => m.alloc(p0 / 4)?,
            LocalFree => m.free(p0 / 4)?,
            LocalAddr => {
                let addr = (m.stack_base() + m.bp * 4 + 4)
                    .checked_sub(p0 + p1)
                    .ok_or(Error::OutOfBounds(p0 + p1))?;
                m.push(Word::addr(addr))?;
            }
            Call => {
                m.push(Word::addr(m.ip))?;
                m.ip = p0;
            }
            Return => m.ip = m.pop()?.as_addr(),
            Discard => {
                warn!("fragment discarded at {:04}", m.ip.saturating_sub(1));
                m.kill = true;
            }
            Exit => m.exit = true,

            Vec4Add => vec4_binary(m, |a, b| a + b)?,
            Vec4Subtract => vec4_binary(m, |a, b| a - b)?,
            Vec4Multiply => vec4_binary(m, |a, b| a * b)?,
            Vec4Divide => vec4_binary(m, |a, b| a / b)?,
            Vec4Negate => {
                let da = m.top(0)?.as_addr();
                for i in 0..4 {
                    let v = m.load_float(da + i * 4)?;
                    m.store_float(da + i * 4, -v)?;
                }
            }
            Vec4Dot => {
                let da = m.top(4)?.as_addr();
                let mut dot = 0.0;
                for i in 0..4 {
                    dot += m.load_float(da + i * 4)? * m.top_float(i)?;
                }
                m.store_float(da, dot)?;
                m.free(4)?;
            }
            Vec4Copy => {
                let da = m.top(p0 / 4)?.as_addr().wrapping_add(p1);
                for i in 0..4 {
                    let value = m.top(i)?;
                    m.store(da + i * 4, value)?;
                }
                m.free(4)?;
            }
            Vec4Deref => {
                let sa = m.top(0)?.as_addr();
                m.alloc(3)?;
                for i in 0..4 {
                    let value = m.load(sa + i * 4)?;
                    m.set_top(i, value)?;
                }
            }
            FloatToVec4 => {
                let da = m.top(1)?.as_addr();
                let value = m.pop()?;
                for i in 0..4 {
                    m.store(da + i * 4, value)?;
                }
            }

            FloatPrint => {
                let v = m.top_float(0)?;
                println!("slang: {v}");
                m.infolog.print(v);
            }
            IntPrint => {
                let v = m.top_float(0)? as i32;
                println!("slang: {v}");
                m.infolog.print(v);
            }
            BoolPrint => {
                let v = m.top_float(0)? != 0.0;
                println!("slang: {v}");
                m.infolog.print(v);
            }
        }
        Ok(())
    }
}

impl Backend for Interpreter {
    fn run(&mut self, code: &InstructionStream, m: &mut Machine) -> Result<(), Error> {
        let mut steps = 0;
        while !m.exit {
            if self.max_steps.is_some_and(|max| steps >= max) {
                return Err(Error::StepLimit(steps));
            }
            let inst = self.step(code, m)?;
            trace!("{:04} {}", m.ip - 1, inst.opcode);
            steps += 1;
        }
        Ok(())
    }
}

fn truth(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn unary(m: &mut Machine, f: impl Fn(f32) -> f32) -> Result<(), Error> {
    let v = f(m.top_float(0)?);
    m.set_top(0, Word::float(v))
}

/// `stack[sp+1] = f(stack[sp+1], stack[sp]); sp++`
fn binary(m: &mut Machine, f: impl Fn(f32, f32) -> f32) -> Result<(), Error> {
    let v = f(m.top_float(1)?, m.top_float(0)?);
    m.set_top(1, Word::float(v))?;
    m.free(1)
}

/// Pushes 1.0 when `width` words at the two stack offsets are pairwise equal.
fn compare(m: &mut Machine, a: u32, b: u32, width: u32) -> Result<(), Error> {
    let mut equal = true;
    for i in 0..width {
        equal &= m.top_float(a / 4 + i)? == m.top_float(b / 4 + i)?;
    }
    m.push(Word::float(truth(equal)))
}

/// Combines the vector at `stack[sp+4]` with the four scalars above it.
fn vec4_binary(m: &mut Machine, f: impl Fn(f32, f32) -> f32) -> Result<(), Error> {
    let da = m.top(4)?.as_addr();
    for i in 0..4 {
        let v = f(m.load_float(da + i * 4)?, m.top_float(i)?);
        m.store_float(da + i * 4, v)?;
    }
    m.free(4)
}

fn store4(m: &mut Machine, addr: u32, texel: [f32; 4]) -> Result<(), Error> {
    for (i, v) in (0u32..).zip(texel) {
        m.store_float(addr + i * 4, v)?;
    }
    Ok(())
}
