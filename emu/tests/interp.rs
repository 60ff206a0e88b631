use arch::{Instruction, InstructionStream, Opcode};
use emu::hooks::{trace::Trace, Hook};
use emu::{Backend, Error, Interpreter, Machine, Monitor, Sampler, Word};

use Opcode::*;

fn lit(op: Opcode, v: f64) -> Instruction {
    Instruction::literal(op, v)
}

fn lab(op: Opcode, p0: u32) -> Instruction {
    Instruction::label(op, p0)
}

fn lab2(op: Opcode, p0: u32, p1: u32) -> Instruction {
    Instruction::label2(op, p0, p1)
}

fn op(op: Opcode) -> Instruction {
    Instruction::new(op)
}

fn run(code: Vec<Instruction>) -> Machine {
    let code = InstructionStream::from(code);
    let mut m = Machine::default();
    Interpreter::new().run(&code, &mut m).unwrap();
    m
}

#[test]
fn float_arithmetic() {
    let m = run(vec![
        lit(FloatPush, 2.0),
        lit(FloatPush, 3.0),
        op(FloatAdd),
        lit(FloatPush, 4.0),
        op(FloatMultiply),
        lit(FloatPush, 8.0),
        op(FloatDivide),
        op(Exit),
    ]);
    assert_eq!(m.depth(), 1);
    assert_eq!(m.top_float(0).unwrap(), 2.5);
}

#[test]
fn less_and_equal_pop_one() {
    let m = run(vec![
        lit(FloatPush, 1.0),
        lit(FloatPush, 2.0),
        op(FloatLess),
        lit(FloatPush, 2.0),
        lit(FloatPush, 1.0),
        op(FloatLess),
        op(Exit),
    ]);
    assert_eq!(m.depth(), 2);
    assert_eq!(m.top_float(0).unwrap(), 0.0);
    assert_eq!(m.top_float(1).unwrap(), 1.0);
}

#[test]
fn equal_int_pushes_without_popping() {
    let m = run(vec![
        lit(FloatPush, 7.0),
        lit(FloatPush, 7.0),
        lab2(FloatEqualInt, 4, 0),
        op(Exit),
    ]);
    assert_eq!(m.depth(), 3);
    assert_eq!(m.top_float(0).unwrap(), 1.0);
}

#[test]
fn copy_stores_through_address_below_value() {
    let m = run(vec![
        lab(GlobalAddr, 8),
        lit(FloatPush, 4.5),
        lab2(FloatCopy, 4, 4),
        op(Exit),
    ]);
    assert_eq!(m.load_float(12).unwrap(), 4.5);
    assert_eq!(m.depth(), 1);
    assert_eq!(m.top(0).unwrap().as_addr(), 8);
}

#[test]
fn move_relocates_by_offset_on_top() {
    // [4: index bytes, 1.0, 2.0, 3.0] -> the word at index 1 lands in slot 3
    let m = run(vec![
        lit(FloatPush, 3.0),
        lit(FloatPush, 2.0),
        lit(FloatPush, 1.0),
        lab(AddrPush, 4),
        lab2(FloatMove, 12, 4),
        op(Exit),
    ]);
    assert_eq!(m.top_float(3).unwrap(), 2.0);
}

#[test]
fn frame_enter_and_local_addr() {
    let mut m = Machine::default();
    let code = InstructionStream::from(vec![
        lab(LocalAlloc, 8),
        lab(Enter, 8),
        lab2(LocalAddr, 0, 4),
        lab2(LocalAddr, 4, 4),
        op(Exit),
    ]);
    Interpreter::new().run(&code, &mut m).unwrap();
    let size = m.stack_size();
    // saved bp sits right below the two allocated words
    assert_eq!(m.bp, size - 1);
    let base = m.stack_base();
    assert_eq!(m.top(1).unwrap().as_addr(), base + (size - 1) * 4);
    assert_eq!(m.top(0).unwrap().as_addr(), base + (size - 2) * 4);
}

#[test]
fn call_and_return() {
    // float f() { return 9.0; } with its 4 byte return slot reserved by the caller
    let m = run(vec![
        lab(LocalAlloc, 4),
        lab(Call, 3),
        op(Exit),
        lab(LocalAlloc, 20),
        lab(Enter, 28),
        lab2(LocalAddr, 0, 4),
        lit(FloatPush, 9.0),
        lab2(FloatCopy, 4, 0),
        lab(LocalFree, 4),
        op(Leave),
        lab(LocalFree, 20),
        op(Return),
    ]);
    assert_eq!(m.depth(), 1);
    assert_eq!(m.top_float(0).unwrap(), 9.0);
    assert_eq!(m.bp, 0);
}

#[test]
fn return_address_is_next_instruction() {
    let m = run(vec![lab(Call, 2), op(Exit), lab(LocalFree, 0), op(Return)]);
    assert_eq!(m.depth(), 0);
    assert_eq!(m.ip, 2);
}

#[test]
fn jump_if_zero_pops() {
    let m = run(vec![
        lit(FloatPush, 0.0),
        lab(JumpIfZero, 3),
        lit(FloatPush, 1.0),
        lit(FloatPush, 2.0),
        op(Exit),
    ]);
    assert_eq!(m.depth(), 1);
    assert_eq!(m.top_float(0).unwrap(), 2.0);
}

#[test]
fn vec4_copy_and_deref() {
    let m = run(vec![
        lab(GlobalAddr, 16),
        lit(FloatPush, 4.0),
        lit(FloatPush, 3.0),
        lit(FloatPush, 2.0),
        lit(FloatPush, 1.0),
        lab2(Vec4Copy, 16, 0),
        lab(LocalFree, 4),
        lab(GlobalAddr, 16),
        op(Vec4Deref),
        op(Exit),
    ]);
    for i in 0..4 {
        assert_eq!(m.load_float(16 + i * 4).unwrap(), (i + 1) as f32);
        assert_eq!(m.top_float(i).unwrap(), (i + 1) as f32);
    }
    assert_eq!(m.depth(), 4);
}

#[test]
fn float_to_vec4_fills_all_lanes() {
    let m = run(vec![
        lab(GlobalAddr, 32),
        lit(FloatPush, 2.5),
        lab2(FloatToVec4, 4, 0),
        lab(LocalFree, 4),
        op(Exit),
    ]);
    for i in 0..4 {
        assert_eq!(m.load_float(32 + i * 4).unwrap(), 2.5);
    }
    assert_eq!(m.depth(), 0);
}

#[test]
fn int_to_addr_truncates() {
    let m = run(vec![lit(IntPush, 3.0), op(IntToAddr), lab(AddrPush, 4), op(AddrMultiply), op(Exit)]);
    assert_eq!(m.top(0).unwrap().as_addr(), 12);
}

#[test]
fn print_appends_to_infolog() {
    let m = run(vec![lit(FloatPush, 1.5), op(FloatPrint), lit(BoolPush, 1.0), op(BoolPrint), op(Exit)]);
    assert_eq!(m.infolog.text(), "1.5\ntrue\n");
    assert_eq!(m.depth(), 2);
}

#[test]
fn discard_does_not_stop() {
    let m = run(vec![op(Discard), lit(FloatPush, 1.0), op(Exit)]);
    assert!(m.kill);
    assert_eq!(m.depth(), 1);
}

#[test]
fn none_is_fatal() {
    let code = InstructionStream::from(vec![op(None)]);
    let mut m = Machine::default();
    let err = Interpreter::new().run(&code, &mut m).unwrap_err();
    assert!(matches!(err, Error::InvalidOpcode(0)));
}

#[test]
fn step_limit() {
    let code = InstructionStream::from(vec![lab(Jump, 0)]);
    let mut m = Machine::default();
    let err = Interpreter::new()
        .with_max_steps(Some(100))
        .run(&code, &mut m)
        .unwrap_err();
    assert!(matches!(err, Error::StepLimit(100)));
}

struct Red;

impl Sampler for Red {
    fn texture2d(&mut self, _bias: f32, s: f32, t: f32, unit: u32) -> [f32; 4] {
        [1.0, s, t, unit as f32]
    }
}

#[test]
fn texture_callout() {
    let code = InstructionStream::from(vec![
        lab(GlobalAddr, 0),
        lit(IntPush, 2.0),
        lit(FloatPush, 0.75),
        lit(FloatPush, 0.25),
        lit(FloatPush, 0.0),
        op(Vec4Tex2d),
        op(Exit),
    ]);
    let mut m = Machine::default();
    Interpreter::new()
        .with_sampler(Box::new(Red))
        .run(&code, &mut m)
        .unwrap();
    let texel: Vec<f32> = (0..4).map(|i| m.load_float(i * 4).unwrap()).collect();
    assert_eq!(texel, vec![1.0, 0.25, 0.75, 2.0]);
    assert_eq!(m.depth(), 1);
}

fn counting_loop() -> InstructionStream {
    InstructionStream::from(vec![
        lab(GlobalAddr, 0),
        lab(GlobalAddr, 0),
        op(FloatDeref),
        lit(FloatPush, 1.0),
        op(FloatAdd),
        lab2(FloatCopy, 4, 0),
        lab(LocalFree, 4),
        lab(GlobalAddr, 0),
        op(FloatDeref),
        lit(FloatPush, 5.0),
        op(FloatLess),
        lab(JumpIfZero, 13),
        lab(Jump, 0),
        op(Exit),
    ])
}

#[test]
fn monitor_matches_interpreter() {
    let code = counting_loop();

    let mut a = Machine::default();
    Interpreter::new().run(&code, &mut a).unwrap();

    let mut b = Machine::default();
    let hooks: Vec<Box<dyn Hook>> = vec![Box::new(Trace::quiet())];
    Monitor::new(Interpreter::new(), hooks).run(&code, &mut b).unwrap();

    assert_eq!(a.load_float(0).unwrap(), 5.0);
    assert_eq!(a.globals(), b.globals());
    assert_eq!((a.ip, a.sp, a.bp, a.kill), (b.ip, b.sp, b.bp, b.kill));
}

#[test]
fn word_layout_matches_memory() {
    let mut m = Machine::default();
    m.store(0, Word::float(2.0)).unwrap();
    assert_eq!(m.globals()[0].as_float(), 2.0);
}
