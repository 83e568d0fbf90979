//! Instruction execution pipeline for the machine core.
//!
//! A single step fetches the big-endian word at the program counter,
//! decodes it, and runs the matching handler. Every handler advances the
//! program counter itself — by 2, by 4 for a taken conditional skip, or
//! to an absolute target — except the blocking key wait, which leaves the
//! counter untouched and suspends the machine until [`key_pressed`]
//! resolves it.

#![allow(
    clippy::pedantic,
    clippy::nursery,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

mod helpers;
pub use helpers::decimal_digits;

use crate::api::{
    CoreConfig, DisplayDevice, Key, KeypressOutcome, Peripherals, RandomSource, StepOutcome,
    TraceEvent,
};
use crate::decoder::{Decoder, Instruction};
use crate::fault::Fault;
use crate::memory::{FONT_GLYPH_BYTES, FONT_START};
use crate::state::{MachineState, Register, RunState};

/// Executes one fetch/decode/execute cycle.
///
/// While the machine is suspended on the key wait this returns
/// [`StepOutcome::AwaitingKey`] without fetching; the machine keeps
/// accepting key notifications but executes nothing further.
///
/// # Errors
///
/// Returns the [`Fault`] raised by fetch, decode, or the executing
/// handler. Faults are local-fatal: the step is abandoned and the host
/// decides whether to halt the machine or carry on.
pub fn step_one(
    state: &mut MachineState,
    peripherals: &mut Peripherals<'_>,
    config: &CoreConfig,
) -> Result<StepOutcome, Fault> {
    if state.run_state.is_halted() {
        return Ok(StepOutcome::AwaitingKey);
    }

    let pc = state.program_counter;
    let word = match state.fetch_word() {
        Ok(word) => word,
        Err(fault) => {
            emit_fault(peripherals, config, pc, fault);
            return Err(fault);
        }
    };

    emit(peripherals, config, TraceEvent::InstructionStart { pc, word });

    let instruction = match Decoder::decode(word) {
        Ok(instruction) => instruction,
        Err(fault) => {
            emit_fault(peripherals, config, pc, fault);
            return Err(fault);
        }
    };

    let outcome = match execute_instruction(instruction, state, peripherals) {
        Ok(outcome) => outcome,
        Err(fault) => {
            emit_fault(peripherals, config, pc, fault);
            return Err(fault);
        }
    };

    emit(
        peripherals,
        config,
        TraceEvent::InstructionRetired {
            pc: state.program_counter,
        },
    );

    Ok(outcome)
}

/// Executes one already-decoded instruction against the machine state.
///
/// # Errors
///
/// Returns the [`Fault`] raised by the handler (stack bounds, memory
/// bounds).
pub fn execute_instruction(
    instruction: Instruction,
    state: &mut MachineState,
    peripherals: &mut Peripherals<'_>,
) -> Result<StepOutcome, Fault> {
    match instruction {
        Instruction::ClearDisplay => {
            execute_clear_display(state, peripherals.display.as_deref_mut());
        }
        Instruction::ReturnFromSubroutine => execute_return(state)?,
        Instruction::Jump { addr } => state.program_counter = addr,
        Instruction::CallSubroutine { addr } => execute_call(state, addr)?,
        Instruction::SkipIfEqualImm { x, value } => {
            let taken = state.gpr(x) == i32::from(value);
            execute_skip(state, taken);
        }
        Instruction::SkipIfNotEqualImm { x, value } => {
            let taken = state.gpr(x) != i32::from(value);
            execute_skip(state, taken);
        }
        Instruction::SkipIfRegistersEqual { x, y } => {
            let taken = state.gpr(x) == state.gpr(y);
            execute_skip(state, taken);
        }
        Instruction::SetImm { x, value } => {
            state.set_gpr(x, i32::from(value));
            advance(state, 2);
        }
        Instruction::AddImm { x, value } => {
            state.set_gpr(x, state.gpr(x).wrapping_add(i32::from(value)));
            advance(state, 2);
        }
        Instruction::Copy { x, y } => execute_alu(state, x, y, AluOp::Copy),
        Instruction::Or { x, y } => execute_alu(state, x, y, AluOp::Or),
        Instruction::And { x, y } => execute_alu(state, x, y, AluOp::And),
        Instruction::Xor { x, y } => execute_alu(state, x, y, AluOp::Xor),
        Instruction::AddWithCarry { x, y } => execute_alu(state, x, y, AluOp::AddWithCarry),
        Instruction::SubWithBorrow { x, y } => execute_alu(state, x, y, AluOp::SubWithBorrow),
        Instruction::ShiftRight { x } => execute_alu(state, x, x, AluOp::ShiftRight),
        Instruction::SubFromVyWithBorrow { x, y } => execute_alu(state, x, y, AluOp::SubFromVy),
        Instruction::ShiftLeft { x } => execute_alu(state, x, x, AluOp::ShiftLeft),
        Instruction::SkipIfRegistersNotEqual { x, y } => {
            let taken = state.gpr(x) != state.gpr(y);
            execute_skip(state, taken);
        }
        Instruction::SetIndex { addr } => {
            state.index_register = addr;
            advance(state, 2);
        }
        Instruction::JumpWithOffset { addr } => {
            let target = (i32::from(addr) + state.gpr(Register::V0)) & 0x0FFF;
            state.program_counter = target as u16;
        }
        Instruction::RandomMasked { x, mask } => {
            execute_random(state, peripherals.random, x, mask);
        }
        Instruction::Draw { x, y, height } => {
            execute_draw(state, peripherals.display.as_deref_mut(), x, y, height)?;
        }
        Instruction::SkipIfKeyPressed { x } => {
            let taken = is_key_down(state, x);
            execute_skip(state, taken);
        }
        Instruction::SkipIfKeyNotPressed { x } => {
            let taken = !is_key_down(state, x);
            execute_skip(state, taken);
        }
        Instruction::ReadDelayTimer { x } => {
            state.set_gpr(x, i32::from(state.delay_timer));
            advance(state, 2);
        }
        Instruction::WaitForKey { x } => {
            // the sole handler that does not advance the counter
            state.run_state = RunState::AwaitingKey(x);
            return Ok(StepOutcome::AwaitingKey);
        }
        Instruction::SetDelayTimer { x } => {
            state.delay_timer = (state.gpr(x) & 0xFF) as u8;
            advance(state, 2);
        }
        Instruction::SetSoundTimer { x } => {
            state.sound_timer = (state.gpr(x) & 0xFF) as u8;
            advance(state, 2);
        }
        Instruction::AddToIndex { x } => {
            let offset = (state.gpr(x) & 0xFFFF) as u16;
            state.index_register = state.index_register.wrapping_add(offset);
            advance(state, 2);
        }
        Instruction::LoadDigitSprite { x } => {
            let glyph = state.gpr(x).wrapping_mul(i32::from(FONT_GLYPH_BYTES));
            state.index_register = FONT_START.wrapping_add((glyph & 0x0FFF) as u16);
            advance(state, 2);
        }
        Instruction::StoreDigits { x } => execute_store_digits(state, x)?,
        Instruction::StoreRegisters { last } => execute_store_registers(state, last)?,
        Instruction::LoadRegisters { last } => execute_load_registers(state, last)?,
    }

    Ok(StepOutcome::Retired)
}

/// Delivers a host key event: records the key as the most recent one and,
/// when a key wait is pending, stores the code into the wait's target
/// register, resumes execution, and advances the program counter by 2.
///
/// Only the resuming key event performs that advance; a key arriving while
/// the machine runs normally changes nothing but the recorded key.
pub fn key_pressed(state: &mut MachineState, key: Key) -> KeypressOutcome {
    state.current_key = Some(key);

    if let RunState::AwaitingKey(target) = state.run_state {
        state.set_gpr(target, i32::from(key.code()));
        state.run_state = RunState::Running;
        advance(state, 2);
        KeypressOutcome::Resumed { target }
    } else {
        KeypressOutcome::Recorded
    }
}

#[derive(Debug, Clone, Copy)]
enum AluOp {
    Copy,
    Or,
    And,
    Xor,
    AddWithCarry,
    SubWithBorrow,
    SubFromVy,
    ShiftRight,
    ShiftLeft,
}

// Flag-producing ops write the flag register before the result: when X
// (or Y) is the flag register itself the result computation observes the
// freshly written flag.
fn execute_alu(state: &mut MachineState, x: Register, y: Register, op: AluOp) {
    let vx = state.gpr(x);
    let vy = state.gpr(y);

    match op {
        AluOp::Copy => state.set_gpr(x, vy),
        AluOp::Or => state.set_gpr(x, vx | vy),
        AluOp::And => state.set_gpr(x, vx & vy),
        AluOp::Xor => state.set_gpr(x, vx ^ vy),
        AluOp::AddWithCarry => {
            state.set_flag_register(vy > 0xFF_i32.saturating_sub(vx));
            state.set_gpr(x, state.gpr(x).wrapping_add(state.gpr(y)));
        }
        AluOp::SubWithBorrow => {
            state.set_flag_register(vx < vy);
            state.set_gpr(x, state.gpr(x).wrapping_sub(state.gpr(y)));
        }
        AluOp::SubFromVy => {
            state.set_flag_register(vx >= vy);
            state.set_gpr(x, state.gpr(y).wrapping_sub(state.gpr(x)));
        }
        AluOp::ShiftRight => {
            state.set_flag_register(vx & 1 == 1);
            state.set_gpr(x, state.gpr(x) >> 1);
        }
        AluOp::ShiftLeft => {
            state.set_flag_register(vx & 0x80 != 0);
            state.set_gpr(x, state.gpr(x).wrapping_shl(1));
        }
    }

    advance(state, 2);
}

fn execute_clear_display(state: &mut MachineState, display: Option<&mut (dyn DisplayDevice + '_)>) {
    if let Some(target) = display {
        target.clear();
    } else {
        state.framebuffer.clear();
    }
    advance(state, 2);
}

fn execute_return(state: &mut MachineState) -> Result<(), Fault> {
    state.program_counter = state.pop_return_address()?;
    Ok(())
}

fn execute_call(state: &mut MachineState, addr: u16) -> Result<(), Fault> {
    state.push_return_address(state.program_counter)?;
    state.program_counter = addr;
    Ok(())
}

fn execute_skip(state: &mut MachineState, taken: bool) {
    advance(state, if taken { 4 } else { 2 });
}

fn execute_random(state: &mut MachineState, random: &mut dyn RandomSource, x: Register, mask: u8) {
    let byte = random.next_byte() & mask;
    state.set_gpr(x, i32::from(byte));
    advance(state, 2);
}

fn execute_draw(
    state: &mut MachineState,
    display: Option<&mut (dyn DisplayDevice + '_)>,
    x: Register,
    y: Register,
    height: u8,
) -> Result<(), Fault> {
    let origin_x = (state.gpr(x) & 0xFF) as u8;
    let origin_y = (state.gpr(y) & 0xFF) as u8;

    let collided = helpers::blit_sprite(state, display, origin_x, origin_y, height)?;
    state.set_flag_register(collided);
    advance(state, 2);
    Ok(())
}

fn execute_store_digits(state: &mut MachineState, x: Register) -> Result<(), Fault> {
    let digits = decimal_digits(state.gpr(x));
    for (offset, digit) in digits.into_iter().enumerate() {
        let addr = state.index_register.wrapping_add(offset as u16);
        state.memory.write_byte(addr, digit)?;
    }
    advance(state, 2);
    Ok(())
}

fn execute_store_registers(state: &mut MachineState, last: Register) -> Result<(), Fault> {
    for (offset, reg) in Register::ALL[..=last.index()].iter().enumerate() {
        let addr = state.index_register.wrapping_add(offset as u16);
        state.memory.write_byte(addr, (state.gpr(*reg) & 0xFF) as u8)?;
    }
    advance(state, 2);
    Ok(())
}

fn execute_load_registers(state: &mut MachineState, last: Register) -> Result<(), Fault> {
    for (offset, reg) in Register::ALL[..=last.index()].iter().enumerate() {
        let addr = state.index_register.wrapping_add(offset as u16);
        let byte = state.memory.read_byte(addr)?;
        state.set_gpr(*reg, i32::from(byte));
    }
    advance(state, 2);
    Ok(())
}

fn is_key_down(state: &MachineState, x: Register) -> bool {
    state
        .current_key
        .is_some_and(|key| i32::from(key.code()) == state.gpr(x))
}

fn advance(state: &mut MachineState, bytes: u16) {
    state.program_counter = state.program_counter.wrapping_add(bytes);
}

fn emit(peripherals: &mut Peripherals<'_>, config: &CoreConfig, event: TraceEvent) {
    if config.tracing_enabled {
        if let Some(sink) = peripherals.trace.as_deref_mut() {
            sink.on_event(event);
        }
    }
}

fn emit_fault(peripherals: &mut Peripherals<'_>, config: &CoreConfig, pc: u16, fault: Fault) {
    emit(
        peripherals,
        config,
        TraceEvent::FaultRaised {
            pc,
            class: fault.class(),
        },
    );
}
