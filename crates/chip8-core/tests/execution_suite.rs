//! Per-opcode execution semantics, pinned against the documented vectors —
//! including the carry/borrow asymmetries and the unclamped arithmetic the
//! instruction set relies on.

#![allow(clippy::pedantic, clippy::nursery)]

use chip8_core::{
    execute_instruction, step_one, CoreConfig, Fault, Instruction, MachineState, Peripherals,
    RandomSource, Register, StepOutcome,
};
use proptest as _;
use rand as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

struct FixedRandom(u8);

impl RandomSource for FixedRandom {
    fn next_byte(&mut self) -> u8 {
        self.0
    }
}

fn run(state: &mut MachineState, instruction: Instruction) -> StepOutcome {
    let mut random = FixedRandom(0);
    let mut peripherals = Peripherals::with_random(&mut random);
    execute_instruction(instruction, state, &mut peripherals).expect("handler succeeds")
}

fn load_word(state: &mut MachineState, addr: u16, word: u16) {
    let [hi, lo] = word.to_be_bytes();
    state.memory.write_byte(addr, hi).expect("in range");
    state
        .memory
        .write_byte(addr.wrapping_add(1), lo)
        .expect("in range");
}

#[rstest]
#[case(6, 6, 12, 0)]
#[case(256, 6, 262, 1)]
#[case(250, 5, 255, 0)]
#[case(250, 6, 256, 1)]
fn add_with_carry_flags_overflow_before_adding(
    #[case] vx: i32,
    #[case] vy: i32,
    #[case] result: i32,
    #[case] flag: i32,
) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V2, vx);
    state.set_gpr(Register::V3, vy);

    run(
        &mut state,
        Instruction::AddWithCarry {
            x: Register::V2,
            y: Register::V3,
        },
    );

    assert_eq!(state.gpr(Register::V2), result);
    assert_eq!(state.gpr(Register::VF), flag);
    assert_eq!(state.program_counter, 0x202);
}

#[rstest]
#[case(1, 6, -5, 1)]
#[case(6, 1, 5, 0)]
#[case(6, 6, 0, 0)]
fn sub_with_borrow_stores_the_raw_difference(
    #[case] vx: i32,
    #[case] vy: i32,
    #[case] result: i32,
    #[case] flag: i32,
) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);
    state.set_gpr(Register::V1, vy);

    run(
        &mut state,
        Instruction::SubWithBorrow {
            x: Register::V0,
            y: Register::V1,
        },
    );

    assert_eq!(state.gpr(Register::V0), result);
    assert_eq!(state.gpr(Register::VF), flag);
}

#[rstest]
#[case(7, 2, -5, 1)]
#[case(2, 7, 5, 0)]
fn sub_from_vy_inverts_the_flag_polarity(
    #[case] vx: i32,
    #[case] vy: i32,
    #[case] result: i32,
    #[case] flag: i32,
) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);
    state.set_gpr(Register::V1, vy);

    run(
        &mut state,
        Instruction::SubFromVyWithBorrow {
            x: Register::V0,
            y: Register::V1,
        },
    );

    assert_eq!(state.gpr(Register::V0), result);
    assert_eq!(state.gpr(Register::VF), flag);
}

#[rstest]
#[case(25, 12, 1)]
#[case(24, 12, 0)]
fn shift_right_latches_the_low_bit(#[case] vx: i32, #[case] result: i32, #[case] flag: i32) {
    let mut state = MachineState::default();
    state.set_gpr(Register::VA, vx);

    run(&mut state, Instruction::ShiftRight { x: Register::VA });

    assert_eq!(state.gpr(Register::VA), result);
    assert_eq!(state.gpr(Register::VF), flag);
}

#[rstest]
#[case(0x81, 0x102, 1)]
#[case(0x01, 0x02, 0)]
fn shift_left_latches_bit_seven(#[case] vx: i32, #[case] result: i32, #[case] flag: i32) {
    let mut state = MachineState::default();
    state.set_gpr(Register::VA, vx);

    run(&mut state, Instruction::ShiftLeft { x: Register::VA });

    assert_eq!(state.gpr(Register::VA), result);
    assert_eq!(state.gpr(Register::VF), flag);
}

#[test]
fn bitwise_and_copy_forms_write_without_flag_side_effects() {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, 0x3);
    state.set_gpr(Register::V1, 0x7);
    state.set_gpr(Register::VF, 9);

    run(
        &mut state,
        Instruction::Or {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(state.gpr(Register::V0), 0x7);

    run(
        &mut state,
        Instruction::Xor {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(state.gpr(Register::V0), 0x0);

    run(
        &mut state,
        Instruction::Copy {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(state.gpr(Register::V0), 0x7);

    run(
        &mut state,
        Instruction::And {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(state.gpr(Register::V0), 0x7);

    // none of the above touched the flag register
    assert_eq!(state.gpr(Register::VF), 9);
}

#[rstest]
#[case(3, 3, true)]
#[case(2, 3, false)]
fn skip_if_equal_imm(#[case] vx: i32, #[case] value: u8, #[case] skips: bool) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);

    run(
        &mut state,
        Instruction::SkipIfEqualImm {
            x: Register::V0,
            value,
        },
    );

    assert_eq!(state.program_counter, if skips { 0x204 } else { 0x202 });
}

#[rstest]
#[case(3, 3, false)]
#[case(2, 3, true)]
fn skip_if_not_equal_imm(#[case] vx: i32, #[case] value: u8, #[case] skips: bool) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);

    run(
        &mut state,
        Instruction::SkipIfNotEqualImm {
            x: Register::V0,
            value,
        },
    );

    assert_eq!(state.program_counter, if skips { 0x204 } else { 0x202 });
}

#[rstest]
#[case(3, 3, true, false)]
#[case(2, 3, false, true)]
fn register_comparison_skips(
    #[case] vx: i32,
    #[case] vy: i32,
    #[case] equal_skips: bool,
    #[case] not_equal_skips: bool,
) {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);
    state.set_gpr(Register::V1, vy);
    run(
        &mut state,
        Instruction::SkipIfRegistersEqual {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(
        state.program_counter,
        if equal_skips { 0x204 } else { 0x202 }
    );

    let mut state = MachineState::default();
    state.set_gpr(Register::V0, vx);
    state.set_gpr(Register::V1, vy);
    run(
        &mut state,
        Instruction::SkipIfRegistersNotEqual {
            x: Register::V0,
            y: Register::V1,
        },
    );
    assert_eq!(
        state.program_counter,
        if not_equal_skips { 0x204 } else { 0x202 }
    );
}

#[test]
fn immediate_loads_and_adds_have_no_flag_side_effect() {
    let mut state = MachineState::default();
    state.set_gpr(Register::V0, 3);

    run(
        &mut state,
        Instruction::SetImm {
            x: Register::V0,
            value: 6,
        },
    );
    assert_eq!(state.gpr(Register::V0), 6);

    run(
        &mut state,
        Instruction::AddImm {
            x: Register::V0,
            value: 6,
        },
    );
    assert_eq!(state.gpr(Register::V0), 12);
    assert_eq!(state.gpr(Register::VF), 0);
    assert_eq!(state.program_counter, 0x204);
}

#[test]
fn index_register_forms() {
    let mut state = MachineState::default();

    run(&mut state, Instruction::SetIndex { addr: 0x2F0 });
    assert_eq!(state.index_register, 0x2F0);

    state.set_gpr(Register::V0, 2);
    state.index_register = 1;
    run(&mut state, Instruction::AddToIndex { x: Register::V0 });
    assert_eq!(state.index_register, 3);
    assert_eq!(state.program_counter, 0x204);
}

#[test]
fn jump_forms_set_the_counter_absolutely() {
    let mut state = MachineState::default();
    run(&mut state, Instruction::Jump { addr: 0x00A });
    assert_eq!(state.program_counter, 0x00A);

    let mut state = MachineState::default();
    state.program_counter = 6;
    state.set_gpr(Register::V0, 0x2);
    run(&mut state, Instruction::JumpWithOffset { addr: 0x002 });
    assert_eq!(state.program_counter, 4);
}

#[test]
fn call_then_return_round_trips_the_saved_counter() {
    let mut state = MachineState::default();
    state.program_counter = 0x4;

    run(&mut state, Instruction::CallSubroutine { addr: 0x0F0 });
    assert_eq!(state.program_counter, 0x0F0);
    assert_eq!(state.stack_pointer, 1);
    assert_eq!(state.stack[0], 0x4);

    run(&mut state, Instruction::ReturnFromSubroutine);
    assert_eq!(state.program_counter, 0x4);
    assert_eq!(state.stack_pointer, 0);
}

#[test]
fn timer_transfer_forms() {
    let mut state = MachineState::default();
    state.delay_timer = 0x2;
    run(&mut state, Instruction::ReadDelayTimer { x: Register::V0 });
    assert_eq!(state.gpr(Register::V0), 0x2);

    let mut state = MachineState::default();
    state.set_gpr(Register::V0, 2);
    run(&mut state, Instruction::SetDelayTimer { x: Register::V0 });
    assert_eq!(state.delay_timer, 2);

    run(&mut state, Instruction::SetSoundTimer { x: Register::V0 });
    assert_eq!(state.sound_timer, 2);
}

#[rstest]
#[case(0x0A, 0x032)]
#[case(0x10, 0x050)]
fn digit_sprite_lookup_strides_five_bytes_per_glyph(#[case] vx: i32, #[case] index: u16) {
    let mut state = MachineState::default();
    state.set_gpr(Register::VA, vx);

    run(&mut state, Instruction::LoadDigitSprite { x: Register::VA });

    assert_eq!(state.index_register, index);
    assert_eq!(state.program_counter, 0x202);
}

#[test]
fn decimal_store_writes_three_digits_at_the_index() {
    let mut state = MachineState::default();
    state.index_register = 0x300;
    state.set_gpr(Register::V3, 256);

    run(&mut state, Instruction::StoreDigits { x: Register::V3 });

    assert_eq!(state.memory.read_byte(0x300), Ok(2));
    assert_eq!(state.memory.read_byte(0x301), Ok(5));
    assert_eq!(state.memory.read_byte(0x302), Ok(6));
    assert_eq!(state.program_counter, 0x202);
}

#[test]
fn oversized_register_values_are_masked_at_the_memory_boundary() {
    let mut state = MachineState::default();
    state.index_register = 0x300;
    state.set_gpr(Register::V0, 262);
    state.set_gpr(Register::V1, -5);

    run(
        &mut state,
        Instruction::StoreRegisters {
            last: Register::V1,
        },
    );

    assert_eq!(state.memory.read_byte(0x300), Ok((262i32 & 0xFF) as u8));
    assert_eq!(state.memory.read_byte(0x301), Ok((-5i32 & 0xFF) as u8));
}

#[test]
fn random_store_masks_against_the_immediate() {
    let mut state = MachineState::default();
    let mut random = FixedRandom(0xAA);
    let mut peripherals = Peripherals::with_random(&mut random);

    execute_instruction(
        Instruction::RandomMasked {
            x: Register::V0,
            mask: 0xA4,
        },
        &mut state,
        &mut peripherals,
    )
    .expect("handler succeeds");

    assert_eq!(state.gpr(Register::V0), 0xA0);
}

#[test]
fn return_with_an_empty_stack_is_a_stack_underflow() {
    let mut state = MachineState::default();
    let mut random = FixedRandom(0);
    let mut peripherals = Peripherals::with_random(&mut random);

    let fault = execute_instruction(
        Instruction::ReturnFromSubroutine,
        &mut state,
        &mut peripherals,
    );

    assert_eq!(fault, Err(Fault::StackUnderflow));
}

#[test]
fn seventeenth_nested_call_is_a_stack_overflow() {
    let mut state = MachineState::default();
    // sixteen calls in a row, each jumping right back onto a call
    load_word(&mut state, 0x0200, 0x2200);

    let mut random = FixedRandom(0);
    let mut peripherals = Peripherals::with_random(&mut random);
    let config = CoreConfig::default();

    for _ in 0..16 {
        assert_eq!(
            step_one(&mut state, &mut peripherals, &config),
            Ok(StepOutcome::Retired)
        );
    }
    assert_eq!(
        step_one(&mut state, &mut peripherals, &config),
        Err(Fault::StackOverflow { depth: 16 })
    );
}
