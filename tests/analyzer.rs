//! Analyzer behavior exercised end-to-end through bytecode execution, beyond
//! the stream-shape unit tests already embedded in `src/analyzer`.

use evmcore::util::EvmTester;
use evmcore::OpCode;

#[test]
fn jump_to_a_real_jumpdest_succeeds() {
    // JUMPDEST at pc 3: PUSH1 3, JUMP, JUMPDEST, STOP
    let code = vec![
        OpCode::PUSH1.to_u8(),
        3,
        OpCode::JUMP.to_u8(),
        OpCode::JUMPDEST.to_u8(),
        OpCode::STOP.to_u8(),
    ];
    EvmTester::new()
        .code(code)
        .gas(1_000_000)
        .success(true)
        .check();
}

#[test]
fn jumpi_with_zero_condition_falls_through_instead_of_jumping() {
    // PUSH1 0 (condition), PUSH1 10 (an otherwise-unreachable target since
    // the condition is false), JUMPI, then RETURN 1.
    let code = vec![
        OpCode::PUSH1.to_u8(),
        0,
        OpCode::PUSH1.to_u8(),
        10,
        OpCode::JUMPI.to_u8(),
        OpCode::PUSH1.to_u8(),
        1,
        OpCode::PUSH1.to_u8(),
        0,
        OpCode::MSTORE.to_u8(),
        OpCode::PUSH1.to_u8(),
        32,
        OpCode::PUSH1.to_u8(),
        0,
        OpCode::RETURN.to_u8(),
        OpCode::JUMPDEST.to_u8(),
        OpCode::STOP.to_u8(),
    ];
    EvmTester::new()
        .code(code)
        .gas(1_000_000)
        .success(true)
        .output_value(1u64)
        .check();
}

#[test]
fn undefined_opcode_halts_with_failure() {
    let code = vec![0x0c]; // unassigned opcode
    EvmTester::new().code(code).gas(1_000_000).success(false).check();
}

#[test]
fn pc_opcode_reports_its_own_program_counter() {
    // PC at offset 0, then MSTORE/RETURN to surface it.
    let code = vec![
        OpCode::PC.to_u8(),
        OpCode::PUSH1.to_u8(),
        0,
        OpCode::MSTORE.to_u8(),
        OpCode::PUSH1.to_u8(),
        32,
        OpCode::PUSH1.to_u8(),
        0,
        OpCode::RETURN.to_u8(),
    ];
    EvmTester::new()
        .code(code)
        .success(true)
        .output_value(0u64)
        .check();
}

#[test]
fn a_jumpdest_byte_embedded_in_push_data_is_not_a_valid_jump_target() {
    // PUSH1 0x5B pushes the JUMPDEST byte as data, not an instruction; a JUMP
    // to pc 1 (inside the immediate) must fail.
    let code = vec![
        OpCode::PUSH1.to_u8(),
        OpCode::JUMPDEST.to_u8(),
        OpCode::PUSH1.to_u8(),
        1,
        OpCode::JUMP.to_u8(),
    ];
    EvmTester::new()
        .code(code)
        .gas(1_000_000)
        .success(false)
        .check();
}

#[test]
fn back_to_back_jumpdests_each_start_their_own_block() {
    // JUMPDEST, JUMPDEST, STOP: two back-to-back blocks, both empty.
    let code = vec![
        OpCode::JUMPDEST.to_u8(),
        OpCode::JUMPDEST.to_u8(),
        OpCode::STOP.to_u8(),
    ];
    EvmTester::new()
        .code(code)
        .gas(1_000_000)
        .success(true)
        .check();
}

#[test]
fn push32_with_a_literal_above_u64_max_round_trips_through_the_side_table() {
    let mut code = vec![OpCode::PUSH32.to_u8()];
    code.extend_from_slice(&[0xff; 32]); // U256::MAX
    code.push(OpCode::PUSH1.to_u8());
    code.push(0);
    code.push(OpCode::MSTORE.to_u8());
    code.push(OpCode::PUSH1.to_u8());
    code.push(32);
    code.push(OpCode::PUSH1.to_u8());
    code.push(0);
    code.push(OpCode::RETURN.to_u8());

    let result = EvmTester::new()
        .code(code)
        .success(true)
        .check_and_get_result();
    assert_eq!(&result.output[..], &[0xffu8; 32][..]);
}
