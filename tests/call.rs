//! CALL/CALLCODE/DELEGATECALL/STATICCALL and CREATE/CREATE2, covering
//! value-transfer gas add-ons, depth-limit short-circuiting, static-flag
//! propagation, and CALLCODE/DELEGATECALL context semantics.

use evmcore::util::{Bytecode, CallInstruction, EvmTester};
use evmcore::{Address, InMemoryState, OpCode};

const CALLEE: u64 = 0xc0_11ee;

fn callee_address() -> Address {
    Address::from_low_u64_be(CALLEE)
}

fn with_callee_code(code: impl Into<Bytecode>) -> impl FnOnce(&mut InMemoryState) {
    let built = code.into().build();
    move |state| {
        let hash = state.set_code(built.into());
        let mut account = state.get_account(callee_address()).unwrap_or_default();
        account.code_hash = hash;
        state.set_account(callee_address(), account);
    }
}

#[test]
fn call_to_nonexistent_account_with_zero_value_succeeds() {
    EvmTester::new()
        .code(Bytecode::from(CallInstruction::call(CALLEE).gas(1000)).ret_top())
        .success(true)
        .output_value(1u64)
        .check();
}

#[test]
fn call_runs_callee_code_and_relays_its_return_value() {
    let callee_code = Bytecode::new().pushv(0x2a).ret_top();

    EvmTester::new()
        .apply_state_fn(with_callee_code(callee_code))
        .code(
            Bytecode::from(CallInstruction::call(CALLEE).gas(50_000).output(0, 32))
                .pushv(0)
                .opcode(OpCode::MLOAD)
                .ret_top(),
        )
        .success(true)
        .output_value(0x2au64)
        .check();
}

#[test]
fn callcode_runs_callee_code_but_keeps_caller_storage() {
    // SSTORE under CALLCODE writes to the *caller's* storage, not the
    // callee's: a subsequent SLOAD by the caller observes it directly.
    let callee_code = Bytecode::new().sstore(1, 0x2a).opcode(OpCode::STOP);

    EvmTester::new()
        .apply_state_fn(with_callee_code(callee_code))
        .code(
            Bytecode::from(CallInstruction::callcode(CALLEE).gas(50_000))
                .sload(1)
                .ret_top(),
        )
        .success(true)
        .output_value(0x2au64)
        .check();
}

#[test]
fn delegatecall_forwards_static_flag_to_callee() {
    // LOG1 under an inherited static context hits WriteProtection: the call
    // fails and the caller observes a 0 on the stack, not a halt.
    let callee_code = Bytecode::new()
        .pushv(0)
        .pushv(0)
        .pushv(0)
        .opcode(OpCode::LOG1)
        .opcode(OpCode::STOP);

    EvmTester::new()
        .apply_state_fn(with_callee_code(callee_code))
        .set_static(true)
        .code(Bytecode::from(CallInstruction::delegatecall(CALLEE).gas(50_000)).ret_top())
        .success(true)
        .output_value(0u64)
        .check();
}

#[test]
fn staticcall_prevents_callee_sstore() {
    let callee_code = Bytecode::new().sstore(1, 0x2a).opcode(OpCode::STOP);

    EvmTester::new()
        .apply_state_fn(with_callee_code(callee_code))
        .code(Bytecode::from(CallInstruction::staticcall(CALLEE).gas(50_000)).ret_top())
        .success(true)
        .output_value(0u64)
        .check();
}

#[test]
fn call_depth_limit_short_circuits_without_reverting_caller() {
    // The outer call itself must still run (depth 1023 < MAX_CALL_DEPTH);
    // only the CALL opcode's own child at depth 1024 gets short-circuited.
    EvmTester::new()
        .depth(1023)
        .code(Bytecode::from(CallInstruction::call(CALLEE).gas(100)).ret_top())
        .success(true)
        .output_value(0u64)
        .check();
}

#[test]
fn call_with_value_exceeding_balance_short_circuits() {
    EvmTester::new()
        .code(Bytecode::from(CallInstruction::call(CALLEE).gas(100_000).value(1)).ret_top())
        .success(true)
        .output_value(0u64)
        .check();
}

#[test]
fn create_with_empty_init_code_returns_a_nonzero_address() {
    EvmTester::new()
        .code(
            Bytecode::new()
                .pushv(0) // size
                .pushv(0) // offset
                .pushv(0) // value
                .opcode(OpCode::CREATE)
                .ret_top(),
        )
        .success(true)
        .check();
}

#[test]
fn create2_with_empty_init_code_returns_a_nonzero_address() {
    EvmTester::new()
        .code(
            Bytecode::new()
                .pushv(0x42) // salt
                .pushv(0) // size
                .pushv(0) // offset
                .pushv(0) // value
                .opcode(OpCode::CREATE2)
                .ret_top(),
        )
        .success(true)
        .check();
}

#[test]
fn create_with_endowment_above_balance_short_circuits() {
    EvmTester::new()
        .code(
            Bytecode::new()
                .pushv(0) // size
                .pushv(0) // offset
                .pushv(1) // value, no balance funded
                .opcode(OpCode::CREATE)
                .ret_top(),
        )
        .success(true)
        .output_value(0u64)
        .check();
}
