//! EIP-3198 BASEFEE: undefined before London, reads `BlockContext::base_fee`
//! from London on.

use evmcore::util::EvmTester;
use evmcore::{Hardfork, OpCode};

#[test]
fn basefee_pre_london_is_undefined() {
    EvmTester::new()
        .hardfork(Hardfork::Berlin)
        .code(vec![OpCode::BASEFEE.to_u8()])
        .gas(1_000_000)
        .success(false)
        .check();
}

#[test]
fn basefee_nominal_case() {
    // https://eips.ethereum.org/EIPS/eip-3198#nominal-case
    EvmTester::new()
        .hardfork(Hardfork::London)
        .base_fee(7u64)
        .code(vec![OpCode::BASEFEE.to_u8(), OpCode::STOP.to_u8()])
        .gas_used(2)
        .success(true)
        .check();

    EvmTester::new()
        .hardfork(Hardfork::London)
        .base_fee(7u64)
        .code([
            OpCode::BASEFEE.to_u8(),
            OpCode::PUSH1.to_u8(),
            0,
            OpCode::MSTORE.to_u8(),
            OpCode::PUSH1.to_u8(),
            32,
            OpCode::PUSH1.to_u8(),
            0,
            OpCode::RETURN.to_u8(),
        ])
        .success(true)
        .output_value(7u64)
        .check();
}
