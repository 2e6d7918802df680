//! End-to-end scenarios (a)-(f) exercised against the public API.

use ethereum_types::{Address, U256};
use evmcore::host::{create2_address, CallParams, Host};
use evmcore::journal::Journal;
use evmcore::state::{InMemoryState, StateStore};
use evmcore::util::EvmTester;
use evmcore::{Hardfork, HardforkConfig, OpcodeMetadataTable, SimpleHost};
use hex_literal::hex;

/// (a) PUSH1 5, PUSH1 3, ADD, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN.
#[test]
fn arithmetic_add_and_return() {
    EvmTester::new()
        .code(hex!("600560030160005260206000F3"))
        .success(true)
        .output_value(U256::from(8u64))
        .check();
}

/// (b) `60 05 56 5B 00`: target 5 is past the end of valid code.
#[test]
fn jump_past_end_of_code_is_invalid() {
    EvmTester::new()
        .code(hex!("6005565B00"))
        .gas(1_000_000)
        .success(false)
        .check();
}

/// (c) snapshot rollback of a storage write.
#[test]
fn snapshot_rollback_restores_storage() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let a = Address::repeat_byte(0xaa);

    journal.record_storage_change(a, U256::from(1u64), state.get_storage(a, U256::from(1u64)));
    state.set_storage(a, U256::from(1u64), U256::from(100u64));

    let snapshot = journal.create_snapshot();
    journal.record_storage_change(a, U256::from(1u64), state.get_storage(a, U256::from(1u64)));
    state.set_storage(a, U256::from(1u64), U256::from(200u64));

    journal.revert_to_snapshot(&mut state, snapshot);
    assert_eq!(state.get_storage(a, U256::from(1u64)), U256::from(100u64));

    journal.record_storage_change(a, U256::from(2u64), state.get_storage(a, U256::from(2u64)));
    state.set_storage(a, U256::from(2u64), U256::from(300u64));
    assert_eq!(state.get_storage(a, U256::from(2u64)), U256::from(300u64));
}

/// (d) `61 00 5B 56 5B 00`: the 0x5B inside the PUSH2 immediate is not a
/// valid jump target; the real JUMPDEST at PC 4 is.
#[test]
fn jump_into_push_data_is_invalid_but_real_jumpdest_is_valid() {
    EvmTester::new()
        .code(hex!("61005B565B00"))
        .gas(1_000_000)
        .success(false)
        .check();

    // PUSH2 4, JUMP, JUMPDEST, STOP: jumps straight to the real JUMPDEST.
    EvmTester::new()
        .code(hex!("610004565B00"))
        .gas(1_000_000)
        .success(true)
        .check();
}

/// (e) a staticcall callee executing LOG1 halts with WriteProtection; the
/// caller observes failure and no log escapes.
#[test]
fn staticcall_callee_logging_fails_without_emitting() {
    let mut state = InMemoryState::new();
    let callee = Address::repeat_byte(0x02);
    // PUSH1 0, PUSH1 0, PUSH1 0, LOG1, STOP
    let hash = state.set_code(bytes::Bytes::copy_from_slice(&hex!("600060006000A100")));
    let mut account = state.get_account(callee).unwrap_or_default();
    account.code_hash = hash;
    state.set_account(callee, account);

    let mut journal = Journal::new();
    let config = HardforkConfig::from(Hardfork::latest());
    let metadata = OpcodeMetadataTable::build(&config);
    let mut host = SimpleHost::new(
        &mut state,
        &mut journal,
        config,
        &metadata,
        evmcore::host::BlockContext {
            coinbase: Address::zero(),
            timestamp: 0,
            number: 0,
            difficulty: U256::zero(),
            gas_limit: 30_000_000,
            base_fee: U256::zero(),
            chain_id: U256::one(),
            blob_base_fee: U256::zero(),
        },
        Address::zero(),
    );

    let result = host.inner_call(CallParams::StaticCall {
        caller: Address::repeat_byte(0x01),
        to: callee,
        input: bytes::Bytes::new(),
        gas: 1_000_000,
    });

    assert!(!result.success);
}

/// (f) CREATE2 address for creator 0x42…42, salt 0, init_code = [0x00].
#[test]
fn create2_address_matches_formula() {
    let creator = Address::repeat_byte(0x42);
    let addr = create2_address(creator, U256::zero(), &[0x00]);
    assert_eq!(addr.as_bytes().len(), 20);

    use sha3::{Digest, Keccak256};
    let init_hash = Keccak256::digest([0x00]);
    let mut buf = [0u8; 85];
    buf[0] = 0xff;
    buf[1..21].copy_from_slice(creator.as_bytes());
    buf[53..85].copy_from_slice(&init_hash);
    let expected = Address::from_slice(&Keccak256::digest(buf)[12..]);
    assert_eq!(addr, expected);
}
