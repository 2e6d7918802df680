//! Nested snapshot/revert behavior across the full range of journaled
//! mutation kinds, beyond the single-cell case already covered inline in
//! `src/journal.rs`.

use evmcore::state::StateStore;
use evmcore::{Address, InMemoryState, Journal, Word};

#[test]
fn reverting_an_outer_snapshot_undoes_an_inner_one_too() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(3);
    let key = Word::from(9u64);

    let outer = journal.create_snapshot();
    journal.record_storage_change(addr, key, state.get_storage(addr, key));
    state.set_storage(addr, key, Word::from(1u64));

    let _inner = journal.create_snapshot();
    journal.record_storage_change(addr, key, state.get_storage(addr, key));
    state.set_storage(addr, key, Word::from(2u64));

    journal.revert_to_snapshot(&mut state, outer);
    assert_eq!(state.get_storage(addr, key), Word::zero());
}

#[test]
fn committing_an_inner_snapshot_leaves_outer_writes_revertible() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(4);
    let key = Word::from(1u64);

    let outer = journal.create_snapshot();
    journal.record_storage_change(addr, key, state.get_storage(addr, key));
    state.set_storage(addr, key, Word::from(10u64));

    let inner = journal.create_snapshot();
    journal.record_storage_change(addr, key, state.get_storage(addr, key));
    state.set_storage(addr, key, Word::from(20u64));
    journal.commit_snapshot(inner);

    // The inner write is now indistinguishable from the outer one; reverting
    // `outer` still undoes both, since commit is a no-op on the live state.
    journal.revert_to_snapshot(&mut state, outer);
    assert_eq!(state.get_storage(addr, key), Word::zero());
}

#[test]
fn balance_and_nonce_changes_revert_independently() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(5);

    journal.record_balance_change(addr, state.get_balance(addr));
    state.set_balance(addr, Word::from(1_000u64));

    let snapshot = journal.create_snapshot();
    journal.record_nonce_change(addr, state.get_account(addr).unwrap_or_default().nonce);
    state.set_nonce(addr, 7);

    journal.revert_to_snapshot(&mut state, snapshot);
    assert_eq!(state.get_balance(addr), Word::from(1_000u64));
    assert_eq!(state.get_account(addr).unwrap_or_default().nonce, 0);
}

#[test]
fn code_change_reverts_to_the_original_hash() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(6);

    let original_hash = state.get_account(addr).unwrap_or_default().code_hash;
    let new_hash = state.set_code(vec![0x00].into());

    let snapshot = journal.create_snapshot();
    journal.record_code_change(addr, original_hash);
    state.set_code_hash(addr, new_hash);
    assert_eq!(
        state.get_account(addr).unwrap_or_default().code_hash,
        new_hash
    );

    journal.revert_to_snapshot(&mut state, snapshot);
    assert_eq!(
        state.get_account(addr).unwrap_or_default().code_hash,
        original_hash
    );
}

#[test]
fn account_creation_reverts_by_deleting_it() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(7);

    let snapshot = journal.create_snapshot();
    journal.record_account_created(addr);
    state.set_account(addr, Default::default());
    assert!(state.account_exists(addr));

    journal.revert_to_snapshot(&mut state, snapshot);
    assert!(!state.account_exists(addr));
}

#[test]
fn account_destruction_reverts_by_restoring_its_balance() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(8);
    let beneficiary = Address::repeat_byte(9);

    state.set_balance(addr, Word::from(500u64));
    let snapshot = journal.create_snapshot();
    journal.record_account_destroyed(addr, beneficiary, Word::from(500u64));
    state.delete_account(addr);
    assert!(!state.account_exists(addr));

    journal.revert_to_snapshot(&mut state, snapshot);
    assert_eq!(state.get_balance(addr), Word::from(500u64));
}

#[test]
fn transient_storage_change_reverts_independently_of_persistent_storage() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(10);
    let key = Word::from(1u64);

    state.set_storage(addr, key, Word::from(42u64));

    let snapshot = journal.create_snapshot();
    journal.record_transient_storage_change(addr, key, state.get_transient_storage(addr, key));
    state.set_transient_storage(addr, key, Word::from(99u64));

    journal.revert_to_snapshot(&mut state, snapshot);
    assert_eq!(state.get_transient_storage(addr, key), Word::zero());
    // Persistent storage was never touched by the transient-storage path.
    assert_eq!(state.get_storage(addr, key), Word::from(42u64));
}

#[test]
fn journal_is_empty_after_a_full_revert_to_the_first_snapshot() {
    let mut state = InMemoryState::new();
    let mut journal = Journal::new();
    let addr = Address::repeat_byte(11);

    let first = journal.create_snapshot();
    journal.record_balance_change(addr, state.get_balance(addr));
    state.set_balance(addr, Word::from(1u64));
    journal.record_nonce_change(addr, 0);
    state.set_nonce(addr, 1);

    assert_eq!(journal.len(), 2);
    journal.revert_to_snapshot(&mut state, first);
    assert!(journal.is_empty());
}
