//! Stack, memory, account model and the in-memory state store (§3, §4.5).

use crate::common::{Address, CodeHash, Word};
use crate::host::AccessStatus;
use arrayvec::ArrayVec;
use derive_more::{Display, Error};
use sha3::{Digest, Keccak256};
use std::collections::{HashMap, HashSet};

const STACK_SIZE: usize = 1024;

/// Bounded EVM operand stack, limited to 1024 words.
///
/// Ported from `evmodin::state::Stack`: reverse-indexed accessors (`get(0)`
/// is the top), `push` via `push_unchecked` since block-entry validation
/// already guarantees headroom.
#[derive(Clone, Debug, Default)]
pub struct Stack(ArrayVec<Word, STACK_SIZE>);

impl Stack {
    pub const fn limit() -> usize {
        STACK_SIZE
    }

    fn get_pos(&self, pos: usize) -> usize {
        self.0.len() - 1 - pos
    }

    pub fn get(&self, pos: usize) -> &Word {
        &self.0[self.get_pos(pos)]
    }

    pub fn get_mut(&mut self, pos: usize) -> &mut Word {
        let pos = self.get_pos(pos);
        &mut self.0[pos]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Caller must have already validated headroom via block-entry checks.
    pub fn push(&mut self, v: Word) {
        unsafe { self.0.push_unchecked(v) }
    }

    pub fn pop(&mut self) -> Word {
        self.0.pop().expect("underflow despite block-entry validation")
    }

    pub fn swap_top(&mut self, pos: usize) {
        let top = self.0.len() - 1;
        let pos = self.get_pos(pos);
        self.0.swap(top, pos);
    }
}

/// Byte-addressable EVM memory, grown in 32-byte words by the interpreter.
pub type Memory = Vec<u8>;

/// Number of cells needed to hold `len` bytes, 32-byte word boundaries.
pub fn num_words(len: usize) -> usize {
    (len + 31) / 32
}

/// Maximum depth EIP-7702 delegation resolution will traverse before giving
/// up; a defense against a misbehaving caller building a long or cyclic
/// chain beyond the protocol's own "delegate must point at non-delegating
/// code" invariant.
pub const MAX_DELEGATION_DEPTH: usize = 8;

/// On-chain account record (§3).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: Word,
    pub nonce: u64,
    pub code_hash: CodeHash,
    pub storage_root: CodeHash,
    pub delegated_address: Option<Address>,
    /// Set when this address was created by CREATE/CREATE2 in the current
    /// transaction. Determines the EIP-6780 SELFDESTRUCT branch and, being a
    /// plain account field, reverts for free through the existing
    /// `AccountCreated` journal entry (`delete_account` on revert wipes it
    /// along with everything else).
    pub created_this_tx: bool,
}

impl Account {
    pub fn is_eoa(&self) -> bool {
        self.code_hash.is_zero() && self.delegated_address.is_none()
    }
}

/// Failure modes at the state/store boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum StateError {
    #[display(fmt = "code not found")]
    CodeNotFound,
    #[display(fmt = "account not found")]
    AccountNotFound,
    #[display(fmt = "invalid address for this operation")]
    InvalidAddress,
    #[display(fmt = "delegation cycle exceeded depth {}", MAX_DELEGATION_DEPTH)]
    DelegationCycle,
}

/// Point-query interface the interpreter/host need from the state backend.
pub trait StateStore {
    fn get_account(&self, address: Address) -> Option<Account>;
    fn set_account(&mut self, address: Address, account: Account);
    fn delete_account(&mut self, address: Address);
    fn account_exists(&self, address: Address) -> bool;
    fn restore_account(&mut self, address: Address, balance: Word);
    fn mark_created_this_tx(&mut self, address: Address);

    fn get_balance(&self, address: Address) -> Word;
    fn set_balance(&mut self, address: Address, balance: Word);
    fn set_nonce(&mut self, address: Address, nonce: u64);

    fn get_storage(&self, address: Address, key: Word) -> Word;
    fn set_storage(&mut self, address: Address, key: Word, value: Word);

    fn get_transient_storage(&self, address: Address, key: Word) -> Word;
    fn set_transient_storage(&mut self, address: Address, key: Word, value: Word);
    /// MUST be called exactly once at transaction end (EIP-1153).
    fn clear_transient_storage(&mut self);

    fn get_code_by_hash(&self, hash: CodeHash) -> Option<bytes::Bytes>;
    /// Honors EIP-7702 delegation, resolving through at most
    /// [`MAX_DELEGATION_DEPTH`] hops.
    fn get_code_by_address(&self, address: Address) -> Option<bytes::Bytes>;
    fn set_code(&mut self, code: bytes::Bytes) -> CodeHash;
    fn set_code_hash(&mut self, address: Address, hash: CodeHash);

    fn set_delegation(&mut self, eoa: Address, target: Address) -> Result<(), StateError>;
    fn clear_delegation(&mut self, eoa: Address);
    fn has_delegation(&self, address: Address) -> bool;

    fn mark_account_warm(&mut self, address: Address) -> AccessStatus;
    fn mark_storage_warm(&mut self, address: Address, key: Word) -> AccessStatus;
}

/// Simple hash-map backed store (§9: "state-root computation is an explicit
/// non-goal"). Not thread-safe; owned exclusively by one transaction driver.
#[derive(Debug, Default)]
pub struct InMemoryState {
    accounts: HashMap<Address, Account>,
    storage: HashMap<(Address, Word), Word>,
    transient_storage: HashMap<(Address, Word), Word>,
    code: HashMap<CodeHash, bytes::Bytes>,
    warm_accounts: HashSet<Address>,
    warm_storage: HashSet<(Address, Word)>,
}

impl InMemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryState {
    fn get_account(&self, address: Address) -> Option<Account> {
        self.accounts.get(&address).cloned()
    }

    fn set_account(&mut self, address: Address, account: Account) {
        self.accounts.insert(address, account);
    }

    fn delete_account(&mut self, address: Address) {
        self.accounts.remove(&address);
        self.storage.retain(|(a, _), _| *a != address);
    }

    fn account_exists(&self, address: Address) -> bool {
        self.accounts.contains_key(&address)
    }

    fn restore_account(&mut self, address: Address, balance: Word) {
        let entry = self.accounts.entry(address).or_default();
        entry.balance = balance;
    }

    fn mark_created_this_tx(&mut self, address: Address) {
        self.accounts.entry(address).or_default().created_this_tx = true;
    }

    fn get_balance(&self, address: Address) -> Word {
        self.accounts
            .get(&address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    fn set_balance(&mut self, address: Address, balance: Word) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.accounts.entry(address).or_default().nonce = nonce;
    }

    fn get_storage(&self, address: Address, key: Word) -> Word {
        self.storage.get(&(address, key)).copied().unwrap_or_default()
    }

    fn set_storage(&mut self, address: Address, key: Word, value: Word) {
        if value.is_zero() {
            self.storage.remove(&(address, key));
        } else {
            self.storage.insert((address, key), value);
        }
    }

    fn get_transient_storage(&self, address: Address, key: Word) -> Word {
        self.transient_storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default()
    }

    fn set_transient_storage(&mut self, address: Address, key: Word, value: Word) {
        if value.is_zero() {
            self.transient_storage.remove(&(address, key));
        } else {
            self.transient_storage.insert((address, key), value);
        }
    }

    fn clear_transient_storage(&mut self) {
        self.transient_storage.clear();
    }

    fn get_code_by_hash(&self, hash: CodeHash) -> Option<bytes::Bytes> {
        self.code.get(&hash).cloned()
    }

    fn get_code_by_address(&self, address: Address) -> Option<bytes::Bytes> {
        let mut current = address;
        let mut account = self.accounts.get(&current)?;
        let mut hops = 0;
        while let Some(target) = account.delegated_address {
            hops += 1;
            if hops > MAX_DELEGATION_DEPTH {
                return None;
            }
            current = target;
            account = self.accounts.get(&current)?;
        }
        self.code.get(&account.code_hash).cloned()
    }

    fn set_code(&mut self, code: bytes::Bytes) -> CodeHash {
        let hash = CodeHash::from_slice(&Keccak256::digest(&code));
        self.code.entry(hash).or_insert(code);
        hash
    }

    fn set_code_hash(&mut self, address: Address, hash: CodeHash) {
        self.accounts.entry(address).or_default().code_hash = hash;
    }

    fn set_delegation(&mut self, eoa: Address, target: Address) -> Result<(), StateError> {
        let entry = self.accounts.entry(eoa).or_default();
        if !entry.code_hash.is_zero() {
            return Err(StateError::InvalidAddress);
        }
        entry.delegated_address = Some(target);
        Ok(())
    }

    fn clear_delegation(&mut self, eoa: Address) {
        if let Some(account) = self.accounts.get_mut(&eoa) {
            account.delegated_address = None;
        }
    }

    fn has_delegation(&self, address: Address) -> bool {
        self.accounts
            .get(&address)
            .is_some_and(|a| a.delegated_address.is_some())
    }

    fn mark_account_warm(&mut self, address: Address) -> AccessStatus {
        if self.warm_accounts.insert(address) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }

    fn mark_storage_warm(&mut self, address: Address, key: Word) -> AccessStatus {
        if self.warm_storage.insert((address, key)) {
            AccessStatus::Cold
        } else {
            AccessStatus::Warm
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack() {
        let mut stack = Stack::default();
        let items = [0xde, 0xad, 0xbe, 0xef];
        for (i, item) in items.iter().copied().enumerate() {
            stack.push(item.into());
            assert_eq!(stack.len(), i + 1);
        }
        assert_eq!(*stack.get(2), 0xad.into());
        assert_eq!(stack.pop(), 0xef.into());
        assert_eq!(*stack.get(2), 0xde.into());
    }

    #[test]
    fn delegation_resolves_one_hop() {
        let mut state = InMemoryState::new();
        let eoa = Address::repeat_byte(1);
        let target = Address::repeat_byte(2);
        let code = bytes::Bytes::from_static(&[0x60, 0x00]);
        let hash = state.set_code(code.clone());
        state.set_account(
            target,
            Account {
                code_hash: hash,
                ..Default::default()
            },
        );
        state.set_account(
            eoa,
            Account {
                delegated_address: Some(target),
                ..Default::default()
            },
        );
        assert_eq!(state.get_code_by_address(eoa), Some(code));
    }

    #[test]
    fn delegation_cycle_terminates() {
        let mut state = InMemoryState::new();
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        state.set_account(
            a,
            Account {
                delegated_address: Some(b),
                ..Default::default()
            },
        );
        state.set_account(
            b,
            Account {
                delegated_address: Some(a),
                ..Default::default()
            },
        );
        assert_eq!(state.get_code_by_address(a), None);
    }
}
