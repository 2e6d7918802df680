//! The host capability set (§4.6): everything the interpreter cannot do on
//! its own, plus one concrete reference implementation, [`SimpleHost`].

use crate::common::{address_to_u256, Address, CodeHash, Word};
use crate::journal::Journal;
use crate::state::StateStore;
use crate::{analyzer, config::HardforkConfig, interpreter, metadata::OpcodeMetadataTable};
use bytes::Bytes;
use derive_more::{Display, Error};
use sha3::{Digest, Keccak256};

/// Per-account/storage-slot access status tracked for EIP-2929 gas accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AccessStatus {
    #[default]
    Cold,
    Warm,
}

/// Block-wide context fed to the BLOCKHASH/COINBASE/... family of opcodes.
#[derive(Clone, Debug)]
pub struct BlockContext {
    pub coinbase: Address,
    pub timestamp: u64,
    pub number: u64,
    pub difficulty: Word,
    pub gas_limit: u64,
    pub base_fee: Word,
    pub chain_id: Word,
    pub blob_base_fee: Word,
}

/// A single emitted log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub address: Address,
    pub topics: arrayvec::ArrayVec<Word, 4>,
    pub data: Bytes,
}

/// Tagged union of the six call-like operations the interpreter can request.
#[derive(Clone, Debug)]
pub enum CallParams {
    Call {
        caller: Address,
        to: Address,
        value: Word,
        input: Bytes,
        gas: u64,
    },
    CallCode {
        caller: Address,
        to: Address,
        value: Word,
        input: Bytes,
        gas: u64,
    },
    DelegateCall {
        caller: Address,
        /// The currently executing contract, whose address and storage the
        /// callee's code keeps running under.
        context: Address,
        to: Address,
        input: Bytes,
        gas: u64,
    },
    StaticCall {
        caller: Address,
        to: Address,
        input: Bytes,
        gas: u64,
    },
    Create {
        caller: Address,
        value: Word,
        init_code: Bytes,
        gas: u64,
    },
    Create2 {
        caller: Address,
        value: Word,
        init_code: Bytes,
        salt: Word,
        gas: u64,
    },
}

/// Outcome of [`Host::inner_call`].
#[derive(Clone, Debug)]
pub struct CallResult {
    pub success: bool,
    pub gas_left: u64,
    pub output: Bytes,
}

/// Errors raised at the host/state boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum HostError {
    #[display(fmt = "snapshot not found")]
    SnapshotNotFound,
    #[display(fmt = "code not found")]
    CodeNotFound,
    #[display(fmt = "account not found")]
    AccountNotFound,
    #[display(fmt = "invalid address for this operation")]
    InvalidAddress,
    #[display(fmt = "allocation failure")]
    AllocationFailure,
    #[display(fmt = "write protection")]
    WriteProtection,
}

/// The operations the interpreter cannot perform on its own: external calls,
/// logs, self-destruct bookkeeping, and block-wide context.
///
/// Deliberately synchronous (§5: "the only re-entry into external code...
/// runs to completion synchronously"); no `async_trait`, no `anyhow`.
pub trait Host {
    fn account_exists(&mut self, address: Address) -> bool;
    fn get_balance(&mut self, address: Address) -> Word;
    fn get_code_size(&mut self, address: Address) -> u64;
    fn get_code_hash(&mut self, address: Address) -> CodeHash;
    fn copy_code(&mut self, address: Address, offset: usize, buffer: &mut [u8]) -> usize;

    fn get_storage(&mut self, address: Address, key: Word) -> Word;
    fn set_storage(&mut self, address: Address, key: Word, value: Word);
    fn get_transient_storage(&mut self, address: Address, key: Word) -> Word;
    fn set_transient_storage(&mut self, address: Address, key: Word, value: Word);

    fn access_account(&mut self, address: Address) -> AccessStatus;
    fn access_storage(&mut self, address: Address, key: Word) -> AccessStatus;

    fn inner_call(&mut self, params: CallParams) -> CallResult;
    fn mark_for_destruction(&mut self, contract: Address, beneficiary: Address);
    fn emit_log(&mut self, log: LogRecord) -> Result<(), HostError>;

    fn block_context(&mut self) -> BlockContext;
    fn blob_hash(&mut self, index: usize) -> Word;
    fn blockhash(&mut self, number: u64) -> Word;

    /// The original EOA that signed the enclosing transaction (`ORIGIN`).
    fn tx_origin(&mut self) -> Address;
    /// The gas price of the enclosing transaction (`GASPRICE`).
    fn tx_gas_price(&mut self) -> Word;

    fn is_static(&self) -> bool;
}

/// `keccak256(rlp(caller, nonce))[12..]`, the CREATE (non-2) address formula.
///
/// A full RLP codec is out of scope for this engine (there is no trie and no
/// transaction encoding elsewhere), so this is a single-purpose encoder for
/// the `(Address, u64)` pair only, not a general-purpose RLP implementation.
pub fn create_address(caller: Address, nonce: u64) -> Address {
    let nonce_bytes = rlp_encode_u64(nonce);
    let mut rlp = Vec::with_capacity(1 + 21 + nonce_bytes.len());

    let addr_item_len = 21;
    let payload_len = addr_item_len + nonce_bytes.len();
    rlp.push(0xc0 + payload_len as u8);
    rlp.push(0x94); // 0x80 + 20
    rlp.extend_from_slice(caller.as_bytes());
    rlp.extend_from_slice(&nonce_bytes);

    let hash = Keccak256::digest(&rlp);
    Address::from_slice(&hash[12..])
}

fn rlp_encode_u64(v: u64) -> Vec<u8> {
    if v == 0 {
        return vec![0x80];
    }
    let be = v.to_be_bytes();
    let first_nonzero = be.iter().position(|&b| b != 0).unwrap();
    let trimmed = &be[first_nonzero..];
    if trimmed.len() == 1 && trimmed[0] < 0x80 {
        vec![trimmed[0]]
    } else {
        let mut out = vec![0x80 + trimmed.len() as u8];
        out.extend_from_slice(trimmed);
        out
    }
}

/// `keccak256(0xFF ++ caller ++ salt ++ keccak256(init_code))[12..]`, bit-exact
/// per §6.
pub fn create2_address(caller: Address, salt: Word, init_code: &[u8]) -> Address {
    let init_code_hash = Keccak256::digest(init_code);
    let mut buf = [0u8; 1 + 20 + 32 + 32];
    buf[0] = 0xff;
    buf[1..21].copy_from_slice(caller.as_bytes());
    salt.to_big_endian(&mut buf[21..53]);
    buf[53..85].copy_from_slice(&init_code_hash);
    let hash = Keccak256::digest(&buf);
    Address::from_slice(&hash[12..])
}

pub const MAX_CALL_DEPTH: u32 = 1024;

/// A minimal, real (non-mock) orchestrator tying state store, journal,
/// analyzer and interpreter together so the crate is directly exercisable
/// end to end. Not a transaction driver: no receipts, no refund totals.
pub struct SimpleHost<'a, S: StateStore> {
    pub state: &'a mut S,
    pub journal: &'a mut Journal,
    pub config: HardforkConfig,
    pub metadata: &'a OpcodeMetadataTable<Self>,
    pub analyzer_options: analyzer::AnalyzerOptions,
    pub block: BlockContext,
    pub depth: u32,
    pub is_static: bool,
    pub origin: Address,
    pub gas_price: Word,
    pub pending_destruction: Vec<(Address, Address)>,
    pub blob_hashes: Vec<Word>,
    analysis_cache: analyzer::cache::AnalysisCache<SimpleHost<'a, S>>,
}

impl<'a, S: StateStore> SimpleHost<'a, S> {
    pub fn new(
        state: &'a mut S,
        journal: &'a mut Journal,
        config: HardforkConfig,
        metadata: &'a OpcodeMetadataTable<Self>,
        block: BlockContext,
        origin: Address,
    ) -> Self {
        Self {
            state,
            journal,
            config,
            metadata,
            analyzer_options: analyzer::AnalyzerOptions::default(),
            block,
            depth: 0,
            is_static: false,
            origin,
            gas_price: Word::zero(),
            pending_destruction: Vec::new(),
            blob_hashes: Vec::new(),
            analysis_cache: analyzer::cache::AnalysisCache::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_code(
        &mut self,
        code: Bytes,
        contract_address: Address,
        caller: Address,
        value: Word,
        input: Bytes,
        gas: u64,
        is_static: bool,
    ) -> CallResult {
        if self.depth >= MAX_CALL_DEPTH {
            return CallResult {
                success: false,
                gas_left: gas,
                output: Bytes::new(),
            };
        }

        let snapshot = self.journal.create_snapshot();
        let saved_static = self.is_static;
        self.is_static = is_static;
        self.depth += 1;

        let code_hash = CodeHash::from_slice(&Keccak256::digest(&code));
        let analyzed = match self.analysis_cache.get_or_analyze(
            code_hash,
            &code,
            self.metadata,
            self.analyzer_options,
        ) {
            Ok(stream) => stream,
            Err(_) => {
                self.depth -= 1;
                self.is_static = saved_static;
                self.journal.revert_to_snapshot(self.state, snapshot);
                return CallResult {
                    success: false,
                    gas_left: 0,
                    output: Bytes::new(),
                };
            }
        };

        let mut frame = interpreter::Frame {
            stack: Default::default(),
            memory: Default::default(),
            gas_remaining: gas as i64,
            contract_address,
            caller,
            value,
            input,
            code: code.clone(),
            return_data: Bytes::new(),
            is_static,
            depth: self.depth,
            host: self,
        };

        let outcome = interpreter::run(&mut frame, &analyzed);
        let gas_remaining = frame.gas_remaining.max(0) as u64;

        self.depth -= 1;
        self.is_static = saved_static;

        match outcome {
            Ok(interpreter::Halt::Stop) => {
                self.journal.commit_snapshot(snapshot);
                CallResult {
                    success: true,
                    gas_left: gas_remaining,
                    output: Bytes::new(),
                }
            }
            Ok(interpreter::Halt::Return(data)) => {
                self.journal.commit_snapshot(snapshot);
                CallResult {
                    success: true,
                    gas_left: gas_remaining,
                    output: data,
                }
            }
            Ok(interpreter::Halt::Revert(data)) => {
                self.journal.revert_to_snapshot(self.state, snapshot);
                CallResult {
                    success: false,
                    gas_left: gas_remaining,
                    output: data,
                }
            }
            Ok(interpreter::Halt::SelfDestruct(_beneficiary)) => {
                self.journal.commit_snapshot(snapshot);
                CallResult {
                    success: true,
                    gas_left: gas_remaining,
                    output: Bytes::new(),
                }
            }
            Err(_) => {
                self.journal.revert_to_snapshot(self.state, snapshot);
                CallResult {
                    success: false,
                    gas_left: gas_remaining,
                    output: Bytes::new(),
                }
            }
        }
    }
}

impl<'a, S: StateStore> Host for SimpleHost<'a, S> {
    fn account_exists(&mut self, address: Address) -> bool {
        self.state.account_exists(address)
    }

    fn get_balance(&mut self, address: Address) -> Word {
        self.state.get_balance(address)
    }

    fn get_code_size(&mut self, address: Address) -> u64 {
        self.state
            .get_code_by_address(address)
            .map(|c| c.len() as u64)
            .unwrap_or(0)
    }

    fn get_code_hash(&mut self, address: Address) -> CodeHash {
        self.state
            .get_account(address)
            .map(|a| a.code_hash)
            .unwrap_or_default()
    }

    fn copy_code(&mut self, address: Address, offset: usize, buffer: &mut [u8]) -> usize {
        let code = self.state.get_code_by_address(address).unwrap_or_default();
        let mut copied = 0usize;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let src = offset + i;
            *slot = code.get(src).copied().unwrap_or(0);
            copied += 1;
        }
        copied.min(code.len().saturating_sub(offset))
    }

    fn get_storage(&mut self, address: Address, key: Word) -> Word {
        self.state.get_storage(address, key)
    }

    fn set_storage(&mut self, address: Address, key: Word, value: Word) {
        let original = self.state.get_storage(address, key);
        self.journal.record_storage_change(address, key, original);
        self.state.set_storage(address, key, value);
    }

    fn get_transient_storage(&mut self, address: Address, key: Word) -> Word {
        self.state.get_transient_storage(address, key)
    }

    fn set_transient_storage(&mut self, address: Address, key: Word, value: Word) {
        let original = self.state.get_transient_storage(address, key);
        self.journal
            .record_transient_storage_change(address, key, original);
        self.state.set_transient_storage(address, key, value);
    }

    fn access_account(&mut self, address: Address) -> AccessStatus {
        self.state.mark_account_warm(address)
    }

    fn access_storage(&mut self, address: Address, key: Word) -> AccessStatus {
        self.state.mark_storage_warm(address, key)
    }

    fn inner_call(&mut self, params: CallParams) -> CallResult {
        match params {
            CallParams::Call {
                caller,
                to,
                value,
                input,
                gas,
            } => {
                if self.is_static && !value.is_zero() {
                    return CallResult {
                        success: false,
                        gas_left: gas,
                        output: Bytes::new(),
                    };
                }
                if !value.is_zero() {
                    if self.state.get_balance(caller) < value {
                        return CallResult {
                            success: false,
                            gas_left: gas,
                            output: Bytes::new(),
                        };
                    }
                    self.transfer_value(caller, to, value);
                }
                let code = self.state.get_code_by_address(to).unwrap_or_default();
                self.run_code(code, to, caller, value, input, gas, self.is_static)
            }
            CallParams::CallCode {
                caller,
                to,
                value,
                input,
                gas,
            } => {
                let code = self.state.get_code_by_address(to).unwrap_or_default();
                self.run_code(code, caller, caller, value, input, gas, self.is_static)
            }
            CallParams::DelegateCall {
                caller,
                context,
                to,
                input,
                gas,
            } => {
                let code = self.state.get_code_by_address(to).unwrap_or_default();
                self.run_code(code, context, caller, Word::zero(), input, gas, self.is_static)
            }
            CallParams::StaticCall {
                caller,
                to,
                input,
                gas,
            } => {
                let code = self.state.get_code_by_address(to).unwrap_or_default();
                self.run_code(code, to, caller, Word::zero(), input, gas, true)
            }
            CallParams::Create {
                caller,
                value,
                init_code,
                gas,
            } => {
                let nonce = self.state.get_account(caller).map(|a| a.nonce).unwrap_or(0);
                let target = create_address(caller, nonce);
                self.do_create(caller, target, value, init_code, gas)
            }
            CallParams::Create2 {
                caller,
                value,
                init_code,
                salt,
                gas,
            } => {
                let target = create2_address(caller, salt, &init_code);
                self.do_create(caller, target, value, init_code, gas)
            }
        }
    }

    fn mark_for_destruction(&mut self, contract: Address, beneficiary: Address) {
        // The balance moves right away — `contract` must remain fully
        // functional (callable, with its code and storage intact) for the
        // rest of the transaction. Only the account's actual removal is
        // deferred to `finalize_transaction`, and even then only applies
        // under EIP-6780 (see there).
        self.pending_destruction.push((contract, beneficiary));
        let balance = self.state.get_balance(contract);
        if !balance.is_zero() {
            self.journal.record_balance_change(contract, balance);
            let beneficiary_balance = self.state.get_balance(beneficiary);
            self.journal
                .record_balance_change(beneficiary, beneficiary_balance);
            self.state
                .set_balance(beneficiary, beneficiary_balance + balance);
            self.state.set_balance(contract, Word::zero());
        }
    }

    fn emit_log(&mut self, log: LogRecord) -> Result<(), HostError> {
        if self.is_static {
            return Err(HostError::WriteProtection);
        }
        tracing::trace!(address = ?log.address, topics = log.topics.len(), "log emitted");
        Ok(())
    }

    fn block_context(&mut self) -> BlockContext {
        self.block.clone()
    }

    fn blob_hash(&mut self, index: usize) -> Word {
        self.blob_hashes.get(index).copied().unwrap_or_default()
    }

    fn blockhash(&mut self, _number: u64) -> Word {
        Word::zero()
    }

    fn tx_origin(&mut self) -> Address {
        self.origin
    }

    fn tx_gas_price(&mut self) -> Word {
        self.gas_price
    }

    fn is_static(&self) -> bool {
        self.is_static
    }
}

impl<'a, S: StateStore> SimpleHost<'a, S> {
    fn transfer_value(&mut self, from: Address, to: Address, value: Word) {
        let from_balance = self.state.get_balance(from);
        let to_balance = self.state.get_balance(to);
        self.journal.record_balance_change(from, from_balance);
        self.journal.record_balance_change(to, to_balance);
        self.state.set_balance(from, from_balance - value);
        self.state.set_balance(to, to_balance + value);
    }

    fn do_create(
        &mut self,
        caller: Address,
        target: Address,
        value: Word,
        init_code: Bytes,
        gas: u64,
    ) -> CallResult {
        if self.is_static || self.state.account_exists(target) {
            return CallResult {
                success: false,
                gas_left: gas,
                output: Bytes::new(),
            };
        }
        let snapshot = self.journal.create_snapshot();
        if !value.is_zero() {
            if self.state.get_balance(caller) < value {
                self.journal.revert_to_snapshot(self.state, snapshot);
                return CallResult {
                    success: false,
                    gas_left: gas,
                    output: Bytes::new(),
                };
            }
            self.transfer_value(caller, target, value);
        }
        self.journal.record_account_created(target);
        let caller_nonce = self.state.get_account(caller).map(|a| a.nonce).unwrap_or(0);
        self.journal.record_nonce_change(caller, caller_nonce);
        self.state.set_nonce(caller, caller_nonce + 1);
        self.state.mark_created_this_tx(target);

        let result = self.run_code(init_code, target, caller, value, Bytes::new(), gas, false);

        if result.success {
            let code_hash = self.state.set_code(result.output.clone());
            self.journal.record_code_change(target, CodeHash::zero());
            self.state.set_code_hash(target, code_hash);
            CallResult {
                success: true,
                gas_left: result.gas_left,
                output: Bytes::copy_from_slice(target.as_bytes()),
            }
        } else {
            self.journal.revert_to_snapshot(self.state, snapshot);
            result
        }
    }

    /// Applies deferred SELFDESTRUCTs and clears transient storage (EIP-1153,
    /// EIP-6780). MUST be called exactly once, after the top-level call has
    /// fully resolved — nothing past this point can revert, so neither step
    /// needs journal participation.
    ///
    /// A pending destruction whose contract was created by a CREATE that
    /// itself got reverted is a no-op here: `delete_account` already ran
    /// against the `AccountCreated` journal entry, so `get_account` finds
    /// nothing and `created_this_tx` reads back `false`.
    pub fn finalize_transaction(&mut self) {
        for (contract, _beneficiary) in self.pending_destruction.drain(..) {
            let created_this_tx = self
                .state
                .get_account(contract)
                .map(|a| a.created_this_tx)
                .unwrap_or(false);
            if created_this_tx {
                self.state.delete_account(contract);
            }
        }
        self.state.clear_transient_storage();
    }
}

#[inline]
#[allow(dead_code)]
pub(crate) fn address_as_word(a: Address) -> Word {
    address_to_u256(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create2_is_bit_exact() {
        let caller = Address::repeat_byte(0x42);
        let salt = Word::zero();
        let init_code = [0x00u8];
        let expected = {
            let init_hash = Keccak256::digest(init_code);
            let mut buf = [0u8; 85];
            buf[0] = 0xff;
            buf[1..21].copy_from_slice(caller.as_bytes());
            buf[53..85].copy_from_slice(&init_hash);
            let hash = Keccak256::digest(buf);
            Address::from_slice(&hash[12..])
        };
        assert_eq!(create2_address(caller, salt, &init_code), expected);
    }

    #[test]
    fn rlp_u64_zero_is_0x80() {
        assert_eq!(rlp_encode_u64(0), vec![0x80]);
    }
}
