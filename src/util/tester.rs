use crate::common::{Address, Hardfork, Word};
use crate::config::HardforkConfig;
use crate::host::{BlockContext, CallParams, CallResult, Host, SimpleHost};
use crate::journal::Journal;
use crate::metadata::OpcodeMetadataTable;
use crate::state::{InMemoryState, StateStore};
use crate::util::Bytecode;
use bytes::Bytes;

#[derive(Clone, Copy, Debug)]
enum GasCheck {
    Used(u64),
    Left(u64),
}

/// Tester that executes EVM bytecode against a fresh [`InMemoryState`] and
/// runs the checks queued onto it.
#[must_use]
pub struct EvmTester {
    state: InMemoryState,
    config: HardforkConfig,
    block: BlockContext,
    depth: u32,
    is_static: bool,
    origin: Address,
    gas_price: Word,
    sender: Address,
    destination: Address,
    value: Word,
    input: Bytes,
    code: Bytes,
    gas: u64,
    gas_check: Option<GasCheck>,
    expect_success: Option<bool>,
    expected_output_data: Option<Vec<u8>>,
    apply_state_fns: Vec<Box<dyn FnOnce(&mut InMemoryState)>>,
}

impl Default for EvmTester {
    fn default() -> Self {
        Self::new()
    }
}

impl EvmTester {
    pub fn new() -> Self {
        Self {
            state: InMemoryState::new(),
            config: HardforkConfig::from(Hardfork::latest()),
            block: BlockContext {
                coinbase: Address::zero(),
                timestamp: 0,
                number: 0,
                difficulty: Word::zero(),
                gas_limit: 30_000_000,
                base_fee: Word::zero(),
                chain_id: Word::from(1u64),
                blob_base_fee: Word::zero(),
            },
            depth: 0,
            is_static: false,
            origin: Address::zero(),
            gas_price: Word::zero(),
            sender: Address::zero(),
            destination: Address::repeat_byte(0xee),
            value: Word::zero(),
            input: Bytes::new(),
            code: Bytes::new(),
            gas: i64::MAX as u64,
            gas_check: None,
            expect_success: None,
            expected_output_data: None,
            apply_state_fns: Vec::new(),
        }
    }

    /// Set the code to be executed, deployed at the destination address.
    pub fn code(mut self, code: impl Into<Bytecode>) -> Self {
        self.code = code.into().build().into();
        self
    }

    /// Queue a function that mutates the state before execution (seeding
    /// balances, storage, other accounts' code).
    pub fn apply_state_fn(mut self, f: impl FnOnce(&mut InMemoryState) + 'static) -> Self {
        self.apply_state_fns.push(Box::new(f));
        self
    }

    pub fn hardfork(mut self, hardfork: Hardfork) -> Self {
        self.config = HardforkConfig::from(hardfork);
        self
    }

    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn set_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn destination(mut self, destination: impl Into<Address>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn sender(mut self, sender: impl Into<Address>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn value(mut self, value: impl Into<Word>) -> Self {
        self.value = value.into();
        self
    }

    pub fn base_fee(mut self, base_fee: impl Into<Word>) -> Self {
        self.block.base_fee = base_fee.into();
        self
    }

    pub fn input(mut self, input: impl Into<Bytes>) -> Self {
        self.input = input.into();
        self
    }

    /// Check how much gas will be used. Mutually exclusive with `gas_left`.
    pub fn gas_used(mut self, expected_gas_used: u64) -> Self {
        self.gas_check = Some(GasCheck::Used(expected_gas_used));
        self
    }

    /// Check how much gas will be left after execution. Mutually exclusive
    /// with `gas_used`.
    pub fn gas_left(mut self, expected_gas_left: u64) -> Self {
        self.gas_check = Some(GasCheck::Left(expected_gas_left));
        self
    }

    /// Check that execution succeeds (returns normally) or reverts/halts.
    pub fn success(mut self, expect_success: bool) -> Self {
        self.expect_success = Some(expect_success);
        self
    }

    /// Check output to be equal to the given integer, right-aligned in 32
    /// bytes, the convention `RETURN`-ing a single word follows.
    pub fn output_value(mut self, expected_output_data: impl Into<Word>) -> Self {
        let mut data = [0; 32];
        expected_output_data.into().to_big_endian(&mut data);
        self.expected_output_data = Some(data.to_vec());
        self
    }

    pub fn output_data(mut self, expected_output_data: impl Into<Vec<u8>>) -> Self {
        self.expected_output_data = Some(expected_output_data.into());
        self
    }

    /// Execute the queued code, run checks, and return the raw call result.
    pub fn check_and_get_result(mut self) -> CallResult {
        for f in std::mem::take(&mut self.apply_state_fns) {
            f(&mut self.state);
        }

        tracing::debug!(code = %hex::encode(&self.code), "executing code");

        let code_hash = self.state.set_code(self.code.clone());
        let mut account = self.state.get_account(self.destination).unwrap_or_default();
        account.code_hash = code_hash;
        self.state.set_account(self.destination, account);

        let metadata = OpcodeMetadataTable::build(&self.config);
        let mut journal = Journal::new();
        let mut host = SimpleHost::new(
            &mut self.state,
            &mut journal,
            self.config,
            &metadata,
            self.block.clone(),
            self.origin,
        );
        host.depth = self.depth;
        host.is_static = self.is_static;
        host.gas_price = self.gas_price;

        let result = host.inner_call(CallParams::Call {
            caller: self.sender,
            to: self.destination,
            value: self.value,
            input: self.input.clone(),
            gas: self.gas,
        });
        host.finalize_transaction();

        if let Some(expect_success) = self.expect_success {
            assert_eq!(
                result.success, expect_success,
                "execution success mismatch"
            );
        }

        if let Some(gas_check) = self.gas_check {
            match gas_check {
                GasCheck::Used(used) => assert_eq!(self.gas - result.gas_left, used),
                GasCheck::Left(left) => assert_eq!(result.gas_left, left),
            }
        }

        if let Some(expected_data) = &self.expected_output_data {
            assert_eq!(&*result.output, expected_data);
        }

        result
    }

    /// Execute the queued code and run checks, discarding the result.
    pub fn check(self) {
        self.check_and_get_result();
    }
}
