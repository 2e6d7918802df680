//! Per-hardfork runtime configuration.
//!
//! Ported from `evmodin::config::Config`: a plain data struct built via
//! struct-update syntax chained hardfork-by-hardfork, extended with the
//! EIP feature flags the opcode metadata builder needs (§4.1).

use crate::common::Hardfork;

/// Gas costs and feature flags that vary by hardfork.
#[derive(Clone, Copy, Debug)]
pub struct HardforkConfig {
    pub gas_ext_code: u64,
    pub gas_ext_code_copy: u64,
    pub gas_ext_code_hash: u64,
    pub gas_sstore_set: u64,
    pub gas_sstore_reset: u64,
    pub refund_sstore_clears: i64,
    pub gas_balance: u64,
    pub gas_sload: u64,
    pub gas_suicide: u64,
    pub gas_suicide_new_account: u64,
    pub gas_call: u64,
    pub gas_expbyte: u64,
    pub gas_create_divisor: Option<u64>,
    pub sstore_gas_metering: bool,
    pub sstore_revert_under_stipend: bool,

    pub stack_limit: usize,
    pub memory_limit: usize,
    pub call_stack_limit: usize,
    pub create_contract_limit: Option<usize>,
    pub call_stipend: u64,

    pub has_delegate_call: bool,
    pub has_create2: bool,
    pub has_revert: bool,
    pub has_return_data: bool,
    pub has_static_call: bool,
    pub has_bitwise_shifting: bool,
    pub has_chain_id: bool,
    pub has_self_balance: bool,
    pub has_ext_code_hash: bool,
    pub has_access_list: bool,
    pub has_base_fee: bool,

    /// EIP-3855: PUSH0.
    pub eip3855_push0: bool,
    /// EIP-1153: transient storage (TLOAD/TSTORE).
    pub eip1153_transient_storage: bool,
    /// EIP-5656: MCOPY.
    pub eip5656_mcopy: bool,
    /// EIP-3198: BASEFEE.
    pub eip3198_basefee: bool,
    /// EIP-1344: CHAINID.
    pub eip1344_chainid: bool,
    /// EIP-214: STATICCALL.
    pub eip214_staticcall: bool,
    /// EIP-1014: CREATE2.
    pub eip1014_create2: bool,
    /// EIP-1052: EXTCODEHASH.
    pub eip1052_extcodehash: bool,
    /// EIP-4844: BLOBHASH.
    pub eip4844_blobhash: bool,
    /// EIP-7516: BLOBBASEFEE.
    pub eip7516_blobbasefee: bool,
    /// EIP-7702: EOA code delegation.
    pub eip7702_delegation: bool,
}

/// Cost of a warm storage/account read under EIP-2929, reused by several
/// opcode gas tables once berlin access-list accounting is active.
pub const WARM_STORAGE_READ_COST: u64 = 100;
/// Cold account access surcharge under EIP-2929.
pub const COLD_ACCOUNT_ACCESS_COST: u64 = 2600;
/// Cold storage slot access surcharge under EIP-2929.
pub const COLD_SLOAD_COST: u64 = 2100;

impl HardforkConfig {
    pub const fn frontier() -> Self {
        Self {
            gas_ext_code: 20,
            gas_ext_code_copy: 20,
            gas_ext_code_hash: 20,
            gas_balance: 20,
            gas_sload: 50,
            gas_sstore_set: 20000,
            gas_sstore_reset: 5000,
            refund_sstore_clears: 15000,
            gas_suicide: 0,
            gas_suicide_new_account: 0,
            gas_call: 40,
            gas_expbyte: 10,
            gas_create_divisor: None,
            sstore_gas_metering: false,
            sstore_revert_under_stipend: false,
            stack_limit: 1024,
            memory_limit: 16 * 1024 * 1024,
            call_stack_limit: 1024,
            create_contract_limit: None,
            call_stipend: 2300,
            has_delegate_call: false,
            has_create2: false,
            has_revert: false,
            has_return_data: false,
            has_static_call: false,
            has_bitwise_shifting: false,
            has_chain_id: false,
            has_self_balance: false,
            has_ext_code_hash: false,
            has_access_list: false,
            has_base_fee: false,
            eip3855_push0: false,
            eip1153_transient_storage: false,
            eip5656_mcopy: false,
            eip3198_basefee: false,
            eip1344_chainid: false,
            eip214_staticcall: false,
            eip1014_create2: false,
            eip1052_extcodehash: false,
            eip4844_blobhash: false,
            eip7516_blobbasefee: false,
            eip7702_delegation: false,
        }
    }

    pub const fn homestead() -> Self {
        Self {
            has_delegate_call: true,
            ..Self::frontier()
        }
    }

    pub const fn tangerine() -> Self {
        Self {
            gas_ext_code: 700,
            gas_ext_code_copy: 700,
            gas_balance: 400,
            gas_sload: 200,
            gas_call: 700,
            gas_suicide: 5000,
            gas_suicide_new_account: 25000,
            gas_create_divisor: Some(64),
            ..Self::homestead()
        }
    }

    pub const fn spurious() -> Self {
        Self {
            create_contract_limit: Some(0x6000),
            ..Self::tangerine()
        }
    }

    pub const fn byzantium() -> Self {
        Self {
            has_revert: true,
            has_return_data: true,
            has_static_call: true,
            eip214_staticcall: true,
            ..Self::spurious()
        }
    }

    pub const fn constantinople() -> Self {
        Self {
            has_bitwise_shifting: true,
            has_create2: true,
            has_ext_code_hash: true,
            eip1014_create2: true,
            eip1052_extcodehash: true,
            sstore_gas_metering: true,
            ..Self::byzantium()
        }
    }

    pub const fn petersburg() -> Self {
        Self {
            sstore_gas_metering: false,
            ..Self::constantinople()
        }
    }

    pub const fn istanbul() -> Self {
        Self {
            sstore_gas_metering: true,
            sstore_revert_under_stipend: true,
            has_chain_id: true,
            eip1344_chainid: true,
            gas_sload: 800,
            gas_balance: 700,
            gas_ext_code_hash: 700,
            has_self_balance: true,
            ..Self::petersburg()
        }
    }

    pub const fn berlin() -> Self {
        Self {
            gas_ext_code: WARM_STORAGE_READ_COST,
            gas_ext_code_copy: WARM_STORAGE_READ_COST,
            gas_ext_code_hash: WARM_STORAGE_READ_COST,
            gas_balance: WARM_STORAGE_READ_COST,
            gas_call: WARM_STORAGE_READ_COST,
            gas_sload: WARM_STORAGE_READ_COST,
            has_access_list: true,
            ..Self::istanbul()
        }
    }

    pub const fn london() -> Self {
        Self {
            has_base_fee: true,
            eip3198_basefee: true,
            ..Self::berlin()
        }
    }

    pub const fn shanghai() -> Self {
        Self {
            eip3855_push0: true,
            ..Self::london()
        }
    }

    pub const fn cancun() -> Self {
        Self {
            eip1153_transient_storage: true,
            eip5656_mcopy: true,
            eip4844_blobhash: true,
            eip7516_blobbasefee: true,
            eip7702_delegation: true,
            ..Self::shanghai()
        }
    }
}

impl From<Hardfork> for HardforkConfig {
    fn from(rev: Hardfork) -> Self {
        match rev {
            Hardfork::Frontier => Self::frontier(),
            Hardfork::Homestead => Self::homestead(),
            Hardfork::Tangerine => Self::tangerine(),
            Hardfork::Spurious => Self::spurious(),
            Hardfork::Byzantium => Self::byzantium(),
            Hardfork::Constantinople => Self::constantinople(),
            Hardfork::Petersburg => Self::petersburg(),
            Hardfork::Istanbul => Self::istanbul(),
            Hardfork::Berlin => Self::berlin(),
            Hardfork::London => Self::london(),
            Hardfork::Shanghai => Self::shanghai(),
            Hardfork::Cancun => Self::cancun(),
        }
    }
}
