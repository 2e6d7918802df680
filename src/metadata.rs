//! Per-opcode metadata (§4.1): a struct-of-arrays table mapping each of the
//! 256 possible opcode bytes to its handler function pointer, static base
//! gas cost, and stack-height contract, built once per (hardfork, config)
//! pair. Ported from `evmodin::instructions::properties::PROPERTIES`/
//! `gas_costs`, generalized from a lazily-built `Revision -> table` match
//! into a single builder consulted through `HardforkConfig`'s already
//! per-hardfork-varying fields instead of a dozen hand-copied tables.

use crate::config::HardforkConfig;
use crate::host::Host;
use crate::interpreter::handlers::*;
use crate::interpreter::Handler;
use crate::opcode::OpCode;

/// The analyzer and interpreter's single source of truth for what an opcode
/// byte means under a given hardfork: whether it is defined at all, which
/// handler implements it, its static gas cost, and its stack contract.
///
/// Generic over `Host` because handler slots are monomorphized function
/// pointers (no `dyn Host` in the hot dispatch path).
pub struct OpcodeMetadataTable<H: Host> {
    handler: [Option<Handler<H>>; 256],
    base_gas: [u16; 256],
    stack_required: [u8; 256],
    stack_change: [i16; 256],
    defined: [bool; 256],
    name: [&'static str; 256],
}

impl<H: Host> OpcodeMetadataTable<H> {
    pub fn defined(&self, op: u8) -> bool {
        self.defined[op as usize]
    }

    pub fn handler(&self, op: u8) -> Option<Handler<H>> {
        self.handler[op as usize]
    }

    pub fn base_gas(&self, op: u8) -> u16 {
        self.base_gas[op as usize]
    }

    pub fn stack_required(&self, op: u8) -> u8 {
        self.stack_required[op as usize]
    }

    pub fn stack_change(&self, op: u8) -> i16 {
        self.stack_change[op as usize]
    }

    pub fn name(&self, op: u8) -> &'static str {
        self.name[op as usize]
    }

    pub fn fused_handler(&self, kind: FusedKind) -> Handler<H> {
        match kind {
            FusedKind::Add => fused::push_add,
            FusedKind::Sub => fused::push_sub,
            FusedKind::Mul => fused::push_mul,
            FusedKind::And => fused::push_and,
            FusedKind::Or => fused::push_or,
            FusedKind::Xor => fused::push_xor,
            FusedKind::Jump => fused::push_jump,
            FusedKind::Jumpi => fused::push_jumpi,
            FusedKind::Mload => fused::push_mload,
            FusedKind::Mstore => fused::push_mstore,
            FusedKind::Mstore8 => fused::push_mstore8,
        }
    }

    /// Builds the table for `config`, gating EIP-introduced opcodes behind
    /// their feature flag and reading variable base costs straight out of
    /// `config` instead of a second, hand-copied per-hardfork ladder.
    pub fn build(config: &HardforkConfig) -> Self {
        let mut table = Self {
            handler: [None; 256],
            base_gas: [0u16; 256],
            stack_required: [0u8; 256],
            stack_change: [0i16; 256],
            defined: [false; 256],
            name: ["UNKNOWN"; 256],
        };

        macro_rules! def {
            ($op:expr, $handler:expr, $gas:expr, $req:expr, $change:expr) => {{
                let op = $op;
                let idx = op.to_usize();
                table.handler[idx] = Some($handler);
                table.base_gas[idx] = $gas as u16;
                table.stack_required[idx] = $req;
                table.stack_change[idx] = $change;
                table.defined[idx] = true;
                table.name[idx] = op.name();
            }};
        }

        def!(OpCode::STOP, control::stop, 0, 0, 0);
        def!(OpCode::ADD, arithmetic::add, 3, 2, -1);
        def!(OpCode::MUL, arithmetic::mul, 5, 2, -1);
        def!(OpCode::SUB, arithmetic::sub, 3, 2, -1);
        def!(OpCode::DIV, arithmetic::div, 5, 2, -1);
        def!(OpCode::SDIV, arithmetic::sdiv, 5, 2, -1);
        def!(OpCode::MOD, arithmetic::modulo, 5, 2, -1);
        def!(OpCode::SMOD, arithmetic::smod, 5, 2, -1);
        def!(OpCode::ADDMOD, arithmetic::addmod, 8, 3, -2);
        def!(OpCode::MULMOD, arithmetic::mulmod, 8, 3, -2);
        def!(OpCode::EXP, arithmetic::exp, 10, 2, -1);
        def!(OpCode::SIGNEXTEND, arithmetic::signextend, 5, 2, -1);

        def!(OpCode::LT, boolean::lt, 3, 2, -1);
        def!(OpCode::GT, boolean::gt, 3, 2, -1);
        def!(OpCode::SLT, boolean::slt, 3, 2, -1);
        def!(OpCode::SGT, boolean::sgt, 3, 2, -1);
        def!(OpCode::EQ, boolean::eq, 3, 2, -1);
        def!(OpCode::ISZERO, boolean::iszero, 3, 1, 0);
        def!(OpCode::AND, boolean::and, 3, 2, -1);
        def!(OpCode::OR, boolean::or, 3, 2, -1);
        def!(OpCode::XOR, boolean::xor, 3, 2, -1);
        def!(OpCode::NOT, boolean::not, 3, 1, 0);
        def!(OpCode::BYTE, bitwise::byte, 3, 2, -1);
        if config.has_bitwise_shifting {
            def!(OpCode::SHL, bitwise::shl, 3, 2, -1);
            def!(OpCode::SHR, bitwise::shr, 3, 2, -1);
            def!(OpCode::SAR, bitwise::sar, 3, 2, -1);
        }

        def!(OpCode::KECCAK256, memory::keccak256, 30, 2, -1);

        def!(OpCode::ADDRESS, environment::address, 2, 0, 1);
        def!(OpCode::BALANCE, environment::balance, config.gas_balance, 1, 0);
        def!(OpCode::ORIGIN, environment::origin, 2, 0, 1);
        def!(OpCode::CALLER, environment::caller, 2, 0, 1);
        def!(OpCode::CALLVALUE, environment::callvalue, 2, 0, 1);
        def!(OpCode::CALLDATALOAD, memory::calldataload, 3, 1, 0);
        def!(OpCode::CALLDATASIZE, memory::calldatasize, 2, 0, 1);
        def!(OpCode::CALLDATACOPY, memory::calldatacopy, 3, 3, -3);
        def!(OpCode::CODESIZE, memory::codesize, 2, 0, 1);
        def!(OpCode::CODECOPY, memory::codecopy, 3, 3, -3);
        def!(OpCode::GASPRICE, environment::gasprice, 2, 0, 1);
        def!(
            OpCode::EXTCODESIZE,
            environment::extcodesize,
            config.gas_ext_code,
            1,
            0
        );
        def!(
            OpCode::EXTCODECOPY,
            environment::extcodecopy,
            config.gas_ext_code_copy,
            4,
            -4
        );
        if config.has_return_data {
            def!(OpCode::RETURNDATASIZE, memory::returndatasize, 2, 0, 1);
            def!(OpCode::RETURNDATACOPY, memory::returndatacopy, 3, 3, -3);
        }
        if config.has_ext_code_hash {
            def!(
                OpCode::EXTCODEHASH,
                environment::extcodehash,
                config.gas_ext_code_hash,
                1,
                0
            );
        }

        def!(OpCode::BLOCKHASH, environment::blockhash, 20, 1, 0);
        def!(OpCode::COINBASE, environment::coinbase, 2, 0, 1);
        def!(OpCode::TIMESTAMP, environment::timestamp, 2, 0, 1);
        def!(OpCode::NUMBER, environment::number, 2, 0, 1);
        def!(OpCode::DIFFICULTY, environment::difficulty, 2, 0, 1);
        def!(OpCode::GASLIMIT, environment::gaslimit, 2, 0, 1);
        if config.has_chain_id {
            def!(OpCode::CHAINID, environment::chainid, 2, 0, 1);
        }
        if config.has_self_balance {
            def!(OpCode::SELFBALANCE, environment::selfbalance, 5, 0, 1);
        }
        if config.has_base_fee {
            def!(OpCode::BASEFEE, environment::basefee, 2, 0, 1);
        }
        if config.eip4844_blobhash {
            def!(OpCode::BLOBHASH, environment::blobhash, 3, 1, 0);
        }
        if config.eip7516_blobbasefee {
            def!(OpCode::BLOBBASEFEE, environment::blobbasefee, 2, 0, 1);
        }

        def!(OpCode::POP, stack::pop, 2, 1, -1);
        def!(OpCode::MLOAD, memory::mload, 3, 1, 0);
        def!(OpCode::MSTORE, memory::mstore, 3, 2, -2);
        def!(OpCode::MSTORE8, memory::mstore8, 3, 2, -2);
        def!(OpCode::SLOAD, storage::sload, config.gas_sload, 1, 0);
        def!(OpCode::SSTORE, storage::sstore, 0, 2, -2);
        def!(OpCode::JUMP, control::jump, 8, 1, -1);
        def!(OpCode::JUMPI, control::jumpi, 10, 2, -2);
        def!(OpCode::PC, stack::pc, 2, 0, 1);
        def!(OpCode::MSIZE, stack::msize, 2, 0, 1);
        def!(OpCode::GAS, stack::gas, 2, 0, 1);
        def!(OpCode::JUMPDEST, stack::jumpdest, 1, 0, 0);

        if config.eip1153_transient_storage {
            def!(OpCode::TLOAD, storage::tload, 100, 1, 0);
            def!(OpCode::TSTORE, storage::tstore, 100, 2, -2);
        }
        if config.eip5656_mcopy {
            def!(OpCode::MCOPY, memory::mcopy, 3, 3, -3);
        }
        if config.eip3855_push0 {
            def!(OpCode::PUSH0, stack::push0, 2, 0, 1);
        }

        macro_rules! def_push {
            ($op:ident) => {
                def!(OpCode::$op, stack::push_inline, 3, 0, 1);
            };
        }
        def_push!(PUSH1);
        def_push!(PUSH2);
        def_push!(PUSH3);
        def_push!(PUSH4);
        def_push!(PUSH5);
        def_push!(PUSH6);
        def_push!(PUSH7);
        def_push!(PUSH8);
        def_push!(PUSH9);
        def_push!(PUSH10);
        def_push!(PUSH11);
        def_push!(PUSH12);
        def_push!(PUSH13);
        def_push!(PUSH14);
        def_push!(PUSH15);
        def_push!(PUSH16);
        def_push!(PUSH17);
        def_push!(PUSH18);
        def_push!(PUSH19);
        def_push!(PUSH20);
        def_push!(PUSH21);
        def_push!(PUSH22);
        def_push!(PUSH23);
        def_push!(PUSH24);
        def_push!(PUSH25);
        def_push!(PUSH26);
        def_push!(PUSH27);
        def_push!(PUSH28);
        def_push!(PUSH29);
        def_push!(PUSH30);
        def_push!(PUSH31);
        def_push!(PUSH32);

        macro_rules! def_dup {
            ($op:ident, $fn:expr, $req:expr) => {
                def!(OpCode::$op, $fn, 3, $req, 1);
            };
        }
        def_dup!(DUP1, stack::dup1, 1);
        def_dup!(DUP2, stack::dup2, 2);
        def_dup!(DUP3, stack::dup3, 3);
        def_dup!(DUP4, stack::dup4, 4);
        def_dup!(DUP5, stack::dup5, 5);
        def_dup!(DUP6, stack::dup6, 6);
        def_dup!(DUP7, stack::dup7, 7);
        def_dup!(DUP8, stack::dup8, 8);
        def_dup!(DUP9, stack::dup9, 9);
        def_dup!(DUP10, stack::dup10, 10);
        def_dup!(DUP11, stack::dup11, 11);
        def_dup!(DUP12, stack::dup12, 12);
        def_dup!(DUP13, stack::dup13, 13);
        def_dup!(DUP14, stack::dup14, 14);
        def_dup!(DUP15, stack::dup15, 15);
        def_dup!(DUP16, stack::dup16, 16);

        macro_rules! def_swap {
            ($op:ident, $fn:expr, $req:expr) => {
                def!(OpCode::$op, $fn, 3, $req, 0);
            };
        }
        def_swap!(SWAP1, stack::swap1, 2);
        def_swap!(SWAP2, stack::swap2, 3);
        def_swap!(SWAP3, stack::swap3, 4);
        def_swap!(SWAP4, stack::swap4, 5);
        def_swap!(SWAP5, stack::swap5, 6);
        def_swap!(SWAP6, stack::swap6, 7);
        def_swap!(SWAP7, stack::swap7, 8);
        def_swap!(SWAP8, stack::swap8, 9);
        def_swap!(SWAP9, stack::swap9, 10);
        def_swap!(SWAP10, stack::swap10, 11);
        def_swap!(SWAP11, stack::swap11, 12);
        def_swap!(SWAP12, stack::swap12, 13);
        def_swap!(SWAP13, stack::swap13, 14);
        def_swap!(SWAP14, stack::swap14, 15);
        def_swap!(SWAP15, stack::swap15, 16);
        def_swap!(SWAP16, stack::swap16, 17);

        def!(OpCode::LOG0, log::log0, 375, 2, -2);
        def!(OpCode::LOG1, log::log1, 2 * 375, 3, -3);
        def!(OpCode::LOG2, log::log2, 3 * 375, 4, -4);
        def!(OpCode::LOG3, log::log3, 4 * 375, 5, -5);
        def!(OpCode::LOG4, log::log4, 5 * 375, 6, -6);

        def!(OpCode::CREATE, call::create, 32000, 3, -2);
        def!(OpCode::CALL, call::call, config.gas_call, 7, -6);
        def!(OpCode::CALLCODE, call::callcode, config.gas_call, 7, -6);
        def!(OpCode::RETURN, control::ret, 0, 2, -2);
        if config.has_delegate_call {
            def!(
                OpCode::DELEGATECALL,
                call::delegatecall,
                config.gas_call,
                6,
                -5
            );
        }
        if config.has_create2 {
            def!(OpCode::CREATE2, call::create2, 32000, 4, -3);
        }
        if config.has_static_call {
            def!(
                OpCode::STATICCALL,
                call::staticcall,
                config.gas_call,
                6,
                -5
            );
        }
        if config.has_revert {
            def!(OpCode::REVERT, control::revert, 0, 2, -2);
        }
        def!(OpCode::INVALID, control::invalid, 0, 0, 0);
        def!(
            OpCode::SELFDESTRUCT,
            system::selfdestruct,
            config.gas_suicide,
            1,
            -1
        );

        for op in 0u8..=255 {
            if !table.defined[op as usize] {
                table.handler[op as usize] = Some(control::invalid);
            }
        }

        table
    }
}

/// Which fused PUSH+op pair a predecoded fused slot represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FusedKind {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Jump,
    Jumpi,
    Mload,
    Mstore,
    Mstore8,
}
