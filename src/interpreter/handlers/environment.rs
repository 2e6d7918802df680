//! Transaction/block/account context opcodes: ADDRESS, BALANCE, ORIGIN,
//! CALLER, CALLVALUE, GASPRICE, EXTCODESIZE, EXTCODECOPY, EXTCODEHASH,
//! BLOCKHASH, COINBASE, TIMESTAMP, NUMBER, DIFFICULTY, GASLIMIT, CHAINID,
//! SELFBALANCE, BASEFEE, BLOBHASH, BLOBBASEFEE.

use crate::analyzer::stream::Stream;
use crate::common::address_to_u256;
use crate::config::COLD_ACCOUNT_ACCESS_COST;
use crate::host::{AccessStatus, Host};
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;

/// EIP-2929: charges the cold-access surcharge on top of the warm base cost
/// the opcode already paid via the metadata table.
fn charge_access<H: Host>(frame: &mut Frame<'_, H>, status: AccessStatus) -> Result<(), ExecutionError> {
    if status == AccessStatus::Cold {
        frame.charge_gas((COLD_ACCOUNT_ACCESS_COST - crate::config::WARM_STORAGE_READ_COST) as i64)?;
    }
    Ok(())
}

pub fn address<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(address_to_u256(frame.contract_address));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn balance<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let addr = crate::common::u256_to_address(frame.stack.pop());
    let status = frame.host.access_account(addr);
    charge_access(frame, status)?;
    let balance = frame.host.get_balance(addr);
    frame.stack.push(balance);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn origin<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let origin = frame.host.tx_origin();
    frame.stack.push(address_to_u256(origin));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn caller<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(address_to_u256(frame.caller));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn callvalue<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(frame.value);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn gasprice<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let price = frame.host.tx_gas_price();
    frame.stack.push(price);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn extcodesize<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let addr = crate::common::u256_to_address(frame.stack.pop());
    let status = frame.host.access_account(addr);
    charge_access(frame, status)?;
    let size = frame.host.get_code_size(addr);
    frame.stack.push(U256::from(size));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn extcodehash<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let addr = crate::common::u256_to_address(frame.stack.pop());
    let status = frame.host.access_account(addr);
    charge_access(frame, status)?;
    if !frame.host.account_exists(addr) {
        frame.stack.push(U256::zero());
        return Ok(Dispatch::Continue(cursor + 1));
    }
    let hash = frame.host.get_code_hash(addr);
    frame.stack.push(U256::from_big_endian(hash.as_bytes()));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn extcodecopy<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let addr = crate::common::u256_to_address(frame.stack.pop());
    let dest = super::memory::checked_usize(frame.stack.pop())?;
    let src = frame.stack.pop();
    let len = super::memory::checked_usize(frame.stack.pop())?;

    let status = frame.host.access_account(addr);
    charge_access(frame, status)?;

    if len == 0 {
        return Ok(Dispatch::Continue(cursor + 1));
    }
    frame.ensure_memory(dest, len)?;
    frame.charge_gas(3 * crate::state::num_words(len) as i64)?;

    let src = src.min(U256::from(usize::MAX)).as_usize();
    let mut buf = vec![0u8; len];
    frame.host.copy_code(addr, src, &mut buf);
    frame.memory[dest..dest + len].copy_from_slice(&buf);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn blockhash<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let number = frame.stack.pop();
    let hash = if number > U256::from(u64::MAX) {
        U256::zero()
    } else {
        frame.host.blockhash(number.as_u64())
    };
    frame.stack.push(hash);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn coinbase<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(address_to_u256(ctx.coinbase));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn timestamp<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(U256::from(ctx.timestamp));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn number<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(U256::from(ctx.number));
    Ok(Dispatch::Continue(cursor + 1))
}

/// DIFFICULTY pre-Merge, PREVRANDAO from the Merge onward; this crate carries
/// both semantics in the same field since it never forks on Merge explicitly.
pub fn difficulty<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(ctx.difficulty);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn gaslimit<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(U256::from(ctx.gas_limit));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn chainid<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(ctx.chain_id);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn selfbalance<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let balance = frame.host.get_balance(frame.contract_address);
    frame.stack.push(balance);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn basefee<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(ctx.base_fee);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn blobhash<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let index = frame.stack.pop();
    let hash = if index > U256::from(usize::MAX) {
        U256::zero()
    } else {
        frame.host.blob_hash(index.as_usize())
    };
    frame.stack.push(hash);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn blobbasefee<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let ctx = frame.host.block_context();
    frame.stack.push(ctx.blob_base_fee);
    Ok(Dispatch::Continue(cursor + 1))
}
