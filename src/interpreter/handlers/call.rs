//! CALL, CALLCODE, DELEGATECALL, STATICCALL, CREATE, CREATE2.
//!
//! Ported from `evmodin::instructions::call`'s `do_call!`/`do_create!` macros,
//! made synchronous: instead of yielding an `Interrupt` and resuming with a
//! `ResumeData`, each step calls straight through to [`Host`].

use crate::analyzer::stream::Stream;
use crate::common::{address_to_u256, u256_to_address};
use crate::host::{AccessStatus, CallParams, Host};
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use bytes::Bytes;
use ethereum_types::U256;

const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: i64 = 2500;
const CALL_VALUE_COST: i64 = 9000;
const CALL_NEW_ACCOUNT_COST: i64 = 25000;
const CALL_STIPEND: u64 = 2300;

#[derive(Clone, Copy)]
enum CallKind {
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
}

fn read_memory_range<H: Host>(
    frame: &mut Frame<'_, H>,
    offset: U256,
    size: U256,
) -> Result<Bytes, ExecutionError> {
    if size.is_zero() {
        return Ok(Bytes::new());
    }
    if offset > U256::from(u32::MAX) || size > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset = offset.as_usize();
    let size = size.as_usize();
    frame.ensure_memory(offset, size)?;
    Ok(Bytes::copy_from_slice(&frame.memory[offset..offset + size]))
}

fn do_call<H: Host>(
    frame: &mut Frame<'_, H>,
    cursor: usize,
    kind: CallKind,
) -> Result<Dispatch, ExecutionError> {
    let gas = frame.stack.pop();
    let dst = u256_to_address(frame.stack.pop());
    let value = if frame.is_static || matches!(kind, CallKind::DelegateCall | CallKind::StaticCall)
    {
        U256::zero()
    } else {
        frame.stack.pop()
    };
    let has_value = !value.is_zero();
    let input_offset = frame.stack.pop();
    let input_size = frame.stack.pop();
    let output_offset = frame.stack.pop();
    let output_size = frame.stack.pop();

    frame.stack.push(U256::zero());

    if frame.host.access_account(dst) == AccessStatus::Cold {
        frame.charge_gas(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }

    if matches!(kind, CallKind::Call) && has_value && frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }

    let input = read_memory_range(frame, input_offset, input_size)?;
    read_memory_range(frame, output_offset, U256::zero())?;
    if !output_size.is_zero() {
        if output_offset > U256::from(u32::MAX) || output_size > U256::from(u32::MAX) {
            return Err(ExecutionError::MemoryLimitExceeded);
        }
        frame.ensure_memory(output_offset.as_usize(), output_size.as_usize())?;
    }

    let mut cost: i64 = if has_value { CALL_VALUE_COST } else { 0 };
    if matches!(kind, CallKind::Call) && has_value && !frame.host.account_exists(dst) {
        cost += CALL_NEW_ACCOUNT_COST;
    }
    frame.charge_gas(cost)?;

    let mut child_gas = if gas > U256::from(i64::MAX) {
        i64::MAX as u64
    } else {
        gas.as_u64()
    };
    let forwarding_cap = frame.gas_remaining.max(0) as u64 - (frame.gas_remaining.max(0) as u64) / 64;
    child_gas = child_gas.min(forwarding_cap);
    if has_value {
        child_gas += CALL_STIPEND;
        frame.charge_gas(-(CALL_STIPEND as i64))?;
    }

    frame.return_data = Bytes::new();

    if frame.depth + 1 >= crate::host::MAX_CALL_DEPTH
        || (has_value && frame.host.get_balance(frame.contract_address) < value)
    {
        return Ok(Dispatch::Continue(cursor + 1));
    }

    let params = match kind {
        CallKind::Call => CallParams::Call {
            caller: frame.contract_address,
            to: dst,
            value,
            input,
            gas: child_gas,
        },
        CallKind::CallCode => CallParams::CallCode {
            caller: frame.contract_address,
            to: dst,
            value,
            input,
            gas: child_gas,
        },
        CallKind::DelegateCall => CallParams::DelegateCall {
            caller: frame.caller,
            context: frame.contract_address,
            to: dst,
            input,
            gas: child_gas,
        },
        CallKind::StaticCall => CallParams::StaticCall {
            caller: frame.contract_address,
            to: dst,
            input,
            gas: child_gas,
        },
    };

    let result = frame.host.inner_call(params);
    frame.return_data = result.output.clone();
    *frame.stack.get_mut(0) = if result.success {
        U256::one()
    } else {
        U256::zero()
    };

    if !output_size.is_zero() {
        let dest = output_offset.as_usize();
        let copy_len = output_size.as_usize().min(result.output.len());
        if copy_len > 0 {
            frame.memory[dest..dest + copy_len].copy_from_slice(&result.output[..copy_len]);
        }
    }

    let gas_used = child_gas.saturating_sub(result.gas_left);
    frame.charge_gas(gas_used as i64)?;

    Ok(Dispatch::Continue(cursor + 1))
}

pub fn call<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_call(frame, cursor, CallKind::Call)
}

pub fn callcode<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_call(frame, cursor, CallKind::CallCode)
}

pub fn delegatecall<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_call(frame, cursor, CallKind::DelegateCall)
}

pub fn staticcall<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_call(frame, cursor, CallKind::StaticCall)
}

fn do_create<H: Host>(
    frame: &mut Frame<'_, H>,
    cursor: usize,
    create2: bool,
) -> Result<Dispatch, ExecutionError> {
    if frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }

    let endowment = frame.stack.pop();
    let init_code_offset = frame.stack.pop();
    let init_code_size = frame.stack.pop();
    let init_code = read_memory_range(frame, init_code_offset, init_code_size)?;

    let salt = if create2 {
        let salt = frame.stack.pop();
        frame.charge_gas(6 * crate::state::num_words(init_code.len()) as i64)?;
        Some(salt)
    } else {
        None
    };

    frame.stack.push(U256::zero());
    frame.return_data = Bytes::new();

    if frame.depth + 1 >= crate::host::MAX_CALL_DEPTH
        || (!endowment.is_zero() && frame.host.get_balance(frame.contract_address) < endowment)
    {
        return Ok(Dispatch::Continue(cursor + 1));
    }

    let gas_remaining = frame.gas_remaining.max(0) as u64;
    let child_gas = gas_remaining - gas_remaining / 64;

    let params = match salt {
        Some(salt) => CallParams::Create2 {
            caller: frame.contract_address,
            value: endowment,
            init_code,
            salt,
            gas: child_gas,
        },
        None => CallParams::Create {
            caller: frame.contract_address,
            value: endowment,
            init_code,
            gas: child_gas,
        },
    };

    let result = frame.host.inner_call(params);
    frame.charge_gas(child_gas.saturating_sub(result.gas_left) as i64)?;
    frame.return_data = result.output.clone();

    if result.success && result.output.len() == 20 {
        *frame.stack.get_mut(0) = address_to_u256(crate::common::Address::from_slice(
            &result.output,
        ));
    }

    Ok(Dispatch::Continue(cursor + 1))
}

pub fn create<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_create(frame, cursor, false)
}

pub fn create2<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_create(frame, cursor, true)
}
