//! SLOAD, SSTORE (EIP-2929/3529 cost ladder), TLOAD, TSTORE (EIP-1153).

use crate::analyzer::stream::Stream;
use crate::host::{AccessStatus, Host};
use crate::interpreter::{Dispatch, ExecutionError, Frame};

const COLD_SLOAD_COST: i64 = 2100;
const WARM_STORAGE_READ_COST: i64 = 100;
const SSTORE_SET_GAS: i64 = 20000;
const SSTORE_RESET_GAS: i64 = 2900;
/// EIP-2200: SSTORE forbidden once gas remaining drops to the call stipend.
const SSTORE_STIPEND_FLOOR: i64 = 2300;

pub fn sload<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let key = frame.stack.pop();
    let status = frame.host.access_storage(frame.contract_address, key);
    if status == AccessStatus::Cold {
        frame.charge_gas(COLD_SLOAD_COST - WARM_STORAGE_READ_COST)?;
    }
    let value = frame.host.get_storage(frame.contract_address, key);
    frame.stack.push(value);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn sstore<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    if frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }
    if frame.gas_remaining <= SSTORE_STIPEND_FLOOR {
        return Err(ExecutionError::OutOfGas);
    }

    let key = frame.stack.pop();
    let value = frame.stack.pop();

    let status = frame.host.access_storage(frame.contract_address, key);
    let mut cost = if status == AccessStatus::Cold {
        COLD_SLOAD_COST
    } else {
        0
    };

    let current = frame.host.get_storage(frame.contract_address, key);
    cost += if current == value {
        WARM_STORAGE_READ_COST
    } else if current.is_zero() {
        SSTORE_SET_GAS
    } else {
        SSTORE_RESET_GAS
    };
    frame.charge_gas(cost)?;

    frame.host.set_storage(frame.contract_address, key, value);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn tload<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let key = frame.stack.pop();
    let value = frame.host.get_transient_storage(frame.contract_address, key);
    frame.stack.push(value);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn tstore<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    if frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }
    let key = frame.stack.pop();
    let value = frame.stack.pop();
    frame
        .host
        .set_transient_storage(frame.contract_address, key, value);
    Ok(Dispatch::Continue(cursor + 1))
}
