//! SELFDESTRUCT (EIP-6780's narrower semantics are resolved host-side, see
//! `SimpleHost::mark_for_destruction`).

use crate::analyzer::stream::Stream;
use crate::common::u256_to_address;
use crate::host::{AccessStatus, Host};
use crate::interpreter::{Dispatch, ExecutionError, Frame, Halt};

const SELFDESTRUCT_NEW_ACCOUNT_COST: i64 = 25000;
const ADDITIONAL_COLD_ACCOUNT_ACCESS_COST: i64 = 2600;

pub fn selfdestruct<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    if frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }
    let beneficiary = u256_to_address(frame.stack.pop());

    if frame.host.access_account(beneficiary) == AccessStatus::Cold {
        frame.charge_gas(ADDITIONAL_COLD_ACCOUNT_ACCESS_COST)?;
    }

    let balance = frame.host.get_balance(frame.contract_address);
    if !balance.is_zero() && !frame.host.account_exists(beneficiary) {
        frame.charge_gas(SELFDESTRUCT_NEW_ACCOUNT_COST)?;
    }

    frame
        .host
        .mark_for_destruction(frame.contract_address, beneficiary);
    Ok(Dispatch::Halt(Halt::SelfDestruct(beneficiary)))
}
