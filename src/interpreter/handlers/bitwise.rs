//! BYTE, SHL, SHR, SAR — ported from `evmodin::instructions::bitwise`.

use crate::analyzer::stream::Stream;
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;
use i256::{Sign, I256};

pub fn byte<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();

    let mut ret = U256::zero();
    for i in 0..256 {
        if i < 8 && a < 32.into() {
            let o: usize = a.as_usize();
            let t = 255 - (7 - i + 8 * o);
            let bit_mask = U256::one() << t;
            let value = (b & bit_mask) >> t;
            ret = ret.overflowing_add(value << i).0;
        }
    }
    frame.stack.push(ret);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn shl<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let shift = frame.stack.pop();
    let value = frame.stack.pop();
    let ret = if value.is_zero() || shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.as_usize()
    };
    frame.stack.push(ret);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn shr<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let shift = frame.stack.pop();
    let value = frame.stack.pop();
    let ret = if value.is_zero() || shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.as_usize()
    };
    frame.stack.push(ret);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn sar<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let shift = frame.stack.pop();
    let value = I256::from(frame.stack.pop());

    let ret = if value == I256::zero() || shift >= U256::from(256) {
        match value.0 {
            Sign::Plus | Sign::NoSign => U256::zero(),
            Sign::Minus => I256(Sign::Minus, U256::one()).into(),
        }
    } else {
        let shift = shift.as_usize();
        match value.0 {
            Sign::Plus | Sign::NoSign => value.1 >> shift,
            Sign::Minus => {
                let shifted = ((value.1.overflowing_sub(U256::one()).0) >> shift)
                    .overflowing_add(U256::one())
                    .0;
                I256(Sign::Minus, shifted).into()
            }
        }
    };
    frame.stack.push(ret);
    Ok(Dispatch::Continue(cursor + 1))
}
