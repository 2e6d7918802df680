//! ADD..SIGNEXTEND, ported from `evmodin::instructions::arithmetic`.

use crate::analyzer::stream::Stream;
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;
use i256::I256;

macro_rules! binop {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name<H: Host>(
            frame: &mut Frame<'_, H>,
            _stream: &Stream<H>,
            cursor: usize,
        ) -> Result<Dispatch, ExecutionError> {
            let $a = frame.stack.pop();
            let $b = frame.stack.pop();
            frame.stack.push($body);
            Ok(Dispatch::Continue(cursor + 1))
        }
    };
}

binop!(add, |a, b| a.overflowing_add(b).0);
binop!(sub, |a, b| a.overflowing_sub(b).0);
binop!(mul, |a, b| a.overflowing_mul(b).0);

pub fn div<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    frame
        .stack
        .push(if b.is_zero() { U256::zero() } else { a / b });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn sdiv<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a: I256 = frame.stack.pop().into();
    let b: I256 = frame.stack.pop().into();
    frame.stack.push((a / b).into());
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn modulo<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    frame
        .stack
        .push(if b.is_zero() { U256::zero() } else { a % b });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn smod<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a: I256 = frame.stack.pop().into();
    let b: I256 = frame.stack.pop().into();
    frame.stack.push(if b == I256::zero() {
        U256::zero()
    } else {
        (a % b).into()
    });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn addmod<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    let m = frame.stack.pop();
    frame.stack.push(if m.is_zero() {
        U256::zero()
    } else {
        let a = to_u512(a);
        let b = to_u512(b);
        let m = to_u512(m);
        from_u512((a + b) % m)
    });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn mulmod<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    let m = frame.stack.pop();
    frame.stack.push(if m.is_zero() {
        U256::zero()
    } else {
        let a = to_u512(a);
        let b = to_u512(b);
        let m = to_u512(m);
        from_u512((a * b) % m)
    });
    Ok(Dispatch::Continue(cursor + 1))
}

fn to_u512(v: U256) -> ethereum_types::U512 {
    ethereum_types::U512(
        [v.0[0], v.0[1], v.0[2], v.0[3], 0, 0, 0, 0],
    )
}

fn from_u512(v: ethereum_types::U512) -> U256 {
    U256([v.0[0], v.0[1], v.0[2], v.0[3]])
}

pub fn signextend<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    let result = if a < U256::from(32) {
        let bit_index = (8 * a.low_u32() + 7) as usize;
        let bit = b.bit(bit_index);
        let mask = (U256::one() << bit_index) - U256::one();
        if bit {
            b | !mask
        } else {
            b & mask
        }
    } else {
        b
    };
    frame.stack.push(result);
    Ok(Dispatch::Continue(cursor + 1))
}

/// EXP, with its dynamic per-byte gas component (gas class is dynamic, not
/// folded into block-entry accounting per §4.2.3).
pub fn exp<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let base = frame.stack.pop();
    let power = frame.stack.pop();

    let byte_len = 32 - power.leading_zeros() as usize / 8;
    if byte_len > 0 {
        frame.charge_gas((byte_len as u64 * 50) as i64)?;
    }

    frame.stack.push(base.overflowing_pow(power).0);
    Ok(Dispatch::Continue(cursor + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addmod_wraps_via_wider_arithmetic() {
        let a = U256::MAX;
        let b = U256::from(2u64);
        let m = U256::from(3u64);
        let a512 = to_u512(a);
        let b512 = to_u512(b);
        let m512 = to_u512(m);
        let result = from_u512((a512 + b512) % m512);
        assert_eq!(result, (a % m + b % m) % m % m);
    }
}
