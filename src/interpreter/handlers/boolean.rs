//! Comparison and bitwise-logic opcodes: LT, GT, SLT, SGT, EQ, ISZERO, AND,
//! OR, XOR, NOT. Ported from `evmodin::instructions::boolean`.

use crate::analyzer::stream::Stream;
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;
use i256::I256;

macro_rules! cmp {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name<H: Host>(
            frame: &mut Frame<'_, H>,
            _stream: &Stream<H>,
            cursor: usize,
        ) -> Result<Dispatch, ExecutionError> {
            let $a = frame.stack.pop();
            let $b = frame.stack.pop();
            frame
                .stack
                .push(if $body { U256::one() } else { U256::zero() });
            Ok(Dispatch::Continue(cursor + 1))
        }
    };
}

cmp!(lt, |a, b| a.lt(&b));
cmp!(gt, |a, b| a.gt(&b));
cmp!(eq, |a, b| a.eq(&b));

pub fn slt<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a: I256 = frame.stack.pop().into();
    let b: I256 = frame.stack.pop().into();
    frame
        .stack
        .push(if a.lt(&b) { U256::one() } else { U256::zero() });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn sgt<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a: I256 = frame.stack.pop().into();
    let b: I256 = frame.stack.pop().into();
    frame
        .stack
        .push(if a.gt(&b) { U256::one() } else { U256::zero() });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn iszero<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    frame
        .stack
        .push(if a.is_zero() { U256::one() } else { U256::zero() });
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn and<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    frame.stack.push(a & b);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn or<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    frame.stack.push(a | b);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn xor<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    let b = frame.stack.pop();
    frame.stack.push(a ^ b);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn not<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let a = frame.stack.pop();
    frame.stack.push(!a);
    Ok(Dispatch::Continue(cursor + 1))
}
