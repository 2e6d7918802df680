//! Fused PUSH+op handler pairs (analyzer §4.2.4, opt-in via
//! `AnalyzerOptions::fuse`). Each fused slot reuses the ordinary PUSH
//! metadata slot (`Slot::PushInline`/`Slot::PushPointer`) instead of
//! introducing a parallel metadata representation: the fused handler reads
//! the literal directly rather than pushing it and letting the next handler
//! pop it back off.
//!
//! Covers exactly the pairs the analyzer is allowed to fuse:
//! `{ADD,SUB,MUL,AND,OR,XOR}`, `{JUMP,JUMPI}`, `{MLOAD,MSTORE,MSTORE8}`.

use crate::analyzer::stream::{Slot, Stream};
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;

fn operand<H: Host>(stream: &Stream<H>, cursor: usize) -> U256 {
    match stream.meta_at(cursor) {
        Slot::PushInline(v) => U256::from(*v),
        Slot::PushPointer(i) => stream.side_constants[*i],
        _ => unreachable!("fused handler without its PUSH metadata slot"),
    }
}

macro_rules! fused_binop {
    ($name:ident, |$a:ident, $b:ident| $body:expr) => {
        pub fn $name<H: Host>(
            frame: &mut Frame<'_, H>,
            stream: &Stream<H>,
            cursor: usize,
        ) -> Result<Dispatch, ExecutionError> {
            let $b = operand(stream, cursor);
            let $a = frame.stack.pop();
            frame.stack.push($body);
            Ok(Dispatch::Continue(cursor + 2))
        }
    };
}

fused_binop!(push_add, |a, b| a.overflowing_add(b).0);
fused_binop!(push_sub, |a, b| a.overflowing_sub(b).0);
fused_binop!(push_mul, |a, b| a.overflowing_mul(b).0);
fused_binop!(push_and, |a, b| a & b);
fused_binop!(push_or, |a, b| a | b);
fused_binop!(push_xor, |a, b| a ^ b);

pub fn push_jump<H: Host>(
    _frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = operand(stream, cursor);
    if dest > U256::from(usize::MAX) {
        return Err(ExecutionError::InvalidJump);
    }
    let target = stream
        .jump_table
        .lookup(dest.as_usize())
        .ok_or(ExecutionError::InvalidJump)?;
    Ok(Dispatch::Continue(target))
}

pub fn push_jumpi<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = operand(stream, cursor);
    let cond = frame.stack.pop();
    if cond.is_zero() {
        return Ok(Dispatch::Continue(cursor + 2));
    }
    if dest > U256::from(usize::MAX) {
        return Err(ExecutionError::InvalidJump);
    }
    let target = stream
        .jump_table
        .lookup(dest.as_usize())
        .ok_or(ExecutionError::InvalidJump)?;
    Ok(Dispatch::Continue(target))
}

pub fn push_mload<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = operand(stream, cursor);
    if offset > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset = offset.as_usize();
    frame.ensure_memory(offset, 32)?;
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&frame.memory[offset..offset + 32]);
    frame.stack.push(U256::from_big_endian(&buf));
    Ok(Dispatch::Continue(cursor + 2))
}

pub fn push_mstore<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = operand(stream, cursor);
    let value = frame.stack.pop();
    if offset > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset = offset.as_usize();
    frame.ensure_memory(offset, 32)?;
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    frame.memory[offset..offset + 32].copy_from_slice(&buf);
    Ok(Dispatch::Continue(cursor + 2))
}

pub fn push_mstore8<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = operand(stream, cursor);
    let value = frame.stack.pop();
    if offset > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset = offset.as_usize();
    frame.ensure_memory(offset, 1)?;
    frame.memory[offset] = value.low_u32() as u8;
    Ok(Dispatch::Continue(cursor + 2))
}
