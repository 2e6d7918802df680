//! STOP, JUMP, JUMPI, RETURN, REVERT, INVALID.

use crate::analyzer::stream::Stream;
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame, Halt};
use ethereum_types::U256;

pub fn stop<H: Host>(
    _frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    Ok(Dispatch::Halt(Halt::Stop))
}

pub fn invalid<H: Host>(
    _frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    Err(ExecutionError::InvalidOpcode)
}

/// Resolves a popped destination to the handler-slot cursor of its `JUMPDEST`.
/// The destination must land exactly on a `JUMPDEST` in the original bytecode;
/// the jump table only ever contains such positions, so any miss is invalid.
fn resolve_jump<H: Host>(stream: &Stream<H>, dest: U256) -> Result<usize, ExecutionError> {
    if dest > U256::from(usize::MAX) {
        return Err(ExecutionError::InvalidJump);
    }
    stream
        .jump_table
        .lookup(dest.as_usize())
        .ok_or(ExecutionError::InvalidJump)
}

pub fn jump<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = frame.stack.pop();
    let target = resolve_jump(stream, dest)?;
    Ok(Dispatch::Continue(target))
}

pub fn jumpi<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = frame.stack.pop();
    let cond = frame.stack.pop();
    if cond.is_zero() {
        return Ok(Dispatch::Continue(cursor + 1));
    }
    let target = resolve_jump(stream, dest)?;
    Ok(Dispatch::Continue(target))
}

pub fn ret<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let len = frame.stack.pop();
    let data = read_output(frame, offset, len)?;
    Ok(Dispatch::Halt(Halt::Return(data)))
}

pub fn revert<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    _cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let len = frame.stack.pop();
    let data = read_output(frame, offset, len)?;
    Ok(Dispatch::Halt(Halt::Revert(data)))
}

fn read_output<H: Host>(
    frame: &mut Frame<'_, H>,
    offset: U256,
    len: U256,
) -> Result<bytes::Bytes, ExecutionError> {
    if len.is_zero() {
        return Ok(bytes::Bytes::new());
    }
    if offset > U256::from(u32::MAX) || len > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset = offset.as_usize();
    let len = len.as_usize();
    frame.ensure_memory(offset, len)?;
    Ok(bytes::Bytes::copy_from_slice(
        &frame.memory[offset..offset + len],
    ))
}
