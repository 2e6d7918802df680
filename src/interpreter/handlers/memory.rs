//! MLOAD, MSTORE, MSTORE8, MCOPY, KECCAK256, and the *COPY family.
//! Ported from `evmodin::instructions::memory`.

use crate::analyzer::stream::Stream;
use crate::host::Host;
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;
use sha3::{Digest, Keccak256};

pub fn mload<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let offset = checked_usize(offset)?;
    frame.ensure_memory(offset, 32)?;
    let mut buf = [0u8; 32];
    buf.copy_from_slice(&frame.memory[offset..offset + 32]);
    frame.stack.push(U256::from_big_endian(&buf));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn mstore<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let value = frame.stack.pop();
    let offset = checked_usize(offset)?;
    frame.ensure_memory(offset, 32)?;
    let mut buf = [0u8; 32];
    value.to_big_endian(&mut buf);
    frame.memory[offset..offset + 32].copy_from_slice(&buf);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn mstore8<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let value = frame.stack.pop();
    let offset = checked_usize(offset)?;
    frame.ensure_memory(offset, 1)?;
    frame.memory[offset] = value.low_u32() as u8;
    Ok(Dispatch::Continue(cursor + 1))
}

/// EIP-5656.
pub fn mcopy<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = checked_usize(frame.stack.pop())?;
    let src = checked_usize(frame.stack.pop())?;
    let len = checked_usize(frame.stack.pop())?;
    if len == 0 {
        return Ok(Dispatch::Continue(cursor + 1));
    }
    let max_end = dest.max(src) + len;
    frame.ensure_memory(0, max_end)?;
    frame.charge_gas(3 * crate::state::num_words(len) as i64)?;
    frame.memory.copy_within(src..src + len, dest);
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn keccak256<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = checked_usize(frame.stack.pop())?;
    let len = checked_usize(frame.stack.pop())?;
    frame.ensure_memory(offset, len)?;
    frame.charge_gas(6 * crate::state::num_words(len) as i64)?;
    let hash = Keccak256::digest(&frame.memory[offset..offset + len]);
    frame.stack.push(U256::from_big_endian(&hash));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn calldataload<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let offset = frame.stack.pop();
    let mut buf = [0u8; 32];
    if offset < U256::from(frame.input.len()) {
        let offset = offset.as_usize();
        let available = frame.input.len() - offset;
        let copy_len = available.min(32);
        buf[..copy_len].copy_from_slice(&frame.input[offset..offset + copy_len]);
    }
    frame.stack.push(U256::from_big_endian(&buf));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn calldatasize<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::from(frame.input.len()));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn calldatacopy<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = checked_usize(frame.stack.pop())?;
    let src = frame.stack.pop();
    let len = checked_usize(frame.stack.pop())?;
    let input = frame.input.clone();
    copy_into_memory(frame, dest, src, len, &input, |input, off, n| {
        let input_len = input.len();
        if off >= input_len {
            vec![0u8; n]
        } else {
            let avail = (input_len - off).min(n);
            let mut buf = input[off..off + avail].to_vec();
            buf.resize(n, 0);
            buf
        }
    })?;
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn codesize<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::from(frame.code.len()));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn codecopy<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = checked_usize(frame.stack.pop())?;
    let src = frame.stack.pop();
    let len = checked_usize(frame.stack.pop())?;
    let code = frame.code.clone();
    copy_into_memory(frame, dest, src, len, &code, |code, off, n| {
        let code_len = code.len();
        if off >= code_len {
            vec![0u8; n]
        } else {
            let avail = (code_len - off).min(n);
            let mut buf = code[off..off + avail].to_vec();
            buf.resize(n, 0);
            buf
        }
    })?;
    Ok(Dispatch::Continue(cursor + 1))
}

pub(crate) fn checked_usize(v: U256) -> Result<usize, ExecutionError> {
    if v > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    Ok(v.as_usize())
}

fn copy_into_memory<H: Host>(
    frame: &mut Frame<'_, H>,
    dest: usize,
    src: U256,
    len: usize,
    source: &[u8],
    make_bytes: impl FnOnce(&[u8], usize, usize) -> Vec<u8>,
) -> Result<(), ExecutionError> {
    if len == 0 {
        return Ok(());
    }
    frame.ensure_memory(dest, len)?;
    frame.charge_gas(3 * crate::state::num_words(len) as i64)?;
    let src = src.min(U256::from(usize::MAX)).as_usize();
    let bytes = make_bytes(source, src, len);
    frame.memory[dest..dest + len].copy_from_slice(&bytes);
    Ok(())
}

pub fn returndatasize<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::from(frame.return_data.len()));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn returndatacopy<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let dest = checked_usize(frame.stack.pop())?;
    let src = frame.stack.pop();
    let len = checked_usize(frame.stack.pop())?;
    if src.saturating_add(U256::from(len)) > U256::from(frame.return_data.len()) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let src = src.as_usize();
    if len == 0 {
        return Ok(Dispatch::Continue(cursor + 1));
    }
    frame.ensure_memory(dest, len)?;
    frame.charge_gas(3 * crate::state::num_words(len) as i64)?;
    let data = frame.return_data[src..src + len].to_vec();
    frame.memory[dest..dest + len].copy_from_slice(&data);
    Ok(Dispatch::Continue(cursor + 1))
}
