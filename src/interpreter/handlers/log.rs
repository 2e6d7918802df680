//! LOG0..LOG4.

use crate::analyzer::stream::Stream;
use crate::host::{Host, LogRecord};
use crate::interpreter::{Dispatch, ExecutionError, Frame};
use ethereum_types::U256;

fn do_log<H: Host>(
    frame: &mut Frame<'_, H>,
    cursor: usize,
    topic_count: usize,
) -> Result<Dispatch, ExecutionError> {
    if frame.is_static {
        return Err(ExecutionError::WriteProtection);
    }
    let offset = frame.stack.pop();
    let len = frame.stack.pop();

    let mut topics = arrayvec::ArrayVec::<U256, 4>::new();
    for _ in 0..topic_count {
        topics.push(frame.stack.pop());
    }

    if offset > U256::from(u32::MAX) || len > U256::from(u32::MAX) {
        return Err(ExecutionError::MemoryLimitExceeded);
    }
    let offset_u = offset.as_usize();
    let len_u = len.as_usize();
    if len_u > 0 {
        frame.ensure_memory(offset_u, len_u)?;
    }
    frame.charge_gas(8 * len_u as i64)?;

    let data = if len_u > 0 {
        bytes::Bytes::copy_from_slice(&frame.memory[offset_u..offset_u + len_u])
    } else {
        bytes::Bytes::new()
    };

    frame
        .host
        .emit_log(LogRecord {
            address: frame.contract_address,
            topics,
            data,
        })
        .map_err(|_| ExecutionError::WriteProtection)?;

    Ok(Dispatch::Continue(cursor + 1))
}

pub fn log0<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_log(frame, cursor, 0)
}

pub fn log1<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_log(frame, cursor, 1)
}

pub fn log2<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_log(frame, cursor, 2)
}

pub fn log3<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_log(frame, cursor, 3)
}

pub fn log4<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    do_log(frame, cursor, 4)
}
