//! The threaded-dispatch interpreter (§4.3): a trampoline loop over
//! tail-chained handler invocations.

pub mod handlers;

use crate::analyzer::stream::{BlockMeta, Slot, Stream};
use crate::common::Address;
use crate::host::Host;
use bytes::Bytes;
use derive_more::{Display, Error};

/// Terminal, non-error outcomes of running a stream to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    Stop,
    Return(Bytes),
    Revert(Bytes),
    SelfDestruct(Address),
}

/// Runtime faults. Every variant causes the current frame's journal segment
/// to be reverted and propagates as `success = false` to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum ExecutionError {
    #[display(fmt = "out of gas")]
    OutOfGas,
    #[display(fmt = "invalid opcode")]
    InvalidOpcode,
    #[display(fmt = "stack underflow")]
    StackUnderflow,
    #[display(fmt = "stack overflow")]
    StackOverflow,
    #[display(fmt = "write protection")]
    WriteProtection,
    #[display(fmt = "invalid jump destination")]
    InvalidJump,
    #[display(fmt = "memory limit exceeded")]
    MemoryLimitExceeded,
    #[display(fmt = "call depth exceeded")]
    CallDepthExceeded,
}

/// What a handler tells the trampoline to do next.
pub enum Dispatch {
    Continue(usize),
    Halt(Halt),
}

/// Function pointer signature every predecoded handler slot holds. `cursor`
/// points at the handler's own slot; the handler computes and returns the
/// next cursor itself (`cursor + 1` with no metadata, `cursor + 2` with one
/// metadata slot), it never returns an opcode to a central switch.
pub type Handler<H> = fn(&mut Frame<'_, H>, &Stream<H>, usize) -> Result<Dispatch, ExecutionError>;

/// One call frame: operand stack, memory, gas, and the call-scoped context
/// the handlers mutate. Borrows the host for the lifetime of execution.
pub struct Frame<'a, H: Host> {
    pub stack: crate::state::Stack,
    pub memory: crate::state::Memory,
    pub gas_remaining: i64,
    pub contract_address: Address,
    pub caller: Address,
    pub value: crate::common::Word,
    pub input: Bytes,
    /// The executing contract's own raw bytecode, for CODESIZE/CODECOPY.
    pub code: Bytes,
    pub return_data: Bytes,
    pub is_static: bool,
    pub depth: u32,
    pub host: &'a mut H,
}

impl<'a, H: Host> Frame<'a, H> {
    /// Memory limit, fixed at 16 MiB per the default configuration; a real
    /// embedder wanting a different ceiling would thread `HardforkConfig`
    /// through the frame, left as future work since the analyzer is the only
    /// other consumer of the config today.
    pub const MEMORY_LIMIT: usize = 16 * 1024 * 1024;

    /// Grows memory to the smallest 32-byte-aligned size containing
    /// `offset + len`, charging the quadratic expansion cost.
    pub fn ensure_memory(&mut self, offset: usize, len: usize) -> Result<(), ExecutionError> {
        if len == 0 {
            return Ok(());
        }
        let end = offset
            .checked_add(len)
            .ok_or(ExecutionError::MemoryLimitExceeded)?;
        if end <= self.memory.len() {
            return Ok(());
        }
        let new_words = crate::state::num_words(end);
        let new_size = new_words * 32;
        if new_size > Self::MEMORY_LIMIT {
            return Err(ExecutionError::MemoryLimitExceeded);
        }
        let old_words = crate::state::num_words(self.memory.len());
        let cost_before = memory_gas_cost(old_words);
        let cost_after = memory_gas_cost(new_words);
        let additional = cost_after.saturating_sub(cost_before);
        self.charge_gas(additional as i64)?;
        self.memory.resize(new_size, 0);
        Ok(())
    }

    pub fn charge_gas(&mut self, amount: i64) -> Result<(), ExecutionError> {
        self.gas_remaining -= amount;
        if self.gas_remaining < 0 {
            return Err(ExecutionError::OutOfGas);
        }
        Ok(())
    }
}

/// The well-known quadratic memory-expansion gas formula.
pub fn memory_gas_cost(words: usize) -> u64 {
    let words = words as u64;
    3 * words + (words * words) / 512
}

fn enter_block<H: Host>(frame: &mut Frame<'_, H>, meta: &BlockMeta) -> Result<(), ExecutionError> {
    frame.charge_gas(meta.gas as i64)?;
    if frame.stack.len() < meta.min_stack as usize {
        return Err(ExecutionError::StackUnderflow);
    }
    if frame.stack.len() + meta.max_stack_growth as usize > crate::state::Stack::limit() {
        return Err(ExecutionError::StackOverflow);
    }
    Ok(())
}

/// Run a predecoded stream to completion, charging block 0's gas/stack
/// checkpoint before entering the tight dispatch loop.
pub fn run<H: Host>(frame: &mut Frame<'_, H>, stream: &Stream<H>) -> Result<Halt, ExecutionError> {
    enter_block(frame, &stream.entry_block)?;

    let mut cursor = 0usize;
    loop {
        let handler = match &stream.slots[cursor] {
            Slot::Handler(h) => *h,
            _ => unreachable!("cursor must always point at a handler slot"),
        };
        match handler(frame, stream, cursor)? {
            Dispatch::Continue(next) => cursor = next,
            Dispatch::Halt(h) => return Ok(h),
        }
    }
}

pub(crate) use enter_block as enter_block_for_jumpdest;

/// Synthetic slot the analyzer inserts after a fallthrough terminator
/// (a not-taken `JUMPI`, or the continuation after a CALL/CREATE family op)
/// when that continuation isn't already headed by a `JUMPDEST`. Charges and
/// validates the following block's checkpoint, then falls through.
fn checkpoint<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let meta = match &stream.slots[cursor + 1] {
        Slot::BlockMeta(m) => *m,
        _ => unreachable!("checkpoint handler without its metadata slot"),
    };
    enter_block(frame, &meta)?;
    Ok(Dispatch::Continue(cursor + 2))
}

pub(crate) use checkpoint as block_checkpoint;
