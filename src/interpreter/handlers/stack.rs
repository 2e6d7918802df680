//! Stack manipulation: POP, PUSH family, DUP1..16, SWAP1..16, PC, MSIZE, GAS,
//! and JUMPDEST's block-entry accounting.

use crate::analyzer::stream::{Slot, Stream};
use crate::host::Host;
use crate::interpreter::{enter_block_for_jumpdest, Dispatch, ExecutionError, Frame};
use ethereum_types::U256;

pub fn pop<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.pop();
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn push0<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::zero());
    Ok(Dispatch::Continue(cursor + 1))
}

/// Literal fits in 64 bits; read directly from the inline metadata slot.
pub fn push_inline<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let v = match stream.meta_at(cursor) {
        Slot::PushInline(v) => *v,
        _ => unreachable!("PUSH handler without its metadata slot"),
    };
    frame.stack.push(U256::from(v));
    Ok(Dispatch::Continue(cursor + 2))
}

/// Literal did not fit in 64 bits; dereference the side constant pool.
pub fn push_pointer<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let idx = match stream.meta_at(cursor) {
        Slot::PushPointer(i) => *i,
        _ => unreachable!("PUSH handler without its metadata slot"),
    };
    frame.stack.push(stream.side_constants[idx]);
    Ok(Dispatch::Continue(cursor + 2))
}

pub fn pc<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let pc = match stream.meta_at(cursor) {
        Slot::PcMeta(pc) => *pc,
        _ => unreachable!("PC handler without its metadata slot"),
    };
    frame.stack.push(U256::from(pc));
    Ok(Dispatch::Continue(cursor + 2))
}

pub fn msize<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::from(frame.memory.len()));
    Ok(Dispatch::Continue(cursor + 1))
}

pub fn gas<H: Host>(
    frame: &mut Frame<'_, H>,
    _stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    frame.stack.push(U256::from(frame.gas_remaining.max(0)));
    Ok(Dispatch::Continue(cursor + 1))
}

/// Charges the block's precomputed gas and validates stack depth, whether
/// this `JUMPDEST` was reached by a jump or by sequential fall-through.
pub fn jumpdest<H: Host>(
    frame: &mut Frame<'_, H>,
    stream: &Stream<H>,
    cursor: usize,
) -> Result<Dispatch, ExecutionError> {
    let meta = match stream.meta_at(cursor) {
        Slot::BlockMeta(m) => *m,
        _ => unreachable!("JUMPDEST handler without its metadata slot"),
    };
    enter_block_for_jumpdest(frame, &meta)?;
    Ok(Dispatch::Continue(cursor + 2))
}

macro_rules! dup {
    ($name:ident, $pos:expr) => {
        pub fn $name<H: Host>(
            frame: &mut Frame<'_, H>,
            _stream: &Stream<H>,
            cursor: usize,
        ) -> Result<Dispatch, ExecutionError> {
            let v = *frame.stack.get($pos);
            frame.stack.push(v);
            Ok(Dispatch::Continue(cursor + 1))
        }
    };
}

dup!(dup1, 0);
dup!(dup2, 1);
dup!(dup3, 2);
dup!(dup4, 3);
dup!(dup5, 4);
dup!(dup6, 5);
dup!(dup7, 6);
dup!(dup8, 7);
dup!(dup9, 8);
dup!(dup10, 9);
dup!(dup11, 10);
dup!(dup12, 11);
dup!(dup13, 12);
dup!(dup14, 13);
dup!(dup15, 14);
dup!(dup16, 15);

macro_rules! swap {
    ($name:ident, $pos:expr) => {
        pub fn $name<H: Host>(
            frame: &mut Frame<'_, H>,
            _stream: &Stream<H>,
            cursor: usize,
        ) -> Result<Dispatch, ExecutionError> {
            frame.stack.swap_top($pos);
            Ok(Dispatch::Continue(cursor + 1))
        }
    };
}

swap!(swap1, 1);
swap!(swap2, 2);
swap!(swap3, 3);
swap!(swap4, 4);
swap!(swap5, 5);
swap!(swap6, 6);
swap!(swap7, 7);
swap!(swap8, 8);
swap!(swap9, 9);
swap!(swap10, 10);
swap!(swap11, 11);
swap!(swap12, 12);
swap!(swap13, 13);
swap!(swap14, 14);
swap!(swap15, 15);
swap!(swap16, 16);
