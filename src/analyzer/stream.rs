//! The predecoded instruction stream produced by the analyzer (§3, §4.2).

use crate::host::Host;
use crate::interpreter::Handler;

/// Per-block gas/stack pre-accounting, stored inline after a `JUMPDEST`
/// handler slot (or, for block 0, in [`Stream::entry_block`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockMeta {
    /// Sum of static base gas costs of every opcode in the block.
    pub gas: u64,
    /// Minimum stack depth required to enter the block without underflow.
    pub min_stack: u16,
    /// Maximum transient stack growth within the block, bounding overflow.
    pub max_stack_growth: u16,
}

/// A single predecoded slot. Real implementations favor an untagged union of
/// machine-word-sized cells (§9); this crate always tags the slot for memory
/// safety, the "safer implementation" variant §9 explicitly sanctions.
pub enum Slot<H: Host> {
    Handler(Handler<H>),
    PushInline(u64),
    /// Index into [`Stream::side_constants`].
    PushPointer(usize),
    /// Original bytecode program counter, read by the PC opcode.
    PcMeta(usize),
    BlockMeta(BlockMeta),
}

impl<H: Host> Clone for Slot<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Handler(h) => Self::Handler(*h),
            Self::PushInline(v) => Self::PushInline(*v),
            Self::PushPointer(i) => Self::PushPointer(*i),
            Self::PcMeta(pc) => Self::PcMeta(*pc),
            Self::BlockMeta(m) => Self::BlockMeta(*m),
        }
    }
}

/// Sorted `(original_pc, cursor)` pairs for every `JUMPDEST`; binary-searched
/// by JUMP/JUMPI.
#[derive(Clone, Debug, Default)]
pub struct JumpTable(pub Vec<(usize, usize)>);

impl JumpTable {
    pub fn lookup(&self, pc: usize) -> Option<usize> {
        self.0
            .binary_search_by_key(&pc, |&(p, _)| p)
            .ok()
            .map(|i| self.0[i].1)
    }
}

/// The analyzer's output: a linear sequence of handler pointers and metadata
/// slots, a jump table, and any side-allocated 256-bit push constants.
pub struct Stream<H: Host> {
    pub slots: Vec<Slot<H>>,
    pub side_constants: Vec<crate::common::Word>,
    pub jump_table: JumpTable,
    /// Gas/stack accounting for the first block (no leading `JUMPDEST`).
    pub entry_block: BlockMeta,
}

impl<H: Host> Stream<H> {
    /// Slot immediately following `cursor`'s handler; present for every
    /// opcode that carries metadata.
    #[inline]
    pub fn meta_at(&self, cursor: usize) -> &Slot<H> {
        &self.slots[cursor + 1]
    }
}
