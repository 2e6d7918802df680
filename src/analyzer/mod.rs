//! The bytecode analyzer/planner (§4.2): one forward pass over raw bytecode
//! producing a predecoded [`Stream`], its jump table, and any side-allocated
//! 256-bit push constants.

pub mod cache;
pub mod stream;

use crate::common::Word;
use crate::host::Host;
use crate::interpreter::handlers::stack;
use crate::metadata::{FusedKind, OpcodeMetadataTable};
use crate::opcode::OpCode;
use derive_more::{Display, Error};
use ethereum_types::U256;
use stream::{BlockMeta, JumpTable, Slot, Stream};

/// EIP-3860 initcode ceiling; the larger of the two EIP-170/EIP-3860 limits
/// since the analyzer itself cannot tell deployed code from initcode.
pub const MAX_BYTECODE_SIZE: usize = 2 * 0x6000;

/// Tunables for the analysis pass, independent of hardfork/gas configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyzerOptions {
    /// Fuse `PUSH+{ADD,SUB,MUL,AND,OR,XOR,JUMP,JUMPI,MLOAD,MSTORE,MSTORE8}`
    /// pairs into a single handler slot (§4.2.4).
    pub fuse: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
pub enum AnalyzeError {
    #[display(fmt = "bytecode exceeds the maximum analyzable size")]
    BytecodeTooLarge,
}

struct Op {
    pc: usize,
    code: OpCode,
    /// Present only for PUSH1..PUSH32; the literal, zero-extended if the
    /// bytecode was truncated mid-immediate.
    push_literal: Option<U256>,
}

fn is_fusable(code: OpCode) -> Option<FusedKind> {
    match code.to_u8() {
        x if x == OpCode::ADD.to_u8() => Some(FusedKind::Add),
        x if x == OpCode::SUB.to_u8() => Some(FusedKind::Sub),
        x if x == OpCode::MUL.to_u8() => Some(FusedKind::Mul),
        x if x == OpCode::AND.to_u8() => Some(FusedKind::And),
        x if x == OpCode::OR.to_u8() => Some(FusedKind::Or),
        x if x == OpCode::XOR.to_u8() => Some(FusedKind::Xor),
        x if x == OpCode::JUMP.to_u8() => Some(FusedKind::Jump),
        x if x == OpCode::JUMPI.to_u8() => Some(FusedKind::Jumpi),
        x if x == OpCode::MLOAD.to_u8() => Some(FusedKind::Mload),
        x if x == OpCode::MSTORE.to_u8() => Some(FusedKind::Mstore),
        x if x == OpCode::MSTORE8.to_u8() => Some(FusedKind::Mstore8),
        _ => None,
    }
}

/// First pass: walks the raw bytes once, skipping PUSH immediates, recording
/// each instruction's position and (for PUSH) its literal.
fn scan(code: &[u8]) -> (Vec<Op>, Vec<bool>) {
    let mut ops = Vec::new();
    let mut is_jumpdest = vec![false; code.len()];
    let mut pc = 0usize;
    while pc < code.len() {
        let byte = code[pc];
        let op = OpCode(byte);
        if op == OpCode::JUMPDEST {
            is_jumpdest[pc] = true;
        }
        if op.is_push() {
            let size = op.push_size();
            let mut buf = [0u8; 32];
            let avail = (code.len() - pc - 1).min(size);
            if avail > 0 {
                buf[32 - size..32 - size + avail].copy_from_slice(&code[pc + 1..pc + 1 + avail]);
            }
            ops.push(Op {
                pc,
                code: op,
                push_literal: Some(U256::from_big_endian(&buf)),
            });
            pc += 1 + size;
        } else {
            ops.push(Op {
                pc,
                code: op,
                push_literal: None,
            });
            pc += 1;
        }
    }
    (ops, is_jumpdest)
}

/// Second pass: accumulates the gas/stack-depth checkpoint for every basic
/// block (§4.2.3, §8 property 4) — a maximal run entered at program start, a
/// `JUMPDEST`, or the fallthrough after a `JUMPI`/CALL-CREATE-family op, and
/// exited at the next terminator. Returns one slot per op in `ops`: `Some`
/// at an op that begins a block, `None` everywhere else.
///
/// Bytes following a *non*-fallthrough terminator (`STOP`, `JUMP`, `RETURN`,
/// `REVERT`, `INVALID`, `SELFDESTRUCT`) have no valid entry point unless a
/// `JUMPDEST` resets the scan — anything in between is unreachable and must
/// not be folded into any block's charged gas.
fn compute_blocks<H: Host>(ops: &[Op], metadata: &OpcodeMetadataTable<H>) -> Vec<Option<BlockMeta>> {
    let mut checkpoints: Vec<Option<BlockMeta>> = vec![None; ops.len()];
    if ops.is_empty() {
        return checkpoints;
    }

    let mut start = 0usize;
    let mut current = BlockMeta::default();
    let mut depth: i32 = 0;
    let mut dead = false;

    for i in 0..ops.len() {
        let op = &ops[i];

        if op.code == OpCode::JUMPDEST {
            if !dead {
                checkpoints[start] = Some(current);
            }
            start = i;
            current = BlockMeta::default();
            depth = 0;
            dead = false;
        }

        if dead {
            continue;
        }

        let required = metadata.stack_required(op.code.to_u8()) as i32;
        if depth < required {
            current.min_stack = current.min_stack.max((required - depth) as u16);
        }
        current.gas = current.gas.saturating_add(metadata.base_gas(op.code.to_u8()) as u64);
        depth += metadata.stack_change(op.code.to_u8()) as i32;
        if depth > 0 {
            current.max_stack_growth = current.max_stack_growth.max(depth as u16);
        }

        if op.code.is_block_terminator() {
            checkpoints[start] = Some(current);
            if op.code.is_fallthrough_terminator() {
                start = i + 1;
                current = BlockMeta::default();
                depth = 0;
                dead = false;
            } else {
                dead = true;
            }
        }
    }

    if !dead && start < ops.len() && checkpoints[start].is_none() {
        checkpoints[start] = Some(current);
    }

    checkpoints
}

/// Translate raw bytecode into a predecoded [`Stream`] under `metadata`
/// (already built for the active hardfork) and `options`.
pub fn analyze<H: Host>(
    code: &[u8],
    metadata: &OpcodeMetadataTable<H>,
    options: AnalyzerOptions,
) -> Result<Stream<H>, AnalyzeError> {
    if code.len() > MAX_BYTECODE_SIZE {
        return Err(AnalyzeError::BytecodeTooLarge);
    }

    let (ops, is_jumpdest) = scan(code);
    let checkpoints = compute_blocks(&ops, metadata);

    // When code opens with a JUMPDEST, that block's real content is charged
    // once, at the JUMPDEST's own slot below; block 0 stays an empty no-op
    // checkpoint so `run()` doesn't double-charge it.
    let entry_block = if ops.first().map(|op| op.code) == Some(OpCode::JUMPDEST) {
        BlockMeta::default()
    } else {
        checkpoints.first().copied().flatten().unwrap_or_default()
    };

    let mut slots = Vec::with_capacity(ops.len() * 2 + 2);
    let mut side_constants = Vec::new();
    let mut jump_table_entries = Vec::new();

    let mut i = 0usize;
    while i < ops.len() {
        let op = &ops[i];

        // A block boundary that isn't already handled by the JUMPDEST branch
        // below (program start, or the fallthrough after a JUMPI/CALL/CREATE
        // family op) gets its own synthetic checkpoint slot pair.
        if i != 0 && op.code != OpCode::JUMPDEST {
            if let Some(meta) = checkpoints[i] {
                slots.push(Slot::Handler(crate::interpreter::block_checkpoint));
                slots.push(Slot::BlockMeta(meta));
            }
        }

        if op.code.is_push() {
            let literal = op.push_literal.unwrap();

            if options.fuse {
                if let Some(next) = ops.get(i + 1) {
                    let next_is_jumpdest = is_jumpdest[next.pc];
                    if !next_is_jumpdest {
                        if let Some(kind) = is_fusable(next.code) {
                            let handler = metadata.fused_handler(kind);
                            slots.push(Slot::Handler(handler));
                            push_operand(&mut slots, &mut side_constants, literal);
                            i += 2;
                            continue;
                        }
                    }
                }
            }

            // Metadata maps every PUSH opcode to `stack::push_inline`, the
            // common case; large literals need `push_pointer` instead, since
            // `push_inline` only ever reads `Slot::PushInline`.
            let handler = if literal <= U256::from(u64::MAX) {
                metadata
                    .handler(op.code.to_u8())
                    .expect("PUSH opcodes are always defined")
            } else {
                stack::push_pointer
            };
            slots.push(Slot::Handler(handler));
            push_operand(&mut slots, &mut side_constants, literal);
            i += 1;
            continue;
        }

        if op.code == OpCode::JUMPDEST {
            let meta = checkpoints[i].unwrap_or_default();
            let cursor = slots.len();
            jump_table_entries.push((op.pc, cursor));
            let handler = metadata
                .handler(op.code.to_u8())
                .expect("JUMPDEST is always defined");
            slots.push(Slot::Handler(handler));
            slots.push(Slot::BlockMeta(meta));
            i += 1;
            continue;
        }

        if op.code == OpCode::PC {
            let handler = metadata
                .handler(op.code.to_u8())
                .expect("PC is always defined");
            slots.push(Slot::Handler(handler));
            slots.push(Slot::PcMeta(op.pc));
            i += 1;
            continue;
        }

        let handler = metadata.handler(op.code.to_u8()).unwrap_or(
            metadata
                .handler(OpCode::INVALID.to_u8())
                .expect("INVALID is always defined"),
        );
        slots.push(Slot::Handler(handler));
        i += 1;
    }

    // Sentinel: at least two terminating slots so every handler can advance
    // its cursor by 1 or 2 without a bounds check.
    let stop_handler = metadata
        .handler(OpCode::STOP.to_u8())
        .expect("STOP is always defined");
    slots.push(Slot::Handler(stop_handler));
    slots.push(Slot::Handler(stop_handler));

    jump_table_entries.sort_unstable_by_key(|&(pc, _)| pc);

    Ok(Stream {
        slots,
        side_constants,
        jump_table: JumpTable(jump_table_entries),
        entry_block,
    })
}

fn push_operand<H: Host>(slots: &mut Vec<Slot<H>>, side_constants: &mut Vec<Word>, literal: U256) {
    if literal <= U256::from(u64::MAX) {
        slots.push(Slot::PushInline(literal.as_u64()));
    } else {
        let idx = side_constants.len();
        side_constants.push(literal);
        slots.push(Slot::PushPointer(idx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardforkConfig;
    use crate::host::SimpleHost;
    use crate::state::InMemoryState;

    fn metadata() -> OpcodeMetadataTable<SimpleHost<'static, InMemoryState>> {
        OpcodeMetadataTable::build(&HardforkConfig::cancun())
    }

    #[test]
    fn push_add_stop_produces_three_real_slots_plus_sentinel() {
        let md = metadata();
        // PUSH1 0x01, PUSH1 0x02, ADD, STOP
        let code = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];
        let stream = analyze(&code, &md, AnalyzerOptions::default()).unwrap();
        // two PUSHes (2 slots each) + ADD (1) + STOP (1) + 2 sentinel = 8
        assert_eq!(stream.slots.len(), 8);
    }

    #[test]
    fn fusion_collapses_push_add_into_two_slots() {
        let md = metadata();
        let code = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];
        let stream = analyze(&code, &md, AnalyzerOptions { fuse: true }).unwrap();
        // PUSH1 1 (2 slots) + fused PUSH1-2/ADD (2 slots) + STOP (1) + 2 sentinel = 7
        assert_eq!(stream.slots.len(), 7);
    }

    #[test]
    fn jumpdest_block_gas_matches_sum_of_opcodes_in_block() {
        let md = metadata();
        // JUMPDEST, PUSH1 0, PUSH1 0, STOP
        let code = [0x5b, 0x60, 0x00, 0x60, 0x00, 0x00];
        let stream = analyze(&code, &md, AnalyzerOptions::default()).unwrap();
        let target = stream.jump_table.lookup(0).unwrap();
        match &stream.slots[target + 1] {
            Slot::BlockMeta(meta) => {
                assert_eq!(meta.gas, 1 + 3 + 3 + 0);
            }
            _ => panic!("expected BlockMeta slot"),
        }
    }

    #[test]
    fn dead_bytes_after_a_terminator_are_excluded_from_either_blocks_gas() {
        let md = metadata();
        // JUMPDEST, STOP, PUSH1 0xff (unreachable: no JUMPDEST precedes it),
        // JUMPDEST, STOP.
        let code = [0x5b, 0x00, 0x60, 0xff, 0x5b, 0x00];
        let stream = analyze(&code, &md, AnalyzerOptions::default()).unwrap();

        let first = stream.jump_table.lookup(0).unwrap();
        match &stream.slots[first + 1] {
            Slot::BlockMeta(meta) => assert_eq!(meta.gas, 1 /* JUMPDEST */),
            _ => panic!("expected BlockMeta slot"),
        }

        let second = stream.jump_table.lookup(4).unwrap();
        match &stream.slots[second + 1] {
            Slot::BlockMeta(meta) => assert_eq!(meta.gas, 1 /* JUMPDEST */),
            _ => panic!("expected BlockMeta slot"),
        }
    }

    #[test]
    fn jumpi_fallthrough_gets_its_own_checkpoint_distinct_from_the_jumpdest_block() {
        let md = metadata();
        // PUSH1 0 (cond), PUSH1 10 (dead target), JUMPI, PUSH1 1, STOP,
        // JUMPDEST, STOP.
        let code = [0x60, 0x00, 0x60, 0x0a, 0x57, 0x60, 0x01, 0x00, 0x5b, 0x00];
        let stream = analyze(&code, &md, AnalyzerOptions::default()).unwrap();

        // The synthetic checkpoint sits right after JUMPI's own handler slot
        // (slots 0-3 are the two PUSHes, slot 4 is JUMPI).
        match &stream.slots[5] {
            Slot::Handler(_) => {}
            _ => panic!("expected a checkpoint handler slot"),
        }
        match &stream.slots[6] {
            Slot::BlockMeta(meta) => assert_eq!(meta.gas, 3 /* PUSH1 */ + 0 /* STOP */),
            _ => panic!("expected BlockMeta slot"),
        }

        // The trailing JUMPDEST-headed block is unaffected and still charges
        // only its own content.
        let target = stream.jump_table.lookup(8).unwrap();
        match &stream.slots[target + 1] {
            Slot::BlockMeta(meta) => assert_eq!(meta.gas, 1 /* JUMPDEST */),
            _ => panic!("expected BlockMeta slot"),
        }
    }

    #[test]
    fn truncated_push_zero_extends() {
        let md = metadata();
        // PUSH2 with only one byte of immediate present.
        let code = [0x61, 0xff];
        let stream = analyze(&code, &md, AnalyzerOptions::default()).unwrap();
        match &stream.slots[1] {
            Slot::PushInline(v) => assert_eq!(*v, 0xff00),
            _ => panic!("expected inline literal"),
        }
    }

    #[test]
    fn oversized_bytecode_is_rejected() {
        let md = metadata();
        let code = vec![0x00u8; MAX_BYTECODE_SIZE + 1];
        assert_eq!(
            analyze(&code, &md, AnalyzerOptions::default()),
            Err(AnalyzeError::BytecodeTooLarge)
        );
    }
}
