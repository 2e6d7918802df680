//! Test-only helpers: a bytecode builder and a fluent execution tester.
//!
//! Kept in the main crate (rather than `tests/`) because `tests/*.rs`
//! integration tests need them too, the same reason the teacher crate did.

pub mod bytecode;
pub mod tester;

pub use bytecode::{Bytecode, CallInstruction};
pub use tester::EvmTester;
