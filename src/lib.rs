//! A from-scratch EVM execution core: a bytecode analyzer/planner, a
//! threaded-dispatch interpreter, per-hardfork opcode metadata, and a
//! journaled state model (§1-§4 of the design).
//!
//! This crate implements the execution layer only. Transaction validation,
//! receipts, gas refund accounting, and state-root computation are the
//! caller's responsibility (§9 Non-goals).

pub use common::{Address, CodeHash, Hardfork, Word};
pub use config::HardforkConfig;
pub use host::{BlockContext, CallParams, CallResult, Host, HostError, SimpleHost};
pub use journal::Journal;
pub use metadata::OpcodeMetadataTable;
pub use opcode::OpCode;
pub use state::{Account, InMemoryState, StateStore};

pub mod analyzer;
mod common;
pub mod config;
pub mod host;
pub mod interpreter;
pub mod journal;
pub mod metadata;
pub mod opcode;
pub mod state;

pub mod util;
