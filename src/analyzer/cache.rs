//! Analysis cache (§2 supplemental, sanctioned by spec.md §6: "implementations
//! MAY cache streams keyed by code hash"), grounded on
//! `tokamak-network-ethrex`'s `crates/vm/levm/src/jit/cache.rs` pattern of
//! keying compiled-code reuse by a bytecode hash.
//!
//! Unlike that cache, this one isn't `Send`/`Sync`/shared: `Stream<H>`'s
//! handler slots are monomorphized over the concrete [`Host`] type, which
//! here is [`SimpleHost<'a, S>`](crate::host::SimpleHost) carrying the
//! lifetime of one transaction's borrowed state and journal. So a cache
//! instance only ever outlives a single [`SimpleHost`](crate::host::SimpleHost),
//! not a process — still useful, since one transaction commonly invokes the
//! same contract (a token, a proxy, a reentrant callback) more than once.

use super::{analyze, AnalyzeError, AnalyzerOptions, Stream};
use crate::common::CodeHash;
use crate::host::Host;
use crate::metadata::OpcodeMetadataTable;
use std::collections::HashMap;
use std::rc::Rc;

/// Memoizes [`analyze`] by code hash for the lifetime of one [`Host`]
/// instance (see module docs for why it can't outlive that).
pub struct AnalysisCache<H: Host> {
    entries: HashMap<CodeHash, Rc<Stream<H>>>,
}

impl<H: Host> AnalysisCache<H> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the cached stream for `code_hash`, analyzing and inserting it
    /// on a miss.
    pub fn get_or_analyze(
        &mut self,
        code_hash: CodeHash,
        code: &[u8],
        metadata: &OpcodeMetadataTable<H>,
        options: AnalyzerOptions,
    ) -> Result<Rc<Stream<H>>, AnalyzeError> {
        if let Some(stream) = self.entries.get(&code_hash) {
            return Ok(Rc::clone(stream));
        }
        let stream = Rc::new(analyze(code, metadata, options)?);
        self.entries.insert(code_hash, Rc::clone(&stream));
        Ok(stream)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Host> Default for AnalysisCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardforkConfig;
    use crate::host::{BlockContext, SimpleHost};
    use crate::journal::Journal;
    use crate::state::InMemoryState;
    use crate::{Address, Hardfork, Word};

    #[test]
    fn repeated_lookup_of_the_same_hash_reuses_the_analyzed_stream() {
        let mut state = InMemoryState::new();
        let mut journal = Journal::new();
        let config = HardforkConfig::from(Hardfork::latest());
        let metadata = OpcodeMetadataTable::build(&config);
        let host = SimpleHost::new(
            &mut state,
            &mut journal,
            config,
            &metadata,
            BlockContext {
                coinbase: Address::zero(),
                timestamp: 0,
                number: 0,
                difficulty: Word::zero(),
                gas_limit: 30_000_000,
                base_fee: Word::zero(),
                chain_id: Word::one(),
                blob_base_fee: Word::zero(),
            },
            Address::zero(),
        );

        let mut cache = AnalysisCache::<_>::new();
        let code = [0x60, 0x00, 0x00]; // PUSH1 0, STOP
        let hash = CodeHash::repeat_byte(0xab);

        let first = cache
            .get_or_analyze(hash, &code, host.metadata, AnalyzerOptions::default())
            .unwrap();
        assert_eq!(cache.len(), 1);

        let second = cache
            .get_or_analyze(hash, &code, host.metadata, AnalyzerOptions::default())
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }
}
