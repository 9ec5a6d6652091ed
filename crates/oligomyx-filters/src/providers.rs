//! Collaborator traits for the filter stages.
//!
//! The stages only see these traits, so they can run against parsed local
//! structures, a remote metadata service or fixed test data alike.

use async_trait::async_trait;
use oligomyx_common::entities::{
    ChainComposition, ChainSequence, OligomericState, SecondaryStructureCounts, SizeMetrics,
};
use oligomyx_common::{LookupFailure, LookupResult, PdbId};
use oligomyx_structure::StructureRepository;
use std::collections::HashMap;
use std::time::Duration;

/// Reports the size of a structure entry.
#[async_trait]
pub trait SizeProbe: Send + Sync {
    async fn size_metrics(&self, id: &PdbId) -> LookupResult<SizeMetrics>;
}

/// Reports the chains of a structure entry and, when known, its assembly type.
#[async_trait]
pub trait ChainLookup: Send + Sync {
    async fn chain_composition(&self, id: &PdbId) -> LookupResult<ChainComposition>;
}

/// Reports residue counts by secondary-structure class.
#[async_trait]
pub trait SecondaryStructureLookup: Send + Sync {
    async fn secondary_structure(&self, id: &PdbId) -> LookupResult<SecondaryStructureCounts>;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

/// Provider with fixed per-identifier data. Identifiers without data for
/// the requested lookup report `NotFound`.
#[derive(Debug, Default)]
pub struct MockStructureProvider {
    sizes: HashMap<PdbId, SizeMetrics>,
    chains: HashMap<PdbId, ChainComposition>,
    secondary: HashMap<PdbId, SecondaryStructureCounts>,
    failures: HashMap<PdbId, LookupFailure>,
    delays: HashMap<PdbId, Duration>,
}

fn mock_id(id: &str) -> PdbId {
    PdbId::parse(id).unwrap_or_else(|| panic!("mock identifier {id:?} is not a PDB code"))
}

impl MockStructureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, id: &str, metrics: SizeMetrics) -> Self {
        self.sizes.insert(mock_id(id), metrics);
        self
    }

    /// Chains `A`, `B`, ... with the given sequences.
    pub fn with_chains(mut self, id: &str, sequences: &[&str]) -> Self {
        let chains = sequences
            .iter()
            .enumerate()
            .map(|(i, seq)| ChainSequence {
                chain_id: ((b'A' + (i % 26) as u8) as char).to_string(),
                sequence: seq.to_string(),
            })
            .collect();
        self.chains.insert(mock_id(id), ChainComposition { chains, reported_state: None });
        self
    }

    /// Override sequence comparison with a reported assembly type.
    pub fn with_reported_state(mut self, id: &str, state: OligomericState) -> Self {
        self.chains.entry(mock_id(id)).or_default().reported_state = Some(state);
        self
    }

    pub fn with_secondary(mut self, id: &str, helix: u64, strand: u64, total: u64) -> Self {
        self.secondary.insert(mock_id(id), SecondaryStructureCounts { helix, strand, total });
        self
    }

    /// Every lookup for `id` fails with `failure`.
    pub fn with_failure(mut self, id: &str, failure: LookupFailure) -> Self {
        self.failures.insert(mock_id(id), failure);
        self
    }

    /// Every lookup for `id` sleeps before answering.
    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(mock_id(id), delay);
        self
    }

    async fn answer<T: Clone>(&self, id: &PdbId, table: &HashMap<PdbId, T>) -> LookupResult<T> {
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(failure) = self.failures.get(id) {
            return Err(failure.clone());
        }
        table.get(id).cloned().ok_or_else(|| LookupFailure::NotFound(id.to_string()))
    }
}

#[async_trait]
impl SizeProbe for MockStructureProvider {
    async fn size_metrics(&self, id: &PdbId) -> LookupResult<SizeMetrics> {
        self.answer(id, &self.sizes).await
    }
}

#[async_trait]
impl ChainLookup for MockStructureProvider {
    async fn chain_composition(&self, id: &PdbId) -> LookupResult<ChainComposition> {
        self.answer(id, &self.chains).await
    }
}

#[async_trait]
impl SecondaryStructureLookup for MockStructureProvider {
    async fn secondary_structure(&self, id: &PdbId) -> LookupResult<SecondaryStructureCounts> {
        self.answer(id, &self.secondary).await
    }
}

// ── Local Structure Files ────────────────────────────────────────────────────

#[async_trait]
impl SizeProbe for StructureRepository {
    async fn size_metrics(&self, id: &PdbId) -> LookupResult<SizeMetrics> {
        let loaded = self.load(id).await?;
        Ok(loaded.structure.size_metrics(loaded.file_bytes))
    }
}

#[async_trait]
impl ChainLookup for StructureRepository {
    async fn chain_composition(&self, id: &PdbId) -> LookupResult<ChainComposition> {
        let loaded = self.load(id).await?;
        Ok(ChainComposition { chains: loaded.structure.chain_sequences(), reported_state: None })
    }
}

#[async_trait]
impl SecondaryStructureLookup for StructureRepository {
    async fn secondary_structure(&self, id: &PdbId) -> LookupResult<SecondaryStructureCounts> {
        let loaded = self.load(id).await?;
        Ok(loaded.structure.secondary_structure_counts())
    }
}
