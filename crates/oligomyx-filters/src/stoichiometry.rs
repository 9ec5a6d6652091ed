//! Stoichiometry filter: chain count and homo-oligomer criteria.

use oligomyx_common::entities::{ChainComposition, OligomericState};
use oligomyx_common::pipeline_config::{IdentityPolicy, StoichiometryConfig};
use oligomyx_common::report::StageReport;
use oligomyx_common::PdbId;
use oligomyx_structure::sequence::cluster_sequences;
use std::fmt;
use tracing::instrument;

use crate::providers::ChainLookup;
use crate::stage::{run_filter, StageContext, Verdict};

/// Sizes of the sequence clusters of one assembly, largest first
/// (`[8]` for a homo-8-mer, `[4, 2]` for A4B2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stoichiometry {
    pub clusters: Vec<usize>,
}

impl Stoichiometry {
    pub fn of(composition: &ChainComposition, policy: IdentityPolicy) -> Self {
        let sequences: Vec<&str> = composition.chains.iter().map(|c| c.sequence.as_str()).collect();
        let mut clusters: Vec<usize> = cluster_sequences(&sequences, policy).iter().map(Vec::len).collect();
        clusters.sort_unstable_by(|a, b| b.cmp(a));
        Self { clusters }
    }

    pub fn chain_count(&self) -> usize {
        self.clusters.iter().sum()
    }

    pub fn unique_chains(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_homomer(&self) -> bool {
        self.clusters.len() == 1
    }

    /// Every cluster size divides the largest one (8-4-2 yes, 3-2 no).
    pub fn is_factorable(&self) -> bool {
        match self.clusters.first() {
            Some(&largest) => self.clusters.iter().all(|&n| n > 0 && largest % n == 0),
            None => false,
        }
    }
}

impl fmt::Display for Stoichiometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.clusters.iter().map(usize::to_string).collect();
        write!(f, "{}", parts.join("-"))
    }
}

#[derive(Debug, Clone)]
pub struct StoichiometryFilter {
    config: StoichiometryConfig,
}

impl StoichiometryFilter {
    pub fn new(config: StoichiometryConfig) -> Self {
        Self { config }
    }

    /// Homo-oligomers with at least `min_chains` chains, exact sequence identity.
    pub fn homomers(min_chains: u32) -> Self {
        Self::new(StoichiometryConfig { min_chains, ..Default::default() })
    }

    pub fn judge(&self, composition: &ChainComposition) -> Verdict {
        let cfg = &self.config;
        let chains = composition.chain_count();

        if chains < cfg.min_chains as usize {
            return Verdict::Reject(format!("{} chains, minimum {}", chains, cfg.min_chains));
        }
        if let Some(max) = cfg.max_chains {
            if chains > max as usize {
                return Verdict::Reject(format!("{} chains, maximum {}", chains, max));
            }
        }

        let stoichiometry = Stoichiometry::of(composition, cfg.identity);
        let (homomer, unique) = match composition.reported_state {
            Some(OligomericState::Homomer) => (true, 1),
            Some(OligomericState::Heteromer) => (false, stoichiometry.unique_chains().max(2)),
            None => (stoichiometry.is_homomer(), stoichiometry.unique_chains()),
        };

        if cfg.require_homomer {
            if !homomer {
                return Verdict::Reject(format!("not a homo-oligomer (stoichiometry {stoichiometry})"));
            }
        } else {
            if unique < cfg.min_unique_chains as usize {
                return Verdict::Reject(format!("{} unique chains, minimum {}", unique, cfg.min_unique_chains));
            }
            if let Some(max) = cfg.max_unique_chains {
                if unique > max as usize {
                    return Verdict::Reject(format!("{} unique chains, maximum {}", unique, max));
                }
            }
        }

        if cfg.factorable && !stoichiometry.is_factorable() {
            return Verdict::Reject(format!("stoichiometry {stoichiometry} is not factorable"));
        }

        Verdict::Keep
    }

    #[instrument(skip_all, fields(min_chains = self.config.min_chains, n = ids.len()))]
    pub async fn apply(&self, ctx: &StageContext, ids: &[PdbId], lookup: &dyn ChainLookup) -> StageReport {
        run_filter(
            ctx,
            "stoichiometry",
            ids,
            |id| async move { lookup.chain_composition(&id).await },
            |c| self.judge(c),
        )
        .await
    }
}
