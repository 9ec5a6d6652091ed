//! Secondary-structure filter over helix, strand and coil fractions.

use oligomyx_common::entities::SecondaryStructureCounts;
use oligomyx_common::pipeline_config::SecondaryStructureConfig;
use oligomyx_common::report::StageReport;
use oligomyx_common::PdbId;
use tracing::instrument;

use crate::providers::SecondaryStructureLookup;
use crate::stage::{run_filter, StageContext, Verdict};

#[derive(Debug, Clone)]
pub struct SecondaryStructureFilter {
    config: SecondaryStructureConfig,
}

fn check(name: &str, value: f64, min: f64, max: f64) -> Option<String> {
    if value < min {
        Some(format!("{name} fraction {value:.3} below {min:.3}"))
    } else if value > max {
        Some(format!("{name} fraction {value:.3} above {max:.3}"))
    } else {
        None
    }
}

impl SecondaryStructureFilter {
    pub fn new(config: SecondaryStructureConfig) -> Self {
        Self { config }
    }

    /// Only the minimum helix fraction is bounded.
    pub fn helix_threshold(threshold: f64) -> Self {
        Self::new(SecondaryStructureConfig { helix_threshold: threshold, ..Default::default() })
    }

    pub fn judge(&self, counts: &SecondaryStructureCounts) -> Verdict {
        let cfg = &self.config;
        let (Some(helix), Some(strand), Some(coil)) =
            (counts.helix_fraction(), counts.strand_fraction(), counts.coil_fraction())
        else {
            return Verdict::Reject("no resolved residues".to_string());
        };

        check("helix", helix, cfg.helix_threshold, cfg.max_helix)
            .or_else(|| check("strand", strand, cfg.min_strand, cfg.max_strand))
            .or_else(|| check("coil", coil, cfg.min_coil, cfg.max_coil))
            .map_or(Verdict::Keep, Verdict::Reject)
    }

    #[instrument(skip_all, fields(helix_threshold = self.config.helix_threshold, n = ids.len()))]
    pub async fn apply(
        &self,
        ctx: &StageContext,
        ids: &[PdbId],
        lookup: &dyn SecondaryStructureLookup,
    ) -> StageReport {
        run_filter(
            ctx,
            "secondary_structure",
            ids,
            |id| async move { lookup.secondary_structure(&id).await },
            |c| self.judge(c),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockStructureProvider;
    use oligomyx_structure::pdb::StructureFileKind;
    use oligomyx_structure::StructureRepository;
    use oligomyx_test_utils::{tempdir, PdbBuilder};
    use pretty_assertions::assert_eq;

    fn ids(raw: &[&str]) -> Vec<PdbId> {
        raw.iter().map(|s| PdbId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_helix_threshold() {
        let mock = MockStructureProvider::new()
            .with_secondary("1ABC", 60, 10, 100)
            .with_secondary("2XYZ", 30, 40, 100);
        let report = SecondaryStructureFilter::helix_threshold(0.5)
            .apply(&StageContext::default(), &ids(&["1ABC", "2XYZ"]), &mock)
            .await;
        assert_eq!(report.kept, ids(&["1ABC"]));
    }

    #[test]
    fn test_zero_residues_never_kept() {
        let filter = SecondaryStructureFilter::helix_threshold(0.0);
        let verdict = filter.judge(&SecondaryStructureCounts::default());
        assert_eq!(verdict, Verdict::Reject("no resolved residues".to_string()));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let filter = SecondaryStructureFilter::helix_threshold(0.5);
        let counts = SecondaryStructureCounts { helix: 5, strand: 0, total: 10 };
        assert_eq!(filter.judge(&counts), Verdict::Keep);
    }

    #[test]
    fn test_strand_and_coil_bounds() {
        let filter = SecondaryStructureFilter::new(SecondaryStructureConfig {
            max_strand: 0.1,
            max_coil: 0.5,
            ..Default::default()
        });
        let strandy = SecondaryStructureCounts { helix: 50, strand: 20, total: 100 };
        assert!(matches!(filter.judge(&strandy), Verdict::Reject(msg) if msg.starts_with("strand")));

        let loopy = SecondaryStructureCounts { helix: 40, strand: 0, total: 100 };
        assert!(matches!(filter.judge(&loopy), Verdict::Reject(msg) if msg.starts_with("coil")));

        let helical = SecondaryStructureCounts { helix: 90, strand: 5, total: 100 };
        assert_eq!(filter.judge(&helical), Verdict::Keep);
    }

    #[tokio::test]
    async fn test_against_structure_files() {
        let dir = tempdir().unwrap();
        PdbBuilder::new().chain('A', "AAAAAAAAAA").helix('A', 1, 8).write_to(dir.path(), "1HLX");
        PdbBuilder::new().chain('A', "VVVVVVVVVV").sheet('A', 1, 8).write_to(dir.path(), "1STR");
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);

        let ctx = StageContext::default();
        let report = SecondaryStructureFilter::helix_threshold(0.5)
            .apply(&ctx, &ids(&["1HLX", "1STR", "1MIS"]), &repo)
            .await;
        assert_eq!(report.kept, ids(&["1HLX"]));
        assert_eq!(report.lookup_failures().count(), 1);

        let rerun = SecondaryStructureFilter::helix_threshold(0.5).apply(&ctx, &report.kept, &repo).await;
        assert_eq!(rerun.kept, report.kept);
    }
}
