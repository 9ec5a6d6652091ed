//! Stage orchestration over a per-run context.

use anyhow::Result;
use oligomyx_common::pipeline_config::PipelineConfig;
use oligomyx_common::report::StageReport;
use oligomyx_common::PdbId;
use oligomyx_filters::{
    extract_ids, SecondaryStructureFilter, SizeFilter, StageContext, StoichiometryFilter,
};
use oligomyx_ranker::{
    AnnotationMetricSource, CompositeMetricSource, MetricSource, MetricsRanker, Ranking, StructuralMetricSource,
};
use oligomyx_structure::volumizer::VolumizerRunner;
use oligomyx_structure::StructureRepository;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Everything one run needs: validated configuration, stage settings and
/// the structure repository whose parsed files are shared across stages.
pub struct RunContext {
    pub config: PipelineConfig,
    pub stage: StageContext,
    pub structures: Arc<StructureRepository>,
}

impl RunContext {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let stage = StageContext::from_config(&config.execution);
        let timeout = Duration::from_secs(config.execution.lookup_timeout_secs);
        let structures = Arc::new(StructureRepository::from_config(&config.source, timeout)?);
        Ok(Self { config, stage, structures })
    }

    pub fn run_id(&self) -> Uuid {
        self.stage.run_id
    }

    pub fn extract(&self, cluster_text: &str) -> Vec<PdbId> {
        let ids = extract_ids(cluster_text, self.config.extract.mode);
        info!(run_id = %self.run_id(), n = ids.len(), "Extracted identifiers");
        ids
    }

    pub async fn size(&self, ids: &[PdbId]) -> StageReport {
        SizeFilter::from_config(&self.config.size)
            .apply(&self.stage, ids, self.structures.as_ref())
            .await
    }

    pub async fn stoichiometry(&self, ids: &[PdbId]) -> StageReport {
        StoichiometryFilter::new(self.config.stoichiometry.clone())
            .apply(&self.stage, ids, self.structures.as_ref())
            .await
    }

    pub async fn secondary_structure(&self, ids: &[PdbId]) -> StageReport {
        SecondaryStructureFilter::new(self.config.secondary_structure.clone())
            .apply(&self.stage, ids, self.structures.as_ref())
            .await
    }

    /// Structural metrics are computed from the coordinates. Any other
    /// metric comes from volumizer annotations, with structural metrics
    /// merged in when the structure loads.
    pub fn metric_source(&self) -> Box<dyn MetricSource> {
        let structural = StructuralMetricSource::new(self.structures.clone());
        if StructuralMetricSource::provides(&self.config.ranking.metric) {
            return Box::new(structural);
        }

        let source = &self.config.source;
        let mut annotations = AnnotationMetricSource::new(&source.annotation_dir);
        if let Some(volumizer) = &source.volumizer {
            annotations = annotations.with_volumizer(
                VolumizerRunner::new(&volumizer.executable, volumizer.voxel_size),
                self.structures.clone(),
            );
        }
        Box::new(CompositeMetricSource::new().with(annotations).with_optional(structural))
    }

    pub async fn rank(&self, ids: &[PdbId]) -> Ranking {
        let source = self.metric_source();
        MetricsRanker::from_config(&self.config.ranking)
            .rank(&self.stage, ids, source.as_ref())
            .await
    }
}

/// Reports of the three filter stages in order, then the ranking.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub input: Vec<PdbId>,
    pub stages: Vec<StageReport>,
    pub ranking: Ranking,
}

impl PipelineOutcome {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name).or_else(|| {
            (self.ranking.report.stage == name).then_some(&self.ranking.report)
        })
    }
}

/// Run the filter stages and the ranker in sequence, each on the previous
/// stage's survivors.
#[instrument(skip_all, fields(run_id = %ctx.run_id(), n = ids.len()))]
pub async fn run_pipeline(ctx: &RunContext, ids: &[PdbId]) -> PipelineOutcome {
    let t0 = std::time::Instant::now();
    info!("Starting pipeline over {} identifiers", ids.len());

    let size = ctx.size(ids).await;
    let stoichiometry = ctx.stoichiometry(&size.kept).await;
    let secondary = ctx.secondary_structure(&stoichiometry.kept).await;
    let ranking = ctx.rank(&secondary.kept).await;

    info!(
        winners = ranking.entries.len(),
        duration_ms = t0.elapsed().as_millis() as u64,
        "Pipeline complete"
    );

    PipelineOutcome {
        run_id: ctx.run_id(),
        input: ids.to_vec(),
        stages: vec![size, stoichiometry, secondary],
        ranking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oligomyx_test_utils::{homo_oligomer, tempdir};

    #[tokio::test]
    async fn test_structural_metric_skips_annotations() {
        let dir = tempdir().unwrap();
        homo_oligomer(2, "MKV").write_to(dir.path(), "1ABC");

        let mut config = PipelineConfig::default();
        config.source.structure_dir = dir.path().to_path_buf();
        config.source.annotation_dir = dir.path().join("no-annotations");
        config.ranking.metric = "chains".into();
        let ctx = RunContext::new(config).unwrap();

        assert_eq!(ctx.metric_source().name(), "structure");
        let ranking = ctx.rank(&[PdbId::parse("1ABC").unwrap()]).await;
        assert_eq!(ranking.entries.len(), 1);
        assert_eq!(ranking.entries[0].value, 2.0);
    }

    #[tokio::test]
    async fn test_volume_metric_merges_annotations_with_structure() {
        let dir = tempdir().unwrap();
        homo_oligomer(2, "MKV").write_to(dir.path(), "1ABC");
        std::fs::write(dir.path().join("1abc.json"), r#"[{"type":"pore","volume":512.0}]"#).unwrap();

        let mut config = PipelineConfig::default();
        config.source.structure_dir = dir.path().to_path_buf();
        config.source.annotation_dir = dir.path().to_path_buf();
        let ctx = RunContext::new(config).unwrap();

        assert_eq!(ctx.metric_source().name(), "composite");
        let ranking = ctx.rank(&[PdbId::parse("1ABC").unwrap()]).await;
        let entry = &ranking.entries[0];
        assert_eq!(entry.value, 512.0);
        assert_eq!(entry.metrics["chains"], 2.0);
    }

    #[tokio::test]
    async fn test_annotations_rank_without_structure_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("1abc.json"), r#"[{"type":"pore","volume":1000.0}]"#).unwrap();
        std::fs::write(dir.path().join("3def.json"), r#"[{"type":"pore","volume":2000.0}]"#).unwrap();

        let mut config = PipelineConfig::default();
        config.source.structure_dir = dir.path().join("no-structures");
        config.source.annotation_dir = dir.path().to_path_buf();
        config.ranking.top_k = Some(1);
        let ctx = RunContext::new(config).unwrap();

        let ids = [PdbId::parse("1ABC").unwrap(), PdbId::parse("3DEF").unwrap()];
        let ranking = ctx.rank(&ids).await;
        assert_eq!(ranking.winners(), vec![(PdbId::parse("3DEF").unwrap(), 2000.0)]);
        assert_eq!(ranking.report.lookup_failures().count(), 0);
        assert!(!ranking.entries[0].metrics.contains_key("atoms"));
    }

    #[tokio::test]
    async fn test_missing_annotation_still_excludes() {
        let dir = tempdir().unwrap();
        homo_oligomer(2, "MKV").write_to(dir.path(), "1ABC");

        let mut config = PipelineConfig::default();
        config.source.structure_dir = dir.path().to_path_buf();
        config.source.annotation_dir = dir.path().join("no-annotations");
        let ctx = RunContext::new(config).unwrap();

        let ranking = ctx.rank(&[PdbId::parse("1ABC").unwrap()]).await;
        assert!(ranking.entries.is_empty());
        assert_eq!(ranking.report.lookup_failures().count(), 1);
    }
}
