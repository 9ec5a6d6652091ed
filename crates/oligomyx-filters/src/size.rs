//! Size filter: keeps identifiers whose size lies within inclusive bounds.
//!
//! The selected measure is bounded by `min_size`/`max_size`; optional
//! per-measure bounds (atoms, residues, chains) must all hold too.

use oligomyx_common::entities::{SizeMetric, SizeMetrics};
use oligomyx_common::pipeline_config::{SizeBounds, SizeConfig};
use oligomyx_common::report::StageReport;
use oligomyx_common::PdbId;
use tracing::instrument;

use crate::providers::SizeProbe;
use crate::stage::{run_filter, StageContext, Verdict};

#[derive(Debug, Clone)]
pub struct SizeFilter {
    pub metric: SizeMetric,
    pub min_size: u64,
    /// Unbounded when `None`
    pub max_size: Option<u64>,
    pub extra_bounds: Vec<(SizeMetric, SizeBounds)>,
}

impl SizeFilter {
    pub fn new(metric: SizeMetric, min_size: u64, max_size: Option<u64>) -> Self {
        Self { metric, min_size, max_size, extra_bounds: Vec::new() }
    }

    pub fn from_config(config: &SizeConfig) -> Self {
        let mut filter = Self::new(config.metric, config.min_size, config.max_size);
        filter.extra_bounds = config.extra_bounds();
        filter
    }

    pub fn with_bounds(mut self, metric: SizeMetric, bounds: SizeBounds) -> Self {
        self.extra_bounds.push((metric, bounds));
        self
    }

    pub fn judge(&self, metrics: &SizeMetrics) -> Verdict {
        let primary = SizeBounds::new(Some(self.min_size), self.max_size);
        std::iter::once((self.metric, primary))
            .chain(self.extra_bounds.iter().copied())
            .find_map(|(metric, bounds)| out_of_bounds(metric, metrics.get(metric), &bounds))
            .map_or(Verdict::Keep, Verdict::Reject)
    }

    #[instrument(skip_all, fields(metric = %self.metric, n = ids.len()))]
    pub async fn apply(&self, ctx: &StageContext, ids: &[PdbId], probe: &dyn SizeProbe) -> StageReport {
        run_filter(ctx, "size", ids, |id| async move { probe.size_metrics(&id).await }, |m| self.judge(m)).await
    }
}

fn out_of_bounds(metric: SizeMetric, size: u64, bounds: &SizeBounds) -> Option<String> {
    match (bounds.min, bounds.max) {
        (Some(min), _) if size < min => Some(format!("{metric} {size} below minimum {min}")),
        (_, Some(max)) if size > max => Some(format!("{metric} {size} above maximum {max}")),
        _ => None,
    }
}
