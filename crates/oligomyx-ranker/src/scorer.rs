//! Final ranking stage: order surviving structures by one metric.

use oligomyx_common::entities::MetricResult;
use oligomyx_common::pipeline_config::{RankDirection, RankingConfig};
use oligomyx_common::report::{Exclusion, StageReport};
use oligomyx_common::{LookupFailure, PdbId};
use oligomyx_filters::stage::{evaluate, StageContext};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

use crate::metric_source::MetricSource;

/// One ranked structure with the value it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: PdbId,
    pub value: f64,
    /// Every metric the source computed for this structure
    pub metrics: BTreeMap<String, f64>,
}

/// Winners in rank order plus the stage diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedEntry>,
    pub report: StageReport,
}

impl Ranking {
    pub fn winners(&self) -> Vec<(PdbId, f64)> {
        self.entries.iter().map(|e| (e.id.clone(), e.value)).collect()
    }
}

pub struct MetricsRanker {
    metric: String,
    direction: RankDirection,
    top_k: Option<usize>,
}

impl MetricsRanker {
    pub fn new(metric: &str, direction: RankDirection) -> Self {
        Self { metric: metric.to_string(), direction, top_k: None }
    }

    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            metric: config.metric.clone(),
            direction: config.resolved_direction(),
            top_k: config.top_k,
        }
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Pick the ranking value out of a metric result.
    pub fn value_of(&self, result: &MetricResult) -> Result<f64, LookupFailure> {
        match result.metrics.get(&self.metric) {
            Some(v) if v.is_finite() => Ok(*v),
            _ => Err(LookupFailure::MissingMetric(self.metric.clone())),
        }
    }

    /// Sort by value in the configured direction, ties in identifier order.
    pub fn sort(&self, entries: &mut [RankedEntry]) {
        let direction = self.direction;
        entries.sort_by(|a, b| {
            let by_value = match direction {
                RankDirection::Descending => b.value.partial_cmp(&a.value),
                RankDirection::Ascending => a.value.partial_cmp(&b.value),
            };
            by_value.unwrap_or(Ordering::Equal).then_with(|| a.id.cmp(&b.id))
        });
    }

    /// Rank computed results. Results without a finite value for the metric
    /// and results beyond `top_k` are excluded.
    pub fn rank_results(&self, results: Vec<MetricResult>, report: &mut StageReport) -> Vec<RankedEntry> {
        let mut entries = Vec::with_capacity(results.len());
        for result in results {
            match self.value_of(&result) {
                Ok(value) => entries.push(RankedEntry { id: result.id, value, metrics: result.metrics }),
                Err(failure) => {
                    warn!(stage = "rank", id = %result.id, "Lookup failed: {}", failure);
                    report.excluded.push(Exclusion::lookup_failed(result.id, failure));
                }
            }
        }

        self.sort(&mut entries);

        if let Some(k) = self.top_k {
            let cut_at = k.min(entries.len());
            for (rank, cut) in entries.drain(cut_at..).enumerate() {
                debug!(stage = "rank", id = %cut.id, "Outside top {}", k);
                report.excluded.push(Exclusion::rejected(cut.id, format!("rank {} outside top {}", k + rank + 1, k)));
            }
        }

        report.kept = entries.iter().map(|e| e.id.clone()).collect();
        entries
    }

    #[instrument(skip_all, fields(metric = %self.metric, n = ids.len()))]
    pub async fn rank(&self, ctx: &StageContext, ids: &[PdbId], source: &dyn MetricSource) -> Ranking {
        let mut report = StageReport::new(ctx.run_id, "rank", ids.len());
        let mut results = Vec::new();

        for (id, outcome) in evaluate(ctx, ids, |id| async move { source.metrics(&id).await }).await {
            match outcome {
                Ok(metrics) => results.push(MetricResult { id, metrics }),
                Err(failure) => {
                    warn!(stage = "rank", id = %id, source = source.name(), "Lookup failed: {}", failure);
                    report.excluded.push(Exclusion::lookup_failed(id, failure));
                }
            }
        }

        let entries = self.rank_results(results, &mut report);
        info!(
            stage = "rank",
            input = report.input_count,
            ranked = entries.len(),
            excluded = report.excluded.len(),
            "Stage complete"
        );
        Ranking { entries, report: report.finish() }
    }
}
