//! Shared per-stage driver.
//!
//! Lookups for one stage run as a bounded, order-preserving stream of
//! futures on the calling task. Each lookup has its own timeout, and the
//! outcome of every identifier is recorded in a [`StageReport`].

use futures_util::stream::{self, StreamExt};
use oligomyx_common::pipeline_config::ExecutionConfig;
use oligomyx_common::report::{Exclusion, StageReport};
use oligomyx_common::{LookupFailure, LookupResult, PdbId};
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-run settings shared by every stage.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub run_id: Uuid,
    /// Maximum number of lookups in flight
    pub concurrency: usize,
    pub lookup_timeout: Duration,
}

impl StageContext {
    pub fn new(concurrency: usize, lookup_timeout: Duration) -> Self {
        Self { run_id: Uuid::new_v4(), concurrency, lookup_timeout }
    }

    pub fn from_config(execution: &ExecutionConfig) -> Self {
        Self::new(execution.concurrency, Duration::from_secs(execution.lookup_timeout_secs))
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }
}

impl Default for StageContext {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

/// Decision for one identifier whose lookup succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Keep,
    Reject(String),
}

/// Drop repeated identifiers, keeping first positions.
pub fn unique_ids(ids: &[PdbId]) -> Vec<PdbId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

/// Run `lookup` for every unique identifier, at most `ctx.concurrency` at a
/// time. Results come back in input order; a lookup that exceeds
/// `ctx.lookup_timeout` yields [`LookupFailure::Timeout`].
pub async fn evaluate<T, F, Fut>(ctx: &StageContext, ids: &[PdbId], lookup: F) -> Vec<(PdbId, LookupResult<T>)>
where
    F: Fn(PdbId) -> Fut,
    Fut: Future<Output = LookupResult<T>>,
{
    let timeout = ctx.lookup_timeout;
    stream::iter(unique_ids(ids))
        .map(|id| {
            let pending = lookup(id.clone());
            async move {
                let outcome = match tokio::time::timeout(timeout, pending).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(LookupFailure::Timeout(timeout.as_millis() as u64)),
                };
                (id, outcome)
            }
        })
        .buffered(ctx.concurrency.max(1))
        .collect()
        .await
}

/// Evaluate a filter stage: look up each identifier, then keep or reject it
/// with `judge`. Lookup failures exclude the identifier and are logged.
pub async fn run_filter<T, F, Fut, J>(
    ctx: &StageContext,
    stage: &str,
    ids: &[PdbId],
    lookup: F,
    judge: J,
) -> StageReport
where
    F: Fn(PdbId) -> Fut,
    Fut: Future<Output = LookupResult<T>>,
    J: Fn(&T) -> Verdict,
{
    let mut report = StageReport::new(ctx.run_id, stage, ids.len());

    for (id, outcome) in evaluate(ctx, ids, lookup).await {
        match outcome {
            Ok(data) => match judge(&data) {
                Verdict::Keep => report.kept.push(id),
                Verdict::Reject(detail) => {
                    debug!(stage, id = %id, "Rejected: {}", detail);
                    report.excluded.push(Exclusion::rejected(id, detail));
                }
            },
            Err(failure) => {
                warn!(stage, id = %id, "Lookup failed: {}", failure);
                report.excluded.push(Exclusion::lookup_failed(id, failure));
            }
        }
    }

    info!(
        stage,
        input = report.input_count,
        kept = report.kept.len(),
        excluded = report.excluded.len(),
        "Stage complete"
    );
    report.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use oligomyx_common::report::ExclusionReason;

    fn ids(raw: &[&str]) -> Vec<PdbId> {
        raw.iter().map(|s| PdbId::parse(s).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_results_keep_input_order_and_drop_duplicates() {
        let ctx = StageContext::new(3, Duration::from_secs(5));
        let input = ids(&["3DEF", "1ABC", "3DEF", "2XYZ"]);
        let out = evaluate(&ctx, &input, |id| async move {
            // later items finish first
            let wait = if id.as_str() == "3DEF" { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(wait)).await;
            Ok::<_, LookupFailure>(id.to_string())
        })
        .await;
        let order: Vec<&str> = out.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["3DEF", "1ABC", "2XYZ"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let ctx = StageContext::new(2, Duration::from_secs(5));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let input = ids(&["1AAA", "1AAB", "1AAC", "1AAD", "1AAE"]);

        evaluate(&ctx, &input, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, LookupFailure>(())
            }
        })
        .await;
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_without_stalling_batch() {
        let ctx = StageContext::new(4, Duration::from_millis(50));
        let input = ids(&["1ABC", "2XYZ"]);
        let report = run_filter(
            &ctx,
            "test",
            &input,
            |id| async move {
                if id.as_str() == "2XYZ" {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                Ok::<_, LookupFailure>(())
            },
            |_| Verdict::Keep,
        )
        .await;

        assert_eq!(report.kept, ids(&["1ABC"]));
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(
            report.excluded[0].reason,
            ExclusionReason::LookupFailed { failure: LookupFailure::Timeout(50) }
        );
    }

    #[tokio::test]
    async fn test_rejections_and_failures_are_reported() {
        let ctx = StageContext::default();
        let input = ids(&["1ABC", "2XYZ", "3DEF"]);
        let report = run_filter(
            &ctx,
            "test",
            &input,
            |id| async move {
                match id.as_str() {
                    "3DEF" => Err(LookupFailure::NotFound("3def.pdb".into())),
                    other => Ok(other.to_string()),
                }
            },
            |s: &String| if s == "1ABC" { Verdict::Keep } else { Verdict::Reject("no".into()) },
        )
        .await;

        assert_eq!(report.input_count, 3);
        assert_eq!(report.kept, ids(&["1ABC"]));
        assert_eq!(report.excluded.len(), 2);
        assert_eq!(report.lookup_failures().count(), 1);
    }
}
