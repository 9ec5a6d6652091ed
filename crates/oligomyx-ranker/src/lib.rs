//! oligomyx-ranker: Per-structure metrics and the final ranking stage.

pub mod metric_source;
pub mod scorer;

pub use metric_source::{
    AnnotationMetricSource, CompositeMetricSource, MetricSource, MockMetricSource, StructuralMetricSource,
};
pub use scorer::{MetricsRanker, RankedEntry, Ranking};
