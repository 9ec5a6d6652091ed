//! Trait for per-structure metric computation.
//!
//! Decouples the ranker from where metrics come from: volumizer
//! annotations, the parsed structure itself, or fixed test data.

use async_trait::async_trait;
use oligomyx_common::{LookupFailure, LookupResult, PdbId};
use oligomyx_structure::annotation::{read_annotation_file, summarize};
use oligomyx_structure::volumizer::VolumizerRunner;
use oligomyx_structure::StructureRepository;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub type Metrics = BTreeMap<String, f64>;

/// Computes named scalar metrics for one structure.
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn name(&self) -> &str;

    async fn metrics(&self, id: &PdbId) -> LookupResult<Metrics>;
}

// ── Mock Implementation for Testing ────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockMetricSource {
    data: HashMap<PdbId, Metrics>,
    failures: HashMap<PdbId, LookupFailure>,
}

impl MockMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one metric value for an identifier.
    pub fn with(mut self, id: &str, metric: &str, value: f64) -> Self {
        let id = PdbId::parse(id).unwrap_or_else(|| panic!("mock identifier {id:?} is not a PDB code"));
        self.data.entry(id).or_default().insert(metric.to_string(), value);
        self
    }

    pub fn with_failure(mut self, id: &str, failure: LookupFailure) -> Self {
        let id = PdbId::parse(id).unwrap_or_else(|| panic!("mock identifier {id:?} is not a PDB code"));
        self.failures.insert(id, failure);
        self
    }
}

#[async_trait]
impl MetricSource for MockMetricSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn metrics(&self, id: &PdbId) -> LookupResult<Metrics> {
        if let Some(failure) = self.failures.get(id) {
            return Err(failure.clone());
        }
        self.data.get(id).cloned().ok_or_else(|| LookupFailure::NotFound(id.to_string()))
    }
}

// ── Structural Metrics ───────────────────────────────────────────────────────

/// Metrics derived from the parsed coordinates.
pub struct StructuralMetricSource {
    structures: Arc<StructureRepository>,
}

impl StructuralMetricSource {
    pub const METRICS: &'static [&'static str] = &[
        "file_bytes",
        "atoms",
        "residues",
        "chains",
        "radius_of_gyration",
        "helix_fraction",
        "strand_fraction",
    ];

    pub fn new(structures: Arc<StructureRepository>) -> Self {
        Self { structures }
    }

    pub fn provides(metric: &str) -> bool {
        Self::METRICS.contains(&metric)
    }
}

#[async_trait]
impl MetricSource for StructuralMetricSource {
    fn name(&self) -> &str {
        "structure"
    }

    async fn metrics(&self, id: &PdbId) -> LookupResult<Metrics> {
        let loaded = self.structures.load(id).await?;
        let structure = &loaded.structure;
        let size = structure.size_metrics(loaded.file_bytes);
        let ss = structure.secondary_structure_counts();

        let mut metrics = Metrics::new();
        metrics.insert("file_bytes".into(), size.file_bytes as f64);
        metrics.insert("atoms".into(), size.atoms as f64);
        metrics.insert("residues".into(), size.residues as f64);
        metrics.insert("chains".into(), size.chains as f64);
        // undefined values are left out so ranking on them reports a missing metric
        if let Some(rg) = structure.radius_of_gyration() {
            metrics.insert("radius_of_gyration".into(), rg);
        }
        if let Some(f) = ss.helix_fraction() {
            metrics.insert("helix_fraction".into(), f);
        }
        if let Some(f) = ss.strand_fraction() {
            metrics.insert("strand_fraction".into(), f);
        }
        Ok(metrics)
    }
}

// ── Volumizer Annotations ────────────────────────────────────────────────────

/// Metrics summarised from volumizer annotation files (`<dir>/<id>.json`).
///
/// With a runner configured, missing annotations are generated from the
/// structure file first.
pub struct AnnotationMetricSource {
    annotation_dir: PathBuf,
    volumizer: Option<(VolumizerRunner, Arc<StructureRepository>)>,
}

impl AnnotationMetricSource {
    pub fn new<P: AsRef<Path>>(annotation_dir: P) -> Self {
        Self { annotation_dir: annotation_dir.as_ref().to_path_buf(), volumizer: None }
    }

    pub fn with_volumizer(mut self, runner: VolumizerRunner, structures: Arc<StructureRepository>) -> Self {
        self.volumizer = Some((runner, structures));
        self
    }

    pub fn annotation_path(&self, id: &PdbId) -> PathBuf {
        self.annotation_dir.join(format!("{}.json", id.to_file_stem()))
    }

    async fn ensure_annotation(&self, id: &PdbId) -> LookupResult<PathBuf> {
        let path = self.annotation_path(id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        let Some((runner, structures)) = &self.volumizer else {
            return Err(LookupFailure::NotFound(format!("no annotation at {}", path.display())));
        };
        let loaded = structures.load(id).await?;
        debug!("Generating annotation for {}", id);
        runner
            .run(&loaded.path, &path)
            .await
            .map_err(|e| LookupFailure::Tool(e.to_string()))
    }
}

#[async_trait]
impl MetricSource for AnnotationMetricSource {
    fn name(&self) -> &str {
        "volumizer"
    }

    async fn metrics(&self, id: &PdbId) -> LookupResult<Metrics> {
        let path = self.ensure_annotation(id).await?;
        let annotations = read_annotation_file(&path).await.map_err(LookupFailure::from)?;
        Ok(summarize(&annotations))
    }
}

// ── Composite ────────────────────────────────────────────────────────────────

/// Merges the metrics of several sources; on name clashes the earlier
/// source wins. A failing required source fails the identifier, a failing
/// optional source only contributes nothing.
#[derive(Default)]
pub struct CompositeMetricSource {
    sources: Vec<(Box<dyn MetricSource>, bool)>,
}

impl CompositeMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source whose failure excludes the identifier.
    pub fn with<S: MetricSource + 'static>(mut self, source: S) -> Self {
        self.sources.push((Box::new(source), true));
        self
    }

    /// Add a best-effort source.
    pub fn with_optional<S: MetricSource + 'static>(mut self, source: S) -> Self {
        self.sources.push((Box::new(source), false));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl MetricSource for CompositeMetricSource {
    fn name(&self) -> &str {
        "composite"
    }

    async fn metrics(&self, id: &PdbId) -> LookupResult<Metrics> {
        let mut merged = Metrics::new();
        for (source, required) in &self.sources {
            let metrics = match source.metrics(id).await {
                Ok(metrics) => metrics,
                Err(e) if !required => {
                    debug!("Skipping {} metrics for {}: {}", source.name(), id, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            for (name, value) in metrics {
                merged.entry(name).or_insert(value);
            }
        }
        Ok(merged)
    }
}
