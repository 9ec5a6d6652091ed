//! Per-run pipeline configuration.
//!
//! Users define thresholds via TOML/YAML/JSON; CLI flags override individual
//! values. `validate()` must pass before any stage runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::entities::SizeMetric;
use crate::error::{OligomyxError, Result};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "oligomyx.toml";

/// Environment variable that overrides the config file path.
pub const CONFIG_ENV_VAR: &str = "OLIGOMYX_CONFIG";

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where structures and annotations come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Cluster file extraction
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Size filter bounds
    #[serde(default)]
    pub size: SizeConfig,

    /// Chain count and homo-oligomer criteria
    #[serde(default)]
    pub stoichiometry: StoichiometryConfig,

    /// Secondary structure composition bounds
    #[serde(default)]
    pub secondary_structure: SecondaryStructureConfig,

    /// Metric ranking
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Concurrency and timeouts
    #[serde(default)]
    pub execution: ExecutionConfig,
}

// ── Structure Source ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding `<id>.pdb` files
    #[serde(default = "default_structure_dir")]
    pub structure_dir: PathBuf,

    /// Download missing structures from RCSB into `structure_dir`
    #[serde(default)]
    pub fetch_missing: bool,

    #[serde(default = "default_rcsb_url")]
    pub rcsb_base_url: String,

    /// Use the first biological assembly (`<id>.pdb1`) instead of the
    /// asymmetric unit
    #[serde(default)]
    pub biological_assembly: bool,

    /// Structures with a worse (larger) resolution in Å are skipped
    #[serde(default)]
    pub max_resolution: Option<f64>,

    /// Directory holding volumizer annotation JSON files (`<id>.json`)
    #[serde(default = "default_annotation_dir")]
    pub annotation_dir: PathBuf,

    /// External volumizer; when set, missing annotations are generated
    #[serde(default)]
    pub volumizer: Option<VolumizerConfig>,
}

fn default_structure_dir() -> PathBuf { PathBuf::from("./data/structures") }
fn default_rcsb_url() -> String { "https://files.rcsb.org/download".to_string() }
fn default_annotation_dir() -> PathBuf { PathBuf::from("./data/annotations") }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            structure_dir: default_structure_dir(),
            fetch_missing: false,
            rcsb_base_url: default_rcsb_url(),
            biological_assembly: false,
            max_resolution: None,
            annotation_dir: default_annotation_dir(),
            volumizer: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumizerConfig {
    pub executable: PathBuf,
    /// Voxel edge length passed as `--resolution`
    #[serde(default)]
    pub voxel_size: Option<f64>,
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Which members of each cluster line are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
    #[default]
    Representatives,
    AllMembers,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default)]
    pub mode: ClusterMode,
}

// ── Size ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeConfig {
    #[serde(default)]
    pub metric: SizeMetric,

    #[serde(default = "default_min_size")]
    pub min_size: u64,

    /// Unbounded when absent
    #[serde(default)]
    pub max_size: Option<u64>,

    /// Further per-measure bounds; every one given must hold as well
    #[serde(default)]
    pub atoms: Option<SizeBounds>,
    #[serde(default)]
    pub residues: Option<SizeBounds>,
    #[serde(default)]
    pub chains: Option<SizeBounds>,
}

fn default_min_size() -> u64 { 1 }

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            metric: SizeMetric::default(),
            min_size: default_min_size(),
            max_size: None,
            atoms: None,
            residues: None,
            chains: None,
        }
    }
}

impl SizeConfig {
    /// The per-measure bounds that are set.
    pub fn extra_bounds(&self) -> Vec<(SizeMetric, SizeBounds)> {
        [
            (SizeMetric::Atoms, self.atoms),
            (SizeMetric::Residues, self.residues),
            (SizeMetric::Chains, self.chains),
        ]
        .into_iter()
        .filter_map(|(metric, bounds)| bounds.map(|b| (metric, b)))
        .collect()
    }
}

/// Inclusive bounds on one size measure; a missing side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeBounds {
    #[serde(default)]
    pub min: Option<u64>,
    #[serde(default)]
    pub max: Option<u64>,
}

impl SizeBounds {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

// ── Stoichiometry ─────────────────────────────────────────────────────────────

/// How chain sequences are judged identical.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    #[default]
    Exact,
    /// Global-alignment identity cutoff in (0, 1]
    MinIdentity(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoichiometryConfig {
    #[serde(default = "default_min_chains")]
    pub min_chains: u32,

    #[serde(default)]
    pub max_chains: Option<u32>,

    /// All chains must belong to one sequence cluster
    #[serde(default = "default_true")]
    pub require_homomer: bool,

    /// Only consulted when `require_homomer` is false
    #[serde(default = "default_min_unique")]
    pub min_unique_chains: u32,

    #[serde(default)]
    pub max_unique_chains: Option<u32>,

    /// Every cluster count must divide the largest one (e.g. 8-4-2)
    #[serde(default)]
    pub factorable: bool,

    #[serde(default)]
    pub identity: IdentityPolicy,
}

fn default_min_chains() -> u32 { 1 }
fn default_min_unique() -> u32 { 1 }
fn default_true() -> bool { true }

impl Default for StoichiometryConfig {
    fn default() -> Self {
        Self {
            min_chains: default_min_chains(),
            max_chains: None,
            require_homomer: true,
            min_unique_chains: default_min_unique(),
            max_unique_chains: None,
            factorable: false,
            identity: IdentityPolicy::default(),
        }
    }
}

// ── Secondary Structure ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryStructureConfig {
    /// Minimum helix fraction
    #[serde(default)]
    pub helix_threshold: f64,
    #[serde(default = "default_one")]
    pub max_helix: f64,
    #[serde(default)]
    pub min_strand: f64,
    #[serde(default = "default_one")]
    pub max_strand: f64,
    #[serde(default)]
    pub min_coil: f64,
    #[serde(default = "default_one")]
    pub max_coil: f64,
}

fn default_one() -> f64 { 1.0 }

impl Default for SecondaryStructureConfig {
    fn default() -> Self {
        Self {
            helix_threshold: 0.0,
            max_helix: 1.0,
            min_strand: 0.0,
            max_strand: 1.0,
            min_coil: 0.0,
            max_coil: 1.0,
        }
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    /// Larger is better
    Descending,
    /// Smaller is better (costs)
    Ascending,
}

impl FromStr for RankDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "descending" | "desc" => Ok(Self::Descending),
            "ascending" | "asc" => Ok(Self::Ascending),
            other => Err(format!("unknown rank direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Explicit direction; inferred from `cost_metrics` when absent
    #[serde(default)]
    pub direction: Option<RankDirection>,

    /// Metrics where lower values are better
    #[serde(default)]
    pub cost_metrics: Vec<String>,

    #[serde(default)]
    pub top_k: Option<usize>,
}

fn default_metric() -> String { "volume".to_string() }

impl Default for RankingConfig {
    fn default() -> Self {
        Self { metric: default_metric(), direction: None, cost_metrics: vec![], top_k: None }
    }
}

impl RankingConfig {
    pub fn resolved_direction(&self) -> RankDirection {
        match self.direction {
            Some(direction) => direction,
            None if self.cost_metrics.iter().any(|m| m == &self.metric) => RankDirection::Ascending,
            None => RankDirection::Descending,
        }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Lookups in flight at once within a stage
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-identifier timeout for every external call
    #[serde(default = "default_timeout")]
    pub lookup_timeout_secs: u64,

    /// Write `<output>.report.json` next to each stage output
    #[serde(default)]
    pub write_reports: bool,
}

fn default_concurrency() -> usize { 4 }
fn default_timeout() -> u64 { 60 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            lookup_timeout_secs: default_timeout(),
            write_reports: false,
        }
    }
}

// ── Loading & Validation ──────────────────────────────────────────────────────

impl PipelineConfig {
    /// Load from `path`, or from `OLIGOMYX_CONFIG` / `oligomyx.toml`.
    /// A missing default file yields the default configuration; an explicit
    /// path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let path = std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        if path.exists() {
            Self::from_file(&path)
        } else {
            tracing::debug!("No config file at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load by file extension: `.yaml`/`.yml`, `.json`, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        let config = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => toml::from_str(&content)?,
        };
        Ok(config)
    }

    /// Reject thresholds that make a stage meaningless.
    pub fn validate(&self) -> Result<()> {
        let size = &self.size;
        if let Some(max) = size.max_size {
            if max < size.min_size {
                return config_err(format!(
                    "size.max_size ({max}) is smaller than size.min_size ({})",
                    size.min_size
                ));
            }
        }

        for (metric, bounds) in size.extra_bounds() {
            if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
                if max < min {
                    return config_err(format!("size.{metric}.max ({max}) is smaller than min ({min})"));
                }
            }
        }

        let st = &self.stoichiometry;
        if st.min_chains == 0 {
            return config_err("stoichiometry.min_chains must be at least 1".to_string());
        }
        if let Some(max) = st.max_chains {
            if max < st.min_chains {
                return config_err(format!(
                    "stoichiometry.max_chains ({max}) is smaller than min_chains ({})",
                    st.min_chains
                ));
            }
        }
        if let Some(max) = st.max_unique_chains {
            if max < st.min_unique_chains {
                return config_err(format!(
                    "stoichiometry.max_unique_chains ({max}) is smaller than min_unique_chains ({})",
                    st.min_unique_chains
                ));
            }
        }
        if let IdentityPolicy::MinIdentity(cutoff) = st.identity {
            if !(cutoff > 0.0 && cutoff <= 1.0) {
                return config_err(format!("stoichiometry identity cutoff {cutoff} is outside (0, 1]"));
            }
        }

        let ss = &self.secondary_structure;
        for (name, lo, hi) in [
            ("helix", ss.helix_threshold, ss.max_helix),
            ("strand", ss.min_strand, ss.max_strand),
            ("coil", ss.min_coil, ss.max_coil),
        ] {
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) {
                return config_err(format!("secondary_structure {name} bounds must lie in [0, 1]"));
            }
            if hi < lo {
                return config_err(format!("secondary_structure {name} upper bound {hi} is below {lo}"));
            }
        }

        if self.ranking.top_k == Some(0) {
            return config_err("ranking.top_k must be at least 1".to_string());
        }
        if self.ranking.metric.trim().is_empty() {
            return config_err("ranking.metric must not be empty".to_string());
        }

        if let Some(res) = self.source.max_resolution {
            if !(res > 0.0) {
                return config_err(format!("source.max_resolution ({res}) must be positive"));
            }
        }
        if self.execution.concurrency == 0 {
            return config_err("execution.concurrency must be at least 1".to_string());
        }
        if self.execution.lookup_timeout_secs == 0 {
            return config_err("execution.lookup_timeout_secs must be at least 1".to_string());
        }

        Ok(())
    }
}

fn config_err(msg: String) -> Result<()> {
    Err(OligomyxError::Config(msg))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
