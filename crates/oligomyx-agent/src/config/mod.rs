//! Configuration loading for Oligomyx.
//! Reads the file given by `--config`, else `OLIGOMYX_CONFIG` or
//! `oligomyx.toml`, then applies command-line overrides and validates.

use anyhow::Context;
use clap::Args;
use oligomyx_common::entities::SizeMetric;
use oligomyx_common::pipeline_config::{
    ClusterMode, IdentityPolicy, PipelineConfig, RankDirection, VolumizerConfig,
};
use std::path::{Path, PathBuf};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Directory holding `<id>.pdb` files
    #[arg(long, global = true)]
    pub structure_dir: Option<PathBuf>,

    /// Download missing structures from RCSB
    #[arg(long, global = true)]
    pub fetch: bool,

    /// Skip structures with a worse resolution (Å)
    #[arg(long, global = true)]
    pub max_resolution: Option<f64>,

    /// Take every cluster member instead of representatives
    #[arg(long, global = true)]
    pub all_members: bool,

    /// Size measure the bounds apply to: file-bytes, atoms, residues, chains
    #[arg(long, global = true)]
    pub size_metric: Option<SizeMetric>,

    #[arg(long, global = true)]
    pub min_size: Option<u64>,

    #[arg(long, global = true)]
    pub max_size: Option<u64>,

    #[arg(long, global = true)]
    pub min_chains: Option<u32>,

    #[arg(long, global = true)]
    pub max_chains: Option<u32>,

    /// Treat chains as identical above this global-alignment identity
    #[arg(long, global = true)]
    pub min_identity: Option<f64>,

    /// Minimum helix fraction
    #[arg(long, global = true)]
    pub helix_threshold: Option<f64>,

    /// Metric to rank by
    #[arg(long, global = true)]
    pub metric: Option<String>,

    /// Ranking order: ascending (smaller first) or descending
    #[arg(long, global = true)]
    pub direction: Option<RankDirection>,

    #[arg(long, global = true)]
    pub top_k: Option<usize>,

    #[arg(long, global = true)]
    pub annotation_dir: Option<PathBuf>,

    /// Volumizer executable used for missing annotations
    #[arg(long, global = true)]
    pub volumizer: Option<PathBuf>,

    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Per-identifier lookup timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Write `<output>.report.json` diagnostics
    #[arg(long, global = true)]
    pub reports: bool,
}

impl Overrides {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.structure_dir {
            config.source.structure_dir = dir.clone();
        }
        if self.fetch {
            config.source.fetch_missing = true;
        }
        if self.max_resolution.is_some() {
            config.source.max_resolution = self.max_resolution;
        }
        if self.all_members {
            config.extract.mode = ClusterMode::AllMembers;
        }
        if let Some(metric) = self.size_metric {
            config.size.metric = metric;
        }
        if let Some(min) = self.min_size {
            config.size.min_size = min;
        }
        if self.max_size.is_some() {
            config.size.max_size = self.max_size;
        }
        if let Some(min) = self.min_chains {
            config.stoichiometry.min_chains = min;
        }
        if self.max_chains.is_some() {
            config.stoichiometry.max_chains = self.max_chains;
        }
        if let Some(cutoff) = self.min_identity {
            config.stoichiometry.identity = IdentityPolicy::MinIdentity(cutoff);
        }
        if let Some(threshold) = self.helix_threshold {
            config.secondary_structure.helix_threshold = threshold;
        }
        if let Some(metric) = &self.metric {
            config.ranking.metric = metric.clone();
        }
        if self.direction.is_some() {
            config.ranking.direction = self.direction;
        }
        if self.top_k.is_some() {
            config.ranking.top_k = self.top_k;
        }
        if let Some(dir) = &self.annotation_dir {
            config.source.annotation_dir = dir.clone();
        }
        if let Some(exe) = &self.volumizer {
            let voxel_size = config.source.volumizer.as_ref().and_then(|v| v.voxel_size);
            config.source.volumizer = Some(VolumizerConfig { executable: exe.clone(), voxel_size });
        }
        if let Some(n) = self.concurrency {
            config.execution.concurrency = n;
        }
        if let Some(secs) = self.timeout {
            config.execution.lookup_timeout_secs = secs;
        }
        if self.reports {
            config.execution.write_reports = true;
        }
    }
}

/// Load, override and validate. Any error here is fatal before processing.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<PipelineConfig> {
    let mut config = PipelineConfig::load(path).with_context(|| match path {
        Some(p) => format!("Failed to load config from {}", p.display()),
        None => "Failed to load config".to_string(),
    })?;
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

mod tests;
