/// Core entity types shared by the filtering stages and the ranker.
/// Structure-derived records are produced by collaborators on demand and
/// never persisted by the pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref PDB_CODE: Regex = Regex::new(r"^[0-9][A-Z0-9]{3}$").unwrap();
}

/// Length of a classic four-character PDB code.
pub const PDB_ID_LENGTH: usize = 4;

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A normalised PDB entry code (upper case, four characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PdbId(String);

impl PdbId {
    /// Parse a token, dropping resolution (`1abc.3.0`) and entity (`1ABC_1`)
    /// suffixes. The remaining code must be exactly four characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = strip_suffixes(raw).to_ascii_uppercase();
        PDB_CODE.is_match(&code).then(|| Self(code))
    }

    /// Like [`PdbId::parse`], but truncates longer codes to four characters
    /// (e.g. `1ABCA` with a trailing chain letter).
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        let code = strip_suffixes(raw);
        let truncated: String = code.chars().take(PDB_ID_LENGTH).collect();
        Self::parse(&truncated)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used for file names.
    pub fn to_file_stem(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

fn strip_suffixes(raw: &str) -> &str {
    let token = raw.trim();
    let token = token.split('.').next().unwrap_or("");
    token.split('_').next().unwrap_or("")
}

impl fmt::Display for PdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PdbId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid PDB identifier: {s:?}"))
    }
}

impl TryFrom<String> for PdbId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PdbId> for String {
    fn from(id: PdbId) -> Self {
        id.0
    }
}

impl AsRef<str> for PdbId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Size
// ---------------------------------------------------------------------------

/// Which size measure the size filter bounds apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    FileBytes,
    #[default]
    Atoms,
    Residues,
    Chains,
}

impl FromStr for SizeMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "file_bytes" | "bytes" => Ok(Self::FileBytes),
            "atoms" => Ok(Self::Atoms),
            "residues" => Ok(Self::Residues),
            "chains" => Ok(Self::Chains),
            other => Err(format!("unknown size metric: {other}")),
        }
    }
}

impl fmt::Display for SizeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileBytes => "file_bytes",
            Self::Atoms => "atoms",
            Self::Residues => "residues",
            Self::Chains => "chains",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeMetrics {
    pub file_bytes: u64,
    pub atoms: u64,
    pub residues: u64,
    pub chains: u64,
}

impl SizeMetrics {
    pub fn get(&self, metric: SizeMetric) -> u64 {
        match metric {
            SizeMetric::FileBytes => self.file_bytes,
            SizeMetric::Atoms => self.atoms,
            SizeMetric::Residues => self.residues,
            SizeMetric::Chains => self.chains,
        }
    }
}

// ---------------------------------------------------------------------------
// Stoichiometry
// ---------------------------------------------------------------------------

/// Assembly type reported directly by a lookup, bypassing sequence comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OligomericState {
    Homomer,
    Heteromer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSequence {
    pub chain_id: String,
    /// One-letter residue codes; unknown residues are `X`.
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainComposition {
    pub chains: Vec<ChainSequence>,
    pub reported_state: Option<OligomericState>,
}

impl ChainComposition {
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }
}

// ---------------------------------------------------------------------------
// Secondary structure
// ---------------------------------------------------------------------------

/// Residue counts by secondary-structure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecondaryStructureCounts {
    pub helix: u64,
    pub strand: u64,
    pub total: u64,
}

impl SecondaryStructureCounts {
    /// Helix fraction, or `None` when the structure has no resolved residues.
    pub fn helix_fraction(&self) -> Option<f64> {
        self.fraction(self.helix)
    }

    pub fn strand_fraction(&self) -> Option<f64> {
        self.fraction(self.strand)
    }

    pub fn coil_fraction(&self) -> Option<f64> {
        self.fraction(self.total.saturating_sub(self.helix + self.strand))
    }

    fn fraction(&self, count: u64) -> Option<f64> {
        (self.total > 0).then(|| count as f64 / self.total as f64)
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Named scalar metrics computed for one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub id: PdbId,
    pub metrics: BTreeMap<String, f64>,
}
