use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OligomyxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Structure parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OligomyxError>;

/// Outcome of one per-identifier collaborator call.
pub type LookupResult<T> = std::result::Result<T, LookupFailure>;

/// Why a collaborator could not produce data for one identifier.
///
/// Lookup failures are per-item: the identifier is excluded from the
/// stage output and the failure is recorded in the stage report.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LookupFailure {
    #[error("structure not found: {0}")]
    NotFound(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("unparseable structure: {0}")]
    Parse(String),

    #[error("resolution {resolution:.2} Å exceeds cutoff {cutoff:.2} Å")]
    ResolutionTooLow { resolution: f64, cutoff: f64 },

    /// Elapsed limit in milliseconds
    #[error("lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("metric '{0}' unavailable")]
    MissingMetric(String),

    #[error("external tool failed: {0}")]
    Tool(String),
}

impl From<OligomyxError> for LookupFailure {
    fn from(err: OligomyxError) -> Self {
        match err {
            OligomyxError::Http(e) => LookupFailure::Download(e.to_string()),
            OligomyxError::Parse(msg) => LookupFailure::Parse(msg),
            OligomyxError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                LookupFailure::NotFound(e.to_string())
            }
            other => LookupFailure::Parse(other.to_string()),
        }
    }
}
