//! PDB structure fetching from RCSB.

use oligomyx_common::{OligomyxError, PdbId, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Which coordinate file to use for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructureFileKind {
    /// Deposited asymmetric unit, `<id>.pdb`
    #[default]
    AsymmetricUnit,
    /// First biological assembly, `<id>.pdb1` (one MODEL per copy)
    BiologicalAssembly,
}

impl StructureFileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::AsymmetricUnit => "pdb",
            Self::BiologicalAssembly => "pdb1",
        }
    }

    /// Local file name, lower-case id.
    pub fn file_name(&self, id: &PdbId) -> String {
        format!("{}.{}", id.to_file_stem(), self.extension())
    }
}

/// Client for downloading PDB files into a local directory.
pub struct StructureFetcher {
    client: Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl StructureFetcher {
    /// Create a new StructureFetcher writing into `cache_dir`.
    pub fn new<P: AsRef<Path>>(cache_dir: P, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oligomyx/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir: cache_dir.as_ref().to_path_buf(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Download URL for an entry, e.g. `https://files.rcsb.org/download/1ABC.pdb1`.
    pub fn url_for(&self, id: &PdbId, kind: StructureFileKind) -> String {
        format!("{}/{}.{}", self.base_url, id.as_str(), kind.extension())
    }

    /// Fetch a PDB file by its ID, reusing a previous download.
    pub async fn fetch(&self, id: &PdbId, kind: StructureFileKind) -> Result<PathBuf> {
        let file_path = self.cache_dir.join(kind.file_name(id));

        if fs::try_exists(&file_path).await.unwrap_or(false) {
            debug!("PDB {} found in cache", id);
            return Ok(file_path);
        }

        let url = self.url_for(id, kind);
        info!("Fetching PDB {} from {}", id, url);
        let response = self.client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(OligomyxError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{url} returned 404"),
            )));
        }
        let content = response.error_for_status()?.bytes().await?;

        // Write beside the target and rename so readers never see a partial file
        fs::create_dir_all(&self.cache_dir).await?;
        let partial = file_path.with_extension(format!("{}.part", kind.extension()));
        fs::write(&partial, &content).await?;
        fs::rename(&partial, &file_path).await?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_url_and_file_names() {
        let dir = tempdir().unwrap();
        let fetcher =
            StructureFetcher::new(dir.path(), "https://files.rcsb.org/download/", Duration::from_secs(5)).unwrap();
        let id = PdbId::parse("1crn").unwrap();

        assert_eq!(
            fetcher.url_for(&id, StructureFileKind::BiologicalAssembly),
            "https://files.rcsb.org/download/1CRN.pdb1"
        );
        assert_eq!(StructureFileKind::AsymmetricUnit.file_name(&id), "1crn.pdb");
    }

    #[tokio::test]
    async fn test_cached_file_short_circuits_download() {
        let dir = tempdir().unwrap();
        let cached = dir.path().join("1crn.pdb");
        std::fs::write(&cached, "END\n").unwrap();

        // Unroutable base URL: any network access would fail the test
        let fetcher = StructureFetcher::new(dir.path(), "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let id = PdbId::parse("1CRN").unwrap();
        let path = fetcher.fetch(&id, StructureFileKind::AsymmetricUnit).await.unwrap();
        assert_eq!(path, cached);
    }

    #[tokio::test]
    #[ignore] // Requires network access to RCSB
    async fn test_fetch_pdb() {
        let dir = tempdir().unwrap();
        let fetcher =
            StructureFetcher::new(dir.path(), "https://files.rcsb.org/download", Duration::from_secs(30)).unwrap();

        // Fetch a small, known PDB (1CRN - Crambin)
        let id = PdbId::parse("1CRN").unwrap();
        let path = fetcher.fetch(&id, StructureFileKind::AsymmetricUnit).await.unwrap();
        assert!(path.exists());
    }
}
