//! Per-run structure access: local lookup, optional RCSB fetch, parsing
//! and the resolution cutoff. Each identifier is loaded at most once.

use oligomyx_common::pipeline_config::SourceConfig;
use oligomyx_common::{LookupFailure, PdbId, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::parser::{parse_pdb_str, ModelSelection, Structure};
use crate::pdb::{StructureFetcher, StructureFileKind};

/// A parsed structure together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedStructure {
    pub id: PdbId,
    pub path: PathBuf,
    pub file_bytes: u64,
    pub structure: Structure,
}

type LoadOutcome = std::result::Result<Arc<LoadedStructure>, LookupFailure>;

pub struct StructureRepository {
    structure_dir: PathBuf,
    kind: StructureFileKind,
    fetcher: Option<StructureFetcher>,
    max_resolution: Option<f64>,
    loaded: Mutex<HashMap<PdbId, LoadOutcome>>,
}

impl StructureRepository {
    /// Local-only repository over `structure_dir`.
    pub fn new<P: AsRef<Path>>(structure_dir: P, kind: StructureFileKind) -> Self {
        Self {
            structure_dir: structure_dir.as_ref().to_path_buf(),
            kind,
            fetcher: None,
            max_resolution: None,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Build from the `[source]` config section. The fetcher's HTTP timeout
    /// is the per-lookup timeout.
    pub fn from_config(source: &SourceConfig, lookup_timeout: Duration) -> Result<Self> {
        let kind = if source.biological_assembly {
            StructureFileKind::BiologicalAssembly
        } else {
            StructureFileKind::AsymmetricUnit
        };
        let mut repo = Self::new(&source.structure_dir, kind).with_max_resolution(source.max_resolution);
        if source.fetch_missing {
            repo = repo.with_fetcher(StructureFetcher::new(
                &source.structure_dir,
                &source.rcsb_base_url,
                lookup_timeout,
            )?);
        }
        Ok(repo)
    }

    pub fn with_fetcher(mut self, fetcher: StructureFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_max_resolution(mut self, cutoff: Option<f64>) -> Self {
        self.max_resolution = cutoff;
        self
    }

    pub fn structure_dir(&self) -> &Path {
        &self.structure_dir
    }

    pub fn file_kind(&self) -> StructureFileKind {
        self.kind
    }

    /// File names tried for an entry, in order.
    fn candidates(&self, id: &PdbId) -> Vec<PathBuf> {
        let stem = id.to_file_stem();
        let ext = self.kind.extension();
        let mut names = vec![format!("{stem}.{ext}"), format!("{}.{ext}", id.as_str())];
        if self.kind == StructureFileKind::AsymmetricUnit {
            names.push(format!("pdb{stem}.ent"));
        }
        names.into_iter().map(|n| self.structure_dir.join(n)).collect()
    }

    /// First existing local file for an entry.
    pub async fn locate(&self, id: &PdbId) -> Option<PathBuf> {
        for path in self.candidates(id) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    /// Load and parse a structure, reusing the outcome of any earlier call
    /// for the same identifier.
    pub async fn load(&self, id: &PdbId) -> LoadOutcome {
        if let Some(outcome) = self.loaded.lock().await.get(id) {
            return outcome.clone();
        }

        let outcome = self.load_uncached(id).await.map(Arc::new);
        if let Err(failure) = &outcome {
            warn!("Structure {} unavailable: {}", id, failure);
        }
        self.loaded.lock().await.insert(id.clone(), outcome.clone());
        outcome
    }

    async fn load_uncached(&self, id: &PdbId) -> std::result::Result<LoadedStructure, LookupFailure> {
        let path = match self.locate(id).await {
            Some(path) => path,
            None => match &self.fetcher {
                Some(fetcher) => fetcher.fetch(id, self.kind).await.map_err(|e| match LookupFailure::from(e) {
                    LookupFailure::Parse(msg) => LookupFailure::Download(msg),
                    other => other,
                })?,
                None => {
                    return Err(LookupFailure::NotFound(format!(
                        "no structure file for {} in {}",
                        id,
                        self.structure_dir.display()
                    )))
                }
            },
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LookupFailure::Parse(format!("{}: {}", path.display(), e)))?;
        let file_bytes = text.len() as u64;

        let models = match self.kind {
            StructureFileKind::AsymmetricUnit => ModelSelection::First,
            StructureFileKind::BiologicalAssembly => ModelSelection::All,
        };
        let structure = tokio::task::spawn_blocking(move || parse_pdb_str(&text, models))
            .await
            .map_err(|e| LookupFailure::Parse(e.to_string()))?
            .map_err(LookupFailure::from)?;

        if let (Some(cutoff), Some(resolution)) = (self.max_resolution, structure.resolution) {
            if resolution > cutoff {
                return Err(LookupFailure::ResolutionTooLow { resolution, cutoff });
            }
        }

        debug!("Loaded {} from {} ({} atoms)", id, path.display(), structure.atoms.len());
        Ok(LoadedStructure { id: id.clone(), path, file_bytes, structure })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oligomyx_test_utils::{homo_oligomer, tempdir, ATOMS_PER_RESIDUE};

    fn id(s: &str) -> PdbId {
        PdbId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = tempdir().unwrap();
        homo_oligomer(2, "MKVL").write_to(dir.path(), "1ABC");
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);

        let loaded = repo.load(&id("1abc")).await.unwrap();
        assert_eq!(loaded.structure.atoms.len(), 2 * 4 * ATOMS_PER_RESIDUE);
        assert!(loaded.file_bytes > 0);
        assert!(loaded.path.ends_with("1abc.pdb"));
    }

    #[tokio::test]
    async fn test_accepts_upper_case_and_ent_names() {
        let dir = tempdir().unwrap();
        let text = homo_oligomer(1, "MK").build();
        std::fs::write(dir.path().join("2XYZ.pdb"), &text).unwrap();
        std::fs::write(dir.path().join("pdb3xyz.ent"), &text).unwrap();
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);

        assert!(repo.load(&id("2XYZ")).await.is_ok());
        assert!(repo.load(&id("3XYZ")).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);
        let err = repo.load(&id("9ZZZ")).await.unwrap_err();
        assert!(matches!(err, LookupFailure::NotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unparseable_file_is_parse_failure() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("4bad.pdb"), "HEADER    NOTHING HERE\nEND\n").unwrap();
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);
        let err = repo.load(&id("4BAD")).await.unwrap_err();
        assert!(matches!(err, LookupFailure::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_resolution_cutoff() {
        let dir = tempdir().unwrap();
        homo_oligomer(1, "MKV").resolution(3.5).write_to(dir.path(), "5LOW");
        homo_oligomer(1, "MKV").resolution(1.8).write_to(dir.path(), "5HIG");
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit)
            .with_max_resolution(Some(2.5));

        let err = repo.load(&id("5LOW")).await.unwrap_err();
        assert_eq!(err, LookupFailure::ResolutionTooLow { resolution: 3.5, cutoff: 2.5 });
        assert!(repo.load(&id("5HIG")).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_load_reuses_parsed_structure() {
        let dir = tempdir().unwrap();
        let path = homo_oligomer(3, "GGS").write_to(dir.path(), "6MEM");
        let repo = StructureRepository::new(dir.path(), StructureFileKind::AsymmetricUnit);

        let first = repo.load(&id("6MEM")).await.unwrap();
        std::fs::remove_file(path).unwrap();
        let second = repo.load(&id("6MEM")).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_from_config_selects_assembly_files() {
        let dir = tempdir().unwrap();
        let source = SourceConfig {
            structure_dir: dir.path().to_path_buf(),
            biological_assembly: true,
            ..Default::default()
        };
        let repo = StructureRepository::from_config(&source, Duration::from_secs(5)).unwrap();
        assert_eq!(repo.file_kind(), StructureFileKind::BiologicalAssembly);
        assert!(repo.fetcher.is_none());
        assert_eq!(repo.candidates(&id("1ABC"))[0], dir.path().join("1abc.pdb1"));
    }
}
