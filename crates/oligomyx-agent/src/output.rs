//! File I/O at the pipeline boundary. Outputs are written to a temporary
//! file beside the target and renamed into place, so a failed run never
//! leaves a partial list behind.

use anyhow::{Context, Result};
use oligomyx_common::PdbId;
use oligomyx_filters::format_id_list;
use oligomyx_ranker::RankedEntry;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn write_id_list(path: &Path, ids: &[PdbId]) -> Result<()> {
    write_atomic(path, &format_id_list(ids))?;
    info!("Wrote {} identifiers to {}", ids.len(), path.display());
    Ok(())
}

/// `id<TAB>value` per line, best first.
pub fn format_ranking(entries: &[RankedEntry]) -> String {
    entries.iter().map(|e| format!("{}\t{}\n", e.id, e.value)).collect()
}

pub fn write_ranking(path: &Path, entries: &[RankedEntry]) -> Result<()> {
    write_atomic(path, &format_ranking(entries))?;
    info!("Wrote {} ranked entries to {}", entries.len(), path.display());
    Ok(())
}

/// `<output>.report.json`
pub fn report_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".report.json");
    output.with_file_name(name)
}

pub fn write_report<T: Serialize>(output: &Path, report: &T) -> Result<PathBuf> {
    let path = report_path(output);
    let json = serde_json::to_string_pretty(report)?;
    write_atomic(&path, &json)?;
    Ok(path)
}
