//! Pore and cavity annotation using an external volumizer executable.

use oligomyx_common::{OligomyxError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Wrapper for volumizer execution.
///
/// Invoked as `<exe> <structure> --output <annotation.json> [--resolution <voxel>]`.
pub struct VolumizerRunner {
    executable_path: PathBuf,
    voxel_size: Option<f64>,
}

impl VolumizerRunner {
    /// Create a new VolumizerRunner.
    pub fn new<P: AsRef<Path>>(executable_path: P, voxel_size: Option<f64>) -> Self {
        Self {
            executable_path: executable_path.as_ref().to_path_buf(),
            voxel_size,
        }
    }

    /// Run the volumizer on a structure file and return the annotation path.
    ///
    /// The tool writes to `<out>.part`, renamed to `out` only after a clean exit.
    pub async fn run(&self, structure: &Path, out: &Path) -> Result<PathBuf> {
        info!("Running volumizer on {:?}", structure);

        if let Some(parent) = out.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = out.with_extension("json.part");
        let _ = tokio::fs::remove_file(&partial).await;

        let mut command = Command::new(&self.executable_path);
        command.arg(structure).arg("--output").arg(&partial).kill_on_drop(true);
        if let Some(voxel) = self.voxel_size {
            command.arg("--resolution").arg(voxel.to_string());
        }

        let output = command.output().await?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&partial).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OligomyxError::Pipeline(format!("volumizer failed: {}", stderr.trim())));
        }

        if !tokio::fs::try_exists(&partial).await.unwrap_or(false) {
            return Err(OligomyxError::Pipeline(format!("volumizer output not found: {:?}", partial)));
        }
        tokio::fs::rename(&partial, out).await?;

        debug!("volumizer completed successfully. Output in {:?}", out);
        Ok(out.to_path_buf())
    }
}
