//! Plan store — the scratch directory where rendered PDFs land.
//!
//! No persistence beyond this directory: files are written once under a
//! unique name and read back by the download route.

use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

/// File-system store for rendered plans.
#[derive(Debug, Clone)]
pub struct PlanStore {
    dir: PathBuf,
}

impl PlanStore {
    /// Creates the output directory if it does not exist.
    pub fn new(dir: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Writes the PDF under a unique name and returns the filename.
    pub async fn save(&self, bytes: &[u8]) -> std::io::Result<String> {
        let filename = format!("diet_plan_{}.pdf", Uuid::new_v4());
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes).await?;
        info!("Stored plan PDF at {}", path.display());
        Ok(filename)
    }

    /// Reads a stored plan back. `None` if the file does not exist.
    /// Callers must pass a filename that passed `is_safe_filename`.
    pub async fn read(&self, filename: &str) -> std::io::Result<Option<Vec<u8>>> {
        let path = self.dir.join(filename);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Accepts only the filenames this store hands out: no separators, no parent
/// components, `.pdf` extension.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
        && filename.ends_with(".pdf")
}
