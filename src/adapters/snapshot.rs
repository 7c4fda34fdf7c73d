use crate::adapters::memory::Tables;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// JSON file holding every table between CLI invocations.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file that does not exist yet reads as empty tables.
    pub async fn load(&self) -> Result<Tables> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let tables: Tables = serde_json::from_slice(&bytes)?;
                tables.check_integrity()?;
                tracing::debug!(
                    path = %self.path.display(),
                    espacios = tables.tbc_espacios.len(),
                    "snapshot loaded"
                );
                Ok(tables)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no snapshot yet, starting empty");
                Ok(Tables::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, tables: &Tables) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec_pretty(tables)?;
        // Write beside the target, then rename, so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}
