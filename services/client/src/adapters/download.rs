//! services/client/src/adapters/download.rs
//!
//! Writes exported files into the configured download directory.

use jobs_dashboard_core::ports::{DownloadSink, PortError, PortResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct FsDownloads {
    dir: PathBuf,
}

impl FsDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Only the final path component of a backend-suggested name is kept.
    fn target(&self, filename: &str) -> PortResult<PathBuf> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| PortError::Storage(format!("Invalid download name '{}'", filename)))?;
        Ok(self.dir.join(name))
    }
}

impl DownloadSink for FsDownloads {
    fn save(&self, filename: &str, contents: &[u8]) -> PortResult<()> {
        let target = self.target(filename)?;
        fs::create_dir_all(&self.dir).map_err(|e| PortError::Storage(e.to_string()))?;
        fs::write(&target, contents).map_err(|e| PortError::Storage(e.to_string()))?;
        info!(path = %target.display(), bytes = contents.len(), "Download written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_lands_in_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = FsDownloads::new(dir.path().join("downloads"));
        downloads.save("jobs_export.csv", b"a,b\n").unwrap();
        let written = fs::read(dir.path().join("downloads").join("jobs_export.csv")).unwrap();
        assert_eq!(written, b"a,b\n");
    }

    #[test]
    fn directories_in_name_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = FsDownloads::new(dir.path());
        downloads.save("../../escape.csv", b"x").unwrap();
        assert!(dir.path().join("escape.csv").exists());
        assert!(downloads.save("..", b"x").is_err());
    }
}
