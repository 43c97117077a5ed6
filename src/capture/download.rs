use super::CaptureArtifact;
use crate::error::CaptureError;
use std::path::{Path, PathBuf};

pub const DOWNLOAD_FILE_NAME: &str = "tweet.png";

/// Where a finished capture goes.
pub trait DownloadSink: Send {
    fn deliver(&mut self, artifact: &CaptureArtifact) -> Result<PathBuf, CaptureError>;
}

/// Writes `tweet.png` into a directory, replacing any earlier export.
pub struct FileSink {
    dir: PathBuf,
    open_after_export: bool,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, open_after_export: bool) -> Self {
        Self {
            dir: dir.into(),
            open_after_export,
        }
    }

    pub fn target(&self) -> PathBuf {
        self.dir.join(DOWNLOAD_FILE_NAME)
    }
}

pub fn write_png(path: &Path, png: &[u8]) -> Result<(), CaptureError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CaptureError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, png).map_err(|source| CaptureError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl DownloadSink for FileSink {
    fn deliver(&mut self, artifact: &CaptureArtifact) -> Result<PathBuf, CaptureError> {
        let path = self.target();
        write_png(&path, &artifact.png)?;
        tracing::info!(id = %artifact.id, path = %path.display(), "exported card");

        if self.open_after_export {
            if let Err(e) = open::that(&path) {
                tracing::warn!(error = %e, "could not open exported image");
            }
        }

        Ok(path)
    }
}
