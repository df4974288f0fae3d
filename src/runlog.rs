use std::{
    fs::File,
    io::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tracing::info;

use crate::error::ReelResult;

/// Per-run progress log: `video_creation_<YYYYMMDD_HHMMSS>.log`.
///
/// Every record is flushed immediately so a crash mid-run still leaves the
/// steps completed so far on disk. The handle is passed explicitly into the
/// pipeline rather than held globally, and the file is closed on drop on all
/// exit paths.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create a timestamped log file inside `dir`.
    pub fn create(dir: &Path) -> ReelResult<Self> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("video_creation_{stamp}.log"));
        Self::create_at(path)
    }

    pub fn create_at(path: impl Into<PathBuf>) -> ReelResult<Self> {
        let path = path.into();
        let file = File::create(&path)
            .with_context(|| format!("failed to create log file '{}'", path.display()))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line and flush through to disk.
    pub fn record(&mut self, message: &str) -> ReelResult<()> {
        writeln!(self.file, "{message}")
            .and_then(|()| self.file.flush())
            .with_context(|| format!("failed to write log file '{}'", self.path.display()))?;
        info!("{message}");
        Ok(())
    }
}
