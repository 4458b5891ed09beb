use crate::error::{RepgenError, Result};
use crate::model::Commit;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// JSON file holding a raw commit list, written after a live fetch and
/// read back in replay mode.
pub struct CommitStore {
    path: PathBuf,
}

impl CommitStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<Commit>> {
        let read_err = |reason: String| RepgenError::CacheRead {
            path: self.path.clone(),
            reason,
        };

        let file = File::open(&self.path).map_err(|e| read_err(e.to_string()))?;
        let commits: Vec<Commit> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| read_err(e.to_string()))?;

        debug!(path = %self.path.display(), commits = commits.len(), "loaded commit cache");
        Ok(commits)
    }

    /// Replaces the file atomically: the list is written to a temporary
    /// sibling and renamed over the target, so a failure never leaves a
    /// truncated cache behind.
    pub fn save(&self, commits: &[Commit]) -> Result<()> {
        let write_err = |reason: String| RepgenError::CacheWrite {
            path: self.path.clone(),
            reason,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_err(e.to_string()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, commits).map_err(|e| write_err(e.to_string()))?;
            writer.write_all(b"\n").map_err(|e| write_err(e.to_string()))?;
            writer.flush().map_err(|e| write_err(e.to_string()))?;
        }
        tmp.as_file().sync_all().map_err(|e| write_err(e.to_string()))?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error.to_string()))?;

        debug!(path = %self.path.display(), commits = commits.len(), "wrote commit cache");
        Ok(())
    }
}
