use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("failed to write pid file {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
    #[error("failed to remove pid file {0}: {1}")]
    Remove(PathBuf, #[source] std::io::Error),
}

/// Writes the current process id to `<runtime_dir>/<instance_id>.pid`.
/// `runtime_dir` is expected to already exist (`netcore_util::directories`
/// creates it at startup).
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn create(runtime_dir: &Path, instance_id: u32) -> Result<Self, PidFileError> {
        let path = runtime_dir.join(format!("{instance_id}.pid"));
        std::fs::write(&path, std::process::id().to_string())
            .map_err(|e| PidFileError::Write(path.clone(), e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(?err, path = %self.path.display(), "failed to remove pid file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_removes_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let pidfile = PidFile::create(dir.path(), 7).unwrap();
            let path = pidfile.path().to_path_buf();
            let contents = std::fs::read_to_string(&path).unwrap();
            assert_eq!(contents, std::process::id().to_string());
            path
        };
        assert!(!path.exists());
    }
}
