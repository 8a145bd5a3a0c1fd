//! Per-request scratch directories.
//!
//! A [`StagingArea`] is a root directory; each request opens its own
//! [`RequestStage`] under it, named with a fresh UUID. The stage directory and
//! everything in it is removed when the stage is dropped, whichever way the
//! request ends. Two requests never share a directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Staging under the system temp directory.
    pub fn system_temp() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// From an optional configured root.
    pub fn from_root(root: Option<&Path>) -> Self {
        match root {
            Some(root) => Self::new(root),
            None => Self::system_temp(),
        }
    }

    /// Create a fresh directory for one request.
    pub fn open(&self) -> io::Result<RequestStage> {
        fs::create_dir_all(&self.root)?;
        let id = Uuid::new_v4();
        let dir = tempfile::Builder::new()
            .prefix(&format!("imagehacker-{id}-"))
            .tempdir_in(&self.root)?;
        debug!(%id, path = %dir.path().display(), "opened request stage");
        Ok(RequestStage { id, dir })
    }
}

/// One request's scratch directory. Removed on drop.
#[derive(Debug)]
pub struct RequestStage {
    id: Uuid,
    dir: TempDir,
}

impl RequestStage {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `bytes` to `name` inside the stage and return the full path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        fs::read(self.dir.path().join(name))
    }

    /// Remove the directory now and report any failure.
    ///
    /// Dropping the stage does the same silently.
    pub fn close(self) -> io::Result<()> {
        let id = self.id;
        self.dir.close().inspect_err(|e| {
            warn!(%id, error = %e, "failed to remove request stage");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_lives_under_root_and_carries_its_id() {
        let tmp = TempDir::new().unwrap();
        let area = StagingArea::new(tmp.path());
        let stage = area.open().unwrap();

        assert!(stage.path().starts_with(tmp.path()));
        let name = stage.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.contains(&stage.id().to_string()));
    }

    #[test]
    fn stages_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let area = StagingArea::new(tmp.path());
        let a = area.open().unwrap();
        let b = area.open().unwrap();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.path(), b.path());

        a.write("input.png", b"one").unwrap();
        b.write("input.png", b"two").unwrap();
        assert_eq!(a.read("input.png").unwrap(), b"one");
        assert_eq!(b.read("input.png").unwrap(), b"two");
    }

    #[test]
    fn drop_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let area = StagingArea::new(tmp.path());
        let path = {
            let stage = area.open().unwrap();
            stage.write("scratch.bin", &[1, 2, 3]).unwrap();
            stage.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn close_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let stage = StagingArea::new(tmp.path()).open().unwrap();
        let path = stage.path().to_path_buf();
        stage.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn missing_root_is_created() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("nested/staging");
        let area = StagingArea::from_root(Some(&root));
        let stage = area.open().unwrap();
        assert!(root.is_dir());
        assert!(stage.path().starts_with(&root));
    }
}
