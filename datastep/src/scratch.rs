//! Scratch directories for staging downloaded files.

use std::{
    env, fs,
    path::Path,
};
use tempfile::TempDir;

use crate::common::*;

/// A local directory which is deleted, along with everything in it, when this
/// value is dropped.
#[derive(Debug)]
pub(crate) struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a new scratch directory inside `parent`, or inside the system
    /// temporary directory if `parent` is `None`. `parent` is created if
    /// needed.
    pub(crate) fn create(parent: Option<&Path>) -> Result<Self> {
        let parent = parent.map(Path::to_owned).unwrap_or_else(env::temp_dir);
        fs::create_dir_all(&parent).with_context(|| {
            format!("cannot create scratch parent {}", parent.display())
        })?;
        let dir = tempfile::Builder::new()
            .prefix("datastep-")
            .tempdir_in(&parent)
            .with_context(|| {
                format!("cannot create scratch directory in {}", parent.display())
            })?;
        debug!("created scratch directory {}", dir.path().display());
        Ok(ScratchDir { dir })
    }

    /// The path to this directory.
    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete this directory now, reporting any errors.
    pub(crate) fn close(self) -> Result<()> {
        let path = self.dir.path().to_owned();
        self.dir
            .close()
            .with_context(|| format!("cannot remove scratch directory {}", path.display()))
    }
}
