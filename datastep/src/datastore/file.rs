//! A local directory used as a datastore.

use async_trait::async_trait;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use super::Datastore;
use crate::common::*;
use crate::locate::list_files;

/// A directory whose files are the objects of a datastore. Useful for mounted
/// storage and for testing without a cloud account.
#[derive(Debug)]
pub(crate) struct FileDatastore {
    root: PathBuf,
}

impl FileDatastore {
    /// Create a datastore rooted at `root`.
    pub(crate) fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Datastore for FileDatastore {
    #[instrument(level = "debug", name = "file::download_prefix", skip(self, dest), fields(root = %self.root.display()))]
    async fn download_prefix(&self, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let prefix = prefix.trim_start_matches('/').to_owned();
        let dest = dest.to_owned();
        spawn_blocking(move || copy_prefix(&root, &prefix, &dest)).await
    }
}

/// Copy files under `root` whose relative `/`-separated path starts with
/// `prefix` into `dest`.
fn copy_prefix(root: &Path, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(format_err!(
            "datastore directory {} does not exist",
            root.display(),
        ));
    }
    fs::create_dir_all(dest)
        .with_context(|| format!("cannot create {}", dest.display()))?;

    let mut downloaded = vec![];
    for path in list_files(root)? {
        let rel_path = path
            .strip_prefix(root)
            .with_context(|| format!("{} is not under {}", path.display(), root.display()))?;
        let object_name = object_name(rel_path)?;
        if !object_name.starts_with(prefix) {
            continue;
        }
        let local_path = dest.join(rel_path);
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        trace!("copying {} to {}", path.display(), local_path.display());
        fs::copy(&path, &local_path).with_context(|| {
            format!("cannot copy {} to {}", path.display(), local_path.display())
        })?;
        downloaded.push(local_path);
    }
    debug!("downloaded {} files matching {:?}", downloaded.len(), prefix);
    Ok(downloaded)
}

/// Convert a relative path into a `/`-separated object name.
fn object_name(rel_path: &Path) -> Result<String> {
    let mut parts = vec![];
    for component in rel_path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                format_err!("non-Unicode file name {}", rel_path.display())
            })?),
            _ => return Err(format_err!("unexpected path {}", rel_path.display())),
        }
    }
    Ok(parts.join("/"))
}
