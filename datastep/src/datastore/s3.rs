//! Amazon S3 datastores, accessed using the `aws` CLI.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::Datastore;
use crate::clouds::aws;
use crate::common::*;
use crate::locate::list_files;

/// An `s3://bucket/root/` datastore.
#[derive(Debug)]
pub(crate) struct S3Datastore {
    root: Url,
}

impl S3Datastore {
    /// Create a datastore rooted at `root`. No network access happens until we
    /// download something.
    pub(crate) fn new(root: Url) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Datastore for S3Datastore {
    #[instrument(level = "debug", name = "s3::download_prefix", skip(self, dest), fields(root = %self.root))]
    async fn download_prefix(&self, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dest)
            .await
            .with_context(|| format!("cannot create {}", dest.display()))?;
        let prefix = prefix.trim_start_matches('/');
        aws::download_prefix(&self.root, prefix, dest)
            .await
            .with_context(|| format!("could not download {}{}", self.root, prefix))?;
        let dest = dest.to_owned();
        spawn_blocking(move || list_files(&dest)).await
    }
}
