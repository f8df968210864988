//! Google Cloud Storage datastores.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{join_root_and_prefix, Datastore};
use crate::clouds::gcloud::{
    storage::{self, parse_gs_url},
    Client,
};
use crate::common::*;

/// A `gs://bucket/root/` datastore.
#[derive(Debug)]
pub(crate) struct GsDatastore {
    bucket: String,
    /// Either empty, or a path ending in `/`.
    root: String,
    client: Client,
}

impl GsDatastore {
    /// Authenticate and connect to the datastore at `url`.
    pub(crate) async fn connect(url: &Url) -> Result<Self> {
        let (bucket, root) = parse_gs_url(url)?;
        let client = Client::new()
            .await
            .with_context(|| format!("could not connect to {}", url))?;
        Ok(Self {
            bucket,
            root,
            client,
        })
    }
}

#[async_trait]
impl Datastore for GsDatastore {
    #[instrument(level = "debug", name = "gs::download_prefix", skip(self, dest), fields(bucket = %self.bucket))]
    async fn download_prefix(&self, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dest)
            .await
            .with_context(|| format!("cannot create {}", dest.display()))?;
        let full_prefix = join_root_and_prefix(&self.root, prefix);
        let objects = storage::ls(&self.client, &self.bucket, &full_prefix).await?;

        // Downloads run one at a time.
        let mut downloaded = Vec::with_capacity(objects.len());
        for item in objects {
            let rel_name = &item.name[self.root.len()..];
            let local_path = local_path_for(dest, rel_name)?;
            storage::download_file(&self.client, &item, &local_path).await?;
            downloaded.push(local_path);
        }
        Ok(downloaded)
    }
}

/// Where to store the object `rel_name` beneath `dest`. We refuse names that
/// would escape `dest`.
fn local_path_for(dest: &Path, rel_name: &str) -> Result<PathBuf> {
    let mut path = dest.to_owned();
    for part in rel_name.split('/') {
        match part {
            "" | "." => continue,
            ".." => {
                return Err(format_err!(
                    "refusing to download object with '..' in its name: {:?}",
                    rel_name,
                ))
            }
            part => path.push(part),
        }
    }
    if path == dest {
        return Err(format_err!("object name {:?} is empty", rel_name));
    }
    Ok(path)
}

#[test]
fn local_path_for_stays_inside_dest() {
    let dest = Path::new("/scratch");
    assert_eq!(
        local_path_for(dest, "uploads/run1/b.csv").unwrap(),
        PathBuf::from("/scratch/uploads/run1/b.csv"),
    );
    assert_eq!(
        local_path_for(dest, "a//./b.csv").unwrap(),
        PathBuf::from("/scratch/a/b.csv"),
    );
    assert!(local_path_for(dest, "../etc/passwd").is_err());
    assert!(local_path_for(dest, "").is_err());
}
