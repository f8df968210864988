//! Datastores: remote (or mounted) object stores we can download from.

use async_trait::async_trait;
use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::common::*;

mod file;
mod gs;
mod s3;

pub(crate) use file::FileDatastore;
pub(crate) use gs::GsDatastore;
pub(crate) use s3::S3Datastore;

/// A store of objects addressed by `/`-separated paths.
#[async_trait]
pub(crate) trait Datastore: fmt::Debug + Send + Sync {
    /// Download every object whose path starts with `prefix` into `dest`,
    /// keeping each object's path relative to the datastore root. `dest` is
    /// created if it doesn't exist.
    ///
    /// Returns the local paths of the downloaded files. No matching objects is
    /// not an error, and returns an empty list.
    async fn download_prefix(&self, prefix: &str, dest: &Path) -> Result<Vec<PathBuf>>;
}

/// A boxed datastore of unknown type.
pub(crate) type BoxDatastore = Box<dyn Datastore>;

/// Where a datastore lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum DatastoreLocator {
    /// A local (or mounted) directory.
    File(PathBuf),
    /// A Google Cloud Storage bucket, optionally with a root directory.
    Gs(Url),
    /// An Amazon S3 bucket, optionally with a root directory.
    S3(Url),
}

impl DatastoreLocator {
    /// Connect to this datastore.
    pub(crate) async fn connect(&self) -> Result<BoxDatastore> {
        match self {
            DatastoreLocator::File(root) => Ok(Box::new(FileDatastore::new(root.clone()))),
            DatastoreLocator::Gs(url) => Ok(Box::new(GsDatastore::connect(url).await?)),
            DatastoreLocator::S3(url) => Ok(Box::new(S3Datastore::new(url.clone()))),
        }
    }

    /// Split a URL naming objects inside a datastore, such as
    /// `gs://bucket/uploads/run1/`, into a locator for the bucket and the
    /// object prefix `uploads/run1/`. Returns `None` for local paths.
    pub(crate) fn split_object_url(s: &str) -> Result<Option<(Self, String)>> {
        for scheme in &["gs://", "s3://"] {
            if let Some(rest) = s.strip_prefix(scheme) {
                let (bucket, prefix) = match rest.find('/') {
                    Some(idx) => (&rest[..idx], &rest[idx + 1..]),
                    None => (rest, ""),
                };
                let locator = format!("{}{}/", scheme, bucket).parse::<Self>()?;
                return Ok(Some((locator, prefix.to_owned())));
            }
        }
        Ok(None)
    }
}

impl fmt::Display for DatastoreLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatastoreLocator::File(path) => write!(f, "file:{}", path.display()),
            DatastoreLocator::Gs(url) | DatastoreLocator::S3(url) => url.fmt(f),
        }
    }
}

impl FromStr for DatastoreLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("gs://") || s.starts_with("s3://") {
            let mut url = s
                .parse::<Url>()
                .with_context(|| format!("cannot parse datastore {:?}", s))?;
            if url.host_str().map(str::is_empty).unwrap_or(true) {
                return Err(format_err!("datastore {:?} must name a bucket", s));
            }
            // Treat the root as a directory, so prefixes are relative to it.
            if !url.path().ends_with('/') {
                let path = format!("{}/", url.path());
                url.set_path(&path);
            }
            if url.scheme() == "gs" {
                Ok(DatastoreLocator::Gs(url))
            } else {
                Ok(DatastoreLocator::S3(url))
            }
        } else if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                Err(format_err!("datastore {:?} must include a path", s))
            } else {
                Ok(DatastoreLocator::File(PathBuf::from(path)))
            }
        } else if s.contains("://") {
            Err(format_err!("unsupported datastore {:?}", s))
        } else if s.is_empty() {
            Err(format_err!("datastore locator must not be empty"))
        } else {
            Ok(DatastoreLocator::File(PathBuf::from(s)))
        }
    }
}

/// Join a datastore root path (ending in `/`, or empty) with an object prefix.
pub(crate) fn join_root_and_prefix(root: &str, prefix: &str) -> String {
    format!("{}{}", root, prefix.trim_start_matches('/'))
}
