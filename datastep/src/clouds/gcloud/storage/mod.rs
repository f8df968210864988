//! Interfaces to Google Cloud Storage.

use serde::Deserialize;

use crate::common::*;

mod download_file;
mod ls;

pub(crate) use download_file::download_file;
pub(crate) use ls::ls;

/// Split a `gs://` URL into a bucket and an object name.
pub(crate) fn parse_gs_url(url: &Url) -> Result<(String, String)> {
    if url.scheme() != "gs" {
        Err(format_err!("expected a gs:// URL, found {}", url))
    } else {
        let bucket = url
            .host_str()
            .ok_or_else(|| format_err!("could not get bucket from {}", url))?
            .to_owned();
        let object = url.path().trim_start_matches('/').to_owned();
        Ok((bucket, object))
    }
}

/// Information about an individual object.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StorageObject {
    /// The bucket of this object.
    pub(crate) bucket: String,
    /// The name of this object. This typically looks like a path without the leading slash.
    pub(crate) name: String,
    /// The generation of this object, which we use to make sure it doesn't
    /// change while we download it. The JSON API returns this as a string.
    pub(crate) generation: String,
    /// The size of this oject, in bytes. Also returned as a string.
    pub(crate) size: String,
}

impl StorageObject {
    /// Convert this to a `gs://` URL.
    pub(crate) fn to_url_string(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }

    /// Parse the `size` field.
    pub(crate) fn size(&self) -> Result<u64> {
        self.size
            .parse::<u64>()
            .with_context(|| format!("could not parse size of {}", self.to_url_string()))
    }

    /// Is this a zero-byte "directory placeholder" object, as created by the
    /// cloud console?
    pub(crate) fn is_directory_placeholder(&self) -> bool {
        self.name.ends_with('/')
    }
}
