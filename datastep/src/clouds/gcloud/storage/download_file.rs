//! Download a file from Google Cloud storage.

use serde::Serialize;
use std::path::Path;
use tokio::{fs, io::AsyncWriteExt};

use super::{
    super::{percent_encode, Client},
    StorageObject,
};
use crate::common::*;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadQuery<'a> {
    /// Ask for the object's contents instead of its JSON metadata.
    alt: &'static str,

    /// What object generation do we expect to download?
    if_generation_match: &'a str,
}

/// Download `item` to the local file `dest`, creating parent directories as
/// needed.
#[instrument(level = "trace", skip(client, item), fields(item = %item.to_url_string()))]
pub(crate) async fn download_file(
    client: &Client,
    item: &StorageObject,
    dest: &Path,
) -> Result<()> {
    debug!("downloading {} to {}", item.to_url_string(), dest.display());
    let url = format!(
        "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
        percent_encode(&item.bucket),
        percent_encode(&item.name),
    );
    let query = DownloadQuery {
        alt: "media",
        if_generation_match: &item.generation,
    };
    let response = client
        .get_response(&url, &query)
        .await
        .with_context(|| format!("could not download {}", item.to_url_string()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let mut wtr = fs::File::create(dest)
        .await
        .with_context(|| format!("cannot create {}", dest.display()))?;

    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| {
            format!("error reading body of {}", item.to_url_string())
        })?;
        downloaded += chunk.len() as u64;
        wtr.write_all(&chunk)
            .await
            .with_context(|| format!("error writing to {}", dest.display()))?;
    }
    wtr.flush()
        .await
        .with_context(|| format!("error writing to {}", dest.display()))?;

    // Did we download the number of bytes the listing promised?
    let expected = item.size()?;
    if downloaded != expected {
        return Err(format_err!(
            "expected to download {} bytes from {}, received {}",
            expected,
            item.to_url_string(),
            downloaded,
        ));
    }
    Ok(())
}
