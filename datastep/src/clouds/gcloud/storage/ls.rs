//! Listing objects in Google Cloud Storage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{
    super::{percent_encode, Client},
    StorageObject,
};
use crate::common::*;

/// URL query parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery<'a> {
    prefix: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

/// Response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    next_page_token: Option<String>,

    #[serde(default)]
    items: Vec<StorageObject>,
}

/// List every object in `bucket` whose name starts with `prefix`.
///
/// See the [documentation][list]. Unlike a file system, this is a plain string
/// prefix match: `uploads/a` matches both `uploads/a.csv` and `uploads/ab/c`.
///
/// [list]: https://cloud.google.com/storage/docs/json_api/v1/objects/list
#[instrument(level = "trace", skip(client))]
pub(crate) async fn ls(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<StorageObject>> {
    debug!("listing gs://{}/{}", bucket, prefix);
    let req_url = format!(
        "https://storage.googleapis.com/storage/v1/b/{}/o",
        percent_encode(bucket),
    );

    // Keep track of names that we've seen, in case a page boundary shifts
    // underneath us.
    let mut seen = HashSet::new();
    let mut objects = vec![];
    let mut page_token = None;
    loop {
        let query = ListQuery { prefix, page_token };
        let mut res = client
            .get_json::<ListResponse, _>(&req_url, &query)
            .await
            .with_context(|| format!("could not list gs://{}/{}", bucket, prefix))?;
        page_token = res.next_page_token.take();

        for item in res.items {
            if item.is_directory_placeholder() {
                trace!("skipping directory placeholder {:?}", item.name);
                continue;
            }
            if !seen.insert(item.name.clone()) {
                continue;
            }
            objects.push(item);
        }

        // Exit if this is the last page of results.
        if page_token.is_none() {
            break;
        }
    }
    debug!("found {} objects", objects.len());
    Ok(objects)
}
