//! Authentication support for Google Cloud.

use std::sync::Arc;

use gcp_auth::TokenProvider;

use crate::common::*;

/// Something which can give us OAuth2 tokens.
pub(crate) type Authenticator = Arc<dyn TokenProvider>;

/// Find Google Cloud credentials.
///
/// This looks at `GOOGLE_APPLICATION_CREDENTIALS`, then the user's `gcloud`
/// configuration, then the instance metadata server, which covers service
/// accounts, developer laptops and pipeline compute nodes respectively.
#[instrument(level = "trace")]
pub(crate) async fn authenticator() -> Result<Authenticator> {
    gcp_auth::provider()
        .await
        .context("could not find Google Cloud credentials")
}
