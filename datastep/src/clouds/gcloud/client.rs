//! A Google Cloud Storage REST client.
//!
//! We only ever read: one paginated JSON listing call and one media download
//! per object. Both are plain GET requests, which are always safe to retry.

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{error, fmt, time::Duration};

use super::auth::{authenticator, Authenticator};
use crate::common::*;
use crate::wait::{wait, WaitOptions, WaitStatus};

/// The OAuth2 scopes that we'll need.
static SCOPES: &[&str] = &["https://www.googleapis.com/auth/devstorage.read_only"];

/// A Google Cloud REST client using OAuth2.
#[derive(Clone)]
pub(crate) struct Client {
    authenticator: Authenticator,
    http: reqwest::Client,
    retry: WaitOptions,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl Client {
    /// Find credentials and create a new client.
    #[instrument(level = "trace")]
    pub(crate) async fn new() -> Result<Client> {
        Ok(Client {
            authenticator: authenticator().await?,
            http: reqwest::Client::new(),
            // Few retries, because some of what we classify as temporary may
            // really be permanent.
            retry: WaitOptions::default()
                .retry_interval(Duration::from_secs(10))
                .allowed_errors(3),
        })
    }

    /// GET `url` with `query` and deserialize the JSON body.
    pub(crate) async fn get_json<T, Q>(&self, url: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = request_url(url, query)?;
        self.get(&url)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("cannot parse JSON response from {}", url))
    }

    /// GET `url` with `query` and return the successful response, so that the
    /// caller can stream its body.
    pub(crate) async fn get_response<Q>(&self, url: &str, query: &Q) -> Result<Response>
    where
        Q: Serialize + ?Sized,
    {
        let url = request_url(url, query)?;
        self.get(&url).await
    }

    /// GET `url`, retrying temporary failures. Anything but a 2xx status is an
    /// error.
    async fn get(&self, url: &Url) -> Result<Response> {
        trace!("GET {}", url);
        let token = self
            .authenticator
            .token(SCOPES)
            .await
            .context("could not get Google Cloud OAuth2 token")?;
        let token = token.as_str();
        wait(&self.retry, || self.try_get(url, token)).await
    }

    /// Make a single GET attempt and classify the outcome.
    async fn try_get(&self, url: &Url, token: &str) -> WaitStatus<Response, Error> {
        match self.http.get(url.as_str()).bearer_auth(token).send().await {
            Err(err) => {
                // We never reached the server, or it stopped answering.
                let temporary = err.is_connect() || err.is_timeout();
                let err = Error::from(err).context(format!("could not GET {}", url));
                if temporary {
                    WaitStatus::FailedTemporarily(err)
                } else {
                    WaitStatus::FailedPermanently(err)
                }
            }
            Ok(resp) if resp.status().is_success() => WaitStatus::Finished(resp),
            Ok(resp) => {
                let temporary = should_retry_status(resp.status());
                let err = Error::from(ApiError::from_response(resp).await)
                    .context(format!("GET {} failed", url));
                if temporary {
                    WaitStatus::FailedTemporarily(err)
                } else {
                    WaitStatus::FailedPermanently(err)
                }
            }
        }
    }
}

/// Should we retry a request which returned `status`?
///
/// We only retry statuses we've seen fail transiently in practice, so that
/// configuration mistakes fail fast.
fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS
}

/// Append `query` to `url`.
fn request_url<Q>(url: &str, query: &Q) -> Result<Url>
where
    Q: Serialize + ?Sized,
{
    let mut url = url
        .parse::<Url>()
        .with_context(|| format!("could not parse URL {:?}", url))?;
    let query_str = serde_urlencoded::to_string(query)?;
    if !query_str.is_empty() {
        url.set_query(Some(&query_str));
    }
    Ok(url)
}

/// A non-2xx response from Google Cloud.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Read the body of a failed response.
    async fn from_response(resp: Response) -> ApiError {
        let status = resp.status();
        match resp.bytes().await {
            Ok(body) => ApiError::from_body(status, &body),
            Err(err) => ApiError {
                status,
                message: format!("could not read error body: {}", err),
            },
        }
    }

    /// Google's JSON APIs describe errors as `{"error":{"message":...}}`, but
    /// proxies and the media endpoint may send anything at all.
    fn from_body(status: StatusCode, body: &[u8]) -> ApiError {
        #[derive(Deserialize)]
        struct ErrorResponse {
            error: ErrorDetails,
        }

        #[derive(Deserialize)]
        struct ErrorDetails {
            message: String,
        }

        let message = match serde_json::from_slice::<ErrorResponse>(body) {
            Ok(resp) => resp.error.message,
            Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
        };
        ApiError { status, message }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Google Cloud returned {}", self.status)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl error::Error for ApiError {}

/// Percent-encode a string for use as a URL path component.
pub(crate) fn percent_encode(s: &str) -> impl fmt::Display + '_ {
    utf8_percent_encode(s, NON_ALPHANUMERIC)
}
