//! JSON POST helper over an injected HTTP client
//!
//! Thin wrapper shared by both fetchers. No retry, no backoff: a failed call
//! surfaces immediately and the caller decides what the failure skips.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{FetchError, FetchResult};

/// JSON request/response client for the search endpoints.
pub struct JsonClient {
    client: Client,
}

impl JsonClient {
    /// Wrap an injected HTTP client. The client is shared and cheap to clone.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// POST a JSON payload and deserialize the JSON response.
    ///
    /// # Errors
    /// `FetchError::Network` if the request never completes,
    /// `FetchError::Http` on a non-success status,
    /// `FetchError::Parse` if the body does not match `T`.
    pub async fn post_json<T, P>(&self, url: &str, payload: &P) -> FetchResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        debug!("POST {url}");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(format!("{url} returned {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Parse(format!("unreadable response from {url}: {e}")))
    }
}
