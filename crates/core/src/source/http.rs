//! HTTP plumbing shared by the adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::SourceError;
use crate::artwork::SourceTag;
use crate::config::HttpConfig;

/// Build the client shared by every adapter.
///
/// The hard request timeout and idle-pool cap bound whatever keeps running
/// after the aggregator has stopped waiting for a source.
pub fn build_client(config: &HttpConfig) -> Result<Client, SourceError> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()?;
    Ok(client)
}

/// Send a request and decode a JSON body.
pub async fn get_json<T: DeserializeOwned>(
    tag: SourceTag,
    request: RequestBuilder,
) -> Result<T, SourceError> {
    let response = request.send().await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        warn!(source = %tag, "Rate limit exceeded");
        return Err(SourceError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    let bytes = response.bytes().await?;
    debug!(source = %tag, bytes = bytes.len(), "Response received");

    serde_json::from_slice(&bytes).map_err(|e| SourceError::Parse(e.to_string()))
}
