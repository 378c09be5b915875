//! HTTP client construction for chunk downloads

use reqwest::Client;
use tracing::debug;

use super::{FetchError, Result};
use crate::config::HttpConfig;

/// Build the shared client used for every chunk request
///
/// Redirects are followed up to `max_redirects`; no retries are layered on top.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    debug!(
        user_agent = %config.user_agent,
        connect_timeout_secs = config.connect_timeout_secs,
        request_timeout_secs = config.request_timeout_secs,
        "Building HTTP client"
    );

    Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()
        .map_err(FetchError::Client)
}
