//! Shared reqwest plumbing.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use smartfee_core::SmartFeeError;

/// Request timeout applied by the default clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a `reqwest::Client` with [`DEFAULT_TIMEOUT`].
pub fn default_http_client() -> Result<Client, SmartFeeError> {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| SmartFeeError::Transport(format!("build http client: {e}")))
}

/// Map a send failure (no status received) to [`SmartFeeError::Transport`].
pub fn transport(endpoint: &str, err: reqwest::Error) -> SmartFeeError {
    SmartFeeError::Transport(format!("{endpoint}: {err}"))
}

/// Return the response if it is `200 OK`, otherwise read its body and
/// produce a [`SmartFeeError::RemoteRejection`].
pub async fn expect_ok(endpoint: &str, resp: Response) -> Result<Response, SmartFeeError> {
    let status = resp.status();
    if status == StatusCode::OK {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(SmartFeeError::rejection(endpoint, status.as_u16(), &body))
}

/// Decode a success body as JSON.
pub async fn decode<T: DeserializeOwned>(endpoint: &str, resp: Response) -> Result<T, SmartFeeError> {
    resp.json::<T>()
        .await
        .map_err(|e| SmartFeeError::Transport(format!("{endpoint}: undecodable response: {e}")))
}
