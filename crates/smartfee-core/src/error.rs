//! Error types for Smart Fee send-parameter generation.

use serde_json::Value;
use thiserror::Error;

/// Every way a send-parameter generation can fail.
///
/// None of these are recovered locally: the first error aborts the whole
/// operation and no partial [`BuildParams`](crate::types::BuildParams) is
/// returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SmartFeeError {
    #[error("configuration: {0}")] Configuration(String),
    /// Non-success status from the fee service; `body` is the parsed JSON,
    /// or the raw text as a JSON string.
    #[error("{endpoint} rejected with status {status}: {body}")] RemoteRejection { endpoint: String, status: u16, body: Value },
    #[error("build failure: {0}")] BuildFailure(String),
    #[error("invalid recipient: {0}")] InvalidRecipient(String),
    /// The pinned inputs cannot cover recipients plus the recomputed fee.
    #[error(
        "insufficient funds: inputs {inputs} - recipients {recipients} - fee {fee} = {}",
        remainder(.inputs, .recipients, .fee)
    )]
    InsufficientFunds { inputs: u64, recipients: u64, fee: u64 },
    /// A fee service request never produced a usable response.
    #[error("transport: {0}")] Transport(String),
    #[error("wallet: {0}")] Wallet(String),
}

fn remainder(inputs: &u64, recipients: &u64, fee: &u64) -> i128 {
    i128::from(*inputs) - i128::from(*recipients) - i128::from(*fee)
}

impl SmartFeeError {
    /// Build a [`SmartFeeError::RemoteRejection`] from a raw response body.
    ///
    /// JSON bodies are kept structured; anything else is wrapped as a string.
    pub fn rejection(endpoint: impl Into<String>, status: u16, raw_body: &str) -> Self {
        let body = serde_json::from_str(raw_body)
            .unwrap_or_else(|_| Value::String(raw_body.to_string()));
        Self::RemoteRejection {
            endpoint: endpoint.into(),
            status,
            body,
        }
    }
}
