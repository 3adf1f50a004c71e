//! HTTP client for the Smart Fee bumper API.
//!
//! Three endpoints, all authenticated with the `x-api-key` header:
//! - `POST /bumper/return_address`: register where bumped funds go back to
//! - `POST /bumper/address`: one-time address for the fee-bump output
//! - `GET /bumper/fee`: current next-block minimum fee rate in sats/kB
//!
//! Every call hits the network; nothing is cached and nothing is retried.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;

use smartfee_core::constants::API_KEY_HEADER;
use smartfee_core::{Environment, FeeService, SmartFeeError};

use crate::api_key::ApiKey;
use crate::http::{decode, default_http_client, expect_ok, transport};

pub const RETURN_ADDRESS_PATH: &str = "/bumper/return_address";
pub const BUMP_ADDRESS_PATH: &str = "/bumper/address";
pub const FEE_PATH: &str = "/bumper/fee";

#[derive(Serialize)]
struct ReturnAddressRequest<'a> {
    return_address: &'a str,
}

#[derive(Deserialize)]
struct BumpAddressResponse {
    address: String,
}

#[derive(Deserialize)]
struct FeeResponse {
    current_sats_per_kb: u64,
}

/// [`FeeService`] backed by the Smart Fee REST API.
#[derive(Debug, Clone)]
pub struct SmartFeeClient {
    http: Client,
    env: Environment,
    api_key: ApiKey,
}

impl SmartFeeClient {
    /// Client for `env` with the default HTTP timeout.
    pub fn new(env: Environment, api_key: ApiKey) -> Result<Self, SmartFeeError> {
        Ok(Self::with_http_client(default_http_client()?, env, api_key))
    }

    /// Client reusing a caller-configured `reqwest::Client`.
    pub fn with_http_client(http: Client, env: Environment, api_key: ApiKey) -> Self {
        Self { http, env, api_key }
    }

    /// The environment this client talks to.
    pub fn environment(&self) -> &Environment {
        &self.env
    }
}

#[async_trait]
impl FeeService for SmartFeeClient {
    async fn register_return_address(&self, address: &str) -> Result<(), SmartFeeError> {
        let resp = self
            .http
            .post(self.env.endpoint(RETURN_ADDRESS_PATH))
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&ReturnAddressRequest {
                return_address: address,
            })
            .send()
            .await
            .map_err(|e| transport(RETURN_ADDRESS_PATH, e))?;
        expect_ok(RETURN_ADDRESS_PATH, resp).await?;
        debug!(env = self.env.name(), %address, "return address registered");
        Ok(())
    }

    async fn bump_address(&self) -> Result<String, SmartFeeError> {
        let resp = self
            .http
            .post(self.env.endpoint(BUMP_ADDRESS_PATH))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport(BUMP_ADDRESS_PATH, e))?;
        let resp = expect_ok(BUMP_ADDRESS_PATH, resp).await?;
        let body: BumpAddressResponse = decode(BUMP_ADDRESS_PATH, resp).await?;
        Ok(body.address)
    }

    async fn fee_rate(&self) -> Result<u64, SmartFeeError> {
        let resp = self
            .http
            .get(self.env.endpoint(FEE_PATH))
            .header(API_KEY_HEADER, self.api_key.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport(FEE_PATH, e))?;
        let resp = expect_ok(FEE_PATH, resp).await?;
        let body: FeeResponse = decode(FEE_PATH, resp).await?;
        Ok(body.current_sats_per_kb)
    }
}
