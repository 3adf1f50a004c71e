//! [`WalletEngine`] reached through a BitGo-Express-style REST gateway.
//!
//! - `POST {base}/api/v2/{coin}/wallet/{id}/address` with `{chain, label?}`
//! - `POST {base}/api/v2/{coin}/wallet/{id}/tx/build` with [`BuildParams`]
//!
//! The build response is large; only `feeInfo.{fee,size}` and
//! `txInfo.{unspents,changeAddresses}` are read. A response missing fee,
//! size or unspents is reported as [`SmartFeeError::BuildFailure`].
//!
//! Every failure maps to the wallet kinds: address requests fail with
//! [`SmartFeeError::Wallet`], builds with [`SmartFeeError::BuildFailure`],
//! whether or not the gateway answered.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::debug;

use smartfee_core::{
    AddressOptions, BuildParams, SmartFeeError, TrialBuild, Unspent, WalletAddress, WalletEngine,
};

use crate::api_key::ApiKey;
use crate::http::{default_http_client, expect_ok};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PrebuildResponse {
    fee_info: Option<FeeInfo>,
    tx_info: Option<TxInfo>,
}

#[derive(Debug, Deserialize)]
struct FeeInfo {
    fee: Option<u64>,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxInfo {
    unspents: Option<Vec<Unspent>>,
    change_addresses: Option<Vec<String>>,
}

impl PrebuildResponse {
    fn into_trial_build(self) -> Result<TrialBuild, SmartFeeError> {
        let missing = |field: &str| SmartFeeError::BuildFailure(format!("prebuild missing {field}"));
        let fee_info = self.fee_info.ok_or_else(|| missing("feeInfo"))?;
        let tx_info = self.tx_info.ok_or_else(|| missing("txInfo"))?;
        Ok(TrialBuild {
            fee: fee_info.fee.ok_or_else(|| missing("feeInfo.fee"))?,
            size: fee_info.size.ok_or_else(|| missing("feeInfo.size"))?,
            unspents: tx_info.unspents.ok_or_else(|| missing("txInfo.unspents"))?,
            change_addresses: tx_info.change_addresses.unwrap_or_default(),
        })
    }
}

/// Wallet engine speaking the Express REST dialect.
#[derive(Debug, Clone)]
pub struct ExpressWalletEngine {
    http: Client,
    base_url: String,
    coin: String,
    wallet_id: String,
    access_token: ApiKey,
}

impl ExpressWalletEngine {
    /// Engine for wallet `wallet_id` of `coin` behind `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        coin: impl Into<String>,
        wallet_id: impl Into<String>,
        access_token: ApiKey,
    ) -> Result<Self, SmartFeeError> {
        Ok(Self::with_http_client(
            default_http_client()?,
            base_url,
            coin,
            wallet_id,
            access_token,
        ))
    }

    /// Engine reusing a caller-configured `reqwest::Client`.
    pub fn with_http_client(
        http: Client,
        base_url: impl Into<String>,
        coin: impl Into<String>,
        wallet_id: impl Into<String>,
        access_token: ApiKey,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            coin: coin.into(),
            wallet_id: wallet_id.into(),
            access_token,
        }
    }

    fn wallet_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v2/{}/wallet/{}{}",
            self.base_url, self.coin, self.wallet_id, suffix
        )
    }
}

#[async_trait]
impl WalletEngine for ExpressWalletEngine {
    async fn create_address(
        &self,
        options: &AddressOptions,
    ) -> Result<WalletAddress, SmartFeeError> {
        const ENDPOINT: &str = "wallet address";
        let resp = self
            .http
            .post(self.wallet_url("/address"))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token.expose()))
            .json(options)
            .send()
            .await
            .map_err(|e| SmartFeeError::Wallet(format!("{ENDPOINT}: {e}")))?;
        let resp = expect_ok(ENDPOINT, resp)
            .await
            .map_err(|e| SmartFeeError::Wallet(e.to_string()))?;
        resp.json()
            .await
            .map_err(|e| SmartFeeError::Wallet(format!("{ENDPOINT}: undecodable response: {e}")))
    }

    async fn prebuild_transaction(
        &self,
        params: &BuildParams,
    ) -> Result<TrialBuild, SmartFeeError> {
        const ENDPOINT: &str = "tx/build";
        let resp = self
            .http
            .post(self.wallet_url("/tx/build"))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token.expose()))
            .json(params)
            .send()
            .await
            .map_err(|e| SmartFeeError::BuildFailure(format!("{ENDPOINT}: {e}")))?;
        let resp = expect_ok(ENDPOINT, resp)
            .await
            .map_err(|e| SmartFeeError::BuildFailure(e.to_string()))?;
        let body: PrebuildResponse = resp
            .json()
            .await
            .map_err(|e| SmartFeeError::BuildFailure(format!("undecodable prebuild: {e}")))?;
        let trial = body.into_trial_build()?;
        debug!(
            fee = trial.fee,
            size = trial.size,
            inputs = trial.unspents.len(),
            change = trial.change_addresses.len(),
            "prebuild received"
        );
        Ok(trial)
    }
}
