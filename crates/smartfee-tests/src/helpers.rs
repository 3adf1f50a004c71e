//! Shared fixtures for the end-to-end tests.
//!
//! - [`FakeSmartFee`]: loopback Smart Fee API that records every call
//! - [`FakeExpress`]: loopback wallet gateway serving one canned prebuild
//! - [`ScriptedWallet`] / [`StaticFeeService`]: in-process collaborators

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

use smartfee_client::fee_service::{BUMP_ADDRESS_PATH, FEE_PATH, RETURN_ADDRESS_PATH};
use smartfee_client::{ApiKey, ExpressWalletEngine};
use smartfee_core::constants::API_KEY_HEADER;
use smartfee_core::{
    AddressOptions, BuildParams, Environment, FeeService, Recipient, SmartFeeError, TrialBuild,
    Unspent, WalletAddress, WalletEngine,
};
use smartfee_planner::SmartFeeOptions;

pub const TEST_API_KEY: &str = "test-api-key";
pub const BUMP_ADDRESS: &str = "tb1qbumper";
pub const RETURN_ADDRESS: &str = "tb1qreturn";
pub const WALLET_ID: &str = "5f1e0c";
pub const COIN: &str = "tbtc";
pub const ACCESS_TOKEN: &str = "v2x-test-token";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Two-output withdrawal batch totalling 900,000 sats.
pub fn batch() -> Vec<Recipient> {
    vec![
        Recipient::new("tb1qalice", 600_000),
        Recipient::new("tb1qbob", 300_000),
    ]
}

/// Trial build with inputs `u1..` of the given values and `change` change outputs.
pub fn trial(fee: u64, size: u64, inputs: &[u64], change: usize) -> TrialBuild {
    TrialBuild {
        fee,
        size,
        unspents: inputs
            .iter()
            .enumerate()
            .map(|(i, value)| Unspent {
                id: format!("u{}", i + 1),
                value: *value,
            })
            .collect(),
        change_addresses: (0..change).map(|i| format!("tb1qchange{i}")).collect(),
    }
}

/// Default options carrying [`TEST_API_KEY`].
pub fn options() -> SmartFeeOptions {
    SmartFeeOptions::with_api_key(TEST_API_KEY)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake");
    });
    addr
}

// ---------------------------------------------------------------------------
// Fake Smart Fee API
// ---------------------------------------------------------------------------

/// Canned behaviour for [`FakeSmartFee`].
#[derive(Debug, Clone)]
pub struct FakeSmartFeeConfig {
    pub bump_address: String,
    pub sats_per_kb: u64,
    /// Answer this path with `(status, body)` instead of success.
    pub reject: Option<(&'static str, u16, Value)>,
}

impl Default for FakeSmartFeeConfig {
    fn default() -> Self {
        Self {
            bump_address: BUMP_ADDRESS.to_string(),
            sats_per_kb: 4000,
            reject: None,
        }
    }
}

#[derive(Default)]
struct ServiceLog {
    calls: Vec<String>,
    return_addresses: Vec<String>,
}

struct ServiceShared {
    config: FakeSmartFeeConfig,
    log: Mutex<ServiceLog>,
}

impl ServiceShared {
    /// Record the call, then check the key and any configured rejection.
    fn gate(&self, path: &str, headers: &HeaderMap) -> Option<Response> {
        self.log.lock().unwrap().calls.push(path.to_string());
        if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some(TEST_API_KEY) {
            return Some(
                (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid api key"})))
                    .into_response(),
            );
        }
        match &self.config.reject {
            Some((reject_path, status, body)) if *reject_path == path => Some(
                (
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    Json(body.clone()),
                )
                    .into_response(),
            ),
            _ => None,
        }
    }
}

/// Loopback Smart Fee API.
pub struct FakeSmartFee {
    /// Environment pointing at the fake.
    pub env: Environment,
    shared: Arc<ServiceShared>,
}

impl FakeSmartFee {
    pub async fn start() -> Self {
        Self::start_with(FakeSmartFeeConfig::default()).await
    }

    pub async fn start_with(config: FakeSmartFeeConfig) -> Self {
        let shared = Arc::new(ServiceShared {
            config,
            log: Mutex::new(ServiceLog::default()),
        });
        let app = Router::new()
            .route(RETURN_ADDRESS_PATH, post(register_return_address))
            .route(BUMP_ADDRESS_PATH, post(bump_address))
            .route(FEE_PATH, get(fee))
            .with_state(shared.clone());
        let addr = serve(app).await;
        Self {
            env: Environment::custom("test", format!("http://{addr}")),
            shared,
        }
    }

    /// Paths requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.shared.log.lock().unwrap().calls.clone()
    }

    /// Addresses accepted by the return-address endpoint.
    pub fn return_addresses(&self) -> Vec<String> {
        self.shared.log.lock().unwrap().return_addresses.clone()
    }
}

async fn register_return_address(
    State(shared): State<Arc<ServiceShared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(resp) = shared.gate(RETURN_ADDRESS_PATH, &headers) {
        return resp;
    }
    let address = body["return_address"].as_str().unwrap_or_default().to_string();
    shared.log.lock().unwrap().return_addresses.push(address);
    Json(json!({})).into_response()
}

async fn bump_address(State(shared): State<Arc<ServiceShared>>, headers: HeaderMap) -> Response {
    if let Some(resp) = shared.gate(BUMP_ADDRESS_PATH, &headers) {
        return resp;
    }
    Json(json!({"address": shared.config.bump_address})).into_response()
}

async fn fee(State(shared): State<Arc<ServiceShared>>, headers: HeaderMap) -> Response {
    if let Some(resp) = shared.gate(FEE_PATH, &headers) {
        return resp;
    }
    Json(json!({"current_sats_per_kb": shared.config.sats_per_kb})).into_response()
}

// ---------------------------------------------------------------------------
// Fake Express gateway
// ---------------------------------------------------------------------------

struct ExpressShared {
    trials: Mutex<VecDeque<TrialBuild>>,
    reject_build: Option<(u16, Value)>,
    address_requests: Mutex<Vec<Value>>,
    build_requests: Mutex<Vec<Value>>,
}

impl ExpressShared {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"))
    }
}

/// Loopback wallet gateway for wallet [`WALLET_ID`] of [`COIN`].
///
/// Serves the queued trial builds in order, repeating the last one.
pub struct FakeExpress {
    pub url: String,
    shared: Arc<ExpressShared>,
}

impl FakeExpress {
    pub async fn start(trials: Vec<TrialBuild>) -> Self {
        Self::start_inner(trials, None).await
    }

    /// Gateway whose `tx/build` always answers `(status, body)`.
    pub async fn start_rejecting(status: u16, body: Value) -> Self {
        Self::start_inner(Vec::new(), Some((status, body))).await
    }

    async fn start_inner(trials: Vec<TrialBuild>, reject_build: Option<(u16, Value)>) -> Self {
        let shared = Arc::new(ExpressShared {
            trials: Mutex::new(trials.into()),
            reject_build,
            address_requests: Mutex::new(Vec::new()),
            build_requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/api/v2/:coin/wallet/:id/address", post(express_address))
            .route("/api/v2/:coin/wallet/:id/tx/build", post(express_build))
            .with_state(shared.clone());
        let addr = serve(app).await;
        Self {
            url: format!("http://{addr}"),
            shared,
        }
    }

    /// Engine pointed at this gateway with the right credentials.
    pub fn engine(&self) -> ExpressWalletEngine {
        self.engine_with_token(ACCESS_TOKEN)
    }

    pub fn engine_with_token(&self, token: &str) -> ExpressWalletEngine {
        ExpressWalletEngine::new(&self.url, COIN, WALLET_ID, ApiKey::new(token))
            .expect("http client")
    }

    /// JSON bodies posted to the address endpoint.
    pub fn address_requests(&self) -> Vec<Value> {
        self.shared.address_requests.lock().unwrap().clone()
    }

    /// JSON bodies posted to the build endpoint.
    pub fn build_requests(&self) -> Vec<Value> {
        self.shared.build_requests.lock().unwrap().clone()
    }
}

fn known_wallet(coin: &str, id: &str) -> bool {
    coin == COIN && id == WALLET_ID
}

async fn express_address(
    State(shared): State<Arc<ExpressShared>>,
    Path((coin, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shared.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response();
    }
    if !known_wallet(&coin, &id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    shared.address_requests.lock().unwrap().push(body.clone());
    Json(json!({
        "id": "addr-1",
        "address": RETURN_ADDRESS,
        "chain": body["chain"],
        "index": 7,
        "coin": coin,
        "wallet": id,
    }))
    .into_response()
}

async fn express_build(
    State(shared): State<Arc<ExpressShared>>,
    Path((coin, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !shared.authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "unauthorized"}))).into_response();
    }
    if !known_wallet(&coin, &id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    shared.build_requests.lock().unwrap().push(body);
    if let Some((status, body)) = &shared.reject_build {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(body.clone())).into_response();
    }

    let trial = {
        let mut trials = shared.trials.lock().unwrap();
        if trials.len() > 1 {
            trials.pop_front()
        } else {
            trials.front().cloned()
        }
    };
    match trial {
        Some(trial) => Json(json!({
            "txHex": "01000000000000",
            "txInfo": {
                "nP2SHInputs": 0,
                "nSegwitInputs": trial.unspents.len(),
                "nOutputs": 3,
                "unspents": trial.unspents,
                "changeAddresses": trial.change_addresses,
            },
            "feeInfo": {
                "size": trial.size,
                "fee": trial.fee,
                "feeRate": trial.fee * 1000 / trial.size.max(1),
                "payGoFee": 0,
            },
        }))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "insufficient balance"})),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// In-process collaborators
// ---------------------------------------------------------------------------

/// Wallet engine answering prebuilds from a script and recording requests.
pub struct ScriptedWallet {
    trials: Mutex<VecDeque<Result<TrialBuild, SmartFeeError>>>,
    address_requests: Mutex<Vec<AddressOptions>>,
    prebuilds: Mutex<Vec<BuildParams>>,
}

impl ScriptedWallet {
    pub fn new(trial: TrialBuild) -> Self {
        Self::scripted(vec![Ok(trial)])
    }

    /// Wallet whose prebuild fails with `err`.
    pub fn failing(err: SmartFeeError) -> Self {
        Self::scripted(vec![Err(err)])
    }

    pub fn scripted(results: Vec<Result<TrialBuild, SmartFeeError>>) -> Self {
        Self {
            trials: Mutex::new(results.into()),
            address_requests: Mutex::new(Vec::new()),
            prebuilds: Mutex::new(Vec::new()),
        }
    }

    pub fn address_requests(&self) -> Vec<AddressOptions> {
        self.address_requests.lock().unwrap().clone()
    }

    pub fn prebuilds(&self) -> Vec<BuildParams> {
        self.prebuilds.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletEngine for ScriptedWallet {
    async fn create_address(
        &self,
        options: &AddressOptions,
    ) -> Result<WalletAddress, SmartFeeError> {
        self.address_requests.lock().unwrap().push(options.clone());
        Ok(WalletAddress {
            address: RETURN_ADDRESS.to_string(),
        })
    }

    async fn prebuild_transaction(
        &self,
        params: &BuildParams,
    ) -> Result<TrialBuild, SmartFeeError> {
        self.prebuilds.lock().unwrap().push(params.clone());
        self.trials
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SmartFeeError::BuildFailure("no scripted trial left".into())))
    }
}

/// Fee service with a fixed quote.
pub struct StaticFeeService {
    pub bump_address: String,
    pub sats_per_kb: u64,
    registered: Mutex<Vec<String>>,
}

impl StaticFeeService {
    pub fn new(sats_per_kb: u64) -> Self {
        Self {
            bump_address: BUMP_ADDRESS.to_string(),
            sats_per_kb,
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn registered(&self) -> Vec<String> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeeService for StaticFeeService {
    async fn register_return_address(&self, address: &str) -> Result<(), SmartFeeError> {
        self.registered.lock().unwrap().push(address.to_string());
        Ok(())
    }

    async fn bump_address(&self) -> Result<String, SmartFeeError> {
        Ok(self.bump_address.clone())
    }

    async fn fee_rate(&self) -> Result<u64, SmartFeeError> {
        Ok(self.sats_per_kb)
    }
}
