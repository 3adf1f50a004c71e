//! Collaborator interfaces.
//!
//! The planner only talks to the outside world through these two traits:
//! - [`WalletEngine`]: address issuance and transaction prebuilds (the
//!   custodial wallet; smartfee-client's `ExpressWalletEngine` implements it)
//! - [`FeeService`]: the remote Smart Fee API (smartfee-client's
//!   `SmartFeeClient` implements it)
//!
//! Both are object-safe so tests can substitute deterministic fakes.

use async_trait::async_trait;

use crate::error::SmartFeeError;
use crate::types::{AddressOptions, BuildParams, TrialBuild, WalletAddress};

/// The custodial wallet's address and transaction-construction engine.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait WalletEngine: Send + Sync {
    /// Issue a fresh receive address on the requested chain.
    async fn create_address(&self, options: &AddressOptions)
    -> Result<WalletAddress, SmartFeeError>;

    /// Construct (but do not sign) a transaction for `params`.
    ///
    /// The returned trial build reports the realized fee, size, selected
    /// inputs and any change addresses the engine created.
    async fn prebuild_transaction(&self, params: &BuildParams)
    -> Result<TrialBuild, SmartFeeError>;
}

/// The remote fee-bumping service.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeeService: Send + Sync {
    /// Register the address bumped funds are returned to.
    ///
    /// The most recent registration wins on the server side.
    async fn register_return_address(&self, address: &str) -> Result<(), SmartFeeError>;

    /// Request a one-time address for the fee-bump output.
    async fn bump_address(&self) -> Result<String, SmartFeeError>;

    /// Current minimum next-block fee rate in sats/kB.
    async fn fee_rate(&self) -> Result<u64, SmartFeeError>;
}
