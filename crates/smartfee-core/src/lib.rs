//! # smartfee-core — shared types for Smart Fee send-parameter generation.
//!
//! # Modules
//!
//! - [`constants`] — floor amount, confirmation policy, service URLs
//! - [`environment`] — fee service deployments
//! - [`error`] — `SmartFeeError` enum
//! - [`types`] — recipients, build parameters, trial builds
//! - [`traits`] — `WalletEngine` and `FeeService` collaborator interfaces

pub mod constants;
pub mod environment;
pub mod error;
pub mod traits;
pub mod types;

// Re-exports for convenient access
pub use environment::Environment;
pub use error::SmartFeeError;
pub use traits::{FeeService, WalletEngine};
pub use types::{
    AddressOptions, AddressType, BuildParams, Recipient, TrialBuild, Unspent, WalletAddress,
    sum_recipients,
};

#[cfg(any(test, feature = "testing"))]
pub use traits::{MockFeeService, MockWalletEngine};
