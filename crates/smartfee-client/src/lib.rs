//! # smartfee-client — HTTP implementations of the collaborator traits.
//!
//! # Modules
//!
//! - [`api_key`] — redacting, zeroizing credential wrapper
//! - [`fee_service`] — `SmartFeeClient`, the Smart Fee bumper API
//! - [`express`] — `ExpressWalletEngine`, a REST wallet gateway
//! - [`http`] — shared status/decoding helpers

pub mod api_key;
pub mod express;
pub mod fee_service;
pub mod http;

pub use api_key::ApiKey;
pub use express::ExpressWalletEngine;
pub use fee_service::SmartFeeClient;
