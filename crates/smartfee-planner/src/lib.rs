//! # smartfee-planner — change-free send parameters with a fee-bump output.
//!
//! Talks to the Smart Fee service and the custodial wallet engine to
//! produce build parameters that pay a withdrawal batch, route one
//! good-sized output to the fee-bumping service, and avoid change where
//! the wallet's input selection allows it.
//!
//! # Modules
//!
//! - [`options`] — `SmartFeeOptions`
//! - [`issuer`] — wallet return address issuance and registration
//! - [`quote`] — bumping address and fee rate
//! - [`augment`] — fee-bump output sizing
//! - [`trial`] — the provisional prebuild
//! - [`reconcile`] — change elimination
//! - [`assemble`] — `BuildParams` assembly
//! - [`planner`] — the top-level operation

pub mod assemble;
pub mod augment;
pub mod issuer;
pub mod options;
pub mod planner;
pub mod quote;
pub mod reconcile;
pub mod trial;

// Re-exports for convenient access
pub use assemble::BuildParamsAssembler;
pub use augment::{augment_recipients, bump_amount};
pub use options::SmartFeeOptions;
pub use planner::{generate_send_params, plan_with_service};
pub use quote::FeeQuote;
pub use reconcile::{ChangeEliminationReconciler, Reconciliation, RoundingPolicy};
