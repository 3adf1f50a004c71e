//! Trial build: one provisional prebuild to learn realized size, fee and
//! input selection.

use tracing::info;

use smartfee_core::{AddressType, BuildParams, Recipient, SmartFeeError, TrialBuild, WalletEngine};

use crate::assemble::BuildParamsAssembler;

/// Parameters for the trial build of `augmented` recipients at `sats_per_kb`.
pub fn trial_params(
    augmented: Vec<Recipient>,
    sats_per_kb: u64,
    address_type: AddressType,
    target_wallet_unspents: Option<u32>,
) -> BuildParams {
    BuildParamsAssembler::new(address_type)
        .fee_rate(sats_per_kb)
        .target_wallet_unspents(target_wallet_unspents)
        .assemble(augmented)
}

/// Ask the engine to prebuild `params` exactly once.
///
/// Engine failures propagate unchanged.
pub async fn run_trial(
    wallet: &dyn WalletEngine,
    params: &BuildParams,
) -> Result<TrialBuild, SmartFeeError> {
    let trial = wallet.prebuild_transaction(params).await?;
    info!(
        fee = trial.fee,
        size = trial.size,
        inputs = trial.unspents.len(),
        change_outputs = trial.change_addresses.len(),
        "trial build complete"
    );
    Ok(trial)
}
