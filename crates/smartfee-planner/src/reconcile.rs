//! Change elimination.
//!
//! Given the trial build, decide whether to keep it or recompute the
//! fee-bump amount so the engine builds the same inputs with no change
//! output:
//!
//! 1. Zero change outputs, or more than one (the engine already split
//!    change), means accept the trial parameters with their inputs pinned.
//! 2. Exactly one change output means recompute once:
//!    - `new_size = trial.size - change_output_size(address_type)`
//!    - `new_fee` = the trial's realized rate applied to `new_size`
//!    - `bump = sum(inputs) - sum(original recipients) - new_fee`
//!    - retry parameters pin the trial's inputs and carry the new bump output.
//!
//! The correction is computed once and never iterated. If the engine still
//! adds change on the final build (remainder above its dust threshold), that
//! is accepted.
//!
//! All arithmetic is exact integer arithmetic in `u128`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use smartfee_core::constants::BYTES_PER_KB;
use smartfee_core::{
    AddressType, BuildParams, Recipient, SmartFeeError, TrialBuild, sum_recipients,
};

use crate::assemble::{BuildParamsAssembler, pin_trial_unspents};
use crate::augment::with_bump_output;

/// How the trial's realized fee rate is rounded when recomputing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingPolicy {
    /// Round the rate up when sizing the fee (so the bump output can always
    /// cover the real fee), then round it down when stamping `feeRate` (so
    /// the engine is never asked for more than the pinned inputs afford).
    #[default]
    Directional,
    /// Use the exact realized rate and round the fee to the nearest
    /// satoshi, halves up. The stamped rate is floored as in `Directional`.
    Nearest,
}

impl RoundingPolicy {
    /// `(new_fee, stamped_fee_rate)` for a change-free build of `new_size`
    /// bytes, given the trial's realized `fee` over `size` bytes.
    ///
    /// The stamped rate never exceeds the realized rate. `size` must be
    /// non-zero; an intermediate product too large for `u128`, or a result
    /// too large for `u64`, is a [`SmartFeeError::BuildFailure`].
    pub fn fee_for(
        &self,
        fee: u64,
        size: u64,
        new_size: u64,
    ) -> Result<(u64, u64), SmartFeeError> {
        let overflow = || SmartFeeError::BuildFailure("recomputed fee overflows".into());
        let fee = u128::from(fee);
        let size = u128::from(size);
        let new_size = u128::from(new_size);
        let kb = u128::from(BYTES_PER_KB);

        let fee_kb = fee.checked_mul(kb).ok_or_else(overflow)?;
        let new_fee = match self {
            Self::Directional => {
                let rate_up = fee_kb.div_ceil(size);
                rate_up
                    .checked_mul(new_size)
                    .ok_or_else(overflow)?
                    .div_ceil(kb)
            }
            Self::Nearest => {
                let twice = fee
                    .checked_mul(new_size)
                    .and_then(|p| p.checked_mul(2))
                    .and_then(|p| p.checked_add(size))
                    .ok_or_else(overflow)?;
                twice / size.checked_mul(2).ok_or_else(overflow)?
            }
        };
        let rate = fee_kb / size;

        Ok((
            u64::try_from(new_fee).map_err(|_| overflow())?,
            u64::try_from(rate).map_err(|_| overflow())?,
        ))
    }
}

impl std::str::FromStr for RoundingPolicy {
    type Err = SmartFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "directional" => Ok(Self::Directional),
            "nearest" => Ok(Self::Nearest),
            other => Err(SmartFeeError::Configuration(format!(
                "unknown rounding policy {other:?} (must be 'directional' or 'nearest')"
            ))),
        }
    }
}

/// Outcome of reconciliation: the parameters to hand back and how they came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The trial parameters are used unchanged apart from pinned inputs.
    Accepted {
        /// Final parameters.
        params: BuildParams,
        /// Number of change outputs the trial produced (0 or more than 1).
        change_outputs: usize,
    },
    /// Parameters recomputed to remove the single change output.
    Recomputed {
        /// Final parameters.
        params: BuildParams,
        /// Estimated size without the change output, in bytes.
        new_size: u64,
        /// Fee expected at `new_size`, in satoshis.
        new_fee: u64,
        /// New fee-bump output amount, in satoshis.
        bump_amount: u64,
    },
}

impl Reconciliation {
    /// The final build parameters.
    pub fn params(&self) -> &BuildParams {
        match self {
            Self::Accepted { params, .. } | Self::Recomputed { params, .. } => params,
        }
    }

    /// Consume into the final build parameters.
    pub fn into_params(self) -> BuildParams {
        match self {
            Self::Accepted { params, .. } | Self::Recomputed { params, .. } => params,
        }
    }
}

/// Whether the trial build can be used as-is.
///
/// True for no change, and for split change (more than one change output),
/// which leaves no single leftover to eliminate.
pub fn should_accept(trial: &TrialBuild) -> bool {
    trial.change_addresses.len() != 1
}

/// Decides between accepting the trial build and recomputing without change.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeEliminationReconciler {
    address_type: AddressType,
    rounding: RoundingPolicy,
}

impl ChangeEliminationReconciler {
    pub fn new(address_type: AddressType, rounding: RoundingPolicy) -> Self {
        Self {
            address_type,
            rounding,
        }
    }

    /// Reconcile a trial build.
    ///
    /// # Arguments
    /// - `trial_params`: the parameters the trial was built from
    /// - `trial`: the engine's trial build
    /// - `original`: the caller's recipients, without the fee-bump output
    /// - `bump_address`: the fee service's bumping address
    pub fn reconcile(
        &self,
        trial_params: BuildParams,
        trial: &TrialBuild,
        original: &[Recipient],
        bump_address: &str,
    ) -> Result<Reconciliation, SmartFeeError> {
        if should_accept(trial) {
            info!(
                change_outputs = trial.change_addresses.len(),
                "using trial build as-is"
            );
            return Ok(Reconciliation::Accepted {
                params: pin_trial_unspents(trial_params, trial),
                change_outputs: trial.change_addresses.len(),
            });
        }
        self.recompute(trial, original, bump_address)
    }

    /// Recompute parameters for a change-free build on the trial's inputs.
    pub fn recompute(
        &self,
        trial: &TrialBuild,
        original: &[Recipient],
        bump_address: &str,
    ) -> Result<Reconciliation, SmartFeeError> {
        let change_size = self.address_type.change_output_size();
        if trial.size <= change_size {
            return Err(SmartFeeError::BuildFailure(format!(
                "trial size {} bytes does not exceed the {change_size}-byte change output",
                trial.size
            )));
        }
        let new_size = trial.size - change_size;
        let sum_inputs = trial.sum_inputs()?;
        let sum_original = sum_recipients(original)?;

        let (new_fee, fee_rate) = self.rounding.fee_for(trial.fee, trial.size, new_size)?;

        let bump_amount = sum_inputs
            .checked_sub(sum_original)
            .and_then(|left| left.checked_sub(new_fee))
            .ok_or_else(|| {
                warn!(sum_inputs, sum_original, new_fee, "inputs cannot cover change-free build");
                SmartFeeError::InsufficientFunds {
                    inputs: sum_inputs,
                    recipients: sum_original,
                    fee: new_fee,
                }
            })?;

        info!(
            new_size,
            new_fee,
            fee_rate,
            bump_amount,
            rounding = ?self.rounding,
            "recomputed fee-bump output without change"
        );

        let recipients = with_bump_output(original, Recipient::new(bump_address, bump_amount));
        let params = BuildParamsAssembler::new(self.address_type)
            .fee_rate(fee_rate)
            .pin_unspents(trial.unspent_ids())
            .assemble(recipients);

        Ok(Reconciliation::Recomputed {
            params,
            new_size,
            new_fee,
            bump_amount,
        })
    }
}
