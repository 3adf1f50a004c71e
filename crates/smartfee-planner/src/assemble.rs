//! Build parameter assembly.
//!
//! Every parameter set this crate produces goes through
//! [`BuildParamsAssembler`], so the confirmation policy, address type and
//! change-splitting rule are stamped identically for the trial build, the
//! accepted build and the recomputed build.

use smartfee_core::{AddressType, BuildParams, Recipient, TrialBuild};

/// Builder for [`BuildParams`].
///
/// # Example
/// ```ignore
/// let params = BuildParamsAssembler::new(AddressType::P2wsh)
///     .fee_rate(4000)
///     .pin_unspents(trial.unspent_ids())
///     .assemble(recipients);
/// ```
#[derive(Debug, Clone)]
pub struct BuildParamsAssembler {
    address_type: AddressType,
    fee_rate: Option<u64>,
    unspents: Option<Vec<String>>,
    target_wallet_unspents: Option<u32>,
}

impl BuildParamsAssembler {
    /// Assembler with no fee rate, no pinned inputs and change splitting off.
    pub fn new(address_type: AddressType) -> Self {
        Self {
            address_type,
            fee_rate: None,
            unspents: None,
            target_wallet_unspents: None,
        }
    }

    /// Request a fee rate in sats/kB. A zero rate is left unset so the
    /// engine falls back to its own estimate.
    pub fn fee_rate(&mut self, sats_per_kb: u64) -> &mut Self {
        self.fee_rate = (sats_per_kb > 0).then_some(sats_per_kb);
        self
    }

    /// Force the engine to spend exactly these inputs.
    pub fn pin_unspents(&mut self, ids: Vec<String>) -> &mut Self {
        self.unspents = Some(ids);
        self
    }

    /// Let the engine split change toward a target unspent count.
    pub fn target_wallet_unspents(&mut self, target: Option<u32>) -> &mut Self {
        self.target_wallet_unspents = target;
        self
    }

    /// Produce the parameters for `recipients`.
    pub fn assemble(&self, recipients: Vec<Recipient>) -> BuildParams {
        let mut params = BuildParams::new(recipients, self.address_type);
        params.no_split_change = self.target_wallet_unspents.is_none();
        params.target_wallet_unspents = self.target_wallet_unspents;
        params.fee_rate = self.fee_rate;
        params.unspents = self.unspents.clone();
        params
    }
}

/// Pin the trial build's selected inputs onto parameters being accepted as-is.
pub fn pin_trial_unspents(mut params: BuildParams, trial: &TrialBuild) -> BuildParams {
    params.unspents = Some(trial.unspent_ids());
    params
}
