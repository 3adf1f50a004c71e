//! Top-level send-parameter generation.
//!
//! Strictly sequential: return address → fee quote → augmented recipients →
//! trial build → reconciliation. Each collaborator call is awaited before
//! the next begins, nothing is retried, and the first error aborts the
//! whole operation.

use tracing::info;

use smartfee_client::SmartFeeClient;
use smartfee_core::{
    BuildParams, Environment, FeeService, Recipient, SmartFeeError, WalletEngine, sum_recipients,
};

use crate::augment::augment_recipients;
use crate::issuer::issue_return_address;
use crate::options::SmartFeeOptions;
use crate::quote::fetch_quote;
use crate::reconcile::{ChangeEliminationReconciler, Reconciliation};
use crate::trial::{run_trial, trial_params};

/// Generate wallet build parameters that pay `recipients`, add one
/// good-sized output to the Smart Fee bumping address, and avoid a change
/// output where possible.
///
/// Options are validated before any network activity. `recipients` is
/// never modified.
pub async fn generate_send_params(
    wallet: &dyn WalletEngine,
    recipients: &[Recipient],
    options: &SmartFeeOptions,
    env: &Environment,
) -> Result<BuildParams, SmartFeeError> {
    let api_key = options.validate()?;
    let service = SmartFeeClient::new(env.clone(), api_key.clone())?;
    info!(env = env.name(), recipients = recipients.len(), "generating Smart Fee send params");
    Ok(plan_with_service(wallet, &service, recipients, options)
        .await?
        .into_params())
}

/// Run the pipeline against an already-configured fee service.
///
/// Returns the full [`Reconciliation`] so callers can see which branch was
/// taken. The API key in `options` is not consulted.
pub async fn plan_with_service(
    wallet: &dyn WalletEngine,
    service: &dyn FeeService,
    recipients: &[Recipient],
    options: &SmartFeeOptions,
) -> Result<Reconciliation, SmartFeeError> {
    // Reject bad amounts before the return address registration side effect.
    sum_recipients(recipients)?;

    issue_return_address(
        wallet,
        service,
        options.address_type,
        options.return_address_label.as_deref(),
    )
    .await?;

    let quote = fetch_quote(service).await?;

    let (augmented, bump_output) = augment_recipients(recipients, &quote.bump_address)?;
    info!(amount = %bump_output.amount, "appended Smart Fee output");

    let params = trial_params(
        augmented,
        quote.sats_per_kb,
        options.address_type,
        options.target_wallet_unspents,
    );
    let trial = run_trial(wallet, &params).await?;

    ChangeEliminationReconciler::new(options.address_type, options.rounding).reconcile(
        params,
        &trial,
        recipients,
        &quote.bump_address,
    )
}
