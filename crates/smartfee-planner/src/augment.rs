//! Fee-bump output sizing.
//!
//! The bumping output is roughly the size of the whole batch so the service
//! ends up with a good-sized UTXO, and never below
//! [`MIN_BUMP_AMOUNT_SATS`] so a single tiny withdrawal cannot make it dust.

use smartfee_core::constants::MIN_BUMP_AMOUNT_SATS;
use smartfee_core::{Recipient, SmartFeeError, sum_recipients};

/// Amount for the initial fee-bump output: `max(sum(recipients), floor)`.
pub fn bump_amount(recipients: &[Recipient]) -> Result<u64, SmartFeeError> {
    Ok(sum_recipients(recipients)?.max(MIN_BUMP_AMOUNT_SATS))
}

/// Copy `recipients` and append `bump_output` last.
///
/// The caller's slice is never touched.
pub fn with_bump_output(recipients: &[Recipient], bump_output: Recipient) -> Vec<Recipient> {
    let mut augmented = Vec::with_capacity(recipients.len() + 1);
    augmented.extend_from_slice(recipients);
    augmented.push(bump_output);
    augmented
}

/// Append a fee-bump output for `bump_address` sized by [`bump_amount`].
///
/// Returns the augmented list and the appended output.
pub fn augment_recipients(
    recipients: &[Recipient],
    bump_address: &str,
) -> Result<(Vec<Recipient>, Recipient), SmartFeeError> {
    let bump_output = Recipient::new(bump_address, bump_amount(recipients)?);
    Ok((
        with_bump_output(recipients, bump_output.clone()),
        bump_output,
    ))
}
