//! JSON input files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use smartfee_core::{Recipient, TrialBuild, sum_recipients};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load a recipient list: `[{"address": "...", "amount": "..."}]`.
///
/// Amounts are validated up front so a typo fails before any request.
pub fn load_recipients(path: &Path) -> Result<Vec<Recipient>> {
    let recipients: Vec<Recipient> = read_json(path)?;
    sum_recipients(&recipients)
        .with_context(|| format!("Invalid recipient in {}", path.display()))?;
    Ok(recipients)
}

/// Load a saved trial build:
/// `{"fee": .., "size": .., "unspents": [..], "changeAddresses": [..]}`.
pub fn load_trial(path: &Path) -> Result<TrialBuild> {
    read_json(path)
}
