//! Data model shared by the planner, the HTTP collaborators and the CLI.
//!
//! Wire shapes follow the wallet engine's JSON conventions: camelCase keys,
//! recipient amounts as decimal strings, optional fields omitted when unset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::MIN_CONFIRMS;
use crate::error::SmartFeeError;

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// A payment output: destination address and amount in satoshis.
///
/// The amount is kept as the caller supplied it and only parsed when summed,
/// so an unparseable amount surfaces as [`SmartFeeError::InvalidRecipient`]
/// at the point of use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Destination address.
    pub address: String,
    /// Amount in satoshis, as a decimal string.
    #[serde(deserialize_with = "amount_from_string_or_number")]
    pub amount: String,
}

impl Recipient {
    /// Recipient with an already-integral amount.
    pub fn new(address: impl Into<String>, amount_sats: u64) -> Self {
        Self {
            address: address.into(),
            amount: amount_sats.to_string(),
        }
    }

    /// Parse the amount as a non-negative integer number of satoshis.
    ///
    /// Only ASCII digits are accepted, so the string validated here is
    /// exactly the string sent to the engine.
    pub fn amount_sats(&self) -> Result<u64, SmartFeeError> {
        if self.amount.is_empty() || !self.amount.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SmartFeeError::InvalidRecipient(format!(
                "amount {:?} for {} is not a non-negative integer",
                self.amount, self.address
            )));
        }
        self.amount.parse::<u64>().map_err(|_| {
            SmartFeeError::InvalidRecipient(format!(
                "amount {} for {} is out of range",
                self.amount, self.address
            ))
        })
    }
}

/// Sum recipient amounts with overflow checking.
pub fn sum_recipients(recipients: &[Recipient]) -> Result<u64, SmartFeeError> {
    recipients.iter().try_fold(0u64, |acc, r| {
        acc.checked_add(r.amount_sats()?)
            .ok_or_else(|| SmartFeeError::InvalidRecipient("recipient total overflows".into()))
    })
}

fn amount_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(u64),
        Text(String),
    }

    Ok(match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => n.to_string(),
        RawAmount::Text(s) => s.trim().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Address types
// ---------------------------------------------------------------------------

/// Script type of the outputs the wallet engine generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressType {
    /// Legacy pay-to-script-hash.
    #[serde(rename = "p2sh")]
    P2sh,
    /// Wrapped segwit script hash.
    #[serde(rename = "p2shP2wsh")]
    P2shP2wsh,
    /// Native segwit script hash.
    #[default]
    #[serde(rename = "p2wsh")]
    P2wsh,
    /// Taproot.
    #[serde(rename = "p2tr")]
    P2tr,
}

impl AddressType {
    /// Wire tag understood by the wallet engine.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P2sh => "p2sh",
            Self::P2shP2wsh => "p2shP2wsh",
            Self::P2wsh => "p2wsh",
            Self::P2tr => "p2tr",
        }
    }

    /// Receive chain whose addresses are reserved for return flows.
    pub fn receive_chain(&self) -> u32 {
        match self {
            Self::P2sh => 0,
            Self::P2shP2wsh => 10,
            Self::P2wsh => 20,
            Self::P2tr => 30,
        }
    }

    /// Bytes one change output of this type adds to a transaction.
    ///
    /// 8-byte value + 1-byte script length + output script.
    pub fn change_output_size(&self) -> u64 {
        match self {
            Self::P2sh | Self::P2shP2wsh => 8 + 1 + 23,
            Self::P2wsh | Self::P2tr => 8 + 1 + 34,
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = SmartFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "p2sh" => Ok(Self::P2sh),
            "p2shP2wsh" => Ok(Self::P2shP2wsh),
            "p2wsh" => Ok(Self::P2wsh),
            "p2tr" => Ok(Self::P2tr),
            other => Err(SmartFeeError::Configuration(format!(
                "unknown address type: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Wallet engine request/response shapes
// ---------------------------------------------------------------------------

/// Options for [`WalletEngine::create_address`](crate::traits::WalletEngine::create_address).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressOptions {
    /// Derivation chain to draw the address from.
    pub chain: u32,
    /// Optional human-readable label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// An address issued by the wallet engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress {
    /// Encoded address.
    pub address: String,
}

/// Build request handed to the wallet engine.
///
/// This is also the sole artifact returned to callers of
/// `generate_send_params`; they submit it to the engine for final signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildParams {
    /// Outputs in transaction order; the fee-bump output is last.
    pub recipients: Vec<Recipient>,
    /// Minimum confirmations on inputs.
    pub min_confirms: u32,
    /// Apply `min_confirms` to change outputs too.
    pub enforce_min_confirms_for_change: bool,
    /// Suppress splitting change across several outputs.
    pub no_split_change: bool,
    /// Script type for generated outputs.
    pub address_type: AddressType,
    /// Fee rate in sats/kB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_rate: Option<u64>,
    /// Input identifiers the engine must spend, bypassing coin selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unspents: Option<Vec<String>>,
    /// Desired wallet unspent count, which lets the engine split change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_wallet_unspents: Option<u32>,
}

impl BuildParams {
    /// Parameters with the fixed confirmation policy and no optional fields.
    pub fn new(recipients: Vec<Recipient>, address_type: AddressType) -> Self {
        Self {
            recipients,
            min_confirms: MIN_CONFIRMS,
            enforce_min_confirms_for_change: true,
            no_split_change: true,
            address_type,
            fee_rate: None,
            unspents: None,
            target_wallet_unspents: None,
        }
    }
}

/// One input selected by a trial build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspent {
    /// Outpoint identifier (`txid:vout`).
    pub id: String,
    /// Value in satoshis.
    pub value: u64,
}

/// The wallet engine's provisional build: read-only evidence for the
/// reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBuild {
    /// Realized fee in satoshis.
    pub fee: u64,
    /// Realized size in bytes.
    pub size: u64,
    /// Inputs the engine selected.
    pub unspents: Vec<Unspent>,
    /// Change addresses actually created (possibly none).
    #[serde(default)]
    pub change_addresses: Vec<String>,
}

impl TrialBuild {
    /// Identifiers of the selected inputs, in selection order.
    pub fn unspent_ids(&self) -> Vec<String> {
        self.unspents.iter().map(|u| u.id.clone()).collect()
    }

    /// Total value of the selected inputs.
    pub fn sum_inputs(&self) -> Result<u64, SmartFeeError> {
        self.unspents.iter().try_fold(0u64, |acc, u| {
            acc.checked_add(u.value)
                .ok_or_else(|| SmartFeeError::BuildFailure("input total overflows".into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn amount_parses_integer_strings() {
        assert_eq!(Recipient::new("a", 1234).amount_sats().unwrap(), 1234);
    }

    #[test]
    fn deserialized_amount_is_trimmed_before_it_is_sent() {
        let r: Recipient =
            serde_json::from_value(json!({"address": "a", "amount": " 42 "})).unwrap();
        assert_eq!(r.amount, "42");
        assert_eq!(r.amount_sats().unwrap(), 42);

        let params = BuildParams::new(vec![r], AddressType::P2wsh);
        let wire = serde_json::to_value(&params).unwrap();
        assert_eq!(wire["recipients"][0]["amount"], json!("42"));
    }

    #[test]
    fn amount_rejects_garbage() {
        for bad in ["", " 42 ", "-5", "1.5", "12abc", "0x10", "99999999999999999999999"] {
            let r = Recipient {
                address: "a".into(),
                amount: bad.into(),
            };
            assert!(
                matches!(r.amount_sats(), Err(SmartFeeError::InvalidRecipient(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn sum_recipients_overflow_is_invalid() {
        let rs = vec![Recipient::new("a", u64::MAX), Recipient::new("b", 1)];
        assert!(matches!(
            sum_recipients(&rs),
            Err(SmartFeeError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn recipient_deserializes_number_or_string() {
        let rs: Vec<Recipient> = serde_json::from_value(json!([
            {"address": "a", "amount": 1000},
            {"address": "b", "amount": "2000"}
        ]))
        .unwrap();
        assert_eq!(rs[0].amount, "1000");
        assert_eq!(rs[1].amount, "2000");
        assert_eq!(sum_recipients(&rs).unwrap(), 3000);
    }

    #[test]
    fn address_type_wire_tags_round_trip() {
        for t in [
            AddressType::P2sh,
            AddressType::P2shP2wsh,
            AddressType::P2wsh,
            AddressType::P2tr,
        ] {
            assert_eq!(t.as_str().parse::<AddressType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
        assert!("segwit".parse::<AddressType>().is_err());
    }

    #[test]
    fn p2wsh_change_output_is_43_bytes() {
        assert_eq!(AddressType::P2wsh.change_output_size(), 43);
        assert_eq!(AddressType::P2wsh.receive_chain(), 20);
        assert_eq!(AddressType::default(), AddressType::P2wsh);
    }

    #[test]
    fn build_params_wire_shape() {
        let mut params = BuildParams::new(vec![Recipient::new("a", 10)], AddressType::P2wsh);
        params.fee_rate = Some(4000);
        let v = serde_json::to_value(&params).unwrap();
        assert_eq!(
            v,
            json!({
                "recipients": [{"address": "a", "amount": "10"}],
                "minConfirms": 1,
                "enforceMinConfirmsForChange": true,
                "noSplitChange": true,
                "addressType": "p2wsh",
                "feeRate": 4000
            })
        );
    }

    #[test]
    fn trial_build_defaults_missing_change_addresses() {
        let t: TrialBuild = serde_json::from_value(json!({
            "fee": 1000,
            "size": 250,
            "unspents": [{"id": "u1", "value": 1_000_000}]
        }))
        .unwrap();
        assert!(t.change_addresses.is_empty());
        assert_eq!(t.unspent_ids(), vec!["u1".to_string()]);
        assert_eq!(t.sum_inputs().unwrap(), 1_000_000);
    }
}
