//! Caller options for send-parameter generation.

use smartfee_client::ApiKey;
use smartfee_core::{AddressType, SmartFeeError};

use crate::reconcile::RoundingPolicy;

/// Options accepted by [`generate_send_params`](crate::planner::generate_send_params).
#[derive(Debug, Clone, Default)]
pub struct SmartFeeOptions {
    /// Smart Fee API key (required).
    pub api_key: Option<ApiKey>,
    /// Label attached to the wallet return address.
    pub return_address_label: Option<String>,
    /// Desired wallet unspent count; lets the engine split change.
    pub target_wallet_unspents: Option<u32>,
    /// Script type of generated outputs (default `p2wsh`).
    pub address_type: AddressType,
    /// Fee-rate rounding used when recomputing without change.
    pub rounding: RoundingPolicy,
}

impl SmartFeeOptions {
    /// Options carrying just an API key, everything else default.
    pub fn with_api_key(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Check the options before any network activity and return the key.
    pub fn validate(&self) -> Result<&ApiKey, SmartFeeError> {
        match &self.api_key {
            Some(key) if !key.is_blank() => Ok(key),
            _ => Err(SmartFeeError::Configuration(
                "must set api_key in SmartFeeOptions".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_configuration_error() {
        let opts = SmartFeeOptions::default();
        assert!(matches!(
            opts.validate(),
            Err(SmartFeeError::Configuration(_))
        ));
    }

    #[test]
    fn blank_key_is_configuration_error() {
        let opts = SmartFeeOptions::with_api_key("   ");
        assert!(opts.validate().is_err());
    }

    #[test]
    fn valid_key_passes() {
        let opts = SmartFeeOptions::with_api_key("k");
        assert_eq!(opts.validate().unwrap().expose(), "k");
        assert_eq!(opts.address_type, AddressType::P2wsh);
        assert_eq!(opts.rounding, RoundingPolicy::Directional);
    }
}
