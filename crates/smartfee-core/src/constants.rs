//! Protocol constants. All monetary values in satoshis.

/// Smallest amount ever routed to the fee-bumping address.
///
/// Keeps the bumping output well clear of dust even when the batch is a
/// single tiny withdrawal.
pub const MIN_BUMP_AMOUNT_SATS: u64 = 50_000;

/// Minimum confirmations required on inputs (and on change) of every build.
pub const MIN_CONFIRMS: u32 = 1;

/// Fee rates are quoted per kilobyte.
pub const BYTES_PER_KB: u64 = 1_000;

/// Header carrying the Smart Fee API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Base URL of the staging fee service.
pub const STAGING_URL: &str = "https://api-staging.smartfee.live";

/// Base URL of the production fee service.
pub const PRODUCTION_URL: &str = "https://api.smartfee.live";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_fifty_thousand() {
        assert_eq!(MIN_BUMP_AMOUNT_SATS, 50_000);
    }

    #[test]
    fn urls_are_https() {
        assert!(STAGING_URL.starts_with("https://"));
        assert!(PRODUCTION_URL.starts_with("https://"));
        assert_ne!(STAGING_URL, PRODUCTION_URL);
    }
}
