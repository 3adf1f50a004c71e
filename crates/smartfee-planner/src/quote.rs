//! Fee quotes: a bumping address plus the current fee rate.

use tracing::info;

use smartfee_core::{FeeService, SmartFeeError};

/// What the fee service tells us before building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeQuote {
    /// One-time address the fee-bump output pays to.
    pub bump_address: String,
    /// Current next-block minimum fee rate in sats/kB.
    pub sats_per_kb: u64,
}

/// Query the fee service for a bumping address and the current fee rate.
///
/// Always two fresh requests, in that order.
pub async fn fetch_quote(service: &dyn FeeService) -> Result<FeeQuote, SmartFeeError> {
    info!("requesting an address from Smart Fee");
    let bump_address = service.bump_address().await?;
    info!(address = %bump_address, "received Smart Fee address");

    let sats_per_kb = service.fee_rate().await?;
    info!(sats_per_kb, "Smart Fee next block min-fee-rate");

    Ok(FeeQuote {
        bump_address,
        sats_per_kb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfee_core::MockFeeService;

    #[tokio::test]
    async fn quote_combines_both_endpoints() {
        let mut service = MockFeeService::new();
        service
            .expect_bump_address()
            .times(1)
            .returning(|| Ok("tb1qbumper".into()));
        service.expect_fee_rate().times(1).returning(|| Ok(4000));

        let quote = fetch_quote(&service).await.unwrap();
        assert_eq!(
            quote,
            FeeQuote {
                bump_address: "tb1qbumper".into(),
                sats_per_kb: 4000,
            }
        );
    }

    #[tokio::test]
    async fn address_rejection_skips_fee_request() {
        let mut service = MockFeeService::new();
        service
            .expect_bump_address()
            .returning(|| Err(SmartFeeError::rejection("/bumper/address", 429, "slow down")));
        service.expect_fee_rate().never();

        let err = fetch_quote(&service).await.unwrap_err();
        assert!(matches!(
            err,
            SmartFeeError::RemoteRejection { status: 429, .. }
        ));
    }
}
