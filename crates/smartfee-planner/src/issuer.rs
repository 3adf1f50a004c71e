//! Return address issuance.
//!
//! Draws a fresh receive address from the wallet's return-flow chain and
//! registers it with the fee service. The service returns bumped funds to
//! the most recently registered address, so concurrent issuers race.

use tracing::info;

use smartfee_core::{AddressOptions, AddressType, FeeService, SmartFeeError, WalletEngine};

/// Issue a wallet return address and register it with the fee service.
///
/// Returns the registered address.
pub async fn issue_return_address(
    wallet: &dyn WalletEngine,
    service: &dyn FeeService,
    address_type: AddressType,
    label: Option<&str>,
) -> Result<String, SmartFeeError> {
    let options = AddressOptions {
        chain: address_type.receive_chain(),
        label: label.map(str::to_string),
    };
    let issued = wallet.create_address(&options).await?;
    info!(address = %issued.address, chain = options.chain, "generated wallet return address");

    service.register_return_address(&issued.address).await?;
    info!("posted wallet return address to Smart Fee");
    Ok(issued.address)
}
