//! Wallet gateway client against a loopback Express fake, and the full
//! pipeline with both collaborators on the wire.

use serde_json::json;

use smartfee_client::{ApiKey, ExpressWalletEngine};
use smartfee_core::{AddressOptions, AddressType, BuildParams, Recipient, SmartFeeError, WalletEngine};
use smartfee_planner::{BuildParamsAssembler, generate_send_params};
use smartfee_tests::helpers::*;

#[tokio::test]
async fn create_address_posts_chain_and_label() {
    let gateway = FakeExpress::start(vec![]).await;
    let engine = gateway.engine();

    let issued = engine
        .create_address(&AddressOptions {
            chain: 20,
            label: Some("returns".into()),
        })
        .await
        .unwrap();

    assert_eq!(issued.address, RETURN_ADDRESS);
    assert_eq!(
        gateway.address_requests(),
        vec![json!({"chain": 20, "label": "returns"})]
    );
}

#[tokio::test]
async fn create_address_omits_missing_label() {
    let gateway = FakeExpress::start(vec![]).await;
    gateway
        .engine()
        .create_address(&AddressOptions {
            chain: 30,
            label: None,
        })
        .await
        .unwrap();

    assert_eq!(gateway.address_requests(), vec![json!({"chain": 30})]);
}

#[tokio::test]
async fn bad_token_is_wallet_error() {
    let gateway = FakeExpress::start(vec![]).await;
    let err = gateway
        .engine_with_token("expired")
        .create_address(&AddressOptions {
            chain: 20,
            label: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SmartFeeError::Wallet(_)), "{err:?}");
    assert!(gateway.address_requests().is_empty());
}

#[tokio::test]
async fn prebuild_sends_camel_case_params() {
    let gateway = FakeExpress::start(vec![trial(1000, 250, &[1_000_000], 1)]).await;
    let params = BuildParamsAssembler::new(AddressType::P2wsh)
        .fee_rate(4000)
        .pin_unspents(vec!["u1".into()])
        .assemble(vec![Recipient::new("tb1qalice", 600_000)]);

    let trial_build = gateway.engine().prebuild_transaction(&params).await.unwrap();

    assert_eq!(trial_build, trial(1000, 250, &[1_000_000], 1));
    assert_eq!(
        gateway.build_requests(),
        vec![json!({
            "recipients": [{"address": "tb1qalice", "amount": "600000"}],
            "minConfirms": 1,
            "enforceMinConfirmsForChange": true,
            "noSplitChange": true,
            "addressType": "p2wsh",
            "feeRate": 4000,
            "unspents": ["u1"],
        })]
    );
}

#[tokio::test]
async fn prebuild_rejection_is_build_failure() {
    let gateway =
        FakeExpress::start_rejecting(400, json!({"error": "insufficient balance"})).await;
    let params = BuildParams::new(vec![Recipient::new("tb1qalice", 1)], AddressType::P2wsh);

    let err = gateway
        .engine()
        .prebuild_transaction(&params)
        .await
        .unwrap_err();

    match err {
        SmartFeeError::BuildFailure(msg) => assert!(msg.contains("insufficient balance"), "{msg}"),
        other => panic!("expected build failure, got {other:?}"),
    }
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let service = FakeSmartFee::start().await;
    let gateway = FakeExpress::start(vec![trial(1000, 250, &[1_000_000], 1)]).await;
    let engine = gateway.engine();

    let params = generate_send_params(&engine, &batch(), &options(), &service.env)
        .await
        .unwrap();

    assert_eq!(
        params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 99_172))
    );
    assert_eq!(params.unspents, Some(vec!["u1".to_string()]));
    assert_eq!(service.return_addresses(), vec![RETURN_ADDRESS]);
    assert_eq!(gateway.address_requests(), vec![json!({"chain": 20})]);

    // Only the trial went through the gateway; the caller submits the result.
    let builds = gateway.build_requests();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0]["recipients"][2]["amount"], json!("900000"));
    assert!(builds[0].get("unspents").is_none());
}

/// An engine pointed at a loopback port nothing listens on.
async fn unreachable_engine() -> ExpressWalletEngine {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    ExpressWalletEngine::new(format!("http://{addr}"), COIN, WALLET_ID, ApiKey::new(ACCESS_TOKEN))
        .unwrap()
}

#[tokio::test]
async fn unreachable_gateway_build_is_build_failure() {
    let params = BuildParams::new(vec![Recipient::new("tb1qalice", 1)], AddressType::P2wsh);
    let err = unreachable_engine()
        .await
        .prebuild_transaction(&params)
        .await
        .unwrap_err();

    match err {
        SmartFeeError::BuildFailure(msg) => assert!(msg.starts_with("tx/build"), "{msg}"),
        other => panic!("expected build failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_gateway_address_is_wallet_error() {
    let err = unreachable_engine()
        .await
        .create_address(&AddressOptions {
            chain: 20,
            label: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SmartFeeError::Wallet(_)), "{err:?}");
}
