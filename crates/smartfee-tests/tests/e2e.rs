//! End-to-end send-parameter generation over HTTP.
//!
//! Each test starts a loopback Smart Fee API, runs the public
//! `generate_send_params` against it with a scripted wallet engine, and
//! checks both the returned parameters and what each collaborator saw.

use serde_json::json;

use smartfee_client::fee_service::{BUMP_ADDRESS_PATH, FEE_PATH, RETURN_ADDRESS_PATH};
use smartfee_core::{AddressType, Recipient, SmartFeeError};
use smartfee_planner::{RoundingPolicy, SmartFeeOptions, generate_send_params};
use smartfee_tests::helpers::*;

#[tokio::test]
async fn single_change_output_is_folded_into_bump_output() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));

    let params = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap();

    // 250 - 43 = 207 bytes at 4000 sats/kB = 828 sats; 1,000,000 - 900,000 - 828.
    let mut expected = batch();
    expected.push(Recipient::new(BUMP_ADDRESS, 99_172));
    assert_eq!(params.recipients, expected);
    assert_eq!(params.fee_rate, Some(4000));
    assert_eq!(params.unspents, Some(vec!["u1".to_string()]));
    assert_eq!(params.min_confirms, 1);
    assert!(params.enforce_min_confirms_for_change);
    assert!(params.no_split_change);
    assert_eq!(params.address_type, AddressType::P2wsh);

    // Outputs plus fee spend the pinned input exactly.
    let outputs: u64 = params
        .recipients
        .iter()
        .map(|r| r.amount_sats().unwrap())
        .sum();
    assert_eq!(outputs + 828, 1_000_000);
}

#[tokio::test]
async fn collaborators_are_called_in_order_once_each() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));

    generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap();

    assert_eq!(
        service.calls(),
        vec![RETURN_ADDRESS_PATH, BUMP_ADDRESS_PATH, FEE_PATH]
    );
    assert_eq!(service.return_addresses(), vec![RETURN_ADDRESS]);

    let requests = wallet.address_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].chain, 20);
    assert_eq!(requests[0].label, None);

    // One trial build, never a second prebuild.
    let prebuilds = wallet.prebuilds();
    assert_eq!(prebuilds.len(), 1);
    let trial_params = &prebuilds[0];
    assert_eq!(
        trial_params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 900_000))
    );
    assert_eq!(trial_params.fee_rate, Some(4000));
    assert_eq!(trial_params.unspents, None);
}

#[tokio::test]
async fn no_change_keeps_trial_params_with_inputs_pinned() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(900, 210, &[1_000_000, 900_000], 0));

    let params = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap();

    let mut expected = batch();
    expected.push(Recipient::new(BUMP_ADDRESS, 900_000));
    assert_eq!(params.recipients, expected);
    assert_eq!(params.fee_rate, Some(4000));
    assert_eq!(
        params.unspents,
        Some(vec!["u1".to_string(), "u2".to_string()])
    );
}

#[tokio::test]
async fn split_change_is_accepted_and_target_forwarded() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1500, 320, &[3_000_000], 3));
    let opts = SmartFeeOptions {
        target_wallet_unspents: Some(5),
        return_address_label: Some("smartfee return".into()),
        ..options()
    };

    let params = generate_send_params(&wallet, &batch(), &opts, &service.env)
        .await
        .unwrap();

    assert_eq!(params.target_wallet_unspents, Some(5));
    assert!(!params.no_split_change);
    assert_eq!(params.unspents, Some(vec!["u1".to_string()]));
    assert_eq!(
        params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 900_000))
    );
    assert_eq!(
        wallet.address_requests()[0].label.as_deref(),
        Some("smartfee return")
    );
    assert_eq!(wallet.prebuilds()[0].target_wallet_unspents, Some(5));
}

#[tokio::test]
async fn caller_recipients_are_untouched() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));
    let recipients = batch();
    let before = recipients.clone();

    let params = generate_send_params(&wallet, &recipients, &options(), &service.env)
        .await
        .unwrap();

    assert_eq!(recipients, before);
    assert_eq!(params.recipients.len(), recipients.len() + 1);
}

#[tokio::test]
async fn small_batch_bump_output_uses_floor() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(600, 150, &[100_000], 0));
    let recipients = vec![Recipient::new("tb1qcarol", 1_000)];

    let params = generate_send_params(&wallet, &recipients, &options(), &service.env)
        .await
        .unwrap();

    assert_eq!(
        params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 50_000))
    );
}

#[tokio::test]
async fn p2sh_uses_its_chain_and_change_size() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));
    let opts = SmartFeeOptions {
        address_type: AddressType::P2sh,
        ..options()
    };

    let params = generate_send_params(&wallet, &batch(), &opts, &service.env)
        .await
        .unwrap();

    assert_eq!(wallet.address_requests()[0].chain, 0);
    // 250 - 32 = 218 bytes, ceil(4000 * 218 / 1000) = 872.
    assert_eq!(
        params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 99_128))
    );
    assert_eq!(params.address_type, AddressType::P2sh);
}

#[tokio::test]
async fn nearest_rounding_is_selectable() {
    let service = FakeSmartFee::start().await;
    // 1001 sats over 250 bytes: 4004 sats/kB, 207 bytes -> 828.828.
    let wallet = ScriptedWallet::new(trial(1001, 250, &[1_000_000], 1));
    let opts = SmartFeeOptions {
        rounding: RoundingPolicy::Nearest,
        ..options()
    };

    let params = generate_send_params(&wallet, &batch(), &opts, &service.env)
        .await
        .unwrap();

    assert_eq!(params.fee_rate, Some(4004));
    assert_eq!(
        params.recipients.last(),
        Some(&Recipient::new(BUMP_ADDRESS, 99_171))
    );
}

#[tokio::test]
async fn zero_fee_quote_leaves_rate_unset() {
    let service = FakeSmartFee::start_with(FakeSmartFeeConfig {
        sats_per_kb: 0,
        ..FakeSmartFeeConfig::default()
    })
    .await;
    let wallet = ScriptedWallet::new(trial(900, 210, &[1_000_000, 900_000], 0));

    let params = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap();

    assert_eq!(wallet.prebuilds()[0].fee_rate, None);
    assert_eq!(params.fee_rate, None);
}

#[tokio::test]
async fn insufficient_inputs_fail_with_remainder() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[900_500], 1));

    let err = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SmartFeeError::InsufficientFunds {
            inputs: 900_500,
            recipients: 900_000,
            fee: 828,
        }
    );
    assert!(err.to_string().ends_with("= -328"));
}

#[tokio::test]
async fn fee_endpoint_rejection_carries_body() {
    let service = FakeSmartFee::start_with(FakeSmartFeeConfig {
        reject: Some((FEE_PATH, 503, json!({"error": "fee estimator unavailable"}))),
        ..FakeSmartFeeConfig::default()
    })
    .await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));

    let err = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SmartFeeError::RemoteRejection {
            endpoint: FEE_PATH.to_string(),
            status: 503,
            body: json!({"error": "fee estimator unavailable"}),
        }
    );
    assert!(wallet.prebuilds().is_empty());
}

#[tokio::test]
async fn wrong_api_key_stops_at_return_address() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));

    let err = generate_send_params(
        &wallet,
        &batch(),
        &SmartFeeOptions::with_api_key("not-the-key"),
        &service.env,
    )
    .await
    .unwrap_err();

    match err {
        SmartFeeError::RemoteRejection {
            endpoint, status, ..
        } => {
            assert_eq!(endpoint, RETURN_ADDRESS_PATH);
            assert_eq!(status, 401);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(service.calls(), vec![RETURN_ADDRESS_PATH]);
    assert!(service.return_addresses().is_empty());
}

#[tokio::test]
async fn missing_api_key_makes_no_calls() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));

    let err = generate_send_params(
        &wallet,
        &batch(),
        &SmartFeeOptions::default(),
        &service.env,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SmartFeeError::Configuration(_)));
    assert!(service.calls().is_empty());
    assert!(wallet.address_requests().is_empty());
    assert!(wallet.prebuilds().is_empty());
}

#[tokio::test]
async fn invalid_amount_makes_no_calls() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::new(trial(1000, 250, &[1_000_000], 1));
    let recipients = vec![Recipient {
        address: "tb1qalice".into(),
        amount: "12.5".into(),
    }];

    let err = generate_send_params(&wallet, &recipients, &options(), &service.env)
        .await
        .unwrap_err();

    assert!(matches!(err, SmartFeeError::InvalidRecipient(_)));
    assert!(service.calls().is_empty());
    assert!(wallet.address_requests().is_empty());
}

#[tokio::test]
async fn wallet_build_failure_propagates() {
    let service = FakeSmartFee::start().await;
    let wallet = ScriptedWallet::failing(SmartFeeError::BuildFailure(
        "insufficient balance".into(),
    ));

    let err = generate_send_params(&wallet, &batch(), &options(), &service.env)
        .await
        .unwrap_err();

    assert_eq!(err, SmartFeeError::BuildFailure("insufficient balance".into()));
    // The return address registration already happened and is not undone.
    assert_eq!(service.return_addresses(), vec![RETURN_ADDRESS]);
}
