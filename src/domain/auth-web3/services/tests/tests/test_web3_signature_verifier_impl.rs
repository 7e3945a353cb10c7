// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use chrono::Duration;
use lectern_auth_web3::testing::{SiweMessageBuilder, TEST_SIWE_DOMAIN, TestWallet};
use lectern_auth_web3::*;
use lectern_auth_web3_services::Web3SignatureVerifierImpl;
use pretty_assertions::assert_eq;
use time_source::{SystemTimeSource, SystemTimeSourceStub};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const NONCE: &str = "k8WzQ2mPr5TnVx3a";

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_valid_signature() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(1);

    let message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(harness.time_source.now())
        .build();
    let signature = wallet.sign_message(&message);

    let verified = harness.verifier.verify(&message, &signature).unwrap();

    assert_eq!(
        verified,
        VerifiedWeb3Message {
            wallet_address: wallet.address(),
            nonce: Web3AuthenticationNonce::try_new(NONCE).unwrap(),
            domain: TEST_SIWE_DOMAIN.to_string(),
            chain_id: 1,
        }
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_hand_written_message_without_statement() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(2);

    let address = EvmWalletAddressConvertor::checksummed_string(&wallet.address());

    // Without a statement the address is followed by two empty lines
    let message = indoc::formatdoc!(
        r#"
        localhost:4000 wants you to sign in with your Ethereum account:
        {address}


        URI: http://localhost:4000
        Version: 1
        Chain ID: 137
        Nonce: {NONCE}
        Issued At: 2024-05-01T10:00:00Z"#,
    );
    let signature = wallet.sign_message(&message);

    let verified = harness.verifier.verify(&message, &signature).unwrap();

    assert_eq!(verified.wallet_address, wallet.address());
    assert_eq!(verified.domain, "localhost:4000");
    assert_eq!(verified.chain_id, 137);

    let message_missing_empty_line = indoc::formatdoc!(
        r#"
        localhost:4000 wants you to sign in with your Ethereum account:
        {address}

        URI: http://localhost:4000
        Version: 1
        Chain ID: 137
        Nonce: {NONCE}
        Issued At: 2024-05-01T10:00:00Z"#,
    );
    assert!(matches!(
        harness
            .verifier
            .verify(&message_missing_empty_line, &signature),
        Err(Web3SignatureVerificationError::MalformedMessage(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_tampered_message_is_rejected() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(1);

    let issued_at = harness.time_source.now();
    let signed_message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(issued_at)
        .build();
    let signature = wallet.sign_message(&signed_message);

    let submitted_message = SiweMessageBuilder::new(wallet.address(), "AnotherNonce42")
        .issued_at(issued_at)
        .build();

    assert!(matches!(
        harness.verifier.verify(&submitted_message, &signature),
        Err(Web3SignatureVerificationError::SignatureMismatch)
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_any_altered_byte_is_rejected() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(3);

    let message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(harness.time_source.now())
        .build();
    let signature = wallet.sign_message(&message);
    assert!(harness.verifier.verify(&message, &signature).is_ok());

    let signature_bytes = hex::decode(signature.trim_start_matches("0x")).unwrap();
    assert_eq!(signature_bytes.len(), 65);

    for i in 0..signature_bytes.len() {
        let mut altered = signature_bytes.clone();
        altered[i] ^= 0x01;
        let altered = format!("0x{}", hex::encode(altered));

        assert!(
            harness.verifier.verify(&message, &altered).is_err(),
            "signature byte {i}"
        );
    }

    for i in 0..message.len() {
        let mut altered = message.clone().into_bytes();
        altered[i] ^= 0x01;
        let Ok(altered) = String::from_utf8(altered) else {
            continue;
        };

        assert!(
            harness.verifier.verify(&altered, &signature).is_err(),
            "message byte {i}"
        );
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_signature_of_another_wallet_is_rejected() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let victim = TestWallet::from_seed(1);
    let attacker = TestWallet::from_seed(2);

    let message = SiweMessageBuilder::new(victim.address(), NONCE)
        .issued_at(harness.time_source.now())
        .build();
    let signature = attacker.sign_message(&message);

    assert!(matches!(
        harness.verifier.verify(&message, &signature),
        Err(Web3SignatureVerificationError::SignatureMismatch)
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_malformed_message() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(1);

    let valid_message = SiweMessageBuilder::new(wallet.address(), NONCE).build();
    let signature = wallet.sign_message(&valid_message);

    assert!(matches!(
        harness.verifier.verify("please let me in", &signature),
        Err(Web3SignatureVerificationError::MalformedMessage(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_malformed_signature() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(1);

    let message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(harness.time_source.now())
        .build();
    let signature = wallet.sign_message(&message);

    for bad_signature in [
        signature.trim_start_matches("0x"),
        "0x1234",
        "0xnothex",
        "",
    ] {
        assert!(
            matches!(
                harness.verifier.verify(&message, bad_signature),
                Err(Web3SignatureVerificationError::MalformedSignature { .. })
            ),
            "{bad_signature}"
        );
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_validity_window() {
    let harness = VerifierHarness::new(Web3AuthConfig::default());
    let wallet = TestWallet::from_seed(1);
    let now = harness.time_source.now();

    let expired_message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(now - Duration::hours(2))
        .expiration_time(now - Duration::hours(1))
        .build();
    assert!(matches!(
        harness
            .verifier
            .verify(&expired_message, &wallet.sign_message(&expired_message)),
        Err(Web3SignatureVerificationError::ExpiredMessage)
    ));

    let premature_message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(now)
        .not_before(now + Duration::hours(1))
        .build();
    assert!(matches!(
        harness
            .verifier
            .verify(&premature_message, &wallet.sign_message(&premature_message)),
        Err(Web3SignatureVerificationError::NotYetValidMessage)
    ));

    let current_message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .issued_at(now)
        .expiration_time(now + Duration::minutes(5))
        .not_before(now - Duration::minutes(5))
        .build();
    assert!(
        harness
            .verifier
            .verify(&current_message, &wallet.sign_message(&current_message))
            .is_ok()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test]
fn test_domain_binding() {
    let harness = VerifierHarness::new(Web3AuthConfig {
        expected_domain: Some(TEST_SIWE_DOMAIN.to_string()),
        ..Default::default()
    });
    let wallet = TestWallet::from_seed(1);

    let phishing_message = SiweMessageBuilder::new(wallet.address(), NONCE)
        .domain("courses.example.evil")
        .issued_at(harness.time_source.now())
        .build();

    let res = harness
        .verifier
        .verify(&phishing_message, &wallet.sign_message(&phishing_message));
    assert!(
        matches!(
            &res,
            Err(Web3SignatureVerificationError::DomainMismatch { expected, actual })
                if expected == TEST_SIWE_DOMAIN && actual == "courses.example.evil"
        ),
        "{res:?}"
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Harness
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct VerifierHarness {
    verifier: Arc<dyn Web3SignatureVerifier>,
    time_source: SystemTimeSourceStub,
}

impl VerifierHarness {
    fn new(config: Web3AuthConfig) -> Self {
        let time_source = SystemTimeSourceStub::new();

        let catalog = {
            let mut b = dill::CatalogBuilder::new();

            b.add::<Web3SignatureVerifierImpl>()
                .add_value(config)
                .add_value(time_source.clone())
                .bind::<dyn SystemTimeSource, SystemTimeSourceStub>();

            b.build()
        };

        Self {
            verifier: catalog.get_one().unwrap(),
            time_source,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
