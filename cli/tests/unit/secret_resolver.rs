//! Secret resolver: source priority and failure reporting.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use vpsctl::application::services::secrets::resolve_credential;
use vpsctl::domain::config::SecretsConfig;
use vpsctl::domain::{CredentialError, CredentialSource};

use crate::mocks::FakeSecrets;

const TARGET: &str = "root@203.0.113.10";

fn config() -> SecretsConfig {
    SecretsConfig::default()
}

fn env(value: &str) -> Vec<(String, String)> {
    vec![("VPS_PASSWORD".to_string(), value.to_string())]
}

#[test]
fn store_wins_over_environment() {
    let source = FakeSecrets {
        store: Some("VPS_PASSWORD='s3cret'\n".to_string()),
        env: env("from-env"),
        ..FakeSecrets::default()
    };

    let (credential, from) = resolve_credential(&source, &config(), TARGET).expect("resolve");

    assert_eq!(credential.expose(), "s3cret");
    assert_eq!(from, CredentialSource::Store);
    assert_eq!(*source.store_reads.borrow(), [PathBuf::from(".env")]);
}

#[test]
fn store_without_key_falls_back_to_environment() {
    let source = FakeSecrets {
        store: Some("OTHER=1\n".to_string()),
        env: env("from-env"),
        ..FakeSecrets::default()
    };

    let (credential, from) = resolve_credential(&source, &config(), TARGET).expect("resolve");

    assert_eq!(credential.expose(), "from-env");
    assert_eq!(from, CredentialSource::Environment);
}

#[test]
fn empty_environment_value_is_ignored() {
    let source = FakeSecrets {
        env: env(""),
        interactive: true,
        typed: Some("typed".to_string()),
        ..FakeSecrets::default()
    };

    let (credential, from) = resolve_credential(&source, &config(), TARGET).expect("resolve");

    assert_eq!(credential.expose(), "typed");
    assert_eq!(from, CredentialSource::Prompt);
}

#[test]
fn no_terminal_means_no_prompt() {
    let source = FakeSecrets {
        typed: Some("never asked".to_string()),
        ..FakeSecrets::default()
    };

    let err = resolve_credential(&source, &config(), TARGET).unwrap_err();

    assert!(matches!(err, CredentialError::Unavailable { ref key, .. } if key == "VPS_PASSWORD"));
    assert_eq!(*source.prompts.borrow(), 0);
}

#[test]
fn empty_prompt_answer_is_unavailable() {
    let source = FakeSecrets {
        interactive: true,
        typed: None,
        ..FakeSecrets::default()
    };

    let err = resolve_credential(&source, &config(), TARGET).unwrap_err();

    assert!(matches!(err, CredentialError::Unavailable { .. }));
    assert_eq!(*source.prompts.borrow(), 1);
}

#[test]
fn unreadable_store_is_an_error_not_a_fallback() {
    let source = FakeSecrets {
        store_error: true,
        env: env("from-env"),
        ..FakeSecrets::default()
    };

    let err = resolve_credential(&source, &config(), TARGET).unwrap_err();

    assert!(matches!(err, CredentialError::Store { .. }));
}

#[test]
fn custom_key_and_store_are_honoured() {
    let config = SecretsConfig {
        store: PathBuf::from("/etc/vpsctl/secrets"),
        key: "DEPLOY_PASS".to_string(),
    };
    let source = FakeSecrets {
        store: Some("export DEPLOY_PASS=\"quoted value\"\n".to_string()),
        ..FakeSecrets::default()
    };

    let (credential, _) = resolve_credential(&source, &config, TARGET).expect("resolve");

    assert_eq!(credential.expose(), "quoted value");
    assert_eq!(*source.store_reads.borrow(), [PathBuf::from("/etc/vpsctl/secrets")]);
}

#[test]
fn credential_debug_is_redacted() {
    let source = FakeSecrets {
        env: env("hunter2"),
        ..FakeSecrets::default()
    };

    let (credential, _) = resolve_credential(&source, &config(), TARGET).expect("resolve");

    assert!(!format!("{credential:?}").contains("hunter2"));
}
