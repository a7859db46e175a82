//! Infrastructure implementation of the `SecretSource` port.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;

use crate::application::ports::SecretSource;
use crate::domain::CredentialError;

/// Reads the credential store from disk, the process environment, and the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSecretSource;

impl SecretSource for SystemSecretSource {
    fn read_store(&self, path: &Path) -> Result<Option<String>, CredentialError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::Store {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_interactive(&self) -> bool {
        std::io::stdin().is_terminal() && console::Term::stderr().is_term()
    }

    fn prompt(&self, message: &str) -> Result<Option<String>> {
        let value = dialoguer::Password::new()
            .with_prompt(message)
            .allow_empty_password(true)
            .interact()?;
        Ok(Some(value).filter(|v| !v.is_empty()))
    }
}
