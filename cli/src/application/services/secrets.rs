//! Secret resolver: produces the one credential used for a whole run.
//!
//! Priority: the `KEY=VALUE` store, then the environment, then a masked
//! prompt when a terminal is attached.

use tracing::{debug, info};

use crate::application::ports::SecretSource;
use crate::domain::config::SecretsConfig;
use crate::domain::credential::parse_store;
use crate::domain::{Credential, CredentialError, CredentialSource};

/// Resolve the login credential for `target`.
///
/// # Errors
///
/// - `CredentialError::Store` if the store exists but cannot be read.
/// - `CredentialError::Unavailable` if no source yields a value.
pub fn resolve_credential(
    source: &impl SecretSource,
    config: &SecretsConfig,
    target: &str,
) -> Result<(Credential, CredentialSource), CredentialError> {
    let key = config.key.as_str();

    if let Some(contents) = source.read_store(&config.store)? {
        if let Some(value) = parse_store(&contents, key) {
            info!(store = %config.store.display(), "credential loaded from store");
            return Ok((Credential::new(value), CredentialSource::Store));
        }
        debug!(store = %config.store.display(), key, "store has no entry for key");
    }

    if let Some(value) = source.env_var(key).filter(|v| !v.is_empty()) {
        info!(key, "credential loaded from environment");
        return Ok((Credential::new(value), CredentialSource::Environment));
    }

    if source.is_interactive() {
        match source.prompt(&format!("Enter password for {target}")) {
            Ok(Some(value)) if !value.is_empty() => {
                return Ok((Credential::new(value), CredentialSource::Prompt));
            }
            Ok(_) => debug!("prompt returned an empty value"),
            Err(e) => debug!(error = %e, "credential prompt failed"),
        }
    }

    Err(CredentialError::Unavailable {
        key: key.to_string(),
        store: config.store.display().to_string(),
    })
}
