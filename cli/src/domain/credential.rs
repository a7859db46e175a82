//! Login credential and the `KEY=VALUE` store format it may come from.

use std::fmt;

use zeroize::Zeroizing;

/// Opaque login secret. Redacted in `Debug`, wiped from memory on drop.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    /// The secret itself. Callers must not log it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Which source yielded the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Store,
    Environment,
    Prompt,
}

/// Look up `key` in newline-delimited `KEY=VALUE` text.
///
/// Blank lines and lines starting with `#` are skipped. The value is trimmed
/// and one layer of surrounding single or double quotes is removed. The last
/// occurrence of the key wins. Empty values count as absent.
#[must_use]
pub fn parse_store(contents: &str, key: &str) -> Option<String> {
    let mut found = None;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let k = k.trim();
        let k = k.strip_prefix("export ").map_or(k, str::trim);
        if k != key {
            continue;
        }
        found = Some(unquote(v.trim()).to_string());
    }
    found.filter(|v| !v.is_empty())
}

fn unquote(value: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}
