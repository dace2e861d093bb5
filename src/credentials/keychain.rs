//! OS keychain credential store.
//!
//! Keychains hold one secret string per (service, account). The user name for
//! the proxy is not known before the entry is read, so every entry is stored
//! under the fixed account `credentials` and the value packs user, password,
//! host and port together, separated by a control character nobody types at
//! a prompt.

use log::debug;

use super::{CredentialStore, Credentials, StoredCredentials};
use crate::error_handling::CredentialError;

/// Account name under which the packed value is stored.
const ACCOUNT: &str = "credentials";

/// Separator between the packed fields (Ctrl-C).
const SEPARATOR: char = '\u{3}';

/// Credential store backed by the platform keychain.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    /// Creates the store.
    pub fn new() -> Self {
        Self
    }

    fn entry(service: &str) -> Result<keyring::Entry, CredentialError> {
        keyring::Entry::new(service, ACCOUNT).map_err(|e| CredentialError::Store(e.to_string()))
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, service: &str) -> Result<Option<StoredCredentials>, CredentialError> {
        match Self::entry(service)?.get_password() {
            Ok(value) => {
                debug!("Read saved credentials for {service}");
                Ok(Some(decode(&value)))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(CredentialError::Store(e.to_string())),
        }
    }

    fn save(&self, service: &str, credentials: &Credentials) -> Result<(), CredentialError> {
        let value = encode(&credentials.user, &credentials.password, "", "");
        Self::entry(service)?
            .set_password(&value)
            .map_err(|e| CredentialError::Store(e.to_string()))
    }
}

fn encode(user: &str, password: &str, host: &str, port: &str) -> String {
    [user, password, host, port].join(&SEPARATOR.to_string())
}

fn decode(value: &str) -> StoredCredentials {
    let mut parts = value
        .split(SEPARATOR)
        .map(|part| Some(part.to_string()).filter(|p| !p.is_empty()));
    StoredCredentials {
        user: parts.next().flatten(),
        password: parts.next().flatten(),
        host: parts.next().flatten(),
        port: parts.next().flatten(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode("u", "p", "h", "1"), "u\u{3}p\u{3}h\u{3}1");
    }

    #[test]
    fn test_decode_full_entry() {
        assert_eq!(
            decode("u\u{3}p\u{3}proxy.example.edu\u{3}443"),
            StoredCredentials {
                user: Some("u".to_string()),
                password: Some("p".to_string()),
                host: Some("proxy.example.edu".to_string()),
                port: Some("443".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_empty_and_short_entries() {
        let stored = decode("u\u{3}p\u{3}\u{3}");
        assert_eq!(stored.user.as_deref(), Some("u"));
        assert_eq!(stored.password.as_deref(), Some("p"));
        assert!(stored.host.is_none());
        assert!(stored.port.is_none());

        let stored = decode("only-user");
        assert_eq!(stored.user.as_deref(), Some("only-user"));
        assert!(stored.password.is_none());
    }
}
