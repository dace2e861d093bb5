//! Proxy credentials.
//!
//! Credentials are resolved once per run, in order of precedence:
//! values supplied by the caller, the saved keychain entry, and finally an
//! interactive prompt. When saving is enabled, a resolved pair that differs
//! from the saved one replaces it.

mod keychain;
mod prompt;

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::error_handling::CredentialError;

pub use keychain::KeyringCredentialStore;
pub use prompt::TerminalPrompter;

/// A proxy user name and password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Creates a user name and password pair.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What a credential store holds for a service. Any part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    /// Saved user name
    pub user: Option<String>,
    /// Saved password
    pub password: Option<String>,
    /// Proxy host the entry was saved for
    pub host: Option<String>,
    /// Proxy port the entry was saved for
    pub port: Option<String>,
}

/// Persistent storage for credentials, keyed by service identifier.
pub trait CredentialStore: Send + Sync {
    /// Returns the saved entry for `service`, if there is one.
    fn get(&self, service: &str) -> Result<Option<StoredCredentials>, CredentialError>;

    /// Saves `credentials` for `service`, replacing any previous entry.
    fn save(&self, service: &str, credentials: &Credentials) -> Result<(), CredentialError>;
}

/// Asks the user for a value.
pub trait Prompter: Send + Sync {
    /// Shows `prompt` and returns the answer. `secret` marks passwords.
    fn ask(&self, prompt: &str, secret: bool) -> Result<String, CredentialError>;
}

/// A store that never has anything and saves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCredentialStore;

impl CredentialStore for NoCredentialStore {
    fn get(&self, _service: &str) -> Result<Option<StoredCredentials>, CredentialError> {
        Ok(None)
    }

    fn save(&self, _service: &str, _credentials: &Credentials) -> Result<(), CredentialError> {
        Ok(())
    }
}

/// Resolves credentials from supplied values, a store, and a prompter.
#[derive(Clone)]
pub struct CredentialResolver {
    service: String,
    display_name: String,
    supplied_user: Option<String>,
    supplied_password: Option<String>,
    store: Arc<dyn CredentialStore>,
    prompter: Arc<dyn Prompter>,
    persist: bool,
    reset: bool,
}

impl CredentialResolver {
    /// Creates a resolver for `service`. `display_name` labels the prompts.
    pub fn new(
        service: impl Into<String>,
        display_name: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        prompter: Arc<dyn Prompter>,
    ) -> Self {
        Self {
            service: service.into(),
            display_name: display_name.into(),
            supplied_user: None,
            supplied_password: None,
            store,
            prompter,
            persist: false,
            reset: false,
        }
    }

    /// Values given by the caller; they take precedence over anything saved.
    pub fn with_supplied(mut self, user: Option<String>, password: Option<String>) -> Self {
        self.supplied_user = user.filter(|u| !u.is_empty());
        self.supplied_password = password.filter(|p| !p.is_empty());
        self
    }

    /// Save resolved credentials when they differ from the stored ones.
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Ignore the stored entry and prompt for anything not supplied.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    fn stored(&self) -> StoredCredentials {
        match self.store.get(&self.service) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read saved credentials for {}: {}", self.service, e);
                StoredCredentials::default()
            }
        }
    }

    /// Resolves the user name and password.
    ///
    /// # Errors
    ///
    /// Returns a [`CredentialError`] if prompting fails or the user gives an
    /// empty value. Store failures are logged and treated as "nothing saved".
    pub fn resolve(&self) -> Result<Credentials, CredentialError> {
        let needs_lookup = self.supplied_user.is_none() || self.supplied_password.is_none();
        let saved = if needs_lookup && !self.reset {
            self.stored()
        } else {
            StoredCredentials::default()
        };

        let user = match self.supplied_user.clone().or(saved.user) {
            Some(user) if !user.is_empty() => user,
            _ => self
                .prompter
                .ask(&format!("{} user name: ", self.display_name), false)?,
        };
        if user.is_empty() {
            return Err(CredentialError::Missing("user name"));
        }

        let password = match self.supplied_password.clone().or(saved.password) {
            Some(password) if !password.is_empty() => password,
            _ => self
                .prompter
                .ask(&format!("{} password: ", self.display_name), true)?,
        };
        if password.is_empty() {
            return Err(CredentialError::Missing("password"));
        }

        let credentials = Credentials { user, password };
        if self.persist {
            self.save_if_changed(&credentials);
        }
        Ok(credentials)
    }

    fn save_if_changed(&self, credentials: &Credentials) {
        let current = self.stored();
        if current.user.as_deref() == Some(credentials.user.as_str())
            && current.password.as_deref() == Some(credentials.password.as_str())
        {
            return;
        }
        match self.store.save(&self.service, credentials) {
            Ok(()) => debug!("Saved credentials for {}", self.service),
            Err(e) => warn!("Could not save credentials for {}: {}", self.service, e),
        }
    }
}
