use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::{
    config::PublicBucketConfig,
    credential::Credential,
    feedback::{Feedback, Notification},
    storage::Connect,
    store::{AdminStore, StoreHandle},
    utils::error::StoreError,
    AppError,
};

/// Secure storage key under which the admin token survives restarts.
pub const ADMIN_TOKEN_KEY: &str = "admin_token";

/// The host platform's secure key/value storage.
///
/// Failures are returned to the caller as-is; the session decides what they mean.
#[allow(async_fn_in_trait)]
pub trait SecureStorage {
    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError>;

    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn remove_item(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
struct Items {
    values: HashMap<String, String>,
    unavailable: bool,
}

/// Secure storage kept in memory, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemorySecureStorage {
    items: Arc<Mutex<Items>>,
}

impl MemorySecureStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects every call, like a platform without secure storage support.
    pub fn unavailable() -> Self {
        let storage = Self::default();
        storage.set_available(false);
        storage
    }

    pub fn set_available(&self, available: bool) {
        self.items().unavailable = !available;
    }

    fn items(&self) -> MutexGuard<'_, Items> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn available_items(&self) -> Result<MutexGuard<'_, Items>, AppError> {
        let items = self.items();
        if items.unavailable {
            return Err(anyhow!("SecureStorage not available"));
        }
        Ok(items)
    }
}

impl SecureStorage for MemorySecureStorage {
    async fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.available_items()?
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.available_items()?.values.get(key).cloned())
    }

    async fn remove_item(&self, key: &str) -> Result<(), AppError> {
        self.available_items()?.values.remove(key);
        Ok(())
    }
}

/// Who the current user is, as far as the store is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Guest,
    Admin(Credential),
}

/// Why a login attempt was turned down.
#[derive(Debug)]
pub enum LoginError {
    /// Nothing was entered.
    EmptyToken,
    /// The token is malformed or the backend refused it.
    InvalidToken,
    /// The token is valid but could not be kept in secure storage.
    Storage(AppError),
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::EmptyToken => write!(f, "Please enter a token."),
            LoginError::InvalidToken => write!(f, "Invalid token. Check the credentials."),
            LoginError::Storage(e) => write!(f, "Could not save the token: {}", e),
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoginError::Storage(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Parses and checks a token against its bucket, returning the credential if it works.
async fn check_token<C: Connect>(token: &str, connector: &C) -> Option<Credential> {
    let credential = match token.parse::<Credential>() {
        Ok(credential) => credential,
        Err(e) => {
            warn!("Token validation failed: {}", e);
            return None;
        }
    };

    let store = match AdminStore::connect(connector, &credential) {
        Ok(store) => store,
        Err(e) => {
            warn!("Token validation failed: {}", e);
            return None;
        }
    };

    store.validate().await.then_some(credential)
}

/// Whether `token` grants access to its bucket. Never fails: every problem is `false`.
pub async fn validate_token<C: Connect>(token: &str, connector: &C) -> bool {
    check_token(token, connector).await.is_some()
}

/// The admin login state, backed by secure storage.
#[derive(Debug)]
pub struct Session<K, F> {
    storage: K,
    feedback: F,
    auth: AuthState,
}

impl<K, F> Session<K, F>
where
    K: SecureStorage,
    F: Feedback,
{
    /// A guest session. Call `restore` to pick up a token saved by an earlier run.
    pub fn new(storage: K, feedback: F) -> Self {
        Self {
            storage,
            feedback,
            auth: AuthState::Guest,
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.auth, AuthState::Admin(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match &self.auth {
            AuthState::Admin(credential) => Some(credential),
            AuthState::Guest => None,
        }
    }

    /// Restores the admin state from a previously saved token.
    ///
    /// The saved token is trusted as is. A missing, unreadable or malformed token leaves the
    /// session as a guest.
    pub async fn restore(&mut self) -> &AuthState {
        match self.storage.get_item(ADMIN_TOKEN_KEY).await {
            Ok(Some(token)) if !token.is_empty() => match token.parse::<Credential>() {
                Ok(credential) => {
                    info!(bucket = %credential.bucket, "Restored admin session");
                    self.auth = AuthState::Admin(credential);
                }
                Err(e) => warn!("Ignoring saved admin token: {}", e),
            },
            Ok(_) => debug!("No admin token saved"),
            Err(e) => debug!("Could not read the admin token: {}", e),
        }

        &self.auth
    }

    /// Validates `token` against its bucket and, if it works, saves it and becomes admin.
    pub async fn login<C: Connect>(&mut self, token: &str, connector: &C) -> Result<(), LoginError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(LoginError::EmptyToken);
        }

        let Some(credential) = check_token(token, connector).await else {
            self.feedback.notify(Notification::Error);
            return Err(LoginError::InvalidToken);
        };

        if let Err(e) = self.storage.set_item(ADMIN_TOKEN_KEY, token).await {
            error!("Login error: {}", e);
            self.feedback.notify(Notification::Error);
            return Err(LoginError::Storage(e));
        }

        info!(bucket = %credential.bucket, "Admin logged in");
        self.auth = AuthState::Admin(credential);
        self.feedback.notify(Notification::Success);

        Ok(())
    }

    /// Forgets the saved token. On failure the session stays as it was.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        if let Err(e) = self.storage.remove_item(ADMIN_TOKEN_KEY).await {
            error!("Logout error: {}", e);
            return Err(e);
        }

        info!("Admin logged out");
        self.auth = AuthState::Guest;
        self.feedback.notify(Notification::Success);

        Ok(())
    }

    /// A fresh store handle matching the current login state.
    pub fn handle<C: Connect>(
        &self,
        connector: &C,
        config: &PublicBucketConfig,
    ) -> Result<StoreHandle<C::Storage>, StoreError> {
        StoreHandle::open(connector, config, self.credential())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::NoopFeedback;

    #[tokio::test]
    async fn restore_picks_up_a_saved_token() {
        let storage = MemorySecureStorage::new();
        storage
            .set_item(ADMIN_TOKEN_KEY, "AKID:secret:host:eu:cups")
            .await
            .unwrap();

        let mut session = Session::new(storage, NoopFeedback);
        session.restore().await;
        assert!(session.is_admin());
        assert_eq!(session.credential().unwrap().bucket, "cups");
    }

    #[tokio::test]
    async fn restore_stays_guest_without_a_usable_token() {
        let mut session = Session::new(MemorySecureStorage::new(), NoopFeedback);
        assert_eq!(session.restore().await, &AuthState::Guest);

        let storage = MemorySecureStorage::new();
        storage.set_item(ADMIN_TOKEN_KEY, "garbage").await.unwrap();
        let mut session = Session::new(storage, NoopFeedback);
        assert_eq!(session.restore().await, &AuthState::Guest);

        let mut session = Session::new(MemorySecureStorage::unavailable(), NoopFeedback);
        assert_eq!(session.restore().await, &AuthState::Guest);
    }

    #[test]
    fn storage_errors_are_exposed_as_sources() {
        let err = LoginError::Storage(anyhow!("SecureStorage not available"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&LoginError::InvalidToken).is_none());
    }
}
