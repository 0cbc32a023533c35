//! Admin sessions
//!
//! The session is an explicit value owned by [`SessionManager`]; whoever
//! needs to know who is signed in receives the manager. Credentials are
//! checked by an [`AuthProvider`], locally against Argon2 hashes stored in
//! `admin_users`.

use crate::store::{DataStore, Query, StoreError, Table, from_record, to_record};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::AdminUser;
use shared::AppError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Minimum password length accepted by `register`
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid registration: {0}")]
    Invalid(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Password hash error: {0}")]
    PasswordHash(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials => AppError::invalid_credentials(),
            SessionError::NotAuthenticated => AppError::not_authenticated(),
            SessionError::EmailTaken(email) => AppError::already_exists(email),
            SessionError::Invalid(msg) => AppError::validation(msg),
            SessionError::Store(e) => e.into(),
            SessionError::PasswordHash(msg) => AppError::internal(msg),
        }
    }
}

/// Signed-in admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
    /// RFC 3339
    pub signed_in_at: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError>;

    async fn sign_out(&self, session: &Session) -> Result<(), SessionError>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 PHC string for a password
pub fn hash_password(password: &str) -> Result<String, SessionError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SessionError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> Result<(), SessionError> {
    let parsed = PasswordHash::new(hash).map_err(|e| SessionError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| SessionError::InvalidCredentials)
}

/// Checks credentials against the `admin_users` table
pub struct LocalAuthProvider {
    store: Arc<dyn DataStore>,
}

impl LocalAuthProvider {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    async fn find_user(&self, email: &str) -> Result<Option<AdminUser>, SessionError> {
        let rows = self
            .store
            .select(&Query::table(Table::AdminUsers).eq("email", email).limit(1))
            .await?;
        rows.into_iter()
            .next()
            .map(from_record)
            .transpose()
            .map_err(SessionError::from)
    }

    /// Create an admin account
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AdminUser, SessionError> {
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(SessionError::Invalid(format!("invalid email: {email}")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SessionError::Invalid(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.find_user(&email).await?.is_some() {
            return Err(SessionError::EmailTaken(email));
        }

        let user = AdminUser {
            id: shared::util::new_id(),
            email,
            password_hash: hash_password(password)?,
            display_name: display_name.map(str::to_string),
        };
        match self.store.insert(Table::AdminUsers, to_record(&user)?).await {
            Ok(_) => {}
            Err(StoreError::Duplicate(_)) => return Err(SessionError::EmailTaken(user.email)),
            Err(e) => return Err(e.into()),
        }
        info!(user_id = %user.id, "Admin user registered");
        Ok(user)
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let email = normalize_email(email);
        let Some(user) = self.find_user(&email).await? else {
            warn!("Sign-in with unknown email");
            return Err(SessionError::InvalidCredentials);
        };
        verify_password(password, &user.password_hash)?;

        Ok(Session {
            user_id: user.id,
            email: user.email,
            display_name: user.display_name,
            signed_in_at: shared::util::now_rfc3339(),
        })
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), SessionError> {
        // nothing is held server-side for local sessions
        Ok(())
    }
}

/// Owns the current session
pub struct SessionManager {
    provider: Arc<dyn AuthProvider>,
    current: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: RwLock::new(None),
        }
    }

    /// Sign in, replacing any current session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let session = self.provider.sign_in(email, password).await?;
        info!(user_id = %session.user_id, "Admin signed in");
        *self.current.write() = Some(session.clone());
        Ok(session)
    }

    /// Sign out; a no-op without a session
    pub async fn logout(&self) -> Result<(), SessionError> {
        let Some(session) = self.current.write().take() else {
            return Ok(());
        };
        self.provider.sign_out(&session).await?;
        info!(user_id = %session.user_id, "Admin signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current session, or `NotAuthenticated`
    pub fn require(&self) -> Result<Session, SessionError> {
        self.current_session().ok_or(SessionError::NotAuthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn provider() -> Arc<LocalAuthProvider> {
        let provider = Arc::new(LocalAuthProvider::new(Arc::new(MemoryStore::new())));
        provider
            .register("Gerente@Restaurante.com ", "segredo123", Some("Gerente"))
            .await
            .unwrap();
        provider
    }

    #[tokio::test]
    async fn test_login_logout() {
        let manager = SessionManager::new(provider().await);
        assert!(!manager.is_authenticated());
        assert!(matches!(manager.require(), Err(SessionError::NotAuthenticated)));

        let session = manager
            .login("gerente@restaurante.com", "segredo123")
            .await
            .unwrap();
        assert_eq!(session.email, "gerente@restaurante.com");
        assert_eq!(session.display_name.as_deref(), Some("Gerente"));
        assert_eq!(manager.current_session(), Some(session));

        manager.logout().await.unwrap();
        assert!(manager.current_session().is_none());
        // second logout is harmless
        manager.logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email() {
        let manager = SessionManager::new(provider().await);
        let err = manager
            .login("gerente@restaurante.com", "errada")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));

        let err = manager.login("ninguem@x.com", "segredo123").await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidCredentials));
        assert!(!manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_session() {
        let manager = SessionManager::new(provider().await);
        manager
            .login("gerente@restaurante.com", "segredo123")
            .await
            .unwrap();
        assert!(manager.login("gerente@restaurante.com", "x").await.is_err());
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let provider = provider().await;
        let err = provider
            .register("gerente@restaurante.com", "outrasenha", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::EmailTaken(_)));

        assert!(matches!(
            provider.register("sem-arroba", "segredo123", None).await,
            Err(SessionError::Invalid(_))
        ));
        assert!(matches!(
            provider.register("a@b.com", "123", None).await,
            Err(SessionError::Invalid(_))
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("segredo123").unwrap();
        let b = hash_password("segredo123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("segredo123", &a).is_ok());
        assert!(verify_password("segredo124", &a).is_err());
    }
}
