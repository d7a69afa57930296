//! Credential checks guarding the admin routes.
//!
//! Two strategies share the [`Authenticator`] port: attorneys logging in
//! against their stored bcrypt hash, and a single configured admin account
//! compared in constant time.

use std::fmt;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use subtle::ConstantTimeEq;

use crate::prospects::repository::{AttorneyDirectory, RepositoryError};

/// Username/password pair presented by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Parses an `Authorization: Basic <base64(user:pass)>` header.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?
            .to_str()
            .map_err(|_| AuthError::MalformedCredentials)?;

        let (scheme, encoded) = value
            .trim()
            .split_once(' ')
            .ok_or(AuthError::MalformedCredentials)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MalformedCredentials);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::MalformedCredentials)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedCredentials)?;

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Identity established by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Attorney { email: String },
    Admin { username: String },
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("malformed credentials")]
    MalformedCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("password check failed: {0}")]
    Hashing(String),
}

/// Checks attorney email/password against the stored salted bcrypt hash.
pub struct AttorneyPasswordAuthenticator<D> {
    directory: Arc<D>,
}

impl<D> AttorneyPasswordAuthenticator<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl<D> Authenticator for AttorneyPasswordAuthenticator<D>
where
    D: AttorneyDirectory + 'static,
{
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let email = credentials.username.trim().to_lowercase();
        let attorney = self.directory.find_by_email(&email).await?;

        let password = credentials.password.clone();
        let hash = attorney
            .as_ref()
            .map(|attorney| attorney.password_hash.clone());
        // Unknown emails still pay for one bcrypt verification.
        let verified = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => bcrypt::verify(password, &hash).unwrap_or(false),
            None => {
                let _ = bcrypt::verify(password, unknown_account_hash());
                false
            }
        })
        .await
        .map_err(|err| AuthError::Hashing(err.to_string()))?;

        match attorney {
            Some(attorney) if verified => Ok(Principal::Attorney {
                email: attorney.email,
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

fn unknown_account_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| {
        bcrypt::hash("unknown-account", bcrypt::DEFAULT_COST).unwrap_or_default()
    })
}

/// Fixed admin account compared without early exit on mismatch.
pub struct AdminCredentialAuthenticator {
    username: String,
    password: String,
}

impl AdminCredentialAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl Authenticator for AdminCredentialAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let username_ok = credentials
            .username
            .as_bytes()
            .ct_eq(self.username.as_bytes());
        let password_ok = credentials
            .password
            .as_bytes()
            .ct_eq(self.password.as_bytes());

        if bool::from(username_ok & password_ok) {
            Ok(Principal::Admin {
                username: self.username.clone(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Hashes a password with a fresh salt at the default bcrypt cost.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|err| AuthError::Hashing(err.to_string()))?
        .map_err(|err| AuthError::Hashing(err.to_string()))
}
