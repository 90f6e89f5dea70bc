//! External identity provider interface.
//!
//! The provider owns principals end to end: credential issuance, password
//! verification, token minting and session persistence all happen on its
//! side. This module only defines the capability surface the rest of the
//! crate consumes ([`IdentityProvider`]) and the REST client implementing
//! it ([`RestIdentity`]). Any provider implementing these operations is
//! substitutable.

pub mod client;
pub mod renew;

pub use client::RestIdentity;

use anyhow::Result;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Authenticated identity issued by the provider. Never constructed or
/// validated locally.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: String,
}

/// Value published on the provider's auth-state stream.
///
/// `Pending` is only ever observed before the first session restore
/// completes; every later value is `Resolved`.
#[derive(Clone, Debug, Default)]
pub enum AuthState {
    #[default]
    Pending,
    Resolved(Option<Principal>),
}

impl AuthState {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, AuthState::Resolved(_))
    }

    #[must_use]
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthState::Resolved(Some(principal)) => Some(principal),
            _ => None,
        }
    }
}

/// Capability interface over the external identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a credentialed principal from an email/password pair and
    /// sign it in.
    async fn create_principal(&self, email: &str, password: &SecretString) -> Result<Principal>;

    /// Currently signed-in principal, if any. Synchronous by contract:
    /// after the first auth-state resolution this must not suspend.
    fn current_principal(&self) -> Option<Principal>;

    /// Subscribe to the auth-state stream. The first `Resolved` value is
    /// published exactly once per process, after session restore.
    fn auth_state(&self) -> watch::Receiver<AuthState>;

    /// A currently valid identity token for the signed-in principal,
    /// cached until close to expiry and network-refreshed otherwise.
    async fn identity_token(&self) -> Result<SecretString>;

    /// Sign the current principal out and drop the persisted session.
    async fn sign_out(&self) -> Result<()>;

    /// Delete the signed-in principal from the provider. Used to roll
    /// back a registration whose profile write failed.
    async fn remove_principal(&self) -> Result<()>;
}
