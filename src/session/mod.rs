//! Session store: process-wide reactive state for the current profile and
//! the backend user list.
//!
//! State lives on `tokio::sync::watch` channels so any consumer can read a
//! snapshot or subscribe to changes. Operations are one-shot units of work
//! with no cancellation and no in-flight deduplication; nothing orders
//! concurrent invocations, so a `fetch_all` racing other mutations may
//! observe either side of them. Failures are logged and surfaced to the
//! caller; the in-memory state keeps its previous value.

use crate::{api::ApiClient, identity::IdentityProvider};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

/// User list element as returned by the backend API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
}

pub struct SessionStore {
    api: ApiClient,
    identity: Arc<dyn IdentityProvider>,
    profile: watch::Sender<Option<UserRecord>>,
    users: watch::Sender<Vec<UserRecord>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: ApiClient, identity: Arc<dyn IdentityProvider>) -> Self {
        let (profile, _) = watch::channel(None);
        let (users, _) = watch::channel(Vec::new());

        Self {
            api,
            identity,
            profile,
            users,
        }
    }

    /// Subscribe to the current profile.
    #[must_use]
    pub fn profile(&self) -> watch::Receiver<Option<UserRecord>> {
        self.profile.subscribe()
    }

    /// Subscribe to the user list.
    #[must_use]
    pub fn users(&self) -> watch::Receiver<Vec<UserRecord>> {
        self.users.subscribe()
    }

    pub fn set_profile(&self, profile: Option<UserRecord>) {
        self.profile.send_replace(profile);
    }

    /// Fetch the user list and replace the in-memory list wholesale.
    /// # Errors
    /// Returns the backend error; the previous list is left unchanged.
    pub async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        let users = match self.api.get_json::<Vec<UserRecord>>("/api/getUsers").await {
            Ok(users) => users,
            Err(err) => {
                error!("Failed to fetch users: {err}");
                return Err(err);
            }
        };

        self.users.send_replace(users.clone());

        debug!("fetched {} users", users.len());

        Ok(users)
    }

    /// Delete a user by id, then refetch the list to resynchronize. No
    /// optimistic removal: the returned list is whatever the backend
    /// reported after the deletion.
    /// # Errors
    /// Returns the backend error from either call.
    pub async fn delete_user(&self, id: &str) -> Result<Vec<UserRecord>> {
        if let Err(err) = self.api.delete_json(&format!("/api/deleteUser/{id}")).await {
            error!("Failed to delete user {id}: {err}");
            return Err(err);
        }

        self.fetch_all().await
    }

    /// Sign out at the identity provider and clear local state.
    /// # Errors
    /// Returns the provider error; local state is only cleared after the
    /// provider confirmed the sign-out.
    pub async fn logout(&self) -> Result<()> {
        if let Err(err) = self.identity.sign_out().await {
            error!("Failed to sign out: {err}");
            return Err(err);
        }

        self.profile.send_replace(None);
        self.users.send_replace(Vec::new());

        Ok(())
    }
}
