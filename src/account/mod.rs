//! Registration flow.
//!
//! Two phases against two external collaborators: create a credentialed
//! principal at the identity provider, then write its profile record into
//! the document store under the new principal's id. If the second phase
//! fails the just-created principal is deleted so no orphaned credential
//! survives; the rollback is best effort and the store error is the one
//! surfaced.

use crate::{
    identity::{IdentityProvider, Principal},
    store::{server_timestamp, DocumentStore},
};
use anyhow::{anyhow, Result};
use regex::Regex;
use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, error};

/// Collection holding one profile record per principal.
pub const PROFILE_COLLECTION: &str = "users";

/// Provider minimum password length.
const MIN_PASSWORD_CHARS: usize = 6;

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

pub fn valid_password(password: &SecretString) -> bool {
    use secrecy::ExposeSecret;

    password.expose_secret().chars().count() >= MIN_PASSWORD_CHARS
}

/// Create a principal and write its profile record.
///
/// Returns the created [`Principal`]. Failures from either external call
/// are logged and re-raised unmodified; a store-write failure additionally
/// triggers the rollback described in the module docs.
///
/// # Errors
/// Returns an error on invalid input, principal creation failure, or
/// profile write failure.
pub async fn register_user(
    identity: &dyn IdentityProvider,
    store: &DocumentStore,
    email: &str,
    password: &SecretString,
    username: &str,
) -> Result<Principal> {
    if !valid_email(email) {
        return Err(anyhow!("invalid email address"));
    }

    if !valid_password(password) {
        return Err(anyhow!(
            "password must be at least {MIN_PASSWORD_CHARS} characters"
        ));
    }

    if username.trim().is_empty() {
        return Err(anyhow!("username must not be empty"));
    }

    let principal = match identity.create_principal(email, password).await {
        Ok(principal) => principal,
        Err(err) => {
            error!("Registration error: {err}");
            return Err(err);
        }
    };

    if let Err(err) = write_profile(identity, store, &principal, username).await {
        error!("Profile write failed for {}: {err}", principal.uid);

        if let Err(rollback_err) = identity.remove_principal().await {
            error!(
                "Rollback of principal {} failed: {rollback_err}",
                principal.uid
            );
        }

        return Err(err);
    }

    debug!("registered and saved profile for {}", principal.uid);

    Ok(principal)
}

async fn write_profile(
    identity: &dyn IdentityProvider,
    store: &DocumentStore,
    principal: &Principal,
    username: &str,
) -> Result<()> {
    let token = identity.identity_token().await?;

    let fields = json!({
        "username": username,
        "email": principal.email,
        "createdAt": server_timestamp(),
    });

    store
        .upsert_record(PROFILE_COLLECTION, &principal.uid, fields, &token)
        .await
}
