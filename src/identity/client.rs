//! REST client for the identity provider.
//!
//! The provider exposes an accounts surface (`/v1/accounts:signUp`,
//! `:signInWithPassword`, `:delete`) and a token exchange endpoint
//! (`/v1/token`, refresh-token grant). The API key rides as a query
//! parameter and never appears in spans or logs.
//!
//! A signed-in session lives in memory (principal, id token, refresh
//! token, expiry) and is mirrored to a session file so a later process
//! can restore it without re-entering credentials. Only the long-lived
//! refresh token is persisted; id tokens stay in memory.

use crate::{
    api::{endpoint_url, http_client},
    cli::globals::GlobalArgs,
    identity::{AuthState, IdentityProvider, Principal},
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{
    fs, io,
    path::PathBuf,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};
use tokio::sync::watch;
use tracing::{debug, info_span, warn, Instrument};

/// Leeway subtracted from a token's lifetime before a refresh is forced.
const TOKEN_EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Provider default when a response omits the token lifetime.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

#[derive(Clone)]
struct AuthSession {
    principal: Principal,
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
}

/// On-disk session, enough to resume without credentials.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    uid: String,
    email: String,
    refresh_token: String,
}

pub struct RestIdentity {
    http: reqwest::Client,
    identity_url: String,
    token_url: String,
    api_key: SecretString,
    session_file: PathBuf,
    session: RwLock<Option<AuthSession>>,
    state: watch::Sender<AuthState>,
}

impl RestIdentity {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let token_url = if globals.token_url.is_empty() {
            globals.identity_url.clone()
        } else {
            globals.token_url.clone()
        };

        let (state, _) = watch::channel(AuthState::Pending);

        Ok(Self {
            http: http_client()?,
            identity_url: globals.identity_url.clone(),
            token_url,
            api_key: globals.api_key.clone(),
            session_file: globals.session_file.clone(),
            session: RwLock::new(None),
            state,
        })
    }

    /// Create a principal from an email/password pair; the provider signs
    /// the new principal in as a side effect.
    /// # Errors
    /// Returns the provider error unmodified (duplicate email, weak
    /// password, network failure).
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<Principal> {
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "returnSecureToken": true
        });

        let json_response = self.post_account("signUp", &payload).await?;
        let session = session_from_account(&json_response, email)?;
        let principal = session.principal.clone();

        debug!("created principal {}", principal.uid);

        self.install_session(session);

        Ok(principal)
    }

    /// Sign an existing principal in with email and password.
    /// # Errors
    /// Returns the provider error unmodified (bad credentials, network
    /// failure).
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Principal> {
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "returnSecureToken": true
        });

        let json_response = self.post_account("signInWithPassword", &payload).await?;
        let session = session_from_account(&json_response, email)?;
        let principal = session.principal.clone();

        debug!("signed in principal {}", principal.uid);

        self.install_session(session);

        Ok(principal)
    }

    /// Restore a persisted session, if any, and publish the first
    /// auth-state value. A missing, unreadable or rejected session is
    /// treated as signed out, never as an error: the caller must always
    /// end up with a resolved auth state.
    pub async fn restore(&self) -> Result<Option<Principal>> {
        let persisted = match self.load_persisted() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => {
                debug!("no persisted session at {}", self.session_file.display());
                self.state.send_replace(AuthState::Resolved(None));
                return Ok(None);
            }
            Err(err) => {
                warn!("failed to read persisted session: {err}");
                self.state.send_replace(AuthState::Resolved(None));
                return Ok(None);
            }
        };

        let refresh_token = SecretString::from(persisted.refresh_token);
        match self
            .exchange_refresh_token(&refresh_token, persisted.email)
            .await
        {
            Ok((session, _)) => {
                let principal = session.principal.clone();
                self.install_session(session);
                Ok(Some(principal))
            }
            Err(err) => {
                warn!("session restore failed, treating as signed out: {err}");
                if let Err(err) = self.discard_persisted() {
                    warn!("{err}");
                }
                self.state.send_replace(AuthState::Resolved(None));
                Ok(None)
            }
        }
    }

    /// Exchange the current refresh token for a fresh id token and return
    /// the new lifetime in seconds.
    /// # Errors
    /// Returns an error if no principal is signed in or the exchange fails.
    pub async fn refresh_session(&self) -> Result<u64> {
        let (refresh_token, email) = {
            let slot = self.read_slot();
            let session = slot
                .as_ref()
                .ok_or_else(|| anyhow!("no principal is signed in"))?;
            (
                session.refresh_token.clone(),
                session.principal.email.clone(),
            )
        };

        let (session, lease_duration) = self.exchange_refresh_token(&refresh_token, email).await?;
        self.install_session(session);

        Ok(lease_duration)
    }

    async fn exchange_refresh_token(
        &self,
        refresh_token: &SecretString,
        email: String,
    ) -> Result<(AuthSession, u64)> {
        let url = endpoint_url(&self.token_url, "/v1/token")?;
        let keyed_url = format!("{url}?key={}", self.api_key.expose_secret());

        let payload = json!({
            "grant_type": "refresh_token",
            "refresh_token": refresh_token.expose_secret()
        });

        let span = info_span!(
            "identity.token",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&keyed_url)
            .json(&payload)
            .send()
            .instrument(span)
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await?;

            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                provider_error_message(&json_response)
            ));
        }

        let json_response: Value = response.json().await?;

        let uid = string_field(&json_response, "user_id")?;
        let id_token = string_field(&json_response, "id_token")?;
        let refresh_token = string_field(&json_response, "refresh_token")?;
        let lease_duration = ttl_secs(&json_response, "expires_in");

        let session = AuthSession {
            principal: Principal { uid, email },
            id_token: SecretString::from(id_token),
            refresh_token: SecretString::from(refresh_token),
            expires_at: Instant::now() + Duration::from_secs(lease_duration),
        };

        Ok((session, lease_duration))
    }

    async fn post_account(&self, op: &str, payload: &Value) -> Result<Value> {
        let url = endpoint_url(&self.identity_url, &format!("/v1/accounts:{op}"))?;
        let keyed_url = format!("{url}?key={}", self.api_key.expose_secret());

        let span = info_span!(
            "identity.account",
            http.method = "POST",
            url = %url
        );
        let response = self
            .http
            .post(&keyed_url)
            .json(payload)
            .send()
            .instrument(span)
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await?;

            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                provider_error_message(&json_response)
            ));
        }

        Ok(response.json().await?)
    }

    /// Swap the in-memory session, mirror it to disk and publish the new
    /// auth state.
    fn install_session(&self, session: AuthSession) {
        if let Err(err) = self.persist(&session) {
            warn!("failed to persist session: {err}");
        }

        let principal = session.principal.clone();
        *self.write_slot() = Some(session);
        self.state.send_replace(AuthState::Resolved(Some(principal)));
    }

    fn persist(&self, session: &AuthSession) -> Result<()> {
        let persisted = PersistedSession {
            uid: session.principal.uid.clone(),
            email: session.principal.email.clone(),
            refresh_token: session.refresh_token.expose_secret().to_string(),
        };

        let data = serde_json::to_string(&persisted)?;
        fs::write(&self.session_file, data)
            .with_context(|| format!("failed to write {}", self.session_file.display()))?;

        Ok(())
    }

    fn load_persisted(&self) -> Result<Option<PersistedSession>> {
        let data = match fs::read_to_string(&self.session_file) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(anyhow!(
                    "failed to read {}: {err}",
                    self.session_file.display()
                ))
            }
        };

        Ok(Some(serde_json::from_str(&data)?))
    }

    fn discard_persisted(&self) -> Result<()> {
        match fs::remove_file(&self.session_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow!(
                "failed to remove session file {}: {err}",
                self.session_file.display()
            )),
        }
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Option<AuthSession>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Option<AuthSession>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentity {
    async fn create_principal(&self, email: &str, password: &SecretString) -> Result<Principal> {
        self.sign_up(email, password).await
    }

    fn current_principal(&self) -> Option<Principal> {
        self.read_slot()
            .as_ref()
            .map(|session| session.principal.clone())
    }

    fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    async fn identity_token(&self) -> Result<SecretString> {
        let cached = {
            let slot = self.read_slot();
            let session = slot
                .as_ref()
                .ok_or_else(|| anyhow!("no principal is signed in"))?;

            if is_fresh(session) {
                Some(session.id_token.clone())
            } else {
                None
            }
        };

        if let Some(token) = cached {
            return Ok(token);
        }

        self.refresh_session().await?;

        self.read_slot()
            .as_ref()
            .map(|session| session.id_token.clone())
            .ok_or_else(|| anyhow!("no principal is signed in"))
    }

    async fn sign_out(&self) -> Result<()> {
        *self.write_slot() = None;
        self.discard_persisted()?;
        self.state.send_replace(AuthState::Resolved(None));

        debug!("signed out");

        Ok(())
    }

    async fn remove_principal(&self) -> Result<()> {
        let token = self.identity_token().await?;

        let payload = json!({ "idToken": token.expose_secret() });
        self.post_account("delete", &payload).await?;

        *self.write_slot() = None;
        if let Err(err) = self.discard_persisted() {
            warn!("{err}");
        }
        self.state.send_replace(AuthState::Resolved(None));

        debug!("removed principal");

        Ok(())
    }
}

fn is_fresh(session: &AuthSession) -> bool {
    Instant::now() + TOKEN_EXPIRY_LEEWAY < session.expires_at
}

fn provider_error_message(json_response: &Value) -> &str {
    json_response
        .get("error")
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn string_field(json_response: &Value, key: &str) -> Result<String> {
    json_response
        .get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("Error parsing JSON response: no {key} found"))
}

/// The accounts surface reports lifetimes as string seconds; the token
/// grant reports them as either. Missing or malformed values fall back to
/// the provider default.
fn ttl_secs(json_response: &Value, key: &str) -> u64 {
    match json_response.get(key) {
        Some(Value::String(secs)) => secs.parse().unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        Some(value) => value.as_u64().unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        None => DEFAULT_TOKEN_TTL_SECS,
    }
}

fn session_from_account(json_response: &Value, email_fallback: &str) -> Result<AuthSession> {
    let uid = string_field(json_response, "localId")?;
    let email = string_field(json_response, "email")
        .unwrap_or_else(|_| email_fallback.to_string());
    let id_token = string_field(json_response, "idToken")?;
    let refresh_token = string_field(json_response, "refreshToken")?;
    let lease_duration = ttl_secs(json_response, "expiresIn");

    Ok(AuthSession {
        principal: Principal { uid, email },
        id_token: SecretString::from(id_token),
        refresh_token: SecretString::from(refresh_token),
        expires_at: Instant::now() + Duration::from_secs(lease_duration),
    })
}
