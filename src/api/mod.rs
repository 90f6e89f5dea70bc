//! Token-injecting HTTP client for the backend API.
//!
//! Every request made while a principal is signed in carries a fresh
//! identity token as a bearer credential; requests made while signed out
//! go out unauthenticated. If the token fetch fails the request is not
//! sent at all: no retry, no fallback to a stale token.

use crate::{cli::globals::GlobalArgs, identity::IdentityProvider};
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use url::Url;

/// Maximum number of error body characters surfaced to the caller.
const MAX_ERROR_CHARS: usize = 200;

pub(crate) fn http_client() -> Result<Client> {
    Ok(Client::builder().user_agent(crate::APP_USER_AGENT).build()?)
}

/// # Errors
/// Returns an error if `url` cannot be parsed, has no host, or uses an unsupported scheme.
pub fn endpoint_url(url: &str, path: &str) -> Result<String> {
    let url = Url::parse(url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {scheme}")),
        },
    };

    let endpoint_url = format!("{scheme}://{host}:{port}{path}");

    debug!("endpoint URL: {}", endpoint_url);

    Ok(endpoint_url)
}

/// Trims and truncates an error body for the returned error message.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "request failed".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    identity: Arc<dyn IdentityProvider>,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs, identity: Arc<dyn IdentityProvider>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            base_url: globals.api_url.clone(),
            identity,
        })
    }

    /// Bearer credential for the next request: a fresh identity token when
    /// a principal is signed in, nothing otherwise. A token fetch failure
    /// propagates and the request is not sent.
    async fn bearer(&self) -> Result<Option<SecretString>> {
        if self.identity.current_principal().is_none() {
            return Ok(None);
        }

        Ok(Some(self.identity.identity_token().await?))
    }

    /// GET `path` and decode the JSON response body.
    /// # Errors
    /// Returns an error if the token fetch, the request, or decoding fails,
    /// or the backend answers with a non-success status.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = endpoint_url(&self.base_url, path)?;
        let bearer = self.bearer().await?;

        let mut request = self.http.get(&url);
        if let Some(token) = &bearer {
            request = request.bearer_auth(token.expose_secret());
        }

        let span = info_span!(
            "api.get",
            http.method = "GET",
            url = %url
        );
        let response = request.send().instrument(span).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(anyhow!("{} - {}, {}", url, status, sanitize_body(&body)));
        }

        Ok(response.json::<T>().await?)
    }

    /// DELETE `path` and return the acknowledgment body, if any.
    /// # Errors
    /// Returns an error if the token fetch or the request fails, or the
    /// backend answers with a non-success status.
    pub async fn delete_json(&self, path: &str) -> Result<Value> {
        let url = endpoint_url(&self.base_url, path)?;
        let bearer = self.bearer().await?;

        let mut request = self.http.delete(&url);
        if let Some(token) = &bearer {
            request = request.bearer_auth(token.expose_secret());
        }

        let span = info_span!(
            "api.delete",
            http.method = "DELETE",
            url = %url
        );
        let response = request.send().instrument(span).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(anyhow!("{} - {}, {}", url, status, sanitize_body(&body)));
        }

        Ok(response.json::<Value>().await.unwrap_or(Value::Null))
    }
}
