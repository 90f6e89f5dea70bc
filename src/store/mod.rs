//! Document store client.
//!
//! A single operation is consumed: upserting a record into a collection
//! under a caller-chosen key. Records are JSON field maps; fields whose
//! value is the [`server_timestamp`] sentinel are assigned by the store at
//! write time, so clocks never come from this process.

use crate::{
    api::{endpoint_url, http_client, sanitize_body},
    cli::globals::GlobalArgs,
};
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, info_span, Instrument};

/// Sentinel the store resolves to its own write timestamp.
#[must_use]
pub fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

pub struct DocumentStore {
    http: Client,
    store_url: String,
    project_id: String,
}

impl DocumentStore {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            store_url: globals.store_url.clone(),
            project_id: globals.project_id.clone(),
        })
    }

    /// Upsert `fields` under `{collection}/{key}`, authenticated with the
    /// caller's identity token.
    /// # Errors
    /// Returns an error if the request fails or the store answers with a
    /// non-success status; the record is not retried.
    pub async fn upsert_record(
        &self,
        collection: &str,
        key: &str,
        fields: Value,
        token: &SecretString,
    ) -> Result<()> {
        let path = format!(
            "/v1/projects/{}/documents/{collection}/{key}",
            self.project_id
        );
        let url = endpoint_url(&self.store_url, &path)?;

        let span = info_span!(
            "store.upsert",
            http.method = "PUT",
            url = %url
        );
        let response = self
            .http
            .put(&url)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "fields": fields }))
            .send()
            .instrument(span)
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            return Err(anyhow!("{} - {}, {}", url, status, sanitize_body(&body)));
        }

        debug!("upserted {collection}/{key}");

        Ok(())
    }
}
