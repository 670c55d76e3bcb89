//! Client for the hosted store's REST API.
//!
//! The store exposes each table under `/rest/v1/{table}` with a generic
//! query/insert/update/delete-by-match surface. This client is typed at the
//! call sites (rows are plain serde structs owned by the modules that use
//! them) and deliberately thin: every failure, network-level or HTTP-level,
//! surfaces as [`AppError::StoreUnavailable`].

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert("Authorization", value);
        }
        headers
    }

    /// List every row of a table with a server-side ordering, e.g.
    /// `"section.asc,key.asc"` or `"created_at.desc"`.
    pub async fn select<T: DeserializeOwned>(&self, table: &str, order: &str) -> AppResult<Vec<T>> {
        let response = self
            .http
            .get(self.table_url(table))
            .headers(self.auth_headers())
            .query(&[("select", "*"), ("order", order)])
            .send()
            .await?;

        let response = check_status(response, table).await?;
        let rows = response.json::<Vec<T>>().await?;
        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Insert a batch of rows in a single request.
    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> AppResult<()> {
        let response = self
            .http
            .post(self.table_url(table))
            .headers(self.auth_headers())
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;

        check_status(response, table).await?;
        Ok(())
    }

    /// Upsert a batch of rows in a single request (insert-or-merge on id).
    pub async fn upsert<T: Serialize>(&self, table: &str, rows: &[T]) -> AppResult<()> {
        let response = self
            .http
            .post(self.table_url(table))
            .headers(self.auth_headers())
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows)
            .send()
            .await?;

        check_status(response, table).await?;
        Ok(())
    }

    /// Patch the row matching an id with a partial body.
    pub async fn update(&self, table: &str, id: &str, patch: &serde_json::Value) -> AppResult<()> {
        let response = self
            .http
            .patch(self.table_url(table))
            .headers(self.auth_headers())
            .query(&[("id", format!("eq.{id}"))])
            .json(patch)
            .send()
            .await?;

        check_status(response, table).await?;
        Ok(())
    }

    /// Delete the row matching an id.
    pub async fn delete(&self, table: &str, id: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(self.table_url(table))
            .headers(self.auth_headers())
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;

        check_status(response, table).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response, table: &str) -> AppResult<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::StoreUnavailable(format!(
        "store API error on {table} ({status}): {body}"
    )))
}
