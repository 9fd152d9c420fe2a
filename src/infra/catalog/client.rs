use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::diploma::DiplomaRecord;
use crate::fetch::auth::{Authenticated, Session};
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::parse_records;
use crate::services::catalog_api::{CatalogTotals, DiplomaSource};

/// Reads diplomas from the admin catalog service over HTTP.
pub struct CatalogClient {
    base_url: String,
    http: Box<dyn HttpClient>,
}

impl CatalogClient {
    /// Creates a client for `base_url`, authenticating with `session` when
    /// one is given.
    pub fn new(base_url: &str, http: BasicClient, session: Option<Session>) -> Self {
        let http: Box<dyn HttpClient> = match session {
            Some(session) => Box::new(Authenticated::new(http, session)),
            None => Box::new(http),
        };

        Self::with_http(base_url, http)
    }

    /// Creates a client over an arbitrary [`HttpClient`] stack.
    pub fn with_http(base_url: &str, http: Box<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Reads the catalog-wide diploma, school and city counters.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn catalog_totals(&self) -> Result<CatalogTotals> {
        let diplomas = self.counter("total-diplomas").await?;
        let schools = self.counter("total-schools").await?;
        let cities = self.counter("total-cities").await?;

        Ok(CatalogTotals {
            diplomas,
            schools,
            cities,
        })
    }

    async fn counter(&self, name: &str) -> Result<u64> {
        let url = self.url(&format!("/api/diplomas/statistics/{name}"));
        let bytes = fetch_bytes(self.http.as_ref(), &url).await?;

        let value: u64 = serde_json::from_slice(&bytes)
            .with_context(|| format!("Counter '{name}' is not a number"))?;
        debug!(counter = name, value, "Catalog counter fetched");
        Ok(value)
    }
}

#[async_trait]
impl DiplomaSource for CatalogClient {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_diplomas(&self) -> Result<Vec<DiplomaRecord>> {
        let url = self.url("/api/diplomas/diplomas");
        let bytes = fetch_bytes(self.http.as_ref(), &url)
            .await
            .context("Failed to fetch diploma catalog")?;

        let records = parse_records(&bytes)?;
        info!(count = records.len(), "Diploma catalog fetched");
        Ok(records)
    }
}
