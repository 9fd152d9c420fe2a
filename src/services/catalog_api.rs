//! Trait and types for reading the diploma catalog.

use crate::diploma::DiplomaRecord;
use anyhow::Result;

/// Catalog-wide counters published by the catalog service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CatalogTotals {
    pub diplomas: u64,
    pub schools: u64,
    pub cities: u64,
}

/// Abstraction over anything that can hand out diploma records
/// (the catalog service, a local export, a test fixture).
#[async_trait::async_trait]
pub trait DiplomaSource: Send + Sync {
    /// Returns every diploma in the catalog.
    async fn list_diplomas(&self) -> Result<Vec<DiplomaRecord>>;
}

/// A fixed, in-memory set of records.
#[async_trait::async_trait]
impl DiplomaSource for Vec<DiplomaRecord> {
    async fn list_diplomas(&self) -> Result<Vec<DiplomaRecord>> {
        Ok(self.clone())
    }
}
