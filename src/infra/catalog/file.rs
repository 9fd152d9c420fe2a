use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::diploma::DiplomaRecord;
use crate::parser::{parse_bulk_csv, parse_records};
use crate::services::catalog_api::DiplomaSource;

/// Reads diplomas from a local `.json` export or `.csv` bulk-import file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }
}

#[async_trait]
impl DiplomaSource for FileSource {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn list_diplomas(&self) -> Result<Vec<DiplomaRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let records = if self.is_csv() {
            let text = String::from_utf8(bytes).context("CSV file is not valid UTF-8")?;
            parse_bulk_csv(&text)?
        } else {
            parse_records(&bytes)?
        };

        info!(count = records.len(), "Diploma records read from file");
        Ok(records)
    }
}
