use crate::analyzers::aggregate::compute_stats;
use crate::analyzers::filter::{RecordFilter, filter_records};
use crate::analyzers::types::Report;
use crate::diploma::DiplomaRecord;
use crate::services::catalog_api::DiplomaSource;
use anyhow::{Context, Result};
use tracing::info;

/// Pulls the catalog from `source` and builds a [`Report`] for `filter`.
pub async fn analyze<S>(source: &S, filter: &RecordFilter) -> Result<Report>
where
    S: DiplomaSource + ?Sized,
{
    let records = source
        .list_diplomas()
        .await
        .context("Failed to load diploma records")?;

    info!(records = records.len(), "Diploma records loaded");

    Ok(build_report(&records, filter))
}

/// Builds a [`Report`] from records already in memory.
///
/// Both aggregates are derived from scratch on every call.
pub fn build_report(records: &[DiplomaRecord], filter: &RecordFilter) -> Report {
    let overall = compute_stats(records);

    let filter_active = filter.is_active();
    let filtered = if filter_active {
        let subset = filter_records(records, filter);
        info!(
            matched = subset.len(),
            total = records.len(),
            "Filter applied"
        );
        compute_stats(&subset)
    } else {
        overall.clone()
    };

    Report {
        generated_at: chrono::Utc::now(),
        overall,
        filtered,
        filter_active,
    }
}
