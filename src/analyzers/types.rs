//! Data types produced by the aggregation pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A ranked entry in a top-N list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Summary statistics over a set of diploma records.
///
/// Always built from scratch by [`compute_stats`](crate::analyzers::aggregate::compute_stats);
/// a filtered view is a new value, never an edit of an existing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: usize,
    pub by_ecole: BTreeMap<String, usize>,
    pub by_ville: BTreeMap<String, usize>,
    pub by_filiere: BTreeMap<String, usize>,
    pub by_mention_bac: BTreeMap<String, usize>,
    pub by_duree: BTreeMap<u32, usize>,
    pub top_careers: Vec<NamedCount>,
    pub top_employment_opportunities: Vec<NamedCount>,
    pub average_duration: f64,
}

/// Distinct values available for filtering, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub schools: Vec<String>,
    pub cities: Vec<String>,
    pub filieres: Vec<String>,
}

/// Result of one pipeline run: stats for the whole catalog and for the
/// filtered subset.
#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub overall: AggregateStats,
    pub filtered: AggregateStats,
    pub filter_active: bool,
}
