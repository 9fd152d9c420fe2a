//! Record filtering, filter facets and pagination.
//!
//! Filtering and aggregation stay separate steps: a filtered view is
//! `compute_stats(&filter_records(records, &filter))`.

use crate::analyzers::types::Facets;
use crate::diploma::DiplomaRecord;
use std::collections::HashSet;

/// Default page size of the catalog listing.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A conjunction of optional field matchers.
///
/// Every matcher compares case-insensitively by substring. A matcher that is
/// `None`, empty or only whitespace does not constrain anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub ecole: Option<String>,
    pub ville: Option<String>,
    /// Matches when any of the record's filieres contains the value.
    pub filiere: Option<String>,
    pub mention_bac: Option<String>,
    /// Free-text search over diploma name, school and city.
    pub search: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ecole(mut self, value: impl Into<String>) -> Self {
        self.ecole = Some(value.into());
        self
    }

    pub fn ville(mut self, value: impl Into<String>) -> Self {
        self.ville = Some(value.into());
        self
    }

    pub fn filiere(mut self, value: impl Into<String>) -> Self {
        self.filiere = Some(value.into());
        self
    }

    pub fn mention_bac(mut self, value: impl Into<String>) -> Self {
        self.mention_bac = Some(value.into());
        self
    }

    pub fn search(mut self, value: impl Into<String>) -> Self {
        self.search = Some(value.into());
        self
    }

    /// Returns `true` if at least one matcher constrains the result.
    pub fn is_active(&self) -> bool {
        self.compile().is_active()
    }

    /// Returns `true` if `record` satisfies every active matcher.
    ///
    /// Normalizes the matcher values on every call; use [`filter_records`]
    /// to test many records.
    pub fn matches(&self, record: &DiplomaRecord) -> bool {
        self.compile().matches(record)
    }

    fn compile(&self) -> Needles {
        let [ecole, ville, filiere, mention_bac, search] = [
            &self.ecole,
            &self.ville,
            &self.filiere,
            &self.mention_bac,
            &self.search,
        ]
        .map(|value| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_lowercase)
        });

        Needles {
            ecole,
            ville,
            filiere,
            mention_bac,
            search,
        }
    }
}

/// Lowercased, trimmed matcher values; `None` for inactive matchers.
#[derive(Debug)]
struct Needles {
    ecole: Option<String>,
    ville: Option<String>,
    filiere: Option<String>,
    mention_bac: Option<String>,
    search: Option<String>,
}

impl Needles {
    fn is_active(&self) -> bool {
        self.ecole.is_some()
            || self.ville.is_some()
            || self.filiere.is_some()
            || self.mention_bac.is_some()
            || self.search.is_some()
    }

    fn matches(&self, record: &DiplomaRecord) -> bool {
        self.ecole
            .as_deref()
            .is_none_or(|n| contains(&record.ecole, n))
            && self.ville.as_deref().is_none_or(|n| contains(&record.ville, n))
            && self
                .filiere
                .as_deref()
                .is_none_or(|n| record.filiere.iter().any(|f| contains(f, n)))
            && self
                .mention_bac
                .as_deref()
                .is_none_or(|n| contains(&record.mention_bac, n))
            && self.search.as_deref().is_none_or(|n| {
                contains(&record.nom_diplome, n)
                    || contains(&record.ecole, n)
                    || contains(&record.ville, n)
            })
    }
}

fn contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Returns the records that satisfy `filter`, preserving input order.
///
/// With no active matcher every record is returned.
pub fn filter_records(records: &[DiplomaRecord], filter: &RecordFilter) -> Vec<DiplomaRecord> {
    let needles = filter.compile();
    if !needles.is_active() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| needles.matches(record))
        .cloned()
        .collect()
}

impl Facets {
    /// Collects distinct schools, cities and filieres in first-seen order.
    ///
    /// Values are trimmed; empty values are skipped.
    pub fn from_records(records: &[DiplomaRecord]) -> Self {
        let mut facets = Facets::default();
        let mut seen: [HashSet<String>; 3] = Default::default();

        for record in records {
            push_distinct(&mut facets.schools, &mut seen[0], &record.ecole);
            push_distinct(&mut facets.cities, &mut seen[1], &record.ville);
            for filiere in &record.filiere {
                push_distinct(&mut facets.filieres, &mut seen[2], filiere);
            }
        }

        facets
    }
}

fn push_distinct(out: &mut Vec<String>, seen: &mut HashSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && seen.insert(value.to_string()) {
        out.push(value.to_string());
    }
}

/// Number of pages needed to show `len` items, `per_page` at a time.
pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}

/// Returns the 1-based `page` of `records`. Out-of-range pages are empty.
pub fn paginate(records: &[DiplomaRecord], page: usize, per_page: usize) -> &[DiplomaRecord] {
    if page == 0 || per_page == 0 {
        return &[];
    }

    let start = (page - 1).saturating_mul(per_page);
    if start >= records.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(records.len());
    &records[start..end]
}
