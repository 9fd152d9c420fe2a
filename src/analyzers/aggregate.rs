use crate::analyzers::types::AggregateStats;
use crate::analyzers::utility::{Tally, mean};
use crate::diploma::DiplomaRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Length of the top careers / employment opportunities rankings.
pub const TOP_N: usize = 5;

/// Aggregates a set of diploma records into an [`AggregateStats`].
///
/// Groups records by school, city, filiere, baccalaureate mention and
/// duration, ranks careers and employment opportunities, and averages the
/// program duration. Records with an empty mention are left out of
/// `by_mention_bac`; records without a usable `duree` are left out of
/// `by_duree` and add nothing to the duration sum, but the average is still
/// taken over every record. Never fails.
pub fn compute_stats(records: &[DiplomaRecord]) -> AggregateStats {
    let mut by_ecole = BTreeMap::new();
    let mut by_ville = BTreeMap::new();
    let mut by_filiere = BTreeMap::new();
    let mut by_mention_bac = BTreeMap::new();
    let mut by_duree = BTreeMap::new();

    let mut careers = Tally::new();
    let mut opportunities = Tally::new();
    let mut durations = Vec::with_capacity(records.len());

    for record in records {
        *by_ecole.entry(record.ecole.clone()).or_insert(0) += 1;
        *by_ville.entry(record.ville.clone()).or_insert(0) += 1;

        if !record.mention_bac.is_empty() {
            *by_mention_bac.entry(record.mention_bac.clone()).or_insert(0) += 1;
        }

        if let Some(duree) = record.duree {
            *by_duree.entry(duree).or_insert(0) += 1;
        }
        durations.push(record.duree.map_or(0.0, f64::from));

        for filiere in &record.filiere {
            *by_filiere.entry(filiere.clone()).or_insert(0) += 1;
        }

        careers.add_all(&record.career);
        opportunities.add_all(&record.employment_opportunities);
    }

    debug!(
        records = records.len(),
        distinct_careers = careers.len(),
        distinct_opportunities = opportunities.len(),
        "Computed diploma statistics"
    );

    AggregateStats {
        total: records.len(),
        by_ecole,
        by_ville,
        by_filiere,
        by_mention_bac,
        by_duree,
        top_careers: careers.top_n(TOP_N),
        top_employment_opportunities: opportunities.top_n(TOP_N),
        average_duration: mean(&durations),
    }
}
