//! Output formatting and persistence for diploma statistics.
//!
//! Supports pretty-printing, JSON serialization, the sectioned CSV export
//! and CSV append of raw records.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::{AggregateStats, NamedCount};
use crate::analyzers::utility::format_average;
use crate::diploma::DiplomaRecord;

/// Logs statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &AggregateStats) {
    debug!("{:#?}", stats);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Renders statistics as a sectioned CSV document.
///
/// One titled section per grouping, each with its own header row and
/// `key,count` rows, separated by blank lines. Keys containing commas or
/// quotes are quoted.
pub fn stats_to_csv(stats: &AggregateStats) -> Result<String> {
    let mut out = String::from("Diploma Statistics Summary\n");
    out.push_str(&row(&["Total Diplomas", &stats.total.to_string()])?);
    out.push_str(&row(&[
        "Average Duration",
        &format_average(stats.average_duration),
    ])?);

    let by_duree = stats
        .by_duree
        .iter()
        .map(|(years, count)| (years.to_string(), *count));

    section(&mut out, "By School", ["School", "Count"], counts(&stats.by_ecole))?;
    section(&mut out, "By City", ["City", "Count"], counts(&stats.by_ville))?;
    section(&mut out, "By Field", ["Field", "Count"], counts(&stats.by_filiere))?;
    section(
        &mut out,
        "By Mention Bac",
        ["Mention", "Count"],
        counts(&stats.by_mention_bac),
    )?;
    section(&mut out, "By Duration", ["Years", "Count"], by_duree)?;
    section(&mut out, "Top Careers", ["Career", "Count"], ranked(&stats.top_careers))?;
    section(
        &mut out,
        "Top Employment Opportunities",
        ["Opportunity", "Count"],
        ranked(&stats.top_employment_opportunities),
    )?;

    Ok(out)
}

fn counts<'a>(
    map: &'a std::collections::BTreeMap<String, usize>,
) -> impl Iterator<Item = (String, usize)> + 'a {
    map.iter().map(|(k, v)| (k.clone(), *v))
}

fn ranked(list: &[NamedCount]) -> impl Iterator<Item = (String, usize)> + '_ {
    list.iter().map(|e| (e.name.clone(), e.count))
}

fn section(
    out: &mut String,
    title: &str,
    header: [&str; 2],
    rows: impl Iterator<Item = (String, usize)>,
) -> Result<()> {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&row(&header)?);
    for (key, count) in rows {
        out.push_str(&row(&[&key, &count.to_string()])?);
    }
    Ok(())
}

fn row(fields: &[&str]) -> Result<String> {
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(vec![]);
    writer.write_record(fields)?;
    let bytes = writer.into_inner().context("Failed to flush CSV row")?;
    Ok(String::from_utf8(bytes)?)
}

/// Writes `contents` to `path`, gzip-compressed when `gzip` is set.
///
/// Compressed output gets a `.gz` suffix. Returns the path actually written.
pub fn write_export(path: &str, contents: &str, gzip: bool) -> Result<PathBuf> {
    let target = if gzip {
        PathBuf::from(format!("{path}.gz"))
    } else {
        PathBuf::from(path)
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(contents.as_bytes())?;
        encoder.finish()?
    } else {
        contents.as_bytes().to_vec()
    };

    std::fs::write(&target, &body)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    info!(path = %target.display(), bytes = body.len(), gzip, "Export written");
    Ok(target)
}

/// Flattened CSV row for a diploma record; list fields are `|`-joined.
#[derive(Serialize)]
struct RecordRow<'a> {
    id: &'a str,
    nom_diplome: &'a str,
    ecole: &'a str,
    ville: &'a str,
    duree: Option<u32>,
    filiere: String,
    mention_bac: &'a str,
    career: String,
    employment_opportunities: String,
    matieres_diplome: String,
    matieres_etudiant: String,
    ancienne_diplome: String,
}

impl<'a> From<&'a DiplomaRecord> for RecordRow<'a> {
    fn from(d: &'a DiplomaRecord) -> Self {
        Self {
            id: &d.id,
            nom_diplome: &d.nom_diplome,
            ecole: &d.ecole,
            ville: &d.ville,
            duree: d.duree,
            filiere: d.filiere.join("|"),
            mention_bac: &d.mention_bac,
            career: d.career.join("|"),
            employment_opportunities: d.employment_opportunities.join("|"),
            matieres_diplome: d.matieres_diplome.join("|"),
            matieres_etudiant: d.matieres_etudiant.join("|"),
            ancienne_diplome: d.ancienne_diplome.join("|"),
        }
    }
}

/// Appends diploma records as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, records: &[DiplomaRecord]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(RecordRow::from(record))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::compute_stats;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample() -> Vec<DiplomaRecord> {
        vec![
            DiplomaRecord {
                id: "1".into(),
                nom_diplome: "Génie Logiciel".into(),
                ecole: "ENSIAS".into(),
                ville: "Rabat".into(),
                duree: Some(5),
                filiere: vec!["Informatique".into()],
                mention_bac: "Bien".into(),
                career: vec!["Engineer".into(), "Architect".into()],
                employment_opportunities: vec!["Tech".into()],
                ..Default::default()
            },
            DiplomaRecord {
                id: "2".into(),
                nom_diplome: "Audit".into(),
                ecole: "ISCAE, Casa".into(),
                ville: "Casablanca".into(),
                duree: Some(3),
                filiere: vec!["Business".into()],
                career: vec!["Engineer".into()],
                employment_opportunities: vec!["Finance".into()],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&AggregateStats::default());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&AggregateStats::default()).unwrap();
    }

    #[test]
    fn test_stats_to_csv_sections() {
        let csv = stats_to_csv(&compute_stats(&sample())).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "Diploma Statistics Summary");
        assert_eq!(lines[1], "Total Diplomas,2");
        assert_eq!(lines[2], "Average Duration,4.0");
        assert!(csv.contains("\nBy School\nSchool,Count\nENSIAS,1\n\"ISCAE, Casa\",1\n"));
        assert!(csv.contains("\nBy Mention Bac\nMention,Count\nBien,1\n"));
        assert!(csv.contains("\nBy Duration\nYears,Count\n3,1\n5,1\n"));
        assert!(csv.contains("\nTop Careers\nCareer,Count\nEngineer,2\nArchitect,1\n"));
        assert!(csv.ends_with("Opportunity,Count\nTech,1\nFinance,1\n"));
    }

    #[test]
    fn test_stats_to_csv_empty() {
        let csv = stats_to_csv(&compute_stats(&[])).unwrap();

        assert!(csv.contains("Total Diplomas,0\nAverage Duration,0.0\n"));
        assert!(csv.contains("\nBy City\nCity,Count\n\nBy Field\n"));
    }

    #[test]
    fn test_write_export_plain_and_gzip() {
        let path = temp_path("diploma_stats_test_export.csv");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_file(format!("{path}.gz"));

        let written = write_export(&path, "a,1\n", false).unwrap();
        assert_eq!(fs::read_to_string(&written).unwrap(), "a,1\n");

        let written = write_export(&path, "a,1\n", true).unwrap();
        assert!(written.to_string_lossy().ends_with(".csv.gz"));
        let mut decoded = String::new();
        GzDecoder::new(fs::File::open(&written).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "a,1\n");

        fs::remove_file(&path).unwrap();
        fs::remove_file(&written).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("diploma_stats_test_append.csv");
        let _ = fs::remove_file(&path);

        append_records(&path, &sample()).unwrap();
        append_records(&path, &sample()[..1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("id,nom_diplome,ecole"));
        assert_eq!(lines.iter().filter(|l| l.starts_with("id,")).count(), 1);
        assert!(lines[1].contains("Engineer|Architect"));

        fs::remove_file(&path).unwrap();
    }
}
