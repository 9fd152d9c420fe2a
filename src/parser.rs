//! Decoders for diploma records: JSON payloads from the catalog service and
//! CSV bulk-import files.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde_json::Value;
use thiserror::Error;

use crate::diploma::DiplomaRecord;

/// Row errors reported back to the user; the rest are only counted.
pub const MAX_REPORTED_ERRORS: usize = 5;

/// Decodes a JSON array of diploma records.
///
/// Array elements that are not objects are skipped; fields inside objects
/// are coerced as described on [`DiplomaRecord`].
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<DiplomaRecord>> {
    let items: Vec<Value> =
        serde_json::from_slice(bytes).context("Diploma payload is not a JSON array")?;

    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .map(DiplomaRecord::from_value)
        .collect())
}

/// Why a bulk-import file was rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("The CSV file is empty or badly formatted")]
    Empty,

    #[error("Missing headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("{}", summarize(.0))]
    InvalidRows(Vec<String>),

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

fn summarize(errors: &[String]) -> String {
    let mut shown = errors
        .iter()
        .take(MAX_REPORTED_ERRORS)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    if errors.len() > MAX_REPORTED_ERRORS {
        shown.push_str(&format!(
            "\n... and {} more",
            errors.len() - MAX_REPORTED_ERRORS
        ));
    }
    shown
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    NomDiplome,
    Ecole,
    Career,
    EmploymentOpportunities,
    Filiere,
    Duree,
    Ville,
    MatieresDiplome,
    MatieresEtudiant,
    MentionBac,
    AncienneDiplome,
}

impl Column {
    const REQUIRED: [Column; 9] = [
        Column::NomDiplome,
        Column::Ecole,
        Column::Career,
        Column::EmploymentOpportunities,
        Column::Filiere,
        Column::Duree,
        Column::Ville,
        Column::MatieresDiplome,
        Column::MatieresEtudiant,
    ];

    fn from_header(header: &str) -> Option<Self> {
        Some(match header {
            "nom_Diplome" | "nomDiplome" => Column::NomDiplome,
            "ecole" => Column::Ecole,
            "career" => Column::Career,
            "employement_Opportunities" | "employmentOpportunities" => {
                Column::EmploymentOpportunities
            }
            "filiere" => Column::Filiere,
            "duree" => Column::Duree,
            "ville" => Column::Ville,
            "matieres_Diplome" | "matieresDiplome" => Column::MatieresDiplome,
            "matieres_Etudiant" | "matieresEtudiant" => Column::MatieresEtudiant,
            "mention_Bac" | "mentionBac" => Column::MentionBac,
            "ancienne_Diplome" | "ancienneDiplome" => Column::AncienneDiplome,
            _ => return None,
        })
    }

    /// Header spelling used by the bulk-import template.
    fn header(self) -> &'static str {
        match self {
            Column::NomDiplome => "nom_Diplome",
            Column::Ecole => "ecole",
            Column::Career => "career",
            Column::EmploymentOpportunities => "employement_Opportunities",
            Column::Filiere => "filiere",
            Column::Duree => "duree",
            Column::Ville => "ville",
            Column::MatieresDiplome => "matieres_Diplome",
            Column::MatieresEtudiant => "matieres_Etudiant",
            Column::MentionBac => "mention_Bac",
            Column::AncienneDiplome => "ancienne_Diplome",
        }
    }
}

/// Parses a bulk-import CSV file into diploma records.
///
/// List columns accept either a single value or `[a|b|c]`. `duree` must be a
/// positive integer and every required column must be non-empty. A single
/// bad row rejects the whole file.
pub fn parse_bulk_csv(text: &str) -> Result<Vec<DiplomaRecord>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::Empty);
    }

    let columns: Vec<Option<Column>> = headers.iter().map(Column::from_header).collect();

    let missing: Vec<String> = Column::REQUIRED
        .iter()
        .filter(|required| !columns.contains(&Some(**required)))
        .map(|c| c.header().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingHeaders(missing));
    }

    let mut diplomas = Vec::new();
    let mut errors = Vec::new();
    let mut rows = 0usize;

    for result in reader.records() {
        let row = result?;
        if row.iter().all(str::is_empty) {
            continue;
        }
        rows += 1;

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        match parse_row(&row, &columns, line) {
            Ok(diploma) => diplomas.push(diploma),
            Err(mut row_errors) => errors.append(&mut row_errors),
        }
    }

    if rows == 0 {
        return Err(ImportError::Empty);
    }
    if !errors.is_empty() {
        return Err(ImportError::InvalidRows(errors));
    }

    Ok(diplomas)
}

fn parse_row(
    row: &StringRecord,
    columns: &[Option<Column>],
    line: u64,
) -> std::result::Result<DiplomaRecord, Vec<String>> {
    if row.len() != columns.len() {
        return Err(vec![format!(
            "Line {line}: Expected {} columns, got {}",
            columns.len(),
            row.len()
        )]);
    }

    let mut diploma = DiplomaRecord {
        id: format!("csv-{line}"),
        ..Default::default()
    };
    let mut errors = Vec::new();
    let mut bad_duree = false;

    for (column, value) in columns.iter().zip(row.iter()) {
        let Some(column) = column else { continue };

        match column {
            Column::NomDiplome => diploma.nom_diplome = value.to_string(),
            Column::Ecole => diploma.ecole = value.to_string(),
            Column::Ville => diploma.ville = value.to_string(),
            Column::MentionBac => diploma.mention_bac = value.to_string(),
            Column::Duree => match value.parse::<u32>() {
                Ok(years) if years > 0 => diploma.duree = Some(years),
                _ => {
                    errors.push(format!("Line {line}: Invalid duree \"{value}\"."));
                    bad_duree = true;
                }
            },
            Column::Filiere => diploma.filiere = list_cell(value),
            Column::Career => diploma.career = list_cell(value),
            Column::EmploymentOpportunities => diploma.employment_opportunities = list_cell(value),
            Column::MatieresDiplome => diploma.matieres_diplome = list_cell(value),
            Column::MatieresEtudiant => diploma.matieres_etudiant = list_cell(value),
            Column::AncienneDiplome => diploma.ancienne_diplome = list_cell(value),
        }
    }

    let missing: Vec<&str> = Column::REQUIRED
        .iter()
        .filter(|c| !(bad_duree && **c == Column::Duree))
        .filter(|c| is_blank(&diploma, **c))
        .map(|c| c.header())
        .collect();
    if !missing.is_empty() {
        errors.push(format!(
            "Line {line}: Missing/invalid fields: {}",
            missing.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(diploma)
    } else {
        Err(errors)
    }
}

fn is_blank(diploma: &DiplomaRecord, column: Column) -> bool {
    match column {
        Column::NomDiplome => diploma.nom_diplome.is_empty(),
        Column::Ecole => diploma.ecole.is_empty(),
        Column::Ville => diploma.ville.is_empty(),
        Column::MentionBac => diploma.mention_bac.is_empty(),
        Column::Duree => diploma.duree.is_none(),
        Column::Filiere => diploma.filiere.is_empty(),
        Column::Career => diploma.career.is_empty(),
        Column::EmploymentOpportunities => diploma.employment_opportunities.is_empty(),
        Column::MatieresDiplome => diploma.matieres_diplome.is_empty(),
        Column::MatieresEtudiant => diploma.matieres_etudiant.is_empty(),
        Column::AncienneDiplome => diploma.ancienne_diplome.is_empty(),
    }
}

/// Splits a list cell: `[a|b]` into its elements, anything else into a
/// single element. Empty cells and empty elements yield nothing.
fn list_cell(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'));

    match inner {
        Some(inner) => inner
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        None if value.is_empty() => Vec::new(),
        None => vec![value.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "nom_Diplome,ecole,career,employement_Opportunities,filiere,duree,ville,matieres_Diplome,matieres_Etudiant,mention_Bac";

    #[test]
    fn test_parse_records_array() {
        let records =
            parse_records(br#"[{"id":1,"ecole":"ENSIAS"}, 5, null, {"ecole":"EMI"}]"#).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[1].ecole, "EMI");
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(parse_records(br#"{"ecole":"ENSIAS"}"#).is_err());
        assert!(parse_records(b"not json").is_err());
    }

    #[test]
    fn test_parse_records_with_both_mention_spellings() {
        let records = parse_records(
            br#"[{"ecole":"ENSIAS","ville":"Rabat","duree":5,"career":["Engineer"],"mentionBac":"Bien","mention_Bac":"Bien"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ecole, "ENSIAS");
        assert_eq!(records[0].ville, "Rabat");
        assert_eq!(records[0].duree, Some(5));
        assert_eq!(records[0].career, vec!["Engineer"]);
        assert_eq!(records[0].mention_bac, "Bien");
    }

    #[test]
    fn test_bulk_csv_valid() {
        let text = format!(
            "{HEADER}\n\
             Génie Logiciel,ENSIAS,[Engineer | Architect],Tech,Informatique,5,Rabat,[Algorithms|Databases],Math,Bien\n\
             \n\
             \"Finance, Audit\",ISCAE,Auditor,Finance,[Business|Economie],3,Casablanca,Accounting,Economy,\n"
        );

        let records = parse_bulk_csv(&text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].career, vec!["Engineer", "Architect"]);
        assert_eq!(records[0].matieres_diplome, vec!["Algorithms", "Databases"]);
        assert_eq!(records[0].duree, Some(5));
        assert_eq!(records[0].id, "csv-2");
        assert_eq!(records[1].nom_diplome, "Finance, Audit");
        assert_eq!(records[1].filiere, vec!["Business", "Economie"]);
        assert_eq!(records[1].mention_bac, "");
    }

    #[test]
    fn test_bulk_csv_camel_case_headers() {
        let text = "nomDiplome,ecole,career,employmentOpportunities,filiere,duree,ville,matieresDiplome,matieresEtudiant\n\
                    Génie Civil,EMI,Engineer,BTP,Sciences Math A,5,Rabat,Structures,Physics\n";

        let records = parse_bulk_csv(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].employment_opportunities, vec!["BTP"]);
    }

    #[test]
    fn test_bulk_csv_missing_headers() {
        let err = parse_bulk_csv("nom_Diplome,ecole\nA,B\n").unwrap_err();

        match err {
            ImportError::MissingHeaders(missing) => {
                assert!(missing.contains(&"duree".to_string()));
                assert!(missing.contains(&"employement_Opportunities".to_string()));
                assert!(!missing.contains(&"ecole".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bulk_csv_empty() {
        assert!(matches!(parse_bulk_csv(""), Err(ImportError::Empty)));
        assert!(matches!(
            parse_bulk_csv(&format!("{HEADER}\n")),
            Err(ImportError::Empty)
        ));
    }

    #[test]
    fn test_bulk_csv_invalid_duree() {
        let text = format!("{HEADER}\nX,ENSIAS,Eng,Tech,Info,zero,Rabat,Algo,Math,\n");

        let err = parse_bulk_csv(&text).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("Line 2: Invalid duree \"zero\"."));
        assert!(!message.contains("Missing/invalid fields"));
    }

    #[test]
    fn test_bulk_csv_missing_values_and_column_count() {
        let text = format!(
            "{HEADER}\n\
             X,ENSIAS,,Tech,Info,3,Rabat,Algo,Math,\n\
             Y,EMI,Eng\n"
        );

        let err = parse_bulk_csv(&text).unwrap_err();
        let ImportError::InvalidRows(errors) = err else {
            panic!("expected row errors");
        };

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], "Line 2: Missing/invalid fields: career");
        assert_eq!(errors[1], "Line 3: Expected 10 columns, got 3");
    }

    #[test]
    fn test_bulk_csv_reports_at_most_five_errors() {
        let mut text = format!("{HEADER}\n");
        for i in 0..8 {
            text.push_str(&format!("D{i},E,C,O,F,-1,V,M,S,\n"));
        }

        let message = parse_bulk_csv(&text).unwrap_err().to_string();

        assert_eq!(message.lines().filter(|l| l.starts_with("Line")).count(), 5);
        assert!(message.ends_with("... and 3 more"));
    }

    #[test]
    fn test_list_cell() {
        assert_eq!(list_cell("[a|b| c ]"), vec!["a", "b", "c"]);
        assert_eq!(list_cell("single"), vec!["single"]);
        assert!(list_cell("").is_empty());
        assert!(list_cell("[]").is_empty());
    }
}
