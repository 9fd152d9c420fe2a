//! Diploma catalog records as received from the catalog service.
//!
//! Upstream payloads are loosely shaped: arrays go missing, strings come
//! back as `null`, and `duree` has been seen as a bare number, a numeric
//! string and a `{ "years": n }` object. All of that is absorbed here, during
//! deserialization, so everything downstream works on well-formed records.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One catalog entry describing an academic program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiplomaRecord {
    pub id: String,
    pub nom_diplome: String,
    pub ecole: String,
    pub ville: String,
    /// Program length in years. `None` when the upstream value was missing
    /// or not a positive integer.
    pub duree: Option<u32>,
    pub filiere: Vec<String>,
    pub mention_bac: String,
    pub career: Vec<String>,
    pub employment_opportunities: Vec<String>,
    pub matieres_diplome: Vec<String>,
    pub matieres_etudiant: Vec<String>,
    pub ancienne_diplome: Vec<String>,
}

impl DiplomaRecord {
    /// Builds a record from an arbitrary JSON value, coercing every field.
    ///
    /// Non-object values produce an all-default record.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(&map),
            _ => Self::default(),
        }
    }

    /// Resolves each field independently; a bad field never affects the
    /// others. When both the camelCase key and its legacy spelling are
    /// present, the camelCase key wins unless it is `null`.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            id: field(map, "id", None).map(id_from_value).unwrap_or_default(),
            nom_diplome: string_from(field(map, "nomDiplome", Some("nom_Diplome"))),
            ecole: string_from(field(map, "ecole", None)),
            ville: string_from(field(map, "ville", None)),
            duree: field(map, "duree", None).and_then(duree_from_value),
            filiere: list_from(field(map, "filiere", None)),
            mention_bac: string_from(field(map, "mentionBac", Some("mention_Bac"))),
            career: list_from(field(map, "career", None)),
            employment_opportunities: list_from(field(
                map,
                "employmentOpportunities",
                Some("employement_Opportunities"),
            )),
            matieres_diplome: list_from(field(map, "matieresDiplome", Some("matieres_Diplome"))),
            matieres_etudiant: list_from(field(
                map,
                "matieresEtudiant",
                Some("matieres_Etudiant"),
            )),
            ancienne_diplome: list_from(field(map, "ancienneDiplome", Some("ancienne_Diplome"))),
        }
    }
}

impl<'de> Deserialize<'de> for DiplomaRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

fn field<'a>(map: &'a Map<String, Value>, key: &str, legacy: Option<&str>) -> Option<&'a Value> {
    map.get(key)
        .filter(|v| !v.is_null())
        .or_else(|| legacy.and_then(|l| map.get(l)))
}

fn id_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn string_from(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn list_from(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn duree_from_value(value: &Value) -> Option<u32> {
    let years = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Object(map) => map.get("years").and_then(Value::as_u64),
        _ => None,
    }?;

    u32::try_from(years).ok().filter(|&y| y > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_well_formed_record() {
        let record: DiplomaRecord = serde_json::from_value(json!({
            "id": 7,
            "nomDiplome": "Génie Informatique",
            "ecole": "ENSIAS",
            "ville": "Rabat",
            "duree": 5,
            "filiere": ["Informatique"],
            "mentionBac": "Bien",
            "career": ["Engineer"],
            "employmentOpportunities": ["Tech"],
            "matieresDiplome": ["Algorithms"],
            "matieresEtudiant": ["Math"],
            "ancienneDiplome": []
        }))
        .unwrap();

        assert_eq!(record.id, "7");
        assert_eq!(record.nom_diplome, "Génie Informatique");
        assert_eq!(record.duree, Some(5));
        assert_eq!(record.filiere, vec!["Informatique"]);
        assert_eq!(record.employment_opportunities, vec!["Tech"]);
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let record: DiplomaRecord = serde_json::from_value(json!({
            "ecole": "ISCAE",
            "career": null,
            "mentionBac": null
        }))
        .unwrap();

        assert_eq!(record.ecole, "ISCAE");
        assert!(record.career.is_empty());
        assert!(record.filiere.is_empty());
        assert_eq!(record.mention_bac, "");
        assert_eq!(record.duree, None);
    }

    #[test]
    fn test_legacy_field_names() {
        let record: DiplomaRecord = serde_json::from_value(json!({
            "nom_Diplome": "Business Administration",
            "employement_Opportunities": ["Consulting"],
            "mention_Bac": "Très Bien",
            "filiere": "Business",
            "ancienne_Diplome": ""
        }))
        .unwrap();

        assert_eq!(record.nom_diplome, "Business Administration");
        assert_eq!(record.employment_opportunities, vec!["Consulting"]);
        assert_eq!(record.mention_bac, "Très Bien");
        assert_eq!(record.filiere, vec!["Business"]);
        assert!(record.ancienne_diplome.is_empty());
    }

    #[test]
    fn test_duree_shapes() {
        assert_eq!(duree_from_value(&json!(3)), Some(3));
        assert_eq!(duree_from_value(&json!("4")), Some(4));
        assert_eq!(duree_from_value(&json!({ "years": 2 })), Some(2));
        assert_eq!(duree_from_value(&json!(0)), None);
        assert_eq!(duree_from_value(&json!(-1)), None);
        assert_eq!(duree_from_value(&json!(2.5)), None);
        assert_eq!(duree_from_value(&json!("five")), None);
    }

    #[test]
    fn test_non_string_array_elements_dropped() {
        let record: DiplomaRecord =
            serde_json::from_value(json!({ "career": ["Engineer", null, 3, "Analyst"] })).unwrap();

        assert_eq!(record.career, vec!["Engineer", "Analyst"]);
    }

    #[test]
    fn test_from_value_non_object() {
        assert_eq!(DiplomaRecord::from_value(json!(42)), DiplomaRecord::default());
    }

    #[test]
    fn test_legacy_and_camel_case_keys_together() {
        let record = DiplomaRecord::from_value(json!({
            "ecole": "ENSIAS",
            "ville": "Rabat",
            "duree": 5,
            "career": ["Engineer"],
            "mentionBac": "Bien",
            "mention_Bac": "Très Bien",
            "employmentOpportunities": null,
            "employement_Opportunities": ["Tech"]
        }));

        assert_eq!(record.ecole, "ENSIAS");
        assert_eq!(record.ville, "Rabat");
        assert_eq!(record.duree, Some(5));
        assert_eq!(record.career, vec!["Engineer"]);
        assert_eq!(record.mention_bac, "Bien");
        assert_eq!(record.employment_opportunities, vec!["Tech"]);
    }

    #[test]
    fn test_bad_field_keeps_the_rest() {
        let record = DiplomaRecord::from_value(json!({
            "ecole": ["not", "a", "string"],
            "ville": "Rabat",
            "duree": "soon",
            "career": {"unexpected": true}
        }));

        assert_eq!(record.ecole, "");
        assert_eq!(record.ville, "Rabat");
        assert_eq!(record.duree, None);
        assert!(record.career.is_empty());
    }
}
