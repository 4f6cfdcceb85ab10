//! Case data types shared by extraction, review and composition.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REPORT_PLACEHOLDER: &str = "Não foi possível extrair o relatório.";
pub const PROVEN_FACTS_PLACEHOLDER: &str = "Não foi possível extrair os factos provados.";
pub const UNPROVEN_FACTS_PLACEHOLDER: &str = "Nada a consignar.";
pub const DECISION_PLACEHOLDER: &str = "Não foi possível extrair a decisão.";
pub const UNIDENTIFIED_PARTY: &str = "Parte não identificada";
pub const SYSTEM_SOURCE: &str = "Sistema";
pub const NO_CONCLUSIONS: &str = "Não foram encontradas conclusões explícitas.";

/// Current UTC time as an RFC 3339 timestamp with second precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whether a conclusion block belongs to an appeal or to the response to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConclusionType {
    Recurso,
    Resposta,
}

impl ConclusionType {
    /// Normalize a `TIPO:` value. Anything unrecognised counts as an appeal.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "RESPOSTA" => Self::Resposta,
            _ => Self::Recurso,
        }
    }
}

/// One block of numbered conclusions, from an appeal or a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConclusionItem {
    #[serde(rename = "type")]
    pub item_type: ConclusionType,
    pub source: String,
    pub content: String,
}

impl ConclusionItem {
    /// Stand-in item used when the model returned no conclusions at all.
    pub fn placeholder() -> Self {
        Self {
            item_type: ConclusionType::Recurso,
            source: SYSTEM_SOURCE.to_string(),
            content: NO_CONCLUSIONS.to_string(),
        }
    }
}

/// Extraction result, edited by the reviewer and fed to the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseData {
    pub report: String,
    pub proven_facts: String,
    pub unproven_facts: String,
    pub decision_first_instance: String,
    pub appeal_conclusions: Vec<ConclusionItem>,
}

/// A case kept in the review store between extraction and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_files: Vec<String>,
    pub data: CaseData,
}

impl CaseRecord {
    pub fn new(source_files: Vec<String>, data: CaseData) -> Self {
        let now = now_iso8601();
        Self {
            id: format!("case_{}", Uuid::new_v4().simple()),
            created_at: now.clone(),
            updated_at: now,
            source_files,
            data,
        }
    }

    /// Replace the case data with the reviewer's edited version.
    pub fn update(&mut self, data: CaseData) {
        self.data = data;
        self.updated_at = now_iso8601();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conclusion_type_normalization() {
        assert_eq!(ConclusionType::from_label("resposta"), ConclusionType::Resposta);
        assert_eq!(ConclusionType::from_label(" RECURSO "), ConclusionType::Recurso);
        assert_eq!(ConclusionType::from_label("Contra-alegações"), ConclusionType::Recurso);
        assert_eq!(ConclusionType::from_label(""), ConclusionType::Recurso);
    }

    #[test]
    fn test_case_data_wire_format() {
        let data = CaseData {
            report: "r".into(),
            proven_facts: "p".into(),
            unproven_facts: "u".into(),
            decision_first_instance: "d".into(),
            appeal_conclusions: vec![ConclusionItem {
                item_type: ConclusionType::Resposta,
                source: "Recorrido".into(),
                content: "1. x".into(),
            }],
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["provenFacts"], "p");
        assert_eq!(json["decisionFirstInstance"], "d");
        assert_eq!(json["appealConclusions"][0]["type"], "RESPOSTA");

        let back: CaseData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_record_update_keeps_id() {
        let data = CaseData {
            report: "a".into(),
            proven_facts: "b".into(),
            unproven_facts: "c".into(),
            decision_first_instance: "d".into(),
            appeal_conclusions: vec![ConclusionItem::placeholder()],
        };
        let mut record = CaseRecord::new(vec!["sentenca.pdf".into()], data.clone());
        let id = record.id.clone();
        assert!(id.starts_with("case_"));

        let mut edited = data;
        edited.report = "editado".into();
        record.update(edited);
        assert_eq!(record.id, id);
        assert_eq!(record.data.report, "editado");
    }

    #[test]
    fn test_now_iso8601_shape() {
        let ts = now_iso8601();
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], "T");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
