use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::marker::MarkerEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(alias = "code")]
    pub participant_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<u64>,
    /// Years. Absent or zero means the biological age cannot be estimated.
    #[serde(default, alias = "age")]
    pub chronological_age: Option<u32>,
}

impl Participant {
    pub fn new(participant_code: impl Into<String>, chronological_age: Option<u32>) -> Self {
        Self {
            participant_code: participant_code.into(),
            participant_id: None,
            chronological_age,
        }
    }
}

/// One patient's raw panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub participant: Participant,
    /// Decoded per element; a malformed element is carried, not fatal.
    #[serde(default)]
    pub markers: Vec<MarkerEntry>,
}

/// A batch upload: one or more patient panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInput {
    pub patients: Vec<PatientInput>,
}

/// Accepted top-level input shapes: a `{"patients": [...]}` batch or a
/// single patient object.
#[derive(Debug, Clone, PartialEq)]
pub enum InputDocument {
    Batch(BatchInput),
    Single(PatientInput),
}

/// Just enough of the document to pick its shape.
#[derive(Deserialize)]
struct DocumentShape {
    #[serde(default)]
    patients: Option<IgnoredAny>,
}

impl InputDocument {
    /// Parse either shape. The presence of a `patients` key selects the
    /// batch form, so errors point at the offending line and column.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let shape: DocumentShape = serde_json::from_str(raw)?;
        if shape.patients.is_some() {
            serde_json::from_str(raw).map(Self::Batch)
        } else {
            serde_json::from_str(raw).map(Self::Single)
        }
    }

    pub fn into_patients(self) -> Vec<PatientInput> {
        match self {
            Self::Batch(batch) => batch.patients,
            Self::Single(patient) => vec![patient],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_patient_document() {
        let json = r#"{
            "participant": { "participant_code": "P-IND-001", "participant_id": 1, "chronological_age": 32 },
            "markers": []
        }"#;
        let patients = InputDocument::from_json(json).unwrap().into_patients();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].participant.participant_code, "P-IND-001");
        assert_eq!(patients[0].participant.participant_id, Some(1));
        assert_eq!(patients[0].participant.chronological_age, Some(32));
    }

    #[test]
    fn batch_document() {
        let json = r#"{ "patients": [
            { "participant": { "participant_code": "P-1" } },
            { "participant": { "participant_code": "P-2", "age": 40 } }
        ] }"#;
        let patients = InputDocument::from_json(json).unwrap().into_patients();
        assert_eq!(patients.len(), 2);
        assert!(patients[0].participant.chronological_age.is_none());
        assert!(patients[0].markers.is_empty());
        assert_eq!(patients[1].participant.chronological_age, Some(40));
    }

    #[test]
    fn rejects_document_without_participant() {
        let json = r#"{ "markers": [] }"#;
        assert!(InputDocument::from_json(json).is_err());
    }

    #[test]
    fn malformed_marker_does_not_fail_the_batch() {
        let json = r#"{ "patients": [
            { "participant": { "participant_code": "P-1" }, "markers": [
                { "code": "HDL", "name": "HDL", "category": "Cardiovascular", "value": null,
                  "thresholds": { "elevated": 40, "high": 30, "critical": 20 } }
            ] },
            { "participant": { "participant_code": "P-2" } }
        ] }"#;
        let patients = InputDocument::from_json(json).unwrap().into_patients();
        assert_eq!(patients.len(), 2);
        assert!(matches!(patients[0].markers[0], MarkerEntry::Malformed { .. }));
    }

    #[test]
    fn batch_errors_keep_their_position() {
        let json = "{ \"patients\": [\n  { \"participant\": { \"participant_code\": 7 } }\n] }";
        let err = InputDocument::from_json(json).unwrap_err();
        assert_eq!(err.line(), 2);
        assert!(err.to_string().contains("expected a string"));
    }

    #[test]
    fn syntax_errors_keep_their_position() {
        let err = InputDocument::from_json("{\n  \"patients\": [,]\n}").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.line(), 2);
    }
}
