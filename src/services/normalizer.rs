// src/services/normalizer.rs
//! Maps each provider's parsed output onto the canonical [`DiagnosisResult`].

use serde_json::Value;

use crate::errors::{ProviderError, ProviderErrorKind};
use crate::models::{DiagnosisResult, ProviderId, Severity, Urgency};

/// Parsed provider output, tagged by the provider whose field contract it
/// follows.
#[derive(Debug, Clone)]
pub enum RawDiagnosis {
    OpenAi(Value),
    Claude(Value),
    Perplexity(Value),
    DeepSeek(Value),
    PlantDatabase(DiagnosisResult),
}

impl RawDiagnosis {
    pub fn provider(&self) -> ProviderId {
        match self {
            RawDiagnosis::OpenAi(_) => ProviderId::OpenAi,
            RawDiagnosis::Claude(_) => ProviderId::Claude,
            RawDiagnosis::Perplexity(_) => ProviderId::Perplexity,
            RawDiagnosis::DeepSeek(_) => ProviderId::DeepSeek,
            RawDiagnosis::PlantDatabase(_) => ProviderId::PlantDatabase,
        }
    }
}

/// JSON keys a provider is prompted to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames {
    pub disease: &'static str,
    pub confidence: &'static str,
    pub severity: &'static str,
    pub description: &'static str,
    pub symptoms: &'static str,
    pub possible_causes: &'static str,
    pub organic_treatments: &'static str,
    pub chemical_treatments: &'static str,
    pub preventive_measures: &'static str,
    pub urgency: &'static str,
}

pub const CAMEL_CASE: FieldNames = FieldNames {
    disease: "disease",
    confidence: "confidence",
    severity: "severity",
    description: "description",
    symptoms: "symptoms",
    possible_causes: "possibleCauses",
    organic_treatments: "organicTreatments",
    chemical_treatments: "chemicalTreatments",
    preventive_measures: "preventiveMeasures",
    urgency: "urgency",
};

pub const OPENAI_FIELDS: FieldNames = FieldNames {
    disease: "diseaseName",
    ..CAMEL_CASE
};

pub const SNAKE_CASE: FieldNames = FieldNames {
    disease: "disease_name",
    confidence: "confidence",
    severity: "severity",
    description: "description",
    symptoms: "symptoms",
    possible_causes: "possible_causes",
    organic_treatments: "organic_treatments",
    chemical_treatments: "chemical_treatments",
    preventive_measures: "preventive_measures",
    urgency: "urgency",
};

pub fn field_names(provider: ProviderId) -> FieldNames {
    match provider {
        ProviderId::OpenAi => OPENAI_FIELDS,
        ProviderId::Perplexity => SNAKE_CASE,
        ProviderId::Claude | ProviderId::DeepSeek | ProviderId::PlantDatabase => CAMEL_CASE,
    }
}

pub fn normalize(raw: RawDiagnosis) -> Result<DiagnosisResult, ProviderError> {
    let fields = field_names(raw.provider());
    match raw {
        RawDiagnosis::OpenAi(value)
        | RawDiagnosis::Claude(value)
        | RawDiagnosis::Perplexity(value)
        | RawDiagnosis::DeepSeek(value) => from_value(&value, &fields),
        RawDiagnosis::PlantDatabase(result) => Ok(canonicalize(result)),
    }
}

/// Re-apply the invariants to an already-typed result.
pub fn canonicalize(mut result: DiagnosisResult) -> DiagnosisResult {
    result.confidence = normalize_confidence(result.confidence);
    result
}

fn from_value(value: &Value, fields: &FieldNames) -> Result<DiagnosisResult, ProviderError> {
    let object = value.as_object().ok_or_else(|| {
        ProviderError::new(
            ProviderErrorKind::SchemaValidationFailed,
            "diagnosis is not a JSON object",
        )
    })?;

    let disease = object
        .get(fields.disease)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::SchemaValidationFailed,
                format!("missing `{}`", fields.disease),
            )
        })?
        .to_string();

    let confidence = object
        .get(fields.confidence)
        .and_then(parse_number)
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::SchemaValidationFailed,
                format!("missing or non-numeric `{}`", fields.confidence),
            )
        })?;

    let severity = object
        .get(fields.severity)
        .and_then(Value::as_str)
        .map(coerce_severity)
        .unwrap_or(Severity::Medium);

    let urgency = object
        .get(fields.urgency)
        .and_then(Value::as_str)
        .and_then(coerce_urgency)
        .unwrap_or_else(|| severity.into());

    Ok(DiagnosisResult {
        disease,
        confidence: normalize_confidence(confidence),
        severity,
        description: object
            .get(fields.description)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        symptoms: string_list(object.get(fields.symptoms)),
        possible_causes: string_list(object.get(fields.possible_causes)),
        organic_treatments: string_list(object.get(fields.organic_treatments)),
        chemical_treatments: string_list(object.get(fields.chemical_treatments)),
        preventive_measures: string_list(object.get(fields.preventive_measures)),
        urgency,
    })
}

/// Percentages (> 1) become fractions; the result is clamped to [0, 1].
pub fn normalize_confidence(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
    fraction.clamp(0.0, 1.0)
}

fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

pub fn coerce_severity(text: &str) -> Severity {
    let text = text.to_lowercase();
    if ["high", "severe", "critical", "serious"]
        .iter()
        .any(|w| text.contains(w))
    {
        Severity::High
    } else if ["low", "mild", "minor", "none"].iter().any(|w| text.contains(w)) {
        Severity::Low
    } else {
        Severity::Medium
    }
}

fn coerce_urgency(text: &str) -> Option<Urgency> {
    let text = text.to_lowercase();
    if ["immediate", "urgent", "asap", "critical"]
        .iter()
        .any(|w| text.contains(w))
    {
        Some(Urgency::Immediate)
    } else if text.contains("high") {
        Some(Urgency::High)
    } else if ["medium", "moderate"].iter().any(|w| text.contains(w)) {
        Some(Urgency::Medium)
    } else if ["low", "monitor", "none"].iter().any(|w| text.contains(w)) {
        Some(Urgency::Low)
    } else {
        None
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::MockGenerator;
    use serde_json::json;

    #[test]
    fn percentage_confidence_becomes_fraction() {
        assert_eq!(normalize_confidence(85.0), 0.85);
        assert_eq!(normalize_confidence(0.85), 0.85);
        assert_eq!(normalize_confidence(1.0), 1.0);
        assert_eq!(normalize_confidence(250.0), 1.0);
        assert_eq!(normalize_confidence(-3.0), 0.0);
        assert_eq!(normalize_confidence(f64::NAN), 0.0);
    }

    #[test]
    fn openai_uses_disease_name_key() {
        let raw = RawDiagnosis::OpenAi(json!({
            "diseaseName": "Late Blight",
            "confidence": 92,
            "severity": "Severe",
            "symptoms": ["Water-soaked lesions", "White mould on leaf undersides"],
            "organicTreatments": "Remove infected foliage"
        }));
        let result = normalize(raw).unwrap();
        assert_eq!(result.disease, "Late Blight");
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.urgency, Urgency::High);
        assert_eq!(result.symptoms.len(), 2);
        assert_eq!(result.organic_treatments, vec!["Remove infected foliage"]);
        assert!(result.chemical_treatments.is_empty());
        assert_eq!(result.description, "");
    }

    #[test]
    fn perplexity_uses_snake_case_contract() {
        let raw = RawDiagnosis::Perplexity(json!({
            "disease_name": "Downy Mildew",
            "confidence": "78%",
            "severity": "moderate",
            "possible_causes": ["Cool, wet nights"],
            "urgency": "act within a week, moderate"
        }));
        let result = normalize(raw).unwrap();
        assert_eq!(result.disease, "Downy Mildew");
        assert_eq!(result.confidence, 0.78);
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.urgency, Urgency::Medium);
        assert_eq!(result.possible_causes, vec!["Cool, wet nights"]);
    }

    #[test]
    fn foreign_disease_key_fails_schema_validation() {
        // Claude is prompted for `disease`; an OpenAI-shaped answer is rejected.
        let raw = RawDiagnosis::Claude(json!({ "diseaseName": "Rust", "confidence": 0.5 }));
        let err = normalize(raw).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::SchemaValidationFailed);
    }

    #[test]
    fn each_provider_is_read_with_the_contract_it_was_prompted_with() {
        let prompted = |raw: &RawDiagnosis| field_names(raw.provider()).disease;
        assert_eq!(prompted(&RawDiagnosis::OpenAi(json!({}))), "diseaseName");
        assert_eq!(prompted(&RawDiagnosis::Claude(json!({}))), "disease");
        assert_eq!(prompted(&RawDiagnosis::DeepSeek(json!({}))), "disease");
        assert_eq!(prompted(&RawDiagnosis::Perplexity(json!({}))), "disease_name");

        let raw = RawDiagnosis::DeepSeek(json!({ "disease": "Leaf Spot", "confidence": 0.6 }));
        assert_eq!(normalize(raw).unwrap().disease, "Leaf Spot");
    }

    #[test]
    fn missing_confidence_fails_schema_validation() {
        let raw = RawDiagnosis::DeepSeek(json!({ "disease": "Leaf Spot" }));
        let err = normalize(raw).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::SchemaValidationFailed);

        let raw = RawDiagnosis::DeepSeek(json!(["not", "an", "object"]));
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn free_text_severity_is_coerced() {
        assert_eq!(coerce_severity("CRITICAL"), Severity::High);
        assert_eq!(coerce_severity("mild infection"), Severity::Low);
        assert_eq!(coerce_severity("unclear"), Severity::Medium);
        assert_eq!(coerce_urgency("Immediate action"), Some(Urgency::Immediate));
        assert_eq!(coerce_urgency("whenever"), None);
    }

    #[test]
    fn mock_output_is_a_fixed_point() {
        let generator = MockGenerator::new();
        for entry in generator.catalogue("tomato") {
            let typed = normalize(RawDiagnosis::PlantDatabase(entry.clone())).unwrap();
            assert_eq!(typed, entry);

            let value = serde_json::to_value(&entry).unwrap();
            let reparsed = normalize(RawDiagnosis::Claude(value)).unwrap();
            assert_eq!(reparsed, entry);
        }
    }
}
