// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ProviderErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "claude")]
    Claude,
    #[serde(rename = "perplexity")]
    Perplexity,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "plant-database")]
    PlantDatabase,
}

impl ProviderId {
    /// Order used by automatic selection.
    pub const FALLBACK_CHAIN: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Claude,
        ProviderId::Perplexity,
        ProviderId::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Claude => "claude",
            ProviderId::Perplexity => "perplexity",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::PlantDatabase => "plant-database",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "gpt" | "gpt-4o" => Some(ProviderId::OpenAi),
            "claude" | "anthropic" => Some(ProviderId::Claude),
            "perplexity" => Some(ProviderId::Perplexity),
            "deepseek" => Some(ProviderId::DeepSeek),
            "plant-database" | "plantdb" | "plant_database" | "static" | "database" => {
                Some(ProviderId::PlantDatabase)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Low,
    Medium,
    High,
    Immediate,
}

impl From<Severity> for Urgency {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Urgency::Low,
            Severity::Medium => Urgency::Medium,
            Severity::High => Urgency::High,
        }
    }
}

/// Canonical diagnosis, whatever provider produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub disease: String,
    pub confidence: f64,
    pub severity: Severity,
    pub description: String,
    pub symptoms: Vec<String>,
    pub possible_causes: Vec<String>,
    pub organic_treatments: Vec<String>,
    pub chemical_treatments: Vec<String>,
    pub preventive_measures: Vec<String>,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub result: DiagnosisResult,
    pub provider: ProviderId,
    pub mock_response: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DiagnosisResponse {
    pub fn live(provider: ProviderId, model: &str, result: DiagnosisResult) -> Self {
        Self {
            result,
            provider,
            mock_response: false,
            error: None,
            model: Some(model.to_string()),
            processing_time_ms: 0,
            record_id: None,
            image_url: None,
        }
    }

    pub fn mock(
        provider: ProviderId,
        result: DiagnosisResult,
        error: Option<ProviderErrorKind>,
    ) -> Self {
        Self {
            result,
            provider,
            mock_response: true,
            error,
            model: None,
            processing_time_ms: 0,
            record_id: None,
            image_url: None,
        }
    }
}

/// JSON body accepted by `POST /api/{provider}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRequest {
    #[serde(alias = "base64Image")]
    pub image: String,
    #[serde(default)]
    pub plant_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// One row of the `diagnoses` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub plant_type: String,
    pub provider: ProviderId,
    pub image_url: Option<String>,
    pub mock_response: bool,
    pub error: Option<ProviderErrorKind>,
    pub result: DiagnosisResult,
    pub created_at: DateTime<Utc>,
}

/// A stored record as `GET /api/diagnoses` returns it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisSummary {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub plant_type: String,
    pub provider: ProviderId,
    pub image_url: Option<String>,
    pub mock_response: bool,
    pub error: Option<ProviderErrorKind>,
    pub result: DiagnosisResult,
    pub created_at: DateTime<Utc>,
}

impl From<DiagnosisRecord> for DiagnosisSummary {
    fn from(record: DiagnosisRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            plant_type: record.plant_type,
            provider: record.provider,
            image_url: record.image_url,
            mock_response: record.mock_response,
            error: record.error,
            result: record.result,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BestTime {
    Morning,
    Evening,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprayDay {
    pub date: NaiveDate,
    pub score: i32,
    pub reasons: Vec<String>,
    pub best_time_of_day: BestTime,
    pub conditions: String,
    pub temperature: f64,
    pub wind_speed: f64,
    pub rain_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PesticideDosage {
    pub product: String,
    pub active_ingredient: String,
    pub target_disease: String,
    pub target_plant: String,
    pub application_rate: String,
    pub method: String,
    pub timing: String,
    pub max_applications_per_season: u32,
    pub preharvest_interval_days: u32,
    pub reentry_interval_hours: u32,
    pub environmental_impact: String,
    pub cost: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchSource {
    Eu,
    Agris,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFinding {
    pub source: ResearchSource,
    pub title: String,
    pub url: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub query: String,
    pub findings: Vec<ResearchFinding>,
    pub failed_sources: Vec<ResearchSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_ids_parse_with_aliases() {
        assert_eq!(ProviderId::parse("Claude"), Some(ProviderId::Claude));
        assert_eq!(ProviderId::parse("anthropic"), Some(ProviderId::Claude));
        assert_eq!(ProviderId::parse(" openai "), Some(ProviderId::OpenAi));
        assert_eq!(
            ProviderId::parse("static"),
            Some(ProviderId::PlantDatabase)
        );
        assert_eq!(ProviderId::parse("gemini"), None);
    }

    #[test]
    fn provider_id_serializes_as_route_name() {
        let json = serde_json::to_string(&ProviderId::PlantDatabase).unwrap();
        assert_eq!(json, "\"plant-database\"");
        assert_eq!(ProviderId::DeepSeek.to_string(), "deepseek");
    }

    #[test]
    fn stored_rows_stay_snake_case_and_summaries_are_camel_case() {
        let record = DiagnosisRecord {
            id: Uuid::new_v4(),
            user_id: Some("alice".to_string()),
            plant_type: "grape".to_string(),
            provider: ProviderId::Claude,
            image_url: None,
            mock_response: true,
            error: Some(ProviderErrorKind::RateLimited),
            result: crate::services::mock::MockGenerator::new()
                .catalogue("grape")
                .remove(0),
            created_at: Utc::now(),
        };

        let row = serde_json::to_value(&record).unwrap();
        assert_eq!(row["mock_response"], true);
        assert!(row.get("created_at").is_some());

        let summary = serde_json::to_value(DiagnosisSummary::from(record)).unwrap();
        assert_eq!(summary["mockResponse"], true);
        assert_eq!(summary["userId"], "alice");
        assert_eq!(summary["error"], "RATE_LIMITED");
        assert!(summary.get("createdAt").is_some());
        assert!(summary.get("mock_response").is_none());
    }

    #[test]
    fn diagnose_request_accepts_base64_image_alias() {
        let req: DiagnoseRequest =
            serde_json::from_str(r#"{"base64Image":"aGk=","plantType":"tomato"}"#).unwrap();
        assert_eq!(req.image, "aGk=");
        assert_eq!(req.plant_type.as_deref(), Some("tomato"));
        assert!(req.user_id.is_none());
    }
}
