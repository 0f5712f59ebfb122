// src/services/dispatch.rs
use log::{debug, info, warn};
use reqwest::Client;
use std::sync::Arc;

use crate::config::Config;
use crate::models::{DiagnosisResponse, ProviderId};
use crate::services::image_processor::PreparedImage;
use crate::services::mock::MockGenerator;
use crate::services::providers::{
    ClaudeProvider, DeepSeekProvider, DiagnosisProvider, OpenAiProvider, PerplexityProvider,
    PlantDatabase, run_provider,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderSelection {
    Explicit(ProviderId),
    /// Try configured providers in fallback-chain order.
    Auto,
}

impl ProviderSelection {
    /// Unset or unrecognised identifiers select the plant database.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => ProviderSelection::Explicit(ProviderId::PlantDatabase),
            Some(v) if v.eq_ignore_ascii_case("auto") => ProviderSelection::Auto,
            Some(v) => match ProviderId::parse(v) {
                Some(id) => ProviderSelection::Explicit(id),
                None => {
                    debug!("Unknown provider '{}', using plant database", v);
                    ProviderSelection::Explicit(ProviderId::PlantDatabase)
                }
            },
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: ProviderId,
    pub model: String,
    pub configured: bool,
}

pub struct DiagnosisDispatcher {
    providers: Vec<Arc<dyn DiagnosisProvider>>,
    plant_database: Arc<PlantDatabase>,
    mock: MockGenerator,
}

impl DiagnosisDispatcher {
    pub fn new(providers: Vec<Arc<dyn DiagnosisProvider>>) -> Self {
        Self {
            providers,
            plant_database: Arc::new(PlantDatabase::new()),
            mock: MockGenerator::new(),
        }
    }

    pub fn from_config(client: Client, config: &Config) -> Self {
        let providers: Vec<Arc<dyn DiagnosisProvider>> = vec![
            Arc::new(OpenAiProvider::new(client.clone(), config.openai.clone())),
            Arc::new(ClaudeProvider::new(client.clone(), config.claude.clone())),
            Arc::new(PerplexityProvider::new(client.clone(), config.perplexity.clone())),
            Arc::new(DeepSeekProvider::new(client, config.deepseek.clone())),
        ];
        Self::new(providers)
    }

    pub fn provider(&self, id: ProviderId) -> Arc<dyn DiagnosisProvider> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .cloned()
            .unwrap_or_else(|| self.plant_database.clone() as Arc<dyn DiagnosisProvider>)
    }

    /// False when the selection can only produce a mock, which never looks
    /// at the image.
    pub fn requires_image(&self, selection: ProviderSelection) -> bool {
        match selection {
            ProviderSelection::Explicit(id) => self.provider(id).is_configured(),
            ProviderSelection::Auto => true,
        }
    }

    pub fn statuses(&self) -> Vec<ProviderStatus> {
        ProviderId::FALLBACK_CHAIN
            .iter()
            .chain(std::iter::once(&ProviderId::PlantDatabase))
            .map(|id| {
                let provider = self.provider(*id);
                ProviderStatus {
                    id: *id,
                    model: provider.model().to_string(),
                    configured: provider.is_configured(),
                }
            })
            .collect()
    }

    pub async fn diagnose(
        &self,
        selection: ProviderSelection,
        image: &PreparedImage,
        plant_type: &str,
    ) -> DiagnosisResponse {
        match selection {
            ProviderSelection::Explicit(id) => {
                let provider = self.provider(id);
                info!("Diagnosing '{}' with {}", plant_type, provider.id());
                run_provider(provider.as_ref(), &self.mock, image, plant_type).await
            }
            ProviderSelection::Auto => self.diagnose_auto(image, plant_type).await,
        }
    }

    async fn diagnose_auto(&self, image: &PreparedImage, plant_type: &str) -> DiagnosisResponse {
        let mut last_error = None;
        for id in ProviderId::FALLBACK_CHAIN {
            let provider = self.provider(id);
            if !provider.is_configured() {
                continue;
            }

            let response = run_provider(provider.as_ref(), &self.mock, image, plant_type).await;
            if !response.mock_response {
                return response;
            }
            warn!(
                "{} failed during automatic selection ({:?}), trying next provider",
                id, response.error
            );
            last_error = response.error.or(last_error);
        }

        info!("No live provider answered, using plant database");
        let mut response =
            run_provider(self.plant_database.as_ref(), &self.mock, image, plant_type).await;
        // Keep the degraded state visible to the caller.
        response.error = last_error;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ProviderError, ProviderErrorKind};
    use crate::services::normalizer::RawDiagnosis;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeProvider {
        id: ProviderId,
        configured: bool,
        outcome: Result<serde_json::Value, ProviderErrorKind>,
    }

    #[async_trait]
    impl DiagnosisProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn request_diagnosis(
            &self,
            _image: &PreparedImage,
            _plant_type: &str,
        ) -> Result<RawDiagnosis, ProviderError> {
            match &self.outcome {
                Ok(value) => Ok(RawDiagnosis::Claude(value.clone())),
                Err(kind) => Err(ProviderError::new(*kind, "simulated")),
            }
        }
    }

    fn image() -> PreparedImage {
        PreparedImage {
            data: vec![1, 2, 3],
            media_type: "image/jpeg".to_string(),
        }
    }

    fn fake(
        id: ProviderId,
        configured: bool,
        outcome: Result<serde_json::Value, ProviderErrorKind>,
    ) -> Arc<dyn DiagnosisProvider> {
        Arc::new(FakeProvider { id, configured, outcome })
    }

    #[test]
    fn selection_defaults_to_plant_database() {
        assert_eq!(
            ProviderSelection::parse(None),
            ProviderSelection::Explicit(ProviderId::PlantDatabase)
        );
        assert_eq!(
            ProviderSelection::parse(Some("  ")),
            ProviderSelection::Explicit(ProviderId::PlantDatabase)
        );
        assert_eq!(
            ProviderSelection::parse(Some("gemini")),
            ProviderSelection::Explicit(ProviderId::PlantDatabase)
        );
        assert_eq!(ProviderSelection::parse(Some("AUTO")), ProviderSelection::Auto);
        assert_eq!(
            ProviderSelection::parse(Some("anthropic")),
            ProviderSelection::Explicit(ProviderId::Claude)
        );
    }

    #[tokio::test]
    async fn unconfigured_provider_returns_mock_without_error() {
        let dispatcher = DiagnosisDispatcher::new(vec![fake(
            ProviderId::Claude,
            false,
            Err(ProviderErrorKind::NetworkError),
        )]);
        let response = dispatcher
            .diagnose(ProviderSelection::Explicit(ProviderId::Claude), &image(), "tomato")
            .await;
        assert!(response.mock_response);
        assert_eq!(response.provider, ProviderId::Claude);
        assert!(response.error.is_none());
        assert!(["Early Blight", "Powdery Mildew"].contains(&response.result.disease.as_str()));
    }

    #[tokio::test]
    async fn failing_provider_returns_mock_with_error_kind() {
        let dispatcher = DiagnosisDispatcher::new(vec![fake(
            ProviderId::OpenAi,
            true,
            Err(ProviderErrorKind::RateLimited),
        )]);
        let response = dispatcher
            .diagnose(ProviderSelection::Explicit(ProviderId::OpenAi), &image(), "grape")
            .await;
        assert!(response.mock_response);
        assert_eq!(response.error, Some(ProviderErrorKind::RateLimited));
    }

    #[tokio::test]
    async fn schema_failure_is_reported_distinctly() {
        let dispatcher = DiagnosisDispatcher::new(vec![fake(
            ProviderId::Claude,
            true,
            Ok(json!({ "verdict": "looks sick" })),
        )]);
        let response = dispatcher
            .diagnose(ProviderSelection::Explicit(ProviderId::Claude), &image(), "grape")
            .await;
        assert!(response.mock_response);
        assert_eq!(response.error, Some(ProviderErrorKind::SchemaValidationFailed));
    }

    #[tokio::test]
    async fn auto_skips_failures_and_unconfigured_providers() {
        let dispatcher = DiagnosisDispatcher::new(vec![
            fake(ProviderId::OpenAi, false, Err(ProviderErrorKind::NetworkError)),
            fake(ProviderId::Claude, true, Err(ProviderErrorKind::InsufficientBalance)),
            fake(
                ProviderId::Perplexity,
                true,
                Ok(json!({ "disease": "Downy Mildew", "confidence": 64 })),
            ),
        ]);
        let response = dispatcher.diagnose(ProviderSelection::Auto, &image(), "grape").await;
        assert!(!response.mock_response);
        assert_eq!(response.provider, ProviderId::Perplexity);
        assert_eq!(response.result.disease, "Downy Mildew");
        assert_eq!(response.result.confidence, 0.64);
        assert_eq!(response.model.as_deref(), Some("fake-model"));
    }

    #[tokio::test]
    async fn auto_without_live_providers_uses_plant_database() {
        let dispatcher = DiagnosisDispatcher::new(vec![]);
        let response = dispatcher.diagnose(ProviderSelection::Auto, &image(), "rose").await;
        assert!(!response.mock_response);
        assert_eq!(response.provider, ProviderId::PlantDatabase);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn auto_fallback_carries_the_last_provider_error() {
        let dispatcher = DiagnosisDispatcher::new(vec![
            fake(ProviderId::OpenAi, true, Err(ProviderErrorKind::RateLimited)),
            fake(ProviderId::Claude, true, Err(ProviderErrorKind::InsufficientBalance)),
            fake(ProviderId::DeepSeek, false, Err(ProviderErrorKind::NetworkError)),
        ]);
        let response = dispatcher.diagnose(ProviderSelection::Auto, &image(), "tomato").await;
        assert_eq!(response.provider, ProviderId::PlantDatabase);
        assert_eq!(response.error, Some(ProviderErrorKind::InsufficientBalance));

        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["error"], "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn only_configured_explicit_providers_need_the_image() {
        let dispatcher = DiagnosisDispatcher::new(vec![
            fake(ProviderId::OpenAi, true, Err(ProviderErrorKind::NetworkError)),
            fake(ProviderId::Claude, false, Err(ProviderErrorKind::NetworkError)),
        ]);
        assert!(dispatcher.requires_image(ProviderSelection::Explicit(ProviderId::OpenAi)));
        assert!(!dispatcher.requires_image(ProviderSelection::Explicit(ProviderId::Claude)));
        assert!(dispatcher.requires_image(ProviderSelection::Explicit(ProviderId::PlantDatabase)));
        assert!(dispatcher.requires_image(ProviderSelection::Auto));
    }

    #[test]
    fn statuses_cover_every_provider() {
        let client = Client::new();
        let config = Config::from_lookup(|_| None);
        let statuses = DiagnosisDispatcher::from_config(client, &config).statuses();
        assert_eq!(statuses.len(), 5);
        assert!(statuses.iter().all(|s| s.configured == (s.id == ProviderId::PlantDatabase)));
    }
}
