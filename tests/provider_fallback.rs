use actix_web::{App, HttpResponse, HttpServer, web};
use reqwest::Client;
use serde_json::json;

use garden_buddy::config::ProviderConfig;
use garden_buddy::errors::ProviderErrorKind;
use garden_buddy::models::ProviderId;
use garden_buddy::services::MockGenerator;
use garden_buddy::services::image_processor::PreparedImage;
use garden_buddy::services::providers::{
    ClaudeProvider, DeepSeekProvider, OpenAiProvider, PerplexityProvider, run_provider,
};

const CATALOGUE: [&str; 2] = ["Early Blight", "Powdery Mildew"];

fn leaf() -> PreparedImage {
    PreparedImage {
        data: b"not really a jpeg".to_vec(),
        media_type: "image/jpeg".to_string(),
    }
}

/// Serve `body` with `status` for every request on a random local port.
fn fake_api(status: u16, body: serde_json::Value) -> String {
    let server = HttpServer::new(move || {
        let body = body.clone();
        App::new().default_service(web::to(move || {
            let body = body.clone();
            async move {
                HttpResponse::build(actix_web::http::StatusCode::from_u16(status).unwrap())
                    .json(body)
            }
        }))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    })
}

#[actix_web::test]
async fn unconfigured_claude_returns_catalogued_mock() {
    // Nothing listens on the discard port; a network attempt would surface as NETWORK_ERROR.
    let config = ProviderConfig::new(None, "http://127.0.0.1:9", "claude-test");
    let provider = ClaudeProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "tomato").await;

    assert!(response.mock_response);
    assert_eq!(response.provider, ProviderId::Claude);
    assert!(response.error.is_none());
    assert!(CATALOGUE.contains(&response.result.disease.as_str()));
}

#[actix_web::test]
async fn placeholder_key_counts_as_missing() {
    let config = ProviderConfig::new(
        Some("your_openai_api_key_here".to_string()),
        "http://127.0.0.1:9",
        "gpt-test",
    );
    let provider = OpenAiProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "grape").await;

    assert!(response.mock_response);
    assert!(response.error.is_none());
}

#[actix_web::test]
async fn claude_402_reports_insufficient_balance_with_full_mock() {
    let base_url = fake_api(
        402,
        json!({ "type": "error", "error": { "type": "billing_error", "message": "Payment required" } }),
    );
    let config = ProviderConfig::new(Some("sk-ant-test-key".to_string()), &base_url, "claude-test");
    let provider = ClaudeProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "tomato").await;

    assert!(response.mock_response);
    assert_eq!(response.error, Some(ProviderErrorKind::InsufficientBalance));
    let result = &response.result;
    assert!(CATALOGUE.contains(&result.disease.as_str()));
    assert!(!result.description.is_empty());
    assert!(!result.symptoms.is_empty());
    assert!(!result.organic_treatments.is_empty());
    assert!(!result.chemical_treatments.is_empty());
    assert!(!result.preventive_measures.is_empty());

    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["error"], "INSUFFICIENT_BALANCE");
    assert_eq!(wire["mockResponse"], true);
}

#[actix_web::test]
async fn status_codes_map_to_error_kinds() {
    let cases = [
        (401, ProviderErrorKind::InvalidApiKey),
        (429, ProviderErrorKind::RateLimited),
        (503, ProviderErrorKind::ProviderError),
    ];
    for (status, expected) in cases {
        let base_url = fake_api(status, json!({ "error": { "message": "nope" } }));
        let config = ProviderConfig::new(Some("sk-test-key".to_string()), &base_url, "gpt-test");
        let provider = OpenAiProvider::new(Client::new(), config);

        let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "rose").await;
        assert!(response.mock_response);
        assert_eq!(response.error, Some(expected), "status {}", status);
    }
}

#[actix_web::test]
async fn openai_prose_wrapped_json_is_normalized() {
    let content = "Sure! Here is the diagnosis:\n```json\n{\"diseaseName\": \"Late Blight\", \"confidence\": 85, \"severity\": \"severe\", \"symptoms\": [\"Water-soaked lesions\"]}\n```";
    let base_url = fake_api(200, chat_completion(content));
    let config = ProviderConfig::new(Some("sk-test-key".to_string()), &base_url, "gpt-test");
    let provider = OpenAiProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "potato").await;

    assert!(!response.mock_response);
    assert_eq!(response.model.as_deref(), Some("gpt-test"));
    assert_eq!(response.result.disease, "Late Blight");
    assert_eq!(response.result.confidence, 0.85);
    assert_eq!(response.result.symptoms, vec!["Water-soaked lesions"]);
}

#[actix_web::test]
async fn perplexity_snake_case_contract_is_normalized() {
    let content = r#"{"disease_name": "Downy Mildew", "confidence": 0.7, "organic_treatments": ["Copper spray"]}"#;
    let base_url = fake_api(200, chat_completion(content));
    let config = ProviderConfig::new(Some("pplx-test-key".to_string()), &base_url, "sonar-test");
    let provider = PerplexityProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "grape").await;

    assert!(!response.mock_response);
    assert_eq!(response.provider, ProviderId::Perplexity);
    assert_eq!(response.result.disease, "Downy Mildew");
    assert_eq!(response.result.organic_treatments, vec!["Copper spray"]);
}

#[actix_web::test]
async fn schema_mismatch_is_flagged() {
    // A camelCase `disease` key is not part of the OpenAI contract.
    let content = r#"{"disease": "Rust", "confidence": 0.5}"#;
    let base_url = fake_api(200, chat_completion(content));
    let config = ProviderConfig::new(Some("sk-test-key".to_string()), &base_url, "gpt-test");
    let provider = OpenAiProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "corn").await;

    assert!(response.mock_response);
    assert_eq!(response.error, Some(ProviderErrorKind::SchemaValidationFailed));
}

#[actix_web::test]
async fn non_json_answer_is_invalid_response() {
    let base_url = fake_api(200, chat_completion("I am not able to see the image."));
    let config = ProviderConfig::new(Some("sk-ds-test".to_string()), &base_url, "deepseek-test");
    let provider = DeepSeekProvider::new(Client::new(), config);

    let response = run_provider(&provider, &MockGenerator::new(), &leaf(), "lettuce").await;

    assert!(response.mock_response);
    assert_eq!(response.error, Some(ProviderErrorKind::InvalidResponse));
}
