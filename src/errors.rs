// src/errors.rs
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GardenError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Weather service error: {0}")]
    Weather(String),

    #[error("Research source error: {0}")]
    Research(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResponseError for GardenError {
    fn error_response(&self) -> HttpResponse {
        match self {
            GardenError::Storage(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Storage error",
                "message": self.to_string()
            })),
            GardenError::Weather(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "error": "Weather service error",
                "message": self.to_string()
            })),
            GardenError::Research(_) => HttpResponse::BadGateway().json(serde_json::json!({
                "error": "Research source error",
                "message": self.to_string()
            })),
            GardenError::ImageProcessing(_) => {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": "Image processing error",
                    "message": self.to_string()
                }))
            }
            GardenError::Serialization(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Data processing error",
                    "message": self.to_string()
                }))
            }
            GardenError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Validation error",
                "message": self.to_string()
            })),
            GardenError::Configuration(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Configuration error",
                    "message": self.to_string()
                }))
            }
        }
    }
}

/// Coarse classification of a failed provider call. Serialized as the
/// stable code the UI keys its degraded-state banner on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderErrorKind {
    InvalidApiKey,
    InsufficientBalance,
    RateLimited,
    ProviderError,
    NetworkError,
    InvalidResponse,
    SchemaValidationFailed,
}

impl ProviderErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ProviderErrorKind::InvalidApiKey => "INVALID_API_KEY",
            ProviderErrorKind::InsufficientBalance => "INSUFFICIENT_BALANCE",
            ProviderErrorKind::RateLimited => "RATE_LIMITED",
            ProviderErrorKind::ProviderError => "PROVIDER_ERROR",
            ProviderErrorKind::NetworkError => "NETWORK_ERROR",
            ProviderErrorKind::InvalidResponse => "INVALID_RESPONSE",
            ProviderErrorKind::SchemaValidationFailed => "SCHEMA_VALIDATION_FAILED",
        }
    }

    /// Map a non-2xx provider status (and its body) to an error kind.
    ///
    /// Anthropic reports an exhausted balance as a 400 whose message
    /// mentions the credit balance, so the body is consulted too.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => ProviderErrorKind::InvalidApiKey,
            402 => ProviderErrorKind::InsufficientBalance,
            429 => ProviderErrorKind::RateLimited,
            _ if body.to_lowercase().contains("credit balance")
                || body.to_lowercase().contains("insufficient balance") =>
            {
                ProviderErrorKind::InsufficientBalance
            }
            _ => ProviderErrorKind::ProviderError,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_coarse_kinds() {
        assert_eq!(
            ProviderErrorKind::from_status(401, ""),
            ProviderErrorKind::InvalidApiKey
        );
        assert_eq!(
            ProviderErrorKind::from_status(403, ""),
            ProviderErrorKind::InvalidApiKey
        );
        assert_eq!(
            ProviderErrorKind::from_status(402, ""),
            ProviderErrorKind::InsufficientBalance
        );
        assert_eq!(
            ProviderErrorKind::from_status(429, ""),
            ProviderErrorKind::RateLimited
        );
        assert_eq!(
            ProviderErrorKind::from_status(500, "upstream exploded"),
            ProviderErrorKind::ProviderError
        );
    }

    #[test]
    fn anthropic_low_credit_is_insufficient_balance() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"Your credit balance is too low to access the Anthropic API."}}"#;
        assert_eq!(
            ProviderErrorKind::from_status(400, body),
            ProviderErrorKind::InsufficientBalance
        );
    }

    #[test]
    fn kinds_serialize_as_wire_codes() {
        let json = serde_json::to_string(&ProviderErrorKind::SchemaValidationFailed).unwrap();
        assert_eq!(json, "\"SCHEMA_VALIDATION_FAILED\"");
        assert_eq!(
            ProviderErrorKind::InsufficientBalance.to_string(),
            "INSUFFICIENT_BALANCE"
        );
    }
}
