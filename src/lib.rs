// src/lib.rs
use log::info;
use reqwest::Client;
use std::sync::Arc;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;

use crate::config::Config;
use crate::errors::GardenError;
use crate::services::{
    DiagnosisDispatcher, DiagnosisStore, ImageProcessor, InMemoryStore, ResearchClient,
    SupabaseStore, WeatherClient,
};

pub use handlers::configure;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<DiagnosisDispatcher>,
    pub image_processor: Arc<ImageProcessor>,
    pub store: Arc<dyn DiagnosisStore>,
    pub weather: Option<Arc<WeatherClient>>,
    pub research: Arc<ResearchClient>,
}

impl AppState {
    /// Wire every service from configuration, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self, GardenError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| GardenError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let store: Arc<dyn DiagnosisStore> = match &config.supabase {
            Some(supabase) => {
                info!("Persisting diagnoses to Supabase at {}", supabase.url);
                Arc::new(SupabaseStore::new(client.clone(), supabase))
            }
            None => {
                info!("Supabase not configured, keeping diagnoses in memory");
                Arc::new(InMemoryStore::new())
            }
        };

        let weather = config.weather_api_key.as_ref().map(|key| {
            Arc::new(WeatherClient::new(
                client.clone(),
                key.clone(),
                config.weather_base_url.clone(),
            ))
        });

        Ok(Self {
            dispatcher: Arc::new(DiagnosisDispatcher::from_config(client.clone(), config)),
            image_processor: Arc::new(ImageProcessor::new()),
            store,
            weather,
            research: Arc::new(ResearchClient::from_config(client, config)),
        })
    }

    /// Replace the store, e.g. with a fake in tests.
    pub fn with_store(mut self, store: Arc<dyn DiagnosisStore>) -> Self {
        self.store = store;
        self
    }
}
