// src/services/mod.rs
pub mod dispatch;
pub mod image_processor;
pub mod mock;
pub mod normalizer;
pub mod pesticides;
pub mod providers;
pub mod research;
pub mod spray;
pub mod store;
pub mod weather;

pub use dispatch::{DiagnosisDispatcher, ProviderSelection};
pub use image_processor::{ImageProcessor, PreparedImage};
pub use mock::MockGenerator;
pub use research::ResearchClient;
pub use store::{DiagnosisStore, InMemoryStore, SupabaseStore};
pub use weather::WeatherClient;
