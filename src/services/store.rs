// src/services/store.rs
//! Diagnosis persistence: Supabase (PostgREST + Storage) or in-memory.

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::{Client, RequestBuilder};
use std::sync::RwLock;

use crate::config::SupabaseConfig;
use crate::errors::GardenError;
use crate::models::DiagnosisRecord;

const DIAGNOSES_TABLE: &str = "diagnoses";
const LIST_LIMIT: usize = 100;

#[async_trait]
pub trait DiagnosisStore: Send + Sync {
    async fn insert_diagnosis(&self, record: &DiagnosisRecord) -> Result<(), GardenError>;

    /// Newest first. `None` lists every user's records.
    async fn list_diagnoses(&self, user_id: Option<&str>) -> Result<Vec<DiagnosisRecord>, GardenError>;

    /// Store the image and return its public URL.
    async fn upload_image(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, GardenError>;

    fn public_url(&self, path: &str) -> String;
}

#[derive(Clone)]
pub struct SupabaseStore {
    client: Client,
    url: String,
    key: String,
    bucket: String,
}

impl SupabaseStore {
    pub fn new(client: Client, config: &SupabaseConfig) -> Self {
        Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            bucket: config.bucket.clone(),
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, DIAGNOSES_TABLE)
    }
}

#[async_trait]
impl DiagnosisStore for SupabaseStore {
    async fn insert_diagnosis(&self, record: &DiagnosisRecord) -> Result<(), GardenError> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| GardenError::Storage(format!("Supabase insert failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GardenError::Storage(format!(
                "Supabase insert error: {} - {}",
                status, body
            )));
        }

        debug!("Stored diagnosis {}", record.id);
        Ok(())
    }

    async fn list_diagnoses(&self, user_id: Option<&str>) -> Result<Vec<DiagnosisRecord>, GardenError> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", LIST_LIMIT.to_string()),
        ];
        if let Some(user_id) = user_id {
            query.push(("user_id", format!("eq.{}", user_id)));
        }

        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&query)
            .send()
            .await
            .map_err(|e| GardenError::Storage(format!("Supabase query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GardenError::Storage(format!(
                "Supabase query error: {} - {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GardenError::Serialization(format!("Failed to parse diagnoses: {}", e)))
    }

    async fn upload_image(
        &self,
        path: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, GardenError> {
        let response = self
            .authorized(self.client.post(format!(
                "{}/storage/v1/object/{}/{}",
                self.url, self.bucket, path
            )))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| GardenError::Storage(format!("Supabase upload failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GardenError::Storage(format!(
                "Supabase upload error: {} - {}",
                status, body
            )));
        }

        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url, self.bucket, path
        )
    }
}

/// Process-local store used when Supabase is not configured.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Vec<DiagnosisRecord>>,
    images: RwLock<Vec<(String, Bytes)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> GardenError {
    GardenError::Storage("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl DiagnosisStore for InMemoryStore {
    async fn insert_diagnosis(&self, record: &DiagnosisRecord) -> Result<(), GardenError> {
        self.records.write().map_err(poisoned)?.push(record.clone());
        Ok(())
    }

    async fn list_diagnoses(&self, user_id: Option<&str>) -> Result<Vec<DiagnosisRecord>, GardenError> {
        let mut records: Vec<DiagnosisRecord> = self
            .records
            .read()
            .map_err(poisoned)?
            .iter()
            .filter(|r| user_id.is_none() || r.user_id.as_deref() == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(LIST_LIMIT);
        Ok(records)
    }

    async fn upload_image(
        &self,
        path: &str,
        data: Bytes,
        _content_type: &str,
    ) -> Result<String, GardenError> {
        let mut images = self.images.write().map_err(poisoned)?;
        images.retain(|(p, _)| p != path);
        images.push((path.to_string(), data));
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}
