// src/handlers.rs
use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use bytes::Bytes;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::errors::GardenError;
use crate::models::{DiagnoseRequest, DiagnosisRecord, DiagnosisResponse, DiagnosisSummary};
use crate::services::PreparedImage;
use crate::services::dispatch::ProviderSelection;
use crate::services::weather::{ForecastDay, OwmDaily};
use crate::services::{pesticides, spray};

const WEATHER_NOT_CONFIGURED: &str = "WEATHER_NOT_CONFIGURED";

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Fixed paths are unguarded resources so a wrong method answers 405
    // instead of falling through to the provider route.
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .service(web::resource("/providers").route(web::get().to(list_providers)))
            .service(web::resource("/diagnose").route(web::post().to(diagnose_upload)))
            .service(web::resource("/diagnoses").route(web::get().to(list_diagnoses)))
            .service(web::resource("/spray-calendar").route(web::post().to(spray_calendar)))
            .service(web::resource("/pesticides").route(web::get().to(find_pesticides)))
            .service(
                web::resource("/pesticides/research").route(web::get().to(research_pesticides)),
            )
            .route("/{provider}", web::post().to(diagnose_with_provider)),
    );
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "garden-buddy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn list_providers(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "providers": data.dispatcher.statuses()
    }))
}

pub async fn diagnose_with_provider(
    path: web::Path<String>,
    body: web::Json<DiagnoseRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let provider = path.into_inner();
    let request = body.into_inner();

    let selection = ProviderSelection::parse(Some(&provider));
    let image = usable_image(
        &data,
        selection,
        data.image_processor.prepare_base64(&request.image),
    )?;
    let response = diagnose_and_store(
        &data,
        selection,
        image,
        request.plant_type.unwrap_or_default(),
        request.user_id,
    )
    .await;

    Ok(HttpResponse::Ok().json(&response))
}

/// Multipart form: an `image` file plus optional `plantType`, `provider`
/// and `userId` text fields.
pub async fn diagnose_upload(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let mut image_data = Vec::new();
    let mut plant_type = String::new();
    let mut provider = None;
    let mut user_id = None;

    while let Some(mut field) = payload.try_next().await? {
        let name = field
            .content_disposition()
            .get_name()
            .unwrap_or_default()
            .to_string();

        let mut value = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            value.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "image" | "file" => image_data = value,
            "plantType" | "plant_type" => plant_type = String::from_utf8_lossy(&value).into_owned(),
            "provider" => provider = Some(String::from_utf8_lossy(&value).into_owned()),
            "userId" | "user_id" => user_id = Some(String::from_utf8_lossy(&value).into_owned()),
            other => warn!("Ignoring unexpected form field '{}'", other),
        }
    }

    let selection = ProviderSelection::parse(provider.as_deref());
    let image = usable_image(&data, selection, data.image_processor.prepare(image_data))?;
    let response = diagnose_and_store(
        &data,
        selection,
        image,
        plant_type,
        user_id.filter(|u| !u.trim().is_empty()),
    )
    .await;

    Ok(HttpResponse::Ok().json(&response))
}

/// A provider without credentials answers with a mock and never reads the
/// image, so a missing or broken upload only fails for providers that do.
fn usable_image(
    data: &AppState,
    selection: ProviderSelection,
    prepared: Result<PreparedImage, GardenError>,
) -> Result<PreparedImage, GardenError> {
    match prepared {
        Ok(image) => Ok(image),
        Err(e) if !data.dispatcher.requires_image(selection) => {
            warn!("Ignoring unusable image for unconfigured provider: {}", e);
            Ok(PreparedImage::default())
        }
        Err(e) => Err(e),
    }
}

async fn diagnose_and_store(
    data: &AppState,
    selection: ProviderSelection,
    image: PreparedImage,
    plant_type: String,
    user_id: Option<String>,
) -> DiagnosisResponse {
    let mut response = data
        .dispatcher
        .diagnose(selection, &image, &plant_type)
        .await;

    let record_id = Uuid::new_v4();
    let created_at = Utc::now();
    let path = format!(
        "{}/{}-{}.{}",
        user_id.as_deref().unwrap_or("anonymous"),
        created_at.timestamp_millis(),
        record_id,
        image.extension()
    );

    // Persistence is best-effort; the diagnosis is returned either way.
    let image_url = if image.data.is_empty() {
        None
    } else {
        match data
            .store
            .upload_image(&path, Bytes::from(image.data), &image.media_type)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Image upload failed for {}: {}", path, e);
                None
            }
        }
    };

    let record = DiagnosisRecord {
        id: record_id,
        user_id,
        plant_type,
        provider: response.provider,
        image_url: image_url.clone(),
        mock_response: response.mock_response,
        error: response.error,
        result: response.result.clone(),
        created_at,
    };

    match data.store.insert_diagnosis(&record).await {
        Ok(()) => {
            info!("Saved diagnosis {} from {}", record_id, response.provider);
            response.record_id = Some(record_id);
        }
        Err(e) => warn!("Failed to save diagnosis {}: {}", record_id, e),
    }
    response.image_url = image_url;

    response
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosesQuery {
    #[serde(default, alias = "user_id")]
    pub user_id: Option<String>,
}

pub async fn list_diagnoses(
    query: web::Query<DiagnosesQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user_id = query.user_id.as_deref().filter(|u| !u.trim().is_empty());
    let records: Vec<DiagnosisSummary> = data
        .store
        .list_diagnoses(user_id)
        .await?
        .into_iter()
        .map(DiagnosisSummary::from)
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "diagnoses": records,
        "count": records.len()
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprayCalendarRequest {
    #[serde(alias = "crop")]
    pub crop_type: String,
    /// Raw OpenWeatherMap daily entries; skips the weather lookup.
    #[serde(default)]
    pub forecast: Option<Vec<OwmDaily>>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    pub lon: Option<f64>,
}

pub async fn spray_calendar(
    body: web::Json<SprayCalendarRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let request = body.into_inner();

    let days: Vec<ForecastDay> = match (request.forecast, request.lat, request.lon) {
        (Some(forecast), _, _) => forecast.iter().map(ForecastDay::from).collect(),
        (None, Some(lat), Some(lon)) => match &data.weather {
            Some(weather) => weather.get_daily_forecast(lat, lon).await?,
            None => {
                warn!("Spray calendar requested but weather API key is not configured");
                return Ok(HttpResponse::Ok().json(serde_json::json!({
                    "cropType": request.crop_type,
                    "days": [],
                    "code": WEATHER_NOT_CONFIGURED,
                    "message": "Weather forecast is not configured on this server"
                })));
            }
        },
        _ => {
            return Err(GardenError::Validation(
                "Provide either a forecast or lat and lon".to_string(),
            )
            .into());
        }
    };

    let calendar = spray::build_calendar(&days, &request.crop_type);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cropType": request.crop_type,
        "idealTemperature": spray::ideal_temperature(&request.crop_type),
        "days": calendar
    })))
}

#[derive(Debug, Deserialize)]
pub struct PesticideQuery {
    pub disease: Option<String>,
    pub crop: Option<String>,
}

pub async fn find_pesticides(query: web::Query<PesticideQuery>) -> HttpResponse {
    let dosages = pesticides::find_dosages(query.disease.as_deref(), query.crop.as_deref());

    HttpResponse::Ok().json(serde_json::json!({
        "dosages": dosages,
        "count": dosages.len()
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResearchQuery {
    #[serde(default, alias = "query")]
    pub q: String,
}

pub async fn research_pesticides(
    query: web::Query<ResearchQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if query.q.trim().is_empty() {
        return Err(GardenError::Validation("Query parameter 'q' is required".to_string()).into());
    }

    let report = data.research.search(&query.q).await;
    Ok(HttpResponse::Ok().json(&report))
}
