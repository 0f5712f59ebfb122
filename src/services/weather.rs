// src/services/weather.rs
//! OpenWeatherMap daily forecast client.

use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::GardenError;

/// One entry of the One Call `daily` array, metric units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwmDaily {
    #[serde(default)]
    pub dt: i64,
    pub temp: OwmDailyTemp,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    /// Probability of precipitation (0-1).
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub weather: Vec<OwmWeather>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwmDailyTemp {
    pub day: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwmWeather {
    pub main: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct OwmOneCallResponse {
    daily: Vec<OwmDaily>,
}

/// Forecast day in the units the spray scorer works with.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temperature_c: f64,
    pub humidity_percent: f64,
    /// Taken from the forecast as given; the scorer's thresholds apply to it directly.
    pub wind_speed: f64,
    pub rain_probability: f64,
    pub conditions: String,
}

impl From<&OwmDaily> for ForecastDay {
    fn from(day: &OwmDaily) -> Self {
        let conditions = day
            .weather
            .first()
            .map(|w| {
                if w.description.is_empty() {
                    w.main.clone()
                } else {
                    w.description.clone()
                }
            })
            .unwrap_or_else(|| "unknown".to_string());

        ForecastDay {
            date: DateTime::from_timestamp(day.dt, 0)
                .unwrap_or_default()
                .date_naive(),
            temperature_c: day.temp.day,
            humidity_percent: day.humidity,
            wind_speed: day.wind_speed,
            rain_probability: day.pop.clamp(0.0, 1.0),
            conditions,
        }
    }
}

#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the daily forecast (up to 8 days) for a coordinate.
    pub async fn get_daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<ForecastDay>, GardenError> {
        let response = self
            .client
            .get(format!("{}/onecall", self.base_url))
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("exclude", "current,minutely,hourly,alerts".to_string()),
                ("units", "metric".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| GardenError::Weather(format!("Weather API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GardenError::Weather(format!(
                "Weather API error: {} - {}",
                status, body
            )));
        }

        let data: OwmOneCallResponse = response
            .json()
            .await
            .map_err(|e| GardenError::Weather(format!("Failed to parse forecast response: {}", e)))?;

        Ok(data.daily.iter().map(ForecastDay::from).collect())
    }
}
