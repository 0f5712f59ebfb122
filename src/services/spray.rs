// src/services/spray.rs
//! Per-day spray suitability scoring.

use crate::models::{BestTime, SprayDay};
use crate::services::weather::ForecastDay;

const DEFAULT_IDEAL_TEMP_C: f64 = 20.0;

/// Crop keyword → ideal application temperature in °C.
const IDEAL_TEMPERATURES: &[(&str, f64)] = &[
    ("tomato", 22.0),
    ("pepper", 24.0),
    ("cucumber", 24.0),
    ("corn", 25.0),
    ("grape", 18.0),
    ("apple", 18.0),
    ("potato", 16.0),
    ("wheat", 15.0),
    ("lettuce", 15.0),
    ("strawberry", 20.0),
    ("rose", 20.0),
];

pub fn ideal_temperature(crop: &str) -> f64 {
    let crop = crop.trim().to_lowercase();
    IDEAL_TEMPERATURES
        .iter()
        .find(|(name, _)| crop.contains(name))
        .map(|(_, temp)| *temp)
        .unwrap_or(DEFAULT_IDEAL_TEMP_C)
}

/// Score one forecast day from 0 (do not spray) to 100 (ideal).
pub fn score_day(day: &ForecastDay, crop: &str) -> SprayDay {
    let mut score: i32 = 100;
    let mut reasons = Vec::new();

    if day.wind_speed > 20.0 {
        score -= 50;
        reasons.push(format!(
            "Strong wind ({:.0}) will cause spray drift",
            day.wind_speed
        ));
    } else if day.wind_speed > 10.0 {
        score -= 20;
        reasons.push(format!(
            "Moderate wind ({:.0}) may cause some drift",
            day.wind_speed
        ));
    }

    let rain_percent = day.rain_probability * 100.0;
    if day.rain_probability > 0.5 {
        score -= 50;
        reasons.push(format!(
            "High chance of rain ({:.0}%) will wash off the spray",
            rain_percent
        ));
    } else if day.rain_probability > 0.2 {
        score -= 20;
        reasons.push(format!("Some chance of rain ({:.0}%)", rain_percent));
    }

    let ideal = ideal_temperature(crop);
    let temp_diff = (day.temperature_c - ideal).abs();
    if temp_diff > 10.0 {
        score -= 30;
        reasons.push(format!(
            "Temperature {:.0}°C is far from the {:.0}°C ideal",
            day.temperature_c, ideal
        ));
    } else if temp_diff > 5.0 {
        score -= 10;
        reasons.push(format!(
            "Temperature {:.0}°C is somewhat off the {:.0}°C ideal",
            day.temperature_c, ideal
        ));
    }

    if reasons.is_empty() {
        reasons.push("Good spraying conditions".to_string());
    }

    // Dry air evaporates droplets; spray once it cools in the evening.
    let best_time_of_day = if day.humidity_percent < 40.0 {
        BestTime::Evening
    } else {
        BestTime::Morning
    };

    SprayDay {
        date: day.date,
        score: score.clamp(0, 100),
        reasons,
        best_time_of_day,
        conditions: day.conditions.clone(),
        temperature: day.temperature_c,
        wind_speed: day.wind_speed,
        rain_probability: day.rain_probability,
    }
}

/// Score every day, ordered by date.
pub fn build_calendar(days: &[ForecastDay], crop: &str) -> Vec<SprayDay> {
    let mut calendar: Vec<SprayDay> = days.iter().map(|d| score_day(d, crop)).collect();
    calendar.sort_by_key(|d| d.date);
    calendar
}
