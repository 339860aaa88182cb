use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

pub const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// A city name that is non-empty after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CityName(String);

impl CityName {
    pub fn parse(raw: &str) -> Result<Self, WeatherError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::LocalValidation(
                "Please enter a city name.".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latitude/longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::LocalValidation(format!(
                "Latitude must be between -90 and 90 degrees, got {latitude}."
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::LocalValidation(format!(
                "Longitude must be between -180 and 180 degrees, got {longitude}."
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(CityName),
    Coordinates(Coordinates),
}

/// Current conditions as reported by the current-weather endpoint.
///
/// Equality ignores `observed_at`, which is stamped from the local clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub country_code: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub wind_speed_ms: f64,
    pub description: String,
    pub icon_id: String,
    pub observed_at: DateTime<Utc>,
}

impl PartialEq for CurrentConditions {
    fn eq(&self, other: &Self) -> bool {
        self.location_name == other.location_name
            && self.country_code == other.country_code
            && self.temperature_c == other.temperature_c
            && self.feels_like_c == other.feels_like_c
            && self.humidity_pct == other.humidity_pct
            && self.wind_speed_ms == other.wind_speed_ms
            && self.description == other.description
            && self.icon_id == other.icon_id
    }
}

impl CurrentConditions {
    /// "Paris, FR", or just the name when the country is unknown.
    pub fn display_location(&self) -> String {
        if self.country_code.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.country_code)
        }
    }

    pub fn icon_url(&self) -> String {
        icon_url(&self.icon_id, IconSize::Large)
    }
}

/// One 3-hour sample from the forecast feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub description: String,
    pub icon_id: String,
}

/// One representative sample per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub day_label: String,
    pub temperature_c: f64,
    pub description: String,
    pub icon_id: String,
}

impl DailyForecast {
    pub fn from_entry(entry: ForecastEntry) -> Self {
        let date = entry.timestamp.date();
        Self {
            date,
            day_label: date.format("%a").to_string(),
            temperature_c: entry.temperature_c,
            description: entry.description,
            icon_id: entry.icon_id,
        }
    }

    pub fn icon_url(&self) -> String {
        icon_url(&self.icon_id, IconSize::Small)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    /// 50x50
    Small,
    /// 100x100
    Large,
}

pub fn icon_url(icon_id: &str, size: IconSize) -> String {
    match size {
        IconSize::Small => format!("{ICON_BASE_URL}/{icon_id}.png"),
        IconSize::Large => format!("{ICON_BASE_URL}/{icon_id}@2x.png"),
    }
}

/// Round to the nearest whole degree, halves rounding up (-2.5 -> -2).
pub fn round_temperature(celsius: f64) -> i64 {
    (celsius + 0.5).floor() as i64
}
