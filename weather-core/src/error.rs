//! Error taxonomy for weather lookups.

use std::fmt;

use thiserror::Error;

/// Which request flow produced an error. Some categories read differently
/// to the user depending on whether a city or coordinates were looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    City,
    Coordinates,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::City => f.write_str("city"),
            Lookup::Coordinates => f.write_str("coordinates"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    /// Input rejected before any network call.
    #[error("invalid input: {0}")]
    LocalValidation(String),

    #[error("no OpenWeather API key configured")]
    MissingApiKey,

    #[error("network error during {lookup} lookup: {reason}")]
    Network { lookup: Lookup, reason: String },

    #[error("city not found: {0}")]
    CityNotFound(String),

    #[error("OpenWeather rejected the API key (status 401)")]
    Authentication,

    #[error("OpenWeather {lookup} request failed with status {status}: {body}")]
    Upstream {
        lookup: Lookup,
        status: u16,
        body: String,
    },

    #[error("unexpected response shape: {0}")]
    Schema(String),

    /// Forecast-only; never shown to the end user.
    #[error("forecast unavailable: {0}")]
    ForecastUnavailable(String),

    #[error("geolocation failed: {0}")]
    Geolocation(String),
}

impl WeatherError {
    /// Human-readable message for the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::LocalValidation(msg) => msg.clone(),
            Self::MissingApiKey => "No API key configured.\n\
                 Hint: run `weather configure` and enter your OpenWeather API key."
                .to_string(),
            Self::Network {
                lookup: Lookup::City,
                ..
            } => "Network error. Please check your internet connection.".to_string(),
            Self::Network {
                lookup: Lookup::Coordinates,
                ..
            } => "Network error while fetching location weather.".to_string(),
            Self::CityNotFound(_) => "City not found! Please check the spelling.".to_string(),
            Self::Authentication => {
                "API key issue. Please check your OpenWeather API key.".to_string()
            }
            Self::Upstream {
                lookup: Lookup::City,
                ..
            } => "Failed to fetch weather data.".to_string(),
            Self::Upstream {
                lookup: Lookup::Coordinates,
                ..
            } => "Failed to fetch weather for your location.".to_string(),
            Self::Schema(_) => {
                "Received an unexpected response from the weather service.".to_string()
            }
            Self::ForecastUnavailable(_) => "Forecast unavailable.".to_string(),
            Self::Geolocation(_) => {
                "Unable to get your location. Please allow location access.".to_string()
            }
        }
    }

    /// True for errors raised before anything was sent upstream.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalValidation(_) | Self::MissingApiKey)
    }
}

/// Map a non-success HTTP status from the current-weather endpoint to an error.
/// Returns `None` for 2xx.
pub fn classify_status(
    status: u16,
    lookup: Lookup,
    query: &str,
    body: &str,
) -> Option<WeatherError> {
    match status {
        200..=299 => None,
        404 if lookup == Lookup::City => Some(WeatherError::CityNotFound(query.to_string())),
        401 => Some(WeatherError::Authentication),
        _ => Some(WeatherError::Upstream {
            lookup,
            status,
            body: truncate_body(body),
        }),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
