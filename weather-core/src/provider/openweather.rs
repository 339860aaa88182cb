//! OpenWeather 2.5 wire format: `/weather` (current) and `/forecast` (3-hourly, 5 days).

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::WeatherError,
    model::{CurrentConditions, ForecastEntry},
};

const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FORECAST_SUCCESS_MARKER: &str = "200";

/// Endpoint URLs derived from an API root such as
/// `https://api.openweathermap.org/data/2.5`.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url }
    }

    pub fn current(&self) -> String {
        format!("{}/weather", self.base_url)
    }

    pub fn forecast(&self) -> String {
        format!("{}/forecast", self.base_url)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    sys: OwSys,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

/// Only the envelope is typed up front so a bad `cod` or `list` can be
/// reported as such rather than as a generic decode failure.
#[derive(Debug, Deserialize)]
struct OwForecastEnvelope {
    cod: Option<Value>,
    message: Option<Value>,
    list: Option<Value>,
}

pub fn parse_current(body: &str) -> Result<CurrentConditions, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::Schema(format!("current weather JSON: {e}")))?;

    if parsed.main.humidity > 100 {
        return Err(WeatherError::Schema(format!(
            "humidity out of range: {}",
            parsed.main.humidity
        )));
    }

    let weather = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Schema("current weather has no `weather` entries".into()))?;

    Ok(CurrentConditions {
        location_name: parsed.name,
        country_code: parsed.sys.country,
        temperature_c: parsed.main.temp,
        feels_like_c: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed_ms: parsed.wind.speed,
        description: weather.description,
        icon_id: weather.icon,
        observed_at: Utc::now(),
    })
}

/// Validate the forecast envelope and return its raw samples in feed order.
///
/// Samples are left undecoded so that malformed entries the caller never
/// keeps cannot fail the whole forecast. Every failure here is
/// [`WeatherError::ForecastUnavailable`].
pub fn parse_forecast_list(body: &str) -> Result<Vec<Value>, WeatherError> {
    let envelope: OwForecastEnvelope = serde_json::from_str(body)
        .map_err(|e| WeatherError::ForecastUnavailable(format!("forecast JSON: {e}")))?;

    if !is_success_marker(envelope.cod.as_ref()) {
        return Err(WeatherError::ForecastUnavailable(format!(
            "cod={} message={}",
            envelope.cod.unwrap_or(Value::Null),
            envelope.message.unwrap_or(Value::Null),
        )));
    }

    match envelope.list {
        Some(Value::Array(samples)) => Ok(samples),
        other => Err(WeatherError::ForecastUnavailable(format!(
            "`list` is not an array: {}",
            other.unwrap_or(Value::Null)
        ))),
    }
}

/// Calendar date of a raw sample, read from its `dt_txt` alone.
pub fn sample_date(sample: &Value) -> Result<NaiveDate, WeatherError> {
    let dt_txt = sample
        .get("dt_txt")
        .and_then(Value::as_str)
        .ok_or_else(|| WeatherError::ForecastUnavailable("sample has no `dt_txt`".into()))?;
    Ok(parse_dt_txt(dt_txt)?.date())
}

/// Fully decode a raw sample.
pub fn decode_sample(sample: Value) -> Result<ForecastEntry, WeatherError> {
    let raw: OwForecastEntry = serde_json::from_value(sample)
        .map_err(|e| WeatherError::ForecastUnavailable(format!("forecast entry: {e}")))?;

    let timestamp = parse_dt_txt(&raw.dt_txt)?;
    let weather = raw.weather.into_iter().next().ok_or_else(|| {
        WeatherError::ForecastUnavailable(format!("entry {} has no weather", raw.dt_txt))
    })?;

    Ok(ForecastEntry {
        timestamp,
        temperature_c: raw.main.temp,
        description: weather.description,
        icon_id: weather.icon,
    })
}

// The upstream always sends `cod` as the string "200"; a numeric 200 is
// accepted as well.
fn is_success_marker(cod: Option<&Value>) -> bool {
    match cod {
        Some(Value::String(s)) => s == FORECAST_SUCCESS_MARKER,
        Some(Value::Number(n)) => n.as_u64() == Some(200),
        _ => false,
    }
}

fn parse_dt_txt(dt_txt: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(dt_txt, DT_TXT_FORMAT)
        .map_err(|e| WeatherError::ForecastUnavailable(format!("bad dt_txt {dt_txt:?}: {e}")))
}
