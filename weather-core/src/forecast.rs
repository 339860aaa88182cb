//! Five-day forecast: fetch the 3-hourly feed and collapse it to one entry per day.

use std::{collections::HashSet, convert::Infallible, sync::Arc};

use chrono::NaiveDate;

use crate::{
    config::CredentialProvider,
    error::WeatherError,
    http::HttpClient,
    model::{CityName, DailyForecast, ForecastEntry},
    provider::{Endpoints, openweather},
};

pub const MAX_FORECAST_DAYS: usize = 5;

/// Keep the first item seen for each calendar date, in feed order, stopping
/// after [`MAX_FORECAST_DAYS`] dates. Items after that are never inspected.
///
/// The kept sample is whatever time of day came first for that date (often a
/// late-evening slot for "today"), not a midday reading.
pub fn first_per_day<T, E, I, F>(items: I, mut day_of: F) -> Result<Vec<T>, E>
where
    I: IntoIterator<Item = T>,
    F: FnMut(&T) -> Result<NaiveDate, E>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(MAX_FORECAST_DAYS);

    for item in items {
        if kept.len() == MAX_FORECAST_DAYS {
            break;
        }
        if seen.insert(day_of(&item)?) {
            kept.push(item);
        }
    }

    Ok(kept)
}

/// [`first_per_day`] over decoded entries.
pub fn aggregate_daily<I>(entries: I) -> Vec<DailyForecast>
where
    I: IntoIterator<Item = ForecastEntry>,
{
    let Ok(kept) = first_per_day(entries, |e| Ok::<_, Infallible>(e.timestamp.date()));
    kept.into_iter().map(DailyForecast::from_entry).collect()
}

#[derive(Clone)]
pub struct ForecastAggregator {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialProvider>,
    endpoints: Endpoints,
}

impl std::fmt::Debug for ForecastAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastAggregator")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl ForecastAggregator {
    pub fn new(
        http: Arc<dyn HttpClient>,
        credentials: Arc<dyn CredentialProvider>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            http,
            credentials,
            endpoints,
        }
    }

    /// Forecast for `city`, or an empty list if it could not be obtained.
    /// Failures are logged, never returned.
    pub async fn fetch_five_day_forecast(&self, city: &CityName) -> Vec<DailyForecast> {
        match self.try_fetch_five_day_forecast(city).await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "forecast unavailable");
                Vec::new()
            }
        }
    }

    /// Like [`Self::fetch_five_day_forecast`] but reports why nothing came back.
    /// Every error is [`WeatherError::ForecastUnavailable`].
    pub async fn try_fetch_five_day_forecast(
        &self,
        city: &CityName,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        let api_key = self.credentials.api_key().ok_or_else(|| {
            WeatherError::ForecastUnavailable("no API key configured".to_string())
        })?;

        let url = self.endpoints.forecast();
        tracing::debug!(city = %city, "requesting forecast");

        let query = [
            ("q", city.as_str()),
            ("units", "metric"),
            ("appid", api_key.as_str()),
        ];
        let res = self
            .http
            .get(&url, &query)
            .await
            .map_err(|e| WeatherError::ForecastUnavailable(format!("transport: {e}")))?;

        // HTTP status is not checked on its own: error bodies carry a non-200 `cod`.
        let samples = openweather::parse_forecast_list(&res.body)?;
        let days = first_per_day(samples, openweather::sample_date)?
            .into_iter()
            .map(|sample| openweather::decode_sample(sample).map(DailyForecast::from_entry))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(city = %city, days = days.len(), "forecast aggregated");
        Ok(days)
    }
}
