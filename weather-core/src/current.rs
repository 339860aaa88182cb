//! Current-conditions lookup by city name or coordinates.

use std::sync::Arc;

use crate::{
    config::CredentialProvider,
    error::{Lookup, WeatherError, classify_status},
    http::HttpClient,
    model::{CityName, Coordinates, CurrentConditions, Location},
    provider::{Endpoints, openweather},
};

#[derive(Clone)]
pub struct CurrentConditionsFetcher {
    http: Arc<dyn HttpClient>,
    credentials: Arc<dyn CredentialProvider>,
    endpoints: Endpoints,
}

impl std::fmt::Debug for CurrentConditionsFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentConditionsFetcher")
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl CurrentConditionsFetcher {
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

    pub async fn fetch(&self, location: &Location) -> Result<CurrentConditions, WeatherError> {
        match location {
            Location::City(city) => self.fetch_by_city(city).await,
            Location::Coordinates(coords) => self.fetch_by_coordinates(*coords).await,
        }
    }

    pub async fn fetch_by_city(&self, city: &CityName) -> Result<CurrentConditions, WeatherError> {
        self.request(Lookup::City, city.as_str(), &[("q", city.as_str())])
            .await
    }

    pub async fn fetch_by_coordinates(
        &self,
        coords: Coordinates,
    ) -> Result<CurrentConditions, WeatherError> {
        let lat = coords.latitude.to_string();
        let lon = coords.longitude.to_string();
        self.request(Lookup::Coordinates, "", &[("lat", &lat), ("lon", &lon)])
            .await
    }

    async fn request(
        &self,
        lookup: Lookup,
        label: &str,
        location_params: &[(&str, &str)],
    ) -> Result<CurrentConditions, WeatherError> {
        let api_key = self
            .credentials
            .api_key()
            .ok_or(WeatherError::MissingApiKey)?;

        let mut query = location_params.to_vec();
        query.push(("units", "metric"));
        query.push(("appid", api_key.as_str()));

        let url = self.endpoints.current();
        tracing::debug!(%lookup, label, "requesting current conditions");

        let res = self
            .http
            .get(&url, &query)
            .await
            .map_err(|e| WeatherError::Network {
                lookup,
                reason: e.to_string(),
            })?;

        if let Some(err) = classify_status(res.status, lookup, label, &res.body) {
            tracing::debug!(%lookup, status = res.status, "current conditions request failed");
            return Err(err);
        }

        let conditions = openweather::parse_current(&res.body)?;
        tracing::debug!(
            location = %conditions.display_location(),
            temp = conditions.temperature_c,
            "received current conditions"
        );
        Ok(conditions)
    }
}
