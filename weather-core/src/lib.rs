//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - An HTTP seam over which OpenWeather is queried
//! - The current-conditions fetcher and the five-day forecast aggregator
//! - [`WeatherApp`], the command interface a front end drives
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod app;
pub mod config;
pub mod current;
pub mod error;
pub mod forecast;
pub mod http;
pub mod model;
pub mod provider;

pub use app::{PresentationSink, WeatherApp};
pub use config::{Config, CredentialProvider, StaticApiKey};
pub use current::CurrentConditionsFetcher;
pub use error::{Lookup, WeatherError};
pub use forecast::{ForecastAggregator, aggregate_daily, first_per_day};
pub use http::{HttpClient, ReqwestHttpClient};
pub use model::{
    CityName, Coordinates, CurrentConditions, DailyForecast, ForecastEntry, IconSize, Location,
    round_temperature,
};
pub use provider::Endpoints;
