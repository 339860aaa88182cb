//! Upstream weather API adapters.

pub mod openweather;

pub use openweather::Endpoints;
