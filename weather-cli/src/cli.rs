use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weather_core::{
    Config, CredentialProvider, CurrentConditionsFetcher, Endpoints, ForecastAggregator,
    ReqwestHttpClient, StaticApiKey, WeatherApp,
};

use crate::render::TerminalSink;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and 5-day forecast from OpenWeather")]
pub struct Cli {
    /// OpenWeather API key; overrides the configured one.
    #[arg(long, global = true, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and default city.
    Configure {
        /// Default city shown when `show` is run without one.
        #[arg(long)]
        default_city: Option<String>,
    },

    /// Show weather for a city.
    Show {
        /// City name; defaults to the configured city.
        city: Option<String>,
    },

    /// Show weather for a position.
    Here {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        let mut config = Config::load()?;

        let outcome = match self.command {
            Command::Configure { default_city } => {
                configure(&mut config, self.api_key, default_city)?;
                return Ok(ExitCode::SUCCESS);
            }
            Command::Show { city } => {
                let app = build_app(&config, self.api_key)?;
                match city {
                    Some(city) => app.on_search(&city).await,
                    None => app.on_startup().await,
                }
            }
            Command::Here { lat, lon } => {
                let app = build_app(&config, self.api_key)?;
                app.on_geolocate(lat, lon).await
            }
        };

        // The sink has already printed the user-facing message.
        match outcome {
            Ok(()) => Ok(ExitCode::SUCCESS),
            Err(e) => {
                tracing::debug!(error = %e, "lookup failed");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn build_app(config: &Config, api_key: Option<String>) -> Result<WeatherApp<TerminalSink>> {
    let credentials: Arc<dyn CredentialProvider> = match api_key {
        Some(key) => Arc::new(StaticApiKey(key)),
        None => Arc::new(config.clone()),
    };
    if credentials.api_key().is_none() {
        return Err(anyhow!(
            "No API key configured.\n\
             Hint: run `weather configure` and enter your OpenWeather API key, \
             or set OPENWEATHER_API_KEY."
        ));
    }

    let http = Arc::new(
        ReqwestHttpClient::new(config.request_timeout()).context("Failed to set up HTTP client")?,
    );
    let endpoints = Endpoints::new(config.base_url());

    Ok(WeatherApp::new(
        CurrentConditionsFetcher::new(http.clone(), credentials.clone(), endpoints.clone()),
        ForecastAggregator::new(http, credentials, endpoints),
        TerminalSink::default(),
        config.default_city(),
    ))
}

fn configure(
    config: &mut Config,
    api_key: Option<String>,
    default_city: Option<String>,
) -> Result<()> {
    let api_key = match api_key {
        Some(key) => key,
        None => Password::new("OpenWeather API key:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?,
    };
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.set_api_key(api_key);

    let default_city = match default_city {
        Some(city) => city,
        None => Text::new("Default city:")
            .with_default(config.default_city())
            .prompt()
            .context("Failed to read default city")?,
    };
    config.set_default_city(default_city);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
