//! Command interface invoked by a front end's event layer.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    current::CurrentConditionsFetcher,
    error::WeatherError,
    forecast::ForecastAggregator,
    model::{CityName, Coordinates, CurrentConditions, DailyForecast, Location},
};

/// Whatever displays results to the user.
pub trait PresentationSink: Send + Sync {
    fn show_current(&self, conditions: &CurrentConditions);

    /// An empty slice clears the forecast panel.
    fn show_forecast(&self, days: &[DailyForecast]);

    fn show_error(&self, message: &str);
}

/// Ties the fetcher, the aggregator and a sink together.
///
/// Each request that reaches the network takes a new generation number;
/// results are only written to the sink while that generation is still the
/// latest, so an older request that resolves late cannot overwrite a newer
/// one. Input rejected locally is reported immediately and leaves any request
/// in flight untouched.
pub struct WeatherApp<S> {
    current: CurrentConditionsFetcher,
    forecast: ForecastAggregator,
    sink: S,
    generation: AtomicU64,
    default_city: String,
}

impl<S: PresentationSink> WeatherApp<S> {
    pub fn new(
        current: CurrentConditionsFetcher,
        forecast: ForecastAggregator,
        sink: S,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            current,
            forecast,
            sink,
            generation: AtomicU64::new(0),
            default_city: default_city.into(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Look up the configured default city.
    pub async fn on_startup(&self) -> Result<(), WeatherError> {
        let city = self.default_city.clone();
        self.on_search(&city).await
    }

    /// Search by a user-typed city name.
    pub async fn on_search(&self, raw_city: &str) -> Result<(), WeatherError> {
        let city = CityName::parse(raw_city).map_err(|e| self.reject(e))?;
        self.run(self.next_generation(), Location::City(city)).await
    }

    /// Search by coordinates from the platform location service.
    pub async fn on_geolocate(&self, latitude: f64, longitude: f64) -> Result<(), WeatherError> {
        let coords = Coordinates::new(latitude, longitude).map_err(|e| self.reject(e))?;
        self.run(self.next_generation(), Location::Coordinates(coords)).await
    }

    /// The platform location service could not provide a position.
    pub fn on_geolocation_failed(&self, reason: &str) -> WeatherError {
        tracing::warn!(reason, "geolocation failed");
        self.reject(WeatherError::Geolocation(reason.to_string()))
    }

    async fn run(&self, generation: u64, location: Location) -> Result<(), WeatherError> {
        let conditions = match self.current.fetch(&location).await {
            Ok(c) => c,
            Err(e) => return Err(self.report(generation, e)),
        };

        if !self.is_latest(generation) {
            tracing::debug!(generation, "discarding stale current conditions");
            return Ok(());
        }
        self.sink.show_current(&conditions);

        // Follow up with the server's spelling of the name, not the raw input.
        let days = match CityName::parse(&conditions.location_name) {
            Ok(city) => self.forecast.fetch_five_day_forecast(&city).await,
            Err(_) => {
                tracing::warn!("current conditions carried no location name; skipping forecast");
                Vec::new()
            }
        };

        if self.is_latest(generation) {
            self.sink.show_forecast(&days);
        } else {
            tracing::debug!(generation, "discarding stale forecast");
        }
        Ok(())
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Show an error that never reached the network.
    fn reject(&self, err: WeatherError) -> WeatherError {
        self.sink.show_error(&err.user_message());
        err
    }

    fn report(&self, generation: u64, err: WeatherError) -> WeatherError {
        if self.is_latest(generation) {
            self.sink.show_error(&err.user_message());
        } else {
            tracing::debug!(generation, error = %err, "discarding stale error");
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::StaticApiKey,
        http::fake::FakeHttpClient,
        provider::{
            Endpoints,
            openweather::fixtures::{current_body, forecast_body},
        },
    };
    use std::{sync::Mutex, time::Duration};

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Current(String),
        Forecast(usize),
        Error(String),
    }

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<Shown>>,
    }

    impl RecordingSink {
        fn shown(&self) -> Vec<Shown> {
            self.shown.lock().unwrap().clone()
        }
    }

    impl PresentationSink for RecordingSink {
        fn show_current(&self, c: &CurrentConditions) {
            self.shown
                .lock()
                .unwrap()
                .push(Shown::Current(c.location_name.clone()));
        }

        fn show_forecast(&self, days: &[DailyForecast]) {
            self.shown.lock().unwrap().push(Shown::Forecast(days.len()));
        }

        fn show_error(&self, message: &str) {
            self.shown
                .lock()
                .unwrap()
                .push(Shown::Error(message.to_string()));
        }
    }

    fn app(http: FakeHttpClient) -> WeatherApp<RecordingSink> {
        let http: Arc<dyn crate::http::HttpClient> = Arc::new(http);
        let key: Arc<dyn crate::config::CredentialProvider> =
            Arc::new(StaticApiKey("KEY".into()));
        let endpoints = Endpoints::new("http://owm.test/data/2.5");
        WeatherApp::new(
            CurrentConditionsFetcher::new(http.clone(), key.clone(), endpoints.clone()),
            ForecastAggregator::new(http, key, endpoints),
            RecordingSink::default(),
            "Mumbai",
        )
    }

    fn three_day_forecast() -> String {
        forecast_body(&[
            ("2024-01-15 12:00:00", 10.0),
            ("2024-01-16 12:00:00", 11.0),
            ("2024-01-17 12:00:00", 12.0),
        ])
    }

    #[tokio::test]
    async fn blank_search_never_hits_network() {
        let http = FakeHttpClient::new();
        let app = app(http.clone());

        let err = app.on_search("   ").await.unwrap_err();

        assert!(matches!(err, WeatherError::LocalValidation(_)));
        assert!(http.requests().is_empty());
        assert_eq!(
            app.sink().shown(),
            vec![Shown::Error("Please enter a city name.".into())]
        );
    }

    #[tokio::test]
    async fn forecast_uses_canonical_city_name() {
        let http = FakeHttpClient::new()
            .reply("weather", "paris", 200, current_body("Paris", "FR", 18.4))
            .reply("forecast", "Paris", 200, three_day_forecast());
        let app = app(http.clone());

        app.on_search(" paris ").await.unwrap();

        let reqs = http.requests();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].param("q"), Some("paris"));
        assert_eq!(reqs[1].param("q"), Some("Paris"));
        assert_eq!(
            app.sink().shown(),
            vec![Shown::Current("Paris".into()), Shown::Forecast(3)]
        );
    }

    #[tokio::test]
    async fn city_not_found_is_reported_and_no_forecast_requested() {
        let http = FakeHttpClient::new().reply("weather", "Nowhere", 404, "{}");
        let app = app(http.clone());

        let err = app.on_search("Nowhere").await.unwrap_err();

        assert!(matches!(err, WeatherError::CityNotFound(_)));
        assert_eq!(http.requests().len(), 1);
        assert_eq!(
            app.sink().shown(),
            vec![Shown::Error(
                "City not found! Please check the spelling.".into()
            )]
        );
    }

    #[tokio::test]
    async fn forecast_failure_is_silent() {
        let http = FakeHttpClient::new()
            .reply("weather", "Paris", 200, current_body("Paris", "FR", 18.4))
            .reply("forecast", "Paris", 200, r#"{"cod":"500","message":"boom"}"#);
        let app = app(http);

        app.on_search("Paris").await.unwrap();

        assert_eq!(
            app.sink().shown(),
            vec![Shown::Current("Paris".into()), Shown::Forecast(0)]
        );
    }

    #[tokio::test]
    async fn geolocate_feeds_same_pipeline() {
        let http = FakeHttpClient::new()
            .reply("weather", "", 200, current_body("Shuzenji", "JP", 22.0))
            .reply("forecast", "Shuzenji", 200, three_day_forecast());
        let app = app(http.clone());

        app.on_geolocate(34.97, 138.93).await.unwrap();

        assert_eq!(
            app.sink().shown(),
            vec![Shown::Current("Shuzenji".into()), Shown::Forecast(3)]
        );
        assert_eq!(http.requests()[1].param("q"), Some("Shuzenji"));
    }

    #[tokio::test]
    async fn empty_location_name_skips_forecast() {
        let http =
            FakeHttpClient::new().reply("weather", "", 200, current_body("", "", 26.0));
        let app = app(http.clone());

        app.on_geolocate(0.0, -30.0).await.unwrap();

        assert_eq!(http.requests().len(), 1);
        assert_eq!(
            app.sink().shown(),
            vec![Shown::Current(String::new()), Shown::Forecast(0)]
        );
    }

    #[tokio::test]
    async fn out_of_range_coordinates_are_rejected_locally() {
        let http = FakeHttpClient::new();
        let app = app(http.clone());

        let err = app.on_geolocate(123.0, 0.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::LocalValidation(_)));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn geolocation_failure_shows_message() {
        let app = app(FakeHttpClient::new());

        let err = app.on_geolocation_failed("permission denied");

        assert!(matches!(err, WeatherError::Geolocation(_)));
        assert_eq!(
            app.sink().shown(),
            vec![Shown::Error(
                "Unable to get your location. Please allow location access.".into()
            )]
        );
    }

    #[tokio::test]
    async fn startup_searches_default_city() {
        let http = FakeHttpClient::new()
            .reply("weather", "Mumbai", 200, current_body("Mumbai", "IN", 31.0))
            .reply("forecast", "Mumbai", 200, three_day_forecast());
        let app = app(http);

        app.on_startup().await.unwrap();

        assert_eq!(app.sink().shown()[0], Shown::Current("Mumbai".into()));
    }

    #[tokio::test]
    async fn latest_search_wins_over_slow_earlier_one() {
        let http = FakeHttpClient::new()
            .reply_after(
                "weather",
                "Paris",
                200,
                current_body("Paris", "FR", 18.0),
                Duration::from_millis(200),
            )
            .reply("weather", "Oslo", 200, current_body("Oslo", "NO", 2.0))
            .reply("forecast", "Paris", 200, three_day_forecast())
            .reply("forecast", "Oslo", 200, three_day_forecast());
        let app = app(http);

        let slow = app.on_search("Paris");
        let fast = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            app.on_search("Oslo").await
        };
        let (a, b) = tokio::join!(slow, fast);
        a.unwrap();
        b.unwrap();

        assert_eq!(
            app.sink().shown(),
            vec![Shown::Current("Oslo".into()), Shown::Forecast(3)]
        );
    }

    fn slow_paris() -> FakeHttpClient {
        FakeHttpClient::new()
            .reply_after(
                "weather",
                "Paris",
                200,
                current_body("Paris", "FR", 18.0),
                Duration::from_millis(100),
            )
            .reply("forecast", "Paris", 200, three_day_forecast())
    }

    #[tokio::test]
    async fn blank_search_does_not_cancel_pending_search() {
        let app = app(slow_paris());

        let pending = app.on_search("Paris");
        let rejected = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            app.on_search("  ").await
        };
        let (a, b) = tokio::join!(pending, rejected);
        a.unwrap();
        assert!(matches!(b, Err(WeatherError::LocalValidation(_))));

        assert_eq!(
            app.sink().shown(),
            vec![
                Shown::Error("Please enter a city name.".into()),
                Shown::Current("Paris".into()),
                Shown::Forecast(3),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_coordinates_and_geolocation_failure_keep_pending_search() {
        let app = app(slow_paris());

        let pending = app.on_search("Paris");
        let rejected = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let bad = app.on_geolocate(91.0, 0.0).await;
            let failed = app.on_geolocation_failed("timeout");
            (bad, failed)
        };
        let (a, (bad, failed)) = tokio::join!(pending, rejected);
        a.unwrap();
        assert!(matches!(bad, Err(WeatherError::LocalValidation(_))));
        assert!(matches!(failed, WeatherError::Geolocation(_)));

        let shown = app.sink().shown();
        assert_eq!(shown.len(), 4);
        assert_eq!(&shown[2..], &[Shown::Current("Paris".into()), Shown::Forecast(3)]);
    }
}
