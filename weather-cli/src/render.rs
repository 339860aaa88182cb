use chrono::Local;
use weather_core::{CurrentConditions, DailyForecast, PresentationSink, round_temperature};

/// Prints results to stdout and errors to stderr.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl PresentationSink for TerminalSink {
    fn show_current(&self, c: &CurrentConditions) {
        println!("{}", c.display_location());
        println!("{}", c.observed_at.with_timezone(&Local).format("%a %b %d %Y"));
        println!();
        println!("  {}°C  {}", round_temperature(c.temperature_c), c.description);
        println!("  Feels like: {}°C", round_temperature(c.feels_like_c));
        println!("  Humidity:   {}%", c.humidity_pct);
        println!("  Wind:       {} m/s", c.wind_speed_ms);
        println!("  Icon:       {}", c.icon_url());
    }

    fn show_forecast(&self, days: &[DailyForecast]) {
        if days.is_empty() {
            return;
        }
        println!();
        println!("5-day forecast");
        for day in days {
            println!("{}", forecast_row(day));
        }
    }

    fn show_error(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn forecast_row(day: &DailyForecast) -> String {
    format!(
        "  {:<4} {:>4}°C  {:<24} {}",
        day.day_label,
        round_temperature(day.temperature_c),
        day.description,
        day.icon_url()
    )
}
