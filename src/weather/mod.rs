//! Current conditions for the weather screen.

mod noaa;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub use noaa::{NoaaClient, WeatherSource, report_from_json};

/// One fetched set of conditions, already converted for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    /// e.g. `Fri, Jan 2 2026`
    pub date_label: String,
    pub condition: String,
    pub temperature_f: Option<i32>,
    pub feels_like_f: Option<i32>,
    pub high_f: Option<i32>,
    pub low_f: Option<i32>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherReport {
    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::classify(&self.condition)
    }
}

pub fn date_label(date: NaiveDate) -> String {
    date.format("%a, %b %-d %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherIcon {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    Snowy,
    Stormy,
    Foggy,
    Windy,
    Unknown,
}

impl WeatherIcon {
    /// Maps a free-text condition such as `Chance Rain Showers` to an icon.
    ///
    /// Checked in severity order so `Thunderstorms and Rain` is stormy and
    /// `Partly Sunny` never reads as plain sunny.
    pub fn classify(condition: &str) -> Self {
        const STORMY: &[&str] = &["thunder", "storm", "tornado", "lightning"];
        const SNOWY: &[&str] = &["snow", "sleet", "blizzard", "flurries"];
        const RAINY: &[&str] = &["rain", "shower", "drizzle", "precipitation", "wet"];
        const PARTLY: &[&str] = &["partly cloudy", "partly sunny", "mostly sunny"];
        const RULES: &[(WeatherIcon, &[&str])] = &[
            (WeatherIcon::Stormy, STORMY),
            (WeatherIcon::Snowy, SNOWY),
            (WeatherIcon::Rainy, RAINY),
            (WeatherIcon::PartlyCloudy, PARTLY),
            (WeatherIcon::Sunny, &["sunny", "clear", "fair"]),
            (WeatherIcon::Cloudy, &["cloudy", "overcast"]),
            (WeatherIcon::Foggy, &["fog", "mist", "haze"]),
            (WeatherIcon::Windy, &["wind", "breezy", "gust"]),
        ];

        let condition = condition.trim().to_lowercase();
        RULES
            .iter()
            .find(|(_, words)| words.iter().any(|w| condition.contains(w)))
            .map(|(icon, _)| *icon)
            .unwrap_or(WeatherIcon::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_forecasts() {
        let cases = [
            ("Sunny", WeatherIcon::Sunny),
            ("Clear", WeatherIcon::Sunny),
            ("Mostly Cloudy", WeatherIcon::Cloudy),
            ("Partly Cloudy", WeatherIcon::PartlyCloudy),
            ("Partly Sunny", WeatherIcon::PartlyCloudy),
            ("Chance Rain Showers", WeatherIcon::Rainy),
            ("Light Snow", WeatherIcon::Snowy),
            ("Fog/Mist", WeatherIcon::Foggy),
            ("Breezy", WeatherIcon::Windy),
            ("", WeatherIcon::Unknown),
            ("Volcanic Ash", WeatherIcon::Unknown),
        ];
        for (text, icon) in cases {
            assert_eq!(WeatherIcon::classify(text), icon, "{text}");
        }
    }

    #[test]
    fn test_classify_severity_order() {
        assert_eq!(WeatherIcon::classify("Thunderstorms and Rain"), WeatherIcon::Stormy);
        assert_eq!(WeatherIcon::classify("Rain and Snow"), WeatherIcon::Snowy);
        assert_eq!(WeatherIcon::classify("Rain Showers, Windy"), WeatherIcon::Rainy);
        assert_eq!(WeatherIcon::classify("  SUNNY  "), WeatherIcon::Sunny);
    }

    #[test]
    fn test_date_label() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(date_label(date), "Fri, Jan 2 2026");
    }
}
