//! Process-wide configuration, loaded once at startup and read-only afterwards.
//!
//! Stored as a JSON object on disk; every field has a default so a partial file
//! (or none at all) is valid:
//! ```json
//! {
//!   "station": { "base_stop_id": "R35", "monitored_routes": ["R"] },
//!   "display": { "fps": 30, "frame_duration_secs": 5 },
//!   "weather": { "enabled": true }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::str::FromStr;

use crate::model::Bound;

/// Which routes contribute arrivals to the board.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "RawRouteFilter", into = "RawRouteFilter")]
pub enum RouteFilter {
    All,
    Only(BTreeSet<String>),
}

impl RouteFilter {
    pub fn only<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RouteFilter::Only(routes.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, route_id: &str) -> bool {
        match self {
            RouteFilter::All => true,
            RouteFilter::Only(routes) => routes.contains(route_id),
        }
    }
}

impl Default for RouteFilter {
    fn default() -> Self {
        RouteFilter::only(["R"])
    }
}

/// On-disk shape: either the literal `"all"` or a list of route ids.
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum RawRouteFilter {
    Keyword(String),
    Routes(Vec<String>),
}

impl TryFrom<RawRouteFilter> for RouteFilter {
    type Error = anyhow::Error;

    fn try_from(raw: RawRouteFilter) -> Result<Self> {
        match raw {
            RawRouteFilter::Keyword(k) => k.parse(),
            RawRouteFilter::Routes(routes) => Ok(RouteFilter::only(routes)),
        }
    }
}

impl From<RouteFilter> for RawRouteFilter {
    fn from(filter: RouteFilter) -> Self {
        match filter {
            RouteFilter::All => RawRouteFilter::Keyword("all".to_string()),
            RouteFilter::Only(routes) => RawRouteFilter::Routes(routes.into_iter().collect()),
        }
    }
}

/// Parses `all` or a comma-separated list such as `R,W`.
impl FromStr for RouteFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(RouteFilter::All);
        }
        let routes: BTreeSet<String> = s
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
        anyhow::ensure!(!routes.is_empty(), "route filter '{s}' names no routes");
        Ok(RouteFilter::Only(routes))
    }
}

/// Stop-id suffixes that distinguish the two platforms of a station.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoundSuffixes {
    pub northbound: String,
    pub southbound: String,
}

impl BoundSuffixes {
    pub fn get(&self, bound: Bound) -> &str {
        match bound {
            Bound::Northbound => &self.northbound,
            Bound::Southbound => &self.southbound,
        }
    }
}

impl Default for BoundSuffixes {
    fn default() -> Self {
        Self {
            northbound: "N".to_string(),
            southbound: "S".to_string(),
        }
    }
}

/// Lower-case headsign fragments used when a trip has no usable `direction_id`.
///
/// Northbound is checked first, so a headsign matching both sets is northbound.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectionKeywords {
    pub northbound: Vec<String>,
    pub southbound: Vec<String>,
}

impl Default for DirectionKeywords {
    fn default() -> Self {
        Self {
            northbound: ["whitehall", "downtown", "forest", "cortlandt"]
                .map(String::from)
                .to_vec(),
            southbound: ["bay ridge", "brooklyn", "95 st"].map(String::from).to_vec(),
        }
    }
}

/// The station whose platforms the board shows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StationConfig {
    pub name: String,
    pub base_stop_id: String,
    pub bound_suffixes: BoundSuffixes,
    pub monitored_routes: RouteFilter,
    pub keywords: DirectionKeywords,
}

impl StationConfig {
    pub fn new(base_stop_id: impl Into<String>, monitored_routes: RouteFilter) -> Self {
        Self {
            base_stop_id: base_stop_id.into(),
            monitored_routes,
            ..Default::default()
        }
    }

    /// Platform stop id for `bound`, e.g. `R35` + `N`.
    pub fn target_stop_id(&self, bound: Bound) -> String {
        format!("{}{}", self.base_stop_id, self.bound_suffixes.get(bound))
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: "25th St (Brooklyn)".to_string(),
            base_stop_id: "R35".to_string(),
            bound_suffixes: BoundSuffixes::default(),
            monitored_routes: RouteFilter::default(),
            keywords: DirectionKeywords::default(),
        }
    }
}

/// A named station preset; `feed_path` is the NYCT feed serving its routes.
pub struct StationPreset {
    pub key: &'static str,
    pub feed_path: &'static str,
    pub station: StationConfig,
}

/// Built-in stations selectable with `--station`.
pub fn presets() -> Vec<StationPreset> {
    let make = |name: &str, stop: &str, routes: &[&str]| StationConfig {
        name: name.to_string(),
        base_stop_id: stop.to_string(),
        monitored_routes: RouteFilter::only(routes.iter().copied()),
        ..Default::default()
    };
    vec![
        StationPreset {
            key: "25th_st_r_brooklyn",
            feed_path: "gtfs-nqrw",
            station: make("25th St (Brooklyn)", "R35", &["R"]),
        },
        StationPreset {
            key: "herald_sq_nqrw",
            feed_path: "gtfs-nqrw",
            station: make("34 St-Herald Sq", "R17", &["N", "Q", "R", "W"]),
        },
        StationPreset {
            key: "canal_st_nqrw",
            feed_path: "gtfs-nqrw",
            station: make("Canal St", "R23", &["R", "W"]),
        },
    ]
}

pub fn preset(key: &str) -> Option<StationPreset> {
    presets().into_iter().find(|p| p.key == key)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint prefix; `feed_path` is appended. A local directory also works.
    pub base_url: String,
    pub feed_path: String,
    /// Environment variable holding the optional `x-api-key` value.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2F".to_string(),
            feed_path: "gtfs-nqrw".to_string(),
            api_key_env: "MTA_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

impl FeedConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fps: u32,
    /// Seconds each bound stays on screen before rotating.
    pub frame_duration_secs: u64,
    pub weather_duration_secs: u64,
    /// Where the file sink writes PNG snapshots.
    pub output_dir: PathBuf,
    /// Write one PNG every `save_every` commits.
    pub save_every: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            frame_duration_secs: 5,
            weather_duration_secs: 5,
            output_dir: std::env::temp_dir().join("subway_matrix"),
            save_every: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub enabled: bool,
    /// NOAA observation station, e.g. `KNYC` (Central Park).
    pub station_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub poll_interval_secs: u64,
    /// weather.gov rejects requests without a User-Agent.
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            station_id: "KNYC".to_string(),
            latitude: 40.7829,
            longitude: -73.9654,
            poll_interval_secs: 600,
            user_agent: "subway_matrix (https://github.com)".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub station: StationConfig,
    pub feed: FeedConfig,
    pub poll_interval_secs: u64,
    pub display: DisplayConfig,
    pub weather: WeatherConfig,
    /// Terminal stop id (without bound suffix) to destination label, used when a
    /// trip carries no headsign.
    pub terminal_names: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let terminal_names = [
            ("R27", "Whitehall St"),
            ("G08", "Forest Hills"),
            ("R45", "Bay Ridge-95 St"),
            ("R01", "Astoria"),
            ("D43", "Coney Island"),
            ("Q05", "96 St"),
            ("N12", "86 St"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            station: StationConfig::default(),
            feed: FeedConfig::default(),
            poll_interval_secs: 10,
            display: DisplayConfig::default(),
            weather: WeatherConfig::default(),
            terminal_names,
        }
    }
}

impl AppConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file '{path}'"))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config file '{path}'"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.station.base_stop_id.trim().is_empty(),
            "station.base_stop_id must not be empty"
        );
        anyhow::ensure!(self.display.fps > 0, "display.fps must be positive");
        anyhow::ensure!(
            self.display.frame_duration_secs > 0,
            "display.frame_duration_secs must be positive"
        );
        anyhow::ensure!(self.poll_interval_secs > 0, "poll_interval_secs must be positive");
        anyhow::ensure!(
            !self.weather.enabled || self.weather.poll_interval_secs > 0,
            "weather.poll_interval_secs must be positive when weather is enabled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_filter_parses_all() {
        assert_eq!("all".parse::<RouteFilter>().unwrap(), RouteFilter::All);
        assert_eq!("ALL".parse::<RouteFilter>().unwrap(), RouteFilter::All);
    }

    #[test]
    fn test_route_filter_parses_list() {
        let filter: RouteFilter = "R, W".parse().unwrap();
        assert!(filter.allows("R"));
        assert!(filter.allows("W"));
        assert!(!filter.allows("N"));
    }

    #[test]
    fn test_route_filter_rejects_empty() {
        assert!(",".parse::<RouteFilter>().is_err());
    }

    #[test]
    fn test_route_filter_json_forms() {
        let all: RouteFilter = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, RouteFilter::All);

        let only: RouteFilter = serde_json::from_str("[\"R\", \"N\"]").unwrap();
        assert_eq!(only, RouteFilter::only(["N", "R"]));

        assert!(serde_json::from_str::<RouteFilter>("\"some\"").is_err());
        assert_eq!(serde_json::to_string(&RouteFilter::All).unwrap(), "\"all\"");
    }

    #[test]
    fn test_target_stop_id() {
        let station = StationConfig::new("R35", RouteFilter::All);
        assert_eq!(station.target_stop_id(Bound::Northbound), "R35N");
        assert_eq!(station.target_stop_id(Bound::Southbound), "R35S");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "station": { "base_stop_id": "R17" }, "display": { "fps": 20 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.station.base_stop_id, "R17");
        assert_eq!(config.station.bound_suffixes.northbound, "N");
        assert_eq!(config.display.fps, 20);
        assert_eq!(config.display.frame_duration_secs, 5);
        assert_eq!(config.poll_interval_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_fps() {
        let mut config = AppConfig::default();
        config.display.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_weather_interval() {
        let mut config = AppConfig::default();
        config.weather.poll_interval_secs = 0;
        assert!(config.validate().is_ok(), "unused while weather is off");

        config.weather.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "station": { "monitored_routes": "all" } }"#).unwrap();

        let config = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.station.monitored_routes, RouteFilter::All);
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(AppConfig::load("/nonexistent/subway_matrix.json").is_err());
    }

    #[test]
    fn test_presets_have_unique_keys() {
        let presets = presets();
        let keys: BTreeSet<_> = presets.iter().map(|p| p.key).collect();
        assert_eq!(keys.len(), presets.len());
        assert!(preset("25th_st_r_brooklyn").is_some());
        assert!(preset("nowhere").is_none());
    }
}
