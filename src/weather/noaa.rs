//! weather.gov client: latest station observation plus the gridpoint forecast.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use reqwest::header::{ACCEPT, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{info, warn};

use super::{WeatherReport, date_label};
use crate::config::WeatherConfig;
use crate::fetch::HttpClient;

const API_BASE: &str = "https://api.weather.gov";

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self) -> Result<WeatherReport>;
}

pub struct NoaaClient<C> {
    client: C,
    station_id: String,
    latitude: f64,
    longitude: f64,
    user_agent: HeaderValue,
}

impl<C: HttpClient> NoaaClient<C> {
    pub fn new(client: C, config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client,
            station_id: config.station_id.clone(),
            latitude: config.latitude,
            longitude: config.longitude,
            user_agent: HeaderValue::from_str(&config.user_agent)
                .context("weather user_agent is not a valid header value")?,
        })
    }

    fn observation_url(&self) -> String {
        format!("{API_BASE}/stations/{}/observations/latest", self.station_id)
    }

    fn points_url(&self) -> String {
        format!("{API_BASE}/points/{:.4},{:.4}", self.latitude, self.longitude)
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
        req.headers_mut().insert(USER_AGENT, self.user_agent.clone());
        req.headers_mut()
            .insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let resp = self.client.execute(req).await?.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn forecast(&self) -> Result<Value> {
        let points = self.get_json(&self.points_url()).await?;
        let url = points["properties"]["forecast"]
            .as_str()
            .context("points response has no forecast URL")?;
        self.get_json(url).await
    }
}

#[async_trait]
impl<C: HttpClient> WeatherSource for NoaaClient<C> {
    #[tracing::instrument(skip(self), fields(station = %self.station_id))]
    async fn fetch(&self) -> Result<WeatherReport> {
        let observation = self
            .get_json(&self.observation_url())
            .await
            .context("fetching latest observation")?;

        // High/low are optional; a missing forecast falls back to estimates.
        let forecast = match self.forecast().await {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(error = %e, "Forecast unavailable, estimating high/low");
                None
            }
        };

        let report = report_from_json(&observation, forecast.as_ref(), Local::now().date_naive());
        info!(
            temperature_f = ?report.temperature_f,
            condition = %report.condition,
            high_f = ?report.high_f,
            low_f = ?report.low_f,
            "Weather fetched"
        );
        Ok(report)
    }
}

fn celsius_to_fahrenheit(c: f64) -> i32 {
    (c * 9.0 / 5.0 + 32.0).round() as i32
}

fn quantity_f(properties: &Value, key: &str) -> Option<i32> {
    properties[key]["value"].as_f64().map(celsius_to_fahrenheit)
}

/// First forecast period temperature with `isDaytime == daytime`.
fn period_temperature(forecast: &Value, daytime: bool) -> Option<i32> {
    forecast["properties"]["periods"]
        .as_array()?
        .iter()
        .filter(|p| p["isDaytime"].as_bool() == Some(daytime))
        .find_map(|p| p["temperature"].as_i64())
        .and_then(|t| i32::try_from(t).ok())
}

/// Builds a report from weather.gov responses.
///
/// `observation` is a `/stations/{id}/observations/latest` body; `forecast` a
/// gridpoint forecast body, if one could be fetched. Without forecast values the
/// high and low are estimated from the current temperature (+2 / −3 °F).
pub fn report_from_json(
    observation: &Value,
    forecast: Option<&Value>,
    date: NaiveDate,
) -> WeatherReport {
    let props = &observation["properties"];

    let temperature_f = quantity_f(props, "temperature");
    let feels_like_f = quantity_f(props, "windChill").or_else(|| quantity_f(props, "heatIndex"));

    let condition = props["textDescription"]
        .as_str()
        .or_else(|| props["shortForecast"].as_str())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let high_f = forecast
        .and_then(|f| period_temperature(f, true))
        .or(temperature_f.map(|t| t + 2));
    let low_f = forecast
        .and_then(|f| period_temperature(f, false))
        .or(temperature_f.map(|t| t - 3));

    WeatherReport {
        date_label: date_label(date),
        condition,
        temperature_f,
        feels_like_f,
        high_f,
        low_f,
        fetched_at: Utc::now(),
    }
}
