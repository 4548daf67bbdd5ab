//! Flat field set handed to the page template.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{
    error::{ForecastError, Result},
    model::ProviderForecast,
    rollout::HourlyPoint,
};

pub const DEFAULT_BACKGROUND: &str = "https://placehold.co/1200x800/181b21/181b21";
pub const PLACEHOLDER_ICON: &str = "https://placehold.co/64x64/000000/ffffff?text=?";
pub const WELCOME: &str = "Welcome";
pub const FAILURE_DESCRIPTION: &str = "Location not found or API error.";

const DATE_FORMAT: &str = "%d %B, %Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEntry {
    pub day: String,
    pub temp_max: i64,
    pub temp_min: i64,
    pub icon_url: String,
    pub description: String,
}

/// Values rendered by the page. Missing readings render as `--`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherContext {
    pub background_image: String,
    #[serde(serialize_with = "or_dashes")]
    pub temperature: Option<i64>,
    #[serde(serialize_with = "or_dashes")]
    pub feelslike: Option<i64>,
    #[serde(serialize_with = "or_dashes")]
    pub stats_humidity: Option<u8>,
    #[serde(serialize_with = "or_dashes")]
    pub clouds: Option<u8>,
    #[serde(serialize_with = "or_dashes")]
    pub rain_prediction: Option<i64>,
    pub location: String,
    pub description: String,
    pub city: String,
    pub country: String,
    pub localtime: String,
    pub date: String,
    #[serde(serialize_with = "or_dashes")]
    pub wind: Option<f64>,
    #[serde(serialize_with = "or_dashes")]
    pub pressure: Option<f64>,
    #[serde(serialize_with = "or_dashes")]
    pub visibility: Option<f64>,
    #[serde(rename = "MinTemp", serialize_with = "or_dashes")]
    pub min_temp: Option<i64>,
    #[serde(rename = "MaxTemp", serialize_with = "or_dashes")]
    pub max_temp: Option<i64>,
    pub hourly_forecast_json: String,
    pub hourly_forecast: Vec<HourlyPoint>,
    pub daily_forecast: Vec<DailyEntry>,
    pub icon_url: String,
}

fn or_dashes<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str("--"),
    }
}

impl WeatherContext {
    /// The empty page shown before any search.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        Self {
            background_image: DEFAULT_BACKGROUND.to_string(),
            temperature: None,
            feelslike: None,
            stats_humidity: None,
            clouds: None,
            rain_prediction: None,
            location: String::new(),
            description: WELCOME.to_string(),
            city: String::new(),
            country: String::new(),
            localtime: "--:--".to_string(),
            date: now.format(DATE_FORMAT).to_string(),
            wind: None,
            pressure: None,
            visibility: None,
            min_temp: None,
            max_temp: None,
            hourly_forecast_json: "[]".to_string(),
            hourly_forecast: Vec::new(),
            daily_forecast: Vec::new(),
            icon_url: PLACEHOLDER_ICON.to_string(),
        }
    }

    /// The page shown when a search could not be answered.
    pub fn failure(now: DateTime<Utc>) -> Self {
        Self { description: FAILURE_DESCRIPTION.to_string(), ..Self::placeholder(now) }
    }

    /// Merge provider data and hourly predictions into one page.
    ///
    /// Temperatures are truncated toward zero. High/low and rain chance come
    /// from the first forecast day, which must exist.
    pub fn assemble(
        forecast: &ProviderForecast,
        hourly: Vec<HourlyPoint>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let today = forecast
            .days
            .first()
            .ok_or_else(|| ForecastError::parse(forecast.provider, "no forecast days"))?;
        let zone = forecast.location.zone;
        let local_now = zone.localize(now);
        let current = &forecast.current;

        let daily_forecast = forecast
            .days
            .iter()
            .map(|day| {
                let date = DateTime::<Utc>::from_timestamp(day.date_epoch, 0).ok_or_else(|| {
                    ForecastError::parse(forecast.provider, format!("bad date {}", day.date_epoch))
                })?;
                Ok(DailyEntry {
                    day: zone.localize(date).format("%a, %b %d").to_string(),
                    temp_max: truncate(day.max_temp_c),
                    temp_min: truncate(day.min_temp_c),
                    icon_url: day.icon_url.clone(),
                    description: title_case(&day.condition),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let hourly_forecast_json = serde_json::to_string(&hourly)
            .map_err(|e| ForecastError::parse(forecast.provider, e.to_string()))?;

        Ok(Self {
            background_image: DEFAULT_BACKGROUND.to_string(),
            temperature: Some(truncate(current.temperature_c)),
            feelslike: Some(truncate(current.feels_like_c)),
            stats_humidity: Some(current.humidity_pct),
            clouds: Some(current.cloud_pct),
            rain_prediction: Some(truncate(today.chance_of_rain_pct)),
            location: String::new(),
            description: title_case(&current.condition),
            city: forecast.location.name.clone(),
            country: forecast.location.country.clone(),
            localtime: local_now.format("%H:%M").to_string(),
            date: local_now.format(DATE_FORMAT).to_string(),
            wind: Some((current.wind_kph * 10.0).round() / 10.0),
            pressure: Some(current.pressure_mb),
            visibility: current.visibility_km,
            min_temp: Some(truncate(today.min_temp_c)),
            max_temp: Some(truncate(today.max_temp_c)),
            hourly_forecast_json,
            hourly_forecast: hourly,
            daily_forecast,
            icon_url: current.icon_url.clone(),
        })
    }
}

fn truncate(value: f64) -> i64 {
    value.trunc() as i64
}

/// Upper-case the first letter of every word, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }

    out
}
