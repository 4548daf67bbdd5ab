use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{ForecastError, Result},
    model::{
        CurrentConditions, DailyForecast, LocalZone, LocationInfo, ProviderForecast,
        WeatherRequest,
    },
    provider::{ProviderId, fetch_json},
};

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "http://api.weatherapi.com";
const PROVIDER: &str = "weatherapi";

/// WeatherAPI.com: one `forecast.json` call yields current, location and daily data.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    days: u8,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            days: 10,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days;
        self
    }

    pub fn with_http(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    async fn fetch_forecast(&self, request: &WeatherRequest) -> Result<WaForecastResponse> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let days = self.days.to_string();

        fetch_json(
            &self.http,
            &url,
            &[
                ("key", self.api_key.as_str()),
                ("q", request.city.as_str()),
                ("days", days.as_str()),
                ("aqi", "no"),
                ("alerts", "no"),
            ],
            PROVIDER,
            "forecast",
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
    #[serde(default)]
    tz_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    feelslike_c: f64,
    humidity: u8,
    cloud: u8,
    wind_kph: f64,
    pressure_mb: f64,
    vis_km: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    #[serde(default)]
    daily_chance_of_rain: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date_epoch: i64,
    day: WaDay,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl From<WaForecastResponse> for ProviderForecast {
    fn from(parsed: WaForecastResponse) -> Self {
        let zone = LocalZone::from_tz_id(parsed.location.tz_id.as_deref().unwrap_or("UTC"));
        let current = parsed.current;

        let days = parsed
            .forecast
            .forecastday
            .into_iter()
            .map(|d| DailyForecast {
                date_epoch: d.date_epoch,
                min_temp_c: d.day.mintemp_c,
                max_temp_c: d.day.maxtemp_c,
                icon_url: absolute_icon_url(&d.day.condition.icon),
                condition: d.day.condition.text,
                chance_of_rain_pct: d.day.daily_chance_of_rain,
            })
            .collect();

        ProviderForecast {
            provider: PROVIDER,
            location: LocationInfo {
                name: parsed.location.name,
                country: parsed.location.country,
                zone,
            },
            current: CurrentConditions {
                temperature_c: current.temp_c,
                feels_like_c: current.feelslike_c,
                humidity_pct: current.humidity,
                cloud_pct: current.cloud,
                wind_kph: current.wind_kph,
                pressure_mb: current.pressure_mb,
                visibility_km: Some(current.vis_km),
                icon_url: absolute_icon_url(&current.condition.icon),
                condition: current.condition.text,
            },
            days,
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    async fn get_forecast(&self, request: &WeatherRequest) -> Result<ProviderForecast> {
        let parsed = self.fetch_forecast(request).await?;
        let forecast = ProviderForecast::from(parsed);

        if forecast.days.is_empty() {
            return Err(ForecastError::parse(PROVIDER, "response contained no forecastday data"));
        }

        Ok(forecast)
    }
}

/// Icons come back protocol-relative (`//cdn.weatherapi.com/...`).
fn absolute_icon_url(icon: &str) -> String {
    if icon.starts_with("//") { format!("https:{icon}") } else { icon.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_relative_icons_get_https() {
        assert_eq!(
            absolute_icon_url("//cdn.weatherapi.com/weather/64x64/day/116.png"),
            "https://cdn.weatherapi.com/weather/64x64/day/116.png"
        );
        assert_eq!(absolute_icon_url("https://x/y.png"), "https://x/y.png");
    }

    #[test]
    fn missing_rain_chance_defaults_to_zero() {
        let day: WaDay = serde_json::from_value(serde_json::json!({
            "maxtemp_c": 20.4,
            "mintemp_c": 11.9,
            "condition": { "text": "Sunny", "icon": "//cdn/1.png" }
        }))
        .unwrap();
        assert_eq!(day.daily_chance_of_rain, 0.0);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = WeatherApiProvider::new("k".into()).with_base_url("http://localhost:1234/");
        assert_eq!(provider.base_url, "http://localhost:1234");
    }
}
