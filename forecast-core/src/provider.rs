use crate::{
    Config, ProviderForecast, WeatherRequest,
    error::{ForecastError, Result},
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WeatherApi, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather."
            )),
        }
    }
}

/// A source of current conditions plus a daily forecast for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn get_forecast(&self, request: &WeatherRequest) -> Result<ProviderForecast>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_cfg = config.provider_config(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `forecast configure {id}` and enter your API key."
        )
    })?;

    let http = Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let api_key = provider_cfg.api_key.clone();
    let base_url = provider_cfg.base_url.as_deref();

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::WeatherApi => {
            let mut provider =
                WeatherApiProvider::new(api_key).with_http(http).with_days(config.forecast_days);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
        ProviderId::OpenWeather => {
            let mut provider = OpenWeatherProvider::new(api_key).with_http(http);
            if let Some(url) = base_url {
                provider = provider.with_base_url(url);
            }
            Box::new(provider)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}

/// GET `url` and decode a JSON body, mapping each failure stage to its own error.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    query: &[(&str, &str)],
    provider: &'static str,
    endpoint: &'static str,
) -> Result<T> {
    let res = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|source| ForecastError::Network { provider, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| ForecastError::Network { provider, source })?;

    if !status.is_success() {
        return Err(ForecastError::Status {
            provider,
            endpoint,
            status,
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| ForecastError::parse(provider, format!("{endpoint} JSON: {e}")))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let parsed = ProviderId::try_from(id.as_str()).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(ProviderId::try_from("WeatherAPI").unwrap(), ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        let err = provider_from_config(ProviderId::OpenWeather, &cfg).unwrap_err();
        assert!(err.to_string().contains("No API key configured for provider"));
    }

    #[test]
    fn default_provider_from_config_errors_when_not_set() {
        let cfg = Config::default();
        let err = default_provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No default provider configured"));
        assert!(msg.contains("Hint: run `forecast configure"));
    }

    #[test]
    fn default_provider_from_config_works_when_set_and_configured() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "KEY".to_string());

        let provider = default_provider_from_config(&cfg).unwrap();
        assert_eq!(provider.id(), ProviderId::WeatherApi);
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
