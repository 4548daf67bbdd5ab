//! Core library for the hybrid forecast page.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers (WeatherAPI.com, OpenWeather)
//! - Loading the history CSV and training the hourly temperature model
//! - Rolling the model forward and assembling the page context
//!
//! It is used by `forecast-web`, but can also be reused by other binaries or services.

pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod history;
pub mod model;
pub mod provider;
pub mod regressor;
pub mod rollout;
pub mod service;

pub use cache::{ModelCache, ModelSource};
pub use config::{Config, ProviderConfig, ServerConfig};
pub use context::{DailyEntry, WeatherContext};
pub use error::ForecastError;
pub use model::{
    CurrentConditions, DailyForecast, LocalZone, LocationInfo, ProviderForecast, WeatherRequest,
};
pub use provider::{ProviderId, WeatherProvider};
pub use regressor::{ForestModel, TemperatureRegressor};
pub use rollout::HourlyPoint;
pub use service::ForecastService;
