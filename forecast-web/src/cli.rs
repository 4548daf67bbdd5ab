use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, ForecastService, ModelCache, ProviderId, WeatherContext,
    provider::{default_provider_from_config, provider_from_config},
};
use inquire::{Password, PasswordDisplayMode};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather page with a history-trained hourly forecast")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "weatherapi" or "openweather".
        provider: String,

        /// Make this provider the default even if another one is already set.
        #[arg(long)]
        default: bool,
    },

    /// Print the forecast for a city.
    Show {
        /// City or location name.
        city: String,

        /// Provider to query; defaults to the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Serve the forecast page over HTTP.
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000.
        #[arg(long)]
        bind: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Command::Configure { provider, default } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(config, id, default, self.config)?;
            }
            Command::Show { city, provider } => {
                let service = build_service(&config, provider.as_deref())?;
                let ctx = service
                    .search(Some(&city), Utc::now())
                    .await
                    .with_context(|| format!("Could not get the forecast for '{city}'"))?;
                print_context(&ctx);
            }
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let service = build_service(&config, None)?;
                server::serve(&bind, service).await?;
            }
        }

        Ok(())
    }
}

fn configure(
    mut config: Config,
    id: ProviderId,
    make_default: bool,
    path: Option<PathBuf>,
) -> anyhow::Result<()> {
    if config.is_provider_configured(id) {
        println!("{id} already has an API key; it will be replaced.");
    }

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key);
    if make_default {
        config.set_default_provider(id);
    }

    match path {
        Some(path) => config.save_to(&path)?,
        None => config.save()?,
    }

    println!("Saved API key for {id}.");
    if config.default_provider.as_deref() == Some(id.as_str()) {
        println!("{id} is the default provider.");
    }

    Ok(())
}

/// Wire the configured provider and the history-backed model cache together.
pub fn build_service(config: &Config, provider: Option<&str>) -> anyhow::Result<ForecastService> {
    let provider = match provider {
        Some(name) => provider_from_config(ProviderId::try_from(name)?, config)?,
        None => default_provider_from_config(config)?,
    };
    let models = ModelCache::new(config.history_csv.clone());

    Ok(ForecastService::new(Arc::from(provider), Arc::new(models), config.prediction_hours))
}

fn print_context(ctx: &WeatherContext) {
    let dash = |v: Option<String>| v.unwrap_or_else(|| "--".to_string());

    println!("{}, {} ({} {})", ctx.city, ctx.country, ctx.date, ctx.localtime);
    println!(
        "  {}°C, feels like {}°C, {}",
        dash(ctx.temperature.map(|t| t.to_string())),
        dash(ctx.feelslike.map(|t| t.to_string())),
        ctx.description
    );
    println!(
        "  high {}°C / low {}°C, rain {}%",
        dash(ctx.max_temp.map(|t| t.to_string())),
        dash(ctx.min_temp.map(|t| t.to_string())),
        dash(ctx.rain_prediction.map(|r| r.to_string())),
    );
    println!(
        "  humidity {}%, clouds {}%, wind {} km/h, pressure {} mb, visibility {} km",
        dash(ctx.stats_humidity.map(|h| h.to_string())),
        dash(ctx.clouds.map(|c| c.to_string())),
        dash(ctx.wind.map(|w| w.to_string())),
        dash(ctx.pressure.map(|p| p.to_string())),
        dash(ctx.visibility.map(|v| v.to_string())),
    );

    if ctx.hourly_forecast.is_empty() {
        println!("\nHourly prediction unavailable.");
    } else {
        println!("\nPredicted hourly:");
        for point in &ctx.hourly_forecast {
            println!("  {:>9}  {}°C", point.time, point.temp);
        }
    }

    println!("\nDaily:");
    for day in &ctx.daily_forecast {
        println!("  {}  {:>3} / {:>3}°C  {}", day.day, day.temp_max, day.temp_min, day.description);
    }
}
