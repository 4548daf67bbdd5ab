use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    cache::ModelSource,
    context::WeatherContext,
    error::{ForecastError, Result},
    model::{ProviderForecast, WeatherRequest},
    provider::WeatherProvider,
    rollout::{HourlyPoint, hourly_points, rollout},
};

/// Answers city searches: provider data plus the model's hourly rollout.
pub struct ForecastService {
    provider: Arc<dyn WeatherProvider>,
    models: Arc<dyn ModelSource>,
    prediction_hours: usize,
}

impl ForecastService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        models: Arc<dyn ModelSource>,
        prediction_hours: usize,
    ) -> Self {
        Self { provider, models, prediction_hours }
    }

    /// Train the hourly model ahead of the first search. Failure is logged and
    /// retried on the next search.
    pub async fn warm_up(&self) {
        if let Err(err) = self.models.model().await {
            tracing::warn!(kind = err.kind(), error = %err, "hourly model not available at startup");
        }
    }

    /// Page for a GET request.
    pub fn landing(&self) -> WeatherContext {
        WeatherContext::placeholder(Utc::now())
    }

    /// Page for a submitted search form.
    pub async fn handle(&self, city: Option<&str>) -> WeatherContext {
        self.handle_at(city, Utc::now()).await
    }

    /// Like [`ForecastService::handle`] with an explicit clock.
    ///
    /// A missing city gives the landing page. Provider or assembly errors give
    /// the failure page. A missing model only empties the hourly section.
    pub async fn handle_at(&self, city: Option<&str>, now: DateTime<Utc>) -> WeatherContext {
        match self.search(city, now).await {
            Ok(ctx) => ctx,
            Err(ForecastError::MissingInput(field)) => {
                tracing::debug!(field, "search submitted without input");
                WeatherContext::placeholder(now)
            }
            Err(err) => {
                tracing::warn!(
                    provider = %self.provider.id(),
                    kind = err.kind(),
                    error = %err,
                    "forecast request failed"
                );
                WeatherContext::failure(now)
            }
        }
    }

    /// Same pipeline as [`ForecastService::handle_at`], surfacing the error.
    pub async fn search(&self, city: Option<&str>, now: DateTime<Utc>) -> Result<WeatherContext> {
        let city = city
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(ForecastError::MissingInput("city"))?;

        let forecast = self.provider.get_forecast(&WeatherRequest::new(city)).await?;
        let hourly = self.predict_hourly(&forecast, now).await;

        WeatherContext::assemble(&forecast, hourly, now)
    }

    async fn predict_hourly(
        &self,
        forecast: &ProviderForecast,
        now: DateTime<Utc>,
    ) -> Vec<HourlyPoint> {
        let model = match self.models.model().await {
            Ok(model) => model,
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "hourly prediction unavailable");
                return Vec::new();
            }
        };

        let start_temp = forecast.current.temperature_c;
        let humidity = f64::from(forecast.current.humidity_pct);
        let steps = self.prediction_hours;

        let temps =
            tokio::task::spawn_blocking(move || rollout(model.as_ref(), start_temp, humidity, steps))
                .await
                .map_err(|e| ForecastError::Model(format!("prediction task failed: {e}")))
                .and_then(|r| r);

        match temps {
            Ok(temps) => hourly_points(forecast.location.zone.localize(now), &temps),
            Err(err) => {
                tracing::warn!(kind = err.kind(), error = %err, "hourly prediction failed");
                Vec::new()
            }
        }
    }
}
