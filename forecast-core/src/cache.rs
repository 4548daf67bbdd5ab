use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::{
    error::{ForecastError, Result},
    history::load_history,
    regressor::{ForestModel, TemperatureRegressor},
};

/// Hands out the hourly temperature model.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn model(&self) -> Result<Arc<dyn TemperatureRegressor>>;
}

/// One-slot cache for the model trained from the history CSV.
///
/// The first successful call trains the model; every later call reuses it
/// without touching the file. A failed training leaves the slot empty, so the
/// next request tries again. Concurrent first callers wait on one training run.
#[derive(Debug)]
pub struct ModelCache {
    path: PathBuf,
    slot: OnceCell<Arc<ForestModel>>,
}

impl ModelCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), slot: OnceCell::new() }
    }

    pub fn is_trained(&self) -> bool {
        self.slot.initialized()
    }

    pub async fn get_or_train(&self) -> Result<Arc<ForestModel>> {
        if let Some(model) = self.slot.get() {
            tracing::trace!("temperature model already cached");
            return Ok(Arc::clone(model));
        }

        let model = self.slot.get_or_try_init(|| self.train()).await?;
        Ok(Arc::clone(model))
    }

    async fn train(&self) -> Result<Arc<ForestModel>> {
        let path = self.path.clone();
        tracing::info!(path = %path.display(), "loading history and training temperature model");

        let outcome = tokio::task::spawn_blocking(move || {
            let samples = load_history(&path)?;
            ForestModel::train(&samples)
        })
        .await
        .map_err(|e| ForecastError::Model(format!("training task failed: {e}")))?;

        match outcome {
            Ok(model) => {
                tracing::info!(rows = model.training_rows(), "temperature model trained");
                Ok(Arc::new(model))
            }
            Err(err) => {
                tracing::error!(kind = err.kind(), error = %err, "could not train temperature model");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl ModelSource for ModelCache {
    async fn model(&self) -> Result<Arc<dyn TemperatureRegressor>> {
        let model: Arc<dyn TemperatureRegressor> = self.get_or_train().await?;
        Ok(model)
    }
}
