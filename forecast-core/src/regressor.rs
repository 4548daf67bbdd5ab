use smartcore::{
    ensemble::random_forest_regressor::{RandomForestRegressor, RandomForestRegressorParameters},
    linalg::basic::matrix::DenseMatrix,
};

use crate::{
    error::{ForecastError, Result},
    history::HistoricalSample,
};

const N_TREES: usize = 100;
const SEED: u64 = 42;
/// Both features are considered at every split.
const FEATURES_PER_SPLIT: usize = 2;

/// Predicts the next temperature reading from the current (temperature, humidity).
pub trait TemperatureRegressor: Send + Sync {
    fn predict_next(&self, temperature: f64, humidity: f64) -> Result<f64>;
}

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest trained on consecutive history rows.
pub struct ForestModel {
    forest: Forest,
    training_rows: usize,
}

impl std::fmt::Debug for ForestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForestModel").field("training_rows", &self.training_rows).finish()
    }
}

impl ForestModel {
    /// Fit on (Temp, Humidity) at row i against Temp at row i + 1.
    pub fn train(samples: &[HistoricalSample]) -> Result<Self> {
        let (features, targets) = supervised_pairs(samples);
        if targets.is_empty() {
            return Err(ForecastError::Model(format!(
                "no training pairs in {} history rows",
                samples.len()
            )));
        }

        let x = DenseMatrix::from_2d_vec(&features);
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(N_TREES)
            .with_m(FEATURES_PER_SPLIT)
            .with_seed(SEED);

        let forest = Forest::fit(&x, &targets, params)
            .map_err(|e| ForecastError::Model(format!("fit failed: {e}")))?;

        Ok(Self { forest, training_rows: targets.len() })
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }
}

impl TemperatureRegressor for ForestModel {
    fn predict_next(&self, temperature: f64, humidity: f64) -> Result<f64> {
        let x = DenseMatrix::from_2d_array(&[&[temperature, humidity]]);
        let predicted = self
            .forest
            .predict(&x)
            .map_err(|e| ForecastError::Model(format!("predict failed: {e}")))?;

        predicted
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Model("empty prediction".to_string()))
    }
}

/// Only complete rows become inputs; any row may be a target.
fn supervised_pairs(samples: &[HistoricalSample]) -> (Vec<Vec<f64>>, Vec<f64>) {
    samples
        .windows(2)
        .filter(|pair| pair[0].complete)
        .map(|pair| (vec![pair[0].temperature, pair[0].humidity], pair[1].temperature))
        .unzip()
}
