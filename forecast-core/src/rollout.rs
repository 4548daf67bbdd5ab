use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::{error::Result, regressor::TemperatureRegressor};

/// Roll a one-step model forward `steps` times.
///
/// Each prediction becomes the next input temperature; humidity stays at its
/// starting value. Outputs are not clamped.
pub fn rollout<M>(model: &M, temperature: f64, humidity: f64, steps: usize) -> Result<Vec<f64>>
where
    M: TemperatureRegressor + ?Sized,
{
    let mut predictions = Vec::with_capacity(steps);
    let mut last = temperature;

    for _ in 0..steps {
        last = model.predict_next(last, humidity)?;
        predictions.push(last);
    }

    Ok(predictions)
}

/// One point of the hourly chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyPoint {
    pub time: String,
    pub temp: i64,
}

/// Label predictions as the hours following `now`.
///
/// Hours on a later local day carry the weekday, e.g. `Sat 02:00`.
pub fn hourly_points(now: DateTime<FixedOffset>, temps: &[f64]) -> Vec<HourlyPoint> {
    temps
        .iter()
        .zip(1i64..)
        .map(|(&temp, offset)| {
            let at = now + Duration::hours(offset);
            let time = if at.date_naive() > now.date_naive() {
                at.format("%a %H:00").to_string()
            } else {
                at.format("%H:00").to_string()
            };
            HourlyPoint { time, temp: temp.trunc() as i64 }
        })
        .collect()
}
