//! Linear trend plus weekly seasonality demand model.
//!
//! The model fits `y = a + b·t` by least squares over the observed days
//! (`t` = days since the first observation), then takes the mean residual
//! per weekday as an additive weekly effect. Predictions cover the days
//! after the last observation and never go below zero.

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use biznavi_contracts::error::{NaviError, NaviResult};
use biznavi_core::traits::ForecastModel;

#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSeasonalModel;

impl TrendSeasonalModel {
    pub fn new() -> Self {
        Self
    }
}

struct Fit {
    intercept: f64,
    slope: f64,
    weekly: [f64; 7],
}

impl Fit {
    fn predict(&self, t: f64, weekday: usize) -> f64 {
        (self.intercept + self.slope * t + self.weekly[weekday]).max(0.0)
    }
}

fn fit(series: &[(NaiveDate, f64)], origin: NaiveDate) -> Fit {
    let points: Vec<(f64, f64)> = series
        .iter()
        .map(|(d, y)| ((*d - origin).num_days() as f64, *y))
        .collect();
    let n = points.len() as f64;
    let mean_t = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(t, _)| (t - mean_t).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(t, y)| (t - mean_t) * (y - mean_y)).sum();
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = mean_y - slope * mean_t;

    let mut sums = [0f64; 7];
    let mut counts = [0u32; 7];
    for ((date, _), (t, y)) in series.iter().zip(&points) {
        let wd = date.weekday().num_days_from_monday() as usize;
        sums[wd] += y - (intercept + slope * t);
        counts[wd] += 1;
    }
    let mut weekly = [0f64; 7];
    for wd in 0..7 {
        if counts[wd] > 0 {
            weekly[wd] = sums[wd] / f64::from(counts[wd]);
        }
    }

    Fit {
        intercept,
        slope,
        weekly,
    }
}

impl ForecastModel for TrendSeasonalModel {
    fn fit_and_predict(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> NaviResult<Vec<(NaiveDate, f64)>> {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            return Err(NaviError::Forecast {
                reason: "cannot fit an empty series".to_string(),
            });
        };
        if horizon_days == 0 {
            return Err(NaviError::Forecast {
                reason: "horizon must be at least one day".to_string(),
            });
        }
        if series.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(NaviError::Forecast {
                reason: "series dates must be strictly ascending".to_string(),
            });
        }

        let origin = first.0;
        let model = fit(series, origin);
        debug!(
            points = series.len(),
            slope = model.slope,
            horizon_days,
            "trend model fitted"
        );

        (1..=u64::from(horizon_days))
            .map(|offset| {
                let date = last.0.checked_add_days(Days::new(offset)).ok_or_else(|| {
                    NaviError::Forecast {
                        reason: "forecast horizon runs past the calendar".to_string(),
                    }
                })?;
                let t = (date - origin).num_days() as f64;
                let wd = date.weekday().num_days_from_monday() as usize;
                Ok((date, model.predict(t, wd)))
            })
            .collect()
    }
}
