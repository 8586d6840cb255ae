//! Moving-average projections.

use std::f64::consts::PI;

use chrono::{Datelike, Days, NaiveDate};

use super::{DailyUnits, ForecastPoint, Prediction};
use crate::domain::catalogue::round2;
use crate::domain::sales::DailySales;

/// Days projected past the last recorded day of a chart series.
pub const FORECAST_HORIZON_DAYS: u64 = 7;
/// Recorded days needed before anything is projected.
pub const MIN_FORECAST_HISTORY: usize = 7;
/// Trailing days a pair forecast is fitted on.
const PAIR_FIT_DAYS: usize = 30;
/// Two-sided 95% normal quantile.
const CONFIDENCE_Z: f64 = 1.96;

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Recorded days followed by a week of projections.
///
/// The projection starts from the mean of the last seven days and leans on
/// the week-over-week growth when two full weeks are available. Series
/// shorter than [`MIN_FORECAST_HISTORY`] are returned without projections.
pub fn extend_trend(history: &[DailyUnits]) -> Vec<ForecastPoint> {
    let mut points: Vec<ForecastPoint> = history
        .iter()
        .map(|day| ForecastPoint {
            date: day.date,
            sales: Some(day.sales),
            forecast: None,
        })
        .collect();
    let Some(last) = history.last() else {
        return points;
    };
    if history.len() < MIN_FORECAST_HISTORY {
        return points;
    }
    let units: Vec<f64> = history.iter().map(|day| day.sales as f64).collect();
    let recent = mean(&units[units.len() - 7..]);
    let growth = if units.len() >= 14 {
        let previous = mean(&units[units.len() - 14..units.len() - 7]);
        if previous > 0.0 {
            (recent - previous) / previous
        } else {
            0.0
        }
    } else {
        0.0
    };
    for offset in 1..=FORECAST_HORIZON_DAYS {
        let Some(date) = last.date.checked_add_days(Days::new(offset)) else {
            break;
        };
        let value = recent * (1.0 + growth * 0.3) + offset as f64 * growth * recent * 0.1;
        points.push(ForecastPoint {
            date,
            sales: None,
            // Saturates negatives to zero.
            forecast: Some(value as u64),
        });
    }
    points
}

/// Project `days` days for one store/item `series`, sorted oldest first.
///
/// Returns nothing when fewer than [`MIN_FORECAST_HISTORY`] days are
/// recorded.
pub fn predict_pair(series: &[DailySales], days: u32) -> Vec<Prediction> {
    let Some(last) = series.last() else {
        return Vec::new();
    };
    if series.len() < MIN_FORECAST_HISTORY {
        return Vec::new();
    }
    let start = series.len().saturating_sub(PAIR_FIT_DAYS);
    let recent: Vec<f64> = series[start..].iter().map(|row| row.units as f64).collect();
    let average = mean(&recent);
    let trend = if recent.len() >= 14 {
        let (first, second) = recent.split_at(recent.len() / 2);
        let first = mean(first);
        if first > 0.0 {
            (mean(second) - first) / first
        } else {
            0.0
        }
    } else {
        0.0
    };
    let spread = mean(
        &recent
            .iter()
            .map(|units| (units - average).powi(2))
            .collect::<Vec<_>>(),
    )
    .sqrt();
    (1..=u64::from(days))
        .map_while(|offset| {
            let date = last.date.checked_add_days(Days::new(offset))?;
            Some((offset, date))
        })
        .map(|(offset, date)| {
            let seasonality = weekday_factor(date);
            let predicted = average * (1.0 + trend * offset as f64 / 30.0) * seasonality;
            Prediction {
                prediction_date: date,
                predicted_sales: round2(predicted).max(0.0),
                confidence_lower: round2(predicted - CONFIDENCE_Z * spread).max(0.0),
                confidence_upper: round2(predicted + CONFIDENCE_Z * spread),
            }
        })
        .collect()
}

/// Weekly swing of ±10% peaking mid-week.
fn weekday_factor(date: NaiveDate) -> f64 {
    let weekday = f64::from(date.weekday().num_days_from_monday());
    1.0 + 0.1 * (2.0 * PI * weekday / 7.0).sin()
}
