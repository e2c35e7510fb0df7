//! `forecast_demand`: predicted unit demand for one category.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use biznavi_contracts::{
    dataset::{Dataset, CATEGORY_COLUMN, DATE_COLUMN, QUANTITY_COLUMN},
    error::ToolError,
    tool::{ToolDescriptor, ToolResult},
};
use biznavi_core::traits::{DatasetProvider, ForecastModel, Tool, ToolContext};

use crate::{current_dataset, format, parse_input, required_column};

pub const TOOL_NAME: &str = "forecast_demand";

/// Distinct days of history needed before the model is consulted.
pub const MIN_HISTORY_DAYS: usize = 10;

pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 365;

/// Headline numbers of one forecast run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastSummary {
    pub category: String,
    pub horizon_days: u32,
    /// Distinct days of history the model was fitted on.
    pub training_days: usize,
    pub total_units: f64,
    pub average_per_day: f64,
    pub predictions: Vec<(NaiveDate, f64)>,
}

impl ForecastSummary {
    pub fn report(&self) -> String {
        let total = format::units(self.total_units);
        format!(
            "Forecast report for '{}' (next {} days)\n\
             - Predicted total sales quantity: {total} units\n\
             - Average daily sales: {:.1} units/day\n\
             - Trained on {} days of history\n\
             - Insight: based on historical trends, prepare inventory for approx {total} units.",
            self.category, self.horizon_days, self.average_per_day, self.training_days
        )
    }
}

/// Daily unit totals for `category` (matched case-insensitively), oldest first.
///
/// Rows without a readable date are skipped. Zero matching rows is
/// `UnknownCategory`.
pub fn daily_units(dataset: &Dataset, category: &str) -> Result<Vec<(NaiveDate, f64)>, ToolError> {
    let cat = required_column(dataset, CATEGORY_COLUMN)?;
    let date = required_column(dataset, DATE_COLUMN)?;
    let qty = required_column(dataset, QUANTITY_COLUMN)?;

    let wanted = category.trim();
    let mut matched = 0usize;
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in dataset.rows() {
        if !row.text(cat).trim().eq_ignore_ascii_case(wanted) {
            continue;
        }
        matched += 1;
        if let Some(day) = row.date(date) {
            *by_day.entry(day).or_default() += row.number(qty);
        }
    }

    if matched == 0 {
        return Err(ToolError::UnknownCategory {
            category: category.to_string(),
        });
    }
    Ok(by_day.into_iter().collect())
}

/// Aggregate the category's history, check it is long enough, and run the
/// model over `horizon_days`.
///
/// The model is never called when fewer than `MIN_HISTORY_DAYS` distinct
/// days exist.
pub fn forecast_summary(
    dataset: &Dataset,
    model: &dyn ForecastModel,
    category: &str,
    horizon_days: u32,
) -> Result<ForecastSummary, ToolError> {
    if !(1..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(ToolError::InvalidInput {
            tool: TOOL_NAME.to_string(),
            reason: format!("horizon_days must be between 1 and {MAX_HORIZON_DAYS}"),
        });
    }

    let series = daily_units(dataset, category)?;
    if series.len() < MIN_HISTORY_DAYS {
        return Err(ToolError::InsufficientHistory {
            category: category.to_string(),
            found: series.len(),
            required: MIN_HISTORY_DAYS,
        });
    }

    let predictions = model
        .fit_and_predict(&series, horizon_days)
        .map_err(|e| ToolError::ExecutionFailure {
            tool: TOOL_NAME.to_string(),
            reason: e.to_string(),
        })?;
    if predictions.is_empty() {
        return Err(ToolError::ExecutionFailure {
            tool: TOOL_NAME.to_string(),
            reason: "the model returned no predictions".to_string(),
        });
    }

    let total_units: f64 = predictions.iter().map(|(_, y)| y).sum();
    Ok(ForecastSummary {
        category: category.to_string(),
        horizon_days,
        training_days: series.len(),
        total_units,
        average_per_day: total_units / predictions.len() as f64,
        predictions,
    })
}

#[derive(Debug, Deserialize)]
struct ForecastInput {
    category: String,
    #[serde(default = "default_horizon")]
    horizon_days: u32,
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_DAYS
}

/// Predicts unit demand for a category over the coming days.
pub struct ForecastDemand {
    dataset: Arc<dyn DatasetProvider>,
    model: Arc<dyn ForecastModel>,
}

impl ForecastDemand {
    pub fn new(dataset: Arc<dyn DatasetProvider>, model: Arc<dyn ForecastModel>) -> Self {
        Self { dataset, model }
    }
}

impl Tool for ForecastDemand {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: "Predicts future sales quantity for one product category (for \
                          example Kurta or Set) over the next horizon_days days, for \
                          inventory planning."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "required": ["category"],
                "properties": {
                    "category": { "type": "string", "minLength": 1 },
                    "horizon_days": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_HORIZON_DAYS,
                        "default": DEFAULT_HORIZON_DAYS
                    }
                }
            }),
        }
    }

    fn run(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
        let input: ForecastInput = parse_input(TOOL_NAME, input)?;
        let view = current_dataset(self.dataset.as_ref())?;
        debug!(
            session_id = %ctx.session_id,
            category = %input.category,
            horizon_days = input.horizon_days,
            "forecast requested"
        );

        let summary = forecast_summary(
            &view.dataset,
            self.model.as_ref(),
            &input.category,
            input.horizon_days,
        )?;
        info!(
            category = %summary.category,
            training_days = summary.training_days,
            total_units = summary.total_units,
            "forecast produced"
        );
        Ok(ToolResult::success(summary.report()))
    }
}
