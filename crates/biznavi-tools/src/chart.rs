//! `build_chart`: a top-10 bar chart of one column summed by another.
//!
//! The chart never travels in the result. It is published into the session
//! mailbox and the result text starts with `CHART_SENTINEL`, which tells the
//! orchestrator to drain the mailbox into the outgoing turn.

use std::{collections::HashMap, sync::Arc};

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use biznavi_contracts::{
    artifact::{Artifact, ChartSpec, CHART_SENTINEL},
    dataset::{Dataset, AMOUNT_COLUMN},
    error::ToolError,
    tool::{ToolDescriptor, ToolResult},
};
use biznavi_core::traits::{DatasetProvider, Tool, ToolContext};

use crate::{current_dataset, format, parse_input};

pub const TOOL_NAME: &str = "build_chart";

/// Bars kept per chart.
pub const MAX_GROUPS: usize = 10;

/// Sum `metric` per distinct `group_by` value, largest first, top 10.
///
/// Column names resolve case-insensitively; either one failing to resolve
/// is `UnresolvedColumn` naming both inputs as given.
pub fn top_groups(dataset: &Dataset, group_by: &str, metric: &str) -> Result<ChartSpec, ToolError> {
    let (Some(group_idx), Some(metric_idx)) =
        (dataset.resolve_column(group_by), dataset.resolve_column(metric))
    else {
        return Err(ToolError::UnresolvedColumn {
            group_by: group_by.to_string(),
            metric: metric.to_string(),
        });
    };
    let group_col = dataset.column_name(group_idx).unwrap_or(group_by).to_string();
    let metric_col = dataset.column_name(metric_idx).unwrap_or(metric).to_string();

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for row in dataset.rows() {
        let label = row.text(group_idx).trim();
        if label.is_empty() {
            continue;
        }
        *totals.entry(label).or_default() += row.number(metric_idx);
    }

    let mut pairs: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect();
    pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs.truncate(MAX_GROUPS);

    ChartSpec::from_pairs(
        format!("Total {metric_col} by {group_col} (Top {MAX_GROUPS})"),
        group_col,
        metric_col.clone(),
        pairs,
    )
    .map_err(|_| ToolError::DataUnavailable {
        reason: format!("column '{metric_col}' has no values to chart"),
    })
}

#[derive(Debug, Deserialize)]
struct BuildChartInput {
    group_by: String,
    #[serde(default = "default_metric")]
    metric: String,
}

fn default_metric() -> String {
    AMOUNT_COLUMN.to_string()
}

pub struct BuildChart {
    dataset: Arc<dyn DatasetProvider>,
}

impl BuildChart {
    pub fn new(dataset: Arc<dyn DatasetProvider>) -> Self {
        Self { dataset }
    }
}

impl Tool for BuildChart {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: "Draws a bar chart of the top 10 groups: sums the metric column \
                          (Amount by default, or Qty) for each value of the group_by column \
                          (for example Category, Status or Size)."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "required": ["group_by"],
                "properties": {
                    "group_by": { "type": "string", "minLength": 1 },
                    "metric": { "type": "string", "minLength": 1, "default": AMOUNT_COLUMN }
                }
            }),
        }
    }

    fn run(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
        let input: BuildChartInput = parse_input(TOOL_NAME, input)?;
        let view = current_dataset(self.dataset.as_ref())?;

        let spec = top_groups(&view.dataset, &input.group_by, &input.metric)?;
        let summary = spec
            .bars()
            .next()
            .map(|(label, value)| format!(" Largest: {label} ({}).", format::grouped(value)))
            .unwrap_or_default();
        let text = format!(
            "{CHART_SENTINEL} {} with {} groups from {}.{summary}",
            spec.title,
            spec.len(),
            view.provenance
        );

        let artifact = Artifact::chart(&spec).map_err(|e| ToolError::ExecutionFailure {
            tool: TOOL_NAME.to_string(),
            reason: e.to_string(),
        })?;
        let id = artifact.id;
        ctx.mailbox.publish(artifact);
        debug!(session_id = %ctx.session_id, artifact_id = %id.0, bars = spec.len(), "chart published");

        Ok(ToolResult::with_artifact(text, id))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use biznavi_contracts::{artifact::CHART_SENTINEL, error::ToolError};
    use biznavi_core::traits::Tool;

    use super::{top_groups, BuildChart};
    use crate::fixtures::{dataset, sales_report, with_context, FixedDataset};

    /// Twelve categories with distinct totals, plus a tie and a blank label.
    fn many_categories() -> biznavi_contracts::dataset::Dataset {
        let labels = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];
        let mut rows: Vec<Vec<String>> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| vec![l.to_string(), ((i + 1) * 100).to_string()])
            .collect();
        rows.push(vec!["Z".into(), "1200".into()]);
        rows.push(vec!["".into(), "99999".into()]);
        biznavi_contracts::dataset::Dataset::new(vec!["Category".into(), "Amount".into()], rows)
    }

    #[test]
    fn category_by_amount_keeps_top_ten_and_publishes_one_artifact() {
        let tool = BuildChart::new(FixedDataset::new(many_categories()));
        let (result, mailbox) = with_context(|ctx| {
            tool.run(&json!({ "group_by": "Category", "metric": "Amount" }), ctx)
        });
        let result = result.unwrap();
        assert!(result.text.starts_with(CHART_SENTINEL));
        assert!(result.artifact.is_some());

        let artifact = mailbox.drain().expect("one artifact published");
        assert_eq!(Some(artifact.id), result.artifact);
        assert!(mailbox.drain().is_none());

        let spec = artifact.as_chart().unwrap();
        assert_eq!(spec.len(), 10);
        assert!(spec.values.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(spec.labels[..3], ["L", "Z", "K"]);
        assert_eq!(spec.title, "Total Amount by Category (Top 10)");
    }

    #[test]
    fn unresolved_column_names_both_and_publishes_nothing() {
        let tool = BuildChart::new(FixedDataset::new(sales_report()));
        let (result, mailbox) = with_context(|ctx| {
            tool.run(&json!({ "group_by": "Region", "metric": "Amount" }), ctx)
        });
        match result {
            Err(ToolError::UnresolvedColumn { group_by, metric }) => {
                assert_eq!(group_by, "Region");
                assert_eq!(metric, "Amount");
            }
            other => panic!("expected UnresolvedColumn, got {:?}", other),
        }
        assert!(mailbox.is_empty());
    }

    #[test]
    fn columns_resolve_case_insensitively_and_metric_defaults_to_amount() {
        let spec = top_groups(&sales_report(), "status", "amount").unwrap();
        assert_eq!(spec.group_column, "Status");
        assert_eq!(spec.metric_column, "Amount");

        let tool = BuildChart::new(FixedDataset::new(sales_report()));
        let (result, mailbox) = with_context(|ctx| tool.run(&json!({ "group_by": "category" }), ctx));
        assert!(result.unwrap().text.contains("Total Amount by Category"));
        assert!(!mailbox.is_empty());
    }

    #[test]
    fn groups_sum_the_metric() {
        let spec = top_groups(&sales_report(), "Category", "Qty").unwrap();
        let bars: Vec<(&str, f64)> = spec.bars().collect();
        assert_eq!(bars[0], ("Kurta", 4.0));
        assert_eq!(bars[1], ("Set", 3.0));
    }

    #[test]
    fn chart_without_labels_is_data_unavailable() {
        let ds = dataset(&["Category", "Amount"], &[&["", "10"]]);
        assert!(matches!(
            top_groups(&ds, "Category", "Amount"),
            Err(ToolError::DataUnavailable { .. })
        ));
    }
}
