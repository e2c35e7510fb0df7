//! `analyze_sales`: revenue, unit and order figures from the sales report.
//!
//! The question is resolved deterministically:
//!
//! - category: the longest category value of the dataset that appears in
//!   the question as whole words
//! - month and year: English month names (or their three-letter forms) and
//!   a four-digit year
//! - basis: gross unless the question says "net" or "real revenue"
//! - measure: revenue by default, units for "quantity"/"qty"/"units",
//!   order count for "how many orders"/"count"
//!
//! Gross figures include cancelled orders. Net figures drop every row whose
//! status contains "cancelled", in any case.

use std::sync::Arc;

use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use biznavi_contracts::{
    dataset::{
        Dataset, AMOUNT_COLUMN, CATEGORY_COLUMN, DATE_COLUMN, QUANTITY_COLUMN, STATUS_COLUMN,
    },
    error::ToolError,
    tool::{ToolDescriptor, ToolResult},
};
use biznavi_core::{
    text::{contains_phrase, tokenize},
    traits::{DatasetProvider, Tool, ToolContext},
};

use crate::{current_dataset, format, parse_input, required_column};

pub const TOOL_NAME: &str = "analyze_sales";

const MONTHS: [(&str, &str); 12] = [
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

const QUANTITY_WORDS: &[&str] = &["quantity", "qty", "units", "unit"];
const COUNT_PHRASES: &[&str] = &[
    "how many orders",
    "how many order",
    "number of orders",
    "order count",
    "count",
];

// ── Figures ───────────────────────────────────────────────────────────────────

/// Row filter for the sales figures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesFilter {
    pub category: Option<String>,
    /// 1 = January.
    pub month: Option<u32>,
    pub year: Option<i32>,
}

impl SalesFilter {
    /// " for Kurta in April 2022" style suffix; empty for an unfiltered read.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        if let Some(category) = &self.category {
            out.push_str(&format!(" for {category}"));
        }
        match (self.month, self.year) {
            (Some(m), Some(y)) => out.push_str(&format!(" in {} {y}", month_name(m))),
            (Some(m), None) => out.push_str(&format!(" in {}", month_name(m))),
            (None, Some(y)) => out.push_str(&format!(" in {y}")),
            (None, None) => {}
        }
        out
    }
}

/// Gross and net aggregates over the rows a filter selects.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SalesFigures {
    /// Rows matching the filter, cancelled ones included.
    pub matched_rows: usize,
    /// Matching rows whose status does not contain "cancelled".
    pub valid_rows: usize,
    pub gross_amount: f64,
    pub net_amount: f64,
    pub gross_units: f64,
    pub net_units: f64,
}

fn is_cancelled(status: &str) -> bool {
    status.to_lowercase().contains("cancelled")
}

/// Aggregate the rows of `dataset` selected by `filter`.
///
/// Zero matching rows is `UnknownCategory` when a category was given and
/// `DataUnavailable` otherwise. `Qty` is optional; without it unit totals
/// stay at zero.
pub fn sales_figures(dataset: &Dataset, filter: &SalesFilter) -> Result<SalesFigures, ToolError> {
    let amount = required_column(dataset, AMOUNT_COLUMN)?;
    let status = required_column(dataset, STATUS_COLUMN)?;
    let qty = dataset.resolve_column(QUANTITY_COLUMN);
    let category = match filter.category {
        Some(_) => Some(required_column(dataset, CATEGORY_COLUMN)?),
        None => None,
    };
    let date = if filter.month.is_some() || filter.year.is_some() {
        Some(required_column(dataset, DATE_COLUMN)?)
    } else {
        None
    };

    let mut figures = SalesFigures::default();
    for row in dataset.rows() {
        if let (Some(idx), Some(wanted)) = (category, &filter.category) {
            if !row.text(idx).trim().eq_ignore_ascii_case(wanted.trim()) {
                continue;
            }
        }
        if let Some(idx) = date {
            let Some(d) = row.date(idx) else { continue };
            if filter.month.is_some_and(|m| d.month() != m)
                || filter.year.is_some_and(|y| d.year() != y)
            {
                continue;
            }
        }

        let value = row.number(amount);
        let units = qty.map(|i| row.number(i)).unwrap_or(0.0);
        figures.matched_rows += 1;
        figures.gross_amount += value;
        figures.gross_units += units;
        if !is_cancelled(row.text(status)) {
            figures.valid_rows += 1;
            figures.net_amount += value;
            figures.net_units += units;
        }
    }

    if figures.matched_rows == 0 {
        return Err(match &filter.category {
            Some(category) => ToolError::UnknownCategory {
                category: category.clone(),
            },
            None => ToolError::DataUnavailable {
                reason: format!("no sales rows match{}", filter.describe()),
            },
        });
    }
    Ok(figures)
}

// ── Question parsing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Basis {
    Gross,
    Net,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    Revenue,
    Units,
    Orders,
}

#[derive(Debug, Clone, PartialEq)]
struct Question {
    filter: SalesFilter,
    basis: Basis,
    measure: Measure,
}

impl Question {
    fn parse(query: &str, dataset: &Dataset) -> Self {
        let tokens = tokenize(query);

        let basis = if contains_phrase(&tokens, "net") || contains_phrase(&tokens, "real revenue") {
            Basis::Net
        } else {
            Basis::Gross
        };

        let measure = if QUANTITY_WORDS.iter().any(|w| contains_phrase(&tokens, w)) {
            Measure::Units
        } else if COUNT_PHRASES.iter().any(|p| contains_phrase(&tokens, p)) {
            Measure::Orders
        } else {
            Measure::Revenue
        };

        // `max_by_key` keeps the last maximum; reversing makes the first-seen
        // spelling win among values that differ only in case.
        let category = dataset.resolve_column(CATEGORY_COLUMN).and_then(|idx| {
            dataset
                .distinct_values(idx)
                .into_iter()
                .rev()
                .filter(|value| contains_phrase(&tokens, value))
                .max_by_key(|value| value.chars().count())
        });

        let month = find_month(&tokens);
        let year = tokens.iter().find_map(|t| as_year(t));

        Self {
            filter: SalesFilter {
                category,
                month,
                year,
            },
            basis,
            measure,
        }
    }

    fn answer(&self, figures: &SalesFigures) -> String {
        let scope = self.filter.describe();
        match (self.measure, self.basis) {
            (Measure::Revenue, Basis::Gross) => format!(
                "Gross revenue{scope} (including cancelled orders): {} from {} orders.",
                format::inr(figures.gross_amount),
                figures.matched_rows
            ),
            (Measure::Revenue, Basis::Net) => format!(
                "Net revenue{scope} (excluding cancelled orders): {} from {} orders.",
                format::inr(figures.net_amount),
                figures.valid_rows
            ),
            (Measure::Units, Basis::Gross) => format!(
                "Units sold{scope} (including cancelled orders): {} across {} orders.",
                format::units(figures.gross_units),
                figures.matched_rows
            ),
            (Measure::Units, Basis::Net) => format!(
                "Units sold{scope} (excluding cancelled orders): {} across {} orders.",
                format::units(figures.net_units),
                figures.valid_rows
            ),
            (Measure::Orders, Basis::Gross) => format!(
                "Orders{scope}: {} in total, {} of them not cancelled.",
                figures.matched_rows, figures.valid_rows
            ),
            (Measure::Orders, Basis::Net) => format!(
                "Orders{scope} (excluding cancelled orders): {}.",
                figures.valid_rows
            ),
        }
    }
}

/// Words after which "may" names the month rather than the verb.
const MONTH_PREPOSITIONS: &[&str] = &["in", "during", "of", "for", "since", "until"];

fn as_year(token: &str) -> Option<i32> {
    (token.len() == 4)
        .then(|| token.parse::<i32>().ok())
        .flatten()
        .filter(|y| (1900..=2100).contains(y))
}

/// First month named in `tokens`, 1 = January.
///
/// "may" counts only after a preposition or next to a year, so "May I see
/// ..." stays unfiltered.
fn find_month(tokens: &[String]) -> Option<u32> {
    tokens.iter().enumerate().find_map(|(i, t)| {
        let month = MONTHS
            .iter()
            .position(|(full, short)| t == full || t == short)?;
        if t == "may" {
            let before = i.checked_sub(1).and_then(|j| tokens.get(j));
            let after = tokens.get(i + 1);
            let named = before.is_some_and(|w| {
                MONTH_PREPOSITIONS.contains(&w.as_str()) || as_year(w).is_some()
            }) || after.is_some_and(|w| as_year(w).is_some());
            if i == 0 || !named {
                return None;
            }
        }
        Some(month as u32 + 1)
    })
}

fn month_name(month: u32) -> String {
    let Some((full, _)) = month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize))
    else {
        return format!("month {month}");
    };
    let mut chars = full.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

// ── Tool ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnalyzeSalesInput {
    query: String,
}

/// Answers analytic questions about past sales.
pub struct AnalyzeSales {
    dataset: Arc<dyn DatasetProvider>,
}

impl AnalyzeSales {
    pub fn new(dataset: Arc<dyn DatasetProvider>) -> Self {
        Self { dataset }
    }
}

impl Tool for AnalyzeSales {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: "Answers questions about past sales: revenue, units sold or order \
                          counts, optionally for one category and month. Revenue is gross \
                          (cancelled orders included) unless the question asks for net."
                .to_string(),
            input_schema: input_schema(),
        }
    }

    fn run(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
        let input: AnalyzeSalesInput = parse_input(TOOL_NAME, input)?;
        let view = current_dataset(self.dataset.as_ref())?;

        let question = Question::parse(&input.query, &view.dataset);
        debug!(
            session_id = %ctx.session_id,
            category = ?question.filter.category,
            month = ?question.filter.month,
            net = question.basis == Basis::Net,
            "sales question resolved"
        );

        let figures = sales_figures(&view.dataset, &question.filter)?;
        Ok(ToolResult::success(format!(
            "{}\nSource: {}",
            question.answer(&figures),
            view.provenance
        )))
    }
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "required": ["query"],
        "properties": {
            "query": { "type": "string", "minLength": 1 }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use biznavi_contracts::error::ToolError;
    use biznavi_core::traits::Tool;

    use super::{sales_figures, AnalyzeSales, SalesFilter};
    use crate::fixtures::{dataset, sales_report, with_context, FixedDataset};

    fn ask(query: &str) -> Result<String, ToolError> {
        let tool = AnalyzeSales::new(FixedDataset::new(sales_report()));
        let (result, _) = with_context(|ctx| tool.run(&json!({ "query": query }), ctx));
        result.map(|r| r.text)
    }

    #[test]
    fn gross_revenue_includes_cancelled_orders() {
        let text = ask("What was the total revenue for Kurta in April?").unwrap();
        assert!(text.starts_with("Gross revenue for Kurta in April"), "{text}");
        assert!(text.contains("INR 1,500.00 from 3 orders"), "{text}");
        assert!(text.contains("Source: default data"));
    }

    #[test]
    fn net_revenue_excludes_cancelled_orders() {
        let text = ask("What is the net revenue for kurta in apr?").unwrap();
        assert!(text.contains("INR 1,000.00 from 2 orders"), "{text}");
        let text = ask("real revenue for Kurta in April").unwrap();
        assert!(text.contains("INR 1,000.00"), "{text}");
    }

    #[test]
    fn net_must_be_a_whole_word() {
        let text = ask("internet revenue for Kurta in April").unwrap();
        assert!(text.contains("INR 1,500.00"), "{text}");
    }

    #[test]
    fn longest_category_wins() {
        let ds = dataset(
            &["Date", "Status", "Category", "Amount"],
            &[
                &["04-01-22", "Shipped", "Dress", "100"],
                &["04-01-22", "Shipped", "Western Dress", "250"],
            ],
        );
        let tool = AnalyzeSales::new(FixedDataset::new(ds));
        let (result, _) = with_context(|ctx| {
            tool.run(&json!({ "query": "revenue of western dress" }), ctx)
        });
        assert!(result.unwrap().text.contains("INR 250.00"));
    }

    #[test]
    fn units_and_order_counts() {
        let text = ask("how many units of Kurta were sold in April").unwrap();
        assert!(text.starts_with("Units sold for Kurta in April"), "{text}");
        assert!(text.contains(": 4 across 3 orders"), "{text}");

        let text = ask("How many orders for Kurta in April?").unwrap();
        assert!(text.contains("3 in total, 2 of them not cancelled"), "{text}");
    }

    #[test]
    fn unfiltered_question_sums_everything() {
        let text = ask("total sales").unwrap();
        assert!(text.starts_with("Gross revenue (including"), "{text}");
        assert!(text.contains("INR 4,400.00 from 6 orders"), "{text}");
    }

    #[test]
    fn category_without_rows_in_month_is_unknown_category() {
        match ask("revenue for Set in June") {
            Err(ToolError::UnknownCategory { category }) => assert_eq!(category, "Set"),
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
    }

    #[test]
    fn no_rows_without_category_is_data_unavailable() {
        assert!(matches!(
            ask("revenue in December"),
            Err(ToolError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn missing_dataset_is_data_unavailable() {
        let tool = AnalyzeSales::new(FixedDataset::missing());
        let (result, _) = with_context(|ctx| tool.run(&json!({ "query": "revenue" }), ctx));
        assert!(matches!(result, Err(ToolError::DataUnavailable { .. })));
    }

    #[test]
    fn may_as_a_verb_is_not_a_month() {
        let text = ask("May I see the total revenue for Kurta?").unwrap();
        assert!(text.starts_with("Gross revenue for Kurta (including"), "{text}");
        assert!(text.contains("INR 2,400.00 from 4 orders"), "{text}");

        let text = ask("May I see the total revenue for Set?").unwrap();
        assert!(text.contains("INR 1,200.00 from 1 orders"), "{text}");

        let text = ask("you may show revenue for Kurta").unwrap();
        assert!(text.contains("INR 2,400.00"), "{text}");
    }

    #[test]
    fn may_after_a_preposition_or_beside_a_year_is_a_month() {
        let text = ask("revenue for Kurta in May").unwrap();
        assert!(text.starts_with("Gross revenue for Kurta in May"), "{text}");
        assert!(text.contains("INR 900.00 from 1 orders"), "{text}");

        let text = ask("Kurta revenue May 2022").unwrap();
        assert!(text.contains("in May 2022"), "{text}");
    }

    #[test]
    fn figures_filter_by_year() {
        let filter = SalesFilter {
            category: Some("KURTA".to_string()),
            month: None,
            year: Some(2022),
        };
        let figures = sales_figures(&sales_report(), &filter).unwrap();
        assert_eq!(figures.matched_rows, 4);
        assert_eq!(figures.gross_amount, 2400.0);
        assert_eq!(figures.net_amount, 1900.0);

        let filter = SalesFilter {
            year: Some(2023),
            ..filter
        };
        assert!(sales_figures(&sales_report(), &filter).is_err());
    }
}
