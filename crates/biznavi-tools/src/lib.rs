//! # biznavi-tools
//!
//! The four capability tools of the BizNavi assistant:
//!
//! | Tool | Name | Reads |
//! |---|---|---|
//! | [`AnalyzeSales`] | `analyze_sales` | dataset |
//! | [`LookupPolicy`] | `lookup_policy` | knowledge index |
//! | [`ForecastDemand`] | `forecast_demand` | dataset, forecast model |
//! | [`BuildChart`] | `build_chart` | dataset; publishes a chart artifact |
//!
//! Every tool gets its collaborators injected as `Arc<dyn ...>` trait
//! objects and reports failures as `ToolError`. [`builtin_catalog`] wires
//! all four into a validated `ToolCatalog`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use biznavi_contracts::{
    dataset::{Dataset, DatasetView},
    error::{NaviResult, ToolError},
};
use biznavi_core::{
    traits::{DatasetProvider, ForecastModel, KnowledgeIndex},
    ToolCatalog,
};

pub mod chart;
pub mod forecast;
pub mod format;
pub mod policy;
pub mod sales;

pub use chart::BuildChart;
pub use forecast::{forecast_summary, ForecastDemand, ForecastSummary};
pub use policy::LookupPolicy;
pub use sales::{sales_figures, AnalyzeSales, SalesFigures, SalesFilter};

/// Register the four built-in tools and validate the catalog.
pub fn builtin_catalog(
    dataset: Arc<dyn DatasetProvider>,
    index: Arc<dyn KnowledgeIndex>,
    model: Arc<dyn ForecastModel>,
) -> NaviResult<ToolCatalog> {
    ToolCatalog::builder()
        .register(AnalyzeSales::new(Arc::clone(&dataset)))
        .register(LookupPolicy::new(index))
        .register(ForecastDemand::new(Arc::clone(&dataset), model))
        .register(BuildChart::new(dataset))
        .build()
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Deserialize a schema-checked payload into the tool's typed input.
pub(crate) fn parse_input<T: DeserializeOwned>(tool: &str, input: &Value) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn current_dataset(provider: &dyn DatasetProvider) -> Result<DatasetView, ToolError> {
    let view = provider.current().map_err(|e| ToolError::DataUnavailable {
        reason: e.to_string(),
    })?;
    if view.dataset.is_empty() {
        return Err(ToolError::DataUnavailable {
            reason: format!("the sales dataset from {} has no rows", view.provenance),
        });
    }
    Ok(view)
}

/// Index of a column the tool cannot work without.
pub(crate) fn required_column(dataset: &Dataset, name: &str) -> Result<usize, ToolError> {
    dataset
        .resolve_column(name)
        .ok_or_else(|| ToolError::DataUnavailable {
            reason: format!("the dataset has no '{name}' column"),
        })
}

// ── Test fixtures ─────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use serde_json::json;

    use biznavi_contracts::{
        error::{NaviError, NaviResult},
        tool::ToolInvocation,
    };
    use biznavi_core::traits::{ForecastModel, KnowledgeIndex};

    use crate::{builtin_catalog, fixtures::{sales_report, with_context, FixedDataset}};

    struct NoIndex;

    impl KnowledgeIndex for NoIndex {
        fn search(&self, _query: &str, _k: usize) -> NaviResult<Vec<String>> {
            Err(NaviError::IndexNotBuilt {
                path: "index.json".to_string(),
            })
        }
    }

    struct NoModel;

    impl ForecastModel for NoModel {
        fn fit_and_predict(
            &self,
            _series: &[(NaiveDate, f64)],
            _horizon_days: u32,
        ) -> NaviResult<Vec<(NaiveDate, f64)>> {
            Err(NaviError::Forecast {
                reason: "unused".to_string(),
            })
        }
    }

    #[test]
    fn builtin_catalog_registers_four_tools() {
        let catalog = builtin_catalog(
            FixedDataset::new(sales_report()),
            Arc::new(NoIndex),
            Arc::new(NoModel),
        )
        .unwrap();
        let names: Vec<String> = catalog.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec!["analyze_sales", "lookup_policy", "forecast_demand", "build_chart"]
        );
    }

    #[test]
    fn horizon_out_of_range_is_rejected_by_schema() {
        let catalog = builtin_catalog(
            FixedDataset::new(sales_report()),
            Arc::new(NoIndex),
            Arc::new(NoModel),
        )
        .unwrap();
        let invocation = ToolInvocation::new(
            "forecast_demand",
            json!({ "category": "Kurta", "horizon_days": 400 }),
        );
        let (result, _) = with_context(|ctx| catalog.invoke(&invocation, ctx));
        assert!(!result.is_success());
        assert!(result.text.contains("invalid input"));
    }
}
