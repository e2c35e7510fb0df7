//! `lookup_policy`: warehouse rules, SOPs and KPIs from the knowledge index.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use biznavi_contracts::{
    error::{NaviError, ToolError},
    tool::{ToolDescriptor, ToolResult},
};
use biznavi_core::traits::{KnowledgeIndex, Tool, ToolContext};

use crate::parse_input;

pub const TOOL_NAME: &str = "lookup_policy";

/// Chunks returned per lookup.
pub const TOP_K: usize = 3;

#[derive(Debug, Deserialize)]
struct LookupPolicyInput {
    query: String,
}

pub struct LookupPolicy {
    index: Arc<dyn KnowledgeIndex>,
}

impl LookupPolicy {
    pub fn new(index: Arc<dyn KnowledgeIndex>) -> Self {
        Self { index }
    }
}

impl Tool for LookupPolicy {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: "Searches the warehouse policy and SOP knowledge base. Use for \
                          questions about rules, KPIs, packaging, fees, shrinkage, or \
                          inbound and outbound processes."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": { "type": "string", "minLength": 1 }
                }
            }),
        }
    }

    fn run(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
        let input: LookupPolicyInput = parse_input(TOOL_NAME, input)?;

        let chunks = self
            .index
            .search(&input.query, TOP_K)
            .map_err(|e| match e {
                NaviError::IndexNotBuilt { path } => ToolError::DataUnavailable {
                    reason: format!(
                        "the policy knowledge index has not been built yet (expected at '{path}'); run `biznavi build-index` first"
                    ),
                },
                other => ToolError::ExecutionFailure {
                    tool: TOOL_NAME.to_string(),
                    reason: other.to_string(),
                },
            })?;
        debug!(session_id = %ctx.session_id, hits = chunks.len(), "policy lookup");

        if chunks.is_empty() {
            return Ok(ToolResult::success(
                "No relevant policy information was found for that question.",
            ));
        }
        let body = chunks
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(ToolResult::success(format!("Found relevant policy info:\n{body}")))
    }
}
