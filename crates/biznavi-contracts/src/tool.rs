//! Tool contract types.
//!
//! A tool advertises itself with a `ToolDescriptor`, is selected by a
//! `Decision::Invoke(ToolInvocation)` from the reasoning oracle, and always
//! answers with a `ToolResult`, successful or not.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    artifact::ArtifactId,
    error::{ToolError, ToolErrorKind},
};

/// A capability's advertised contract.
///
/// Descriptors are registered once at startup and never change afterwards.
/// The oracle reads them to decide which tool fits a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name within the catalog (e.g. "forecast_demand").
    pub name: String,
    /// Natural-language guidance on when to use this tool.
    pub description: String,
    /// JSON Schema document the invocation payload must satisfy.
    pub input_schema: Value,
}

/// One routing decision: which tool to call and with what payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub input: Value,
}

impl ToolInvocation {
    pub fn new(tool: impl Into<String>, input: Value) -> Self {
        Self {
            tool: tool.into(),
            input,
        }
    }
}

/// What the reasoning oracle decided to do with a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Invoke exactly one tool.
    Invoke(ToolInvocation),
    /// Answer directly without any tool.
    Answer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Outcome of invoking a tool.
///
/// Error results carry the `ToolErrorKind` so callers and tests can branch
/// on the failure class; the `text` is always suitable for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    pub text: String,
    /// Artifact the tool published to the session mailbox, if any.
    pub artifact: Option<ArtifactId>,
    pub error_kind: Option<ToolErrorKind>,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            text: text.into(),
            artifact: None,
            error_kind: None,
        }
    }

    /// A successful result that announces a published artifact.
    pub fn with_artifact(text: impl Into<String>, artifact: ArtifactId) -> Self {
        Self {
            artifact: Some(artifact),
            ..Self::success(text)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

impl From<ToolError> for ToolResult {
    fn from(err: ToolError) -> Self {
        Self {
            status: ToolStatus::Error,
            text: format!("Error: {err}"),
            artifact: None,
            error_kind: Some(err.kind()),
        }
    }
}
