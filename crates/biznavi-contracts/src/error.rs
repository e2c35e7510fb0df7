//! Error types for the BizNavi assistant.
//!
//! Two families live here:
//!
//! - `ToolError` is the failure taxonomy of a capability tool. It never
//!   crosses the tool boundary as an error: the catalog converts it into an
//!   error `ToolResult` the user can read.
//! - `NaviError` covers the runtime around the tools (configuration, catalog
//!   construction, the oracle, data and index providers). All fallible
//!   library operations return `NaviResult<T>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a capability tool could not produce its answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolError {
    /// No dataset or knowledge index is available to answer from.
    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },

    /// The forecast series is shorter than the model needs.
    #[error(
        "not enough data points to forecast for '{category}': found {found} days of history, need at least {required}"
    )]
    InsufficientHistory {
        category: String,
        found: usize,
        required: usize,
    },

    /// The chart tool could not map one of the requested column names.
    #[error("columns '{group_by}' or '{metric}' not found in the dataset")]
    UnresolvedColumn { group_by: String, metric: String },

    /// A category filter matched zero rows.
    #[error("no data found for category '{category}'")]
    UnknownCategory { category: String },

    /// The invocation payload did not match the tool's input contract.
    #[error("invalid input for tool '{tool}': {reason}")]
    InvalidInput { tool: String, reason: String },

    /// Any other failure inside a tool, including panics.
    #[error("tool '{tool}' failed: {reason}")]
    ExecutionFailure { tool: String, reason: String },
}

impl ToolError {
    /// The serializable discriminant for this error.
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::DataUnavailable { .. } => ToolErrorKind::DataUnavailable,
            ToolError::InsufficientHistory { .. } => ToolErrorKind::InsufficientHistory,
            ToolError::UnresolvedColumn { .. } => ToolErrorKind::UnresolvedColumn,
            ToolError::UnknownCategory { .. } => ToolErrorKind::UnknownCategory,
            ToolError::InvalidInput { .. } => ToolErrorKind::InvalidInput,
            ToolError::ExecutionFailure { .. } => ToolErrorKind::ToolExecutionFailure,
        }
    }
}

/// Discriminant of a `ToolError`, carried on error `ToolResult`s so callers
/// can branch without parsing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    DataUnavailable,
    InsufficientHistory,
    UnresolvedColumn,
    UnknownCategory,
    InvalidInput,
    ToolExecutionFailure,
}

/// The unified runtime error type.
#[derive(Debug, Error)]
pub enum NaviError {
    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The tool catalog failed its startup validation.
    #[error("tool catalog error: {reason}")]
    Catalog { reason: String },

    /// The reasoning oracle could not produce a decision.
    #[error("reasoning oracle failed: {reason}")]
    Oracle { reason: String },

    /// The dataset could not be located or parsed.
    #[error("dataset error: {reason}")]
    Dataset { reason: String },

    /// No knowledge index exists at the configured location.
    #[error("knowledge index not built at '{path}'")]
    IndexNotBuilt { path: String },

    /// The knowledge index exists but could not be read or written.
    #[error("knowledge index error: {reason}")]
    Index { reason: String },

    /// The forecast model rejected the series.
    #[error("forecast model error: {reason}")]
    Forecast { reason: String },

    /// A value could not be converted to or from JSON.
    #[error("serialization error: {reason}")]
    Serialization { reason: String },
}

impl From<serde_json::Error> for NaviError {
    fn from(e: serde_json::Error) -> Self {
        NaviError::Serialization {
            reason: e.to_string(),
        }
    }
}

/// Convenience alias used throughout the BizNavi crates.
pub type NaviResult<T> = Result<T, NaviError>;
