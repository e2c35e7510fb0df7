//! Trait definitions for every seam of the assistant.
//!
//! - `Tool`             : a capability the orchestrator can invoke
//! - `ReasoningOracle`  : picks a tool or answers directly (may be an LLM)
//! - `DatasetProvider`  : supplies the current sales dataset
//! - `KnowledgeIndex`   : retrieves policy text for a query
//! - `ForecastModel`    : fits a demand series and predicts ahead
//!
//! The orchestrator and tools only ever hold these as `dyn` trait objects,
//! so tests substitute deterministic fakes for all of them.

use chrono::NaiveDate;
use serde_json::Value;

use biznavi_contracts::{
    conversation::Turn,
    dataset::DatasetView,
    error::{NaviResult, ToolError},
    tool::{Decision, ToolDescriptor, ToolResult},
};

use crate::{mailbox::ArtifactMailbox, session::SessionId};

/// Everything a tool may touch besides its own injected dependencies.
///
/// The mailbox is the session's artifact slot. Tools publish into it; only
/// the orchestrator clears and drains it.
pub struct ToolContext<'a> {
    pub session_id: &'a SessionId,
    pub mailbox: &'a ArtifactMailbox,
}

/// A single-purpose capability with a fixed input/output contract.
pub trait Tool: Send + Sync {
    /// The contract advertised to the oracle. Must be stable across calls.
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool on a payload that already passed schema validation.
    ///
    /// Implementations report failures as `ToolError`; the catalog turns
    /// them (and any panic) into an error `ToolResult`.
    fn run(&self, input: &Value, ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError>;
}

/// Maps a free-text query to one tool invocation or a direct answer.
pub trait ReasoningOracle: Send + Sync {
    /// Decide what to do with `query`, given the advertised tools and the
    /// full conversation so far (oldest turn first).
    fn decide(
        &self,
        query: &str,
        catalog: &[ToolDescriptor],
        history: &[Turn],
    ) -> NaviResult<Decision>;
}

/// Supplies the dataset the tools read.
pub trait DatasetProvider: Send + Sync {
    /// The current dataset and where it came from.
    fn current(&self) -> NaviResult<DatasetView>;

    /// Drop any cached view so the next `current()` re-reads the source.
    fn invalidate(&self);
}

/// Nearest-neighbour retrieval over policy documents.
pub trait KnowledgeIndex: Send + Sync {
    /// Return up to `k` chunks, most relevant first.
    ///
    /// Returns `NaviError::IndexNotBuilt` when no index exists yet.
    fn search(&self, query: &str, k: usize) -> NaviResult<Vec<String>>;
}

/// A demand model over a daily quantity series.
pub trait ForecastModel: Send + Sync {
    /// Fit on `series` (ascending by date) and predict the `horizon_days`
    /// days that follow its last date.
    fn fit_and_predict(
        &self,
        series: &[(NaiveDate, f64)],
        horizon_days: u32,
    ) -> NaviResult<Vec<(NaiveDate, f64)>>;
}
