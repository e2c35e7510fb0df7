//! The orchestrator: one query in, exactly one turn out.
//!
//! Per-turn cycle:
//!
//!   Idle → Routing → [Invoking → Composing] → Idle
//!
//! The session mailbox is cleared before routing. Routing asks the oracle
//! for a decision. A direct answer skips straight back to Idle; a tool
//! decision runs exactly one tool through the catalog and composes the
//! result with whatever artifact the tool published. Whatever happens, including a failing oracle or an
//! unknown tool name, the cycle ends by appending one `Turn`.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::{debug, info, warn};

use biznavi_contracts::{
    artifact::CHART_SENTINEL,
    conversation::{Route, Turn},
    error::{NaviError, NaviResult},
    tool::{Decision, ToolInvocation, ToolResult},
};

use crate::{
    catalog::ToolCatalog,
    session::{Phase, Session},
    traits::{DatasetProvider, ReasoningOracle, ToolContext},
};

/// Answer shown when a chart was produced but the tool said nothing else.
pub const CHART_ONLY_ANSWER: &str = "Here is the chart you asked for.";

/// Routes queries to tools and records the outcome in a session.
///
/// Holds the immutable catalog and the oracle. One orchestrator can serve
/// any number of sessions; each session brings its own history and mailbox.
pub struct Orchestrator {
    catalog: ToolCatalog,
    oracle: Box<dyn ReasoningOracle>,
    dataset: Option<Arc<dyn DatasetProvider>>,
}

impl Orchestrator {
    pub fn new(catalog: ToolCatalog, oracle: Box<dyn ReasoningOracle>) -> Self {
        Self {
            catalog,
            oracle,
            dataset: None,
        }
    }

    /// Attach the dataset provider the tools read, enabling `reload_dataset()`.
    pub fn with_dataset(mut self, provider: Arc<dyn DatasetProvider>) -> Self {
        self.dataset = Some(provider);
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Signal that the dataset was replaced; the next tool call re-reads it.
    ///
    /// Returns false when no provider was attached.
    pub fn reload_dataset(&self) -> bool {
        match &self.dataset {
            Some(provider) => {
                provider.invalidate();
                info!("dataset invalidated, next tool call reloads it");
                true
            }
            None => false,
        }
    }

    /// Run one full cycle for `query` and return the turn it appended.
    pub fn respond(&self, session: &Session, query: &str) -> Turn {
        let session_id = session.id();
        debug!(session_id = %session_id, turns = session.len(), "turn starting");

        // ── Routing ──────────────────────────────────────────────────────────
        //
        // Clear first so nothing from an earlier turn can be drained below.
        session.mailbox().clear();
        session.set_phase(Phase::Routing);
        let turn = match self.route(session, query) {
            Ok(Decision::Answer(text)) => {
                debug!(session_id = %session_id, "oracle answered directly");
                Turn::new(query, text, None, Route::Direct)
            }
            Ok(Decision::Invoke(invocation)) => self.invoke_and_compose(session, query, invocation),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "routing failed, answering with the error");
                Turn::new(
                    query,
                    format!("Sorry, I could not work out how to answer that: {e}"),
                    None,
                    Route::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        };

        // ── Back to Idle: exactly one turn per query ─────────────────────────
        session.append(turn.clone());
        session.set_phase(Phase::Idle);
        info!(
            session_id = %session_id,
            turns = session.len(),
            chart = turn.artifact.is_some(),
            "turn complete"
        );
        turn
    }

    fn route(&self, session: &Session, query: &str) -> NaviResult<Decision> {
        let descriptors = self.catalog.descriptors();
        let history = session.history();

        panic::catch_unwind(AssertUnwindSafe(|| {
            self.oracle.decide(query, &descriptors, &history)
        }))
        .unwrap_or_else(|_| {
            Err(NaviError::Oracle {
                reason: "the reasoning oracle panicked".to_string(),
            })
        })
    }

    fn invoke_and_compose(&self, session: &Session, query: &str, invocation: ToolInvocation) -> Turn {
        let session_id = session.id();

        if !self.catalog.contains(&invocation.tool) {
            warn!(session_id = %session_id, tool = %invocation.tool, "oracle chose an unknown tool");
            return Turn::new(
                query,
                format!(
                    "Sorry, I tried to use a tool called '{}', but no such tool is available.",
                    invocation.tool
                ),
                None,
                Route::Fallback {
                    reason: format!("unknown tool '{}'", invocation.tool),
                },
            );
        }

        // ── Invoking ─────────────────────────────────────────────────────────
        session.set_phase(Phase::Invoking);
        info!(session_id = %session_id, tool = %invocation.tool, "invoking tool");

        let ctx = ToolContext {
            session_id,
            mailbox: session.mailbox(),
        };
        let result = self.catalog.invoke(&invocation, &ctx);

        // ── Composing ────────────────────────────────────────────────────────
        session.set_phase(Phase::Composing);
        self.compose(session, query, &invocation.tool, result)
    }

    fn compose(&self, session: &Session, query: &str, tool: &str, result: ToolResult) -> Turn {
        let route = Route::Tool {
            name: tool.to_string(),
            status: result.status,
            error_kind: result.error_kind,
        };

        if !result.text.contains(CHART_SENTINEL) {
            return Turn::new(query, result.text, None, route);
        }

        let text = result.text.replace(CHART_SENTINEL, "").trim().to_string();
        let artifact = session.mailbox().drain();

        match (&artifact, result.artifact) {
            (None, _) => warn!(
                session_id = %session.id(),
                tool = %tool,
                "chart announced but mailbox was empty, answering without it"
            ),
            (Some(found), Some(announced)) if found.id != announced => warn!(
                session_id = %session.id(),
                tool = %tool,
                "drained artifact differs from the one the tool announced"
            ),
            _ => {}
        }

        let answer = if text.is_empty() {
            CHART_ONLY_ANSWER.to_string()
        } else {
            text
        };
        Turn::new(query, answer, artifact, route)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
