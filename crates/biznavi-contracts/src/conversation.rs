//! Conversation turn types.
//!
//! A `Turn` is one completed exchange: the user's query and the assistant's
//! answer, plus the chart that came with it, if any. The orchestrator
//! appends exactly one turn per query, so the history length always equals
//! the number of queries answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{artifact::Artifact, error::ToolErrorKind, tool::ToolStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub uuid::Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged message, the view display layers and oracles consume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Message<'a> {
    pub role: Role,
    pub text: &'a str,
}

/// Which path the orchestrator took to produce a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum Route {
    /// The oracle answered without a tool.
    Direct,
    /// Exactly one tool was invoked.
    Tool {
        name: String,
        status: ToolStatus,
        error_kind: Option<ToolErrorKind>,
    },
    /// The oracle failed or chose a tool that does not exist.
    Fallback { reason: String },
}

/// One immutable exchange in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub query: String,
    pub answer: String,
    pub artifact: Option<Artifact>,
    pub route: Route,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        query: impl Into<String>,
        answer: impl Into<String>,
        artifact: Option<Artifact>,
        route: Route,
    ) -> Self {
        Self {
            id: TurnId::new(),
            query: query.into(),
            answer: answer.into(),
            artifact,
            route,
            created_at: Utc::now(),
        }
    }

    /// The user message followed by the assistant message.
    pub fn messages(&self) -> [Message<'_>; 2] {
        [
            Message {
                role: Role::User,
                text: &self.query,
            },
            Message {
                role: Role::Assistant,
                text: &self.answer,
            },
        ]
    }
}
