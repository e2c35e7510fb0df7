//! # biznavi-core
//!
//! The orchestration shell of the BizNavi assistant.
//!
//! This crate provides:
//! - The seam traits (`Tool`, `ReasoningOracle`, `DatasetProvider`,
//!   `KnowledgeIndex`, `ForecastModel`)
//! - The `ToolCatalog`, which validates tool inputs and turns every tool
//!   failure into a readable result
//! - The per-session `ArtifactMailbox` and conversation state
//! - The `Orchestrator`, which routes one query to at most one tool and
//!   appends exactly one turn
//!
//! ## Usage
//!
//! ```rust,ignore
//! use biznavi_core::{Orchestrator, Session, ToolCatalog};
//!
//! let orchestrator = Orchestrator::new(catalog, Box::new(oracle));
//! let session = Session::new();
//! let turn = orchestrator.respond(&session, "total revenue for Kurta in April");
//! ```

pub mod catalog;
pub mod mailbox;
pub mod orchestrator;
pub mod session;
pub mod text;
pub mod traits;

pub use catalog::ToolCatalog;
pub use mailbox::ArtifactMailbox;
pub use orchestrator::Orchestrator;
pub use session::{ConversationState, Phase, Session, SessionId};
