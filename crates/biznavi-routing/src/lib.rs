//! # biznavi-routing
//!
//! A TOML-driven, first-match-wins keyword oracle for the BizNavi assistant.
//!
//! ## Overview
//!
//! This crate provides [`RuleOracle`], which implements the
//! [`ReasoningOracle`](biznavi_core::traits::ReasoningOracle) trait without
//! any language model. Rules are declared in a TOML file, evaluated in
//! order, and the first rule whose keywords appear in the query decides
//! between a tool invocation and a fixed answer. Anything unmatched goes to
//! the fallback, by default the sales analysis tool.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use biznavi_routing::RuleOracle;
//!
//! let oracle = RuleOracle::with_default_routes()?;
//! // Pass `Box::new(oracle)` to `biznavi_core::Orchestrator::new(...)`.
//! ```

pub mod engine;
pub mod rule;

pub use engine::{RuleOracle, DEFAULT_ROUTES};
pub use rule::{ArgumentRule, ArgumentSource, FallbackRule, RouteRule, RoutingConfig};

// ── Tests ─────────────────────────────────────────────────────────────────────
