//! Routing rule types and configuration schema.
//!
//! A `RoutingConfig` is deserialized from TOML and holds an ordered list of
//! `RouteRule`s plus a `FallbackRule`. Rules are evaluated in declaration
//! order and the first rule with a matching keyword wins. Queries that match
//! no rule go to the fallback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where an argument value is read from in the query text.
///
/// Example in TOML:
/// ```toml
/// from = "query"    # the whole query
/// from = "after"    # the words following one of `markers`
/// from = "number"   # an integer followed by one of `markers`
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSource {
    Query,
    After,
    Number,
}

/// How to fill one field of a tool's input payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentRule {
    pub from: ArgumentSource,

    /// Marker words. For `after`, the words that precede the value
    /// ("for", "by"); for `number`, the unit words that follow it ("days").
    #[serde(default)]
    pub markers: Vec<String>,

    /// Extra words that end an `after` capture, on top of the built-in list.
    #[serde(default)]
    pub stop: Vec<String>,

    /// For `after`: words the value directly precedes ("Kurta demand"),
    /// tried when no marker yields a capture.
    #[serde(default)]
    pub followed_by: Vec<String>,

    /// Used when nothing could be extracted.
    pub default: Option<Value>,

    /// Asked back to the user when nothing was extracted and there is no
    /// default. Without a prompt the field is simply left out.
    pub prompt: Option<String>,
}

/// A single routing rule loaded from TOML.
///
/// Exactly one of `tool` and `answer` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRule {
    /// Stable identifier used in logs.
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Words or phrases that select this rule, matched as whole words.
    pub keywords: Vec<String>,

    /// Tool to invoke when the rule matches.
    pub tool: Option<String>,

    /// Fixed direct answer when the rule matches.
    pub answer: Option<String>,

    /// Input payload fields, keyed by field name.
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentRule>,
}

impl RouteRule {
    /// Return true if any keyword of this rule appears in `tokens`.
    pub fn matches(&self, tokens: &[String]) -> bool {
        self.keywords
            .iter()
            .any(|k| biznavi_core::text::contains_phrase(tokens, k))
    }
}

/// What to do with a query no rule matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRule {
    pub tool: Option<String>,
    pub answer: Option<String>,
    #[serde(default)]
    pub arguments: BTreeMap<String, ArgumentRule>,
}

/// The top-level structure deserialized from a TOML routes file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Ordered list of rules. First match wins.
    #[serde(default)]
    pub routes: Vec<RouteRule>,
    pub fallback: FallbackRule,
}
