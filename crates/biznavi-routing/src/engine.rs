//! TOML-driven reasoning oracle implementation.
//!
//! `RuleOracle` loads a `RoutingConfig` from a TOML string or file and
//! implements the `ReasoningOracle` trait from biznavi-core.
//!
//! Decision algorithm:
//!
//! 1. Tokenize the query into lowercase words.
//! 2. For the first rule with a keyword present in the query:
//!    a. a rule whose tool is not in the catalog is skipped;
//!    b. an `answer` rule returns that answer directly;
//!    c. a `tool` rule builds the input payload from its argument rules.
//!       An `after` argument reads the words after a marker, else the words
//!       right before one of its `followed_by` words. A required argument
//!       that cannot be extracted turns into a direct answer asking the user
//!       for it.
//! 3. If no rule matched, apply the fallback the same way.

use std::{collections::BTreeMap, path::Path};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use biznavi_contracts::{
    conversation::Turn,
    error::{NaviError, NaviResult},
    tool::{Decision, ToolDescriptor, ToolInvocation},
};
use biznavi_core::{
    text::{tokenize, words},
    traits::ReasoningOracle,
};

use crate::rule::{ArgumentRule, ArgumentSource, RoutingConfig};

/// Routing rules shipped with the crate.
pub const DEFAULT_ROUTES: &str = include_str!("../routes/default.toml");

/// Words that end an `after` capture in every rule.
const STOP_WORDS: &[&str] = &[
    "for", "in", "by", "of", "next", "over", "during", "and", "with", "from", "to", "this",
    "last", "per", "on", "at", "as", "please", "using", "vs", "versus", "days", "day", "weeks",
    "week", "months", "month", "sales", "demand", "revenue",
];

/// Words skipped at the start of an `after` capture.
const LEADING_ARTICLES: &[&str] = &["the", "a", "an"];

/// Words that end a capture read backwards from a `followed_by` word.
const QUESTION_WORDS: &[&str] = &[
    "what", "how", "much", "many", "will", "would", "does", "do", "did", "is", "are", "can",
    "could", "should", "i", "we", "you", "our", "my", "me", "us", "show", "tell", "expected",
];

/// Answer given when the fallback names a tool the catalog lacks.
const NO_ROUTE_ANSWER: &str =
    "I can analyze sales, look up warehouse policies, forecast demand and draw charts, but I could not match your question to any of those.";

/// A `ReasoningOracle` that routes on keywords declared in TOML.
///
/// ```rust,ignore
/// use biznavi_routing::engine::RuleOracle;
///
/// let oracle = RuleOracle::from_file(Path::new("routes.toml"))?;
/// ```
#[derive(Debug)]
pub struct RuleOracle {
    config: RoutingConfig,
}

impl RuleOracle {
    /// Parse `s` as TOML and build a `RuleOracle`.
    ///
    /// Returns `NaviError::Config` if the TOML is malformed, does not match
    /// `RoutingConfig`, or a rule sets both or neither of `tool`/`answer`.
    pub fn from_toml_str(s: &str) -> NaviResult<Self> {
        let config: RoutingConfig = toml::from_str(s).map_err(|e| NaviError::Config {
            reason: format!("failed to parse routing TOML: {}", e),
        })?;
        validate(&config)?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse it as routing configuration.
    pub fn from_file(path: &Path) -> NaviResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| NaviError::Config {
            reason: format!("failed to read routing file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The oracle built from the bundled default routes.
    pub fn with_default_routes() -> NaviResult<Self> {
        Self::from_toml_str(DEFAULT_ROUTES)
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }
}

impl ReasoningOracle for RuleOracle {
    fn decide(
        &self,
        query: &str,
        catalog: &[ToolDescriptor],
        history: &[Turn],
    ) -> NaviResult<Decision> {
        let tokens = tokenize(query);
        debug!(tokens = tokens.len(), history = history.len(), "routing query");

        if tokens.is_empty() {
            return Ok(Decision::Answer(
                "Please type a question about your sales, policies or demand.".to_string(),
            ));
        }

        let in_catalog = |tool: &str| catalog.iter().any(|d| d.name == tool);

        for rule in &self.config.routes {
            if !rule.matches(&tokens) {
                continue;
            }
            if let Some(tool) = &rule.tool {
                if !in_catalog(tool) {
                    warn!(rule_id = %rule.id, tool = %tool, "matched rule targets a tool not in the catalog");
                    continue;
                }
            }

            debug!(rule_id = %rule.id, "rule matched");
            return Ok(act(
                query,
                rule.tool.as_deref(),
                rule.answer.as_deref(),
                &rule.arguments,
                &rule.keywords,
            ));
        }

        let fallback = &self.config.fallback;
        match fallback.tool.as_deref() {
            Some(tool) if !in_catalog(tool) => {
                warn!(tool = %tool, "fallback tool not in the catalog");
                Ok(Decision::Answer(NO_ROUTE_ANSWER.to_string()))
            }
            tool => {
                debug!("no rule matched, using fallback");
                Ok(act(query, tool, fallback.answer.as_deref(), &fallback.arguments, &[]))
            }
        }
    }
}

fn validate(config: &RoutingConfig) -> NaviResult<()> {
    let check = |id: &str, tool: &Option<String>, answer: &Option<String>| match (tool, answer) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(NaviError::Config {
            reason: format!("route '{id}' must set exactly one of 'tool' or 'answer'"),
        }),
    };

    for rule in &config.routes {
        check(&rule.id, &rule.tool, &rule.answer)?;
        if rule.keywords.is_empty() {
            return Err(NaviError::Config {
                reason: format!("route '{}' has no keywords", rule.id),
            });
        }
        check_arguments(&rule.id, &rule.arguments)?;
    }
    check("fallback", &config.fallback.tool, &config.fallback.answer)?;
    check_arguments("fallback", &config.fallback.arguments)
}

fn check_arguments(id: &str, arguments: &BTreeMap<String, ArgumentRule>) -> NaviResult<()> {
    for (name, arg) in arguments {
        if arg.from != ArgumentSource::Query && arg.markers.is_empty() {
            return Err(NaviError::Config {
                reason: format!("argument '{name}' of route '{id}' needs at least one marker"),
            });
        }
    }
    Ok(())
}

fn act(
    query: &str,
    tool: Option<&str>,
    answer: Option<&str>,
    arguments: &BTreeMap<String, ArgumentRule>,
    keywords: &[String],
) -> Decision {
    let Some(tool) = tool else {
        return Decision::Answer(answer.unwrap_or(NO_ROUTE_ANSWER).to_string());
    };

    let mut input = Map::new();
    for (name, arg) in arguments {
        let extracted = extract(query, arg).or_else(|| {
            (arg.from == ArgumentSource::After)
                .then(|| capture_before(query, &arg.followed_by, &arg.stop, keywords))
                .flatten()
                .map(Value::String)
        });
        match extracted.or_else(|| arg.default.clone()) {
            Some(value) => {
                input.insert(name.clone(), value);
            }
            None => {
                if let Some(prompt) = &arg.prompt {
                    debug!(tool = %tool, argument = %name, "required argument missing, asking back");
                    return Decision::Answer(prompt.clone());
                }
            }
        }
    }

    Decision::Invoke(ToolInvocation::new(tool, Value::Object(input)))
}

/// Read one argument value out of `query`.
pub fn extract(query: &str, arg: &ArgumentRule) -> Option<Value> {
    match arg.from {
        ArgumentSource::Query => {
            let q = query.trim();
            (!q.is_empty()).then(|| Value::String(q.to_string()))
        }
        ArgumentSource::After => capture_after(query, &arg.markers, &arg.stop).map(Value::String),
        ArgumentSource::Number => number_before(query, &arg.markers).map(Value::from),
    }
}

fn is_one_of(word: &str, list: &[String]) -> bool {
    list.iter().any(|m| m.eq_ignore_ascii_case(word))
}

/// The words after the first marker occurrence that yields a non-numeric
/// capture, up to the next stop word.
fn capture_after(query: &str, markers: &[String], stop: &[String]) -> Option<String> {
    let words = words(query);
    let is_stop = |w: &str| {
        STOP_WORDS.iter().any(|s| s.eq_ignore_ascii_case(w)) || is_one_of(w, stop) || is_one_of(w, markers)
    };

    for (i, word) in words.iter().enumerate() {
        if !is_one_of(word, markers) {
            continue;
        }
        let captured: Vec<&str> = words[i + 1..]
            .iter()
            .copied()
            .skip_while(|w| LEADING_ARTICLES.iter().any(|a| a.eq_ignore_ascii_case(w)))
            .take_while(|w| !is_stop(w))
            .collect();

        if captured.is_empty() || captured.iter().all(|w| w.chars().all(|c| c.is_ascii_digit())) {
            continue;
        }
        return Some(captured.join(" "));
    }
    None
}

/// The words right before the first `followed_by` word, read backwards up to
/// a stop word, a question word or one of the rule's own `keywords`.
fn capture_before(
    query: &str,
    followed_by: &[String],
    stop: &[String],
    keywords: &[String],
) -> Option<String> {
    let words = words(query);
    let keyword_words: Vec<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
    let is_stop = |w: &str| {
        let lower = w.to_lowercase();
        STOP_WORDS.contains(&lower.as_str())
            || LEADING_ARTICLES.contains(&lower.as_str())
            || QUESTION_WORDS.contains(&lower.as_str())
            || keyword_words.contains(&lower)
            || is_one_of(w, stop)
            || is_one_of(w, followed_by)
    };

    for (i, word) in words.iter().enumerate() {
        if !is_one_of(word, followed_by) {
            continue;
        }
        let mut captured: Vec<&str> = words[..i]
            .iter()
            .rev()
            .copied()
            .take_while(|w| !is_stop(w))
            .collect();
        captured.reverse();

        if captured.is_empty() || captured.iter().all(|w| w.chars().all(|c| c.is_ascii_digit())) {
            continue;
        }
        return Some(captured.join(" "));
    }
    None
}

/// An integer immediately followed by one of the unit `markers`.
fn number_before(query: &str, markers: &[String]) -> Option<u64> {
    let words = words(query);
    words
        .windows(2)
        .find(|pair| is_one_of(pair[1], markers) && pair[0].parse::<u64>().is_ok())
        .and_then(|pair| pair[0].parse().ok())
}
