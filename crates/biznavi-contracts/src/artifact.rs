//! Non-text outputs handed from a tool to the response layer.
//!
//! A tool that renders a chart publishes an `Artifact` into the session
//! mailbox and puts `CHART_SENTINEL` in its result text. The orchestrator
//! sees the sentinel, drains the mailbox, and attaches the artifact to the
//! outgoing turn. The display layer only ever sees `Artifact` and
//! `ChartSpec`; it never learns how the chart was produced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NaviError, NaviResult};

/// Marker a tool places in its result text to say "an artifact is waiting".
pub const CHART_SENTINEL: &str = "CHART_GENERATED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub uuid::Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Chart,
}

/// A serialized non-text output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub kind: ArtifactKind,
    /// Opaque payload; for `Chart` this is a serialized `ChartSpec`.
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// Wrap a chart specification in a fresh artifact.
    pub fn chart(spec: &ChartSpec) -> NaviResult<Self> {
        Ok(Self {
            id: ArtifactId::new(),
            kind: ArtifactKind::Chart,
            payload: serde_json::to_value(spec)?,
            created_at: Utc::now(),
        })
    }

    /// Decode the payload as a chart. Fails for non-chart artifacts.
    pub fn as_chart(&self) -> NaviResult<ChartSpec> {
        match self.kind {
            ArtifactKind::Chart => Ok(serde_json::from_value(self.payload.clone())?),
        }
    }
}

/// A bar chart the display layer can render without knowing its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    /// Dataset column the bars are grouped by.
    pub group_column: String,
    /// Dataset column that was summed.
    pub metric_column: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSpec {
    /// Build a spec from `(label, value)` pairs.
    ///
    /// Fails when no pairs are given; an empty chart has nothing to show.
    pub fn from_pairs(
        title: impl Into<String>,
        group_column: impl Into<String>,
        metric_column: impl Into<String>,
        pairs: Vec<(String, f64)>,
    ) -> NaviResult<Self> {
        if pairs.is_empty() {
            return Err(NaviError::Serialization {
                reason: "chart has no data points".to_string(),
            });
        }
        let (labels, values) = pairs.into_iter().unzip();
        Ok(Self {
            title: title.into(),
            group_column: group_column.into(),
            metric_column: metric_column.into(),
            labels,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over `(label, value)` bars in display order.
    pub fn bars(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}
