//! Plain-text rendering of turns and chart artifacts for the terminal.

use biznavi_contracts::{artifact::ChartSpec, conversation::Turn};
use biznavi_tools::format;

/// Width of the longest bar, in characters.
pub const BAR_WIDTH: usize = 40;

/// A horizontal bar chart: title, then one line per bar.
///
/// ```text
/// Total Amount by Category (Top 10)
///   Set    ████████████████████████████████████████ 1,200.00
///   Kurta  ████████████████ 500.00
/// ```
pub fn render_chart(spec: &ChartSpec) -> String {
    let label_width = spec.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let max = spec.values.iter().copied().fold(0.0_f64, f64::max);

    let mut out = spec.title.clone();
    for (label, value) in spec.bars() {
        let len = if max > 0.0 && value > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round().max(1.0) as usize
        } else {
            0
        };
        out.push_str(&format!(
            "\n  {label:<label_width$}  {} {}",
            "█".repeat(len),
            format::grouped(value)
        ));
    }
    out
}

/// The assistant's side of a turn, followed by its chart when it has one.
pub fn render_turn(turn: &Turn) -> String {
    let mut out = turn.answer.clone();
    if let Some(chart) = turn.artifact.as_ref().and_then(|a| a.as_chart().ok()) {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&render_chart(&chart));
    }
    out
}
