//! # biznavi-contracts
//!
//! Shared types, tool contracts, and error enums for the BizNavi assistant.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod artifact;
pub mod conversation;
pub mod dataset;
pub mod error;
pub mod tool;

#[cfg(test)]
mod tests {
    use super::*;
    use artifact::{Artifact, ArtifactKind, ChartSpec};
    use conversation::{Role, Route, Turn};
    use dataset::{parse_date, parse_number, Dataset};
    use error::{ToolError, ToolErrorKind};
    use tool::{ToolResult, ToolStatus};

    fn sample_dataset() -> Dataset {
        Dataset::new(
            vec!["Date".into(), " Category ".into(), "Amount".into()],
            vec![
                vec!["04-30-22".into(), "Kurta".into(), "500".into()],
                vec!["04-29-22".into(), "Set".into(), "n/a".into()],
                vec!["04-28-22".into(), "Kurta".into()],
            ],
        )
    }

    // ── Dataset ──────────────────────────────────────────────────────────────

    #[test]
    fn resolve_column_ignores_case_and_padding() {
        let ds = sample_dataset();
        assert_eq!(ds.resolve_column("category"), Some(1));
        assert_eq!(ds.resolve_column("AMOUNT"), Some(2));
        assert_eq!(ds.resolve_column("Region"), None);
    }

    #[test]
    fn missing_and_invalid_cells_read_as_zero() {
        let ds = sample_dataset();
        let amounts: Vec<f64> = ds.rows().map(|r| r.number(2)).collect();
        assert_eq!(amounts, vec![500.0, 0.0, 0.0]);
    }

    #[test]
    fn distinct_values_keep_first_seen_order() {
        let ds = sample_dataset();
        assert_eq!(ds.distinct_values(1), vec!["Kurta".to_string(), "Set".to_string()]);
    }

    #[test]
    fn parse_date_prefers_month_first() {
        let d = parse_date("04-05-22").unwrap();
        assert_eq!(d.to_string(), "2022-04-05");
        assert_eq!(parse_date("2022-04-30").unwrap().to_string(), "2022-04-30");
        assert_eq!(parse_date("04/30/2022").unwrap().to_string(), "2022-04-30");
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn parse_number_rejects_non_finite() {
        assert_eq!(parse_number(" 12.5 "), 12.5);
        assert_eq!(parse_number("NaN"), 0.0);
        assert_eq!(parse_number("inf"), 0.0);
    }

    // ── ToolResult ───────────────────────────────────────────────────────────

    #[test]
    fn tool_error_converts_to_error_result() {
        let result = ToolResult::from(ToolError::UnresolvedColumn {
            group_by: "Region".to_string(),
            metric: "Amount".to_string(),
        });
        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.error_kind, Some(ToolErrorKind::UnresolvedColumn));
        assert!(result.text.contains("Region"));
        assert!(result.text.contains("Amount"));
        assert!(result.artifact.is_none());
    }

    #[test]
    fn insufficient_history_message_names_threshold() {
        let err = ToolError::InsufficientHistory {
            category: "Kurta".to_string(),
            found: 9,
            required: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("Kurta"));
        assert!(msg.contains("at least 10"));
        assert_eq!(err.kind(), ToolErrorKind::InsufficientHistory);
    }

    // ── Artifact ─────────────────────────────────────────────────────────────

    #[test]
    fn chart_artifact_decodes_its_spec() {
        let spec = ChartSpec::from_pairs(
            "Total Amount by Category (Top 10)",
            "Category",
            "Amount",
            vec![("Set".to_string(), 900.0), ("Kurta".to_string(), 500.0)],
        )
        .unwrap();
        let artifact = Artifact::chart(&spec).unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Chart);
        assert_eq!(artifact.as_chart().unwrap(), spec);
        assert_eq!(spec.bars().next(), Some(("Set", 900.0)));
    }

    #[test]
    fn empty_chart_is_rejected() {
        assert!(ChartSpec::from_pairs("t", "g", "m", vec![]).is_err());
    }

    // ── Turn ─────────────────────────────────────────────────────────────────

    #[test]
    fn turn_exposes_user_then_assistant_messages() {
        let turn = Turn::new("hi", "hello", None, Route::Direct);
        let [user, assistant] = turn.messages();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.text, "hi");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.text, "hello");
    }
}
