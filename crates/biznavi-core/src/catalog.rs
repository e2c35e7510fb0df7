//! The tool catalog: the tool boundary.
//!
//! `ToolCatalog` is built once at startup from a fixed list of tools and is
//! immutable afterwards. Building validates every descriptor (unique
//! name, non-empty description, compilable object input schema) and keeps
//! the compiled schema next to the tool.
//!
//! `invoke()` is the only way the orchestrator calls a tool. It never fails:
//!
//! 1. the payload is validated against the compiled input schema;
//!    violations become `ToolError::InvalidInput` and the tool is not run;
//! 2. the tool runs inside `catch_unwind`; a panic becomes
//!    `ToolError::ExecutionFailure`;
//! 3. any `ToolError` the tool returns becomes an error `ToolResult`.

use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
};

use serde_json::Value;
use tracing::{debug, warn};

use biznavi_contracts::{
    error::{NaviError, NaviResult, ToolError},
    tool::{ToolDescriptor, ToolInvocation, ToolResult},
};

use crate::traits::{Tool, ToolContext};

struct CatalogEntry {
    descriptor: ToolDescriptor,
    validator: jsonschema::Validator,
    tool: Box<dyn Tool>,
}

/// Collects tools before validation. Obtain via `ToolCatalog::builder()`.
#[derive(Default)]
pub struct ToolCatalogBuilder {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolCatalogBuilder {
    pub fn register(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn register_boxed(mut self, tool: Box<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Validate every descriptor and freeze the catalog.
    ///
    /// Returns `NaviError::Catalog` on the first invalid or duplicate tool.
    pub fn build(self) -> NaviResult<ToolCatalog> {
        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(self.tools.len());

        for tool in self.tools {
            let descriptor = tool.descriptor();

            if descriptor.name.trim().is_empty() {
                return Err(catalog_error("tool registered with an empty name".to_string()));
            }
            if !names.insert(descriptor.name.clone()) {
                return Err(catalog_error(format!(
                    "duplicate tool name '{}'",
                    descriptor.name
                )));
            }
            if descriptor.description.trim().is_empty() {
                return Err(catalog_error(format!(
                    "tool '{}' has no usage description",
                    descriptor.name
                )));
            }
            if descriptor.input_schema.get("type").and_then(Value::as_str) != Some("object") {
                return Err(catalog_error(format!(
                    "tool '{}' input schema must be a JSON object schema",
                    descriptor.name
                )));
            }

            let validator = jsonschema::validator_for(&descriptor.input_schema).map_err(|e| {
                catalog_error(format!(
                    "tool '{}' input schema does not compile: {e}",
                    descriptor.name
                ))
            })?;

            debug!(tool = %descriptor.name, "tool registered");
            entries.push(CatalogEntry {
                descriptor,
                validator,
                tool,
            });
        }

        Ok(ToolCatalog { entries })
    }
}

/// The immutable set of tools available to the orchestrator.
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
}

impl ToolCatalog {
    pub fn builder() -> ToolCatalogBuilder {
        ToolCatalogBuilder::default()
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the named tool. Every failure comes back as an error result.
    pub fn invoke(&self, invocation: &ToolInvocation, ctx: &ToolContext<'_>) -> ToolResult {
        let Some(entry) = self.entry(&invocation.tool) else {
            warn!(tool = %invocation.tool, "invocation of unregistered tool");
            return ToolError::InvalidInput {
                tool: invocation.tool.clone(),
                reason: "no such tool is registered".to_string(),
            }
            .into();
        };

        let violations: Vec<String> = entry
            .validator
            .iter_errors(&invocation.input)
            .map(|e| format!("{} (at '{}')", e, e.instance_path))
            .collect();
        if !violations.is_empty() {
            warn!(
                session_id = %ctx.session_id,
                tool = %invocation.tool,
                violations = violations.len(),
                "tool input rejected by schema"
            );
            return ToolError::InvalidInput {
                tool: invocation.tool.clone(),
                reason: violations.join("; "),
            }
            .into();
        }

        debug!(session_id = %ctx.session_id, tool = %invocation.tool, "running tool");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            entry.tool.run(&invocation.input, ctx)
        }));

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                debug!(tool = %invocation.tool, kind = ?err.kind(), "tool reported an error");
                err.into()
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(tool = %invocation.tool, %reason, "tool panicked");
                ToolError::ExecutionFailure {
                    tool: invocation.tool.clone(),
                    reason,
                }
                .into()
            }
        }
    }

    fn entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.descriptor.name == name)
    }
}

fn catalog_error(reason: String) -> NaviError {
    NaviError::Catalog { reason }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use serde_json::{json, Value};

    use biznavi_contracts::{
        error::{NaviError, ToolError, ToolErrorKind},
        tool::{ToolDescriptor, ToolInvocation, ToolResult, ToolStatus},
    };

    use crate::{
        mailbox::ArtifactMailbox,
        session::SessionId,
        traits::{Tool, ToolContext},
    };

    use super::ToolCatalog;

    // ── Mock tools ───────────────────────────────────────────────────────────

    struct EchoTool {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Tool for EchoTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: self.name.to_string(),
                description: "Echoes the query back.".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            }
        }

        fn run(&self, input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolResult::success(input["query"].as_str().unwrap_or_default()))
        }
    }

    struct FailingTool;

    impl Tool for FailingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: "failing".to_string(),
                description: "Always reports missing data.".to_string(),
                input_schema: json!({ "type": "object" }),
            }
        }

        fn run(&self, _input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
            Err(ToolError::DataUnavailable {
                reason: "sales data is not loaded".to_string(),
            })
        }
    }

    struct PanickingTool;

    impl Tool for PanickingTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: "panicking".to_string(),
                description: "Panics on every call.".to_string(),
                input_schema: json!({ "type": "object" }),
            }
        }

        fn run(&self, _input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
            panic!("index out of bounds");
        }
    }

    struct SchemalessTool;

    impl Tool for SchemalessTool {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor {
                name: "schemaless".to_string(),
                description: "Has no input schema.".to_string(),
                input_schema: Value::Null,
            }
        }

        fn run(&self, _input: &Value, _ctx: &ToolContext<'_>) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::success("unreachable"))
        }
    }

    fn invoke(catalog: &ToolCatalog, tool: &str, input: Value) -> ToolResult {
        let session_id = SessionId::new();
        let mailbox = ArtifactMailbox::new();
        let ctx = ToolContext {
            session_id: &session_id,
            mailbox: &mailbox,
        };
        catalog.invoke(&ToolInvocation::new(tool, input), &ctx)
    }

    // ── Build validation ─────────────────────────────────────────────────────

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ToolCatalog::builder()
            .register(EchoTool::new("echo"))
            .register(EchoTool::new("echo"))
            .build();

        match result {
            Err(NaviError::Catalog { reason }) => assert!(reason.contains("duplicate")),
            Err(other) => panic!("expected Catalog error, got {other:?}"),
            Ok(_) => panic!("expected Catalog error, got a catalog"),
        }
    }

    #[test]
    fn missing_schema_is_rejected() {
        let result = ToolCatalog::builder().register(SchemalessTool).build();
        assert!(matches!(result, Err(NaviError::Catalog { .. })));
    }

    #[test]
    fn descriptors_keep_registration_order() {
        let catalog = ToolCatalog::builder()
            .register(EchoTool::new("b"))
            .register(EchoTool::new("a"))
            .build()
            .unwrap();
        let names: Vec<String> = catalog.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(catalog.contains("a"));
        assert!(!catalog.contains("c"));
    }

    // ── Invocation boundary ──────────────────────────────────────────────────

    #[test]
    fn valid_input_runs_the_tool() {
        let echo = EchoTool::new("echo");
        let calls = Arc::clone(&echo.calls);
        let catalog = ToolCatalog::builder().register(echo).build().unwrap();

        let result = invoke(&catalog, "echo", json!({ "query": "hello" }));

        assert_eq!(result.status, ToolStatus::Success);
        assert_eq!(result.text, "hello");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn schema_violation_never_reaches_the_tool() {
        let echo = EchoTool::new("echo");
        let calls = Arc::clone(&echo.calls);
        let catalog = ToolCatalog::builder().register(echo).build().unwrap();

        let result = invoke(&catalog, "echo", json!({ "query": 42 }));

        assert_eq!(result.error_kind, Some(ToolErrorKind::InvalidInput));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "run() must not be called");
    }

    #[test]
    fn tool_error_becomes_error_result() {
        let catalog = ToolCatalog::builder().register(FailingTool).build().unwrap();
        let result = invoke(&catalog, "failing", json!({}));

        assert_eq!(result.status, ToolStatus::Error);
        assert_eq!(result.error_kind, Some(ToolErrorKind::DataUnavailable));
        assert!(result.text.contains("sales data is not loaded"));
    }

    #[test]
    fn panic_becomes_execution_failure() {
        let catalog = ToolCatalog::builder().register(PanickingTool).build().unwrap();
        let result = invoke(&catalog, "panicking", json!({}));

        assert_eq!(result.error_kind, Some(ToolErrorKind::ToolExecutionFailure));
        assert!(result.text.contains("index out of bounds"));
    }

    #[test]
    fn unknown_tool_is_an_error_result() {
        let catalog = ToolCatalog::builder().build().unwrap();
        let result = invoke(&catalog, "nope", json!({}));
        assert_eq!(result.status, ToolStatus::Error);
    }
}
