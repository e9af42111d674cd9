//! Validation and execution of tool invocations.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::ToolCatalog;
use crate::extract::ToolInvocation;
use crate::session::ToolSession;

/// Why a dispatch produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool {tool} failed: {message}")]
    ToolExecutionFailed { tool: String, message: String },
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(DispatchError),
}

/// The payload returned for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_name: String,
    /// Text rendering of the payload; empty on failure.
    pub content: String,
    pub outcome: Outcome,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            content: content.into(),
            outcome: Outcome::Success,
        }
    }

    pub fn failure(tool_name: impl Into<String>, error: DispatchError) -> Self {
        Self {
            tool_name: tool_name.into(),
            content: String::new(),
            outcome: Outcome::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    /// Marker shown to the user ahead of the model's follow-up reply.
    pub fn marker(&self) -> String {
        format!("\n[Tool Result: {}]\n{}\n", self.tool_name, self.content)
    }
}

/// Validate an invocation against the catalog and run it on the session.
///
/// Never returns an error: every failure is captured in the result outcome.
pub async fn dispatch<S: ToolSession>(
    invocation: &ToolInvocation,
    catalog: &ToolCatalog,
    session: &S,
) -> ToolResult {
    let name = invocation.tool_name.as_str();
    if !catalog.contains(name) {
        warn!(tool = name, "model requested a tool that is not in the catalog");
        return ToolResult::failure(name, DispatchError::UnknownTool(name.to_string()));
    }

    info!(tool = name, "executing tool");
    let parameters = Value::Object(invocation.parameters.clone());
    debug!(tool = name, parameters = %parameters, "tool parameters");

    match session.call_tool(name, invocation.parameters.clone()).await {
        Ok(content) => ToolResult::success(name, content),
        Err(e) => {
            warn!(tool = name, error = %e, "tool execution failed");
            ToolResult::failure(
                name,
                DispatchError::ToolExecutionFailed {
                    tool: name.to_string(),
                    message: e.to_string(),
                },
            )
        }
    }
}
