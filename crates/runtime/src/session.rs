//! Tool sessions.
//!
//! A [`ToolSession`] is the live connection the dispatcher calls into.
//! [`McpSession`] is the production implementation: an MCP server spawned
//! as a child process and driven through the official rmcp SDK.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Launcher, McpSession, ToolSession};
//!
//! # async fn example() -> Result<(), runtime::SessionError> {
//! let session = McpSession::launch("./weather.py", &Launcher::default()).await?;
//! for tool in session.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//! session.shutdown().await
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};

use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, Tool},
    service::{RoleClient, RunningService},
    transport::{ConfigureCommandExt, TokioChildProcess},
};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::catalog::ToolDescriptor;

/// Errors raised by a tool session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("server script must be a .py or .js file: {0}")]
    UnsupportedScript(PathBuf),

    #[error("failed to launch MCP server {path}: {message}")]
    Launch { path: PathBuf, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("tool reported an error: {0}")]
    ToolReported(String),
}

/// A live connection to a tool-hosting endpoint.
pub trait ToolSession: Send + Sync {
    /// List the tools the endpoint advertises, in server order.
    fn list_tools(&self) -> impl Future<Output = Result<Vec<ToolDescriptor>, SessionError>> + Send;

    /// Invoke a tool and return its payload rendered as text.
    fn call_tool(
        &self,
        name: &str,
        parameters: Map<String, Value>,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// Interpreters used to run server scripts.
#[derive(Debug, Clone)]
pub struct Launcher {
    pub python: String,
    pub node: String,
}

impl Default for Launcher {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            node: "node".to_string(),
        }
    }
}

impl Launcher {
    /// Pick the interpreter for a server script from its extension.
    pub fn command_for(&self, script: &Path) -> Result<&str, SessionError> {
        match script.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Ok(&self.python),
            Some("js") => Ok(&self.node),
            _ => Err(SessionError::UnsupportedScript(script.to_path_buf())),
        }
    }
}

/// An MCP client connected to a server process.
pub struct McpSession {
    service: RunningService<RoleClient, ()>,
    script: PathBuf,
}

impl McpSession {
    /// Spawn the server script under its interpreter and complete the handshake.
    pub async fn launch(script: impl AsRef<Path>, launcher: &Launcher) -> Result<Self, SessionError> {
        let script = script.as_ref().to_path_buf();
        let command = launcher.command_for(&script)?;
        info!(command, script = %script.display(), "launching MCP server");

        let launch_error = |message: String| SessionError::Launch {
            path: script.clone(),
            message,
        };

        let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
            cmd.arg(&script);
        }))
        .map_err(|e| launch_error(e.to_string()))?;

        let service = ().serve(transport).await.map_err(|e| launch_error(e.to_string()))?;

        Ok(Self { service, script })
    }

    /// Path of the server script this session runs.
    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Cancel the service and terminate the server process.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        let reason = self
            .service
            .cancel()
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        debug!(?reason, script = %self.script.display(), "MCP session closed");
        Ok(())
    }
}

impl ToolSession for McpSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        let response = self
            .service
            .list_tools(Default::default())
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;
        Ok(response.tools.into_iter().map(ToolDescriptor::from).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        parameters: Map<String, Value>,
    ) -> Result<String, SessionError> {
        let params = CallToolRequestParams {
            name: name.to_string().into(),
            arguments: Some(parameters),
            meta: None,
            task: None,
        };

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| SessionError::Protocol(e.to_string()))?;

        payload_text(&result)
    }
}

impl From<Tool> for ToolDescriptor {
    fn from(tool: Tool) -> Self {
        Self {
            name: tool.name.into_owned(),
            description: tool.description.map(|d| d.into_owned()).unwrap_or_default(),
            input_schema: Value::Object(tool.input_schema.as_ref().clone()),
        }
    }
}

/// Render a tool payload as text: text items verbatim, anything else as JSON.
///
/// A payload the server flags as an error becomes [`SessionError::ToolReported`].
fn payload_text(result: &CallToolResult) -> Result<String, SessionError> {
    let text = result
        .content
        .iter()
        .map(|item| match item.as_text() {
            Some(text) => text.text.clone(),
            None => serde_json::to_string(item).unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error.unwrap_or(false) {
        return Err(SessionError::ToolReported(text));
    }
    Ok(text)
}
