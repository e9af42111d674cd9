//! Napier runtime — tool-call orchestration between a language model and
//! an MCP tool server.
//!
//! The model never calls tools natively here. It is told which tools exist
//! and asked to write each call as a fenced `json` block; the runtime finds
//! those blocks in the reply, runs them against the live session, and feeds
//! every result back for a follow-up answer.
//!
//! # Overview
//!
//! - **ToolCatalog**: the tools the session advertises, rendered for the model.
//! - **prompt**: the instruction block and its fixed tool-call contract.
//! - **extract**: finds and parses tagged blocks in model output.
//! - **dispatch**: validates one invocation and runs it on the session.
//! - **Conversation**: append-only history re-sent on every model call.
//! - **Orchestrator**: drives one query through all of the above.
//! - **Backend** / **ToolSession**: the injected model and tool capabilities,
//!   implemented by [`GeminiBackend`] and [`McpSession`].
//!
//! # Example
//!
//! ```ignore
//! use runtime::{GeminiBackend, Launcher, McpSession, Orchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = GeminiBackend::builder("api-key", "gemini-1.5-pro").build();
//! let session = McpSession::launch("./weather.py", &Launcher::default()).await?;
//!
//! let mut orchestrator = Orchestrator::new(backend);
//! orchestrator.connect(session);
//! let answer = orchestrator.process_query("What's the weather in Paris?").await?;
//! println!("{}", answer.text);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod conversation;
pub mod dispatch;
mod error;
pub mod extract;
pub mod history;
pub mod model;
mod orchestrator;
pub mod prompt;
mod providers;
mod session;

#[cfg(test)]
mod testing;

pub use catalog::{ToolCatalog, ToolDescriptor};
pub use conversation::{Conversation, Role, Turn};
pub use dispatch::{DispatchError, Outcome, ToolResult};
pub use error::{Error, Result};
pub use extract::{MalformedInvocation, ToolInvocation};
pub use history::{HistoryPolicy, KeepAll, LastTurns};
pub use model::{Backend, ModelError, ModelRequest, ModelResponse, Usage};
pub use orchestrator::{Answer, Orchestrator};
pub use providers::{GeminiBackend, GeminiBackendBuilder};
pub use session::{Launcher, McpSession, SessionError, ToolSession};
