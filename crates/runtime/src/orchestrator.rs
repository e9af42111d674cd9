//! The tool-call orchestration loop.
//!
//! One call to [`Orchestrator::process_query`] takes a user query through
//! the whole cycle: refresh the catalog, compose the instruction, ask the
//! model, extract tagged invocations, dispatch them one at a time in
//! appearance order, and ask the model to follow up on every successful
//! result. Per-block failures become inline diagnostics in the answer;
//! only a failed model call or an unusable session abandons the query.

use tracing::{debug, warn};

use crate::catalog::ToolCatalog;
use crate::conversation::Conversation;
use crate::dispatch::{Outcome, ToolResult, dispatch};
use crate::extract::{MalformedInvocation, extract};
use crate::history::{HistoryPolicy, KeepAll};
use crate::model::{Backend, ModelRequest, types::DEFAULT_TEMPERATURE};
use crate::prompt;
use crate::session::ToolSession;
use crate::{Error, Result};

/// The user-visible outcome of one query.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Final text: the raw model reply when no tool was requested, otherwise
    /// each result marker and follow-up reply (or inline error) in order.
    pub text: String,
    /// Every invocation handed to the dispatcher, in dispatch order.
    pub results: Vec<ToolResult>,
    /// Tagged blocks that could not be parsed.
    pub malformed: Vec<MalformedInvocation>,
}

/// Drives queries against an injected model backend and tool session.
pub struct Orchestrator<B, S> {
    backend: B,
    session: Option<S>,
    catalog: ToolCatalog,
    conversation: Conversation,
    history: Box<dyn HistoryPolicy>,
    temperature: f32,
}

impl<B: Backend, S: ToolSession> Orchestrator<B, S> {
    /// Create a disconnected orchestrator.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session: None,
            catalog: ToolCatalog::new(),
            conversation: Conversation::new(),
            history: Box::new(KeepAll),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Choose which part of the conversation is sent to the model.
    pub fn with_history_policy(mut self, policy: Box<dyn HistoryPolicy>) -> Self {
        self.history = policy;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Attach a session, returning the one it replaces.
    ///
    /// The catalog is cleared; tools are never carried across sessions.
    pub fn connect(&mut self, session: S) -> Option<S> {
        self.catalog = ToolCatalog::new();
        self.session.replace(session)
    }

    /// Detach the current session, if any.
    pub fn disconnect(&mut self) -> Option<S> {
        self.catalog = ToolCatalog::new();
        self.session.take()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Fetch the current session's tools into the catalog.
    pub async fn refresh_catalog(&mut self) -> Result<&ToolCatalog> {
        self.catalog.refresh(self.session.as_ref()).await?;
        debug!(tools = self.catalog.len(), "catalog refreshed");
        Ok(&self.catalog)
    }

    /// Run one user query to completion.
    pub async fn process_query(&mut self, query: &str) -> Result<Answer> {
        self.refresh_catalog().await?;

        self.conversation.append_user(query);
        let prompt = prompt::compose(&self.catalog.render(), query);

        let history = self.history.window(self.conversation.snapshot());
        let request = ModelRequest::new(history, &prompt.query)
            .with_instruction(&prompt.instruction)
            .with_temperature(self.temperature);
        let response = self.backend.call(request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model replied"
        );
        self.conversation.append_model(response.text.clone());

        let candidates = extract(&response.text);
        if candidates.is_empty() {
            return Ok(Answer {
                text: response.text,
                results: Vec::new(),
                malformed: Vec::new(),
            });
        }
        debug!(blocks = candidates.len(), "tool call blocks found");

        let mut parts = Vec::new();
        let mut results = Vec::new();
        let mut malformed = Vec::new();

        for candidate in candidates {
            let invocation = match candidate {
                Ok(invocation) => invocation,
                Err(e) => {
                    warn!(block = e.block, reason = %e.reason, "malformed tool call");
                    parts.push(format!("Error: Invalid tool call format detected ({e})."));
                    malformed.push(e);
                    continue;
                }
            };

            let session = self.session.as_ref().ok_or(Error::SessionUnavailable)?;
            let result = dispatch(&invocation, &self.catalog, session).await;

            match &result.outcome {
                Outcome::Failure(e) => parts.push(format!("Error: {e}")),
                Outcome::Success => {
                    parts.push(result.marker());
                    let follow_up = prompt::follow_up(&result.tool_name, &result.content);
                    let history = self.history.window(self.conversation.snapshot());
                    let request =
                        ModelRequest::new(history, &follow_up).with_temperature(self.temperature);
                    let reply = self.backend.call(request).await?;
                    self.conversation.append_model(reply.text.clone());
                    parts.push(reply.text);
                }
            }
            results.push(result);
        }

        Ok(Answer {
            text: parts.join("\n"),
            results,
            malformed,
        })
    }
}
