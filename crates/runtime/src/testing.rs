//! In-memory backend and session used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::catalog::ToolDescriptor;
use crate::conversation::Turn;
use crate::model::{Backend, ModelError, ModelRequest, ModelResponse, Usage};
use crate::session::{SessionError, ToolSession};

/// A request as seen by [`FakeBackend`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub history: Vec<Turn>,
    pub instruction: Option<String>,
    pub query: String,
}

/// Backend replying from a script, one entry per call.
#[derive(Default)]
pub struct FakeBackend {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Err(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            history: request.history.to_vec(),
            instruction: request.instruction.map(str::to_string),
            query: request.query.to_string(),
        });

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(ModelResponse {
                text,
                usage: Usage::default(),
            }),
            Some(Err(message)) => Err(ModelError::Api(message)),
            None => Err(ModelError::Api("no scripted reply".into())),
        }
    }
}

/// Session advertising fixed tools and answering from canned payloads.
#[derive(Default)]
pub struct FakeSession {
    tools: Vec<ToolDescriptor>,
    payloads: HashMap<String, Result<String, String>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeSession {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            ..Self::default()
        }
    }

    pub fn reply(mut self, tool: &str, payload: impl Into<String>) -> Self {
        self.payloads.insert(tool.to_string(), Ok(payload.into()));
        self
    }

    pub fn fail(mut self, tool: &str, message: impl Into<String>) -> Self {
        self.payloads.insert(tool.to_string(), Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolSession for FakeSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        parameters: Map<String, Value>,
    ) -> Result<String, SessionError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), parameters));

        match self.payloads.get(name) {
            Some(Ok(payload)) => Ok(payload.clone()),
            Some(Err(message)) => Err(SessionError::Protocol(message.clone())),
            None => Ok(String::new()),
        }
    }
}
