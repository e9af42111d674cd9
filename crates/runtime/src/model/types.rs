use super::errors::ModelError;
use crate::conversation::Turn;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Everything needed for one completion.
///
/// The backend is stateless: `history` is re-sent on every call, followed
/// by a user message made of `instruction` (when present) and `query`.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub history: &'a [Turn],
    pub instruction: Option<&'a str>,
    pub query: &'a str,
    pub temperature: f32,
}

impl<'a> ModelRequest<'a> {
    pub fn new(history: &'a [Turn], query: &'a str) -> Self {
        Self {
            history,
            instruction: None,
            query,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_instruction(mut self, instruction: &'a str) -> Self {
        self.instruction = Some(instruction);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// The response from a model.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub usage: Usage,
}

/// Trait for LLM provider backends.
pub trait Backend: Send + Sync {
    fn call(
        &self,
        request: ModelRequest<'_>,
    ) -> impl Future<Output = Result<ModelResponse, ModelError>> + Send;
}
