//! Tool catalog advertised to the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

use crate::session::ToolSession;
use crate::{Error, Result};

/// A tool definition as advertised by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a session.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for input parameters.
    pub input_schema: Value,
}

/// The most recently fetched tool listing, in server order.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from descriptors, keeping their order.
    pub fn from_tools(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    /// Replace the listing with whatever the session advertises now.
    pub async fn refresh<S: ToolSession>(&mut self, session: Option<&S>) -> Result<&[ToolDescriptor]> {
        let session = session.ok_or(Error::SessionUnavailable)?;
        self.tools = session.list_tools().await?;
        Ok(&self.tools)
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render the listing for the model.
    ///
    /// Deterministic for a given catalog; tools appear in server order.
    pub fn render(&self) -> String {
        let mut out = String::from("You have access to the following tools:\n\n");
        for tool in &self.tools {
            let schema = serde_json::to_string_pretty(&tool.input_schema)
                .unwrap_or_else(|_| tool.input_schema.to_string());
            let _ = writeln!(out, "- {}: {}", tool.name, tool.description);
            let _ = writeln!(out, "  Input schema: {schema}\n");
        }
        out
    }
}
