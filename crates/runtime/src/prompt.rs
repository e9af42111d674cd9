//! Instruction text given to the model.

/// Fence tag that marks a tool invocation block.
pub const INVOCATION_TAG: &str = "json";

const PREAMBLE: &str =
    "You are an AI assistant that helps users interact with various applications through tools.";

const CONTRACT: &str = r#"INSTRUCTIONS:
1. Analyze the user's request carefully.
2. If a tool is needed to fulfill the request, decide which tool to use.
3. Format your tool calls as JSON, wrapped in triple backticks with the 'json' tag.
4. Example tool call format:
```json
{
  "tool_name": "tool_name_here",
  "parameters": {
    "param1": "value1",
    "param2": "value2"
  }
}
```
5. After receiving tool results, provide a helpful response that incorporates the information.
6. If no tool is needed, respond directly to the user's request.

Always make sure to follow the exact input schema for each tool when making a call."#;

/// A composed model prompt: the instruction block and the user query it frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instruction: String,
    pub query: String,
}

/// Build the instruction block for a query.
///
/// The output contract is fixed; only the catalog and the query vary.
pub fn compose(catalog_rendering: &str, query: &str) -> Prompt {
    Prompt {
        instruction: format!("{PREAMBLE}\n{catalog_rendering}\n{CONTRACT}"),
        query: query.to_string(),
    }
}

/// Prompt sent after a tool returns, asking the model to use the result.
pub fn follow_up(tool_name: &str, content: &str) -> String {
    format!(
        "The tool '{tool_name}' returned the following result:\n\n{content}\n\n\
         Please analyze this result and provide a helpful response to the user based on this information."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;

    #[test]
    fn compose_embeds_catalog_and_contract() {
        let prompt = compose("- echo: echoes input", "say hi");
        assert!(prompt.instruction.starts_with(PREAMBLE));
        assert!(prompt.instruction.contains("- echo: echoes input"));
        assert!(prompt.instruction.contains("```json"));
        assert_eq!(prompt.query, "say hi");
    }

    #[test]
    fn compose_is_pure() {
        assert_eq!(compose("catalog", "q"), compose("catalog", "q"));
    }

    #[test]
    fn contract_example_is_extractable() {
        let invocations = extract(CONTRACT);
        assert_eq!(invocations.len(), 1);
        let call = invocations[0].as_ref().unwrap();
        assert_eq!(call.tool_name, "tool_name_here");
        assert_eq!(call.parameters["param2"], "value2");
    }

    #[test]
    fn follow_up_names_tool_and_result() {
        let text = follow_up("echo", "hi");
        assert!(text.starts_with("The tool 'echo' returned the following result:"));
        assert!(text.contains("\n\nhi\n\n"));
    }
}
