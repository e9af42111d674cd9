//! Tool invocation extraction from free-form model output.
//!
//! Invocations are fenced blocks tagged `json` holding an object with a
//! `tool_name` string and an optional `parameters` object. The scanner
//! walks fences left to right instead of matching one pattern over the
//! whole text: fences with another tag are skipped whole, and a `json`
//! body is delimited by a brace matcher that understands JSON strings, so
//! nested objects and backticks inside values stay inside their block.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::prompt::INVOCATION_TAG;

const FENCE: &str = "```";

/// A structured tool call parsed from model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A tagged block that could not be turned into a [`ToolInvocation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tool call block {block} is malformed: {reason}")]
pub struct MalformedInvocation {
    /// 1-based position of the block among the tagged blocks.
    pub block: usize,
    pub reason: String,
}

/// One tagged block, parsed or not.
pub type Candidate = Result<ToolInvocation, MalformedInvocation>;

/// Scan model output for tagged blocks, in order of appearance.
///
/// Returns an empty vector when the text holds no tagged block.
pub fn extract(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(FENCE) {
        let tag_start = pos + offset + FENCE.len();
        let rest = &text[tag_start..];
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        let body_start = tag_start + tag_len;

        if !rest[..tag_len].eq_ignore_ascii_case(INVOCATION_TAG) {
            match closing_fence(text, body_start) {
                Some(end) => {
                    pos = end;
                    continue;
                }
                None => break,
            }
        }

        let block = candidates.len() + 1;
        match delimit(text, body_start) {
            Some((body, end)) => {
                candidates.push(parse(block, body));
                pos = end;
            }
            None => {
                candidates.push(Err(MalformedInvocation {
                    block,
                    reason: "block is not terminated".into(),
                }));
                break;
            }
        }
    }

    candidates
}

/// Find the body of a tagged block starting at `from`.
///
/// Returns the body and the offset just past the closing fence.
fn delimit(text: &str, from: usize) -> Option<(&str, usize)> {
    let object_start = from + (text[from..].len() - text[from..].trim_start().len());
    if text[object_start..].starts_with('{') {
        if let Some(object_end) = match_object(text, object_start) {
            let after = &text[object_end..];
            let gap = after.len() - after.trim_start().len();
            if after[gap..].starts_with(FENCE) {
                return Some((&text[object_start..object_end], object_end + gap + FENCE.len()));
            }
        }
    }

    // Not a balanced object followed by a fence; the body ends at the
    // nearest fence and will fail to parse.
    let close = text[from..].find(FENCE)? + from;
    Some((text[from..close].trim(), close + FENCE.len()))
}

/// Offset just past the `}` matching the `{` at `start`, if any.
fn match_object(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate().skip(start) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset just past the fence closing an untagged or foreign block.
///
/// A fence on the opening line closes an inline block; otherwise the
/// closing fence is the first one that starts a line.
fn closing_fence(text: &str, from: usize) -> Option<usize> {
    let line_end = text[from..].find('\n').map_or(text.len(), |i| from + i);
    if let Some(i) = text[from..line_end].find(FENCE) {
        return Some(from + i + FENCE.len());
    }

    let mut line_start = line_end + 1;
    while line_start < text.len() {
        let line_end = text[line_start..].find('\n').map_or(text.len(), |i| line_start + i);
        let line = &text[line_start..line_end];
        let indent = line.len() - line.trim_start().len();
        if line[indent..].starts_with(FENCE) {
            return Some(line_start + indent + FENCE.len());
        }
        line_start = line_end + 1;
    }
    None
}

fn parse(block: usize, body: &str) -> Candidate {
    let malformed = |reason: String| MalformedInvocation { block, reason };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let Value::Object(mut object) = value else {
        return Err(malformed("expected a JSON object".into()));
    };

    let tool_name = match object.remove("tool_name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(_) => return Err(malformed("'tool_name' must be a non-empty string".into())),
        None => return Err(malformed("missing required field 'tool_name'".into())),
    };

    let parameters = match object.remove("parameters") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(parameters)) => parameters,
        Some(_) => return Err(malformed("'parameters' must be an object".into())),
    };

    Ok(ToolInvocation {
        tool_name,
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| match c {
                Ok(call) => call.tool_name.clone(),
                Err(e) => format!("!{}", e.block),
            })
            .collect()
    }

    #[test]
    fn plain_text_has_no_invocations() {
        assert!(extract("The weather is sunny.").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn single_block() {
        let text = "Let me check.\n```json\n{\"tool_name\": \"echo\", \"parameters\": {\"text\": \"hi\"}}\n```\n";
        let candidates = extract(text);
        assert_eq!(candidates.len(), 1);
        let call = candidates[0].as_ref().unwrap();
        assert_eq!(call.tool_name, "echo");
        assert_eq!(Value::Object(call.parameters.clone()), json!({"text": "hi"}));
    }

    #[test]
    fn blocks_come_out_in_appearance_order() {
        let text = "```json\n{\"tool_name\": \"first\"}\n```\nthen\n```json\n{\"tool_name\": \"second\"}\n```";
        assert_eq!(names(&extract(text)), vec!["first", "second"]);
    }

    #[test]
    fn adjacent_blocks_on_one_line() {
        let text = "```json {\"tool_name\": \"a\"}``````json {\"tool_name\": \"b\"}```";
        assert_eq!(names(&extract(text)), vec!["a", "b"]);
    }

    #[test]
    fn nested_braces_and_backticks_in_values() {
        let text = r#"```json
{
  "tool_name": "run",
  "parameters": {
    "filter": {"range": {"min": 1, "max": 2}},
    "script": "echo ``` } { \"quoted\""
  }
}
```
```json
{"tool_name": "after"}
```"#;
        let candidates = extract(text);
        assert_eq!(names(&candidates), vec!["run", "after"]);
        let call = candidates[0].as_ref().unwrap();
        assert_eq!(call.parameters["filter"]["range"]["max"], 2);
        assert_eq!(call.parameters["script"], "echo ``` } { \"quoted\"");
    }

    #[test]
    fn missing_parameters_defaults_to_empty() {
        let candidates = extract("```json\n{\"tool_name\": \"list\"}\n```");
        assert!(candidates[0].as_ref().unwrap().parameters.is_empty());

        let candidates = extract("```json\n{\"tool_name\": \"list\", \"parameters\": null}\n```");
        assert!(candidates[0].as_ref().unwrap().parameters.is_empty());
    }

    #[test]
    fn malformed_block_does_not_stop_siblings() {
        let text = "```json\n{\"parameters\": {}}\n```\n```json\n{\"tool_name\": \"echo\"}\n```";
        let candidates = extract(text);
        assert_eq!(candidates.len(), 2);
        let err = candidates[0].as_ref().unwrap_err();
        assert_eq!(err.block, 1);
        assert!(err.reason.contains("tool_name"));
        assert_eq!(candidates[1].as_ref().unwrap().tool_name, "echo");
    }

    #[test]
    fn invalid_json_is_malformed() {
        let text = "```json\n{\"tool_name\": \"echo\",}\n```\n```json\n{\"tool_name\": \"ok\"}\n```";
        let candidates = extract(text);
        assert!(candidates[0].as_ref().unwrap_err().reason.starts_with("invalid JSON"));
        assert_eq!(candidates[1].as_ref().unwrap().tool_name, "ok");
    }

    #[test]
    fn wrong_field_types_are_malformed() {
        for body in [
            r#"{"tool_name": 7}"#,
            r#"{"tool_name": ""}"#,
            r#"{"tool_name": "x", "parameters": [1, 2]}"#,
            r#"["tool_name"]"#,
        ] {
            let candidates = extract(&format!("```json\n{body}\n```"));
            assert_eq!(candidates.len(), 1, "{body}");
            assert!(candidates[0].is_err(), "{body}");
        }
    }

    #[test]
    fn other_fences_are_skipped() {
        let text = "```python\nd = {\"tool_name\": \"nope\"}\n```\n```\n{\"tool_name\": \"plain\"}\n```\n```json\n{\"tool_name\": \"yes\"}\n```";
        assert_eq!(names(&extract(text)), vec!["yes"]);
    }

    #[test]
    fn tag_is_case_insensitive_but_exact() {
        let text = "```JSON\n{\"tool_name\": \"upper\"}\n```\n```jsonc\n{\"tool_name\": \"other\"}\n```";
        assert_eq!(names(&extract(text)), vec!["upper"]);
    }

    #[test]
    fn unterminated_block_is_reported() {
        let text = "```json\n{\"tool_name\": \"echo\"}\n";
        let candidates = extract(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_ref().unwrap_err().reason, "block is not terminated");
    }

    #[test]
    fn trailing_text_inside_block_is_malformed() {
        let text = "```json\n{\"tool_name\": \"echo\"} please\n```\n```json\n{\"tool_name\": \"next\"}\n```";
        assert_eq!(names(&extract(text)), vec!["!1", "next"]);
    }
}
