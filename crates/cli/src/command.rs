//! Command line interpretation for the interactive loop.

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Exit,
    Help,
    /// `connect <path>`; the path may be empty when the user omitted it.
    Connect(&'a str),
    Query(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Self::Empty;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Self::Exit;
        }
        if input.eq_ignore_ascii_case("help") {
            return Self::Help;
        }
        if input.eq_ignore_ascii_case("connect") {
            return Self::Connect("");
        }
        match input.get(..8) {
            Some(prefix) if prefix.eq_ignore_ascii_case("connect ") => {
                Self::Connect(input[8..].trim())
            }
            _ => Self::Query(input),
        }
    }
}

pub const HELP: &str = "Available commands:
  connect <path_to_server>  Connect to an MCP server (.py or .js)
  exit | quit               Exit the application
  help                      Display this help message
Any other text is sent as a query to the AI.";
