use serde::Deserialize;
use serde_json::Value;

/// One line of the activity log, reduced to the two envelope shapes the
/// scanner understands. Everything else parses to `Unrecognized` and is
/// skipped, never fatal.
#[derive(Debug)]
pub enum LogRecord {
    /// Flat shape: `{message: {content: [...]}}`
    Flat(Vec<ContentBlock>),
    /// Nested shape: `{data: {message: {message: {content: [...]}}}}`
    Nested(Vec<ContentBlock>),
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    message: Option<MessageEnvelope>,
    #[serde(default)]
    data: Option<DataEnvelope>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
    #[serde(default)]
    message: Option<NestedMessage>,
}

#[derive(Debug, Deserialize)]
struct NestedMessage {
    #[serde(default)]
    message: Option<MessageEnvelope>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default, deserialize_with = "deserialize_content")]
    content: Vec<ContentBlock>,
}

/// Content may be a bare string (plain user messages) or a block array
fn deserialize_content<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrArray {
        String(String),
        Array(Vec<ContentBlock>),
    }

    match StringOrArray::deserialize(deserializer)? {
        StringOrArray::String(s) => Ok(vec![ContentBlock::Text { text: s }]),
        StringOrArray::Array(arr) => Ok(arr),
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ContentBlock {
    ToolUse {
        name: String,
        #[serde(default)]
        input: Value,
    },
    Text {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl LogRecord {
    /// Parse one log line. The nested shape is probed first, matching the
    /// order the log's producer evolved through.
    pub fn parse(line: &str) -> LogRecord {
        let Ok(raw) = serde_json::from_str::<RawRecord>(line) else {
            return LogRecord::Unrecognized;
        };

        if let Some(data) = raw.data
            && let Some(nested) = data.message
            && let Some(inner) = nested.message
        {
            return LogRecord::Nested(inner.content);
        }

        if let Some(message) = raw.message {
            return LogRecord::Flat(message.content);
        }

        LogRecord::Unrecognized
    }

    pub fn content(&self) -> &[ContentBlock] {
        match self {
            LogRecord::Flat(blocks) | LogRecord::Nested(blocks) => blocks,
            LogRecord::Unrecognized => &[],
        }
    }
}

/// What a tool invocation did, as far as the scanner cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction {
    /// A file was created or modified
    FileMutation { path: String },
    /// A shell command ran; the command text feeds the commit signal battery
    Command { command: String },
}

/// Classify a tool invocation. Only the fixed mutating set is relevant;
/// read-only tools return None.
pub fn classify_tool(name: &str, input: &Value) -> Option<ToolAction> {
    match name {
        "Write" | "Edit" | "MultiEdit" => {
            let path = input.get("file_path")?.as_str()?;
            if path.is_empty() {
                return None;
            }
            Some(ToolAction::FileMutation {
                path: path.to_string(),
            })
        }
        "NotebookEdit" => {
            let path = input.get("notebook_path")?.as_str()?;
            if path.is_empty() {
                return None;
            }
            Some(ToolAction::FileMutation {
                path: path.to_string(),
            })
        }
        "Bash" => {
            let command = input.get("command")?.as_str()?;
            Some(ToolAction::Command {
                command: command.to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_flat_envelope() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","name":"Write","input":{"file_path":"src/a.ts","content":"x"}}]}}"#;
        let record = LogRecord::parse(line);
        assert!(matches!(record, LogRecord::Flat(_)));
        assert_eq!(record.content().len(), 1);
    }

    #[test]
    fn test_parse_nested_envelope() {
        let line = r#"{"data":{"message":{"message":{"content":[{"type":"tool_use","name":"Edit","input":{"file_path":"src/b.ts"}}]}}}}"#;
        let record = LogRecord::parse(line);
        assert!(matches!(record, LogRecord::Nested(_)));
        assert_eq!(record.content().len(), 1);
    }

    #[test]
    fn test_parse_string_content() {
        let line = r#"{"type":"user","message":{"content":"just text"}}"#;
        let record = LogRecord::parse(line);
        match record.content() {
            [ContentBlock::Text { text }] => assert_eq!(text, "just text"),
            other => panic!("expected one text block, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unrecognized_shapes() {
        assert!(matches!(
            LogRecord::parse("not json at all"),
            LogRecord::Unrecognized
        ));
        assert!(matches!(
            LogRecord::parse(r#"{"summary":"compacted"}"#),
            LogRecord::Unrecognized
        ));
        // message present but content missing still parses, with no blocks
        let record = LogRecord::parse(r#"{"message":{}}"#);
        assert!(record.content().is_empty());
    }

    #[test]
    fn test_unknown_content_block_is_skipped_not_fatal() {
        let line = r#"{"message":{"content":[{"type":"thinking","thinking":"hm"},{"type":"tool_use","name":"Write","input":{"file_path":"a.rs"}}]}}"#;
        let record = LogRecord::parse(line);
        assert_eq!(record.content().len(), 2);
        assert!(matches!(record.content()[0], ContentBlock::Unknown));
    }

    #[test]
    fn test_classify_mutating_tools() {
        assert_eq!(
            classify_tool("Write", &json!({"file_path": "src/a.ts"})),
            Some(ToolAction::FileMutation {
                path: "src/a.ts".to_string()
            })
        );
        assert_eq!(
            classify_tool("NotebookEdit", &json!({"notebook_path": "nb.ipynb"})),
            Some(ToolAction::FileMutation {
                path: "nb.ipynb".to_string()
            })
        );
        assert_eq!(
            classify_tool("Bash", &json!({"command": "git commit -m x"})),
            Some(ToolAction::Command {
                command: "git commit -m x".to_string()
            })
        );
    }

    #[test]
    fn test_classify_ignores_readonly_and_malformed() {
        assert_eq!(classify_tool("Read", &json!({"file_path": "a.ts"})), None);
        assert_eq!(classify_tool("Glob", &json!({"pattern": "*.rs"})), None);
        // Mutating tool with a non-string or missing path is no signal
        assert_eq!(classify_tool("Write", &json!({"file_path": 42})), None);
        assert_eq!(classify_tool("Write", &json!({})), None);
        assert_eq!(classify_tool("Write", &json!({"file_path": ""})), None);
    }
}
