use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractErrorKind {
    /// Nothing buffered yet. Not a failure for a streaming caller.
    EmptyInput,
    /// The text contains no `{` or `[` at all.
    NoStructure,
    /// A candidate span was found but could not be decoded.
    InvalidJson(String),
    /// A strategy decoded a bare scalar where an object or array is required.
    ScalarRejected,
    /// The recovering reader met a character it cannot place.
    UnexpectedChar(char),
    /// Tool-call arguments decoded to something other than an object.
    InvalidToolArguments(String),
    /// The strategy chain is empty.
    NoStrategy,
    /// The stream ended without ever producing a usable value.
    StreamEnded(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at position {position}", describe(.kind))]
pub struct ExtractError {
    pub kind: ExtractErrorKind,
    pub position: usize,
}

fn describe(kind: &ExtractErrorKind) -> String {
    match kind {
        ExtractErrorKind::EmptyInput => "No content yet".to_string(),
        ExtractErrorKind::NoStructure => "No JSON structure found".to_string(),
        ExtractErrorKind::InvalidJson(msg) => format!("Invalid JSON: {}", msg),
        ExtractErrorKind::ScalarRejected => {
            "Scalar result rejected, expected an object or array".to_string()
        }
        ExtractErrorKind::UnexpectedChar(c) => format!("Unexpected character {:?}", c),
        ExtractErrorKind::InvalidToolArguments(msg) => {
            format!("Invalid tool arguments: {}", msg)
        }
        ExtractErrorKind::NoStrategy => "No extraction strategy configured".to_string(),
        ExtractErrorKind::StreamEnded(last) => {
            format!("Stream ended with unparseable output ({})", last)
        }
    }
}

impl ExtractError {
    pub fn new(kind: ExtractErrorKind, position: usize) -> Self {
        Self { kind, position }
    }

    pub fn from_serde(what: &str, err: serde_json::Error) -> Self {
        let pos = err.column(); // coarse: single-line inputs dominate
        Self {
            kind: ExtractErrorKind::InvalidJson(format!("serde_json {} error: {}", what, err)),
            position: pos,
        }
    }

    /// True for failures that only mean "not parseable yet" while streaming.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind, ExtractErrorKind::StreamEnded(_))
    }

    pub fn is_empty_input(&self) -> bool {
        self.kind == ExtractErrorKind::EmptyInput
    }
}
