use crate::error::ExtractError;
use crate::toolcall::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One incremental unit of provider output. Any field may be empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fragment {
    /// Plain text appended to the content buffer.
    pub content_delta: String,
    /// Name of a tool call that has just become known.
    pub tool_name: String,
    /// Argument text appended to the active tool call.
    pub tool_args_delta: String,
    /// Non-empty on the terminal fragment (the provider's finish reason).
    pub finish: String,
    /// A final value the provider adapter already decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precomputed: Option<Value>,
}

impl Fragment {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            content_delta: delta.into(),
            ..Self::default()
        }
    }

    pub fn tool_name(name: impl Into<String>) -> Self {
        Self {
            tool_name: name.into(),
            ..Self::default()
        }
    }

    pub fn tool_args(delta: impl Into<String>) -> Self {
        Self {
            tool_args_delta: delta.into(),
            ..Self::default()
        }
    }

    pub fn finished(reason: impl Into<String>) -> Self {
        Self {
            finish: reason.into(),
            ..Self::default()
        }
    }

    pub fn precomputed(value: Value) -> Self {
        Self {
            precomputed: Some(value),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_content(self, delta: impl Into<String>) -> Self {
        Self {
            content_delta: delta.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_tool_name(self, name: impl Into<String>) -> Self {
        Self {
            tool_name: name.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_tool_args(self, delta: impl Into<String>) -> Self {
        Self {
            tool_args_delta: delta.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_finish(self, reason: impl Into<String>) -> Self {
        Self {
            finish: reason.into(),
            ..self
        }
    }

    pub fn is_terminal(&self) -> bool {
        !self.finish.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SequenceUpdate {
    /// The list truncated to a newly confirmed index.
    Confirmed(Vec<Value>),
    /// The complete list at stream end.
    Final(Vec<Value>),
}

impl SequenceUpdate {
    pub fn items(&self) -> &[Value] {
        match self {
            SequenceUpdate::Confirmed(items) | SequenceUpdate::Final(items) => items,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolCallUpdate {
    /// Arguments decoded so far for the active call.
    Partial(ToolCall),
    /// The completed call.
    Final(ToolCall),
    /// The call completed but its argument text never decoded.
    Invalid { name: String, error: ExtractError },
}
