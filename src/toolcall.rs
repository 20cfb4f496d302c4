use crate::error::{ExtractError, ExtractErrorKind};
use crate::strategy::StrategyChain;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A named tool invocation with decoded arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

/// Accumulates the argument text of the one tool call currently streaming.
#[derive(Clone, Debug, Default)]
pub struct ToolCallTracker {
    name: String,
    args: String,
    chain: Arc<StrategyChain>,
}

impl ToolCallTracker {
    pub fn new(chain: Arc<StrategyChain>) -> Self {
        Self {
            name: String::new(),
            args: String::new(),
            chain,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    /// True when this signal would start a call rather than continue one.
    pub fn starts_new_call(&self, name: &str) -> bool {
        !(self.name == name && self.args.is_empty())
    }

    /// Same name with no arguments yet continues the active call; anything
    /// else starts a new call and discards the previous argument text.
    #[must_use]
    pub fn handle_name_signal(self, name: &str) -> Self {
        if !self.starts_new_call(name) {
            return self;
        }
        tracing::debug!(tool = name, "tool call started");
        Self {
            name: name.to_string(),
            args: String::new(),
            chain: self.chain,
        }
    }

    #[must_use]
    pub fn append_args(mut self, delta: &str) -> Self {
        if self.is_active() {
            self.args.push_str(delta);
        }
        self
    }

    /// Decode the arguments received so far. Does not clear state.
    pub fn current_call(&self) -> Result<ToolCall, ExtractError> {
        self.decode(false)
    }

    /// The completed call. Follow with `clear` or the next name signal.
    pub fn finalize(&self) -> Result<ToolCall, ExtractError> {
        let call = self.decode(true);
        tracing::debug!(tool = %self.name, ok = call.is_ok(), "tool call finalized");
        call
    }

    fn decode(&self, complete: bool) -> Result<ToolCall, ExtractError> {
        let arguments = if self.args.trim().is_empty() {
            Map::new()
        } else {
            let extracted = if complete {
                self.chain.extract_complete(&self.args)?
            } else {
                self.chain.extract(&self.args)?
            };
            match extracted.value {
                Value::Object(map) => map,
                other => {
                    return Err(ExtractError::new(
                        ExtractErrorKind::InvalidToolArguments(format!(
                            "expected an object, got {}",
                            kind_name(&other)
                        )),
                        0,
                    ));
                }
            }
        };
        Ok(ToolCall {
            name: self.name.clone(),
            arguments,
        })
    }

    #[must_use]
    pub fn clear(self) -> Self {
        Self {
            name: String::new(),
            args: String::new(),
            chain: self.chain,
        }
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
