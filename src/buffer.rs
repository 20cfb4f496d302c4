use crate::error::{ExtractError, ExtractErrorKind};
use crate::recover::{RecoveryMode, recover_to_string};
use crate::strategy::{ExtractionOutcome, StrategyChain, locate_root};
use std::sync::Arc;

/// Running concatenation of the content deltas of one response.
///
/// The text is reference counted: cloning a buffer to keep a snapshot is
/// cheap, and `assemble` only copies when such a snapshot is still alive.
#[derive(Clone, Debug, Default)]
pub struct ContentBuffer {
    text: Arc<String>,
    chain: Arc<StrategyChain>,
}

impl ContentBuffer {
    pub fn new(chain: Arc<StrategyChain>) -> Self {
        Self {
            text: Arc::new(String::new()),
            chain,
        }
    }

    /// Append `delta`, returning the grown buffer.
    #[must_use]
    pub fn assemble(self, delta: &str) -> Self {
        if delta.is_empty() {
            return self;
        }
        let Self { mut text, chain } = self;
        Arc::make_mut(&mut text).push_str(delta);
        Self { text, chain }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True while nothing but whitespace has arrived.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.chain
    }

    /// The text with dangling strings, members and containers closed.
    /// Falls back to the raw text when no structure can be recovered yet.
    pub fn normalized(&self) -> String {
        locate_root(&self.text, |t| {
            recover_to_string(t, RecoveryMode::Tolerant, self.chain.options())
        })
        .map(|(_, s)| s)
        .unwrap_or_else(|_| self.text.to_string())
    }

    /// Run the buffered text through the strategy chain.
    pub fn parsed(&self) -> ExtractionOutcome {
        if self.is_empty() {
            return Err(ExtractError::new(ExtractErrorKind::EmptyInput, 0));
        }
        self.chain.extract(&self.text)
    }

    /// Like `parsed`, for a buffer no more text will be appended to.
    pub fn parsed_complete(&self) -> ExtractionOutcome {
        if self.is_empty() {
            return Err(ExtractError::new(ExtractErrorKind::EmptyInput, 0));
        }
        self.chain.extract_complete(&self.text)
    }
}
