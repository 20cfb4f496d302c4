mod buffer;
mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod emission;
pub mod error;
mod fingerprint;
mod fragment;
pub mod options;
pub mod pipeline;
mod recover;
pub mod sequence;
pub mod strategy;
pub mod stream;
mod toolcall;

pub use buffer::ContentBuffer;
pub use emission::{Emission, EmissionDecision, EmissionPolicy};
pub use error::{ExtractError, ExtractErrorKind};
pub use fingerprint::Fingerprint;
pub use fragment::{Fragment, SequenceUpdate, ToolCallUpdate};
pub use options::{Options, ResponseShape, StrategyKind};
pub use pipeline::{FrameOutput, Pipeline, StreamState};
pub use recover::{
    RecoveryLogEntry, RecoveryMode, recover_to_string, recover_to_value, recover_with_log,
};
pub use sequence::{SequenceTracker, as_sequence};
pub use strategy::{Extracted, ExtractionOutcome, ExtractionStrategy, StrategyChain};
pub use stream::StreamExtractor;
pub use toolcall::{ToolCall, ToolCallTracker};

use serde_json::Value;

/// Find and decode the JSON object or array in a model response, reporting
/// which strategy found it. The text is taken as complete.
pub fn extract(text: &str, opts: &Options) -> ExtractionOutcome {
    StrategyChain::new(opts.for_complete_text()).extract(text)
}

/// Like [`extract`], returning only the value.
pub fn extract_value(text: &str, opts: &Options) -> Result<Value, ExtractError> {
    extract(text, opts).map(|e| e.value)
}

/// Extract and return the repairs the recovering reader applied on the way.
/// Strategies that decode the text as-is produce an empty log.
pub fn extract_with_log(
    text: &str,
    opts: &Options,
) -> Result<(Extracted, Vec<RecoveryLogEntry>), ExtractError> {
    StrategyChain::new(opts.for_complete_text()).extract_with_log(text)
}

/// Convenience: feed a sequence of content chunks through the streaming
/// driver and return the last value it decoded.
pub fn extract_chunks<'a, I>(chunks: I, opts: &Options) -> Result<Value, ExtractError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ex = StreamExtractor::new(opts.clone());
    for c in chunks.into_iter() {
        ex.push_content(c);
    }
    ex.finish()?;
    ex.last_value()
        .cloned()
        .ok_or_else(|| ExtractError::new(ExtractErrorKind::NoStructure, 0))
}

/// Content hash of a value; insensitive to object key order.
pub fn fingerprint(value: &Value) -> Fingerprint {
    Fingerprint::of(value)
}

#[cfg(test)]
mod tests;
