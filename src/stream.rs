use crate::error::{ExtractError, ExtractErrorKind};
use crate::fragment::Fragment;
use crate::options::Options;
use crate::pipeline::{Frame, FrameOutput, Pipeline, StreamState};
use serde_json::Value;

/// Drives one streamed response through the stage pipeline.
///
/// ```
/// use jsonextract::{Options, StreamExtractor};
///
/// let mut ex = StreamExtractor::new(Options::default());
/// ex.push_content(r#"{"name": "Al"#);
/// let out = ex.push_content(r#"ice"}"#);
/// assert_eq!(out.ready_value().unwrap()["name"], "Alice");
/// ```
#[derive(Clone, Debug)]
pub struct StreamExtractor {
    pipeline: Pipeline,
    state: StreamState,
}

impl StreamExtractor {
    pub fn new(opts: Options) -> Self {
        Self::with_pipeline(opts, Pipeline::standard())
    }

    pub fn with_pipeline(opts: Options, pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            state: StreamState::new(opts),
        }
    }

    /// Continue from a saved state with the standard pipeline.
    pub fn resume(state: StreamState) -> Self {
        Self {
            pipeline: Pipeline::standard(),
            state,
        }
    }

    pub fn push(&mut self, fragment: Fragment) -> FrameOutput {
        let state = std::mem::take(&mut self.state);
        let (state, output) = self.pipeline.run(Frame::new(fragment, state)).into_parts();
        self.state = state;
        output
    }

    pub fn push_content(&mut self, delta: &str) -> FrameOutput {
        self.push(Fragment::content(delta))
    }

    /// End the response. Fails only when nothing usable ever came through.
    pub fn finish(&mut self) -> Result<FrameOutput, ExtractError> {
        let output = if self.state.is_finished() {
            FrameOutput::empty()
        } else {
            self.push(Fragment::finished("stop"))
        };
        if self.state.saw_value() || self.state.saw_tool_call() {
            return Ok(output);
        }
        let last = self
            .state
            .last_failure()
            .map(ToString::to_string)
            .unwrap_or_else(|| "no content".to_string());
        tracing::debug!(error = %last, "stream ended without a value");
        Err(ExtractError::new(
            ExtractErrorKind::StreamEnded(last),
            self.state.buffer().len(),
        ))
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn into_state(self) -> StreamState {
        self.state
    }

    pub fn last_value(&self) -> Option<&Value> {
        self.state.last_value()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
