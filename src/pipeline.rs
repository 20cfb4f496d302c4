use crate::buffer::ContentBuffer;
use crate::emission::{Emission, EmissionPolicy};
use crate::error::ExtractError;
use crate::fragment::{Fragment, SequenceUpdate, ToolCallUpdate};
use crate::options::{Options, ResponseShape};
use crate::sequence::{SequenceTracker, as_sequence};
use crate::strategy::StrategyChain;
use crate::toolcall::ToolCallTracker;
use serde_json::Value;
use std::sync::Arc;

/// Everything one response has accumulated so far.
///
/// Each stage consumes the state and hands the next one on, so cloning a
/// `StreamState` is a complete checkpoint of the response.
#[derive(Clone, Debug, Default)]
pub struct StreamState {
    buffer: ContentBuffer,
    policy: EmissionPolicy,
    sequence: SequenceTracker,
    tool: ToolCallTracker,
    shape: ResponseShape,
    last_value: Option<Value>,
    last_failure: Option<ExtractError>,
    saw_value: bool,
    saw_sequence: bool,
    saw_tool_call: bool,
    finished: bool,
}

impl StreamState {
    pub fn new(opts: Options) -> Self {
        let shape = opts.response_shape;
        let chain = Arc::new(StrategyChain::new(opts));
        Self {
            buffer: ContentBuffer::new(Arc::clone(&chain)),
            tool: ToolCallTracker::new(chain),
            shape,
            ..Self::default()
        }
    }

    pub fn buffer(&self) -> &ContentBuffer {
        &self.buffer
    }

    pub fn policy(&self) -> &EmissionPolicy {
        &self.policy
    }

    pub fn sequence(&self) -> &SequenceTracker {
        &self.sequence
    }

    pub fn tool(&self) -> &ToolCallTracker {
        &self.tool
    }

    pub fn shape(&self) -> ResponseShape {
        self.shape
    }

    /// The most recent value decoded or forwarded.
    pub fn last_value(&self) -> Option<&Value> {
        self.last_value.as_ref()
    }

    pub fn last_failure(&self) -> Option<&ExtractError> {
        self.last_failure.as_ref()
    }

    /// True once any value was decoded or forwarded.
    pub fn saw_value(&self) -> bool {
        self.saw_value
    }

    pub fn saw_tool_call(&self) -> bool {
        self.saw_tool_call
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// One fragment on its way through the stages.
#[derive(Clone, Debug)]
pub struct Frame {
    pub fragment: Fragment,
    pub state: StreamState,
    pub emission: Emission,
    pub sequence_updates: Vec<SequenceUpdate>,
    pub tool_call_updates: Vec<ToolCallUpdate>,
}

impl Frame {
    pub fn new(fragment: Fragment, state: StreamState) -> Self {
        Self {
            fragment,
            state,
            emission: nothing(),
            sequence_updates: Vec::new(),
            tool_call_updates: Vec::new(),
        }
    }

    pub fn into_parts(self) -> (StreamState, FrameOutput) {
        (
            self.state,
            FrameOutput {
                emission: self.emission,
                sequence: self.sequence_updates,
                tool_calls: self.tool_call_updates,
            },
        )
    }
}

/// What the caller sees for one fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub emission: Emission,
    pub sequence: Vec<SequenceUpdate>,
    pub tool_calls: Vec<ToolCallUpdate>,
}

impl FrameOutput {
    pub fn empty() -> Self {
        Self {
            emission: nothing(),
            sequence: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    /// The value this fragment made ready, if any.
    pub fn ready_value(&self) -> Option<&Value> {
        match &self.emission {
            Emission::Ready { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn is_quiet(&self) -> bool {
        !self.emission.is_ready()
            && self.emission.value().is_none()
            && self.sequence.is_empty()
            && self.tool_calls.is_empty()
    }
}

pub type Stage = fn(Frame) -> Frame;

/// Ordered list of named stages every fragment runs through.
#[derive(Clone, Debug)]
pub struct Pipeline {
    stages: Vec<(&'static str, Stage)>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Pipeline {
    /// assemble, emission, sequence, tool call, finish.
    pub fn standard() -> Self {
        Self::empty()
            .with_stage("assemble_content", assemble_content)
            .with_stage("decide_emission", decide_emission)
            .with_stage("track_sequence", track_sequence)
            .with_stage("track_tool_call", track_tool_call)
            .with_stage("finish_response", finish_response)
    }

    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    #[must_use]
    pub fn with_stage(mut self, name: &'static str, stage: Stage) -> Self {
        self.stages.push((name, stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|(name, _)| *name).collect()
    }

    pub fn run(&self, frame: Frame) -> Frame {
        self.stages.iter().fold(frame, |frame, (name, stage)| {
            tracing::trace!(stage = *name, "running stage");
            stage(frame)
        })
    }
}

pub fn assemble_content(mut frame: Frame) -> Frame {
    frame.state.buffer = frame.state.buffer.assemble(&frame.fragment.content_delta);
    frame
}

pub fn decide_emission(mut frame: Frame) -> Frame {
    let state = &mut frame.state;
    let precomputed = frame.fragment.precomputed.as_ref();
    let (policy, emission) = if frame.fragment.is_terminal() {
        state.policy.evaluate_final(precomputed, &state.buffer)
    } else {
        state.policy.evaluate(precomputed, &state.buffer)
    };
    state.policy = policy;
    match &emission {
        Emission::Suppress => state.saw_value = true,
        Emission::Ready { value, .. } => {
            state.last_value = Some(value.clone());
            state.last_failure = None;
            state.saw_value = true;
        }
        Emission::Forward {
            value: Some(value), ..
        } => {
            state.last_value = Some(value.clone());
            state.saw_value = true;
        }
        Emission::Forward {
            failure: Some(failure),
            ..
        } => state.last_failure = Some(failure.clone()),
        Emission::Forward { .. } => {}
    }
    frame.emission = emission;
    frame
}

pub fn track_sequence(mut frame: Frame) -> Frame {
    let state = &mut frame.state;
    if let Some(value) = frame.emission.value() {
        match as_sequence(value, state.shape) {
            Some(items) => {
                state.saw_sequence = true;
                state.sequence = std::mem::take(&mut state.sequence).update(items.clone());
            }
            None if state.saw_sequence => {
                tracing::debug!("response is no longer a list, sequence dropped");
                state.saw_sequence = false;
                state.sequence = std::mem::take(&mut state.sequence).reset();
            }
            None => {}
        }
    }
    if !state.saw_sequence || state.finished {
        return frame;
    }
    if frame.fragment.is_terminal() {
        let items = state.sequence.finalize();
        tracing::debug!(len = items.len(), "sequence finalized");
        frame.sequence_updates.push(SequenceUpdate::Final(items));
        return frame;
    }
    let pending = state.sequence.pending();
    if !pending.is_empty() {
        tracing::debug!(count = pending.len(), "sequence items confirmed");
        state.sequence = std::mem::take(&mut state.sequence).advance();
        frame
            .sequence_updates
            .extend(pending.into_iter().map(SequenceUpdate::Confirmed));
    }
    frame
}

pub fn track_tool_call(mut frame: Frame) -> Frame {
    let state = &mut frame.state;
    let name = frame.fragment.tool_name.as_str();
    if !name.is_empty() {
        if state.tool.is_active() && state.tool.starts_new_call(name) {
            frame.tool_call_updates.push(close_call(&state.tool));
        }
        state.tool = std::mem::take(&mut state.tool).handle_name_signal(name);
        state.saw_tool_call = true;
    }
    let delta = frame.fragment.tool_args_delta.as_str();
    if !delta.is_empty() {
        state.tool = std::mem::take(&mut state.tool).append_args(delta);
        if state.tool.is_active()
            && !frame.fragment.is_terminal()
            && let Ok(call) = state.tool.current_call()
        {
            frame.tool_call_updates.push(ToolCallUpdate::Partial(call));
        }
    }
    if frame.fragment.is_terminal() && state.tool.is_active() {
        frame.tool_call_updates.push(close_call(&state.tool));
        state.tool = std::mem::take(&mut state.tool).clear();
    }
    frame
}

pub fn finish_response(mut frame: Frame) -> Frame {
    if frame.fragment.is_terminal() && !frame.state.finished {
        tracing::debug!(
            reason = %frame.fragment.finish,
            buffered = frame.state.buffer.len(),
            suppressed = frame.state.policy.suppressed(),
            "response finished"
        );
        frame.state.finished = true;
    }
    frame
}

fn nothing() -> Emission {
    Emission::Forward {
        value: None,
        failure: None,
        normalized: String::new(),
    }
}

fn close_call(tool: &ToolCallTracker) -> ToolCallUpdate {
    match tool.finalize() {
        Ok(call) => ToolCallUpdate::Final(call),
        Err(error) => ToolCallUpdate::Invalid {
            name: tool.name().to_string(),
            error,
        },
    }
}
