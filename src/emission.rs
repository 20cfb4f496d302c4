use crate::buffer::ContentBuffer;
use crate::error::ExtractError;
use crate::fingerprint::Fingerprint;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmissionDecision {
    /// Nothing new since the last decoded value.
    Suppress,
    /// Pass the frame on untouched: upstream value, empty buffer, or a failure.
    Forward,
    /// A new, distinct value is available.
    Ready,
}

/// What one fragment produced, as seen by the deserialization layer.
#[derive(Clone, Debug, PartialEq)]
pub enum Emission {
    Suppress,
    Forward {
        /// A value decoded upstream, passed through as-is.
        value: Option<Value>,
        /// Why nothing could be decoded, when something was buffered.
        failure: Option<ExtractError>,
        normalized: String,
    },
    Ready {
        value: Value,
        strategy: &'static str,
        normalized: String,
    },
}

impl Emission {
    pub fn decision(&self) -> EmissionDecision {
        match self {
            Emission::Suppress => EmissionDecision::Suppress,
            Emission::Forward { .. } => EmissionDecision::Forward,
            Emission::Ready { .. } => EmissionDecision::Ready,
        }
    }

    /// The value carried downstream, if any.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Emission::Suppress => None,
            Emission::Forward { value, .. } => value.as_ref(),
            Emission::Ready { value, .. } => Some(value),
        }
    }

    pub fn failure(&self) -> Option<&ExtractError> {
        match self {
            Emission::Forward { failure, .. } => failure.as_ref(),
            _ => None,
        }
    }

    pub fn normalized(&self) -> Option<&str> {
        match self {
            Emission::Suppress => None,
            Emission::Forward { normalized, .. } | Emission::Ready { normalized, .. } => {
                Some(normalized)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Emission::Ready { .. })
    }
}

/// Change detection for one response. Remembers the fingerprint of the most
/// recently decoded value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmissionPolicy {
    last: Option<Fingerprint>,
    suppressed: usize,
}

impl EmissionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.last
    }

    /// How many decoded values were suppressed as unchanged so far.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Classify the current buffer, returning the next policy state.
    pub fn evaluate(
        self,
        precomputed: Option<&Value>,
        buffer: &ContentBuffer,
    ) -> (Self, Emission) {
        self.classify(precomputed, buffer, false)
    }

    /// Like `evaluate`, for the terminal fragment: the buffer is decoded as
    /// complete text.
    pub fn evaluate_final(
        self,
        precomputed: Option<&Value>,
        buffer: &ContentBuffer,
    ) -> (Self, Emission) {
        self.classify(precomputed, buffer, true)
    }

    fn classify(
        self,
        precomputed: Option<&Value>,
        buffer: &ContentBuffer,
        complete: bool,
    ) -> (Self, Emission) {
        if let Some(value) = precomputed {
            tracing::trace!("forwarding precomputed value");
            return (
                self,
                Emission::Forward {
                    value: Some(value.clone()),
                    failure: None,
                    normalized: buffer.as_str().to_string(),
                },
            );
        }
        if buffer.is_empty() {
            return (
                self,
                Emission::Forward {
                    value: None,
                    failure: None,
                    normalized: String::new(),
                },
            );
        }
        let parsed = if complete {
            buffer.parsed_complete()
        } else {
            buffer.parsed()
        };
        let extracted = match parsed {
            Ok(extracted) => extracted,
            Err(failure) => {
                tracing::trace!(error = %failure, "buffer not parseable yet");
                return (
                    self,
                    Emission::Forward {
                        value: None,
                        failure: Some(failure),
                        normalized: buffer.normalized(),
                    },
                );
            }
        };
        let fp = Fingerprint::of(&extracted.value);
        if self.last == Some(fp) {
            // compare against the latest decoded value, not the latest emitted one
            let next = Self {
                last: Some(fp),
                suppressed: self.suppressed + 1,
            };
            tracing::trace!(fingerprint = fp.short(), "suppressed unchanged value");
            return (next, Emission::Suppress);
        }
        tracing::debug!(
            fingerprint = fp.short(),
            strategy = extracted.strategy,
            "new value ready"
        );
        let next = Self {
            last: Some(fp),
            ..self
        };
        (
            next,
            Emission::Ready {
                value: extracted.value,
                strategy: extracted.strategy,
                normalized: buffer.normalized(),
            },
        )
    }

    /// Forget the last fingerprint so the next decoded value is always Ready.
    #[must_use]
    pub fn reset(self) -> Self {
        Self::default()
    }
}
