use crate::error::{ExtractError, ExtractErrorKind};
use crate::options::{Options, StrategyKind};
use crate::recover::{
    RecoveryLogEntry, RecoveryMode, decode_container, recover_to_value, recover_with_log,
};
use memchr::{memchr, memchr2, memrchr};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One way of finding JSON in a blob of model output.
pub trait ExtractionStrategy: Send + Sync + fmt::Debug {
    /// Stable name, reported alongside every successful extraction.
    fn name(&self) -> &'static str;

    /// Decode an object or array out of `text`.
    fn extract(&self, text: &str, opts: &Options) -> Result<Value, ExtractError>;

    /// Like `extract`, also returning the repairs applied. Only the
    /// recovering strategies produce entries.
    fn extract_logged(
        &self,
        text: &str,
        opts: &Options,
    ) -> Result<(Value, Vec<RecoveryLogEntry>), ExtractError> {
        self.extract(text, opts).map(|v| (v, Vec::new()))
    }
}

/// A decoded value and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Value,
    pub strategy: &'static str,
}

pub type ExtractionOutcome = Result<Extracted, ExtractError>;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectStrategy;

impl ExtractionStrategy for DirectStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::Direct.name()
    }

    fn extract(&self, text: &str, _opts: &Options) -> Result<Value, ExtractError> {
        decode_container(text.trim())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownFenceStrategy;

impl ExtractionStrategy for MarkdownFenceStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::MarkdownFence.name()
    }

    fn extract(&self, text: &str, opts: &Options) -> Result<Value, ExtractError> {
        if !opts.fenced_code_blocks {
            return Err(ExtractError::new(ExtractErrorKind::NoStructure, 0));
        }
        let mut blocks = collect_fenced_blocks(text);
        if blocks.is_empty() {
            return Err(ExtractError::new(ExtractErrorKind::NoStructure, 0));
        }
        // json-tagged blocks first, stable otherwise
        blocks.sort_by_key(|b| !b.lang.eq_ignore_ascii_case("json"));
        let mut last_err = None;
        for block in blocks {
            match decode_container(block.body.trim()) {
                Ok(v) => return Ok(v),
                Err(e) => last_err = Some(ExtractError::new(e.kind, block.offset)),
            }
        }
        Err(last_err.unwrap_or_else(|| ExtractError::new(ExtractErrorKind::NoStructure, 0)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BracketSliceStrategy;

impl ExtractionStrategy for BracketSliceStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::BracketSlice.name()
    }

    fn extract(&self, text: &str, _opts: &Options) -> Result<Value, ExtractError> {
        let bytes = text.as_bytes();
        match (memchr(b'{', bytes), memrchr(b'}', bytes)) {
            (Some(start), _) if inside_array(bytes, start) => Err(nested_in_array(start)),
            (Some(start), Some(end)) if end > start => decode_container(&text[start..=end])
                .map_err(|e| ExtractError::new(e.kind, start)),
            (Some(start), _) => Err(ExtractError::new(
                ExtractErrorKind::InvalidJson("no closing brace".to_string()),
                start,
            )),
            _ => Err(ExtractError::new(ExtractErrorKind::NoStructure, 0)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BraceMatchStrategy;

impl ExtractionStrategy for BraceMatchStrategy {
    fn name(&self) -> &'static str {
        StrategyKind::BraceMatch.name()
    }

    fn extract(&self, text: &str, _opts: &Options) -> Result<Value, ExtractError> {
        let bytes = text.as_bytes();
        let mut search = 0usize;
        let mut last_err = None;
        while let Some(rel) = memchr(b'{', &bytes[search..]) {
            let start = search + rel;
            let Some(end) = matching_brace(bytes, start) else {
                return Err(last_err.unwrap_or_else(|| {
                    ExtractError::new(
                        ExtractErrorKind::InvalidJson("unterminated object".to_string()),
                        start,
                    )
                }));
            };
            if inside_array(bytes, start) {
                last_err = Some(nested_in_array(start));
                search = end + 1;
                continue;
            }
            match decode_container(&text[start..=end]) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    last_err = Some(ExtractError::new(e.kind, start));
                    search = end + 1;
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ExtractError::new(ExtractErrorKind::NoStructure, 0)))
    }
}

/// Recovering reader started at the `{` or `[` that opens the response.
#[derive(Debug, Clone, Copy)]
pub struct RecoveryStrategy {
    mode: RecoveryMode,
}

impl RecoveryStrategy {
    pub fn partial() -> Self {
        Self {
            mode: RecoveryMode::Partial,
        }
    }

    pub fn tolerant() -> Self {
        Self {
            mode: RecoveryMode::Tolerant,
        }
    }
}

impl ExtractionStrategy for RecoveryStrategy {
    fn name(&self) -> &'static str {
        match self.mode {
            RecoveryMode::Partial => StrategyKind::PartialRecovery.name(),
            RecoveryMode::Tolerant => StrategyKind::TolerantRecovery.name(),
        }
    }

    fn extract(&self, text: &str, opts: &Options) -> Result<Value, ExtractError> {
        locate_root(text, |t| recover_to_value(t, self.mode, opts)).map(|(_, v)| v)
    }

    fn extract_logged(
        &self,
        text: &str,
        opts: &Options,
    ) -> Result<(Value, Vec<RecoveryLogEntry>), ExtractError> {
        let (start, (value, mut entries)) =
            locate_root(text, |t| recover_with_log(t, self.mode, opts))?;
        for entry in entries.iter_mut() {
            entry.position += start;
        }
        Ok((value, entries))
    }
}

/// Run `decode` from each `{` or `[` that may open the response, returning the
/// first success and the offset it started at.
///
/// A candidate that fails and closes is skipped as a whole, so nested
/// containers of a broken root are never tried on their own. A bracketed
/// aside like `see [1]` that closes before a later `{` is tried last.
/// Error positions are relative to `text`.
pub(crate) fn locate_root<T>(
    text: &str,
    decode: impl Fn(&str) -> Result<T, ExtractError>,
) -> Result<(usize, T), ExtractError> {
    let bytes = text.as_bytes();
    let mut search = 0usize;
    let mut asides = Vec::new();
    let mut first_err = None;
    while let Some(rel) = memchr2(b'{', b'[', &bytes[search..]) {
        let start = search + rel;
        let end = container_end(bytes, start);
        if let Some(end) = end
            && bytes[start] == b'['
            && memchr(b'{', &bytes[end + 1..]).is_some()
        {
            asides.push(start);
            search = end + 1;
            continue;
        }
        match decode(&text[start..]) {
            Ok(v) => return Ok((start, v)),
            Err(e) => {
                first_err.get_or_insert(ExtractError::new(e.kind, e.position + start));
            }
        }
        match end {
            Some(end) => search = end + 1,
            // an unclosed candidate runs to the end of the text
            None => break,
        }
    }
    for start in asides {
        match decode(&text[start..]) {
            Ok(v) => return Ok((start, v)),
            Err(e) => {
                first_err.get_or_insert(ExtractError::new(e.kind, e.position + start));
            }
        }
    }
    Err(first_err.unwrap_or_else(|| ExtractError::new(ExtractErrorKind::NoStructure, 0)))
}

/// Ordered list of strategies; the first success wins.
#[derive(Debug, Clone)]
pub struct StrategyChain {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    opts: Options,
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl StrategyChain {
    /// Build the chain listed in `opts.strategies`.
    pub fn new(opts: Options) -> Self {
        let strategies = opts.strategies.iter().map(|k| builtin(*k)).collect();
        Self { strategies, opts }
    }

    /// A chain with no strategies; add them with `with_strategy`.
    pub fn empty(opts: Options) -> Self {
        Self {
            strategies: Vec::new(),
            opts,
        }
    }

    pub fn with_strategy<S: ExtractionStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the chain on text that may still grow. With `Options::logging`
    /// on, the repairs applied are reported as `tracing` debug events.
    pub fn extract(&self, text: &str) -> ExtractionOutcome {
        self.extract_with(text, &self.opts)
    }

    /// Run the chain on text that is known to be complete, such as the
    /// buffer at the end of a stream: a number cut by the end is kept.
    pub fn extract_complete(&self, text: &str) -> ExtractionOutcome {
        self.extract_with(text, &self.opts.for_complete_text())
    }

    fn extract_with(&self, text: &str, opts: &Options) -> ExtractionOutcome {
        if !opts.logging {
            return self
                .run(text, opts, |s, t, o| s.extract(t, o).map(|v| (v, Vec::new())))
                .map(|(extracted, _)| extracted);
        }
        let (extracted, log) = self.run(text, opts, |s, t, o| s.extract_logged(t, o))?;
        for entry in &log {
            tracing::debug!(
                position = entry.position,
                context = %entry.context,
                "{}",
                entry.message
            );
        }
        Ok(extracted)
    }

    /// Run the chain and return the recovery log of the winning strategy.
    pub fn extract_with_log(
        &self,
        text: &str,
    ) -> Result<(Extracted, Vec<RecoveryLogEntry>), ExtractError> {
        self.run(text, &self.opts, |s, t, o| s.extract_logged(t, o))
    }

    fn run(
        &self,
        text: &str,
        opts: &Options,
        attempt: impl Fn(
            &dyn ExtractionStrategy,
            &str,
            &Options,
        ) -> Result<(Value, Vec<RecoveryLogEntry>), ExtractError>,
    ) -> Result<(Extracted, Vec<RecoveryLogEntry>), ExtractError> {
        if text.trim().is_empty() {
            return Err(ExtractError::new(ExtractErrorKind::EmptyInput, 0));
        }
        let mut last_err = None;
        for strategy in &self.strategies {
            match attempt(strategy.as_ref(), text, opts) {
                Ok((value, log)) => {
                    tracing::debug!(strategy = strategy.name(), "extracted structured value");
                    return Ok((
                        Extracted {
                            value,
                            strategy: strategy.name(),
                        },
                        log,
                    ));
                }
                Err(e) => {
                    tracing::trace!(strategy = strategy.name(), error = %e, "strategy failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| ExtractError::new(ExtractErrorKind::NoStrategy, 0)))
    }
}

fn builtin(kind: StrategyKind) -> Arc<dyn ExtractionStrategy> {
    match kind {
        StrategyKind::Direct => Arc::new(DirectStrategy),
        StrategyKind::MarkdownFence => Arc::new(MarkdownFenceStrategy),
        StrategyKind::BracketSlice => Arc::new(BracketSliceStrategy),
        StrategyKind::BraceMatch => Arc::new(BraceMatchStrategy),
        StrategyKind::PartialRecovery => Arc::new(RecoveryStrategy::partial()),
        StrategyKind::TolerantRecovery => Arc::new(RecoveryStrategy::tolerant()),
    }
}

struct FencedBlock<'a> {
    lang: &'a str,
    body: &'a str,
    offset: usize,
}

/// Closed ``` blocks in order of appearance. An unclosed trailing fence is skipped.
fn collect_fenced_blocks(s: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut pos = 0usize;
    while let Some(rel) = s[pos..].find("```") {
        let after_ticks = pos + rel + 3;
        // language tag runs to the end of the opening line
        let line_end = s[after_ticks..]
            .find(['\n', '\r'])
            .map(|p| after_ticks + p)
            .unwrap_or(s.len());
        let lang = s[after_ticks..line_end].trim();
        let body_start = if s[line_end..].starts_with("\r\n") {
            line_end + 2
        } else if line_end < s.len() {
            line_end + 1
        } else {
            line_end
        };
        let Some(end_rel) = s[body_start..].find("```") else {
            break;
        };
        let body_end = body_start + end_rel;
        blocks.push(FencedBlock {
            lang,
            body: &s[body_start..body_end],
            offset: body_start,
        });
        pos = body_end + 3;
    }
    blocks
}

/// Byte index of the `}` closing the object opened at `start`, skipping braces
/// inside string literals.
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Byte index of the bracket closing the container opened at `start`,
/// counting `{}` and `[]` alike and skipping string literals.
fn container_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// True when `pos` sits inside a `[` that is still open, so an object found
/// there is an element of a list rather than the response itself.
fn inside_array(bytes: &[u8], pos: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;
    for &b in &bytes[..pos] {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth > 0
}

fn nested_in_array(pos: usize) -> ExtractError {
    ExtractError::new(
        ExtractErrorKind::InvalidJson("object is an element of an unclosed array".to_string()),
        pos,
    )
}
