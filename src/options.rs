use crate::error::ExtractError;
use serde::{Deserialize, Serialize};

/// The strategies the default chain is built from, strictest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Trim and parse the whole text as JSON.
    Direct,
    /// Parse the body of a ```json fenced block.
    MarkdownFence,
    /// Slice from the first `{` to the last `}`.
    BracketSlice,
    /// String-aware depth scan for the first complete object.
    BraceMatch,
    /// Recovering reader, strict JSON syntax.
    PartialRecovery,
    /// Recovering reader with every tolerance enabled.
    TolerantRecovery,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::Direct,
        StrategyKind::MarkdownFence,
        StrategyKind::BracketSlice,
        StrategyKind::BraceMatch,
        StrategyKind::PartialRecovery,
        StrategyKind::TolerantRecovery,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Direct => "direct",
            StrategyKind::MarkdownFence => "markdown_fence",
            StrategyKind::BracketSlice => "bracket_slice",
            StrategyKind::BraceMatch => "brace_match",
            StrategyKind::PartialRecovery => "partial_recovery",
            StrategyKind::TolerantRecovery => "tolerant_recovery",
        }
    }
}

/// How the pipeline treats decoded values when deciding whether they are lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    /// Track top-level arrays as sequences, everything else as plain objects.
    #[default]
    Auto,
    /// Never track sequences.
    Object,
    /// Track arrays and single-property wrappers like `{"items": [...]}`.
    Sequence,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Look inside Markdown fenced code blocks like ```json ... ```.
    pub fenced_code_blocks: bool,
    /// Strategy chain, tried in order.
    pub strategies: Vec<StrategyKind>,
    /// Drop a comma directly before `}` or `]`.
    pub tolerate_trailing_commas: bool,
    /// Escape raw control characters (newlines, tabs) found inside strings.
    pub escape_control_chars: bool,
    /// Drop a member whose number was cut by the end of input, since the
    /// next fragment may still extend it. When false, the number is kept.
    /// Only applies to text that may still grow: one-shot extraction and the
    /// final fragment of a stream always keep it.
    pub drop_unterminated_numbers: bool,
    /// Tolerant mode: skip `//`, `/* */` and `#` comments.
    pub allow_comments: bool,
    /// Tolerant mode: accept single-quoted and curly-quoted strings.
    pub allow_single_quotes: bool,
    /// Tolerant mode: accept bare identifiers as object keys.
    pub allow_unquoted_keys: bool,
    /// Tolerant mode: normalize True/False/None/undefined.
    pub allow_python_keywords: bool,
    /// Tolerant mode: normalize NaN and Infinity to null.
    pub normalize_js_nonfinite: bool,
    /// Tolerant mode: insert a comma between two members missing one.
    pub insert_missing_commas: bool,
    /// Which decoded values count as sequences.
    pub response_shape: ResponseShape,
    /// Report the repairs the recovering reader applies as `tracing` debug
    /// events. `extract_with_log` returns them regardless.
    pub logging: bool,
    /// Characters captured on both sides of a position in log contexts.
    pub log_context_window: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fenced_code_blocks: true,
            strategies: StrategyKind::ALL.to_vec(),
            tolerate_trailing_commas: true,
            escape_control_chars: true,
            drop_unterminated_numbers: true,
            allow_comments: true,
            allow_single_quotes: true,
            allow_unquoted_keys: true,
            allow_python_keywords: true,
            normalize_js_nonfinite: true,
            insert_missing_commas: true,
            response_shape: ResponseShape::Auto,
            logging: false,
            log_context_window: 10,
        }
    }
}

impl Options {
    /// Load options from a JSON document; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ExtractError> {
        serde_json::from_str(s).map_err(|e| ExtractError::from_serde("config", e))
    }

    /// The same options for text that will not grow any further.
    pub fn for_complete_text(&self) -> Self {
        Self {
            drop_unterminated_numbers: false,
            ..self.clone()
        }
    }

    /// Strict preset: the chain stops at the partial recovering reader.
    pub fn strict() -> Self {
        Self {
            strategies: StrategyKind::ALL
                .iter()
                .copied()
                .filter(|k| *k != StrategyKind::TolerantRecovery)
                .collect(),
            ..Self::default()
        }
    }
}
