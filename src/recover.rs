//! Single-pass recovering reader for JSON cut off mid-stream.
//!
//! The scanner copies the input into a compact JSON buffer while tracking a
//! container stack and string/escape state. At end of input it closes the
//! open string, trims dangling members and synthesizes the missing closers in
//! reverse stack order, then decodes the result with serde_json.

use crate::classify::*;
use crate::error::{ExtractError, ExtractErrorKind};
use crate::options::Options;
use memchr::{memchr, memchr2};
use serde_json::Value;

/// How much non-JSON syntax the reader accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryMode {
    /// JSON syntax plus truncation repairs, trailing commas and lenient escapes.
    Partial,
    /// Additionally comments, single quotes, unquoted keys, Python/JS keywords,
    /// bare words and missing commas.
    Tolerant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLogEntry {
    pub position: usize,
    pub message: &'static str,
    pub context: String,
}

struct Logger {
    enable: bool,
    window: usize,
    entries: Vec<RecoveryLogEntry>,
}

impl Logger {
    #[inline]
    fn log(&mut self, input: &str, position: usize, message: &'static str) {
        if self.enable {
            self.entries.push(RecoveryLogEntry {
                position,
                message,
                context: build_context(input, position, self.window),
            });
        }
    }
}

fn build_context(input: &str, pos: usize, window: usize) -> String {
    let pos = pos.min(input.len());
    let mut start = pos.saturating_sub(window);
    while !input.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (pos + window).min(input.len());
    while !input.is_char_boundary(end) {
        end += 1;
    }
    input[start..end].to_string()
}

#[inline]
fn next_char(s: &str, i: usize) -> (char, usize) {
    if i >= s.len() {
        return ('\0', 0);
    }
    match s[i..].chars().next() {
        Some(c) => (c, c.len_utf8()),
        None => ('\0', 0),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Container {
    Object,
    Array,
}

impl Container {
    fn closer(self) -> char {
        match self {
            Container::Object => '}',
            Container::Array => ']',
        }
    }
}

/// What the innermost container expects next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Key,
    Colon,
    Value,
    Comma,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    slot: Slot,
    members: usize,
    /// Output length before the current member, including its leading comma.
    member_start: usize,
}

impl Frame {
    fn open_slot(&self) -> Slot {
        match self.container {
            Container::Object => Slot::Key,
            Container::Array => Slot::Value,
        }
    }

    fn settled_slot(&self) -> Slot {
        if self.members > 0 {
            Slot::Comma
        } else {
            self.open_slot()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum QuoteKind {
    Double,
    DoubleLike,
    SingleLike,
}

impl QuoteKind {
    fn of(c: char) -> Self {
        if c == '"' {
            QuoteKind::Double
        } else if is_double_quote_like(c) {
            QuoteKind::DoubleLike
        } else {
            QuoteKind::SingleLike
        }
    }

    fn closes(self, c: char) -> bool {
        match self {
            QuoteKind::Double => c == '"',
            QuoteKind::DoubleLike => is_double_quote_like(c),
            QuoteKind::SingleLike => is_single_quote_like(c),
        }
    }
}

struct StringState {
    quote: QuoteKind,
    is_key: bool,
    escape: bool,
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
    out: String,
    stack: Vec<Frame>,
    string: Option<StringState>,
    root_closed: bool,
    tolerant: bool,
    opts: &'a Options,
    logger: Logger,
}

/// Recover `input` into a compact JSON text. The root must be an object or an array.
pub fn recover_to_string(
    input: &str,
    mode: RecoveryMode,
    opts: &Options,
) -> Result<String, ExtractError> {
    Reader::new(input, mode, opts, false).run().map(|(s, _)| s)
}

/// Recover `input` and decode it.
pub fn recover_to_value(
    input: &str,
    mode: RecoveryMode,
    opts: &Options,
) -> Result<Value, ExtractError> {
    let s = recover_to_string(input, mode, opts)?;
    decode_container(&s)
}

/// Recover `input`, decode it, and return the repairs that were applied.
pub fn recover_with_log(
    input: &str,
    mode: RecoveryMode,
    opts: &Options,
) -> Result<(Value, Vec<RecoveryLogEntry>), ExtractError> {
    let (s, entries) = Reader::new(input, mode, opts, true).run()?;
    Ok((decode_container(&s)?, entries))
}

/// Decode JSON text, accepting only objects and arrays.
pub(crate) fn decode_container(s: &str) -> Result<Value, ExtractError> {
    let v: Value = serde_json::from_str(s).map_err(|e| ExtractError::from_serde("decode", e))?;
    if v.is_object() || v.is_array() {
        Ok(v)
    } else {
        Err(ExtractError::new(ExtractErrorKind::ScalarRejected, 0))
    }
}

impl<'a> Reader<'a> {
    fn new(input: &'a str, mode: RecoveryMode, opts: &'a Options, force_log: bool) -> Self {
        Self {
            input,
            pos: 0,
            out: String::with_capacity(input.len() + 8),
            stack: Vec::new(),
            string: None,
            root_closed: false,
            tolerant: mode == RecoveryMode::Tolerant,
            opts,
            logger: Logger {
                enable: force_log || opts.logging,
                window: opts.log_context_window,
                entries: Vec::new(),
            },
        }
    }

    fn log(&mut self, message: &'static str) {
        self.logger.log(self.input, self.pos, message);
    }

    fn err(&self, kind: ExtractErrorKind) -> ExtractError {
        ExtractError::new(kind, self.pos)
    }

    fn run(mut self) -> Result<(String, Vec<RecoveryLogEntry>), ExtractError> {
        self.skip_insignificant();
        let (first, _) = next_char(self.input, self.pos);
        if self.pos >= self.input.len() {
            return Err(self.err(ExtractErrorKind::NoStructure));
        }
        if !is_container_open(first) {
            return Err(self.root_error(first));
        }

        while self.pos < self.input.len() {
            if self.root_closed {
                if !self.input[self.pos..].trim().is_empty() {
                    self.log("ignored text after root value");
                }
                break;
            }
            if self.string.is_some() {
                self.scan_string()?;
            } else {
                self.scan_structure()?;
            }
        }

        self.finish();
        Ok((self.out, self.logger.entries))
    }

    fn root_error(&self, first: char) -> ExtractError {
        let rest = self.input[self.pos..].trim();
        if serde_json::from_str::<Value>(rest).is_ok() {
            return self.err(ExtractErrorKind::ScalarRejected);
        }
        if memchr2(b'{', b'[', rest.as_bytes()).is_none() {
            return self.err(ExtractErrorKind::NoStructure);
        }
        self.err(ExtractErrorKind::UnexpectedChar(first))
    }

    fn skip_insignificant(&mut self) {
        loop {
            let start = self.pos;
            loop {
                let (c, len) = next_char(self.input, self.pos);
                if len == 0 || !is_whitespace(c) {
                    break;
                }
                self.pos += len;
            }
            if self.tolerant && self.opts.allow_comments {
                self.skip_comment();
            }
            if self.pos == start {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        let bytes = self.input.as_bytes();
        let rest = &bytes[self.pos..];
        if rest.starts_with(b"//") || rest.starts_with(b"#") {
            match memchr2(b'\n', b'\r', rest) {
                Some(p) => self.pos += p + 1,
                None => self.pos = bytes.len(),
            }
            self.log("removed comment");
        } else if rest.starts_with(b"/*") {
            let mut off = 2;
            let mut end = bytes.len();
            while let Some(p) = memchr(b'*', &rest[off..]) {
                let idx = off + p;
                if rest.get(idx + 1) == Some(&b'/') {
                    end = self.pos + idx + 2;
                    break;
                }
                off = idx + 1;
            }
            self.pos = end;
            self.log("removed comment");
        }
    }

    // ---- strings ----

    fn scan_string(&mut self) -> Result<(), ExtractError> {
        let Some(state) = self.string.as_ref() else {
            return Ok(());
        };
        let (quote, escape) = (state.quote, state.escape);

        // Fast path: copy plain bytes up to the next quote, backslash or control byte.
        if quote == QuoteKind::Double && !escape {
            let bytes = &self.input.as_bytes()[self.pos..];
            let run = memchr2(b'"', b'\\', bytes).unwrap_or(bytes.len());
            let run = bytes[..run].iter().position(|&b| b < 0x20).unwrap_or(run);
            if run > 0 {
                self.out.push_str(&self.input[self.pos..self.pos + run]);
                self.pos += run;
                return Ok(());
            }
        }

        let (c, len) = next_char(self.input, self.pos);
        if escape {
            self.set_escape(false);
            return self.scan_escape(c, len);
        }
        if c == '\\' {
            self.set_escape(true);
            self.pos += len;
            return Ok(());
        }
        if quote.closes(c) {
            self.out.push('"');
            self.pos += len;
            self.end_string();
            return Ok(());
        }
        if c == '"' {
            // literal double quote inside a single-quoted string
            self.out.push_str("\\\"");
        } else if (c as u32) < 0x20 && self.opts.escape_control_chars {
            push_escaped_control(&mut self.out, c);
            self.log("escaped control character in string");
        } else {
            self.out.push(c);
        }
        self.pos += len;
        Ok(())
    }

    fn set_escape(&mut self, on: bool) {
        if let Some(s) = self.string.as_mut() {
            s.escape = on;
        }
    }

    fn scan_escape(&mut self, c: char, len: usize) -> Result<(), ExtractError> {
        match c {
            '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' => {
                self.out.push('\\');
                self.out.push(c);
                self.pos += len;
            }
            '\'' => {
                self.out.push('\'');
                self.pos += len;
            }
            'u' => self.scan_unicode_escape()?,
            _ => {
                // unknown escape: keep the backslash as literal text
                self.out.push_str("\\\\");
                if (c as u32) < 0x20 {
                    push_escaped_control(&mut self.out, c);
                } else {
                    self.out.push(c);
                }
                self.log("kept unknown escape literally");
                self.pos += len;
            }
        }
        Ok(())
    }

    fn scan_unicode_escape(&mut self) -> Result<(), ExtractError> {
        let hex_start = self.pos + 1;
        let rest = &self.input.as_bytes()[hex_start..];
        let avail = rest.iter().take(4).take_while(|b| b.is_ascii_hexdigit()).count();
        if avail < 4 {
            if avail == rest.len() {
                // cut by end of input
                self.pos = self.input.len();
                self.log("dropped truncated unicode escape");
            } else {
                self.out.push_str("\\\\u");
                self.pos = hex_start;
                self.log("kept invalid unicode escape literally");
            }
            return Ok(());
        }
        let hex = &self.input[hex_start..hex_start + 4];
        let code = u32::from_str_radix(hex, 16).unwrap_or(0);
        let after = hex_start + 4;
        if (0xD800..0xDC00).contains(&code) && is_escape_prefix(&self.input[after..]) {
            // high surrogate whose low half has not arrived yet
            self.pos = self.input.len();
            self.log("dropped truncated surrogate pair");
            return Ok(());
        }
        self.out.push_str("\\u");
        self.out.push_str(hex);
        self.pos = after;
        Ok(())
    }

    fn start_string(&mut self, quote_char: char, is_key: bool) {
        let quote = QuoteKind::of(quote_char);
        if quote != QuoteKind::Double {
            self.log("normalized quote character");
        }
        self.out.push('"');
        self.pos += quote_char.len_utf8();
        self.string = Some(StringState {
            quote,
            is_key,
            escape: false,
        });
    }

    fn end_string(&mut self) {
        let is_key = self.string.take().map(|s| s.is_key).unwrap_or(false);
        if is_key {
            self.set_slot(Slot::Colon);
        } else {
            self.commit_value();
        }
    }

    // ---- structure ----

    fn scan_structure(&mut self) -> Result<(), ExtractError> {
        let (c, len) = next_char(self.input, self.pos);
        if is_whitespace(c) {
            self.pos += len;
            return Ok(());
        }
        if self.tolerant && self.opts.allow_comments && (c == '/' || c == '#') {
            let before = self.pos;
            self.skip_comment();
            if self.pos != before {
                return Ok(());
            }
        }
        match c {
            '{' | '[' => {
                self.prepare_value(c)?;
                self.open_container(c);
                Ok(())
            }
            '}' | ']' => self.close_container(c),
            ',' => self.scan_comma(),
            ':' => self.scan_colon(),
            '"' => self.scan_quote(c),
            c if self.tolerant && self.opts.allow_single_quotes && is_quote(c) => {
                self.scan_quote(c)
            }
            c if is_number_start(c) => self.scan_number(),
            c if is_ident_start(c) => self.scan_word(),
            other => Err(self.err(ExtractErrorKind::UnexpectedChar(other))),
        }
    }

    fn top(&self) -> Option<(Container, Slot)> {
        self.stack.last().map(|f| (f.container, f.slot))
    }

    fn set_slot(&mut self, slot: Slot) {
        if let Some(f) = self.stack.last_mut() {
            f.slot = slot;
        }
    }

    /// Insert a separator the input left out, opening a new member.
    fn insert_comma(&mut self, next: Slot) {
        let out_len = self.out.len();
        if let Some(f) = self.stack.last_mut() {
            f.member_start = out_len;
            f.slot = next;
        }
        self.out.push(',');
        self.log("inserted missing comma");
    }

    /// Make the innermost container ready to accept a value starting with `c`.
    fn prepare_value(&mut self, c: char) -> Result<(), ExtractError> {
        let insert_commas = self.tolerant && self.opts.insert_missing_commas;
        match self.top() {
            None if self.out.is_empty() => Ok(()),
            Some((_, Slot::Value)) => Ok(()),
            Some((Container::Array, Slot::Comma)) if insert_commas => {
                self.insert_comma(Slot::Value);
                Ok(())
            }
            Some((Container::Object, Slot::Colon)) if self.tolerant => {
                self.out.push(':');
                self.set_slot(Slot::Value);
                self.log("inserted missing colon");
                Ok(())
            }
            _ => Err(self.err(ExtractErrorKind::UnexpectedChar(c))),
        }
    }

    /// Make the innermost object ready to accept a key starting with `c`.
    fn prepare_key(&mut self, c: char) -> Result<(), ExtractError> {
        let insert_commas = self.tolerant && self.opts.insert_missing_commas;
        match self.top() {
            Some((_, Slot::Key)) => Ok(()),
            Some((_, Slot::Comma)) if insert_commas => {
                self.insert_comma(Slot::Key);
                Ok(())
            }
            _ => Err(self.err(ExtractErrorKind::UnexpectedChar(c))),
        }
    }

    fn expects_key(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                container: Container::Object,
                slot: Slot::Key | Slot::Comma,
                ..
            })
        )
    }

    fn open_container(&mut self, c: char) {
        // the parent counts the child as its value right away, so a cut-off
        // child is closed rather than dropped
        self.commit_value();
        let container = if c == '{' {
            Container::Object
        } else {
            Container::Array
        };
        self.out.push(c);
        self.pos += 1;
        let frame = Frame {
            container,
            slot: Slot::Value,
            members: 0,
            member_start: self.out.len(),
        };
        let slot = frame.open_slot();
        self.stack.push(Frame { slot, ..frame });
    }

    fn close_container(&mut self, c: char) -> Result<(), ExtractError> {
        let Some(&Frame {
            container,
            slot,
            members,
            member_start,
        }) = self.stack.last()
        else {
            return Err(self.err(ExtractErrorKind::UnexpectedChar(c)));
        };
        if container.closer() != c {
            if !self.tolerant {
                return Err(self.err(ExtractErrorKind::UnexpectedChar(c)));
            }
            self.log("replaced mismatched closer");
        }
        match (container, slot) {
            (_, Slot::Comma) => {}
            (Container::Object, Slot::Key) | (Container::Array, Slot::Value) => {
                if members > 0 {
                    if !self.opts.tolerate_trailing_commas {
                        return Err(self.err(ExtractErrorKind::UnexpectedChar(c)));
                    }
                    self.out.truncate(member_start);
                    self.log("removed trailing comma");
                }
            }
            (Container::Object, _) => {
                if !self.tolerant {
                    return Err(self.err(ExtractErrorKind::UnexpectedChar(c)));
                }
                self.out.truncate(member_start);
                self.log("dropped key without value");
            }
            (Container::Array, _) => {}
        }
        self.stack.pop();
        self.out.push(container.closer());
        self.pos += c.len_utf8();
        if self.stack.is_empty() {
            self.root_closed = true;
        }
        Ok(())
    }

    fn scan_comma(&mut self) -> Result<(), ExtractError> {
        let out_len = self.out.len();
        if let Some(frame) = self.stack.last_mut()
            && frame.slot == Slot::Comma
        {
            frame.member_start = out_len;
            frame.slot = frame.open_slot();
            self.out.push(',');
            self.pos += 1;
            return Ok(());
        }
        if self.tolerant && !self.stack.is_empty() {
            self.pos += 1;
            self.log("removed redundant comma");
            return Ok(());
        }
        Err(self.err(ExtractErrorKind::UnexpectedChar(',')))
    }

    fn scan_colon(&mut self) -> Result<(), ExtractError> {
        match self.top() {
            Some((_, Slot::Colon)) => {
                self.set_slot(Slot::Value);
                self.out.push(':');
                self.pos += 1;
                Ok(())
            }
            _ if self.tolerant => {
                self.pos += 1;
                self.log("removed stray colon");
                Ok(())
            }
            _ => Err(self.err(ExtractErrorKind::UnexpectedChar(':'))),
        }
    }

    fn scan_quote(&mut self, c: char) -> Result<(), ExtractError> {
        if self.expects_key() {
            self.prepare_key(c)?;
            self.start_string(c, true);
        } else {
            self.prepare_value(c)?;
            self.start_string(c, false);
        }
        Ok(())
    }

    fn scan_number(&mut self) -> Result<(), ExtractError> {
        let rest = &self.input[self.pos..];
        let (first, _) = next_char(self.input, self.pos);
        if self.tolerant && self.opts.normalize_js_nonfinite && rest.starts_with("-Infinity") {
            self.prepare_value(first)?;
            self.out.push_str("null");
            self.pos += "-Infinity".len();
            self.log("normalized -Infinity to null");
            self.commit_value();
            return Ok(());
        }
        self.prepare_value(first)?;
        let len = rest
            .bytes()
            .take_while(|&b| is_number_char(b as char))
            .count();
        let token = &rest[..len];
        self.pos += len;
        if self.pos < self.input.len() {
            self.out.push_str(token);
            self.commit_value();
            return Ok(());
        }
        // the token runs into end of input and may still grow
        let trimmed = token.trim_end_matches(['.', 'e', 'E', '+', '-']);
        if self.opts.drop_unterminated_numbers || trimmed.is_empty() || trimmed == "-" {
            self.rollback_member();
            self.log("dropped unterminated number");
        } else {
            self.out.push_str(trimmed);
            self.commit_value();
        }
        Ok(())
    }

    fn scan_word(&mut self) -> Result<(), ExtractError> {
        let (first, _) = next_char(self.input, self.pos);
        let rest = &self.input[self.pos..];
        let len: usize = rest
            .chars()
            .take_while(|&c| is_ident_char(c))
            .map(char::len_utf8)
            .sum();
        let word = &rest[..len];
        let at_end = self.pos + len >= self.input.len();

        if self.expects_key() {
            if !(self.tolerant && self.opts.allow_unquoted_keys) {
                return Err(self.err(ExtractErrorKind::UnexpectedChar(first)));
            }
            self.prepare_key(first)?;
            self.pos += len;
            if at_end {
                self.rollback_member();
                self.log("dropped unterminated key");
                return Ok(());
            }
            self.out.push_str(&quote_json(word));
            self.set_slot(Slot::Colon);
            self.log("quoted unquoted key");
            return Ok(());
        }

        self.prepare_value(first)?;
        if at_end {
            self.pos += len;
            match self.complete_literal(word) {
                Some(lit) => {
                    self.out.push_str(lit);
                    self.commit_value();
                    self.log("completed truncated literal");
                }
                None if self.tolerant => {
                    self.out.push_str(&quote_json(word));
                    self.commit_value();
                    self.log("quoted bare word");
                }
                None => return Err(self.err(ExtractErrorKind::UnexpectedChar(first))),
            }
            return Ok(());
        }

        if let Some(lit) = self.keyword(word) {
            self.pos += len;
            self.out.push_str(lit);
            self.commit_value();
            return Ok(());
        }
        if !self.tolerant {
            return Err(self.err(ExtractErrorKind::UnexpectedChar(first)));
        }
        // bare word value: runs until the next structural delimiter
        let span: usize = rest
            .chars()
            .take_while(|&c| !is_bare_word_delimiter(c) && !is_quote(c))
            .map(char::len_utf8)
            .sum();
        let text = rest[..span].trim_end();
        self.out.push_str(&quote_json(text));
        self.pos += span;
        self.commit_value();
        self.log("quoted bare word");
        Ok(())
    }

    fn keyword(&mut self, word: &str) -> Option<&'static str> {
        match word {
            "true" => return Some("true"),
            "false" => return Some("false"),
            "null" => return Some("null"),
            _ => {}
        }
        if !self.tolerant {
            return None;
        }
        let lit = match word {
            "True" if self.opts.allow_python_keywords => "true",
            "False" if self.opts.allow_python_keywords => "false",
            "None" | "undefined" if self.opts.allow_python_keywords => "null",
            "NaN" | "Infinity" if self.opts.normalize_js_nonfinite => "null",
            _ => return None,
        };
        self.log("normalized keyword");
        Some(lit)
    }

    fn complete_literal(&self, word: &str) -> Option<&'static str> {
        const STRICT: [(&str, &str); 3] = [("true", "true"), ("false", "false"), ("null", "null")];
        const PYTHON: [(&str, &str); 3] = [("True", "true"), ("False", "false"), ("None", "null")];
        let python = self.tolerant && self.opts.allow_python_keywords;
        STRICT
            .iter()
            .chain(PYTHON.iter().filter(|_| python))
            .find(|(lit, _)| lit.starts_with(word))
            .map(|(_, out)| *out)
    }

    /// The innermost container received a complete value.
    fn commit_value(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            frame.members += 1;
            frame.slot = Slot::Comma;
        }
    }

    /// Drop the member currently being written, including its leading comma.
    fn rollback_member(&mut self) {
        if let Some(frame) = self.stack.last_mut() {
            self.out.truncate(frame.member_start);
            frame.slot = frame.settled_slot();
        }
    }

    fn finish(&mut self) {
        if let Some(state) = self.string.take() {
            if state.escape {
                self.log("dropped dangling escape");
            }
            if state.is_key {
                self.rollback_member();
                self.log("dropped unterminated key");
            } else {
                self.out.push('"');
                self.commit_value();
                self.log("closed unterminated string");
            }
        }
        while let Some(frame) = self.stack.pop() {
            match (frame.container, frame.slot) {
                (_, Slot::Comma) => {}
                (Container::Object, Slot::Key) | (Container::Array, Slot::Value) => {
                    if frame.members > 0 {
                        self.out.truncate(frame.member_start);
                        self.log("removed dangling comma");
                    }
                }
                (Container::Object, _) => {
                    self.out.truncate(frame.member_start);
                    self.log("dropped key without value");
                }
                (Container::Array, _) => {}
            }
            self.out.push(frame.container.closer());
            match frame.container {
                Container::Object => self.log("closed unterminated object"),
                Container::Array => self.log("closed unterminated array"),
            }
        }
    }
}

fn push_escaped_control(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{08}' => out.push_str("\\b"),
        '\u{0C}' => out.push_str("\\f"),
        other => out.push_str(&format!("\\u{:04x}", other as u32)),
    }
}

/// True when `tail` could still become a `\uXXXX` escape.
fn is_escape_prefix(tail: &str) -> bool {
    let b = tail.as_bytes();
    b.len() < 6
        && b.iter().enumerate().all(|(i, &c)| match i {
            0 => c == b'\\',
            1 => c == b'u',
            _ => c.is_ascii_hexdigit(),
        })
}

fn quote_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if (c as u32) < 0x20 => push_escaped_control(&mut out, c),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
