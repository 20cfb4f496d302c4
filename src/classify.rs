#[inline]
pub fn is_whitespace(c: char) -> bool {
    // U+FEFF (BOM) counts as whitespace so it can be skipped ahead of the root.
    matches!(
        c,
        '\u{0009}' | '\u{000A}' | '\u{000D}' | '\u{0020}' | '\u{FEFF}'
    )
}

#[inline]
pub fn is_container_open(c: char) -> bool {
    c == '{' || c == '['
}

#[inline]
pub fn is_number_start(c: char) -> bool {
    c.is_ascii_digit() || c == '-'
}

#[inline]
pub fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[inline]
pub fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-')
}

/// Characters that end a bare word used as a value.
#[inline]
pub fn is_bare_word_delimiter(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}' | '\n' | '\r' | ':')
}

#[inline]
pub fn is_double_quote_like(c: char) -> bool {
    c == '"' || c == '\u{201C}' || c == '\u{201D}'
}

#[inline]
pub fn is_single_quote_like(c: char) -> bool {
    matches!(c, '\u{27}' | '\u{2018}' | '\u{2019}')
}

#[inline]
pub fn is_quote(c: char) -> bool {
    is_double_quote_like(c) || is_single_quote_like(c)
}
