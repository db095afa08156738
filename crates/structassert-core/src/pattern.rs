//! Delimited regular expressions.
//!
//! Type rules and custom filter names write patterns between delimiters with
//! trailing flags: `/^\d+$/`, `~^[a-z]+~i`, `{^\w+$}`. Bracket delimiters
//! pair up (`(` `)`, `{` `}`, `[` `]`, `<` `>`); any other punctuation
//! closes with itself.

use regex::{Regex, RegexBuilder};

use crate::error::MatchError;

/// Delimiters whose escaped form `\d` is unescaped before compiling, since
/// the regex engine has no use for the escape.
const PLAIN_DELIMITERS: &[char] = &['/', '~', '#', '%', '@', '!', ',', ';', '=', '`', '\'', '"'];

fn closing_delimiter(open: char) -> char {
    match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    }
}

fn is_delimiter(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace() && c != '\\'
}

/// Split a delimited pattern into `(body, flags)`.
///
/// Returns `None` when `source` is not written in delimited form.
pub fn split_delimited(source: &str) -> Option<(&str, &str)> {
    let open = source.chars().next().filter(|c| is_delimiter(*c))?;
    let close = closing_delimiter(open);
    let rest = &source[open.len_utf8()..];
    let end = rest.rfind(close)?;
    let flags = &rest[end + close.len_utf8()..];
    if !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((&rest[..end], flags))
}

/// Compile a pattern written in delimited form; a bare pattern without
/// delimiters is compiled as-is.
pub fn compile(source: &str) -> Result<Regex, MatchError> {
    let invalid = |message: String| MatchError::InvalidPattern {
        pattern: source.to_string(),
        message,
    };

    let Some((body, flags)) = split_delimited(source) else {
        return Regex::new(source).map_err(|e| invalid(e.to_string()));
    };

    let open = source.chars().next().unwrap_or('/');
    let body = if PLAIN_DELIMITERS.contains(&open) {
        body.replace(&format!("\\{open}"), &open.to_string())
    } else {
        body.to_string()
    };

    let mut builder = RegexBuilder::new(&body);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            // Already the engine's behaviour.
            'u' | 'D' => &mut builder,
            other => return Err(invalid(format!("unsupported flag '{other}'"))),
        };
    }

    builder.build().map_err(|e| invalid(e.to_string()))
}
