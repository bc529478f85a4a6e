//! Text helpers shared by the output parsers.

use crate::error::{GitError, GitResult};

/// Length of a full SHA-1 object name
pub const HASH_LEN: usize = 40;

/// Check if a string is a possibly valid git object name
///
/// Only full-length names are accepted; abbreviated hashes are rejected.
pub fn is_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Reassemble paragraphs that were wrapped at a column boundary
///
/// A newline directly followed by an ASCII alphanumeric character becomes a
/// single space, unless it is itself preceded by a newline (paragraph breaks
/// survive). Trailing whitespace is removed.
pub fn unwrap_lines(message: &str) -> String {
    let mut formatted = String::with_capacity(message.len());
    let mut chars = message.chars().peekable();
    let mut prev_newline = false;

    while let Some(c) = chars.next() {
        let next_is_alnum = chars.peek().is_some_and(|n| n.is_ascii_alphanumeric());
        if !prev_newline && c == '\n' && next_is_alnum {
            formatted.push(' ');
        } else {
            formatted.push(c);
        }
        prev_newline = c == '\n';
    }

    formatted.truncate(formatted.trim_end().len());
    formatted
}

/// Decode git output, repairing invalid UTF-8
///
/// Valid sequences are kept untouched; every byte that is not part of a valid
/// sequence is taken as a Latin-1 code point.
pub fn ensure_valid_utf8(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    let mut repaired = String::with_capacity(bytes.len() + bytes.len() / 2);
    for chunk in bytes.utf8_chunks() {
        repaired.push_str(chunk.valid());
        repaired.extend(chunk.invalid().iter().map(|&b| char::from(b)));
    }
    repaired
}

/// Decode a path field that git may have quoted
///
/// Unquoted input is returned as-is. Quoted input must be a single
/// double-quoted string using C escapes; git's octal escapes for raw bytes
/// are reassembled before UTF-8 decoding.
pub fn unquote_path(field: &str) -> GitResult<String> {
    let Some(quoted) = field.strip_prefix('"') else {
        return Ok(field.to_string());
    };

    let mut bytes = Vec::with_capacity(quoted.len());
    let mut iter = quoted.bytes().enumerate();

    while let Some((pos, b)) = iter.next() {
        match b {
            b'"' => {
                if pos + 1 != quoted.len() {
                    return Err(GitError::InvalidResult(format!(
                        "trailing data after quoted path: {field}"
                    )));
                }
                return Ok(ensure_valid_utf8(&bytes));
            }
            b'\\' => {
                let Some((_, esc)) = iter.next() else {
                    break;
                };
                let decoded = match esc {
                    b'n' => b'\n',
                    b't' => b'\t',
                    b'r' => b'\r',
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'v' => 0x0b,
                    b'"' => b'"',
                    b'\\' => b'\\',
                    b'0'..=b'3' => {
                        let mut value = u32::from(esc - b'0');
                        for _ in 0..2 {
                            match iter.next() {
                                Some((_, d @ b'0'..=b'7')) => value = value * 8 + u32::from(d - b'0'),
                                _ => {
                                    return Err(GitError::InvalidResult(format!(
                                        "bad octal escape in path: {field}"
                                    )));
                                }
                            }
                        }
                        // at most \377
                        value as u8
                    }
                    other => {
                        return Err(GitError::InvalidResult(format!(
                            "unknown escape '\\{}' in path: {field}",
                            char::from(other)
                        )));
                    }
                };
                bytes.push(decoded);
            }
            _ => bytes.push(b),
        }
    }

    Err(GitError::InvalidResult(format!(
        "unterminated quoted path: {field}"
    )))
}
