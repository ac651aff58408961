//! Turning entry bytes into a list of names.

use tracing::warn;

/// How invalid UTF-8 in an entry is handled. Decoding never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Drop invalid byte sequences.
    #[default]
    Ignore,
    /// Substitute U+FFFD for each invalid sequence.
    Replace,
}

impl DecodePolicy {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            DecodePolicy::Ignore => {
                let mut text = String::with_capacity(bytes.len());
                let mut dropped = 0;
                for chunk in bytes.utf8_chunks() {
                    text.push_str(chunk.valid());
                    dropped += chunk.invalid().len();
                }
                if dropped > 0 {
                    warn!(dropped, "dropped invalid UTF-8 bytes");
                }
                text
            }
            DecodePolicy::Replace => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\u{0b}'
            | '\u{0c}'
            | '\u{1c}'
            | '\u{1d}'
            | '\u{1e}'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

/// Split on every line terminator, treating `\r\n` as one.
///
/// A terminator at the very end does not produce a trailing empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r'
            && let Some(&(j, '\n')) = chars.peek()
        {
            chars.next();
            start = j + 1;
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Decode an entry and split it into names, keeping order and duplicates.
pub fn parse_name_list(bytes: &[u8], policy: DecodePolicy) -> Vec<String> {
    let text = policy.decode(bytes);
    split_lines(&text).into_iter().map(str::to_owned).collect()
}
