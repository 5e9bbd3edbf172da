//! Line-oriented parser for session files.
//!
//! ```text
//! # comment
//! [ Greetings | 30 ]
//! Hello
//! Bonjour
//! ```
//!
//! The file is read once into the session buffer. Every header and item is
//! recorded as a span into that buffer; nothing is copied or rewritten.
//! Parsing stops at the first error.

use std::fs::File;
use std::io::{self, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::invariants::validate_invariants;
use crate::core::model::{Limits, MAX_GROUP_SECONDS, MIN_GROUP_SECONDS, Session, Span};

/// Why a particular line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line too long")]
    LineTooLong,
    #[error("malformed header")]
    MalformedHeader,
    #[error("invalid seconds value")]
    InvalidSeconds,
    #[error("too many groups")]
    TooManyGroups,
    #[error("too many items")]
    TooManyItems,
    #[error("item before any group header")]
    ItemBeforeHeader,
    #[error("previous group has no items")]
    EmptyGroup,
    #[error("last group has no items")]
    EmptyLastGroup,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to open '{path}'")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file exceeds {max} bytes")]
    FileTooLarge { max: usize },
    #[error("no groups found")]
    NoGroups,
    /// `line` is 1-based.
    #[error("line {line}: {kind}")]
    Line { line: usize, kind: LineError },
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Line { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub fn line_error(&self) -> Option<LineError> {
        match self {
            ParseError::Line { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Read `path` (bounded by `limits.max_file_bytes`) and parse it.
pub fn parse_file(path: &Path, limits: &Limits) -> Result<Session, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut bytes = Vec::new();
    // One byte past the limit is enough to detect an oversized file.
    file.take(limits.max_file_bytes as u64 + 1)
        .read_to_end(&mut bytes)
        .map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_bytes(bytes, limits)
}

/// Parse an in-memory session file. The returned session takes ownership of
/// `bytes` as its buffer.
pub fn parse_bytes(bytes: Vec<u8>, limits: &Limits) -> Result<Session, ParseError> {
    let max = limits.max_file_bytes.min(u32::MAX as usize);
    if bytes.len() > max {
        return Err(ParseError::FileTooLarge { max });
    }

    let lines = line_ranges(&bytes);
    let mut session = Session::with_buffer(bytes);
    let mut eof_line = 0;

    for (index, range) in lines.into_iter().enumerate() {
        let line_no = index + 1;
        eof_line = line_no;
        let at = |kind| ParseError::Line {
            line: line_no,
            kind,
        };

        if range.len() > limits.max_line_len {
            return Err(at(LineError::LineTooLong));
        }
        let line = &session.buffer()[range.clone()];
        let content = trim(line);
        if content.is_empty() || line[content.start] == b'#' {
            continue;
        }

        if line[content.start] == b'[' {
            if session.last_group().is_some_and(|group| group.item_count == 0) {
                return Err(at(LineError::EmptyGroup));
            }
            let (name, seconds) = parse_header(line, range.start).map_err(at)?;
            if session.group_count() >= limits.max_groups {
                return Err(at(LineError::TooManyGroups));
            }
            session.push_group(name, seconds);
        } else {
            if session.last_group().is_none() {
                return Err(at(LineError::ItemBeforeHeader));
            }
            if session.item_count() >= limits.max_items {
                return Err(at(LineError::TooManyItems));
            }
            session.push_item(span(range));
        }
    }

    match session.last_group() {
        None => Err(ParseError::NoGroups),
        Some(group) if group.item_count == 0 => Err(ParseError::Line {
            line: eof_line,
            kind: LineError::EmptyLastGroup,
        }),
        Some(_) => {
            debug_assert!(validate_invariants(&session).is_empty());
            Ok(session)
        }
    }
}

/// Split at `\n`, dropping one trailing `\r` per line. The segment after the
/// final `\n` counts as a line even when empty.
fn line_ranges(bytes: &[u8]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for segment in bytes.split(|&byte| byte == b'\n') {
        let mut end = start + segment.len();
        if segment.last() == Some(&b'\r') {
            end -= 1;
        }
        ranges.push(start..end);
        start += segment.len() + 1;
    }
    ranges
}

/// `line` is the raw header line; `line_offset` is its position in the buffer.
fn parse_header(line: &[u8], line_offset: usize) -> Result<(Span, u32), LineError> {
    let outer = trim(line);
    let header = &line[outer.clone()];
    if header.len() < 3 || header[0] != b'[' || header[header.len() - 1] != b']' {
        return Err(LineError::MalformedHeader);
    }

    let inner_start = outer.start + 1;
    let inner = &line[inner_start..outer.end - 1];
    let mut pipes = inner.iter().enumerate().filter(|(_, byte)| **byte == b'|');
    let pipe = match (pipes.next(), pipes.next()) {
        (Some((pipe, _)), None) => pipe,
        _ => return Err(LineError::MalformedHeader),
    };

    let name = trim(&inner[..pipe]);
    let seconds = trim(&inner[pipe + 1..]);
    if name.is_empty() || seconds.is_empty() {
        return Err(LineError::MalformedHeader);
    }

    let name_start = line_offset + inner_start + name.start;
    let seconds = parse_seconds(&inner[pipe + 1..][seconds])?;
    Ok((span(name_start..name_start + name.len()), seconds))
}

fn parse_seconds(digits: &[u8]) -> Result<u32, LineError> {
    let mut value: u32 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(LineError::InvalidSeconds);
        }
        value = value
            .checked_mul(10)
            .and_then(|value| value.checked_add(u32::from(byte - b'0')))
            .ok_or(LineError::InvalidSeconds)?;
    }
    if !(MIN_GROUP_SECONDS..=MAX_GROUP_SECONDS).contains(&value) {
        return Err(LineError::InvalidSeconds);
    }
    Ok(value)
}

/// Range of `bytes` without leading and trailing ASCII whitespace.
fn trim(bytes: &[u8]) -> Range<usize> {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|byte| !byte.is_ascii_whitespace())
        .map_or(start, |last| last + 1);
    start..end
}

// Buffer length is capped at `u32::MAX` before any span is built.
fn span(range: Range<usize>) -> Span {
    Span {
        offset: range.start as u32,
        length: range.len() as u32,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const EXAMPLE: &str = "[Greetings|5]\nHello\nBonjour\n[Numbers|5]\nOne\nTwo\n";

    fn parse(text: &str) -> Result<Session, ParseError> {
        parse_bytes(text.as_bytes().to_vec(), &Limits::default())
    }

    fn parse_err(text: &str) -> (Option<usize>, Option<LineError>) {
        let err = parse(text).expect_err("expected parse failure");
        (err.line(), err.line_error())
    }

    #[test]
    fn parses_two_groups_with_contiguous_items() {
        let session = parse(EXAMPLE).expect("parse");
        assert_eq!(session.group_count(), 2);
        assert_eq!(session.item_count(), 4);

        let first = session.group(0);
        assert_eq!((first.item_start, first.item_count), (0, 2));
        assert_eq!(session.group_name(0), b"Greetings");
        assert_eq!(first.seconds, 5);

        let second = session.group(1);
        assert_eq!((second.item_start, second.item_count), (2, 2));
        assert_eq!(session.group_name(1), b"Numbers");

        let texts: Vec<&[u8]> = (0..4).map(|i| session.item_text(i)).collect();
        assert_eq!(texts, vec![&b"Hello"[..], b"Bonjour", b"One", b"Two"]);
        assert!(validate_invariants(&session).is_empty());
    }

    #[test]
    fn items_reference_original_lines_verbatim() {
        let source = "[ Mixed | 10 ]\r\n  indented item  \r\nplain\r\n\ttab\tseparated\n";
        let session = parse(source).expect("parse");
        let lines: Vec<&str> = source
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();

        for item in session.items() {
            let text = std::str::from_utf8(session.text(*item)).expect("utf8");
            assert!(item.length > 0);
            assert!(lines.contains(&text), "item {text:?} is not a source line");
        }
        assert_eq!(session.item_text(0), b"  indented item  ");
        assert_eq!(session.item_text(2), b"\ttab\tseparated");
    }

    #[test]
    fn header_name_and_seconds_are_trimmed() {
        let session = parse("   [   Capitals of Europe  |  120 ]   \nParis\n").expect("parse");
        assert_eq!(session.group_name(0), b"Capitals of Europe");
        assert_eq!(session.group(0).seconds, 120);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let source = "# deck\n\n[A|1]\n   # not an item\n\nx\n   \n";
        let session = parse(source).expect("parse");
        assert_eq!(session.item_count(), 1);
        assert_eq!(session.item_text(0), b"x");
    }

    #[test]
    fn accepts_seconds_bounds() {
        assert!(parse("[A|1]\nx\n").is_ok());
        assert!(parse("[A|86400]\nx\n").is_ok());
    }

    #[test]
    fn header_without_separator_is_malformed() {
        assert_eq!(parse_err("[Bad]\n"), (Some(1), Some(LineError::MalformedHeader)));
    }

    #[test]
    fn malformed_header_variants() {
        for header in ["[A|5", "[|5]", "[  | 5]", "[A|]", "[A| ]", "[A|5|6]", "[]", "[A|5] x"] {
            let source = format!("{header}\nitem\n");
            assert_eq!(
                parse_err(&source),
                (Some(1), Some(LineError::MalformedHeader)),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn invalid_seconds_variants() {
        for seconds in ["0", "86401", "5x", "-1", "+5", "1 0", "99999999999"] {
            let source = format!("# c\n[A|{seconds}]\nitem\n");
            assert_eq!(
                parse_err(&source),
                (Some(2), Some(LineError::InvalidSeconds)),
                "seconds {seconds:?}"
            );
        }
    }

    #[test]
    fn item_before_header_fails() {
        assert_eq!(
            parse_err("\norphan\n[A|1]\nx\n"),
            (Some(2), Some(LineError::ItemBeforeHeader))
        );
    }

    #[test]
    fn empty_group_fails_at_next_header() {
        assert_eq!(
            parse_err("[A|1]\n# nothing\n[B|1]\nx\n"),
            (Some(3), Some(LineError::EmptyGroup))
        );
    }

    #[test]
    fn empty_last_group_fails_at_eof_line() {
        assert_eq!(
            parse_err("[A|1]\nx\n[B|1]"),
            (Some(3), Some(LineError::EmptyLastGroup))
        );
        // The segment after a trailing newline is the EOF line.
        assert_eq!(
            parse_err("[A|1]\nx\n[B|1]\n"),
            (Some(4), Some(LineError::EmptyLastGroup))
        );
    }

    #[test]
    fn file_without_groups_fails() {
        let err = parse("# only comments\n\n").expect_err("no groups");
        assert!(matches!(err, ParseError::NoGroups));
        assert_eq!(err.line(), None);
    }

    #[test]
    fn line_length_is_bounded() {
        let limits = Limits {
            max_line_len: 8,
            ..Limits::default()
        };
        let err = parse_bytes(b"[A|1]\r\n12345678\r\n123456789\n".to_vec(), &limits)
            .expect_err("long line");
        assert_eq!(err.line(), Some(3));
        assert_eq!(err.line_error(), Some(LineError::LineTooLong));
    }

    #[test]
    fn group_and_item_capacity_are_enforced() {
        let limits = Limits {
            max_groups: 1,
            ..Limits::default()
        };
        let err = parse_bytes(b"[A|1]\nx\n[B|1]\ny\n".to_vec(), &limits).expect_err("groups");
        assert_eq!(err.to_string(), "line 3: too many groups");

        let limits = Limits {
            max_items: 2,
            ..Limits::default()
        };
        let err = parse_bytes(b"[A|1]\nx\ny\nz\n".to_vec(), &limits).expect_err("items");
        assert_eq!(err.to_string(), "line 4: too many items");
    }

    #[test]
    fn parse_file_rejects_oversized_files() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"[A|1]\nabcdefghij\n").expect("write");
        let limits = Limits {
            max_file_bytes: 10,
            ..Limits::default()
        };

        let err = parse_file(file.path(), &limits).expect_err("too large");
        assert!(matches!(err, ParseError::FileTooLarge { max: 10 }));

        let session = parse_file(file.path(), &Limits::default()).expect("fits");
        assert_eq!(session.buffer().len(), 17);
    }

    #[test]
    fn parse_file_reports_missing_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = parse_file(&temp.path().join("missing.txt"), &Limits::default())
            .expect_err("missing");
        assert!(matches!(err, ParseError::Open { .. }));
        assert!(err.to_string().starts_with("failed to open"));
    }
}
