//! Arena model for a parsed session file.
//!
//! All text lives in one owned byte buffer. Groups and items never copy text;
//! they hold `(offset, length)` spans into that buffer, so the whole session is
//! three flat vectors with no cross references.

use std::ops::Range;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_FILE_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MAX_LINE_LEN: usize = 4096;
pub const DEFAULT_MAX_GROUPS: usize = 256;
pub const DEFAULT_MAX_ITEMS: usize = 8192;
pub const DEFAULT_MAX_WAIT_LOOPS: usize = 100_000;
pub const DEFAULT_MAX_PROMPTS: usize = 1_000_000;

/// Smallest and largest accepted group duration, in seconds.
pub const MIN_GROUP_SECONDS: u32 = 1;
pub const MAX_GROUP_SECONDS: u32 = 86_400;

/// Capacity bounds for parsing and for the interactive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest session file accepted, in bytes.
    pub max_file_bytes: usize,
    /// Longest line accepted (after stripping a trailing `\r`).
    pub max_line_len: usize,
    pub max_groups: usize,
    /// Item capacity across all groups.
    pub max_items: usize,
    /// Reads allowed between two advances before the loop is declared stalled.
    pub max_wait_loops: usize,
    /// Advances allowed per run; reaching it ends the run normally.
    pub max_prompts: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_groups: DEFAULT_MAX_GROUPS,
            max_items: DEFAULT_MAX_ITEMS,
            max_wait_loops: DEFAULT_MAX_WAIT_LOOPS,
            max_prompts: DEFAULT_MAX_PROMPTS,
        }
    }
}

/// A byte range inside the session buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: u32,
    pub length: u32,
}

impl Span {
    pub fn range(self) -> Range<usize> {
        let start = self.offset as usize;
        start..start + self.length as usize
    }
}

/// One prompt line.
pub type Item = Span;

/// A topic group: a name, a display deadline and a contiguous run of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Group {
    pub name: Span,
    pub seconds: u32,
    pub item_start: u32,
    pub item_count: u32,
}

impl Group {
    /// Absolute indices of this group's items in the flat item sequence.
    pub fn items(&self) -> Range<usize> {
        let start = self.item_start as usize;
        start..start + self.item_count as usize
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.seconds) * 1000
    }
}

/// A parsed session: the source buffer plus the groups and items that point
/// into it. Immutable once the parser hands it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    buffer: Vec<u8>,
    groups: Vec<Group>,
    items: Vec<Item>,
}

impl Session {
    pub(crate) fn with_buffer(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            groups: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Open a new, empty group whose items start at the current item count.
    pub(crate) fn push_group(&mut self, name: Span, seconds: u32) {
        self.groups.push(Group {
            name,
            seconds,
            item_start: self.items.len() as u32,
            item_count: 0,
        });
    }

    /// Append an item to the flat sequence and to the open group.
    pub(crate) fn push_item(&mut self, item: Item) {
        self.items.push(item);
        if let Some(group) = self.groups.last_mut() {
            group.item_count += 1;
        }
    }

    pub(crate) fn last_group(&self) -> Option<&Group> {
        self.groups.last()
    }

    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn group(&self, index: usize) -> &Group {
        &self.groups[index]
    }

    pub fn text(&self, span: Span) -> &[u8] {
        &self.buffer[span.range()]
    }

    pub fn item_text(&self, index: usize) -> &[u8] {
        self.text(self.items[index])
    }

    pub fn group_name(&self, index: usize) -> &[u8] {
        self.text(self.groups[index].name)
    }

    /// Largest `item_count` over all groups.
    pub fn max_group_len(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.item_count as usize)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(offset: u32, length: u32) -> Span {
        Span { offset, length }
    }

    #[test]
    fn push_item_extends_open_group() {
        let mut session = Session::with_buffer(b"[A|1]\nx\ny\n".to_vec());
        session.push_group(span(1, 1), 1);
        session.push_item(span(6, 1));
        session.push_item(span(8, 1));

        assert_eq!(session.group_count(), 1);
        assert_eq!(session.item_count(), 2);
        assert_eq!(session.group(0).items(), 0..2);
        assert_eq!(session.group_name(0), b"A");
        assert_eq!(session.item_text(1), b"y");
    }

    #[test]
    fn second_group_starts_after_existing_items() {
        let mut session = Session::with_buffer(b"abcdef".to_vec());
        session.push_group(span(0, 1), 5);
        session.push_item(span(1, 1));
        session.push_group(span(2, 1), 7);
        session.push_item(span(3, 1));
        session.push_item(span(4, 2));

        let second = session.group(1);
        assert_eq!(second.item_start, 1);
        assert_eq!(second.items(), 1..3);
        assert_eq!(second.duration_ms(), 7000);
        assert_eq!(session.max_group_len(), 2);
    }
}
