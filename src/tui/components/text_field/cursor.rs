//! Cursor position and vertical scroll for a `TextField`.
//!
//! The text itself is owned by the field; every method takes `buffer`
//! explicitly.

use super::text_wrap::{BORDER_OFFSET, inner_width, wrap_line_count, wrap_options};
use ratatui::layout::Rect;

pub(super) struct CursorState {
    /// Byte offset in the buffer (0..=buffer.len())
    pub pos: usize,
    /// First visible wrapped line
    pub scroll_offset: u16,
    /// Width of the last render, used for Up/Down between renders
    pub last_content_width: u16,
}

impl CursorState {
    const DEFAULT_WIDTH: u16 = 60;

    pub fn at(pos: usize) -> Self {
        Self {
            pos,
            scroll_offset: 0,
            last_content_width: Self::DEFAULT_WIDTH,
        }
    }

    /// Moves one wrapped line up (`-1`) or down (`1`), keeping the column
    /// when the target line is long enough. Returns `false` at the edges.
    pub fn move_vertically(&mut self, buffer: &str, direction: i16) -> bool {
        let width = inner_width(self.last_content_width);
        if width == 0 || buffer.is_empty() {
            return false;
        }
        let lines = textwrap::wrap(buffer, wrap_options(width));
        if lines.is_empty() {
            return false;
        }

        // Byte length of a wrapped line plus the newline that ended it, if any
        let span = |line: &str, offset: usize| -> usize {
            let ends_with_newline = offset + line.len() < buffer.len()
                && buffer.as_bytes()[offset + line.len()] == b'\n';
            line.len() + usize::from(ends_with_newline)
        };

        let mut start = 0;
        let mut line_idx = 0;
        let mut column = 0;
        for (idx, line) in lines.iter().enumerate() {
            if start + line.len() >= self.pos {
                line_idx = idx;
                column = self.pos - start;
                break;
            }
            start += span(line, start);
        }

        let target = match direction {
            d if d < 0 && line_idx > 0 => line_idx - 1,
            d if d > 0 && line_idx + 1 < lines.len() => line_idx + 1,
            _ => return false,
        };

        let mut target_start = 0;
        for line in lines.iter().take(target) {
            target_start += span(line, target_start);
        }
        let mut pos = target_start + column.min(lines[target].len());
        while !buffer.is_char_boundary(pos) {
            pos -= 1;
        }
        self.pos = pos;
        true
    }

    /// Wrapped line (0-based) holding the cursor.
    fn line(&self, buffer: &str, width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        let before = &buffer[..self.pos];
        let lines = textwrap::wrap(before, wrap_options(width));
        let mut line = lines.len().saturating_sub(1) as u16;
        if before.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
            line += 1;
        }
        line
    }

    /// Keeps the cursor inside a `visible`-line viewport.
    pub fn update_scroll_offset(&mut self, buffer: &str, content_width: u16, visible: u16) {
        let width = inner_width(content_width);
        if wrap_line_count(buffer, width) <= visible {
            self.scroll_offset = 0;
            return;
        }
        let line = self.line(buffer, width);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + visible {
            self.scroll_offset = line + 1 - visible;
        }
    }

    /// Screen `(column, row)` of the cursor inside the bordered `area`.
    pub fn screen_pos(&self, buffer: &str, area: Rect) -> (u16, u16) {
        let width = inner_width(area.width);
        if width == 0 {
            return (area.x + BORDER_OFFSET, area.y + BORDER_OFFSET);
        }
        let before = &buffer[..self.pos];
        let line = self.line(buffer, width);

        // Column: chars since the last wrap point of the current logical line.
        // textwrap trims trailing spaces, so count from the source text.
        let logical = &before[before.rfind('\n').map(|i| i + 1).unwrap_or(0)..];
        let segments = textwrap::wrap(logical, wrap_options(width));
        let consumed: usize = segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .map(|s| s.chars().count())
            .sum();
        let column = logical.chars().count().saturating_sub(consumed) as u16;

        (
            area.x + BORDER_OFFSET + column.min(width),
            area.y + BORDER_OFFSET + line.saturating_sub(self.scroll_offset),
        )
    }
}
