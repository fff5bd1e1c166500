//! Wrapping and boundary helpers shared by `TextField` and its cursor.

/// Borders (2) plus the scrollbar column (1)
pub(super) const HORIZONTAL_OVERHEAD: u16 = 3;
/// Top + bottom borders
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Offset from area edge to content (border width)
pub(super) const BORDER_OFFSET: u16 = 1;

pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Returns 0 if the area is too narrow.
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Wrapped line count, counting a trailing newline as an empty last line
/// (textwrap drops it).
pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }
    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }
    count
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Readline `backward-word`: skip separators, then the word before them.
pub(super) fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let mut chars = text[..pos].char_indices().rev().peekable();
    while chars.peek().is_some_and(|&(_, c)| !is_word_char(c)) {
        chars.next();
    }
    let mut boundary = 0;
    while let Some(&(i, c)) = chars.peek() {
        if !is_word_char(c) {
            boundary = i + c.len_utf8();
            break;
        }
        boundary = i;
        chars.next();
    }
    boundary
}

/// Readline `forward-word`: skip separators, then the next word.
pub(super) fn next_word_boundary(text: &str, pos: usize) -> usize {
    let mut chars = text[pos..].char_indices().peekable();
    while chars.peek().is_some_and(|&(_, c)| !is_word_char(c)) {
        chars.next();
    }
    while chars.peek().is_some_and(|&(_, c)| is_word_char(c)) {
        chars.next();
    }
    match chars.peek() {
        Some(&(i, _)) => pos + i,
        None => text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_line_count_basics() {
        assert_eq!(wrap_line_count("", 80), 1);
        assert_eq!(wrap_line_count("Rabat", 0), 1);
        assert_eq!(wrap_line_count("aaaaaaaaaa", 5), 2);
        assert_eq!(wrap_line_count("a\nb\nc", 80), 3);
    }

    #[test]
    fn wrap_line_count_trailing_newline_adds_line() {
        assert_eq!(wrap_line_count("Rabat\n", 80), 2);
        assert_eq!(wrap_line_count("aaaaaaaaaa\n", 5), 3);
    }

    #[test]
    fn char_boundaries_respect_accents() {
        let s = "Tanger Méditerranée";
        let e = s.find('é').unwrap_or_default();
        assert_eq!(next_char_boundary(s, e), e + 2);
        assert_eq!(prev_char_boundary(s, e + 2), e);
        assert_eq!(prev_char_boundary(s, 1), 0);
        assert_eq!(next_char_boundary(s, s.len() - 2), s.len());
    }

    #[test]
    fn word_jumps() {
        let s = "appel d'offres 2024";
        assert_eq!(prev_word_boundary(s, s.len()), 15);
        assert_eq!(prev_word_boundary(s, 15), 8);
        assert_eq!(next_word_boundary(s, 0), 5);
        assert_eq!(next_word_boundary(s, 5), 7);
        assert_eq!(next_word_boundary(s, s.len()), s.len());
    }

    #[test]
    fn word_jumps_with_accents() {
        let s = "réseau routier";
        assert_eq!(next_word_boundary(s, 0), "réseau".len());
        assert_eq!(prev_word_boundary(s, s.len()), "réseau ".len());
    }
}
