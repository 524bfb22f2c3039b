//! Word wrapping and line numbering shared by the browse and review screens.

use unicode_width::UnicodeWidthChar;

use crate::diff::Kind;

/// Used when the terminal reports no usable width (e.g. mid-resize).
pub const FALLBACK_WIDTH: usize = 40;
/// How far back from the wrap column a space is searched for.
const BREAK_LOOKBACK: usize = 20;
pub const GUTTER_WIDTH: usize = 4;

/// Greedy word wrap measured in terminal columns.
///
/// Lines that fit are returned unchanged. Otherwise each segment breaks at a
/// space within the last [`BREAK_LOOKBACK`] columns of the window, or exactly
/// at `width` when there is none. Leading spaces of continuations are dropped.
pub fn wrap(line: &str, width: usize) -> Vec<String> {
    let width = if width == 0 { FALLBACK_WIDTH } else { width };

    let mut out = Vec::new();
    let mut remaining = line;
    loop {
        let Some(cut) = window_end(remaining, width) else {
            out.push(remaining.to_string());
            return out;
        };

        // Candidate break columns: the cut itself, then up to BREAK_LOOKBACK - 1 before it.
        let brk = std::iter::once(cut)
            .chain(remaining[..cut].char_indices().rev().map(|(i, _)| i))
            .take(BREAK_LOOKBACK)
            .filter(|&i| i > 0)
            .find(|&i| remaining[i..].starts_with(' '))
            .unwrap_or(cut);

        out.push(remaining[..brk].to_string());
        remaining = remaining[brk..].trim_start_matches(' ');
        if remaining.is_empty() {
            return out;
        }
    }
}

/// Byte offset where a line of `width` columns ends, or `None` if all of `s` fits.
fn window_end(s: &str, width: usize) -> Option<usize> {
    let mut used = 0;
    for (i, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            // Always make progress, even with a character wider than the window.
            return Some(if i == 0 { c.len_utf8() } else { i });
        }
        used += w;
    }
    None
}

/// One visual row of a rendered pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Set on the first segment of a source line only.
    pub number: Option<usize>,
    pub text: String,
    pub kind: Kind,
    pub continuation: bool,
}

impl Row {
    pub fn gutter(&self) -> String {
        match self.number {
            Some(n) if !self.continuation => format!("{n:>width$}", width = GUTTER_WIDTH),
            _ => " ".repeat(GUTTER_WIDTH),
        }
    }
}

/// Wrap a sequence of numbered lines into visual rows.
///
/// Lines without a number are placeholders and produce a single empty row.
pub fn number_rows<'a>(
    lines: impl IntoIterator<Item = (Option<usize>, &'a str, Kind)>,
    width: usize,
) -> Vec<Row> {
    let mut rows = Vec::new();
    for (number, text, kind) in lines {
        if number.is_none() {
            rows.push(Row {
                number: None,
                text: String::new(),
                kind,
                continuation: false,
            });
            continue;
        }
        for (i, segment) in wrap(text, width).into_iter().enumerate() {
            rows.push(Row {
                number,
                text: segment,
                kind,
                continuation: i > 0,
            });
        }
    }
    rows
}

/// Number every line of a plain text value.
pub fn number_text(text: &str, width: usize) -> Vec<Row> {
    number_rows(
        text.split('\n')
            .enumerate()
            .map(|(i, line)| (Some(i + 1), line, Kind::Unchanged)),
        width,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_line_is_returned_as_is() {
        assert_eq!(wrap("hello world", 40), vec!["hello world"]);
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("exactly10!", 10), vec!["exactly10!"]);
    }

    #[test]
    fn breaks_at_last_space_within_window() {
        assert_eq!(
            wrap("the quick brown fox jumps", 12),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn hard_breaks_without_spaces() {
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn space_beyond_lookback_is_ignored() {
        let line = format!("ab {}", "x".repeat(40));
        let wrapped = wrap(&line, 30);
        assert_eq!(wrapped[0].len(), 30);
        assert_eq!(wrapped[0], format!("ab {}", "x".repeat(27)));
    }

    #[test]
    fn zero_width_uses_fallback() {
        let line = "y".repeat(FALLBACK_WIDTH + 5);
        let wrapped = wrap(&line, 0);
        assert_eq!(wrapped.len(), 2);
        assert_eq!(wrapped[0].len(), FALLBACK_WIDTH);
    }

    #[test]
    fn continuation_leading_spaces_are_trimmed() {
        assert_eq!(wrap("aaaa bbbb", 4), vec!["aaaa", "bbbb"]);
        assert_eq!(wrap("aaaa   bbbb", 5), vec!["aaaa ", "bbbb"]);
    }

    #[test]
    fn never_splits_inside_a_character() {
        let wrapped = wrap("ééééé", 2);
        assert_eq!(wrapped, vec!["éé", "éé", "é"]);
        let wide = wrap("日本語", 1);
        assert_eq!(wide, vec!["日", "本", "語"]);
    }

    #[test]
    fn rows_number_first_segment_only() {
        let rows = number_text("one two three\nfour", 8);
        let shape: Vec<(String, &str)> =
            rows.iter().map(|r| (r.gutter(), r.text.as_str())).collect();
        assert_eq!(
            shape,
            vec![
                ("   1".to_string(), "one two"),
                ("    ".to_string(), "three"),
                ("   2".to_string(), "four"),
            ]
        );
    }

    #[test]
    fn placeholders_yield_one_blank_row() {
        let rows = number_rows(
            vec![(None, "ignored", Kind::Unchanged), (Some(2), "b", Kind::Added)],
            10,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, None);
        assert_eq!(rows[0].text, "");
        assert_eq!(rows[1].gutter(), "   2");
    }
}
