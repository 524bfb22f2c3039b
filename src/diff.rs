//! Positional line comparison between two versions of a secret value.
//!
//! Lines are aligned strictly by index: line `i` of the old text is compared
//! with line `i` of the new text. There is no longest-common-subsequence
//! alignment and no move detection, so inserting or deleting a line before the
//! end of the value marks every following line as changed. Secret values are
//! short and hand-edited; this output is what the review screen shows and must
//! not be "improved" into a minimal edit script.
//!
//! An old line that is empty and replaced by non-empty content is classified
//! as [`Kind::Added`] on the right, while a non-empty old line that differs is
//! [`Kind::Changed`]. That asymmetry is kept as-is.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Unchanged,
    Removed,
    Added,
    Changed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based source line; `None` for a placeholder with no counterpart on this side.
    pub number: Option<usize>,
    pub text: String,
    pub kind: Kind,
}

impl Line {
    fn numbered(index: usize, text: &str, kind: Kind) -> Self {
        Self {
            number: Some(index + 1),
            text: text.to_string(),
            kind,
        }
    }

    fn placeholder() -> Self {
        Self {
            number: None,
            text: String::new(),
            kind: Kind::Unchanged,
        }
    }
}

/// Compare `old` and `new` line by line. Returns the left (old) and right (new)
/// columns, which always have the same length.
pub fn compare(old: &str, new: &str) -> (Vec<Line>, Vec<Line>) {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();
    let n = old_lines.len().max(new_lines.len());

    let mut left = Vec::with_capacity(n);
    let mut right = Vec::with_capacity(n);

    for i in 0..n {
        match (old_lines.get(i).copied(), new_lines.get(i).copied()) {
            (Some(o), Some(nw)) if o == nw => {
                left.push(Line::numbered(i, o, Kind::Unchanged));
                right.push(Line::numbered(i, nw, Kind::Unchanged));
            }
            (Some(o), Some(nw)) => {
                left.push(Line::numbered(i, o, Kind::Removed));
                let kind = if o.is_empty() { Kind::Added } else { Kind::Changed };
                right.push(Line::numbered(i, nw, kind));
            }
            (None, Some(nw)) => {
                left.push(Line::placeholder());
                right.push(Line::numbered(i, nw, Kind::Added));
            }
            (Some(o), None) => {
                left.push(Line::numbered(i, o, Kind::Removed));
                right.push(Line::placeholder());
            }
            (None, None) => unreachable!("index is below the longer side's length"),
        }
    }

    (left, right)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub removed: usize,
    pub added: usize,
    pub changed: usize,
}

impl Summary {
    pub fn of(left: &[Line], right: &[Line]) -> Self {
        let mut summary = Self {
            removed: left.iter().filter(|l| l.kind == Kind::Removed).count(),
            ..Self::default()
        };
        for line in right {
            match line.kind {
                Kind::Added => summary.added += 1,
                Kind::Changed => summary.changed += 1,
                _ => {}
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(lines: &[Line]) -> Vec<(Option<usize>, &str, Kind)> {
        lines
            .iter()
            .map(|l| (l.number, l.text.as_str(), l.kind))
            .collect()
    }

    #[test]
    fn identical_inputs_are_unchanged_everywhere() {
        let text = "alpha\nbeta\ngamma";
        let (left, right) = compare(text, text);

        assert_eq!(left.len(), right.len());
        assert_eq!(left.len(), 3);
        for (i, (l, r)) in left.iter().zip(&right).enumerate() {
            assert_eq!(l.kind, Kind::Unchanged);
            assert_eq!(r.kind, Kind::Unchanged);
            assert_eq!(l.number, Some(i + 1));
            assert_eq!(r.number, Some(i + 1));
        }
        assert_eq!(Summary::of(&left, &right), Summary::default());
    }

    #[test]
    fn single_changed_line() {
        let (left, right) = compare("secret1\n", "secret2\n");
        assert_eq!(
            shape(&left),
            vec![(Some(1), "secret1", Kind::Removed), (Some(2), "", Kind::Unchanged)]
        );
        assert_eq!(
            shape(&right),
            vec![(Some(1), "secret2", Kind::Changed), (Some(2), "", Kind::Unchanged)]
        );
    }

    #[test]
    fn insertion_at_front_cascades() {
        let (left, right) = compare("a\nb", "x\na\nb");
        assert_eq!(
            shape(&left),
            vec![
                (Some(1), "a", Kind::Removed),
                (Some(2), "b", Kind::Removed),
                (None, "", Kind::Unchanged),
            ]
        );
        assert_eq!(
            shape(&right),
            vec![
                (Some(1), "x", Kind::Changed),
                (Some(2), "a", Kind::Changed),
                (Some(3), "b", Kind::Added),
            ]
        );
    }

    #[test]
    fn removed_tail_leaves_placeholders_on_the_right() {
        let (left, right) = compare("a\nb\nc", "a");
        assert_eq!(
            shape(&left),
            vec![
                (Some(1), "a", Kind::Unchanged),
                (Some(2), "b", Kind::Removed),
                (Some(3), "c", Kind::Removed),
            ]
        );
        assert_eq!(right[1].number, None);
        assert_eq!(right[2].number, None);
        assert_eq!(
            Summary::of(&left, &right),
            Summary {
                removed: 2,
                added: 0,
                changed: 0
            }
        );
    }

    #[test]
    fn empty_old_line_becomes_added_not_changed() {
        let (left, right) = compare("a\n\nc", "a\nb\nc");
        assert_eq!(left[1].kind, Kind::Removed);
        assert_eq!(right[1].kind, Kind::Added);
        assert_eq!(right[1].text, "b");
    }

    #[test]
    fn emptied_line_is_changed_on_the_right() {
        let (_, right) = compare("a\nb", "a\n");
        assert_eq!(shape(&right)[1], (Some(2), "", Kind::Changed));
    }
}
