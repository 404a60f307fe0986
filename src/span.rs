//! Byte-offset positions and diagnostic rendering for parse errors.
//!
//! The parser only ever needs to point at *one* byte offset at a time - the
//! character it choked on - so this module works with plain `usize` offsets
//! rather than a dedicated span range type.

/// Render a short excerpt of `input` centered on `pos`, for error messages.
///
/// `context_chars` bounds how far the excerpt reaches in either direction.
/// The excerpt never crosses a line boundary.
pub fn context_snippet(input: &str, pos: usize, context_chars: usize) -> String {
    let line_start = input[..pos.min(input.len())]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let line_end = input[pos.min(input.len())..]
        .find('\n')
        .map(|i| pos + i)
        .unwrap_or(input.len());

    let start = pos.saturating_sub(context_chars).max(line_start);
    let end = (pos + context_chars).min(line_end);
    input[start..end].to_string()
}

/// Translate a byte offset into a 1-based `(line, column)` pair, the way a
/// compiler diagnostic would.
pub fn locate(input: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(input.len());
    let mut line = 1;
    let mut col = 1;
    for c in input[..pos].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_around_middle_of_line() {
        let input = "echo hi | wc -l";
        assert_eq!(context_snippet(input, 8, 3), "i |");
    }

    #[test]
    fn snippet_does_not_cross_newline() {
        let input = "a && b\n| c";
        let pos = input.find('|').unwrap();
        let s = context_snippet(input, pos, 10);
        assert!(!s.contains('\n'));
    }

    #[test]
    fn locate_counts_lines() {
        let input = "a\nbb\nccc";
        assert_eq!(locate(input, 0), (1, 1));
        assert_eq!(locate(input, 2), (2, 1));
        assert_eq!(locate(input, 6), (3, 1));
    }
}
