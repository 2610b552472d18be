//! Text cleanup before narration synthesis.

/// Invisible formatting characters that synthesis engines read as noise.
const INVISIBLE_CHARS: &[char] = &[
    '\u{200b}', // Zero-width space
    '\u{200c}', // Zero-width non-joiner
    '\u{200d}', // Zero-width joiner
    '\u{2060}', // Word joiner
    '\u{feff}', // BOM
    '\u{00ad}', // Soft hyphen
];

/// Clean scene text for narration synthesis.
///
/// This function:
/// - Removes control and invisible formatting characters
/// - Turns any run of spaces, tabs or non-breaking spaces into one space
/// - Keeps line breaks, collapsing blank-line runs to a single blank line
/// - Trims leading and trailing whitespace
pub fn clean_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut pending_newlines = 0usize;

    for c in text.chars() {
        if INVISIBLE_CHARS.contains(&c) {
            continue;
        }
        if c == '\n' {
            pending_newlines += 1;
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if c.is_control() {
            continue;
        }

        if !result.is_empty() {
            match pending_newlines {
                0 if pending_space => result.push(' '),
                0 => {}
                1 => result.push('\n'),
                _ => result.push_str("\n\n"),
            }
        }
        pending_space = false;
        pending_newlines = 0;
        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_spaces() {
        assert_eq!(clean_text("Hello   world\t again"), "Hello world again");
    }

    #[test]
    fn test_non_breaking_space() {
        assert_eq!(clean_text("Hello\u{00a0}world"), "Hello world");
    }

    #[test]
    fn test_removes_invisible_and_control() {
        assert_eq!(clean_text("mo\u{200b}on\u{0007}light\u{feff}"), "moonlight");
    }

    #[test]
    fn test_keeps_single_line_breaks() {
        assert_eq!(clean_text("line one\nline two"), "line one\nline two");
        assert_eq!(clean_text("line one \r\n line two"), "line one\nline two");
    }

    #[test]
    fn test_collapses_blank_lines() {
        assert_eq!(clean_text("Once.\n\n\n\nTwice."), "Once.\n\nTwice.");
    }

    #[test]
    fn test_trims() {
        assert_eq!(clean_text("  \n The end. \n  "), "The end.");
        assert_eq!(clean_text(" \t\n "), "");
    }
}
