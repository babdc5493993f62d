//! Line-level helpers shared by the normalizer and the interpreters.

use regex::Regex;
use std::sync::LazyLock;

/// `… +12 lines (ctrl+r to expand)` style fold markers.
static FOLD_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:…|\.\.\.)\s*\+\d+\s+lines?\b").unwrap());

/// Characters that make up horizontal rules, box-drawing or ASCII.
const RULE_CHARS: &[char] = &['─', '━', '═', '╌', '╍', '-', '=', '_', '~', '▔', '▁'];

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_box_drawing(c: char) -> bool {
    ('\u{2500}'..='\u{257F}').contains(&c)
}

/// A line made only of box-drawing characters (frame tops, bottoms, rules).
pub fn is_box_border_line(line: &str) -> bool {
    let mut saw_box = false;
    for c in line.chars() {
        if is_box_drawing(c) {
            saw_box = true;
        } else if !c.is_whitespace() {
            return false;
        }
    }
    saw_box
}

/// A separator rule: at least four rule characters and nothing else.
pub fn is_rule_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() >= 4
        && trimmed
            .chars()
            .all(|c| RULE_CHARS.contains(&c) || is_box_drawing(c))
}

/// A bare ellipsis or a "N more lines" fold marker.
pub fn is_ellipsis_line(line: &str) -> bool {
    let trimmed = line.trim();
    matches!(trimmed, "…" | "..." | "⋯") || FOLD_MARKER_RE.is_match(trimmed)
}

/// The last `n` non-blank lines of `text`, oldest first.
pub fn tail_lines(text: &str, n: usize) -> Vec<&str> {
    let mut tail: Vec<&str> = text.lines().rev().filter(|l| !is_blank(l)).take(n).collect();
    tail.reverse();
    tail
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_border_lines() {
        assert!(is_box_border_line("╭────╮"));
        assert!(is_box_border_line("  ──── "));
        assert!(!is_box_border_line(""));
        assert!(!is_box_border_line("   "));
        assert!(!is_box_border_line("── title ──"));
    }

    #[test]
    fn rule_lines_need_four_chars() {
        assert!(is_rule_line("----"));
        assert!(is_rule_line("  ━━━━━━ "));
        assert!(is_rule_line("=-=-=-"));
        assert!(!is_rule_line("---"));
        assert!(!is_rule_line("-- x --"));
    }

    #[test]
    fn ellipsis_and_fold_markers() {
        assert!(is_ellipsis_line("  …"));
        assert!(is_ellipsis_line("..."));
        assert!(is_ellipsis_line("… +12 lines (ctrl+r to expand)"));
        assert!(!is_ellipsis_line("… and then it worked"));
    }

    #[test]
    fn tail_skips_blank_lines() {
        let text = "a\n\nb\n  \nc\n";
        assert_eq!(tail_lines(text, 2), vec!["b", "c"]);
        assert_eq!(tail_lines(text, 10), vec!["a", "b", "c"]);
    }
}
