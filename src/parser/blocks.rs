use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every run of whitespace (newlines included) to one space and trim.
pub fn normalize_whitespace(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

/// Split a department's expanded text into one raw block per course.
///
/// Courses are separated by blank lines. Lines inside a course are joined and
/// whitespace-normalized; blocks that normalize to nothing are dropped.
pub fn split_course_blocks(expanded: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in expanded.lines() {
        let line = line.trim();
        if line.is_empty() {
            flush(&mut current, &mut blocks);
            continue;
        }
        current.push(line);
    }
    flush(&mut current, &mut blocks);

    blocks
}

fn flush(current: &mut Vec<&str>, blocks: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let block = normalize_whitespace(&current.join(" "));
    current.clear();
    if !block.is_empty() {
        blocks.push(block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace() {
        assert_eq!(
            normalize_whitespace("  251   Art\tHistory\n\n 5.0  Credits "),
            "251 Art History 5.0 Credits"
        );
    }

    #[test]
    fn empty_text_has_no_blocks() {
        assert!(split_course_blocks("").is_empty());
        assert!(split_course_blocks("\n  \n\t\n").is_empty());
    }

    #[test]
    fn splits_on_blank_lines() {
        let text = "101 Drawing I\n5.0 Credits\n\n\n102 Drawing II 5.0 Credits\n   \n103 Painting 3.0 Credits";
        let blocks = split_course_blocks(text);
        assert_eq!(
            blocks,
            [
                "101 Drawing I 5.0 Credits",
                "102 Drawing II 5.0 Credits",
                "103 Painting 3.0 Credits",
            ]
        );
    }

    #[test]
    fn windows_line_endings() {
        let blocks = split_course_blocks("101 A 1.0 Credits\r\n\r\n102 B 2.0 Credits\r\n");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1], "102 B 2.0 Credits");
    }
}
