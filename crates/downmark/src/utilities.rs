//! Utility functions for Markdown text.

/// Escape markdown special characters
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }

    result
}

/// Escape a marker that would open a block construct at the start of a line.
///
/// `text` must already be passed through [`escape_markdown`] and have no
/// leading spaces.
pub fn escape_line_start(text: &str) -> String {
    let mut chars = text.chars();
    let first = chars.next();
    let second = chars.next();
    let ends_marker = |c: Option<char>| matches!(c, None | Some(' ' | '\t' | '\n'));

    match first {
        Some('#' | '>') => format!("\\{text}"),
        Some('-' | '+') if ends_marker(second) || second == Some('-') => format!("\\{text}"),
        Some('~') if text.starts_with("~~~") => format!("\\{text}"),
        Some('0'..='9') => {
            let digits = text.bytes().take_while(u8::is_ascii_digit).count();
            let rest = &text[digits..];
            let mut after = rest.chars();
            match after.next() {
                Some('.' | ')') if digits <= 9 && ends_marker(after.next()) => {
                    format!("{}\\{rest}", &text[..digits])
                }
                _ => text.to_string(),
            }
        }
        _ => text.to_string(),
    }
}

/// Escape a string placed inside a double-quoted link title
pub fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a string placed inside a double-quoted HTML attribute
pub fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Wrap a link destination in angle brackets when it would end the link early
pub fn link_destination(url: &str) -> String {
    if url.contains([' ', '(', ')']) {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

/// Length of the longest run of `c` in `text`
pub fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Shortest run of backticks that does not occur in `text` as a whole run
pub fn code_span_delimiter(text: &str) -> String {
    let mut runs: Vec<usize> = Vec::new();
    let mut current = 0;
    for ch in text.chars().chain(std::iter::once('\0')) {
        if ch == '`' {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    let width = (1..).find(|n| !runs.contains(n)).unwrap_or(1);
    "`".repeat(width)
}

/// Prefix every non-empty line after the first with `indent`
pub fn indent_continuation(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(indent);
            }
        }
        out.push_str(line);
    }
    out
}

/// Join the lines of `text` into one line
pub fn flatten_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| line.trim_matches(' '))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("*test*"), "\\*test\\*");
        assert_eq!(escape_markdown("_test_"), "\\_test\\_");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("a\\b `c`"), "a\\\\b \\`c\\`");
        assert_eq!(escape_markdown("# 1. normal - text"), "# 1. normal - text");
        assert_eq!(escape_markdown("<div>"), "\\<div>");
    }

    #[test]
    fn test_escape_line_start() {
        assert_eq!(escape_line_start("# title"), "\\# title");
        assert_eq!(escape_line_start("> quote"), "\\> quote");
        assert_eq!(escape_line_start("- item"), "\\- item");
        assert_eq!(escape_line_start("+"), "\\+");
        assert_eq!(escape_line_start("---"), "\\---");
        assert_eq!(escape_line_start("~~~ fence"), "\\~~~ fence");
        assert_eq!(escape_line_start("1. first"), "1\\. first");
        assert_eq!(escape_line_start("42) answer"), "42\\) answer");
        assert_eq!(escape_line_start("2024.01.02"), "2024.01.02");
        assert_eq!(escape_line_start("1234567890. long"), "1234567890. long");
        assert_eq!(escape_line_start("-1 degrees"), "-1 degrees");
        assert_eq!(escape_line_start("plain"), "plain");
    }

    #[test]
    fn test_code_span_delimiter() {
        assert_eq!(code_span_delimiter("plain"), "`");
        assert_eq!(code_span_delimiter("a ` b"), "``");
        assert_eq!(code_span_delimiter("a `` b"), "`");
        assert_eq!(code_span_delimiter("` and ``"), "```");
    }

    #[test]
    fn test_longest_run() {
        assert_eq!(longest_run("a ``` b `", '`'), 3);
        assert_eq!(longest_run("none", '`'), 0);
    }

    #[test]
    fn test_indent_continuation() {
        assert_eq!(indent_continuation("a\nb\n\nc", "  "), "a\n  b\n\n  c");
    }

    #[test]
    fn test_flatten_lines() {
        assert_eq!(flatten_lines("a  \nb\n\n c"), "a b c");
    }

    #[test]
    fn test_link_destination() {
        assert_eq!(link_destination("https://x.test/a"), "https://x.test/a");
        assert_eq!(link_destination("a b.html"), "<a b.html>");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute(r#"a"b&c"#), "a&quot;b&amp;c");
    }
}
