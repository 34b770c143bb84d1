//! Terminal rendering of unified diff lines

use owo_colors::OwoColorize;

/// Colour a single unified diff line by its prefix
pub fn colorize_line(line: &str) -> String {
    if line.starts_with("---") || line.starts_with("+++") {
        line.bold().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else {
        line.dimmed().to_string()
    }
}

/// Render diff lines with colours, indenting everything below the header
pub fn render_unified_diff(lines: &[String], color: bool) -> String {
    let mut output = String::new();
    for line in lines {
        let is_header = line.starts_with("---") || line.starts_with("+++");
        if !is_header {
            output.push_str("    ");
        }
        if color {
            output.push_str(&colorize_line(line));
        } else {
            output.push_str(line);
        }
        output.push('\n');
    }
    output
}

/// Count of added and removed lines, ignoring the file headers
pub fn diff_stats(lines: &[String]) -> (usize, usize) {
    lines
        .iter()
        .filter(|l| !l.starts_with("---") && !l.starts_with("+++"))
        .fold((0, 0), |(added, removed), line| {
            if line.starts_with('+') {
                (added + 1, removed)
            } else if line.starts_with('-') {
                (added, removed + 1)
            } else {
                (added, removed)
            }
        })
}
