//! Line diffs over the chat content of two snapshots
//!
//! Each user/assistant record with string content is projected to one line,
//! `[role]: <preview>`. Records with structured content (tool calls, block
//! lists) and non-chat records do not take part in the comparison.

use crate::checkpoint::short_id;
use bp_core::LogRecord;
use similar::{ChangeTag, TextDiff};

/// Options for projecting and diffing snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    /// Characters of message content kept per line
    pub preview_chars: usize,
    /// Unchanged lines shown around each change
    pub context_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            preview_chars: 200,
            context_lines: 3,
        }
    }
}

/// Diff side label for a checkpoint (`Checkpoint 01HN8XYZ`)
pub fn checkpoint_label(checkpoint_id: &str) -> String {
    format!("Checkpoint {}", short_id(checkpoint_id))
}

/// Project chat records to display lines
pub fn project_messages(records: &[LogRecord], preview_chars: usize) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| {
            let message = record.chat_message()?;
            let text = message.content.as_text()?;
            Some(format!("[{}]: {}", message.role, preview(text, preview_chars)))
        })
        .collect()
}

/// Unified diff of the projected chat content of two record sets
pub fn diff_records(
    old: &[LogRecord],
    new: &[LogRecord],
    old_label: &str,
    new_label: &str,
    options: &DiffOptions,
) -> Vec<String> {
    let old_lines = project_messages(old, options.preview_chars);
    let new_lines = project_messages(new, options.preview_chars);
    unified_diff(&old_lines, &new_lines, old_label, new_label, options.context_lines)
}

/// Unified diff between two line sequences
///
/// Output lines carry no trailing newline: `--- old`, `+++ new`, hunk headers
/// (`@@ -1,3 +1,4 @@`) and ` `/`-`/`+` prefixed lines. Identical inputs give
/// an empty result.
pub fn unified_diff(
    old: &[String],
    new: &[String],
    old_label: &str,
    new_label: &str,
    context_lines: usize,
) -> Vec<String> {
    if old == new {
        return Vec::new();
    }

    let old_refs: Vec<&str> = old.iter().map(String::as_str).collect();
    let new_refs: Vec<&str> = new.iter().map(String::as_str).collect();
    let diff = TextDiff::from_slices(&old_refs, &new_refs);

    let mut output = Vec::new();
    for hunk in diff.unified_diff().context_radius(context_lines).iter_hunks() {
        if output.is_empty() {
            output.push(format!("--- {}", old_label));
            output.push(format!("+++ {}", new_label));
        }
        output.push(hunk.header().to_string());

        for change in hunk.iter_changes() {
            let marker = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            output.push(format!("{}{}", marker, change.value()));
        }
    }

    output
}

fn preview(text: &str, limit: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> LogRecord {
        LogRecord::parse(line).unwrap()
    }

    fn chat(kind: &str, content: &str) -> LogRecord {
        let value = serde_json::json!({
            "type": kind,
            "message": {"role": kind, "content": content},
        });
        record(&value.to_string())
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_project_messages() {
        let records = vec![
            chat("user", "hello"),
            record(r#"{"type": "summary", "summary": "ignored"}"#),
            record(r#"{"type": "assistant", "message": {"role": "assistant", "content": [{"type": "text"}]}}"#),
            chat("assistant", "hi there"),
        ];

        assert_eq!(
            project_messages(&records, 200),
            vec!["[user]: hello", "[assistant]: hi there"]
        );
    }

    #[test]
    fn test_preview_truncates_by_chars() {
        let records = vec![chat("user", "héllo wörld")];
        assert_eq!(project_messages(&records, 5), vec!["[user]: héllo..."]);
        assert_eq!(project_messages(&records, 11), vec!["[user]: héllo wörld"]);
    }

    #[test]
    fn test_identical_inputs_give_empty_diff() {
        let a = lines(&["[user]: a", "[assistant]: b"]);
        assert!(unified_diff(&a, &a, "x", "y", 3).is_empty());
        assert!(unified_diff(&[], &[], "x", "y", 3).is_empty());
    }

    #[test]
    fn test_unified_diff_format() {
        let old = lines(&["[user]: a", "[assistant]: b"]);
        let new = lines(&["[user]: a", "[assistant]: b", "[user]: c"]);

        let diff = unified_diff(&old, &new, "Checkpoint aaaaaaaa", "Checkpoint bbbbbbbb", 3);
        assert_eq!(
            diff,
            vec![
                "--- Checkpoint aaaaaaaa",
                "+++ Checkpoint bbbbbbbb",
                "@@ -1,2 +1,3 @@",
                " [user]: a",
                " [assistant]: b",
                "+[user]: c",
            ]
        );
    }

    #[test]
    fn test_unified_diff_replacement() {
        let old = lines(&["[user]: a"]);
        let new = lines(&["[user]: z"]);

        let diff = unified_diff(&old, &new, "L", "R", 3);
        assert_eq!(diff, vec!["--- L", "+++ R", "@@ -1 +1 @@", "-[user]: a", "+[user]: z"]);
    }

    #[test]
    fn test_non_chat_records_do_not_affect_diff() {
        let old = vec![chat("user", "q"), chat("assistant", "a")];
        let mut new = old.clone();
        new.insert(1, record(r#"{"type": "assistant", "message": {"role": "assistant", "content": [{"type": "tool_use", "name": "Read"}]}}"#));
        new.insert(2, record(r#"{"type": "system", "content": "tool ran"}"#));

        let options = DiffOptions::default();
        assert!(diff_records(&old, &new, "a", "b", &options).is_empty());
    }

    #[test]
    fn test_checkpoint_label() {
        assert_eq!(
            checkpoint_label("01HXKJ7NVQW3Y2YMZK5VFZX3G8"),
            "Checkpoint 01HXKJ7N"
        );
        assert_eq!(checkpoint_label("abc"), "Checkpoint abc");
    }
}
