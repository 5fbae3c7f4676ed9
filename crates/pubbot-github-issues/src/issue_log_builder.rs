//! Byte-capped comment body builder for failed publishing runs.
//!
//! The builder holds a list of text entries that is reshaped step by step
//! (trim, split, filter, tail, join) and then rendered between heading and
//! trailer lines. Rendering always fits within the configured byte budget:
//! the oldest log bytes are dropped first, then headings are cut as a last
//! resort.

use crate::github_transport_helpers::truncate_for_error;

pub const FAILURE_COMMENT_MAX_BYTES: usize = 65_000;
pub const FAILURE_COMMENT_TAIL_LINES: usize = 50;
pub const FAILURE_COMMENT_LINE_MARKER: char = '+';
pub const FAILURE_HEADING_MAX_CHARS: usize = 2_000;
const CODE_FENCE: &str = "```";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuilder {
    max_bytes: usize,
    headings: Vec<String>,
    trailers: Vec<String>,
    entries: Vec<String>,
}

impl LogBuilder {
    pub fn with_max_bytes(max_bytes: usize, raw_logs: &str) -> Self {
        Self {
            max_bytes,
            headings: Vec::new(),
            trailers: Vec::new(),
            entries: vec![raw_logs.to_string()],
        }
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.headings.push(text.into());
        self
    }

    pub fn trailer(mut self, text: impl Into<String>) -> Self {
        self.trailers.push(text.into());
        self
    }

    /// Strips trailing characters contained in `cutset` from every entry.
    pub fn trim_trailing(mut self, cutset: &[char]) -> Self {
        for entry in &mut self.entries {
            let keep = entry.trim_end_matches(cutset).len();
            entry.truncate(keep);
        }
        self
    }

    pub fn split(mut self, separator: &str) -> Self {
        self.entries = self
            .entries
            .iter()
            .flat_map(|entry| entry.split(separator).map(str::to_string))
            .collect();
        self
    }

    pub fn filter<F>(mut self, mut keep: F) -> Self
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|entry| keep(entry.as_str()));
        self
    }

    /// Keeps the last `count` entries, preserving order.
    pub fn tail(mut self, count: usize) -> Self {
        if self.entries.len() > count {
            let excess = self.entries.len() - count;
            self.entries.drain(..excess);
        }
        self
    }

    pub fn join(mut self, separator: &str) -> Self {
        self.entries = vec![self.entries.join(separator)];
        self
    }

    pub fn render(&self) -> String {
        let head: String = self
            .headings
            .iter()
            .map(|heading| format!("{heading}\n"))
            .collect();
        let tail: String = self
            .trailers
            .iter()
            .map(|trailer| format!("\n{trailer}"))
            .collect();
        let body = self.entries.join("\n");

        if tail.len() >= self.max_bytes {
            let whole = format!("{head}{body}{tail}");
            return truncate_to_byte_limit(&whole, self.max_bytes).to_string();
        }

        let head = truncate_to_byte_limit(&head, self.max_bytes - tail.len());
        let body_budget = self.max_bytes - tail.len() - head.len();
        let body = keep_tail_within(&body, body_budget);
        format!("{head}{body}{tail}")
    }
}

/// Renders the issue comment posted after a failed publishing run.
///
/// Only lines starting with `+` survive and at most the last 50 of them are
/// kept. This drops error context that does not carry the marker.
pub fn render_failure_comment(failure: &str, redacted_logs: &str) -> String {
    LogBuilder::with_max_bytes(FAILURE_COMMENT_MAX_BYTES, redacted_logs)
        .heading(format!(
            "The last publishing run failed: {}",
            truncate_for_error(failure, FAILURE_HEADING_MAX_CHARS)
        ))
        .heading(CODE_FENCE)
        .trim_trailing(&['\n'])
        .split("\n")
        .filter(|line| line.starts_with(FAILURE_COMMENT_LINE_MARKER))
        .tail(FAILURE_COMMENT_TAIL_LINES)
        .join("\n")
        .trailer(CODE_FENCE)
        .render()
}

fn truncate_to_byte_limit(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn keep_tail_within(text: &str, budget: usize) -> &str {
    if text.len() <= budget {
        return text;
    }
    let mut start = text.len() - budget;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    let kept = &text[start..];
    if text.as_bytes()[start - 1] == b'\n' {
        return kept;
    }
    // drop the partial leading line when a complete one follows
    match kept.find('\n') {
        Some(index) => &kept[index + 1..],
        None => kept,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        render_failure_comment, LogBuilder, FAILURE_COMMENT_MAX_BYTES, FAILURE_COMMENT_TAIL_LINES,
    };

    #[test]
    fn unit_render_failure_comment_wraps_filtered_lines_in_fence() {
        let logs = "+ git fetch\nnoise\n+ go build ./...\n\n\n";
        let rendered = render_failure_comment("exit status 1", logs);
        assert_eq!(
            rendered,
            "The last publishing run failed: exit status 1\n```\n+ git fetch\n+ go build ./...\n```"
        );
    }

    #[test]
    fn functional_render_failure_comment_keeps_last_fifty_marker_lines_in_order() {
        let logs = (0..120)
            .map(|index| {
                if index % 2 == 0 {
                    format!("+step {index}")
                } else {
                    format!("-skipped {index}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let rendered = render_failure_comment("boom", &logs);
        let kept = rendered
            .lines()
            .filter(|line| line.starts_with('+'))
            .collect::<Vec<_>>();
        assert_eq!(kept.len(), FAILURE_COMMENT_TAIL_LINES);
        assert_eq!(kept.first().copied(), Some("+step 20"));
        assert_eq!(kept.last().copied(), Some("+step 118"));
        assert!(!rendered.contains("-skipped"));
    }

    #[test]
    fn functional_render_failure_comment_stays_within_budget_for_huge_lines() {
        let huge_line = format!("+{}", "é".repeat(40_000));
        let logs = [huge_line.as_str(), huge_line.as_str(), "+final"].join("\n");
        let rendered = render_failure_comment("too much output", &logs);
        assert!(rendered.len() <= FAILURE_COMMENT_MAX_BYTES);
        assert!(rendered.starts_with("The last publishing run failed: too much output\n```\n"));
        assert!(rendered.ends_with("+final\n```"));
    }

    #[test]
    fn unit_render_keeps_small_input_intact() {
        let rendered = LogBuilder::with_max_bytes(100, "abc")
            .heading("head")
            .trailer("tail")
            .render();
        assert_eq!(rendered, "head\nabc\ntail");
    }

    #[test]
    fn unit_render_drops_oldest_bytes_and_partial_line_when_over_budget() {
        let rendered = LogBuilder::with_max_bytes(20, "+first line\n+second\n+third")
            .heading("h")
            .trailer("t")
            .render();
        assert!(rendered.len() <= 20);
        assert_eq!(rendered, "h\n+second\n+third\nt");
    }

    #[test]
    fn regression_render_respects_budget_smaller_than_trailer() {
        let rendered = LogBuilder::with_max_bytes(3, "+payload")
            .heading("heading")
            .trailer("```")
            .render();
        assert_eq!(rendered, "hea");
    }

    #[test]
    fn regression_render_cuts_oversized_heading_on_char_boundary() {
        let rendered = LogBuilder::with_max_bytes(10, "+x")
            .heading("ééééééééé")
            .trailer("t")
            .render();
        assert!(rendered.len() <= 10);
        assert!(rendered.ends_with("\nt"));
    }

    #[test]
    fn unit_tail_and_filter_compose() {
        let rendered = LogBuilder::with_max_bytes(1_000, "+a\nb\n+c\n+d\n")
            .trim_trailing(&['\n'])
            .split("\n")
            .filter(|line| line.starts_with('+'))
            .tail(2)
            .join("\n")
            .render();
        assert_eq!(rendered, "+c\n+d");
    }

    #[test]
    fn regression_render_failure_comment_with_no_marker_lines_is_still_fenced() {
        let rendered = render_failure_comment("failed", "plain output\nerror: oops\n");
        assert_eq!(rendered, "The last publishing run failed: failed\n```\n\n```");
    }
}
