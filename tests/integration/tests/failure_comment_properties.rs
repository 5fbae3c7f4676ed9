use proptest::prelude::*;
use pubbot_github_issues::issue_log_builder::FAILURE_COMMENT_TAIL_LINES;
use pubbot_github_issues::{
    redact_token, render_failure_comment, GithubToken, FAILURE_COMMENT_MAX_BYTES,
};

const LINE_MARKERS: &[&str] = &["+", "-", " ", "+ ", ""];

fn fenced_lines(body: &str) -> Vec<String> {
    let lines = body.split('\n').collect::<Vec<_>>();
    let open = lines
        .iter()
        .position(|line| *line == "```")
        .expect("opening fence");
    let close = lines.len() - 1;
    assert!(close > open, "closing fence");
    assert_eq!(lines[close], "```", "closing fence");
    lines[open + 1..close]
        .iter()
        .map(|line| line.to_string())
        .collect()
}

fn log_piece() -> impl Strategy<Value = (&'static str, String, bool, String)> {
    (
        prop::sample::select(LINE_MARKERS),
        ".{0,1500}",
        any::<bool>(),
        ".{0,1500}",
    )
}

fn plain_log_line() -> impl Strategy<Value = String> {
    (prop::sample::select(LINE_MARKERS), r"[^\r\n`]{0,40}")
        .prop_map(|(marker, text)| format!("{marker}{text}"))
}

proptest! {
    #[test]
    fn property_failure_comment_never_leaks_token_and_fits_budget(
        token in "ghp_[A-Za-z0-9]{20,36}",
        pieces in prop::collection::vec(log_piece(), 0..80),
        failure_prefix in ".{0,200}",
    ) {
        let logs = pieces
            .iter()
            .map(|(marker, before, inject, after)| {
                if *inject {
                    format!("{marker}{before}{token}{after}")
                } else {
                    format!("{marker}{before}{after}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let failure = format!("{failure_prefix} push with {token} rejected");

        let body = render_failure_comment(
            &redact_token(&failure, &token),
            &GithubToken::new(token.as_str()).redact(&logs),
        );

        prop_assert!(!body.contains(token.as_str()));
        prop_assert!(body.len() <= FAILURE_COMMENT_MAX_BYTES);
        prop_assert!(body.starts_with("The last publishing run failed: "));
        prop_assert!(body.ends_with("\n```"));
        let kept = fenced_lines(&body);
        prop_assert!(kept.len() <= FAILURE_COMMENT_TAIL_LINES);
        prop_assert!(kept.iter().all(|line| line.starts_with('+')));
    }

    #[test]
    fn property_failure_comment_keeps_last_marker_lines_in_order(
        lines in prop::collection::vec(plain_log_line(), 0..300),
        trailing_newlines in 0usize..3,
    ) {
        let mut logs = lines.join("\n");
        logs.push_str(&"\n".repeat(trailing_newlines));
        let marked = lines
            .iter()
            .filter(|line| line.starts_with('+'))
            .cloned()
            .collect::<Vec<_>>();
        let expected = marked[marked.len().saturating_sub(FAILURE_COMMENT_TAIL_LINES)..].to_vec();

        let body = render_failure_comment("exit status 1", &logs);

        prop_assert!(body.len() <= FAILURE_COMMENT_MAX_BYTES);
        prop_assert_eq!(fenced_lines(&body), expected);
    }
}

#[test]
fn integration_failure_comment_keeps_exactly_last_fifty_marker_lines() {
    let logs = (0..400)
        .map(|index| match index % 3 {
            0 => format!("+kept candidate {index}"),
            1 => format!("dropped {index}"),
            _ => format!("-removed {index}"),
        })
        .collect::<Vec<_>>()
        .join("\n");
    let expected = (0..400)
        .filter(|index| index % 3 == 0)
        .map(|index| format!("+kept candidate {index}"))
        .collect::<Vec<_>>();
    let expected_tail = &expected[expected.len() - FAILURE_COMMENT_TAIL_LINES..];

    let body = render_failure_comment("boom", &logs);

    assert_eq!(fenced_lines(&body), expected_tail);
}
