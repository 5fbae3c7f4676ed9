use httpmock::prelude::*;
use pubbot_github_issues::GithubToken;
use pubbot_issue_reporter::{close_issue, report_failure, IssueRef, IssueReporterConfig};
use serde_json::json;

#[test]
fn integration_failure_report_then_close_drives_issue_state() {
    let server = MockServer::start();
    let config = IssueReporterConfig {
        api_base: server.base_url(),
        ..IssueReporterConfig::default()
    };
    let issue = IssueRef::new("acme", "publisher", 7);

    server.mock(|when, then| {
        when.method(GET).path("/user");
        then.status(200).json_body(json!({"id": 42, "login": "acme-bot"}));
    });
    let comment = server.mock(|when, then| {
        when.method(POST).path("/repos/acme/publisher/issues/7/comments");
        then.status(201).json_body(json!({"id": 3}));
    });
    let reopen = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/publisher/issues/7")
            .json_body(json!({"state": "open"}));
        then.status(200).json_body(json!({"state": "open"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/publisher/issues/7/comments");
        then.status(200).json_body(json!([
            {"id": 1, "user": {"id": 42, "login": "acme-bot"}},
            {"id": 2, "user": {"id": 5, "login": "reviewer"}},
            {"id": 3, "user": {"id": 42, "login": "acme-bot"}}
        ]));
    });
    let delete_old = server.mock(|when, then| {
        when.method(DELETE).path("/repos/acme/publisher/issues/comments/1");
        then.status(204);
    });
    let delete_reviewer = server.mock(|when, then| {
        when.method(DELETE).path("/repos/acme/publisher/issues/comments/2");
        then.status(204);
    });
    let close = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/publisher/issues/7")
            .json_body(json!({"state": "closed"}));
        then.status(200).json_body(json!({"state": "closed"}));
    });

    let report = report_failure(
        &config,
        GithubToken::new("ghp_lifecycle"),
        &issue,
        "publish failed",
        "+ git push\n",
    )
    .expect("report");
    close_issue(&config, GithubToken::new("ghp_lifecycle"), &issue).expect("close");

    comment.assert();
    reopen.assert();
    delete_old.assert();
    delete_reviewer.assert_hits(0);
    close.assert();
    assert_eq!(report.deleted_comment_ids, vec![1]);
}
