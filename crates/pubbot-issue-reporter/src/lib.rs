//! GitHub issue reporter for publishing-bot runs.
//!
//! Posts redacted failure logs on a tracking issue, reopens it and prunes the
//! bot's stale comments; closes the issue again after a successful run.

mod github_api_client;
pub mod issue_reporter;

pub use github_api_client::GithubApiError;
pub use issue_reporter::{
    close_issue, report_failure, FailureReport, IssueRef, IssueReportError, IssueReporter,
    IssueReporterConfig, StaleCommentDeletionFailure, DEFAULT_GITHUB_API_BASE,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
