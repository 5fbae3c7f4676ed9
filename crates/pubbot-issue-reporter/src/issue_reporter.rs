use std::fmt;

use pubbot_github_issues::{
    render_failure_comment, select_stale_comment_ids, GithubIssueState, GithubToken,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::github_api_client::{GithubApiClient, GithubApiError};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_USER_AGENT: &str = "pubbot-issue-reporter";

/// Tracking issue addressed by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReporterConfig {
    pub api_base: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

impl Default for IssueReporterConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum IssueReportError {
    #[error("{0}")]
    Client(String),
    #[error("failed to get own user: {0}")]
    Auth(#[source] GithubApiError),
    #[error("failed to comment on issue #{issue}: {source}")]
    Comment {
        issue: u64,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to re-open issue #{issue}: {source}")]
    Reopen {
        issue: u64,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to get github comments of issue #{issue}: {source}")]
    List {
        issue: u64,
        #[source]
        source: GithubApiError,
    },
    #[error("failed to close issue #{issue}: {source}")]
    Close {
        issue: u64,
        #[source]
        source: GithubApiError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCommentDeletionFailure {
    pub comment_id: u64,
    pub detail: String,
}

/// Result of a successful failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub comment_id: u64,
    pub comment_url: Option<String>,
    pub deleted_comment_ids: Vec<u64>,
    pub failed_deletions: Vec<StaleCommentDeletionFailure>,
}

pub struct IssueReporter {
    client: GithubApiClient,
    token: GithubToken,
}

impl IssueReporter {
    pub fn new(config: &IssueReporterConfig, token: GithubToken) -> Result<Self, IssueReportError> {
        let client = GithubApiClient::new(
            &config.api_base,
            &config.user_agent,
            token.clone(),
            config.request_timeout_ms,
        )
        .map_err(IssueReportError::Client)?;
        Ok(Self { client, token })
    }

    /// Posts the failure on `issue`, reopens it and removes this account's
    /// older comments there.
    ///
    /// Stale comment deletion is best-effort: failures are logged and returned
    /// in [`FailureReport::failed_deletions`] instead of aborting the call.
    pub fn report_failure<E>(
        &self,
        issue: &IssueRef,
        failure: &E,
        logs: &str,
    ) -> Result<FailureReport, IssueReportError>
    where
        E: fmt::Display + ?Sized,
    {
        let myself = self
            .client
            .authenticated_user()
            .map_err(IssueReportError::Auth)?;

        let logs = self.token.redact(logs);
        let failure = self.token.redact(&failure.to_string());
        let body = render_failure_comment(&failure, &logs);

        let created = self
            .client
            .create_issue_comment(issue, &body)
            .map_err(|source| IssueReportError::Comment {
                issue: issue.number,
                source,
            })?;

        self.client
            .set_issue_state(issue, GithubIssueState::Open)
            .map_err(|source| IssueReportError::Reopen {
                issue: issue.number,
                source,
            })?;

        let comments =
            self.client
                .list_issue_comments(issue)
                .map_err(|source| IssueReportError::List {
                    issue: issue.number,
                    source,
                })?;

        let mut report = FailureReport {
            comment_id: created.id,
            comment_url: created.html_url,
            deleted_comment_ids: Vec::new(),
            failed_deletions: Vec::new(),
        };
        for comment_id in select_stale_comment_ids(&comments, myself.id, created.id) {
            match self.client.delete_issue_comment(issue, comment_id) {
                Ok(()) => report.deleted_comment_ids.push(comment_id),
                Err(error) => {
                    warn!(
                        issue = %issue,
                        comment_id,
                        error = %error,
                        "failed to delete stale failure comment"
                    );
                    report.failed_deletions.push(StaleCommentDeletionFailure {
                        comment_id,
                        detail: error.to_string(),
                    });
                }
            }
        }

        info!(
            issue = %issue,
            comment_id = report.comment_id,
            deleted = report.deleted_comment_ids.len(),
            "reported publishing failure"
        );
        Ok(report)
    }

    pub fn close_issue(&self, issue: &IssueRef) -> Result<(), IssueReportError> {
        self.client
            .set_issue_state(issue, GithubIssueState::Closed)
            .map_err(|source| IssueReportError::Close {
                issue: issue.number,
                source,
            })?;
        info!(issue = %issue, "closed tracking issue");
        Ok(())
    }
}

/// One-shot form of [`IssueReporter::report_failure`].
pub fn report_failure<E>(
    config: &IssueReporterConfig,
    token: GithubToken,
    issue: &IssueRef,
    failure: &E,
    logs: &str,
) -> Result<FailureReport, IssueReportError>
where
    E: fmt::Display + ?Sized,
{
    IssueReporter::new(config, token)?.report_failure(issue, failure, logs)
}

/// One-shot form of [`IssueReporter::close_issue`].
pub fn close_issue(
    config: &IssueReporterConfig,
    token: GithubToken,
    issue: &IssueRef,
) -> Result<(), IssueReportError> {
    IssueReporter::new(config, token)?.close_issue(issue)
}
