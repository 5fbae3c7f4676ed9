use std::time::Duration;

use pubbot_github_issues::github_transport_helpers::{
    is_read_success_status, is_write_success_status, truncate_for_error,
};
use pubbot_github_issues::{
    GithubCommentCreateResponse, GithubIssueComment, GithubIssueState, GithubToken, GithubUser,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::IssueRef;

const COMMENTS_PAGE_SIZE: usize = 100;
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Error)]
/// Failure of a single GitHub API call. Details are already token-redacted.
pub enum GithubApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP code {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy)]
enum StatusPolicy {
    Read,
    Write,
}

impl StatusPolicy {
    fn accepts(self, status: u16) -> bool {
        match self {
            Self::Read => is_read_success_status(status),
            Self::Write => is_write_success_status(status),
        }
    }
}

pub(crate) struct GithubApiClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: GithubToken,
}

impl GithubApiClient {
    pub(crate) fn new(
        api_base: &str,
        user_agent: &str,
        token: GithubToken,
        request_timeout_ms: u64,
    ) -> Result<Self, String> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_str(user_agent)
                .map_err(|_| format!("invalid user agent '{user_agent}'"))?,
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let mut auth_value =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.expose()))
                .map_err(|_| "invalid github authorization header".to_string())?;
        auth_value.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth_value);

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .map_err(|error| token.redact(&format!("failed to create github api client: {error}")))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub(crate) fn authenticated_user(&self) -> Result<GithubUser, GithubApiError> {
        self.request_json(
            "get own user",
            StatusPolicy::Read,
            self.http.get(format!("{}/user", self.api_base)),
        )
    }

    pub(crate) fn create_issue_comment(
        &self,
        issue: &IssueRef,
        body: &str,
    ) -> Result<GithubCommentCreateResponse, GithubApiError> {
        self.request_json(
            "create issue comment",
            StatusPolicy::Write,
            self.http
                .post(format!("{}/comments", self.issue_url(issue)))
                .json(&json!({ "body": body })),
        )
    }

    pub(crate) fn set_issue_state(
        &self,
        issue: &IssueRef,
        state: GithubIssueState,
    ) -> Result<(), GithubApiError> {
        self.request(
            "edit issue",
            StatusPolicy::Write,
            self.http
                .patch(self.issue_url(issue))
                .json(&json!({ "state": state.as_str() })),
        )
        .map(|_| ())
    }

    pub(crate) fn list_issue_comments(
        &self,
        issue: &IssueRef,
    ) -> Result<Vec<GithubIssueComment>, GithubApiError> {
        let mut page = 1_u32;
        let mut rows = Vec::new();
        loop {
            let page_value = page.to_string();
            let per_page = COMMENTS_PAGE_SIZE.to_string();
            let chunk: Vec<GithubIssueComment> = self.request_json(
                "list issue comments",
                StatusPolicy::Read,
                self.http
                    .get(format!("{}/comments", self.issue_url(issue)))
                    .query(&[
                        ("per_page", per_page.as_str()),
                        ("page", page_value.as_str()),
                    ]),
            )?;
            let chunk_len = chunk.len();
            rows.extend(chunk);
            if chunk_len < COMMENTS_PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(rows)
    }

    pub(crate) fn delete_issue_comment(
        &self,
        issue: &IssueRef,
        comment_id: u64,
    ) -> Result<(), GithubApiError> {
        self.request(
            "delete issue comment",
            StatusPolicy::Write,
            self.http.delete(format!(
                "{}/repos/{}/{}/issues/comments/{}",
                self.api_base, issue.owner, issue.repo, comment_id
            )),
        )
        .map(|_| ())
    }

    fn issue_url(&self, issue: &IssueRef) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}",
            self.api_base, issue.owner, issue.repo, issue.number
        )
    }

    fn request(
        &self,
        operation: &str,
        policy: StatusPolicy,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, GithubApiError> {
        debug!(operation, "sending github api request");
        let response = request
            .send()
            .map_err(|error| GithubApiError::Transport(self.token.redact(&error.to_string())))?;
        let status = response.status().as_u16();
        if policy.accepts(status) {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(GithubApiError::Status {
            status,
            body: truncate_for_error(&self.token.redact(body.trim()), ERROR_BODY_MAX_CHARS),
        })
    }

    fn request_json<T>(
        &self,
        operation: &str,
        policy: StatusPolicy,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<T, GithubApiError>
    where
        T: DeserializeOwned,
    {
        self.request(operation, policy, request)?
            .json::<T>()
            .map_err(|error| GithubApiError::Decode(self.token.redact(&error.to_string())))
    }
}
