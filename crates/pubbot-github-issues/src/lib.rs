//! Shared helpers for the publishing-bot GitHub issue reporter.
//!
//! Provides token redaction, the failure-comment log builder, error-text
//! truncation, and the GitHub wire types consumed by the reporter crate.

pub mod github_transport_helpers;
pub mod issue_comment_selection;
pub mod issue_log_builder;
pub mod issue_redaction;

pub use issue_comment_selection::{
    select_stale_comment_ids, ActorId, GithubCommentCreateResponse, GithubIssueComment,
    GithubIssueState, GithubUser,
};
pub use issue_log_builder::{render_failure_comment, LogBuilder, FAILURE_COMMENT_MAX_BYTES};
pub use issue_redaction::{redact_token, GithubToken, REDACTED_TOKEN_PLACEHOLDER};
