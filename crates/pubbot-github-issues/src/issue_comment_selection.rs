use serde::{Deserialize, Serialize};

/// Opaque identity of a GitHub account. Compared by equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ActorId(u64);

impl ActorId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubUser {
    pub id: ActorId,
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubIssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    /// `None` for comments left by deleted accounts.
    #[serde(default)]
    pub user: Option<GithubUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubCommentCreateResponse {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GithubIssueState {
    Open,
    Closed,
}

impl GithubIssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for GithubIssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ids of comments authored by `author`, except `keep_comment_id`.
pub fn select_stale_comment_ids(
    comments: &[GithubIssueComment],
    author: ActorId,
    keep_comment_id: u64,
) -> Vec<u64> {
    comments
        .iter()
        .filter(|comment| comment.id != keep_comment_id)
        .filter(|comment| comment.user.as_ref().map(|user| user.id) == Some(author))
        .map(|comment| comment.id)
        .collect()
}
