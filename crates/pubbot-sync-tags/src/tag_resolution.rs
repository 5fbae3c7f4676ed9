use git2::{Direction, ErrorCode, Oid, Repository};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_PUBLISHED_REMOTE: &str = "origin";

/// Where a tag's commit was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSource {
    Local,
    Published,
}

impl TagSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Published => "published",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTag {
    pub commit: String,
    pub source: TagSource,
}

#[derive(Debug, Error)]
pub enum TagLookupError {
    #[error("tag {tag} not found locally and remote {remote} is not configured")]
    NoRemote { tag: String, remote: String },
    #[error("tag {tag} not found locally nor on remote {remote}")]
    NotFound { tag: String, remote: String },
    #[error("tag {tag} on remote {remote} points at {oid}, which cannot be peeled to a local commit")]
    Unpeelable {
        tag: String,
        remote: String,
        oid: String,
    },
    #[error("failed to inspect local tag {tag}: {source}")]
    Local {
        tag: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to list references of remote {remote}: {source}")]
    Remote {
        remote: String,
        #[source]
        source: git2::Error,
    },
}

/// Resolves `tag` to a commit hash, preferring the local `refs/tags/<tag>`
/// and falling back to the tags advertised by `remote_name`.
pub fn resolve_tag_commit(
    repo: &Repository,
    tag: &str,
    remote_name: &str,
) -> Result<ResolvedTag, TagLookupError> {
    if let Some(commit) = local_tag_commit(repo, tag)? {
        return Ok(ResolvedTag {
            commit: commit.to_string(),
            source: TagSource::Local,
        });
    }
    debug!(tag, remote = remote_name, "tag not found locally, checking published tags");
    let commit = published_tag_commit(repo, tag, remote_name)?;
    Ok(ResolvedTag {
        commit: commit.to_string(),
        source: TagSource::Published,
    })
}

fn local_tag_commit(repo: &Repository, tag: &str) -> Result<Option<Oid>, TagLookupError> {
    let reference = match repo.find_reference(&tag_ref_name(tag)) {
        Ok(reference) => reference,
        Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
        Err(source) => {
            return Err(TagLookupError::Local {
                tag: tag.to_string(),
                source,
            })
        }
    };
    let commit = reference
        .peel_to_commit()
        .map_err(|source| TagLookupError::Local {
            tag: tag.to_string(),
            source,
        })?;
    Ok(Some(commit.id()))
}

fn published_tag_commit(
    repo: &Repository,
    tag: &str,
    remote_name: &str,
) -> Result<Oid, TagLookupError> {
    let mut remote = match repo.find_remote(remote_name) {
        Ok(remote) => remote,
        Err(error) if error.code() == ErrorCode::NotFound => {
            return Err(TagLookupError::NoRemote {
                tag: tag.to_string(),
                remote: remote_name.to_string(),
            })
        }
        Err(source) => {
            return Err(TagLookupError::Remote {
                remote: remote_name.to_string(),
                source,
            })
        }
    };
    let remote_error = |source: git2::Error| TagLookupError::Remote {
        remote: remote_name.to_string(),
        source,
    };
    remote.connect(Direction::Fetch).map_err(remote_error)?;

    let ref_name = tag_ref_name(tag);
    let peeled_name = format!("{ref_name}^{{}}");
    let mut direct = None;
    let mut peeled = None;
    for head in remote.list().map_err(remote_error)? {
        if head.name() == peeled_name {
            peeled = Some(head.oid());
        } else if head.name() == ref_name {
            direct = Some(head.oid());
        }
    }
    if let Err(error) = remote.disconnect() {
        // the advertised refs were already read
        debug!(remote = remote_name, error = %error, "failed to disconnect from remote");
    }

    match (peeled, direct) {
        (Some(commit), _) => Ok(commit),
        (None, Some(oid)) => peel_advertised_tag(repo, tag, remote_name, oid),
        (None, None) => Err(TagLookupError::NotFound {
            tag: tag.to_string(),
            remote: remote_name.to_string(),
        }),
    }
}

/// Peels a tag advertised without its `^{}` entry; the target must already
/// exist in the local object database.
fn peel_advertised_tag(
    repo: &Repository,
    tag: &str,
    remote_name: &str,
    oid: Oid,
) -> Result<Oid, TagLookupError> {
    repo.find_object(oid, None)
        .and_then(|object| object.peel_to_commit())
        .map(|commit| commit.id())
        .map_err(|_| TagLookupError::Unpeelable {
            tag: tag.to_string(),
            remote: remote_name.to_string(),
            oid: oid.to_string(),
        })
}

fn tag_ref_name(tag: &str) -> String {
    format!("refs/tags/{tag}")
}
