use std::path::Path;

use git2::{IndexAddOption, Oid, Repository, Signature};

pub(crate) fn init_repo_with_file(dir: &Path, file: &str, contents: &str) -> (Repository, Oid) {
    std::fs::create_dir_all(dir).expect("create repo dir");
    std::fs::write(dir.join(file), contents).expect("write fixture file");
    let repo = Repository::init(dir).expect("init repo");
    let commit = commit_all(&repo, "initial");
    (repo, commit)
}

pub(crate) fn commit_all(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().expect("index");
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .expect("stage files");
    index.write().expect("write index");
    let tree_id = index.write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");
    let signature = Signature::now("pubbot", "pubbot@example.com").expect("signature");
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents = parent.iter().collect::<Vec<_>>();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("commit")
}

pub(crate) fn tag_head(repo: &Repository, tag: &str, annotated: bool) -> Oid {
    let head = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .expect("head commit");
    let object = head.as_object();
    if annotated {
        let signature = Signature::now("pubbot", "pubbot@example.com").expect("signature");
        repo.tag(tag, object, &signature, tag, false)
            .expect("annotated tag");
    } else {
        repo.tag_lightweight(tag, object, false)
            .expect("lightweight tag");
    }
    head.id()
}
