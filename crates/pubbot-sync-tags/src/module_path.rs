use std::path::Path;

use thiserror::Error;

pub const GO_MOD_FILE: &str = "go.mod";

#[derive(Debug, Error)]
pub enum ModulePathError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} has no module directive")]
    MissingDirective { path: String },
}

/// Reads the module path declared by the `go.mod` inside `module_dir`.
pub fn read_module_path(module_dir: &Path) -> Result<String, ModulePathError> {
    let manifest = module_dir.join(GO_MOD_FILE);
    let raw = std::fs::read_to_string(&manifest).map_err(|source| ModulePathError::Read {
        path: manifest.display().to_string(),
        source,
    })?;
    parse_module_directive(&raw).ok_or_else(|| ModulePathError::MissingDirective {
        path: manifest.display().to_string(),
    })
}

/// Extracts the path from the first `module` directive, e.g.
/// `module k8s.io/api // indirect comment` yields `k8s.io/api`.
pub fn parse_module_directive(manifest: &str) -> Option<String> {
    for line in manifest.lines() {
        let line = match line.find("//") {
            Some(index) => &line[..index],
            None => line,
        };
        let Some(rest) = line.trim().strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        let path = rest.trim().trim_matches(|ch: char| ch == '"' || ch == '`').trim();
        if path.is_empty() || path.starts_with('(') {
            continue;
        }
        return Some(path.to_string());
    }
    None
}
