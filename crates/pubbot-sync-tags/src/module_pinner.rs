use std::fmt;
use std::path::PathBuf;

use git2::Repository;
use thiserror::Error;
use tracing::{info, warn};

use crate::go_toolchain::{GoToolchain, GoToolchainConfig, ModuleToolchain, ToolError};
use crate::module_path::{read_module_path, ModulePathError, GO_MOD_FILE};
use crate::tag_resolution::{
    resolve_tag_commit, TagLookupError, TagSource, DEFAULT_PUBLISHED_REMOTE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePinConfig {
    /// Directory holding the `go.mod` to rewrite.
    pub project_dir: PathBuf,
    /// Parent of the dependency checkouts; relative paths resolve against
    /// `project_dir`.
    pub deps_root: PathBuf,
    pub remote: String,
}

impl Default for ModulePinConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            deps_root: PathBuf::from(".."),
            remote: DEFAULT_PUBLISHED_REMOTE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestSection {
    Require,
    Replace,
}

impl fmt::Display for ManifestSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Require => f.write_str("require"),
            Self::Replace => f.write_str("replace"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PinError {
    #[error("failed to stat {path}: {source}")]
    ManifestProbe {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open dependency repo at {path:?}: {source}")]
    RepoOpen {
        path: String,
        #[source]
        source: git2::Error,
    },
    #[error("failed to get package at {path}: {source}")]
    PackageResolution {
        path: String,
        #[source]
        source: ModulePathError,
    },
    #[error("failed to get tag {tag} for {module:?}: {source}")]
    TagResolution {
        tag: String,
        module: String,
        #[source]
        source: TagLookupError,
    },
    #[error("unable to pin {module} in the {section} section of go.mod to {commit}: {source}")]
    ManifestEdit {
        module: String,
        commit: String,
        section: ManifestSection,
        #[source]
        source: ToolError,
    },
    #[error("unable to run go mod tidy for {module} at {commit}: {source}")]
    Tidy {
        module: String,
        commit: String,
        #[source]
        source: ToolError,
    },
}

/// A failed pinning run. `changed` tells whether earlier dependencies were
/// already written to the manifest before `error` happened.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PinFailure {
    pub changed: bool,
    #[source]
    pub error: PinError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedModule {
    pub directory: String,
    pub module_path: String,
    pub commit: String,
    pub source: TagSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PinOutcome {
    pub changed: bool,
    pub pinned: Vec<PinnedModule>,
    /// Pinned modules absent from the manifest's require list afterwards.
    pub missing: Vec<String>,
}

pub struct ModulePinner<T> {
    config: ModulePinConfig,
    toolchain: T,
}

impl ModulePinner<GoToolchain> {
    /// Pinner driving the real `go` binary inside `config.project_dir`.
    pub fn with_go_toolchain(config: ModulePinConfig, go: GoToolchainConfig) -> Self {
        let toolchain = GoToolchain::new(go, config.project_dir.clone());
        Self::new(config, toolchain)
    }
}

impl<T> ModulePinner<T>
where
    T: ModuleToolchain,
{
    pub fn new(config: ModulePinConfig, toolchain: T) -> Self {
        Self { config, toolchain }
    }

    /// Pins every dependency directory to the commit tagged `tag`.
    ///
    /// Without a `go.mod` in the project this is a no-op. Dependencies are
    /// processed in order; a failure stops the run and leaves earlier edits
    /// in place.
    pub fn pin_dependencies(
        &self,
        tag: &str,
        dependencies: &[String],
    ) -> Result<PinOutcome, PinFailure> {
        let manifest = self.config.project_dir.join(GO_MOD_FILE);
        match std::fs::metadata(&manifest) {
            Ok(_) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PinOutcome::default());
            }
            Err(source) => {
                return Err(PinFailure {
                    changed: false,
                    error: PinError::ManifestProbe {
                        path: manifest.display().to_string(),
                        source,
                    },
                });
            }
        }

        let mut outcome = PinOutcome::default();
        for dependency in dependencies {
            let pinned = self
                .pin_dependency(tag, dependency)
                .map_err(|error| PinFailure {
                    changed: outcome.changed,
                    error,
                })?;
            info!(
                module = %pinned.module_path,
                commit = %pinned.commit,
                source = pinned.source.as_str(),
                "bumping {} in go.mod to {}",
                pinned.module_path,
                pinned.commit
            );
            outcome.changed = true;
            outcome.pinned.push(pinned);
        }

        outcome.missing = self.missing_from_manifest(&outcome.pinned);
        for module in &outcome.missing {
            warn!(module = %module, "dependency {} not found in go.mod", module);
        }
        Ok(outcome)
    }

    fn pin_dependency(&self, tag: &str, dependency: &str) -> Result<PinnedModule, PinError> {
        let dependency_dir = self
            .config
            .project_dir
            .join(&self.config.deps_root)
            .join(dependency);
        let path = dependency_dir.display().to_string();

        let repo = Repository::open(&dependency_dir).map_err(|source| PinError::RepoOpen {
            path: path.clone(),
            source,
        })?;
        let module_path = read_module_path(&dependency_dir)
            .map_err(|source| PinError::PackageResolution { path, source })?;
        let resolved = resolve_tag_commit(&repo, tag, &self.config.remote).map_err(|source| {
            PinError::TagResolution {
                tag: tag.to_string(),
                module: module_path.clone(),
                source,
            }
        })?;
        drop(repo);

        let commit = resolved.commit;
        self.toolchain
            .pin_require(&module_path, &commit)
            .map_err(|source| PinError::ManifestEdit {
                module: module_path.clone(),
                commit: commit.clone(),
                section: ManifestSection::Require,
                source,
            })?;
        self.toolchain
            .pin_replace(&module_path, &commit)
            .map_err(|source| PinError::ManifestEdit {
                module: module_path.clone(),
                commit: commit.clone(),
                section: ManifestSection::Replace,
                source,
            })?;
        self.toolchain
            .tidy()
            .map_err(|source| PinError::Tidy {
                module: module_path.clone(),
                commit: commit.clone(),
                source,
            })?;

        Ok(PinnedModule {
            directory: dependency.to_string(),
            module_path,
            commit,
            source: resolved.source,
        })
    }

    fn missing_from_manifest(&self, pinned: &[PinnedModule]) -> Vec<String> {
        if pinned.is_empty() {
            return Vec::new();
        }
        let required = match self.toolchain.required_modules() {
            Ok(required) => required,
            Err(error) => {
                warn!(error = %error, "failed to read go.mod requirements after pinning");
                return Vec::new();
            }
        };
        let mut missing = Vec::new();
        for module in pinned {
            if !required.contains(&module.module_path) && !missing.contains(&module.module_path) {
                missing.push(module.module_path.clone());
            }
        }
        missing
    }
}

/// One-shot form of [`ModulePinner::pin_dependencies`] using the `go` binary.
pub fn pin_dependencies(
    config: ModulePinConfig,
    go: GoToolchainConfig,
    tag: &str,
    dependencies: &[String],
) -> Result<PinOutcome, PinFailure> {
    ModulePinner::with_go_toolchain(config, go).pin_dependencies(tag, dependencies)
}
