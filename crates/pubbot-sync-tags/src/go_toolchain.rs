//! `go mod` subprocess runner.
//!
//! Every invocation receives its environment explicitly from
//! [`GoToolchainConfig::env`]; the process-wide environment is never mutated.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use pubbot_github_issues::github_transport_helpers::truncate_for_error;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

pub const DEFAULT_GO_BINARY: &str = "go";
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 600_000;
const STDERR_SUMMARY_MAX_CHARS: usize = 2_000;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout_ms} ms")]
    TimedOut { command: String, timeout_ms: u64 },
    #[error("{command} exited with status {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("failed while waiting for {command}: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode output of {command}: {detail}")]
    Output { command: String, detail: String },
}

/// Manifest operations needed to pin a dependency.
pub trait ModuleToolchain {
    fn pin_require(&self, module_path: &str, commit: &str) -> Result<(), ToolError>;
    fn pin_replace(&self, module_path: &str, commit: &str) -> Result<(), ToolError>;
    fn tidy(&self) -> Result<(), ToolError>;
    /// Module paths listed in the manifest's require directives.
    fn required_modules(&self) -> Result<Vec<String>, ToolError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoToolchainConfig {
    pub program: String,
    pub env: Vec<(String, String)>,
    pub timeout_ms: u64,
}

impl Default for GoToolchainConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_GO_BINARY.to_string(),
            env: vec![("GO111MODULE".to_string(), "on".to_string())],
            timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
        }
    }
}

/// Runs `go mod` commands inside one module directory.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    config: GoToolchainConfig,
    module_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct GoModJson {
    #[serde(rename = "Require", default)]
    require: Option<Vec<GoModRequirement>>,
}

#[derive(Debug, Deserialize)]
struct GoModRequirement {
    #[serde(rename = "Path")]
    path: String,
}

impl GoToolchain {
    pub fn new(config: GoToolchainConfig, module_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            module_dir: module_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, ToolError> {
        let command_str = format!("{} {}", self.config.program, args.join(" "));
        debug!(command = %command_str, dir = %self.module_dir.display(), "running go toolchain");

        let mut command = Command::new(&self.config.program);
        command
            .args(args)
            .current_dir(&self.module_dir)
            .envs(
                self.config
                    .env
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_str())),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|source| ToolError::Spawn {
            command: command_str.clone(),
            source,
        })?;
        let stdout_reader = child.stdout.take().map(spawn_pipe_reader);
        let stderr_reader = child.stderr.take().map(spawn_pipe_reader);

        let timeout = Duration::from_millis(self.config.timeout_ms.max(1));
        let waited = child.wait_timeout(timeout).map_err(|source| ToolError::Wait {
            command: command_str.clone(),
            source,
        })?;
        let status = match waited {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ToolError::TimedOut {
                    command: command_str,
                    timeout_ms: self.config.timeout_ms.max(1),
                });
            }
        };

        let stdout = join_pipe_reader(stdout_reader);
        let stderr = join_pipe_reader(stderr_reader);
        if !status.success() {
            let code = status
                .code()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "terminated_by_signal".to_string());
            return Err(ToolError::Exit {
                command: command_str,
                status: code,
                stderr: summarize_stderr(&stderr),
            });
        }
        Ok(stdout)
    }
}

impl ModuleToolchain for GoToolchain {
    fn pin_require(&self, module_path: &str, commit: &str) -> Result<(), ToolError> {
        let target = format!("{module_path}@{commit}");
        self.run(&["mod", "edit", "-fmt", "-require", &target])
            .map(|_| ())
    }

    fn pin_replace(&self, module_path: &str, commit: &str) -> Result<(), ToolError> {
        let target = format!("{module_path}={module_path}@{commit}");
        self.run(&["mod", "edit", "-fmt", "-replace", &target])
            .map(|_| ())
    }

    fn tidy(&self) -> Result<(), ToolError> {
        self.run(&["mod", "tidy"]).map(|_| ())
    }

    fn required_modules(&self) -> Result<Vec<String>, ToolError> {
        let raw = self.run(&["mod", "edit", "-json"])?;
        let parsed: GoModJson = serde_json::from_str(&raw).map_err(|error| ToolError::Output {
            command: format!("{} mod edit -json", self.config.program),
            detail: error.to_string(),
        })?;
        Ok(parsed
            .require
            .unwrap_or_default()
            .into_iter()
            .map(|requirement| requirement.path)
            .collect())
    }
}

fn spawn_pipe_reader<R>(mut pipe: R) -> std::thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_pipe_reader(reader: Option<std::thread::JoinHandle<String>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn summarize_stderr(stderr: &str) -> String {
    truncate_for_error(stderr.trim(), STDERR_SUMMARY_MAX_CHARS)
}
