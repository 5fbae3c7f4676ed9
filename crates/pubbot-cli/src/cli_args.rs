use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pubbot_issue_reporter::{DEFAULT_GITHUB_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS};
use pubbot_sync_tags::go_toolchain::{DEFAULT_GO_BINARY, DEFAULT_TOOL_TIMEOUT_MS};
use pubbot_sync_tags::tag_resolution::DEFAULT_PUBLISHED_REMOTE;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "pubbot",
    about = "Publishing-bot helpers: failure reporting on GitHub issues and go.mod tag pinning",
    version
)]
pub struct Cli {
    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        global = true,
        help = "GitHub access token used for issue reporting."
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "PUBBOT_GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        global = true,
        help = "Base URL of the GitHub REST API."
    )]
    pub github_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "PUBBOT_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "Timeout for each GitHub API request in milliseconds."
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "tool-timeout-ms",
        env = "PUBBOT_TOOL_TIMEOUT_MS",
        default_value_t = DEFAULT_TOOL_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "Timeout for each go toolchain invocation in milliseconds."
    )]
    pub tool_timeout_ms: u64,

    #[arg(
        long = "log-filter",
        env = "PUBBOT_LOG",
        global = true,
        help = "Tracing filter directives used when RUST_LOG is unset, e.g. 'info' or 'pubbot_sync_tags=debug'."
    )]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Comment on the tracking issue with the failed run's logs and reopen it.
    ReportFailure(ReportFailureArgs),
    /// Close the tracking issue after a successful run.
    CloseIssue(IssueArgs),
    /// Pin sibling dependencies in go.mod to the commits behind a tag.
    PinDeps(PinDepsArgs),
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    #[arg(long, env = "PUBBOT_ISSUE_ORG")]
    pub org: String,

    #[arg(long, env = "PUBBOT_ISSUE_REPO")]
    pub repo: String,

    #[arg(long, env = "PUBBOT_ISSUE_NUMBER")]
    pub issue: u64,
}

#[derive(Debug, Args)]
pub struct ReportFailureArgs {
    #[command(flatten)]
    pub issue: IssueArgs,

    #[arg(long, help = "Description of the failure placed in the comment heading.")]
    pub error: String,

    #[arg(
        long = "log-file",
        help = "File with the run's log output. Reads stdin when omitted."
    )]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PinDepsArgs {
    #[arg(long, help = "Tag whose commits the dependencies are pinned to.")]
    pub tag: String,

    #[arg(
        long = "dependency",
        value_delimiter = ',',
        help = "Dependency checkout directory names, processed in order."
    )]
    pub dependencies: Vec<String>,

    #[arg(long = "project-dir", default_value = ".")]
    pub project_dir: PathBuf,

    #[arg(
        long = "deps-root",
        default_value = "..",
        help = "Directory containing the dependency checkouts, relative to the project."
    )]
    pub deps_root: PathBuf,

    #[arg(long = "go-binary", env = "PUBBOT_GO_BINARY", default_value = DEFAULT_GO_BINARY)]
    pub go_binary: String,

    #[arg(
        long,
        default_value = DEFAULT_PUBLISHED_REMOTE,
        help = "Remote consulted for published tags."
    )]
    pub remote: String,
}
