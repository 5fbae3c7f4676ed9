use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pubbot_github_issues::GithubToken;
use pubbot_issue_reporter::{IssueRef, IssueReporter, IssueReporterConfig};
use pubbot_sync_tags::{GoToolchainConfig, ModulePinConfig, ModulePinner};
use tracing::warn;

use crate::cli_args::{Cli, CliCommand, IssueArgs, PinDepsArgs, ReportFailureArgs};

pub(crate) fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        CliCommand::ReportFailure(args) => report_failure(&cli, args),
        CliCommand::CloseIssue(args) => close_issue(&cli, args),
        CliCommand::PinDeps(args) => pin_deps(&cli, args),
    }
}

fn issue_reporter(cli: &Cli) -> Result<IssueReporter> {
    let token = GithubToken::new(cli.github_token.clone().unwrap_or_default());
    if token.is_empty() {
        bail!("missing GitHub token: pass --github-token or set GITHUB_TOKEN");
    }
    let config = IssueReporterConfig {
        api_base: cli.github_api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        ..IssueReporterConfig::default()
    };
    IssueReporter::new(&config, token).context("failed to initialize github issue reporter")
}

fn issue_ref(args: &IssueArgs) -> IssueRef {
    IssueRef::new(args.org.clone(), args.repo.clone(), args.issue)
}

fn report_failure(cli: &Cli, args: &ReportFailureArgs) -> Result<()> {
    let reporter = issue_reporter(cli)?;
    let logs = read_logs(args.log_file.as_deref())?;
    let issue = issue_ref(&args.issue);
    let report = reporter
        .report_failure(&issue, args.error.as_str(), &logs)
        .with_context(|| format!("failed to report publishing failure on {issue}"))?;
    if !report.failed_deletions.is_empty() {
        warn!(
            issue = %issue,
            failed = report.failed_deletions.len(),
            "some stale failure comments could not be deleted"
        );
    }
    println!(
        "reported failure on {issue}: comment {}",
        report
            .comment_url
            .unwrap_or_else(|| report.comment_id.to_string())
    );
    Ok(())
}

fn close_issue(cli: &Cli, args: &IssueArgs) -> Result<()> {
    let reporter = issue_reporter(cli)?;
    let issue = issue_ref(args);
    reporter
        .close_issue(&issue)
        .with_context(|| format!("failed to close {issue}"))?;
    println!("closed {issue}");
    Ok(())
}

fn pin_deps(cli: &Cli, args: &PinDepsArgs) -> Result<()> {
    let config = ModulePinConfig {
        project_dir: args.project_dir.clone(),
        deps_root: args.deps_root.clone(),
        remote: args.remote.clone(),
    };
    let go = GoToolchainConfig {
        program: args.go_binary.clone(),
        timeout_ms: cli.tool_timeout_ms,
        ..GoToolchainConfig::default()
    };
    let outcome = ModulePinner::with_go_toolchain(config, go)
        .pin_dependencies(&args.tag, &args.dependencies)
        .map_err(|failure| {
            let changed = failure.changed;
            anyhow::Error::new(failure).context(format!(
                "failed to pin dependencies to {} (go.mod changed: {changed})",
                args.tag
            ))
        })?;
    println!(
        "changed={} pinned={} missing={}",
        outcome.changed,
        outcome.pinned.len(),
        outcome.missing.len()
    );
    Ok(())
}

fn read_logs(log_file: Option<&Path>) -> Result<String> {
    match log_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read log file {}", path.display())),
        None => {
            let mut logs = String::new();
            std::io::stdin()
                .read_to_string(&mut logs)
                .context("failed to read logs from stdin")?;
            Ok(logs)
        }
    }
}
