use super::{build_report, output_chart, output_json, output_ndjson};
use crate::cli::{Cli, Mode};
use crate::config::{ReportConfig, TOKEN_ENV};
use crate::gitlab::{Fetcher, GitLabClient, ProgressObserver};
use crate::model::Commit;
use crate::store::CommitStore;
use anyhow::{anyhow, bail, Context};
use std::path::Path;
use tracing::info;

pub fn exec(cli: &Cli) -> anyhow::Result<()> {
    info!(
        mode = ?cli.mode,
        config = %cli.config.display(),
        input = ?cli.input,
        "starting report generation"
    );

    let input = match (cli.mode, cli.input.as_deref()) {
        (Mode::Read, None) => bail!("--input is required in read mode"),
        (_, input) => input,
    };

    let config = ReportConfig::load(&cli.config).context("Failed to load configuration")?;
    info!(
        gitlab_url = %config.gitlab_url,
        project_id = %config.project_id,
        ref_name = %config.ref_name,
        output_json = %config.output_json.display(),
        author_email = %config.author_email,
        since = ?config.since,
        until = ?config.until,
        "configuration loaded"
    );

    let commits = match (cli.mode, input) {
        (Mode::Read, Some(path)) => replay(path)?,
        _ => fetch(&config, show_progress(cli))?,
    };

    let report = build_report(&commits, &config.author_email, config.author.as_deref())
        .context("Failed to build commit series")?;

    if cli.output.json {
        output_json(&report, &config)?;
    } else if cli.output.ndjson {
        output_ndjson(&report.series)?;
    } else {
        let options = config.chart_options()?;
        output_chart(&report, &config.author_email, &options)?;
    }

    Ok(())
}

fn replay(path: &Path) -> anyhow::Result<Vec<Commit>> {
    info!(input = %path.display(), "replaying cached commits");
    CommitStore::new(path)
        .load()
        .context("Failed to read cached commits")
}

fn fetch(config: &ReportConfig, progress: bool) -> anyhow::Result<Vec<Commit>> {
    let token = std::env::var(TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow!("{TOKEN_ENV} environment variable not set"))?;
    info!("{TOKEN_ENV} found in environment");

    let client = GitLabClient::new(&config.gitlab_url, token, config.request_timeout()?)
        .context("Failed to create GitLab client")?;
    let mut fetcher = Fetcher::new(client, config.retry_policy()?);
    if progress {
        fetcher = fetcher.with_observer(ProgressObserver::new());
    }

    let store = CommitStore::new(&config.output_json);
    let commits = fetcher
        .fetch_and_store(&config.query()?, &store)
        .context("Failed to fetch commits from GitLab")?;
    info!(commits = commits.len(), cache = %store.path().display(), "commits fetched and cached");
    Ok(commits)
}

fn show_progress(cli: &Cli) -> bool {
    !cli.no_progress && !cli.quiet && console::Term::stderr().is_term()
}
