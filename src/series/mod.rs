pub mod aggregate;
pub mod exec;
pub mod fill;
pub mod filter;
pub mod output;

pub use aggregate::build_histogram;
pub use exec::exec;
pub use fill::fill_gaps;
pub use filter::{by_author_email, exclude_merges};
pub use output::{output_chart, output_json, output_ndjson, render_chart, ChartOptions};

use crate::error::Result;
use crate::model::{Commit, DenseSeries};
use tracing::info;

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Daily activity of one author, ready to be rendered.
#[derive(Debug, Clone)]
pub struct Report {
    pub series: DenseSeries,
    pub label: String,
    pub matched_commits: usize,
}

/// Runs merge exclusion, author matching, day bucketing and gap filling
/// over a raw commit list.
///
/// The label is `author` when given, else the author name the API
/// reported on the matched commits.
pub fn build_report(commits: &[Commit], author_email: &str, author: Option<&str>) -> Result<Report> {
    let regular = exclude_merges(commits);
    info!(total = commits.len(), remaining = regular.len(), "removed merge commits");

    let matched = by_author_email(&regular, author_email);
    info!(author_email, remaining = matched.len(), "filtered by author email");

    let series = fill_gaps(&build_histogram(&matched))?;
    if let (Some(first), Some(last)) = (series.first_day(), series.last_day()) {
        info!(%first, %last, days = series.len(), "built daily series");
    }

    let label = author
        .map(str::to_string)
        .or_else(|| {
            matched
                .iter()
                .filter_map(|c| c.author_name.as_deref())
                .find(|name| !name.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    Ok(Report {
        series,
        label,
        matched_commits: matched.len(),
    })
}
