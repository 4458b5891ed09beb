use super::Report;
use crate::config::ReportConfig;
use crate::model::{DenseSeries, SeriesOutput, SCHEMA_VERSION};
use crate::util::day_label;
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use console::style;
use std::fmt::Write as _;

const BAR_WIDTH: u32 = 40;

/// Chart window, value axis and marker days. Unset values fall back to
/// the series itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartOptions {
    pub x_start: Option<NaiveDate>,
    pub x_end: Option<NaiveDate>,
    pub y_top: Option<u32>,
    pub y_bottom: Option<u32>,
    pub marker_left: Option<NaiveDate>,
    pub marker_right: Option<NaiveDate>,
}

pub fn series_output(report: &Report, config: &ReportConfig) -> SeriesOutput {
    SeriesOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        project_id: config.project_id.clone(),
        ref_name: config.ref_name.clone(),
        author: report.label.clone(),
        author_email: config.author_email.clone(),
        since: config.since.clone(),
        until: config.until.clone(),
        first_day: report.series.first_day(),
        last_day: report.series.last_day(),
        total_commits: report.series.total(),
        entries: report.series.clone(),
    }
}

pub fn output_json(report: &Report, config: &ReportConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&series_output(report, config))?);
    Ok(())
}

pub fn output_ndjson(series: &DenseSeries) -> Result<()> {
    for entry in series.iter() {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}

pub fn output_chart(report: &Report, email: &str, options: &ChartOptions) -> Result<()> {
    print!("{}", render_chart(&report.series, &report.label, email, options));
    Ok(())
}

/// Draws the series as one horizontal bar per day.
pub fn render_chart(series: &DenseSeries, label: &str, email: &str, options: &ChartOptions) -> String {
    let mut out = String::new();
    let (Some(first), Some(last)) = (series.first_day(), series.last_day()) else {
        let _ = writeln!(out, "No data to display");
        return out;
    };

    let start = options.x_start.unwrap_or(first);
    let end = options.x_end.unwrap_or(last);
    let left = options.marker_left.unwrap_or(first);
    let right = options.marker_right.unwrap_or(last);
    let bottom = options.y_bottom.unwrap_or(0);
    let top = options
        .y_top
        .unwrap_or_else(|| series.max_count())
        .max(bottom.saturating_add(1));
    let total = series.total_between(left, right);

    let _ = writeln!(out, "{}", style(label).bold());
    let _ = writeln!(out, "{total} commits ({email})");
    let _ = writeln!(out, "{}", "─".repeat(BAR_WIDTH as usize + 18));

    let mut counts = series.iter().peekable();
    for day in start.iter_days().take_while(|d| *d <= end) {
        while counts.peek().is_some_and(|e| e.date < day) {
            counts.next();
        }
        let count = counts.peek().filter(|e| e.date == day).map(|e| e.count);

        let bar = match count {
            Some(c) => {
                let clamped = c.clamp(bottom, top) - bottom;
                let width = (clamped as u64 * BAR_WIDTH as u64 / (top - bottom).max(1) as u64) as usize;
                "█".repeat(width)
            }
            None => String::new(),
        };
        let value = count.map(|c| c.to_string()).unwrap_or_default();
        let marker = if day == left || day == right {
            format!(" ◀ {}", day_label(day))
        } else {
            String::new()
        };

        let _ = writeln!(
            out,
            "{} │{:<width$} {:>3}{}",
            day.format("%b %d"),
            style(bar).color256(105),
            value,
            style(marker).bold(),
            width = BAR_WIDTH as usize
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HistogramEntry;
    use crate::series::fill::fill_gaps;
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series() -> DenseSeries {
        let sparse: crate::model::SparseHistogram = [("2024-09-20", 2), ("2024-09-23", 1)]
            .iter()
            .map(|(d, count)| HistogramEntry { date: day(d), count: *count })
            .collect();
        fill_gaps(&sparse).unwrap()
    }

    fn rows(chart: &str) -> Vec<&str> {
        chart.lines().skip(3).collect()
    }

    #[test]
    fn chart_has_one_row_per_day() {
        console::set_colors_enabled(false);
        let chart = render_chart(&series(), "Dev", "dev@example.com", &ChartOptions::default());
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines[0], "Dev");
        assert_eq!(lines[1], "3 commits (dev@example.com)");
        let rows = rows(&chart);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("Sep 20 │"));
        assert!(rows[0].contains(&"█".repeat(40)));
        assert!(rows[0].ends_with("◀ Sep 20, 2024"));
        assert!(rows[1].contains("  0"));
        assert!(!rows[1].contains('█'));
        assert!(rows[3].contains(&"█".repeat(20)));
        assert!(!rows[3].contains(&"█".repeat(21)));
        assert!(rows[3].ends_with("◀ Sep 23, 2024"));
    }

    #[test]
    fn window_and_markers_shape_the_chart() {
        console::set_colors_enabled(false);
        let options = ChartOptions {
            x_start: Some(day("2024-09-18")),
            x_end: Some(day("2024-09-21")),
            y_top: Some(4),
            y_bottom: None,
            marker_left: Some(day("2024-09-21")),
            marker_right: Some(day("2024-09-25")),
        };
        let chart = render_chart(&series(), "Dev", "dev@example.com", &options);

        assert!(chart.lines().nth(1).unwrap().starts_with("1 commits"));
        let rows = rows(&chart);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].starts_with("Sep 18"));
        assert!(rows[0].trim_end().ends_with('│'));
        assert!(rows[2].contains(&"█".repeat(20)));
        assert!(!rows[2].contains(&"█".repeat(21)));
        assert!(rows[3].ends_with("◀ Sep 21, 2024"));
    }

    #[test]
    fn counts_above_the_top_are_clipped() {
        console::set_colors_enabled(false);
        let options = ChartOptions {
            y_top: Some(1),
            ..ChartOptions::default()
        };
        let chart = render_chart(&series(), "Dev", "e", &options);
        assert!(rows(&chart)[0].contains(&"█".repeat(40)));
        assert!(!rows(&chart)[0].contains(&"█".repeat(41)));
    }

    #[test]
    fn totals_sum_between_markers_inclusive() {
        let s = series();
        assert_eq!(s.total_between(day("2024-09-20"), day("2024-09-23")), 3);
        assert_eq!(s.total_between(day("2024-09-21"), day("2024-09-22")), 0);
        assert_eq!(s.total_between(day("2024-09-23"), day("2024-09-23")), 1);
    }
}
