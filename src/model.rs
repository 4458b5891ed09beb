use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const SCHEMA_VERSION: u32 = 1;

/// One commit as returned by the commits API.
///
/// Fields the pipeline does not read are kept in `extra` so that a cache
/// file written from a live fetch carries the same data as the
/// API response and replays without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    pub parent_ids: Vec<String>,
    pub author_email: String,
    pub authored_date: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Commit {
    /// A merge joins two or more parents. Derived, never stored.
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// Calendar day in the offset the API reported for the author.
    pub fn authored_day(&self) -> NaiveDate {
        self.authored_date.date_naive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramEntry {
    pub date: NaiveDate,
    pub count: u32,
}

/// Day to commit count. Days without commits are absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseHistogram {
    days: BTreeMap<NaiveDate, u32>,
}

impl SparseHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, day: NaiveDate) {
        *self.days.entry(day).or_insert(0) += 1;
    }

    pub fn add(&mut self, day: NaiveDate, count: u32) {
        if count > 0 {
            *self.days.entry(day).or_insert(0) += count;
        }
    }

    pub fn get(&self, day: &NaiveDate) -> Option<u32> {
        self.days.get(day).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
        self.days.iter().map(|(day, count)| (*day, *count))
    }
}

impl FromIterator<HistogramEntry> for SparseHistogram {
    fn from_iter<I: IntoIterator<Item = HistogramEntry>>(iter: I) -> Self {
        let mut histogram = SparseHistogram::new();
        for entry in iter {
            histogram.add(entry.date, entry.count);
        }
        histogram
    }
}

/// Gap-free daily series: consecutive entries are exactly one day apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DenseSeries {
    entries: Vec<HistogramEntry>,
}

impl DenseSeries {
    pub(crate) fn from_contiguous(entries: Vec<HistogramEntry>) -> Self {
        debug_assert!(entries
            .windows(2)
            .all(|w| w[0].date.succ_opt() == Some(w[1].date)));
        Self { entries }
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.entries.first().map(|e| e.date)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.entries.last().map(|e| e.date)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count as u64).sum()
    }

    /// Sum of counts for days in `[from, to]`, inclusive.
    pub fn total_between(&self, from: NaiveDate, to: NaiveDate) -> u64 {
        self.entries
            .iter()
            .filter(|e| e.date >= from && e.date <= to)
            .map(|e| e.count as u64)
            .sum()
    }

    pub fn max_count(&self) -> u32 {
        self.entries.iter().map(|e| e.count).max().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistogramEntry> {
        self.entries.iter()
    }

    pub fn to_sparse(&self) -> SparseHistogram {
        self.entries.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub project_id: String,
    pub ref_name: String,
    pub author: String,
    pub author_email: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub total_commits: u64,
    pub entries: DenseSeries,
}
