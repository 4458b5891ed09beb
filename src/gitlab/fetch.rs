use super::observer::{FetchObserver, TracingObserver};
use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::error::{RepgenError, Result};
use crate::model::{Commit, DateRange};
use crate::store::CommitStore;
use std::time::Duration;

pub const MAX_PER_PAGE: u32 = 100;

/// What to list: one project, one ref, optional authored-date bounds.
#[derive(Debug, Clone)]
pub struct CommitQuery {
    pub project_id: String,
    pub ref_name: String,
    pub range: DateRange,
    pub per_page: u32,
}

impl CommitQuery {
    pub fn new(project_id: impl Into<String>, ref_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ref_name: ref_name.into(),
            range: DateRange::new(),
            per_page: MAX_PER_PAGE,
        }
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }
}

/// Server hint about what follows the page just received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHint {
    Unknown,
    Last,
    Page(u32),
}

#[derive(Debug, Clone)]
pub struct Page {
    pub commits: Vec<Commit>,
    pub next: NextHint,
}

impl Page {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self {
            commits,
            next: NextHint::Unknown,
        }
    }
}

/// Anything that can return one page of the commit listing.
pub trait PageSource {
    fn fetch_page(&self, query: &CommitQuery, page: u32) -> Result<Page>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch_page(&self, query: &CommitQuery, page: u32) -> Result<Page> {
        (**self).fetch_page(query, page)
    }
}

/// Pagination position. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Page(u32),
    Done,
}

impl Cursor {
    pub fn start() -> Self {
        Cursor::Page(1)
    }

    /// Short or empty pages end the listing, as does an explicit
    /// last-page hint. Otherwise move to the next page; a numeric hint never
    /// skips or repeats pages.
    pub fn advance(self, page: &Page, per_page: u32) -> Cursor {
        let Cursor::Page(current) = self else {
            return Cursor::Done;
        };
        if page.commits.is_empty() || page.commits.len() < per_page as usize {
            return Cursor::Done;
        }
        match page.next {
            NextHint::Last => Cursor::Done,
            NextHint::Page(_) | NextHint::Unknown => {
                current.checked_add(1).map_or(Cursor::Done, Cursor::Page)
            }
        }
    }
}

pub struct Fetcher<S> {
    source: S,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
    observer: Box<dyn FetchObserver>,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            sleeper: Box::new(ThreadSleeper),
            observer: Box::new(TracingObserver),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_observer(mut self, observer: impl FetchObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Walks every page of the listing and concatenates the records in
    /// the order the API returned them.
    pub fn fetch_all(&self, query: &CommitQuery) -> Result<Vec<Commit>> {
        let mut commits = Vec::new();
        let mut cursor = Cursor::start();

        while let Cursor::Page(number) = cursor {
            let page = match self.fetch_page_with_retry(query, number) {
                Ok(page) => page,
                Err(err) => {
                    self.observer.failed(number, &err);
                    return Err(err);
                }
            };
            cursor = cursor.advance(&page, query.per_page);
            self.observer
                .page_fetched(number, page.commits.len(), commits.len() + page.commits.len());
            commits.extend(page.commits);
        }

        self.observer.finished(commits.len());
        Ok(commits)
    }

    /// `fetch_all`, then overwrite the cache with the full list so the run
    /// can be replayed later.
    pub fn fetch_and_store(&self, query: &CommitQuery, store: &CommitStore) -> Result<Vec<Commit>> {
        let commits = self.fetch_all(query)?;
        store.save(&commits)?;
        Ok(commits)
    }

    fn fetch_page_with_retry(&self, query: &CommitQuery, page: u32) -> Result<Page> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let err = match self.source.fetch_page(query, page) {
                Ok(result) => return Ok(result),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if attempt >= max_attempts {
                return Err(RepgenError::Fetch {
                    page,
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let delay = self
                .policy
                .delay(attempt, err.retry_after().map(Duration::from_secs));
            self.observer.retrying(page, attempt, delay, &err);
            self.sleeper.sleep(delay);
        }
    }
}
