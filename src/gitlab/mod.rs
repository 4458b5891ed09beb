pub mod client;
pub mod fetch;
pub mod observer;
pub mod retry;

pub use client::GitLabClient;
pub use fetch::{CommitQuery, Cursor, Fetcher, NextHint, Page, PageSource, MAX_PER_PAGE};
pub use observer::{FetchObserver, ProgressObserver, TracingObserver};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
