//! Daily commit activity for one author of a GitLab project.
//!
//! The pipeline pages through the commits API (or replays a cached
//! listing), drops merge commits, keeps the commits of one author email,
//! counts them per authored day and fills the days in between with zeros.

pub mod cli;
pub mod config;
pub mod error;
pub mod gitlab;
pub mod logging;
pub mod model;
pub mod series;
pub mod store;
pub mod util;

pub use error::{RepgenError, Result};
pub use model::{Commit, DenseSeries, HistogramEntry, SparseHistogram};
pub use series::{build_report, Report};
pub use store::CommitStore;
