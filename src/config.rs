use crate::error::{RepgenError, Result};
use crate::gitlab::{CommitQuery, RetryPolicy, MAX_PER_PAGE};
use crate::model::DateRange;
use crate::series::ChartOptions;
use crate::util::{parse_bound, parse_day};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the API access token.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Report settings read from the YAML file given with `--config`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub gitlab_url: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub project_id: String,
    #[serde(default = "default_ref_name")]
    pub ref_name: String,
    #[serde(default = "default_output_json")]
    pub output_json: PathBuf,
    #[serde(default)]
    pub author_email: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub author: Option<String>,

    pub x_lim_start: Option<String>,
    pub x_lim_end: Option<String>,
    pub y_lim_top: Option<u32>,
    pub y_lim_bottom: Option<u32>,
    pub marker_left: Option<String>,
    pub marker_right: Option<String>,

    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub timeout: Option<String>,
    pub max_attempts: Option<u32>,
    pub backoff_base: Option<String>,
    pub backoff_max: Option<String>,
    pub jitter: Option<String>,
}

fn default_ref_name() -> String {
    "main".to_string()
}

fn default_output_json() -> PathBuf {
    PathBuf::from("commits.json")
}

fn default_per_page() -> u32 {
    MAX_PER_PAGE
}

/// Project ids are often written as bare numbers in YAML.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

impl ReportConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            RepgenError::Config(format!("cannot read configuration file {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: ReportConfig = serde_yaml::from_str(text)
            .map_err(|e| RepgenError::Config(format!("invalid YAML configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("gitlab_url", &self.gitlab_url),
            ("project_id", &self.project_id),
            ("author_email", &self.author_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key)
        .collect();
        if !missing.is_empty() {
            return Err(RepgenError::Config(format!(
                "missing required key(s): {}",
                missing.join(", ")
            )));
        }

        if self.ref_name.trim().is_empty() {
            return Err(RepgenError::Config("ref_name must not be empty".to_string()));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(RepgenError::Config(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }

        self.date_range()?;
        self.chart_options()?;
        self.retry_policy()?;
        self.request_timeout()?;
        Ok(())
    }

    pub fn date_range(&self) -> Result<DateRange> {
        let since = self.since.as_deref().map(|s| parse_bound(s, false)).transpose()?;
        let until = self.until.as_deref().map(|s| parse_bound(s, true)).transpose()?;

        if let (Some(s), Some(u)) = (since, until) {
            if s > u {
                return Err(RepgenError::InvalidDate(format!(
                    "since ({s}) is after until ({u})"
                )));
            }
        }

        let mut range = DateRange::new();
        if let Some(s) = since {
            range = range.with_since(s);
        }
        if let Some(u) = until {
            range = range.with_until(u);
        }
        Ok(range)
    }

    pub fn query(&self) -> Result<CommitQuery> {
        Ok(CommitQuery::new(&self.project_id, &self.ref_name)
            .with_per_page(self.per_page)
            .with_range(self.date_range()?))
    }

    pub fn chart_options(&self) -> Result<ChartOptions> {
        let day = |value: &Option<String>| value.as_deref().map(parse_day).transpose();
        let options = ChartOptions {
            x_start: day(&self.x_lim_start)?,
            x_end: day(&self.x_lim_end)?,
            y_top: self.y_lim_top,
            y_bottom: self.y_lim_bottom,
            marker_left: day(&self.marker_left)?,
            marker_right: day(&self.marker_right)?,
        };

        if let (Some(start), Some(end)) = (options.x_start, options.x_end) {
            if start > end {
                return Err(RepgenError::invalid_range(start, end));
            }
        }
        if let (Some(left), Some(right)) = (options.marker_left, options.marker_right) {
            if left > right {
                return Err(RepgenError::invalid_range(left, right));
            }
        }
        if let (Some(bottom), Some(top)) = (options.y_bottom, options.y_top) {
            if bottom > top {
                return Err(RepgenError::Config(format!(
                    "y_lim_bottom ({bottom}) is above y_lim_top ({top})"
                )));
            }
        }
        Ok(options)
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        let defaults = RetryPolicy::default();
        let policy = RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: duration_or("backoff_base", &self.backoff_base, defaults.base_delay)?,
            max_delay: duration_or("backoff_max", &self.backoff_max, defaults.max_delay)?,
            jitter: duration_or("jitter", &self.jitter, defaults.jitter)?,
        };
        if policy.max_attempts == 0 {
            return Err(RepgenError::Config("max_attempts must be at least 1".to_string()));
        }
        Ok(policy)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        let timeout = duration_or("timeout", &self.timeout, Duration::from_secs(30))?;
        if timeout.is_zero() {
            return Err(RepgenError::Config("timeout must be greater than zero".to_string()));
        }
        Ok(timeout)
    }
}

fn duration_or(key: &str, value: &Option<String>, default: Duration) -> Result<Duration> {
    match value.as_deref() {
        None => Ok(default),
        Some(text) => humantime::parse_duration(text.trim())
            .map_err(|e| RepgenError::Config(format!("{key}: '{text}' is not a duration: {e}"))),
    }
}
