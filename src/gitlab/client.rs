use super::fetch::{CommitQuery, NextHint, Page, PageSource};
use crate::error::{RepgenError, Result};
use crate::model::Commit;
use chrono::SecondsFormat;
use std::time::Duration;
use tracing::debug;
use url::Url;

const MAX_ERROR_BODY: usize = 200;

/// Blocking client for `GET /projects/:id/repository/commits`.
pub struct GitLabClient {
    agent: ureq::Agent,
    base_url: Url,
    token: String,
}

impl GitLabClient {
    /// `base_url` is the API root, e.g. `https://gitlab.example.com/api/v4`.
    /// `timeout` bounds each request end to end.
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RepgenError::Config(format!("invalid gitlab_url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RepgenError::Config(format!(
                "gitlab_url '{base_url}' cannot carry a path"
            )));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("repgen/", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self {
            agent,
            base_url,
            token: token.into(),
        })
    }

    /// Project paths like `group/project` become a single encoded segment.
    pub fn commits_url(&self, project_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RepgenError::Config(format!("gitlab_url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["projects", project_id, "repository", "commits"]);
        Ok(url)
    }
}

impl PageSource for GitLabClient {
    fn fetch_page(&self, query: &CommitQuery, page: u32) -> Result<Page> {
        let url = self.commits_url(&query.project_id)?;

        let mut request = self
            .agent
            .request_url("GET", &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .query("ref_name", &query.ref_name)
            .query("per_page", &query.per_page.to_string())
            .query("page", &page.to_string());
        if let Some(since) = query.range.since {
            request = request.query("since", &since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(until) = query.range.until {
            request = request.query("until", &until.to_rfc3339_opts(SecondsFormat::Secs, true));
        }

        debug!(url = %url, page, per_page = query.per_page, "requesting commit page");

        match request.call() {
            Ok(response) => parse_page(response),
            Err(ureq::Error::Status(status, response)) => Err(status_error(status, response, query)),
            Err(ureq::Error::Transport(transport)) => Err(RepgenError::Transport(transport.to_string())),
        }
    }
}

fn parse_page(response: ureq::Response) -> Result<Page> {
    let next = next_hint(response.header("x-next-page"));
    let body = response
        .into_string()
        .map_err(|e| RepgenError::Transport(format!("reading response body: {e}")))?;
    let commits: Vec<Commit> = serde_json::from_str(&body)
        .map_err(|e| RepgenError::Protocol(format!("commit page is not a commit array: {e}")))?;
    Ok(Page { commits, next })
}

fn next_hint(header: Option<&str>) -> NextHint {
    match header.map(str::trim) {
        None => NextHint::Unknown,
        Some("") => NextHint::Last,
        Some(value) => value.parse().map(NextHint::Page).unwrap_or(NextHint::Unknown),
    }
}

fn status_error(status: u16, response: ureq::Response, query: &CommitQuery) -> RepgenError {
    let retry_after = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok());
    let message = error_body(response);

    match status {
        401 | 403 => RepgenError::Auth { status, message },
        404 => RepgenError::NotFound(format!(
            "project '{}' ref '{}': {message}",
            query.project_id, query.ref_name
        )),
        429 => RepgenError::RateLimited { message, retry_after },
        500..=599 => RepgenError::Transport(format!("HTTP {status}: {message}")),
        _ => RepgenError::UnexpectedStatus { status, message },
    }
}

fn error_body(response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DateRange;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in headers {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        out.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ));
        out
    }

    /// Answers a single request with `response` and hands back the raw
    /// request head.
    fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (format!("http://{addr}/api/v4"), handle)
    }

    fn client(base: &str) -> GitLabClient {
        GitLabClient::new(base, "s3cret", Duration::from_secs(5)).unwrap()
    }

    const PAGE: &str = r#"[
        {"id":"c1","parent_ids":["p"],"author_email":"dev@example.com",
         "authored_date":"2024-09-20T10:00:00.000+02:00","title":"one"},
        {"id":"c2","parent_ids":["c1","q"],"author_email":"dev@example.com",
         "authored_date":"2024-09-21T10:00:00.000+02:00","title":"merge"}
    ]"#;

    #[test]
    fn builds_encoded_commits_url() {
        let c = client("https://gitlab.example.com/api/v4/");
        assert_eq!(
            c.commits_url("group/sub project").unwrap().as_str(),
            "https://gitlab.example.com/api/v4/projects/group%2Fsub%20project/repository/commits"
        );
        assert_eq!(
            c.commits_url("42").unwrap().as_str(),
            "https://gitlab.example.com/api/v4/projects/42/repository/commits"
        );
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            GitLabClient::new("not a url", "t", Duration::from_secs(1)),
            Err(RepgenError::Config(_))
        ));
        assert!(matches!(
            GitLabClient::new("mailto:dev@example.com", "t", Duration::from_secs(1)),
            Err(RepgenError::Config(_))
        ));
    }

    #[test]
    fn sends_query_and_token_and_parses_page() {
        let (base, server) = serve_once(http_response("200 OK", &[("X-Next-Page", "2")], PAGE));
        let since = "2024-09-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let until = "2024-09-30T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let query = CommitQuery::new("group/proj", "release-1")
            .with_per_page(2)
            .with_range(DateRange::new().with_since(since).with_until(until));

        let page = client(&base).fetch_page(&query, 1).unwrap();
        let request = server.join().unwrap();

        assert_eq!(page.commits.len(), 2);
        assert_eq!(page.next, NextHint::Page(2));
        assert!(page.commits[1].is_merge());

        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /api/v4/projects/group%2Fproj/repository/commits?"));
        assert!(request_line.contains("ref_name=release-1"));
        assert!(request_line.contains("per_page=2"));
        assert!(request_line.contains("page=1"));
        assert!(request_line.contains("since=2024-09-01T00%3A00%3A00Z"));
        assert!(request_line.contains("until=2024-09-30T23%3A59%3A59Z"));
        assert!(request.to_lowercase().contains("authorization: bearer s3cret"));
    }

    #[test]
    fn empty_next_page_header_means_last() {
        let (base, server) = serve_once(http_response("200 OK", &[("X-Next-Page", "")], "[]"));
        let page = client(&base).fetch_page(&CommitQuery::new("1", "main"), 3).unwrap();
        server.join().unwrap();
        assert!(page.commits.is_empty());
        assert_eq!(page.next, NextHint::Last);
    }

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let (base, server) = serve_once(http_response(
            "401 Unauthorized",
            &[],
            r#"{"message":"401 Unauthorized"}"#,
        ));
        let err = client(&base).fetch_page(&CommitQuery::new("1", "main"), 1).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, RepgenError::Auth { status: 401, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_project_maps_to_not_found() {
        let (base, server) = serve_once(http_response(
            "404 Not Found",
            &[],
            r#"{"message":"404 Project Not Found"}"#,
        ));
        let err = client(&base).fetch_page(&CommitQuery::new("9", "main"), 1).unwrap_err();
        server.join().unwrap();
        match err {
            RepgenError::NotFound(msg) => assert!(msg.contains("Project Not Found")),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let (base, server) = serve_once(http_response(
            "429 Too Many Requests",
            &[("Retry-After", "7")],
            "{}",
        ));
        let err = client(&base).fetch_page(&CommitQuery::new("1", "main"), 1).unwrap_err();
        server.join().unwrap();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(7));
    }

    #[test]
    fn server_error_is_transient() {
        let (base, server) = serve_once(http_response("502 Bad Gateway", &[], "upstream down"));
        let err = client(&base).fetch_page(&CommitQuery::new("1", "main"), 1).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, RepgenError::Transport(ref m) if m.contains("502")));
    }

    #[test]
    fn other_client_errors_are_fatal() {
        let (base, server) = serve_once(http_response("400 Bad Request", &[], "bad since"));
        let err = client(&base).fetch_page(&CommitQuery::new("1", "main"), 1).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, RepgenError::UnexpectedStatus { status: 400, .. }));
    }

    #[test]
    fn malformed_body_is_protocol_error() {
        let (base, server) = serve_once(http_response("200 OK", &[], r#"{"commits":[]}"#));
        let err = client(&base).fetch_page(&CommitQuery::new("1", "main"), 1).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, RepgenError::Protocol(_)));
    }

    #[test]
    fn unreachable_host_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = client(&format!("http://{addr}/api/v4"))
            .fetch_page(&CommitQuery::new("1", "main"), 1)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn next_hint_parsing() {
        assert_eq!(next_hint(None), NextHint::Unknown);
        assert_eq!(next_hint(Some(" ")), NextHint::Last);
        assert_eq!(next_hint(Some("4")), NextHint::Page(4));
        assert_eq!(next_hint(Some("abc")), NextHint::Unknown);
    }
}
