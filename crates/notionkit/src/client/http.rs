//! Blocking HTTP implementation of [`NotionApi`].

use crate::client::NotionApi;
use crate::error::{Error, Result};
use crate::retry::{LogCallback, RetryConfig, with_retry, with_retry_if};
use crate::types::{Database, DatabaseCreateRequest, DatabaseUpdateRequest, Page};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use ureq::Body;
use ureq::http::Response;

/// Public Notion API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";

/// API version sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

const USER_AGENT: &str = concat!("notionkit/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Notion API client over `ureq`.
///
/// The client is immutable after construction and safe to share between
/// threads; each call retries transient failures according to its
/// [`RetryConfig`].
///
/// # Example
///
/// ```no_run
/// use notionkit::{HttpClient, NotionApi};
///
/// let client = HttpClient::new("secret_xyz");
/// let page = client.get_page("98ad959b-2b6a-4774-80ee-00246fb0ea9b").unwrap();
/// println!("{}", page.url);
/// ```
pub struct HttpClient {
    agent: ureq::Agent,
    api_base: String,
    secret: String,
    retry: RetryConfig,
}

impl HttpClient {
    /// Create a client for the public API with the default retry policy.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: DEFAULT_API_BASE.to_string(),
            secret: secret.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Use a different API base (for testing or proxies).
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a different retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the retry policy.
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.secret)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);

        with_retry(&self.retry, Some(&LogCallback), || {
            log::trace!("GET {url}");
            let response = self
                .agent
                .get(&url)
                .header("Authorization", self.bearer())
                .header("Notion-Version", NOTION_VERSION)
                .header("User-Agent", USER_AGENT)
                .call()?;
            decode(response)
        })
    }

    /// POST creates objects, so only a rate-limit rejection is retried: any
    /// other failure may have happened after the object was created.
    fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);

        with_retry_if(&self.retry, Some(&LogCallback), is_rate_limited, || {
            log::trace!("POST {url}");
            let response = self
                .agent
                .post(&url)
                .header("Authorization", self.bearer())
                .header("Notion-Version", NOTION_VERSION)
                .header("User-Agent", USER_AGENT)
                .send_json(body)?;
            decode(response)
        })
    }

    fn patch_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);

        with_retry(&self.retry, Some(&LogCallback), || {
            log::trace!("PATCH {url}");
            let response = self
                .agent
                .patch(&url)
                .header("Authorization", self.bearer())
                .header("Notion-Version", NOTION_VERSION)
                .header("User-Agent", USER_AGENT)
                .send_json(body)?;
            decode(response)
        })
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_base", &self.api_base)
            .field("secret", &"(sensitive)")
            .field("retry", &self.retry)
            .finish()
    }
}

impl NotionApi for HttpClient {
    fn get_page(&self, id: &str) -> Result<Page> {
        self.get_json(&format!("pages/{id}"))
    }

    fn get_database(&self, id: &str) -> Result<Database> {
        self.get_json(&format!("databases/{id}"))
    }

    fn create_database(&self, request: &DatabaseCreateRequest) -> Result<Database> {
        self.post_json("databases", request)
    }

    fn update_database(&self, id: &str, request: &DatabaseUpdateRequest) -> Result<Database> {
        self.patch_json(&format!("databases/{id}"), request)
    }
}

fn is_rate_limited(err: &Error) -> bool {
    matches!(err, Error::RateLimited { .. })
}

/// Turn a response into either the decoded body or a categorized error.
fn decode<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| Error::Network {
            message: e.to_string(),
        })?;

    if !(200..300).contains(&status) {
        return Err(Error::from_response(status, &body, retry_after));
    }

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Parent, PropertySchema, RichText};
    use std::collections::BTreeMap;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const DATABASE_BODY: &str = r#"{
        "object": "database",
        "id": "db-2",
        "created_time": "2024-01-15T09:30:00.000Z",
        "url": "https://www.notion.so/db2",
        "parent": { "type": "page_id", "page_id": "page-1" },
        "title": [],
        "properties": {}
    }"#;

    /// Read one request (headers and body) from the socket.
    fn read_request(stream: &TcpStream) {
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
        let mut body = vec![0; content_length];
        let _ = reader.read_exact(&mut body);
    }

    /// Serve requests forever: the first connection is dropped without a
    /// reply, later ones get a database body.
    fn flaky_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&requests);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                read_request(&stream);
                if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                    continue;
                }
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    DATABASE_BODY.len(),
                    DATABASE_BODY
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (base, requests)
    }

    fn fast_client(base: &str) -> HttpClient {
        HttpClient::new("secret")
            .with_api_base(base)
            .with_retry(RetryConfig::new(3, Duration::from_millis(1), 1.0))
    }

    fn create_request() -> DatabaseCreateRequest {
        let mut properties = BTreeMap::new();
        properties.insert("Name".to_string(), PropertySchema::title());
        DatabaseCreateRequest {
            parent: Parent::page("page-1"),
            title: vec![RichText::text("Title")],
            properties,
            is_inline: false,
        }
    }

    #[test]
    fn test_create_is_not_repeated_after_lost_response() {
        let (base, requests) = flaky_server();

        let result = fast_client(&base).create_database(&create_request());

        assert!(matches!(result, Err(Error::Network { .. })), "{result:?}");
        assert_eq!(requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_get_is_retried_after_lost_response() {
        let (base, requests) = flaky_server();

        let database = fast_client(&base).get_database("db-2").unwrap();

        assert_eq!(database.id, "db-2");
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_only_rate_limits_retry_posts() {
        assert!(is_rate_limited(&Error::RateLimited {
            message: "slow down".to_string(),
            retry_after: None,
        }));
        assert!(!is_rate_limited(&Error::Network {
            message: "connection reset".to_string(),
        }));
        assert!(!is_rate_limited(&Error::Api {
            status: 502,
            code: String::new(),
            message: "bad gateway".to_string(),
        }));
    }

    #[test]
    fn test_default_api_base() {
        let client = HttpClient::new("secret");
        assert_eq!(client.api_base(), "https://api.notion.com/v1");
        assert_eq!(client.retry_config().max_attempts, 3);
    }

    #[test]
    fn test_custom_api_base_trims_slash() {
        let client = HttpClient::new("secret").with_api_base("http://localhost:8080/v1/");
        assert_eq!(client.api_base(), "http://localhost:8080/v1");
        assert_eq!(client.url("/databases/abc"), "http://localhost:8080/v1/databases/abc");
    }

    #[test]
    fn test_url_building() {
        let client = HttpClient::new("secret");
        assert_eq!(client.url("pages/p1"), "https://api.notion.com/v1/pages/p1");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let client = HttpClient::new("secret_do_not_print");
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret_do_not_print"));
        assert!(debug.contains("(sensitive)"));
    }

    #[test]
    fn test_with_retry_override() {
        let client = HttpClient::new("secret").with_retry(RetryConfig::no_retry());
        assert_eq!(client.retry_config().max_attempts, 1);
    }
}
