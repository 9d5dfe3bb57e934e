//! HTTP client for the crawler's control surface.

mod error;

pub use error::{RemoteError, RemoteResult};

use crate::model::{
    ConfigKind, ControlReply, ImportReply, MonitorConfig, ResultsSummary, StatusSnapshot,
};
use anyhow::{Context, Result};
use bytes::Bytes;
use reqwest::{StatusCode, Url};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;

const STATUS_PATH: &str = "/scraper_status";
const START_PATH: &str = "/start_scrape";
const STOP_PATH: &str = "/stop_scrape";
const SEARCH_PATH: &str = "/search_articles";

/// Stateless wrapper over the crawler endpoints. Cheap to clone; clones share one pool.
#[derive(Debug, Clone)]
pub struct RemoteJobClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteJobClient {
    pub fn new(cfg: &MonitorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout)
            // The add endpoints answer with a redirect to the index page.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_status(&self) -> RemoteResult<StatusSnapshot> {
        let resp = self.http.get(self.url(STATUS_PATH)).send().await?;
        let code = resp.status();
        let body = resp.bytes().await?;
        if !code.is_success() {
            return Err(RemoteError::Remote {
                message: format!("status endpoint returned HTTP {}", code.as_u16()),
            });
        }
        decode(STATUS_PATH, &body)
    }

    /// Ask the crawler to start. Only HTTP 202 counts as accepted.
    pub async fn start_job(&self) -> RemoteResult<ControlReply> {
        let resp = self.http.post(self.url(START_PATH)).send().await?;
        let code = resp.status();
        let body = resp.bytes().await?;
        if code != StatusCode::ACCEPTED {
            let message = decode::<ControlReply>(START_PATH, &body)
                .map(|r| r.status)
                .unwrap_or_else(|_| http_reason(code));
            return Err(RemoteError::Acceptance {
                code: code.as_u16(),
                message,
            });
        }
        decode(START_PATH, &body)
    }

    /// Ask the crawler to stop. Any answer counts as an acknowledgment; whether the job
    /// actually stopped is observed by polling.
    pub async fn stop_job(&self) -> RemoteResult<ControlReply> {
        let resp = self.http.post(self.url(STOP_PATH)).send().await?;
        let code = resp.status();
        let body = resp.bytes().await?;
        Ok(
            decode::<ControlReply>(STOP_PATH, &body).unwrap_or_else(|_| ControlReply {
                status: format!("Stop requested (HTTP {})", code.as_u16()),
            }),
        )
    }

    pub async fn import_config(
        &self,
        kind: ConfigKind,
        file_name: String,
        contents: Vec<u8>,
    ) -> RemoteResult<ImportReply> {
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name)
            .mime_str("text/plain")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(self.url(kind.import_path()))
            .multipart(form)
            .send()
            .await?;
        // Rejections (400/500) use the same {success, status} body.
        let body = resp.bytes().await?;
        decode(kind.import_path(), &body)
    }

    /// Append one entry to the list for `kind`. The server answers with a redirect on
    /// success; blank entries are ignored on its side.
    pub async fn add_entry(&self, kind: ConfigKind, value: &str) -> RemoteResult<()> {
        let resp = self
            .http
            .post(self.url(kind.add_path()))
            .form(&[(kind.add_field(), value)])
            .send()
            .await?;
        let code = resp.status();
        if code.is_success() || code.is_redirection() {
            return Ok(());
        }
        Err(RemoteError::Remote {
            message: format!("{} returned {}", kind.add_path(), http_reason(code)),
        })
    }

    /// Download the exportable file for `kind`. A non-success answer carries a `{status}`
    /// body explaining why.
    pub async fn export_config(&self, kind: ConfigKind) -> RemoteResult<Bytes> {
        let resp = self.http.get(self.url(kind.export_path())).send().await?;
        let code = resp.status();
        let body = resp.bytes().await?;
        if code.is_success() {
            return Ok(body);
        }
        let reply: ControlReply = decode(kind.export_path(), &body)?;
        Err(RemoteError::Remote {
            message: reply.status,
        })
    }

    /// Run the results search. `query` holds `key=value` pairs joined by `&`; they are
    /// percent-encoded here.
    pub async fn search_results(&self, query: Option<&str>) -> RemoteResult<ResultsSummary> {
        let mut url = Url::parse(&self.url(SEARCH_PATH))
            .map_err(|e| RemoteError::protocol(SEARCH_PATH, e))?;
        let pairs: Vec<(&str, &str)> = query
            .unwrap_or_default()
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .collect();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let resp = self.http.get(url.clone()).send().await?;
        let code = resp.status();
        let body = resp.bytes().await?;
        if !code.is_success() {
            return Err(RemoteError::Remote {
                message: format!("results query returned HTTP {}", code.as_u16()),
            });
        }
        Ok(ResultsSummary {
            url: url.to_string(),
            bytes: body.len(),
            titles: article_titles(&String::from_utf8_lossy(&body)),
        })
    }
}

/// Titles of the articles rendered in the results container.
fn article_titles(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let Ok(sel) = Selector::parse("#articles_container h3, #articles_container h2") else {
        return Vec::new();
    };
    doc.select(&sel)
        .map(|node| {
            node.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty())
        .collect()
}

fn decode<T: DeserializeOwned>(endpoint: &'static str, body: &[u8]) -> RemoteResult<T> {
    serde_json::from_slice(body).map_err(|e| RemoteError::protocol(endpoint, e))
}

fn http_reason(code: StatusCode) -> String {
    match code.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", code.as_u16(), reason),
        None => format!("HTTP {}", code.as_u16()),
    }
}
