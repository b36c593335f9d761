//! HTTP client for a Prismic-style content API.
//!
//! Every search needs a `ref` (a content release id). The client resolves the
//! master ref from the API root on first use and reuses it for the lifetime of
//! the client, so one build always reads one consistent snapshot.

use super::{ContentSource, RawDocument, RawPage, SourceError};
use crate::config::SourceConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Page size used when enumerating identifiers (the API maximum).
const LISTING_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl ApiClient {
    /// Create a client for `endpoint` (e.g. `https://repo.cdn.prismic.io/api/v2`).
    ///
    /// Every request, including connection setup, is bounded by `timeout`.
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        // Reject obviously bad endpoints at construction rather than on first use.
        Url::parse(endpoint)?;
        let http = Client::builder()
            .user_agent(concat!("headless-blog/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    pub fn from_config(config: &SourceConfig) -> Result<Self, SourceError> {
        Self::new(
            &config.endpoint,
            config.access_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn master_ref(&self) -> Result<&str, SourceError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let url = self.with_token(Url::parse(&self.endpoint)?);
                let info: ApiInfo = self.get_json(url).await?;
                info.refs
                    .into_iter()
                    .find(|r| r.is_master)
                    .map(|r| r.reference)
                    .ok_or(SourceError::NoMasterRef)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn search(&self, predicate: &str, page_size: u32) -> Result<RawPage, SourceError> {
        let reference = self.master_ref().await?;
        let mut url = Url::parse(&format!("{}/documents/search", self.endpoint))?;
        url.query_pairs_mut()
            .append_pair("ref", reference)
            .append_pair("q", predicate)
            .append_pair("pageSize", &page_size.to_string());
        self.get_json(self.with_token(url)).await
    }

    /// Append the access token unless the URL already carries one.
    fn with_token(&self, mut url: Url) -> Url {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        debug!(url = %redact(&url), "content source request");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: redact(&url),
            });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// URL without its access token, for logs and error messages.
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        clean.set_query(None);
    } else {
        clean.query_pairs_mut().clear().extend_pairs(pairs);
    }
    clean.to_string()
}

fn type_predicate(doc_type: &str) -> String {
    format!(r#"[[at(document.type,"{doc_type}")]]"#)
}

fn uid_predicate(doc_type: &str, id: &str) -> String {
    let id = id.replace('"', r#"\""#);
    format!(r#"[[at(my.{doc_type}.uid,"{id}")]]"#)
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn query_by_type(&self, doc_type: &str, page_size: u32) -> Result<RawPage, SourceError> {
        self.search(&type_predicate(doc_type), page_size).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<RawPage, SourceError> {
        let url = Url::parse(cursor).map_err(|_| SourceError::Cursor(cursor.to_string()))?;
        self.get_json(self.with_token(url)).await
    }

    async fn get_by_identifier(
        &self,
        doc_type: &str,
        id: &str,
    ) -> Result<RawDocument, SourceError> {
        let page = self.search(&uid_predicate(doc_type, id), 1).await?;
        page.results
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_all_identifiers(&self, doc_type: &str) -> Result<Vec<String>, SourceError> {
        let mut page = self.query_by_type(doc_type, LISTING_PAGE_SIZE).await?;
        let mut ids = Vec::new();
        loop {
            ids.extend(
                page.results
                    .iter()
                    .filter_map(RawDocument::identifier)
                    .map(str::to_string),
            );
            match page.next_page.take().filter(|c| !c.is_empty()) {
                Some(cursor) => page = self.fetch_page(&cursor).await?,
                None => break,
            }
        }
        Ok(ids)
    }

    fn name(&self) -> &'static str {
        "api"
    }
}
