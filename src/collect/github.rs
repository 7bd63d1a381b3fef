// src/collect/github.rs
// Polls open issues of one GitHub repository via the REST API. Unauthenticated
// requests work but are rate-limited hard; set GITHUB_TOKEN for real use.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::collect::{compose_text, Collector};
use crate::error::CollectorError;
use crate::model::{RawFeedbackItem, Source};

pub struct GitHubCollector {
    http: reqwest::Client,
    owner: String,
    repo: String,
    per_page: u32,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    id: u64,
    html_url: String,
    title: String,
    body: Option<String>,
    created_at: DateTime<Utc>,
    // The issues endpoint also returns pull requests; they carry this key.
    pull_request: Option<serde_json::Value>,
}

impl GitHubCollector {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, per_page: u32) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("community-insights/0.1")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            owner: owner.into(),
            repo: repo.into(),
            per_page,
            token: std::env::var("GITHUB_TOKEN").ok(),
        }
    }

    fn parse_payload(body: &str) -> Result<Vec<RawFeedbackItem>, CollectorError> {
        let issues: Vec<Issue> = serde_json::from_str(body)?;
        let items = issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| RawFeedbackItem {
                id: format!("gh-{}", i.id),
                source: Source::GitHub,
                url: i.html_url,
                text: compose_text(&i.title, i.body.as_deref()),
                created_at: i.created_at,
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl Collector for GitHubCollector {
    async fn fetch_items(&self) -> Result<Vec<RawFeedbackItem>, CollectorError> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/issues",
            self.owner, self.repo
        );
        let mut req = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("state", "open".to_string()),
                ("per_page", self.per_page.to_string()),
            ]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let body = req.send().await?.error_for_status()?.text().await?;
        Self::parse_payload(&body)
    }

    fn name(&self) -> &'static str {
        "github"
    }
}
