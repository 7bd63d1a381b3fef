// src/collect/stackoverflow.rs
// Polls recent StackOverflow questions for one tag via the StackExchange API.
// Bodies come back as HTML (filter=withbody); the shared normalizer strips
// them down to plain text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::collect::{compose_text, Collector};
use crate::error::CollectorError;
use crate::model::{RawFeedbackItem, Source};

const QUESTIONS_URL: &str = "https://api.stackexchange.com/2.3/questions";

pub struct StackOverflowCollector {
    http: reqwest::Client,
    tag: String,
    /// Only questions newer than this many hours are requested.
    window_hours: u64,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct QuestionPage {
    items: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct Question {
    question_id: u64,
    link: String,
    title: String,
    #[serde(default)]
    body: Option<String>,
    creation_date: i64,
}

impl StackOverflowCollector {
    pub fn new(tag: impl Into<String>, window_hours: u64, page_size: u32) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("community-insights/0.1")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            http,
            tag: tag.into(),
            window_hours,
            page_size,
        }
    }

    fn parse_payload(body: &str) -> Result<Vec<RawFeedbackItem>, CollectorError> {
        let page: QuestionPage = serde_json::from_str(body)?;
        let items = page
            .items
            .into_iter()
            .map(|q| RawFeedbackItem {
                id: format!("so-{}", q.question_id),
                source: Source::StackOverflow,
                url: q.link,
                text: compose_text(&q.title, q.body.as_deref()),
                created_at: DateTime::<Utc>::from_timestamp(q.creation_date, 0)
                    .unwrap_or_else(Utc::now),
            })
            .collect();
        Ok(items)
    }
}

#[async_trait]
impl Collector for StackOverflowCollector {
    async fn fetch_items(&self) -> Result<Vec<RawFeedbackItem>, CollectorError> {
        // 3600 seconds per hour; the window bounds fromdate, newest first.
        let from_date = Utc::now().timestamp().max(0) as u64 - self.window_hours * 3600;
        let body = self
            .http
            .get(QUESTIONS_URL)
            .query(&[
                ("site", "stackoverflow".to_string()),
                ("tagged", self.tag.clone()),
                ("sort", "creation".to_string()),
                ("order", "desc".to_string()),
                ("fromdate", from_date.to_string()),
                ("pagesize", self.page_size.to_string()),
                ("filter", "withbody".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Self::parse_payload(&body)
    }

    fn name(&self) -> &'static str {
        "stackoverflow"
    }
}
