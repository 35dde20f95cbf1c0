use super::feed::{filter_candidates, parse_items};
use super::Indexer;
use crate::core::config::TorznabConfig;
use crate::core::error::IndexerError;
use crate::models::candidate::Candidate;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const BODY_HEAD_CHARS: usize = 600;

/// Torznab search client with a pooled HTTP connection
pub struct TorznabClient {
    config: TorznabConfig,
    client: Client,
}

impl TorznabClient {
    pub fn new(config: TorznabConfig) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs_f64(config.request_timeout))
            .build()?;

        Ok(Self { config, client })
    }

    /// Query parameters for both classic Torznab and Jackett v2 endpoints
    pub fn build_params(&self, query: &str, categories: Option<&str>) -> Vec<(String, String)> {
        let mut params = vec![
            ("apikey".to_string(), self.config.apikey.clone()),
            ("t".to_string(), "search".to_string()),
            ("q".to_string(), query.to_string()),
            ("Query".to_string(), query.to_string()),
            ("Title".to_string(), query.to_string()),
        ];

        let categories = categories
            .or(self.config.categories.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if !categories.is_empty() {
            params.push(("cat".to_string(), categories.to_string()));
            let ids = categories.split(',').map(str::trim).filter(|id| !id.is_empty());
            for (idx, id) in ids.enumerate() {
                params.push((format!("Category[{idx}]"), id.to_string()));
            }
        }

        params
    }

    async fn fetch(&self, query: &str, categories: Option<&str>) -> Result<String, IndexerError> {
        let params = self.build_params(query, categories);
        let response = self
            .client
            .get(&self.config.url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.7")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Courtesy delay so aggregators don't rate-limit us
        tokio::time::sleep(Duration::from_secs_f64(self.config.sleep_between_requests)).await;

        if !status.is_success() {
            return Err(IndexerError::HttpStatus {
                status: status.as_u16(),
                body_head: body_head(&body),
            });
        }

        Ok(body)
    }
}

fn body_head(body: &str) -> String {
    body.chars().take(BODY_HEAD_CHARS).collect()
}

#[async_trait]
impl Indexer for TorznabClient {
    async fn search(&self, query: &str, categories: Option<&str>, debug: bool) -> Vec<Candidate> {
        let body = match self.fetch(query, categories).await {
            Ok(body) => body,
            Err(IndexerError::HttpStatus { status, body_head }) => {
                warn!(status, body_head = %body_head, "Torznab returned an error status");
                return Vec::new();
            }
            Err(e) => {
                error!(error = %e, "Torznab request failed");
                return Vec::new();
            }
        };

        let items = match parse_items(&body) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, body_head = %body_head(&body), "Torznab returned non-XML body");
                return Vec::new();
            }
        };

        if items.is_empty() {
            if debug {
                warn!(body_head = %body_head(&body), "Torznab returned zero items");
            } else {
                debug!(body_head = %body_head(&body), "Torznab returned zero items");
            }
        } else if debug {
            info!(raw_items = items.len(), "Torznab raw items");
        }

        let candidates = filter_candidates(items, query);

        if debug {
            info!(query, matches = candidates.len(), "Torznab filtered items");
            for candidate in candidates.iter().take(5) {
                info!(
                    title = candidate.display_title(),
                    seeders = ?candidate.seeders,
                    leechers = ?candidate.leechers,
                    "Torznab match"
                );
            }
        }

        candidates
    }
}
