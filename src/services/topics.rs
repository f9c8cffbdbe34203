// src/services/topics.rs

//! Trending topic crawler service.
//!
//! Fetches the ranking page, then each retained topic's detail page, using
//! the rules in [`super::patterns`].

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, TopicEntry};
use crate::utils::{PageFetcher, normalize_markup};

use super::extract::{TopListOutcome, TopListRow, TopicDetail, extract_detail, extract_top_list};

/// Summary of the detail stage of one cycle.
#[derive(Debug, Default)]
pub struct DetailOutcome {
    /// Entries in ranking order, with detail content where it could be fetched
    pub entries: Vec<TopicEntry>,
    /// Topics whose detail page could not be fetched
    pub failures: usize,
    /// Posts across all topics whose posting time was missing
    pub missing_source_time: usize,
}

/// Service for crawling the ranking and topic detail pages.
pub struct TopicCrawler {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
}

impl TopicCrawler {
    /// Create a new topic crawler over the given page source.
    pub fn new(config: Arc<Config>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Fetch the ranking page and extract rows within the topic limit.
    ///
    /// A fetch error is returned as-is; it aborts the current cycle.
    pub async fn fetch_top_list(&self) -> Result<TopListOutcome> {
        let url = &self.config.source.url;
        let raw = self.fetcher.fetch(url).await?;
        let outcome = extract_top_list(&normalize_markup(&raw), &self.config.source);
        log::info!(
            "Ranking: {} rows kept, {} beyond limit {}, {} skipped",
            outcome.rows.len(),
            outcome.beyond_limit,
            self.config.source.topic_limit,
            outcome.skipped.len()
        );
        Ok(outcome)
    }

    /// Fetch and extract the detail page of one topic.
    pub async fn fetch_detail(&self, encoded_name: &str) -> Result<TopicDetail> {
        let url = self.config.source.detail_url(encoded_name);
        let raw = self.fetcher.fetch(&url).await?;
        Ok(extract_detail(&normalize_markup(&raw)))
    }

    /// Fill every row with its detail content.
    ///
    /// Detail pages are fetched concurrently; a failed fetch leaves that
    /// topic with an empty summary and no posts. Entries come back in the
    /// order of `rows`, whatever order the fetches finish in.
    pub async fn fetch_details(&self, rows: Vec<TopListRow>) -> DetailOutcome {
        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);
        let concurrency = self.config.crawler.max_concurrent.max(1);

        let mut outcome = DetailOutcome::default();
        let mut finished: Vec<(usize, TopicEntry)> = Vec::with_capacity(rows.len());

        let mut detail_stream = stream::iter(rows.into_iter().enumerate())
            .map(|(position, row)| async move {
                let result = self.fetch_detail(&row.encoded_name).await;
                (position, row.entry, result)
            })
            .buffer_unordered(concurrency);

        while let Some((position, mut entry, result)) = detail_stream.next().await {
            match result {
                Ok(detail) => {
                    outcome.missing_source_time += detail.missing_source_time;
                    log::debug!(
                        "Topic #{} {}: {} posts",
                        entry.rank,
                        entry.name,
                        detail.posts.len()
                    );
                    detail.merge_into(&mut entry);
                }
                Err(error) => {
                    outcome.failures += 1;
                    log::warn!(
                        "Failed to fetch detail for #{} {} ({}): {}",
                        entry.rank,
                        entry.name,
                        entry.url,
                        error
                    );
                }
            }
            finished.push((position, entry));

            if delay.as_millis() > 0 {
                tokio::time::sleep(delay).await;
            }
        }

        finished.sort_by_key(|(position, _)| *position);
        outcome.entries = finished.into_iter().map(|(_, entry)| entry).collect();
        outcome
    }
}
