// src/pipeline/cycle.rs

//! One crawl cycle: ranking → details → snapshot → history → persistence.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::error::{AppError, Result};
use crate::models::{Config, Snapshot};
use crate::services::TopicCrawler;
use crate::storage::{PersistReport, SnapshotHistory, SnapshotStorage};
use crate::utils::PageFetcher;

/// Where the pipeline is within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    FetchingTop,
    ExtractingTop,
    FetchingDetails,
    Assembling,
    Stored,
    /// Terminal; no further cycles run
    Stopped,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FetchingTop => "fetching ranking",
            Self::ExtractingTop => "extracting ranking",
            Self::FetchingDetails => "fetching details",
            Self::Assembling => "assembling snapshot",
            Self::Stored => "stored",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Summary of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub key: String,
    pub topic_count: usize,
    pub rows_skipped: usize,
    pub rows_beyond_limit: usize,
    pub detail_failures: usize,
    pub missing_source_time: usize,
    /// Snapshot key pushed out of the history by this cycle
    pub evicted: Option<String>,
    pub persisted: PersistReport,
}

/// Runs crawl cycles and owns the snapshot history.
pub struct TrendPipeline {
    config: Arc<Config>,
    crawler: TopicCrawler,
    storage: Arc<dyn SnapshotStorage>,
    history: SnapshotHistory,
    state: CycleState,
}

impl TrendPipeline {
    /// Build a pipeline; fails on a zero topic limit or history capacity.
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn PageFetcher>,
        storage: Arc<dyn SnapshotStorage>,
    ) -> Result<Self> {
        if config.source.topic_limit == 0 {
            return Err(AppError::config("source.topic_limit must be > 0"));
        }
        let history = SnapshotHistory::new(config.storage.history_capacity)?;

        Ok(Self {
            crawler: TopicCrawler::new(Arc::clone(&config), fetcher),
            config,
            storage,
            history,
            state: CycleState::Idle,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }

    /// Most recently stored snapshot.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.history.latest(1).next().map(|(_, snapshot)| snapshot)
    }

    /// Enter the terminal state.
    pub fn stop(&mut self) {
        self.enter(CycleState::Stopped);
    }

    fn enter(&mut self, state: CycleState) {
        log::debug!("Pipeline: {} -> {}", self.state, state);
        self.state = state;
    }

    /// Run one cycle keyed by the current local time.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.run_cycle_at(Local::now()).await
    }

    /// Run one cycle keyed by `now`.
    ///
    /// A ranking fetch failure aborts the cycle and nothing is stored.
    /// Everything after that degrades per topic.
    pub async fn run_cycle_at(&mut self, now: DateTime<Local>) -> Result<CycleReport> {
        if self.state == CycleState::Stopped {
            return Err(AppError::config("pipeline is stopped"));
        }

        let mut snapshot = Snapshot::at(now);
        log::info!("Cycle {} starting", snapshot.key());

        self.enter(CycleState::FetchingTop);
        let top = match self.crawler.fetch_top_list().await {
            Ok(top) => top,
            Err(e) => {
                log::error!("Cycle {} aborted, ranking fetch failed: {}", snapshot.key(), e);
                self.enter(CycleState::Idle);
                return Err(e);
            }
        };

        self.enter(CycleState::ExtractingTop);
        let rows_skipped = top.skipped.len();
        let rows_beyond_limit = top.beyond_limit;

        self.enter(CycleState::FetchingDetails);
        let details = self.crawler.fetch_details(top.rows).await;

        self.enter(CycleState::Assembling);
        for entry in details.entries {
            snapshot.insert_topic(entry);
        }

        let key = snapshot.key().to_string();
        let topic_count = snapshot.len();
        let evicted = self
            .history
            .put(key.clone(), snapshot)
            .map(|(old_key, _)| old_key);
        if let Some(old) = &evicted {
            log::debug!("History full, evicted snapshot {old}");
        }
        self.enter(CycleState::Stored);

        let persisted = self.persist_latest(self.config.storage.persist_latest).await;
        self.enter(CycleState::Idle);
        let persisted = persisted?;

        let report = CycleReport {
            key,
            topic_count,
            rows_skipped,
            rows_beyond_limit,
            detail_failures: details.failures,
            missing_source_time: details.missing_source_time,
            evicted,
            persisted,
        };
        log::info!(
            "Cycle {} done: {} topics, {} rows skipped, {} detail failures; {}",
            report.key,
            report.topic_count,
            report.rows_skipped,
            report.detail_failures,
            report.persisted.status()
        );
        Ok(report)
    }

    /// Persist the `n` most recent snapshots to the pipeline's storage.
    pub async fn persist_latest(&self, n: usize) -> Result<PersistReport> {
        self.persist_latest_to(self.storage.as_ref(), n).await
    }

    /// Persist the `n` most recent snapshots to `storage`, newest first.
    ///
    /// When fewer than `n` exist, the ones that do are still written and the
    /// report says so.
    pub async fn persist_latest_to(
        &self,
        storage: &dyn SnapshotStorage,
        n: usize,
    ) -> Result<PersistReport> {
        let latest = self.history.latest(n);
        if latest.shortfall() > 0 {
            log::warn!(
                "Asked to persist {} snapshots, only {} stored",
                latest.requested(),
                latest.available()
            );
        }
        let snapshots: Vec<&Snapshot> = latest.map(|(_, snapshot)| snapshot).collect();

        let meta = storage
            .persist(&self.config.source.banner, &snapshots)
            .await?;

        Ok(PersistReport {
            requested: n,
            locations: meta.locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStorage, StubFetcher};
    use chrono::TimeZone;

    fn ranking_page(count: u32) -> String {
        (1..=count)
            .map(|rank| {
                format!(
                    concat!(
                        r#"<td class="td-01 ranktop">{rank}</td><td class="td-02">"#,
                        r#"<a href="/weibo?q=topic{rank}&Refer=top" target="_blank">topic{rank}</a>"#,
                        r#"<span>{num}</span></td><td class="td-03"></td>"#,
                    ),
                    rank = rank,
                    num = rank * 100
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn detail_page(author: &str) -> String {
        format!(
            r#"<p class="txt" node-type="feed_list_content" nick-name="{author}">hello</p><p class="from"><a href="x">now</a></p>"#
        )
    }

    fn config(limit: u32, capacity: usize) -> Config {
        let mut config = Config::default();
        config.source.topic_limit = limit;
        config.storage.history_capacity = capacity;
        config.crawler.request_delay_ms = 0;
        config
    }

    fn fetcher_for(config: &Config, ranks: u32) -> StubFetcher {
        let mut fetcher = StubFetcher::new().with_page(&config.source.url, &ranking_page(ranks));
        for rank in 1..=ranks {
            let name = format!("topic{rank}");
            fetcher = fetcher.with_page(
                &config.source.detail_url(&name),
                &detail_page(&format!("author{rank}")),
            );
        }
        fetcher
    }

    fn at(second: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 17, 12, 0, second).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let config = Arc::new(config(10, 0));
        let result = TrendPipeline::new(
            config,
            Arc::new(StubFetcher::new()),
            Arc::new(MemoryStorage::default()),
        );
        assert!(matches!(result, Err(e) if e.is_config()));
    }

    #[tokio::test]
    async fn test_cycle_limits_topics_and_persists() {
        let config = config(2, 10);
        let fetcher = Arc::new(fetcher_for(&config, 5));
        let storage = Arc::new(MemoryStorage::default());
        let mut pipeline =
            TrendPipeline::new(Arc::new(config), fetcher.clone(), storage.clone()).unwrap();

        let report = pipeline.run_cycle_at(at(0)).await.unwrap();

        assert_eq!(report.key, "20261017-120000");
        assert_eq!(report.topic_count, 2);
        assert_eq!(report.rows_beyond_limit, 3);
        assert_eq!(pipeline.state(), CycleState::Idle);
        assert_eq!(storage.calls(), vec![vec!["20261017-120000".to_string()]]);

        // Ranking plus exactly two detail pages.
        assert_eq!(fetcher.requests().len(), 3);

        let snapshot = pipeline.latest().unwrap();
        let names: Vec<_> = snapshot.topics().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["topic1", "topic2"]);
        assert_eq!(snapshot.topic("topic2").unwrap().post("author2").unwrap().text, "hello");
    }

    #[tokio::test]
    async fn test_ranking_failure_aborts_cycle() {
        let config = config(2, 10);
        let storage = Arc::new(MemoryStorage::default());
        let mut pipeline = TrendPipeline::new(
            Arc::new(config),
            Arc::new(StubFetcher::new()),
            storage.clone(),
        )
        .unwrap();

        assert!(pipeline.run_cycle_at(at(0)).await.is_err());
        assert!(pipeline.history().is_empty());
        assert!(storage.calls().is_empty());
        assert_eq!(pipeline.state(), CycleState::Idle);
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_cycle() {
        let config = config(1, 2);
        let fetcher = Arc::new(fetcher_for(&config, 1));
        let mut pipeline = TrendPipeline::new(
            Arc::new(config),
            fetcher,
            Arc::new(MemoryStorage::default()),
        )
        .unwrap();

        pipeline.run_cycle_at(at(0)).await.unwrap();
        pipeline.run_cycle_at(at(1)).await.unwrap();
        let report = pipeline.run_cycle_at(at(2)).await.unwrap();

        assert_eq!(report.evicted.as_deref(), Some("20261017-120000"));
        assert_eq!(pipeline.history().len(), 2);
    }

    #[tokio::test]
    async fn test_persist_latest_reports_shortfall() {
        let mut config = config(1, 5);
        config.storage.persist_latest = 3;
        let fetcher = Arc::new(fetcher_for(&config, 1));
        let storage = Arc::new(MemoryStorage::default());
        let mut pipeline =
            TrendPipeline::new(Arc::new(config), fetcher, storage.clone()).unwrap();

        pipeline.run_cycle_at(at(0)).await.unwrap();
        let report = pipeline.run_cycle_at(at(5)).await.unwrap();

        assert!(report.persisted.is_short());
        assert_eq!(report.persisted.locations.len(), 2);
        assert_eq!(
            storage.calls().last().unwrap(),
            &vec!["20261017-120005".to_string(), "20261017-120000".to_string()]
        );
    }

    #[tokio::test]
    async fn test_stopped_pipeline_refuses_cycles() {
        let config = config(1, 5);
        let fetcher = Arc::new(fetcher_for(&config, 1));
        let mut pipeline = TrendPipeline::new(
            Arc::new(config),
            fetcher,
            Arc::new(MemoryStorage::default()),
        )
        .unwrap();

        pipeline.stop();

        assert_eq!(pipeline.state(), CycleState::Stopped);
        assert!(pipeline.run_cycle_at(at(0)).await.is_err());
    }
}
