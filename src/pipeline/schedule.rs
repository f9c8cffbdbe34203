// src/pipeline/schedule.rs

//! Fixed-interval scheduling of crawl cycles until a cutoff time.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{AppError, Result};
use crate::models::ScheduleConfig;

use super::cycle::TrendPipeline;

/// Cycle period and cutoff, checked to lie in the future.
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: Duration,
    end_time: DateTime<Local>,
}

impl Schedule {
    /// Build a schedule; the end time must be strictly after `now`.
    pub fn new(
        interval: Duration,
        end_time: DateTime<Local>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(AppError::config("schedule interval must be > 0"));
        }
        if end_time <= now {
            return Err(AppError::config(format!(
                "schedule end time {} is not in the future",
                end_time.format("%Y-%m-%d %H:%M:%S")
            )));
        }
        Ok(Self { interval, end_time })
    }

    /// Build a schedule from configuration, relative to the current time.
    pub fn from_config(config: &ScheduleConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.interval_secs),
            config.end_time()?,
            Local::now(),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    /// Time left until the cutoff, zero once it has passed.
    pub fn remaining(&self, now: DateTime<Local>) -> Duration {
        (self.end_time - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Why a schedule ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTime,
    Shutdown,
}

/// Totals for a finished schedule.
#[derive(Debug, Clone)]
pub struct ScheduleSummary {
    pub cycles: usize,
    pub failed: usize,
    pub stopped_by: StopReason,
}

/// Run cycles every `schedule.interval` until the end time or a shutdown request.
///
/// Each cycle is awaited before the next tick is taken, so cycles never
/// overlap; ticks missed during a long cycle are skipped. A shutdown request
/// is honored between cycles; a closed shutdown channel is not one. A failed cycle is logged and the schedule
/// carries on. The pipeline is stopped on return.
pub async fn run_schedule(
    pipeline: &mut TrendPipeline,
    schedule: &Schedule,
    mut shutdown: watch::Receiver<bool>,
) -> ScheduleSummary {
    let deadline = Instant::now() + schedule.remaining(Local::now());
    let mut ticker = tokio::time::interval(schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!(
        "Scheduling a cycle every {}s until {}",
        schedule.interval.as_secs(),
        schedule.end_time.format("%Y-%m-%d %H:%M:%S")
    );

    let mut cycles = 0;
    let mut failed = 0;
    // A dropped sender can no longer request a shutdown.
    let mut listening = true;
    let stopped_by = loop {
        if *shutdown.borrow() {
            break StopReason::Shutdown;
        }

        tokio::select! {
            biased;
            changed = shutdown.changed(), if listening => {
                match changed {
                    Ok(()) if *shutdown.borrow() => break StopReason::Shutdown,
                    Ok(()) => {}
                    Err(_) => listening = false,
                }
                continue;
            }
            _ = tokio::time::sleep_until(deadline) => break StopReason::EndTime,
            _ = ticker.tick() => {}
        }

        if Instant::now() >= deadline {
            break StopReason::EndTime;
        }

        cycles += 1;
        if let Err(e) = pipeline.run_cycle().await {
            failed += 1;
            log::error!("Cycle {} failed: {}", cycles, e);
        }
    };

    pipeline.stop();
    log::info!(
        "Schedule finished ({:?}): {} cycles, {} failed",
        stopped_by,
        cycles,
        failed
    );

    ScheduleSummary {
        cycles,
        failed,
        stopped_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::Config;
    use crate::pipeline::CycleState;
    use crate::testing::{MemoryStorage, StubFetcher};

    fn pipeline(with_ranking: bool) -> (TrendPipeline, Arc<MemoryStorage>) {
        let mut config = Config::default();
        config.crawler.request_delay_ms = 0;
        let fetcher = if with_ranking {
            StubFetcher::new().with_page(&config.source.url, "")
        } else {
            StubFetcher::new()
        };
        let storage = Arc::new(MemoryStorage::default());
        let pipeline =
            TrendPipeline::new(Arc::new(config), Arc::new(fetcher), storage.clone()).unwrap();
        (pipeline, storage)
    }

    fn schedule(interval_secs: u64, end_in_secs: i64) -> Schedule {
        let now = Local::now();
        Schedule::new(
            Duration::from_secs(interval_secs),
            now + chrono::Duration::seconds(end_in_secs),
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_end_time_must_be_in_future() {
        let now = Local::now();
        let past = Schedule::new(Duration::from_secs(10), now - chrono::Duration::seconds(1), now);
        assert!(past.unwrap_err().is_config());

        let same = Schedule::new(Duration::from_secs(10), now, now);
        assert!(same.unwrap_err().is_config());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let now = Local::now();
        let result = Schedule::new(Duration::ZERO, now + chrono::Duration::hours(1), now);
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_from_config_rejects_past_end_time() {
        let config = ScheduleConfig {
            interval_secs: 10,
            end_time: "2019-01-08 20:00:00".into(),
        };
        assert!(Schedule::from_config(&config).unwrap_err().is_config());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_end_time() {
        let (mut pipeline, storage) = pipeline(true);
        let (_tx, rx) = watch::channel(false);

        let summary = run_schedule(&mut pipeline, &schedule(10, 35), rx).await;

        assert_eq!(summary.stopped_by, StopReason::EndTime);
        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.failed, 0);
        assert_eq!(storage.calls().len(), 4);
        assert_eq!(pipeline.state(), CycleState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycles_do_not_stop_schedule() {
        let (mut pipeline, storage) = pipeline(false);
        let (_tx, rx) = watch::channel(false);

        let summary = run_schedule(&mut pipeline, &schedule(10, 25), rx).await;

        assert_eq!(summary.cycles, 3);
        assert_eq!(summary.failed, 3);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_between_cycles() {
        let (mut pipeline, _storage) = pipeline(true);
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(15)).await;
            let _ = tx.send(true);
        });

        let summary = run_schedule(&mut pipeline, &schedule(10, 3600), rx).await;

        assert_eq!(summary.stopped_by, StopReason::Shutdown);
        assert_eq!(summary.cycles, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_shutdown_sender_runs_to_end_time() {
        let (mut pipeline, storage) = pipeline(true);
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let summary = run_schedule(&mut pipeline, &schedule(10, 35), rx).await;

        assert_eq!(summary.stopped_by, StopReason::EndTime);
        assert_eq!(summary.cycles, 4);
        assert_eq!(storage.calls().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_start_runs_nothing() {
        let (mut pipeline, storage) = pipeline(true);
        let (_tx, rx) = watch::channel(true);

        let summary = run_schedule(&mut pipeline, &schedule(10, 3600), rx).await;

        assert_eq!(summary.cycles, 0);
        assert!(storage.calls().is_empty());
    }
}
