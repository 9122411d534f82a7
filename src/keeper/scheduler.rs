// Keeper Scheduler - drives the four independent triggers
//
// - Scan: every CHECK_INTERVAL, each firing spawned so an overrunning scan
//   overlaps the next one (the processing guard turns that one into a no-op)
// - Retry drain: every RETRY_INTERVAL
// - Balance check: every BALANCE_CHECK_INTERVAL
// - Pattern analysis: once per day at ANALYSIS_HOUR UTC
//
// Nothing that happens inside a tick stops the schedule.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::config::ScheduleConfig;
use crate::keeper::scanner::{ScanOutcome, Scanner};
use crate::keeper::Keeper;

pub struct KeeperScheduler {
    config: ScheduleConfig,
    keeper: Arc<Keeper>,
}

impl KeeperScheduler {
    pub fn new(config: ScheduleConfig, keeper: Arc<Keeper>) -> Self {
        Self { config, keeper }
    }

    /// Start every schedule in the background
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let scan = {
            let scanner = self.keeper.scanner.clone();
            let period = self.config.scan_interval;
            tokio::spawn(async move { Self::run_scan_scheduler(period, scanner).await })
        };

        let retry = {
            let keeper = self.keeper.clone();
            let period = self.config.retry_interval;
            tokio::spawn(async move {
                let mut ticker = Self::ticker(period);
                loop {
                    ticker.tick().await;
                    keeper.retry_drain.drain().await;
                }
            })
        };

        let balance = {
            let keeper = self.keeper.clone();
            let period = self.config.balance_check_interval;
            tokio::spawn(async move {
                let mut ticker = Self::ticker(period);
                loop {
                    ticker.tick().await;
                    if let Err(e) = keeper.balance_monitor.check().await {
                        error!("❌ Balance check abandoned: {}", e);
                    }
                }
            })
        };

        let analysis = {
            let keeper = self.keeper.clone();
            let hour = self.config.analysis_hour;
            tokio::spawn(async move { Self::run_daily_analysis(hour, keeper).await })
        };

        info!(
            "⏰ Schedules started: scan every {}s, retries every {}s, balance every {}s, analysis daily at {:02}:00 UTC",
            self.config.scan_interval.as_secs(),
            self.config.retry_interval.as_secs(),
            self.config.balance_check_interval.as_secs(),
            self.config.analysis_hour
        );

        vec![scan, retry, balance, analysis]
    }

    fn ticker(period: Duration) -> tokio::time::Interval {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    async fn run_scan_scheduler(period: Duration, scanner: Arc<Scanner>) {
        let mut ticker = Self::ticker(period);

        loop {
            ticker.tick().await;

            let scanner = scanner.clone();
            tokio::spawn(async move { Self::scan_tick(&scanner).await });
        }
    }

    /// One scan firing; errors end here
    pub async fn scan_tick(scanner: &Scanner) {
        match scanner.scan().await {
            Ok(ScanOutcome::Skipped) => debug!("Scan tick skipped"),
            Ok(ScanOutcome::Completed(_)) => {}
            Err(e) => error!("❌ Payment scan failed: {}", e),
        }
    }

    async fn run_daily_analysis(execution_hour: u32, keeper: Arc<Keeper>) {
        let mut previous: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            let next_execution = Self::next_analysis_run(now, execution_hour, previous);
            let wait = Self::wait_until(now, next_execution);

            debug!(
                "Next pattern analysis scheduled for {} UTC",
                next_execution.format("%Y-%m-%d %H:%M:%S")
            );
            tokio::time::sleep(wait).await;

            if let Err(e) = keeper.analyzer.analyze().await {
                error!("❌ Pattern analysis failed: {}", e);
            }
            previous = Some(next_execution);
        }
    }

    /// Next analysis slot, always strictly after the slot that already ran
    fn next_analysis_run(
        now: DateTime<Utc>,
        execution_hour: u32,
        previous: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        let from = previous.map_or(now, |slot| slot.max(now));
        Self::calculate_next_daily_execution(from, execution_hour)
    }

    /// Full remaining time, sub-second part included
    fn wait_until(now: DateTime<Utc>, target: DateTime<Utc>) -> Duration {
        target
            .signed_duration_since(now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Calculate next daily execution time
    fn calculate_next_daily_execution(now: DateTime<Utc>, execution_hour: u32) -> DateTime<Utc> {
        let at = NaiveTime::from_hms_opt(execution_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));

        // If execution time has passed today, schedule for tomorrow
        if today <= now {
            today + chrono::Duration::days(1)
        } else {
            today
        }
    }
}
