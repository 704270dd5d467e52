use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::domain::{Counter, MeasurementFailure, MeasurementReport, Target};
use crate::ports::{MeasurementSource, MetricStore};

/// Wait after a failed attempt before trying again
pub const RETRY_BACKOFF: Duration = Duration::from_secs(10);

/// Where the sampling loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerState {
    Idle,
    Sampling,
}

/// Result of one pass through the loop
#[derive(Debug)]
pub enum Outcome {
    Success(MeasurementReport),
    Failure(MeasurementFailure),
}

/// Snapshot of the loop's bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: SamplerState,
    pub attempts: u64,
    pub consecutive_failures: u64,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Sampler bookkeeping shared with the HTTP layer
#[derive(Debug)]
pub struct SamplerStatus {
    inner: RwLock<StatusSnapshot>,
}

impl SamplerStatus {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StatusSnapshot {
                state: SamplerState::Idle,
                attempts: 0,
                consecutive_failures: 0,
                last_attempt: None,
                last_success: None,
                last_error: None,
            }),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        f(&mut inner);
    }
}

impl Default for SamplerStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodically measures one target and republishes the latest result
pub struct Sampler {
    target: Target,
    interval: Duration,
    backoff: Duration,
    source: Arc<dyn MeasurementSource>,
    store: Arc<dyn MetricStore>,
    status: Arc<SamplerStatus>,
}

impl Sampler {
    pub fn new(
        target: Target,
        interval: Duration,
        source: Arc<dyn MeasurementSource>,
        store: Arc<dyn MetricStore>,
    ) -> Self {
        Self {
            target,
            interval,
            backoff: RETRY_BACKOFF,
            source,
            store,
            status: Arc::new(SamplerStatus::new()),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn status(&self) -> Arc<SamplerStatus> {
        Arc::clone(&self.status)
    }

    /// Measure once, update the store, and return how long to wait before the next attempt
    pub async fn sample_once(&self) -> Duration {
        self.status.update(|s| {
            s.state = SamplerState::Sampling;
            s.attempts += 1;
            s.last_attempt = Some(Utc::now());
        });

        let outcome = match self.source.measure(&self.target).await {
            Ok(report) => Outcome::Success(report),
            Err(failure) => Outcome::Failure(failure),
        };

        let delay = self.apply(outcome);
        self.status.update(|s| s.state = SamplerState::Idle);
        delay
    }

    fn apply(&self, outcome: Outcome) -> Duration {
        match outcome {
            Outcome::Success(report) => {
                self.store.publish(&self.target, &report);
                info!(
                    server = %self.target.address,
                    port = self.target.port,
                    sent_bps = report.sent.bits_per_second,
                    received_bps = report.received.bits_per_second,
                    "iperf3 measurement succeeded"
                );
                self.status.update(|s| {
                    s.consecutive_failures = 0;
                    s.last_success = Some(Utc::now());
                    s.last_error = None;
                });
                self.interval
            }
            Outcome::Failure(failure) => {
                error!(
                    server = %self.target.address,
                    port = self.target.port,
                    kind = failure.kind(),
                    "execute iperf3 with error: {}",
                    failure
                );
                self.store.increment(Counter::Errors, &self.target);
                self.store.reset(&self.target);
                self.status.update(|s| {
                    s.consecutive_failures += 1;
                    s.last_error = Some(failure.to_string());
                });
                self.backoff
            }
        }
    }

    /// Sample forever; only process shutdown stops this
    pub async fn run(self) {
        info!(
            "Sampling {} every {} (retry after {} on failure)",
            self.target,
            humantime::format_duration(self.interval),
            humantime::format_duration(self.backoff)
        );

        loop {
            let delay = self.sample_once().await;
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::adapters::PrometheusStore;
    use crate::domain::{DirectionSummary, Gauge};

    /// Hands out canned results in order, then keeps failing
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<MeasurementReport, MeasurementFailure>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<MeasurementReport, MeasurementFailure>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MeasurementSource for ScriptedSource {
        async fn measure(&self, _target: &Target) -> Result<MeasurementReport, MeasurementFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MeasurementFailure::Tool("script exhausted".to_string())))
        }
    }

    fn report(sent: f64, sent_retr: f64, received: f64, received_retr: f64) -> MeasurementReport {
        MeasurementReport::new(
            DirectionSummary::new(sent, sent_retr),
            DirectionSummary::new(received, received_retr),
        )
    }

    fn published(store: &PrometheusStore, target: &Target) -> Vec<Option<f64>> {
        Gauge::ALL.iter().map(|g| store.gauge(*g, target)).collect()
    }

    fn sampler(
        source: Arc<ScriptedSource>,
        store: Arc<PrometheusStore>,
        interval: Duration,
    ) -> Sampler {
        Sampler::new(Target::new("127.0.0.1", 5201), interval, source, store)
    }

    #[tokio::test]
    async fn test_success_publishes_report_values() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![Ok(report(1_000_000.0, 2.0, 950_000.0, 0.0))]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        let delay = sampler.sample_once().await;

        assert_eq!(delay, Duration::from_secs(300));
        assert_eq!(
            published(&store, sampler.target()),
            vec![Some(1_000_000.0), Some(2.0), Some(950_000.0), Some(0.0)]
        );
        assert_eq!(store.count(Counter::Errors, sampler.target()), 0);
    }

    #[tokio::test]
    async fn test_failure_clears_gauges_and_counts() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![
            Ok(report(1_000_000.0, 2.0, 950_000.0, 0.0)),
            Err(MeasurementFailure::ExitStatus { code: 1, message: None }),
        ]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        sampler.sample_once().await;
        let delay = sampler.sample_once().await;

        assert_eq!(delay, RETRY_BACKOFF);
        assert_eq!(published(&store, sampler.target()), vec![None; 4]);
        assert_eq!(store.count(Counter::Errors, sampler.target()), 1);
    }

    #[tokio::test]
    async fn test_every_failure_class_is_handled_the_same() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![
            Err(MeasurementFailure::ExitStatus { code: 1, message: None }),
            Err(MeasurementFailure::Parse("expected value at line 1 column 1".to_string())),
            Err(MeasurementFailure::Tool("unable to connect to server".to_string())),
            Err(MeasurementFailure::Terminated),
        ]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        for expected in 1..=4u64 {
            assert_eq!(sampler.sample_once().await, RETRY_BACKOFF);
            assert_eq!(published(&store, sampler.target()), vec![None; 4]);
            assert_eq!(store.count(Counter::Errors, sampler.target()), expected);
        }

        let status = sampler.status().snapshot();
        assert_eq!(status.consecutive_failures, 4);
        assert_eq!(status.last_error.as_deref(), Some("iperf3 was terminated without an exit code"));
    }

    #[tokio::test]
    async fn test_tool_error_is_recorded_as_reason() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![Err(MeasurementFailure::Tool(
            "unable to connect to server".to_string(),
        ))]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        sampler.sample_once().await;

        let status = sampler.status().snapshot();
        assert_eq!(status.last_error.as_deref(), Some("unable to connect to server"));
        assert_eq!(status.last_success, None);
    }

    #[tokio::test]
    async fn test_second_success_overwrites_first() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![
            Ok(report(1_000_000.0, 2.0, 950_000.0, 0.0)),
            Ok(report(500_000.0, 7.0, 480_000.0, 1.0)),
        ]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        sampler.sample_once().await;
        sampler.sample_once().await;

        assert_eq!(
            published(&store, sampler.target()),
            vec![Some(500_000.0), Some(7.0), Some(480_000.0), Some(1.0)]
        );
    }

    #[tokio::test]
    async fn test_recovery_after_failure_keeps_error_tally() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![
            Err(MeasurementFailure::Tool("unable to connect to server".to_string())),
            Ok(report(10.0, 0.0, 9.0, 0.0)),
        ]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        sampler.sample_once().await;
        sampler.sample_once().await;

        assert_eq!(
            published(&store, sampler.target()),
            vec![Some(10.0), Some(0.0), Some(9.0), Some(0.0)]
        );
        assert_eq!(store.count(Counter::Errors, sampler.target()), 1);

        let status = sampler.status().snapshot();
        assert_eq!(status.attempts, 2);
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(status.last_error, None);
        assert_eq!(status.state, SamplerState::Idle);
        assert!(status.last_success.is_some());
    }

    #[tokio::test]
    async fn test_reads_are_idempotent_between_samples() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![Ok(report(3.0, 1.0, 2.0, 0.0))]);
        let sampler = sampler(source, store.clone(), Duration::from_secs(300));

        sampler.sample_once().await;

        assert_eq!(published(&store, sampler.target()), published(&store, sampler.target()));
        assert_eq!(store.render().unwrap(), store.render().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_after_backoff_not_interval() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![]);
        let sampler = sampler(source.clone(), store.clone(), Duration::from_secs(300));
        let target = sampler.target().clone();

        let handle = tokio::spawn(sampler.run());

        // Attempts at t=0, 10s and 20s
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(store.count(Counter::Errors, &target), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_interval_after_success() {
        let store = Arc::new(PrometheusStore::new().unwrap());
        let source = ScriptedSource::new(vec![Ok(report(1.0, 0.0, 1.0, 0.0))]);
        let sampler = sampler(source.clone(), store.clone(), Duration::from_secs(60));

        let handle = tokio::spawn(sampler.run());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(source.calls(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls(), 2);

        handle.abort();
    }

    #[test]
    fn test_backoff_is_shorter_than_default_interval() {
        assert!(RETRY_BACKOFF < Duration::from_secs(300));
    }
}
