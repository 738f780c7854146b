use std::sync::Arc;
use std::time::{Duration, Instant};

use airgate_audit::AuditLog;
use airgate_broker::Publisher;
use airgate_client::{FetchError, SensorApi};
use airgate_core::{Clock, Device, EventKind, JobDescriptor};
use airgate_rules::{match_and_format, MatchOutcome};
use chrono::{DateTime, Local};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Fixed delay between failed authentication attempts.
const AUTH_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Named states of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunnerState {
    /// No usable token; the next cycle starts with authentication.
    NeedToken,
    /// A token is held and assumed valid until the API says otherwise.
    TokenOk,
}

/// Token state private to one runner. Never shared, never inspected from
/// outside the job's own worker.
#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    obtained_at: Option<DateTime<Local>>,
}

impl SessionState {
    fn clear(&mut self) {
        self.token = None;
        self.obtained_at = None;
    }
}

/// What a finished cycle asks of the outer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    /// Sleep out the remainder of the poll interval.
    Continue,
    /// The token was rejected mid-cycle; re-authenticate without sleeping.
    Reauth,
    /// Authentication failed; apply the fixed backoff.
    AuthBackoff,
}

/// Owns one account's polling lifecycle: token state, fetch cadence,
/// dispatch through matcher/formatter/publisher, and error recovery.
///
/// The loop tolerates any single-cycle failure indefinitely; it exits only
/// when the shutdown token fires.
pub struct JobRunner {
    job: JobDescriptor,
    api: Arc<dyn SensorApi>,
    publisher: Arc<dyn Publisher>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
    session: SessionState,
}

impl JobRunner {
    pub fn new(
        job: JobDescriptor,
        api: Arc<dyn SensorApi>,
        publisher: Arc<dyn Publisher>,
        audit: Arc<AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            job,
            api,
            publisher,
            audit,
            clock,
            session: SessionState::default(),
        }
    }

    /// Run until `cancel` fires. Cancellation is observed at the sleep
    /// points; an in-flight cycle finishes first.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(job = %self.job.name, interval_s = self.job.poll_interval.as_secs(), "job runner started");
        self.audit
            .append(
                &self.job.name,
                EventKind::JobStarted,
                &format!("polling every {}s", self.job.poll_interval.as_secs()),
            )
            .await;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let cycle_started = Instant::now();
            let pause = match self.cycle().await {
                // The outer interval sleep is skipped so the runner
                // re-authenticates promptly.
                CycleOutcome::Reauth => continue,
                CycleOutcome::AuthBackoff => AUTH_RETRY_DELAY,
                CycleOutcome::Continue => self
                    .job
                    .poll_interval
                    .saturating_sub(cycle_started.elapsed()),
            };

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        self.audit
            .append(&self.job.name, EventKind::JobStopped, "shutdown")
            .await;
        info!(job = %self.job.name, "job runner stopped");
    }

    fn state(&self) -> RunnerState {
        if self.session.token.is_some() {
            RunnerState::TokenOk
        } else {
            RunnerState::NeedToken
        }
    }

    /// One full pass of the state machine: ensure a token, fetch, dispatch.
    async fn cycle(&mut self) -> CycleOutcome {
        if self.state() == RunnerState::NeedToken && !self.acquire_token().await {
            return CycleOutcome::AuthBackoff;
        }
        self.poll_once().await
    }

    /// NEED_TOKEN: exchange credentials for a bearer token.
    async fn acquire_token(&mut self) -> bool {
        let job = &self.job.name;
        self.audit
            .append(
                job,
                EventKind::AuthAttempt,
                &format!("requesting token for {}", self.job.credentials.email),
            )
            .await;

        match self
            .api
            .authenticate(&self.job.credentials.email, &self.job.credentials.password)
            .await
        {
            Ok(token) => {
                debug!(job = %job, "authenticated");
                self.session.token = Some(token);
                self.session.obtained_at = Some(self.clock.now());
                self.audit.append(job, EventKind::AuthOk, "token acquired").await;
                true
            }
            Err(e) => {
                warn!(job = %job, error = %e, "authentication failed");
                self.audit
                    .append(job, EventKind::AuthFailed, &e.to_string())
                    .await;
                false
            }
        }
    }

    /// TOKEN_OK: fetch the device list and dispatch every device.
    async fn poll_once(&mut self) -> CycleOutcome {
        let Some(token) = self.session.token.clone() else {
            // Unreachable by construction; treat as a skipped cycle.
            return CycleOutcome::Continue;
        };
        let job = self.job.name.clone();

        match self.api.fetch_devices(&token).await {
            Ok(devices) => {
                let raw = serde_json::json!({ "data": devices });
                self.audit
                    .append_with_payload(
                        &job,
                        EventKind::FetchOk,
                        &format!("{} device(s)", devices.len()),
                        &raw,
                    )
                    .await;
                for device in &devices {
                    self.dispatch_device(device).await;
                }
                CycleOutcome::Continue
            }
            Err(FetchError::Unauthorized) => {
                info!(job = %job, "token rejected, re-authenticating");
                let details = match self.session.obtained_at {
                    Some(at) => format!(
                        "token from {} rejected by the API, re-authenticating",
                        at.format("%Y-%m-%d %H:%M:%S")
                    ),
                    None => "token rejected by the API, re-authenticating".to_owned(),
                };
                self.session.clear();
                self.audit
                    .append(&job, EventKind::TokenExpired, &details)
                    .await;
                CycleOutcome::Reauth
            }
            Err(e) => {
                warn!(job = %job, error = %e, "device fetch failed");
                self.audit.append(&job, EventKind::FetchFailed, &e.to_string()).await;
                if e.discards_token() {
                    self.session.clear();
                }
                CycleOutcome::Continue
            }
        }
    }

    /// Route one device through the rules and publish every match.
    async fn dispatch_device(&self, device: &Device) {
        let job = &self.job.name;
        let ident = device.ident();

        match match_and_format(device, &self.job.rules, self.clock.now()) {
            MatchOutcome::NoMatch => {
                self.audit
                    .append(job, EventKind::NoData, &format!("{ident}: no rule matched"))
                    .await;
            }
            MatchOutcome::NoData { matched } => {
                self.audit
                    .append(
                        job,
                        EventKind::NoData,
                        &format!("{ident}: {matched} rule(s) matched, no recognized channel"),
                    )
                    .await;
            }
            MatchOutcome::Dispatch {
                payload,
                destinations,
            } => {
                for destination in destinations {
                    match self.publisher.publish(&payload, destination).await {
                        Ok(()) => {
                            debug!(job = %job, destination = %destination, "published");
                            self.audit
                                .append(
                                    job,
                                    EventKind::PublishOk,
                                    &format!("{ident} -> {destination}: {payload}"),
                                )
                                .await;
                        }
                        Err(e) => {
                            warn!(job = %job, destination = %destination, error = %e, "publish failed");
                            self.audit
                                .append(
                                    job,
                                    EventKind::PublishFailed,
                                    &format!("{ident} -> {destination}: {e}"),
                                )
                                .await;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use airgate_client::AuthError;
    use airgate_core::{Credentials, Destination, ManualClock, MatchRule, SensorReading};
    use chrono::TimeZone;

    use super::*;
    use crate::support::{FakeApi, RecordingPublisher};

    fn lobby_device() -> Device {
        let mut device = Device::new("Sensor-A", "SN123");
        device.readings = vec![
            SensorReading::new("PM2.5 (ug/m3)", 12),
            SensorReading::new("Temperature (C)", 25),
        ];
        device
    }

    fn rule(keyword: &str, topic: &str) -> MatchRule {
        MatchRule::new(keyword, Destination::new("broker.example.com", topic))
    }

    struct Fixture {
        api: Arc<FakeApi>,
        publisher: Arc<RecordingPublisher>,
        audit_dir: tempfile::TempDir,
        runner: JobRunner,
    }

    fn fixture(rules: Vec<MatchRule>) -> Fixture {
        let api = Arc::new(FakeApi::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let audit_dir = tempfile::tempdir().unwrap();
        let audit = Arc::new(AuditLog::new(audit_dir.path(), 1000));
        let clock = Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2025, 2, 13, 20, 45, 28).unwrap(),
        ));
        let job = JobDescriptor::new(
            "Lobby",
            Credentials::new("ops@example.com", "secret"),
            rules,
        );
        let runner = JobRunner::new(
            job,
            Arc::clone(&api) as Arc<dyn SensorApi>,
            Arc::clone(&publisher) as Arc<dyn Publisher>,
            audit,
            clock,
        );
        Fixture {
            api,
            publisher,
            audit_dir,
            runner,
        }
    }

    fn audit_lines(fixture: &Fixture) -> Vec<String> {
        std::fs::read_to_string(fixture.audit_dir.path().join("Lobby.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn first_cycle_authenticates_then_fetches_and_publishes() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Ok(vec![lobby_device()]));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::Continue);
        assert_eq!(fx.runner.state(), RunnerState::TokenOk);
        // Auth and fetch happened in the same cycle, no sleep in between.
        assert_eq!(fx.api.auth_calls(), 1);
        assert_eq!(fx.api.fetch_calls(), 1);
        assert_eq!(fx.api.last_token().as_deref(), Some("token-1"));

        let published = fx.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "PM25:12,TEMP:25,DATE:2025-02-13,20:45:28");
        assert_eq!(published[0].1.topic, "site/lobby");
    }

    #[tokio::test]
    async fn unauthorized_fetch_clears_the_token_and_requests_reauth() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Err(FetchError::Unauthorized));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::Reauth);
        assert_eq!(fx.runner.state(), RunnerState::NeedToken);
        assert!(fx.publisher.published().is_empty());

        // The expiry entry lands before any further fetch attempt.
        let lines = audit_lines(&fx);
        let expired = lines
            .iter()
            .position(|l| l.contains("API_TOKEN_EXPIRED"))
            .expect("expiry entry present");
        assert!(!lines[expired + 1..].iter().any(|l| l.contains("FETCH")));

        // Next cycle re-authenticates before fetching again.
        fx.api.push_auth(Ok("token-2".to_owned()));
        fx.api.push_fetch(Ok(vec![]));
        let outcome = fx.runner.cycle().await;
        assert_eq!(outcome, CycleOutcome::Continue);
        assert_eq!(fx.api.auth_calls(), 2);
        assert_eq!(fx.api.last_token().as_deref(), Some("token-2"));
    }

    #[tokio::test]
    async fn auth_failure_backs_off_and_stays_tokenless() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        fx.api.push_auth(Err(AuthError::Status(403)));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::AuthBackoff);
        assert_eq!(fx.runner.state(), RunnerState::NeedToken);
        assert_eq!(fx.api.fetch_calls(), 0);
        assert!(audit_lines(&fx).iter().any(|l| l.contains("AUTH_FAILED")));
    }

    #[tokio::test]
    async fn transient_fetch_failure_keeps_the_token() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Err(FetchError::Transient("timed out".into())));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::Continue);
        assert_eq!(fx.runner.state(), RunnerState::TokenOk);
        assert!(audit_lines(&fx).iter().any(|l| l.contains("FETCH_FAILED")));

        // The next cycle reuses the token without re-authenticating.
        fx.api.push_fetch(Ok(vec![]));
        fx.runner.cycle().await;
        assert_eq!(fx.api.auth_calls(), 1);
    }

    #[tokio::test]
    async fn unexpected_fetch_failure_discards_the_token() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Err(FetchError::Unexpected("status 500".into())));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::Continue);
        assert_eq!(fx.runner.state(), RunnerState::NeedToken);
    }

    #[tokio::test]
    async fn fan_out_publishes_one_payload_to_every_matching_destination() {
        let mut fx = fixture(vec![rule("*", "site/a"), rule("Sensor", "site/b")]);
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Ok(vec![lobby_device()]));

        fx.runner.cycle().await;

        let published = fx.publisher.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, published[1].0);
        assert_eq!(published[0].1.topic, "site/a");
        assert_eq!(published[1].1.topic, "site/b");
    }

    #[tokio::test]
    async fn unformattable_device_blocks_publish_for_that_device_only() {
        let mut fx = fixture(vec![rule("*", "site/lobby")]);
        let mut dark = Device::new("Sensor-B", "SN999");
        dark.readings = vec![SensorReading::new("CO2 (ppm)", 800)];

        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Ok(vec![dark, lobby_device()]));

        fx.runner.cycle().await;

        let published = fx.publisher.published();
        assert_eq!(published.len(), 1);
        assert!(published[0].0.starts_with("PM25:12"));
        assert!(audit_lines(&fx)
            .iter()
            .any(|l| l.contains("NO_DATA") && l.contains("Sensor-B")));
    }

    #[tokio::test]
    async fn publish_failure_does_not_stop_other_destinations() {
        let mut fx = fixture(vec![rule("*", "site/a"), rule("*", "site/b")]);
        fx.publisher.fail_topic("site/a");
        fx.api.push_auth(Ok("token-1".to_owned()));
        fx.api.push_fetch(Ok(vec![lobby_device()]));

        let outcome = fx.runner.cycle().await;

        assert_eq!(outcome, CycleOutcome::Continue);
        // The failed destination is logged; the second still publishes and
        // the token survives.
        assert_eq!(fx.runner.state(), RunnerState::TokenOk);
        let published = fx.publisher.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.topic, "site/b");
        let lines = audit_lines(&fx);
        assert!(lines.iter().any(|l| l.contains("PUBLISH_FAILED") && l.contains("site/a")));
        assert!(lines.iter().any(|l| l.contains("PUBLISH_OK") && l.contains("site/b")));
    }

    #[tokio::test]
    async fn shutdown_during_the_interval_sleep_stops_the_runner() {
        let Fixture {
            api,
            publisher: _,
            audit_dir,
            mut runner,
        } = fixture(vec![rule("*", "site/lobby")]);
        runner.job.poll_interval = Duration::from_secs(3600);
        api.push_auth(Ok("token-1".to_owned()));
        api.push_fetch(Ok(vec![]));

        let cancel = CancellationToken::new();
        let task = tokio::spawn(runner.run(cancel.clone()));

        // Let the first cycle complete and the runner park in its sleep.
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runner exits promptly on shutdown")
            .unwrap();

        let lines = std::fs::read_to_string(audit_dir.path().join("Lobby.log")).unwrap();
        assert!(lines.contains("JOB_STOPPED"));
    }
}
