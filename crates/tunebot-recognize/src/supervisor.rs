// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle of the external recognition process.
//!
//! The supervisor owns at most one child process. `start` spawns it and
//! gates readiness on `GET /health`; `recognize` proxies one request while
//! the service is ready; `stop` terminates it gracefully and always leaves
//! the supervisor `Stopped`.

use std::process::Stdio;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use strum::Display;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tunebot_core::{HealthStatus, RecognitionSession, TunebotError};

use crate::protocol::decode_response;
use crate::settings::RecognitionSettings;

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupervisorState {
    Stopped,
    Starting,
    Ready,
    Stopping,
    Failed,
}

/// Runs and proxies the recognition service.
///
/// `state` is only ever locked for a read or a write of the value, so it can
/// be observed while a start or stop is in progress. `process` serializes
/// `start` and `stop`; `requests` lets `stop` wait for in-flight requests.
pub struct RecognitionSupervisor {
    settings: RecognitionSettings,
    client: reqwest::Client,
    state: StdMutex<SupervisorState>,
    process: Mutex<Option<Child>>,
    requests: RwLock<()>,
}

impl RecognitionSupervisor {
    pub fn new(settings: RecognitionSettings) -> Result<Self, TunebotError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TunebotError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            settings,
            client,
            state: StdMutex::new(SupervisorState::Stopped),
            process: Mutex::new(None),
            requests: RwLock::new(()),
        })
    }

    pub fn settings(&self) -> &RecognitionSettings {
        &self.settings
    }

    /// Current lifecycle state. Never waits for a start or stop in progress.
    pub fn state(&self) -> SupervisorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SupervisorState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn ensure_ready(&self) -> Result<(), TunebotError> {
        match self.state() {
            SupervisorState::Ready => Ok(()),
            other => Err(TunebotError::State(format!("recognition service is {other}"))),
        }
    }

    /// Spawns the service and waits until it reports healthy.
    ///
    /// Returns immediately when already `Ready`. On startup timeout,
    /// cancellation, or early exit the child is killed and the supervisor
    /// enters `Failed`.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), TunebotError> {
        let started = Instant::now();
        let mut process = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled("recognition startup", started)),
            guard = self.process.lock() => guard,
        };
        if self.state() == SupervisorState::Ready {
            return Ok(());
        }

        if !self.settings.working_dir.is_dir() {
            self.set_state(SupervisorState::Failed);
            return Err(TunebotError::Config(format!(
                "recognition working directory {} does not exist",
                self.settings.working_dir.display()
            )));
        }

        let mut child = match Command::new(&self.settings.program)
            .args(&self.settings.args)
            .current_dir(&self.settings.working_dir)
            .envs(&self.settings.env)
            .env("PORT", self.settings.port.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                self.set_state(SupervisorState::Failed);
                return Err(TunebotError::Transport {
                    message: format!(
                        "failed to spawn recognition service `{}`: {e}",
                        self.settings.program
                    ),
                    status: None,
                    source: Some(Box::new(e)),
                });
            }
        };

        self.set_state(SupervisorState::Starting);
        info!(pid = ?child.id(), program = %self.settings.program, "recognition service spawned");

        match self.wait_until_ready(&mut child, cancel).await {
            Ok(()) => {
                *process = Some(child);
                self.set_state(SupervisorState::Ready);
                info!("recognition service ready");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "recognition service failed to start");
                force_kill(&mut child).await;
                self.set_state(SupervisorState::Failed);
                Err(e)
            }
        }
    }

    async fn wait_until_ready(
        &self,
        child: &mut Child,
        cancel: &CancellationToken,
    ) -> Result<(), TunebotError> {
        let started = Instant::now();
        let deadline = started + self.settings.startup_timeout;
        let mut ticker = tokio::time::interval(self.settings.health_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(cancelled("recognition startup", started));
                }
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(TunebotError::Timeout {
                        operation: "recognition startup".to_string(),
                        duration: self.settings.startup_timeout,
                    });
                }
                ready = self.poll_ready(child, &mut ticker) => {
                    if ready? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Waits for the next tick, then checks the process and its health.
    async fn poll_ready(&self, child: &mut Child, ticker: &mut Interval) -> Result<bool, TunebotError> {
        ticker.tick().await;
        let exited = child.try_wait().map_err(|e| TunebotError::Transport {
            message: format!("failed to poll recognition service: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;
        if let Some(status) = exited {
            return Err(TunebotError::transport(format!(
                "recognition service exited during startup ({status})"
            )));
        }
        Ok(self.poll_health().await == HealthStatus::Healthy)
    }

    async fn poll_health(&self) -> HealthStatus {
        let url = format!("{}/health", self.settings.base_url);
        let timeout = self.settings.health_interval.max(Duration::from_millis(100));
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::Healthy,
            Ok(response) => HealthStatus::Degraded(format!("health returned {}", response.status())),
            Err(e) => HealthStatus::Unhealthy(format!("health check failed: {e}")),
        }
    }

    /// Reports the service health without changing state.
    pub async fn health_check(&self) -> HealthStatus {
        let state = self.state();
        if state != SupervisorState::Ready {
            return HealthStatus::Unhealthy(format!("recognition service is {state}"));
        }
        self.poll_health().await
    }

    /// Sends `audio` to the service and decodes the first result.
    ///
    /// Fails with `State` unless the service is `Ready`; no request is made
    /// in that case.
    pub async fn recognize(
        &self,
        audio: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<RecognitionSession, TunebotError> {
        self.ensure_ready()?;

        let started = Instant::now();
        let _request = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled("recognition request", started)),
            guard = self.requests.read() => guard,
        };
        // A stop may have begun while waiting for the guard.
        self.ensure_ready()?;

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(cancelled("recognition request", started)),
            body = self.exchange(audio) => body?,
        };

        let session = decode_response(&body, &self.settings.result_platform)?;
        debug!(platform = %session.platform, track_id = %session.track_id, "audio recognized");
        Ok(session)
    }

    async fn exchange(&self, audio: Vec<u8>) -> Result<Vec<u8>, TunebotError> {
        let url = format!("{}/recognize", self.settings.base_url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .timeout(self.settings.request_timeout)
            .body(audio)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TunebotError::Transport {
                message: format!("recognition service returned {status}: {}", body.trim()),
                status: Some(status.as_u16()),
                source: None,
            });
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        Ok(body.to_vec())
    }

    fn request_error(&self, e: reqwest::Error) -> TunebotError {
        if e.is_timeout() {
            return TunebotError::Timeout {
                operation: "recognition request".to_string(),
                duration: self.settings.request_timeout,
            };
        }
        TunebotError::Transport {
            message: format!("recognition request failed: {e}"),
            status: e.status().map(|s| s.as_u16()),
            source: Some(Box::new(e)),
        }
    }

    /// Terminates the service, waiting up to `stop_grace` before killing it.
    ///
    /// A no-op when nothing runs. New requests fail with `State` as soon as
    /// the stop begins; in-flight requests finish first. Always leaves the
    /// supervisor `Stopped` once it holds the process; cancellation
    /// force-kills and returns `Timeout`.
    pub async fn stop(&self, cancel: &CancellationToken) -> Result<(), TunebotError> {
        let started = Instant::now();
        let mut process = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled("recognition shutdown", started)),
            guard = self.process.lock() => guard,
        };
        let Some(mut child) = process.take() else {
            self.set_state(SupervisorState::Stopped);
            return Ok(());
        };
        self.set_state(SupervisorState::Stopping);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                force_kill(&mut child).await;
                Err(cancelled("recognition shutdown", started))
            }
            _ = self.graceful_stop(&mut child) => Ok(()),
        };

        self.set_state(SupervisorState::Stopped);
        result
    }

    /// Waits for in-flight requests, then sends SIGTERM and waits out the grace.
    async fn graceful_stop(&self, child: &mut Child) {
        let _drained = self.requests.write().await;
        terminate(child);
        match tokio::time::timeout(self.settings.stop_grace, child.wait()).await {
            Ok(Ok(status)) => info!(%status, "recognition service stopped"),
            Ok(Err(e)) => warn!(error = %e, "failed to wait for recognition service"),
            Err(_) => {
                warn!(grace = ?self.settings.stop_grace, "recognition service ignored SIGTERM, killing");
                force_kill(child).await;
            }
        }
    }
}

fn cancelled(operation: &str, started: Instant) -> TunebotError {
    TunebotError::Timeout {
        operation: format!("{operation} (cancelled)"),
        duration: started.elapsed(),
    }
}

/// Asks the child to exit.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: sending a signal has no memory-safety preconditions; the pid
    // belongs to a child we have not yet reaped.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        debug!(pid, "SIGTERM delivery failed");
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "kill delivery failed");
    }
}

async fn force_kill(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "recognition service already exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(dir: &std::path::Path) -> RecognitionSettings {
        RecognitionSettings {
            program: "sleep".into(),
            args: vec!["30".into()],
            working_dir: dir.to_path_buf(),
            env: Default::default(),
            port: 1,
            base_url: "http://127.0.0.1:1".into(),
            health_interval: Duration::from_millis(20),
            startup_timeout: Duration::from_millis(200),
            stop_grace: Duration::from_millis(200),
            request_timeout: Duration::from_secs(1),
            result_platform: "netease".into(),
        }
    }

    #[tokio::test]
    async fn stop_when_stopped_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = RecognitionSupervisor::new(settings(dir.path())).unwrap();
        supervisor.stop(&CancellationToken::new()).await.unwrap();
        assert_eq!(supervisor.state(), SupervisorState::Stopped);
    }

    #[tokio::test]
    async fn missing_working_dir_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path());
        s.working_dir = dir.path().join("missing");
        let supervisor = RecognitionSupervisor::new(s).unwrap();
        let err = supervisor.start(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, TunebotError::Config(_)));
        assert_eq!(supervisor.state(), SupervisorState::Failed);
    }

    #[tokio::test]
    async fn health_check_reports_unhealthy_when_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = RecognitionSupervisor::new(settings(dir.path())).unwrap();
        assert!(matches!(supervisor.health_check().await, HealthStatus::Unhealthy(_)));
    }

    #[test]
    fn state_display() {
        assert_eq!(SupervisorState::Ready.to_string(), "ready");
        assert_eq!(SupervisorState::Failed.to_string(), "failed");
    }
}
