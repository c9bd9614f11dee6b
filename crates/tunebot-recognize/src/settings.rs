// SPDX-FileCopyrightText: 2026 Tunebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supervisor settings derived from `[recognize]`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tunebot_config::RecognizeConfig;

/// Everything the supervisor needs to run and talk to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    pub program: String,
    pub args: Vec<String>,
    /// Must exist before the process is spawned.
    pub working_dir: PathBuf,
    pub env: BTreeMap<String, String>,
    /// Passed to the process as `PORT`.
    pub port: u16,
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    pub health_interval: Duration,
    pub startup_timeout: Duration,
    pub stop_grace: Duration,
    pub request_timeout: Duration,
    /// Platform that recognized track ids belong to.
    pub result_platform: String,
}

impl From<&RecognizeConfig> for RecognitionSettings {
    fn from(config: &RecognizeConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            working_dir: PathBuf::from(&config.working_dir),
            env: config.env.clone(),
            port: config.port,
            base_url: format!("http://127.0.0.1:{}", config.port),
            health_interval: Duration::from_millis(config.health_interval_ms),
            startup_timeout: Duration::from_secs(config.startup_timeout_secs),
            stop_grace: Duration::from_secs(config.stop_grace_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            result_platform: "netease".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_port() {
        let settings = RecognitionSettings::from(&RecognizeConfig::default());
        assert_eq!(settings.base_url, "http://127.0.0.1:3737");
        assert_eq!(settings.port, 3737);
        assert_eq!(settings.health_interval, Duration::from_millis(200));
        assert_eq!(settings.startup_timeout, Duration::from_secs(10));
        assert_eq!(settings.result_platform, "netease");
    }
}
