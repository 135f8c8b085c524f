//! Configuration types for the monitor
//!
//! [`MonitorConfig`] controls how each device listener polls and how its
//! reports are rendered.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{MonitorError, Result};

/// Environment variable holding the poll interval in milliseconds
pub const ENV_POLL_INTERVAL_MS: &str = "CASTWATCH_POLL_INTERVAL_MS";
/// Environment variable enabling [`ReconnectPolicy::ResumePolling`]
pub const ENV_RESUME_ON_RECONNECT: &str = "CASTWATCH_RESUME_ON_RECONNECT";
/// Environment variable selecting the [`ReportStyle`]
pub const ENV_REPORT_STYLE: &str = "CASTWATCH_REPORT_STYLE";

/// What a listener does when its device reconnects after a drop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Polling stays stopped; push events still flow
    #[default]
    KeepStopped,
    /// Restart the poll timer if it is not running
    ResumePolling,
}

/// How a report is turned into log text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportStyle {
    /// Headline followed by one indented `name: value` line per field
    #[default]
    Lines,
    /// One line of JSON per report
    Json,
}

impl FromStr for ReportStyle {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lines" => Ok(ReportStyle::Lines),
            "json" => Ok(ReportStyle::Json),
            other => Err(MonitorError::InvalidConfig(format!(
                "unknown report style '{}' (expected lines or json)",
                other
            ))),
        }
    }
}

/// Configuration for device listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Period between poll ticks
    /// Default: 1000 ms
    pub poll_interval: Duration,

    /// Behavior when a device reconnects
    /// Default: KeepStopped
    pub reconnect_policy: ReconnectPolicy,

    /// Report rendering
    /// Default: Lines
    pub report_style: ReportStyle,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            reconnect_policy: ReconnectPolicy::KeepStopped,
            report_style: ReportStyle::Lines,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a config from `CASTWATCH_*` environment variables, falling back
    /// to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                MonitorError::InvalidConfig(format!("{}='{}' is not a number", ENV_POLL_INTERVAL_MS, raw))
            })?;
            config.poll_interval = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(ENV_RESUME_ON_RECONNECT) {
            config.reconnect_policy = if parse_flag(ENV_RESUME_ON_RECONNECT, &raw)? {
                ReconnectPolicy::ResumePolling
            } else {
                ReconnectPolicy::KeepStopped
            };
        }

        if let Some(raw) = lookup(ENV_REPORT_STYLE) {
            config.report_style = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(MonitorError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect_policy = policy;
        self
    }

    pub fn with_report_style(mut self, style: ReportStyle) -> Self {
        self.report_style = style;
        self
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(MonitorError::InvalidConfig(format!(
            "{}='{}' is not a boolean",
            name, raw
        ))),
    }
}
