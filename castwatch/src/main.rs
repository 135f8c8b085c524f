use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use cast_api::{CastClientFactory, ClientOptions};
use cast_discovery::MdnsDiscovery;
use cast_monitor::logging::{init_logging_with_filter, LoggingMode, ENV_LOG_MODE};
use cast_monitor::{DiscoveryCoordinator, MonitorConfig, ReconnectPolicy, ReportStyle, TracingSink};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

/// Google Cast status monitor
///
/// Discovers Cast devices on the local network and logs each device's
/// running application, volume and media status as it changes.
#[derive(Parser, Debug)]
#[command(name = "castwatch")]
#[command(about = "Discovers Google Cast devices and logs their status")]
#[command(version)]
pub struct Args {
    /// Interval between status polls in milliseconds
    #[arg(short = 'i', long)]
    pub poll_interval_ms: Option<u64>,

    /// Restart polling when a device reconnects
    #[arg(long)]
    pub resume_on_reconnect: bool,

    /// How reports are written
    #[arg(long, value_enum)]
    pub report_style: Option<StyleArg>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_mode: Option<ModeArg>,

    /// Log filter directives (error, warn, info, debug, trace or per-target)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Connect to this port instead of the advertised one
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds to wait before reconnecting a dropped event session
    #[arg(long, default_value = "5")]
    pub reconnect_delay: u64,

    /// List discovered devices as JSON and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Discovery timeout in seconds for --list-devices
    #[arg(short = 'd', long, default_value = "3")]
    pub discovery_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleArg {
    Lines,
    Json,
}

impl From<StyleArg> for ReportStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Lines => ReportStyle::Lines,
            StyleArg::Json => ReportStyle::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Silent,
    Development,
    Debug,
    Json,
}

impl From<ModeArg> for LoggingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Silent => LoggingMode::Silent,
            ModeArg::Development => LoggingMode::Development,
            ModeArg::Debug => LoggingMode::Debug,
            ModeArg::Json => LoggingMode::Json,
        }
    }
}

impl Args {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == Some(0) {
            return Err(anyhow::anyhow!("Poll interval must be positive"));
        }

        if self.port == Some(0) {
            return Err(anyhow::anyhow!("Port must not be 0"));
        }

        if self.discovery_timeout == 0 {
            return Err(anyhow::anyhow!("Discovery timeout must be positive"));
        }

        Ok(())
    }
}

/// Configuration merged from environment variables and command line flags
#[derive(Debug, Clone)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub client: ClientOptions,
    pub log_mode: LoggingMode,
    pub log_level: Option<String>,
    pub list_devices: bool,
    pub discovery_timeout: Duration,
}

impl Config {
    /// Build from `CASTWATCH_*` variables, letting flags override them.
    pub fn from_args(args: Args) -> Result<Self> {
        args.validate()?;
        let monitor = MonitorConfig::from_env().context("Invalid CASTWATCH_* environment")?;
        let log_mode = match std::env::var(ENV_LOG_MODE) {
            Ok(raw) => raw.parse().context("Invalid CASTWATCH_LOG_MODE")?,
            Err(_) => LoggingMode::Development,
        };
        Self::merge(args, monitor, log_mode)
    }

    fn merge(args: Args, mut monitor: MonitorConfig, log_mode: LoggingMode) -> Result<Self> {
        if let Some(ms) = args.poll_interval_ms {
            monitor = monitor.with_poll_interval(Duration::from_millis(ms));
        }
        if args.resume_on_reconnect {
            monitor = monitor.with_reconnect_policy(ReconnectPolicy::ResumePolling);
        }
        if let Some(style) = args.report_style {
            monitor = monitor.with_report_style(style.into());
        }
        monitor.validate()?;

        let mut client = ClientOptions::default().with_reconnect_delay(Duration::from_secs(args.reconnect_delay));
        if let Some(port) = args.port {
            client = client.with_port(port);
        }

        Ok(Self {
            monitor,
            client,
            log_mode: args.log_mode.map(Into::into).unwrap_or(log_mode),
            log_level: args.log_level,
            list_devices: args.list_devices,
            discovery_timeout: Duration::from_secs(args.discovery_timeout),
        })
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        info!("Configuration:");
        info!("  Poll interval: {}ms", self.monitor.poll_interval.as_millis());
        info!("  Reconnect policy: {:?}", self.monitor.reconnect_policy);
        info!("  Report style: {:?}", self.monitor.report_style);
        info!("  Port override: {:?}", self.client.port);
        info!("  Reconnect delay: {}s", self.client.reconnect_delay.as_secs());
    }
}

/// Discover for a fixed time and print what was found.
fn list_devices(config: &Config) -> Result<()> {
    let devices = cast_discovery::get_with_timeout(config.discovery_timeout);
    info!("Found {} device(s)", devices.len());
    println!(
        "{}",
        serde_json::to_string_pretty(&devices).context("Failed to serialize devices")?
    );
    Ok(())
}

/// Monitor until Ctrl-C, then tear everything down.
fn run(config: Config) -> Result<()> {
    let coordinator = DiscoveryCoordinator::new(
        Arc::new(MdnsDiscovery::new()),
        Arc::new(CastClientFactory::new(config.client.clone())),
        Arc::new(TracingSink),
        config.monitor.clone(),
    );

    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("Failed to install Ctrl-C handler")?;

    coordinator.start().context("Failed to start discovery")?;
    info!("Monitoring Cast devices, press Ctrl+C to stop");

    let _ = stop_rx.recv();

    let devices = coordinator.devices();
    info!("Shutting down, releasing {} device(s)", devices.len());
    for device in &devices {
        info!("  {} at {}", device.name, device.address());
    }
    coordinator.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args).context("Failed to parse configuration")?;

    init_logging_with_filter(config.log_mode, config.log_level.as_deref())
        .context("Failed to initialize logging")?;
    config.print_summary();

    let result = if config.list_devices {
        list_devices(&config)
    } else {
        run(config)
    };

    if let Err(e) = &result {
        error!("castwatch failed: {:#}", e);
    }
    result
}
