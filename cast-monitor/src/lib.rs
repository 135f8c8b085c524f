//! # Cast Monitor
//!
//! Watches Google Cast devices as they come and go and reports their status.
//!
//! ## Overview
//!
//! - [`DiscoveryCoordinator`] observes a [`DiscoverySource`](cast_discovery::DiscoverySource)
//!   and keeps one [`DeviceListener`] per discovered device.
//! - A [`DeviceListener`] subscribes to the device's push events and connection
//!   changes, polls status on a fixed interval while connected, and reports
//!   every status or media update.
//! - The [`formatter`] turns snapshots into flat [`Report`]s, which are written
//!   to a [`ReportSink`].
//!
//! The monitor never sends commands to a device; it only observes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cast_api::CastClientFactory;
//! use cast_discovery::MdnsDiscovery;
//! use cast_monitor::{DiscoveryCoordinator, MonitorConfig, TracingSink};
//!
//! let coordinator = DiscoveryCoordinator::new(
//!     Arc::new(MdnsDiscovery::new()),
//!     Arc::new(CastClientFactory::default()),
//!     Arc::new(TracingSink),
//!     MonitorConfig::default(),
//! );
//! coordinator.start()?;
//! // ... run until interrupted
//! coordinator.shutdown();
//! # Ok::<(), cast_monitor::MonitorError>(())
//! ```
//!
//! ## Threads
//!
//! Each active listener owns one poll thread. Push events arrive on the
//! transport's threads and discovery callbacks on the discovery source's
//! thread, so ticks and events for one device may interleave. No lock is
//! held across network I/O.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod formatter;
pub mod listener;
pub mod logging;
pub mod poller;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Re-export main types for convenience
pub use config::{MonitorConfig, ReconnectPolicy, ReportStyle};
pub use coordinator::DiscoveryCoordinator;
pub use error::{MonitorError, Result};
pub use formatter::{format_media_status, format_status, metadata_fields, Field, Report};
pub use listener::{DeviceListener, ListenerPhase};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use poller::PollTimer;
pub use sink::{MemorySink, ReportSink, TracingSink};
