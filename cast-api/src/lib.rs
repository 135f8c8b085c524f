//! Typed access to Google Cast receivers
//!
//! This crate models what a Cast device reports about itself (receiver
//! status, media status and the metadata of the loaded item) and defines the
//! [`CastTransport`] seam through which a monitor reads those snapshots and
//! subscribes to push events. [`CastClient`] implements the transport over
//! the Cast v2 protocol using `rust_cast`.
//!
//! ```rust,no_run
//! use cast_api::{CastClient, CastTransport};
//! use cast_discovery::Device;
//!
//! let device = Device::new("Living Room", "192.168.1.40:8009".parse().unwrap());
//! let client = CastClient::new(device);
//!
//! let status = client.status()?;
//! if let Some(app) = status.active_app() {
//!     println!("{} is running", app.display_name);
//! }
//! # Ok::<(), cast_api::ApiError>(())
//! ```

pub mod client;
mod convert;
pub mod error;
pub mod event;
pub mod listeners;
pub mod media;
pub mod status;
pub mod transport;

pub use client::{CastClient, CastClientFactory, ClientOptions};
pub use error::{ApiError, Result};
pub use event::{ConnectionListener, EventListener, EventPayload, SpontaneousEvent};
pub use listeners::{ListenerId, ListenerSet};
pub use media::{
    GenericMetadata, Image, MediaItem, MediaStatusSnapshot, Metadata, MovieMetadata,
    MusicTrackMetadata, PhotoMetadata, PlayerState, TvShowMetadata,
};
pub use status::{Application, StatusSnapshot, Volume, IDLE_SCREEN_APP_ID};
pub use transport::{CastTransport, TransportFactory};
