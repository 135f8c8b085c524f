//! Receiver status snapshots.

use serde::Serialize;

/// App id of the Backdrop receiver, the ambient screen a Cast device shows
/// when nothing is being cast.
pub const IDLE_SCREEN_APP_ID: &str = "E8C28D3C";

/// Device volume as reported by the receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Volume {
    /// Level in the range 0.0..=1.0
    pub level: Option<f32>,
    pub muted: Option<bool>,
}

impl Volume {
    pub fn new(level: f32) -> Self {
        Self {
            level: Some(level),
            muted: None,
        }
    }

    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }
}

/// An application running on the receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub app_id: String,
    pub display_name: String,
    pub status_text: String,
    pub session_id: String,
    /// Destination id for app-level channels such as media
    pub transport_id: String,
}

impl Application {
    pub fn new(app_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            display_name: display_name.into(),
            status_text: String::new(),
            session_id: String::new(),
            transport_id: String::new(),
        }
    }

    pub fn with_transport(mut self, session_id: impl Into<String>, transport_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self.transport_id = transport_id.into();
        self
    }

    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Whether this is the ambient Backdrop app rather than cast content.
    pub fn is_idle_screen(&self) -> bool {
        self.app_id == IDLE_SCREEN_APP_ID
    }
}

/// Connection, application and volume state of a device at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub application: Option<Application>,
    pub volume: Volume,
}

impl StatusSnapshot {
    pub fn new(application: Option<Application>, volume: Volume) -> Self {
        Self { application, volume }
    }

    /// The running application, unless it is the idle screen.
    pub fn active_app(&self) -> Option<&Application> {
        self.application.as_ref().filter(|app| !app.is_idle_screen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_screen_is_not_active() {
        let snapshot = StatusSnapshot::new(
            Some(Application::new(IDLE_SCREEN_APP_ID, "Backdrop")),
            Volume::new(0.3),
        );
        assert!(snapshot.application.as_ref().unwrap().is_idle_screen());
        assert!(snapshot.active_app().is_none());
    }

    #[test]
    fn test_cast_app_is_active() {
        let snapshot = StatusSnapshot::new(
            Some(Application::new("CC1AD845", "Default Media Receiver").with_transport("s-1", "web-5")),
            Volume::new(0.8).with_muted(false),
        );
        let app = snapshot.active_app().unwrap();
        assert_eq!(app.transport_id, "web-5");
        assert_eq!(snapshot.volume.muted, Some(false));
    }

    #[test]
    fn test_default_snapshot_has_nothing() {
        let snapshot = StatusSnapshot::default();
        assert!(snapshot.application.is_none());
        assert_eq!(snapshot.volume.level, None);
    }
}
