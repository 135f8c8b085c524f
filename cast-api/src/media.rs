//! Media status snapshots and the metadata variants a media item can carry.

use std::fmt;

use serde::Serialize;

/// Playback state reported by the media channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Buffering,
    Playing,
    Paused,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerState::Idle => "idle",
            PlayerState::Buffering => "buffering",
            PlayerState::Playing => "playing",
            PlayerState::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Artwork attached to a media item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenericMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MovieMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub studio: Option<String>,
    pub release_date: Option<String>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TvShowMetadata {
    pub series_title: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Episode title
    pub title: Option<String>,
    pub broadcast_date: Option<String>,
    pub release_date: Option<String>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MusicTrackMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub album_title: Option<String>,
    pub album_artist: Option<String>,
    pub composer: Option<String>,
    pub disc_number: Option<u32>,
    pub track_number: Option<u32>,
    pub release_date: Option<String>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhotoMetadata {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub creation_date: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    pub location_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Descriptive metadata of a media item. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metadata {
    Generic(GenericMetadata),
    Movie(MovieMetadata),
    TvShow(TvShowMetadata),
    MusicTrack(MusicTrackMetadata),
    Photo(PhotoMetadata),
}

impl Metadata {
    /// Short lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Metadata::Generic(_) => "generic",
            Metadata::Movie(_) => "movie",
            Metadata::TvShow(_) => "tv_show",
            Metadata::MusicTrack(_) => "music_track",
            Metadata::Photo(_) => "photo",
        }
    }
}

/// The item loaded in a media session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaItem {
    pub content_id: String,
    pub content_type: String,
    /// Duration in seconds, absent for live streams
    pub duration: Option<f64>,
    pub metadata: Option<Metadata>,
}

impl MediaItem {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Playback state of the running media application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaStatusSnapshot {
    /// Receiver volume level at the time of the snapshot
    pub volume: Option<f32>,
    /// Playback position in seconds
    pub current_time: f64,
    pub player_state: PlayerState,
    pub media_session_id: Option<i32>,
    pub media: Option<MediaItem>,
}

impl MediaStatusSnapshot {
    pub fn new(player_state: PlayerState, current_time: f64) -> Self {
        Self {
            volume: None,
            current_time,
            player_state,
            media_session_id: None,
            media: None,
        }
    }

    pub fn with_volume(mut self, level: f32) -> Self {
        self.volume = Some(level);
        self
    }

    pub fn with_media(mut self, media: MediaItem) -> Self {
        self.media = Some(media);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_display() {
        assert_eq!(PlayerState::Playing.to_string(), "playing");
        assert_eq!(PlayerState::Buffering.to_string(), "buffering");
    }

    #[test]
    fn test_metadata_serializes_with_kind_tag() {
        let metadata = Metadata::Movie(MovieMetadata {
            title: Some("Arrival".to_string()),
            studio: Some("Paramount".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["kind"], "movie");
        assert_eq!(json["title"], "Arrival");
        assert_eq!(metadata.kind(), "movie");
    }

    #[test]
    fn test_media_status_builders() {
        let snapshot = MediaStatusSnapshot::new(PlayerState::Paused, 12.5)
            .with_volume(0.4)
            .with_media(MediaItem::new("http://example.com/a.mp3").with_duration(200.0));
        assert_eq!(snapshot.volume, Some(0.4));
        assert_eq!(snapshot.media.unwrap().duration, Some(200.0));
    }
}
