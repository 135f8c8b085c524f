//! Status formatting
//!
//! Pure functions turning snapshots into [`Report`]s: a headline plus an
//! ordered list of named fields. Nothing here can fail or panic; any value
//! the device leaves out simply renders as absent.

use std::fmt;

use cast_api::{Image, MediaStatusSnapshot, Metadata, StatusSnapshot};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::ReportStyle;

/// Rendering of a field with no value.
pub const ABSENT: &str = "<absent>";

/// A named value in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub value: Option<String>,
}

impl Field {
    fn new(name: &'static str, value: Option<String>) -> Self {
        Self { name, value }
    }

    /// The value, or [`ABSENT`].
    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or(ABSENT)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.display_value())
    }
}

/// Flat, human-readable view of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub headline: &'static str,
    pub fields: Vec<Field>,
}

impl Report {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The value of a field, `None` if the field is missing or absent.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|f| f.value.as_deref())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Render into log lines.
    ///
    /// `Lines` yields the headline followed by one indented line per field;
    /// `Json` yields a single line.
    pub fn render(&self, style: ReportStyle) -> Vec<String> {
        match style {
            ReportStyle::Lines => {
                let mut lines = Vec::with_capacity(self.fields.len() + 1);
                lines.push(self.headline.to_string());
                lines.extend(self.fields.iter().map(|f| format!("  {}", f)));
                lines
            }
            ReportStyle::Json => {
                let line = serde_json::to_string(self)
                    .unwrap_or_else(|e| format!("{{\"report\":\"{}\",\"error\":\"{}\"}}", self.headline, e));
                vec![line]
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline)?;
        for field in &self.fields {
            write!(f, "\n  {}", field)?;
        }
        Ok(())
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("report", self.headline)?;
        for field in &self.fields {
            map.serialize_entry(field.name, &field.value)?;
        }
        map.end()
    }
}

pub const STATUS_HEADLINE: &str = "Status";
pub const MEDIA_STATUS_HEADLINE: &str = "Media status";

/// Report running application and volume.
pub fn format_status(status: &StatusSnapshot) -> Report {
    let app = status.application.as_ref();
    Report {
        headline: STATUS_HEADLINE,
        fields: vec![
            Field::new("running_app", app.map(|a| a.display_name.clone())),
            Field::new("idle_screen", app.map(|a| a.is_idle_screen().to_string())),
            Field::new("volume", status.volume.level.map(|v| v.to_string())),
            Field::new("muted", status.volume.muted.map(|m| m.to_string())),
        ],
    }
}

/// Report playback state, position, duration and the item's metadata.
pub fn format_media_status(status: &MediaStatusSnapshot) -> Report {
    let media = status.media.as_ref();
    let mut fields = vec![
        Field::new("player_state", Some(status.player_state.to_string())),
        Field::new("volume", status.volume.map(|v| v.to_string())),
        Field::new("current_time", Some(whole_seconds(status.current_time))),
        Field::new("duration", media.and_then(|m| m.duration).map(whole_seconds)),
    ];

    if let Some(metadata) = media.and_then(|m| m.metadata.as_ref()) {
        fields.extend(metadata_fields(metadata));
    }

    Report {
        headline: MEDIA_STATUS_HEADLINE,
        fields,
    }
}

/// The field set of one metadata variant.
pub fn metadata_fields(metadata: &Metadata) -> Vec<Field> {
    match metadata {
        Metadata::Generic(m) => vec![
            Field::new("artist", m.artist.clone()),
            Field::new("title", m.title.clone()),
            Field::new("subtitle", m.subtitle.clone()),
            Field::new("images", image_list(&m.images)),
        ],
        Metadata::Movie(m) => vec![
            Field::new("title", m.title.clone()),
            Field::new("subtitle", m.subtitle.clone()),
            Field::new("studio", m.studio.clone()),
            Field::new("release_date", m.release_date.clone()),
            Field::new("images", image_list(&m.images)),
        ],
        Metadata::TvShow(m) => vec![
            Field::new("series_title", m.series_title.clone()),
            Field::new("season", m.season.map(|s| s.to_string())),
            Field::new("episode", m.episode.map(|e| e.to_string())),
            Field::new("title", m.title.clone()),
            Field::new("broadcast_date", m.broadcast_date.clone()),
            Field::new("release_date", m.release_date.clone()),
            Field::new("images", image_list(&m.images)),
        ],
        Metadata::MusicTrack(m) => vec![
            Field::new("artist", m.artist.clone()),
            Field::new("title", m.title.clone()),
            Field::new("album_title", m.album_title.clone()),
            Field::new("album_artist", m.album_artist.clone()),
            Field::new("composer", m.composer.clone()),
            Field::new("disc", m.disc_number.map(|d| d.to_string())),
            Field::new("track", m.track_number.map(|t| t.to_string())),
            Field::new("release_date", m.release_date.clone()),
            Field::new("images", image_list(&m.images)),
        ],
        Metadata::Photo(m) => vec![
            Field::new("artist", m.artist.clone()),
            Field::new("title", m.title.clone()),
            Field::new("creation_date", m.creation_date.clone()),
            Field::new("height", m.height.map(|h| h.to_string())),
            Field::new("width", m.width.map(|w| w.to_string())),
            Field::new("location_name", m.location_name.clone()),
            Field::new("latitude", m.latitude.map(|l| l.to_string())),
            Field::new("longitude", m.longitude.map(|l| l.to_string())),
        ],
    }
}

/// Seconds truncated toward zero. Non-finite input saturates (`as` never panics).
fn whole_seconds(seconds: f64) -> String {
    (seconds.trunc() as i64).to_string()
}

fn image_list(images: &[Image]) -> Option<String> {
    if images.is_empty() {
        return None;
    }
    let urls: Vec<&str> = images.iter().map(|i| i.url.as_str()).collect();
    Some(format!("[{}]", urls.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_api::{
        Application, GenericMetadata, MediaItem, MovieMetadata, MusicTrackMetadata, PhotoMetadata,
        PlayerState, TvShowMetadata, Volume, IDLE_SCREEN_APP_ID,
    };
    use proptest::prelude::*;
    use rstest::rstest;

    fn names(fields: &[Field]) -> Vec<&'static str> {
        fields.iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_status_without_app() {
        let report = format_status(&StatusSnapshot::new(None, Volume::new(0.5)));
        assert_eq!(report.value("running_app"), None);
        assert_eq!(report.value("volume"), Some("0.5"));

        let lines = report.render(ReportStyle::Lines);
        assert_eq!(lines[0], "Status");
        assert!(lines.contains(&"  running_app: <absent>".to_string()));
        assert!(lines.contains(&"  volume: 0.5".to_string()));
    }

    #[test]
    fn test_status_with_idle_screen() {
        let status = StatusSnapshot::new(
            Some(Application::new(IDLE_SCREEN_APP_ID, "Backdrop")),
            Volume::new(1.0).with_muted(true),
        );
        let report = format_status(&status);
        assert_eq!(report.value("running_app"), Some("Backdrop"));
        assert_eq!(report.value("idle_screen"), Some("true"));
        assert_eq!(report.value("muted"), Some("true"));
    }

    #[rstest]
    #[case(12.9, "12")]
    #[case(0.0, "0")]
    #[case(-0.5, "0")]
    #[case(3599.999, "3599")]
    #[case(f64::NAN, "0")]
    fn test_whole_seconds(#[case] seconds: f64, #[case] expected: &str) {
        assert_eq!(whole_seconds(seconds), expected);
    }

    #[test]
    fn test_media_positions_are_truncated() {
        let status = MediaStatusSnapshot::new(PlayerState::Playing, 61.8)
            .with_volume(0.25)
            .with_media(MediaItem::new("x").with_duration(245.6));
        let report = format_media_status(&status);
        assert_eq!(report.value("current_time"), Some("61"));
        assert_eq!(report.value("duration"), Some("245"));
        assert_eq!(report.value("volume"), Some("0.25"));
        assert_eq!(report.value("player_state"), Some("playing"));
    }

    #[test]
    fn test_media_without_item_reports_base_fields_only() {
        let report = format_media_status(&MediaStatusSnapshot::new(PlayerState::Idle, 0.0));
        assert_eq!(
            names(&report.fields),
            vec!["player_state", "volume", "current_time", "duration"]
        );
        assert_eq!(report.value("duration"), None);
    }

    #[test]
    fn test_movie_fields() {
        let metadata = Metadata::Movie(MovieMetadata {
            title: Some("Arrival".to_string()),
            studio: Some("Paramount".to_string()),
            ..Default::default()
        });
        let status = MediaStatusSnapshot::new(PlayerState::Playing, 10.0)
            .with_media(MediaItem::new("movie").with_metadata(metadata));
        let report = format_media_status(&status);

        assert_eq!(report.value("title"), Some("Arrival"));
        assert_eq!(report.value("studio"), Some("Paramount"));
        assert!(!report.has_field("season"));
        assert!(!report.has_field("episode"));

        let text = report.to_string();
        assert!(text.contains("Arrival"));
        assert!(text.contains("Paramount"));
    }

    #[test]
    fn test_music_track_field_set() {
        let fields = metadata_fields(&Metadata::MusicTrack(MusicTrackMetadata::default()));
        assert_eq!(
            names(&fields),
            vec![
                "artist",
                "title",
                "album_title",
                "album_artist",
                "composer",
                "disc",
                "track",
                "release_date",
                "images"
            ]
        );
    }

    #[rstest]
    #[case(Metadata::Generic(GenericMetadata::default()), vec!["artist", "title", "subtitle", "images"])]
    #[case(Metadata::Movie(MovieMetadata::default()), vec!["title", "subtitle", "studio", "release_date", "images"])]
    #[case(
        Metadata::TvShow(TvShowMetadata::default()),
        vec!["series_title", "season", "episode", "title", "broadcast_date", "release_date", "images"]
    )]
    #[case(
        Metadata::Photo(PhotoMetadata::default()),
        vec!["artist", "title", "creation_date", "height", "width", "location_name", "latitude", "longitude"]
    )]
    fn test_variant_field_sets(#[case] metadata: Metadata, #[case] expected: Vec<&'static str>) {
        assert_eq!(names(&metadata_fields(&metadata)), expected);
    }

    #[test]
    fn test_image_list_rendering() {
        let metadata = Metadata::Generic(GenericMetadata {
            images: vec![Image::new("http://a/1.jpg"), Image::new("http://a/2.jpg")],
            ..Default::default()
        });
        let fields = metadata_fields(&metadata);
        let images = fields.iter().find(|f| f.name == "images").unwrap();
        assert_eq!(images.display_value(), "[http://a/1.jpg, http://a/2.jpg]");
    }

    #[test]
    fn test_json_rendering_keeps_field_order() {
        let report = format_status(&StatusSnapshot::new(None, Volume::new(0.5)));
        let lines = report.render(ReportStyle::Json);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            r#"{"report":"Status","running_app":null,"idle_screen":null,"volume":"0.5","muted":null}"#
        );
    }

    fn opt_string() -> impl Strategy<Value = Option<String>> {
        proptest::option::of(".{0,12}")
    }

    fn images() -> impl Strategy<Value = Vec<Image>> {
        proptest::collection::vec(".{0,8}".prop_map(Image::new), 0..3)
    }

    fn metadata() -> impl Strategy<Value = Metadata> {
        prop_oneof![
            (opt_string(), opt_string(), opt_string(), images()).prop_map(|(artist, title, subtitle, images)| {
                Metadata::Generic(GenericMetadata { artist, title, subtitle, images })
            }),
            (opt_string(), opt_string(), opt_string(), images()).prop_map(|(title, subtitle, studio, images)| {
                Metadata::Movie(MovieMetadata { title, subtitle, studio, release_date: None, images })
            }),
            (opt_string(), proptest::option::of(any::<u32>()), proptest::option::of(any::<u32>()), opt_string())
                .prop_map(|(series_title, season, episode, title)| {
                    Metadata::TvShow(TvShowMetadata { series_title, season, episode, title, ..Default::default() })
                }),
            (opt_string(), opt_string(), proptest::option::of(any::<u32>()), images()).prop_map(
                |(artist, album_title, track_number, images)| {
                    Metadata::MusicTrack(MusicTrackMetadata { artist, album_title, track_number, images, ..Default::default() })
                }
            ),
            (opt_string(), proptest::option::of(any::<f64>()), proptest::option::of(any::<u32>())).prop_map(
                |(location_name, latitude, width)| {
                    Metadata::Photo(PhotoMetadata { location_name, latitude, width, ..Default::default() })
                }
            ),
        ]
    }

    fn player_state() -> impl Strategy<Value = PlayerState> {
        prop_oneof![
            Just(PlayerState::Idle),
            Just(PlayerState::Buffering),
            Just(PlayerState::Playing),
            Just(PlayerState::Paused),
        ]
    }

    proptest! {
        #[test]
        fn prop_media_formatting_never_panics(
            state in player_state(),
            current_time in any::<f64>(),
            volume in proptest::option::of(any::<f32>()),
            duration in proptest::option::of(any::<f64>()),
            metadata in proptest::option::of(metadata()),
            has_media in any::<bool>(),
        ) {
            let mut status = MediaStatusSnapshot::new(state, current_time);
            status.volume = volume;
            if has_media {
                status.media = Some(MediaItem { duration, metadata, ..Default::default() });
            }

            let report = format_media_status(&status);
            prop_assert!(report.fields.len() >= 4);
            prop_assert!(!report.render(ReportStyle::Lines).is_empty());
            prop_assert_eq!(report.render(ReportStyle::Json).len(), 1);
        }

        #[test]
        fn prop_status_formatting_never_panics(
            name in opt_string(),
            level in proptest::option::of(any::<f32>()),
            muted in proptest::option::of(any::<bool>()),
        ) {
            let application = name.map(|n| Application::new("APP", n));
            let status = StatusSnapshot::new(application, Volume { level, muted });
            let report = format_status(&status);
            prop_assert_eq!(report.fields.len(), 4);
        }
    }
}
