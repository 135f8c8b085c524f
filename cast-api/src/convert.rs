//! Mapping from `rust_cast` wire types into the crate's snapshot types.

use rust_cast::channels::{media as wire_media, receiver as wire_receiver};

use crate::media::{
    GenericMetadata, Image, MediaItem, MediaStatusSnapshot, Metadata, MovieMetadata,
    MusicTrackMetadata, PhotoMetadata, PlayerState, TvShowMetadata,
};
use crate::status::{Application, StatusSnapshot, Volume};

pub(crate) fn status_snapshot(status: &wire_receiver::Status) -> StatusSnapshot {
    let application = status.applications.first().map(|app| Application {
        app_id: app.app_id.clone(),
        display_name: app.display_name.clone(),
        status_text: app.status_text.clone(),
        session_id: app.session_id.clone(),
        transport_id: app.transport_id.clone(),
    });

    StatusSnapshot {
        application,
        volume: Volume {
            level: status.volume.level,
            muted: status.volume.muted,
        },
    }
}

/// Convert the first media session of a status response.
///
/// Media status carries no volume, so the caller passes the receiver's.
pub(crate) fn media_status_snapshot(
    status: &wire_media::Status,
    volume: Option<f32>,
) -> Option<MediaStatusSnapshot> {
    status.entries.first().map(|entry| MediaStatusSnapshot {
        volume,
        current_time: entry.current_time.map(f64::from).unwrap_or(0.0),
        player_state: player_state(&entry.player_state),
        media_session_id: Some(entry.media_session_id),
        media: entry.media.as_ref().map(media_item),
    })
}

/// Convert a pushed media status.
///
/// A push with no sessions means playback ended; it is reported as an idle
/// player with no media rather than dropped.
pub(crate) fn pushed_media_status(
    status: &wire_media::Status,
    volume: Option<f32>,
) -> MediaStatusSnapshot {
    media_status_snapshot(status, volume).unwrap_or_else(|| MediaStatusSnapshot {
        volume,
        current_time: 0.0,
        player_state: PlayerState::Idle,
        media_session_id: None,
        media: None,
    })
}

fn player_state(state: &wire_media::PlayerState) -> PlayerState {
    match state {
        wire_media::PlayerState::Idle => PlayerState::Idle,
        wire_media::PlayerState::Buffering => PlayerState::Buffering,
        wire_media::PlayerState::Playing => PlayerState::Playing,
        wire_media::PlayerState::Paused => PlayerState::Paused,
    }
}

pub(crate) fn media_item(media: &wire_media::Media) -> MediaItem {
    MediaItem {
        content_id: media.content_id.clone(),
        content_type: media.content_type.clone(),
        duration: media.duration.map(f64::from),
        metadata: media.metadata.as_ref().map(metadata),
    }
}

fn images(images: &[wire_media::Image]) -> Vec<Image> {
    images
        .iter()
        .map(|image| Image {
            url: image.url.clone(),
            width: image.dimensions.map(|(w, _)| w),
            height: image.dimensions.map(|(_, h)| h),
        })
        .collect()
}

fn metadata(metadata: &wire_media::Metadata) -> Metadata {
    match metadata {
        wire_media::Metadata::Generic(m) => Metadata::Generic(GenericMetadata {
            artist: None,
            title: m.title.clone(),
            subtitle: m.subtitle.clone(),
            images: images(&m.images),
        }),
        wire_media::Metadata::Movie(m) => Metadata::Movie(MovieMetadata {
            title: m.title.clone(),
            subtitle: m.subtitle.clone(),
            studio: m.studio.clone(),
            release_date: m.release_date.clone(),
            images: images(&m.images),
        }),
        wire_media::Metadata::TvShow(m) => Metadata::TvShow(TvShowMetadata {
            series_title: m.series_title.clone(),
            season: m.season,
            episode: m.episode,
            title: m.episode_title.clone(),
            broadcast_date: m.original_air_date.clone(),
            release_date: None,
            images: images(&m.images),
        }),
        wire_media::Metadata::MusicTrack(m) => Metadata::MusicTrack(MusicTrackMetadata {
            artist: m.artist.clone(),
            title: m.title.clone(),
            album_title: m.album_name.clone(),
            album_artist: m.album_artist.clone(),
            composer: m.composer.clone(),
            disc_number: m.disc_number,
            track_number: m.track_number,
            release_date: m.release_date.clone(),
            images: images(&m.images),
        }),
        wire_media::Metadata::Photo(m) => Metadata::Photo(PhotoMetadata {
            artist: m.artist.clone(),
            title: m.title.clone(),
            creation_date: m.creation_date_time.clone(),
            width: m.dimensions.map(|(w, _)| w),
            height: m.dimensions.map(|(_, h)| h),
            location_name: m.location.clone(),
            latitude: m.latitude_longitude.map(|(lat, _)| lat),
            longitude: m.latitude_longitude.map(|(_, lon)| lon),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_cast::channels::media::{Media, MusicTrackMediaMetadata, StreamType};

    #[test]
    fn test_music_track_media_item() {
        let media = Media {
            content_id: "http://nas.local/track.flac".to_string(),
            content_type: "audio/flac".to_string(),
            stream_type: StreamType::Buffered,
            metadata: Some(wire_media::Metadata::MusicTrack(MusicTrackMediaMetadata {
                title: Some("Teardrop".to_string()),
                artist: Some("Massive Attack".to_string()),
                album_name: Some("Mezzanine".to_string()),
                images: vec![wire_media::Image {
                    url: "http://nas.local/cover.jpg".to_string(),
                    dimensions: Some((600, 400)),
                }],
                ..Default::default()
            })),
            duration: Some(330.7),
        };

        let item = media_item(&media);
        assert_eq!(item.content_type, "audio/flac");
        assert!(item.duration.unwrap() > 330.0);

        match item.metadata {
            Some(Metadata::MusicTrack(track)) => {
                assert_eq!(track.album_title.as_deref(), Some("Mezzanine"));
                assert_eq!(track.artist.as_deref(), Some("Massive Attack"));
                assert_eq!(track.images[0].width, Some(600));
                assert_eq!(track.images[0].height, Some(400));
            }
            other => panic!("unexpected metadata: {:?}", other),
        }
    }

    #[test]
    fn test_push_without_sessions_is_idle() {
        let status = wire_media::Status {
            request_id: 0,
            entries: vec![],
        };

        assert!(media_status_snapshot(&status, Some(0.5)).is_none());

        let snapshot = pushed_media_status(&status, Some(0.5));
        assert_eq!(snapshot.player_state, PlayerState::Idle);
        assert_eq!(snapshot.volume, Some(0.5));
        assert_eq!(snapshot.current_time, 0.0);
        assert!(snapshot.media_session_id.is_none());
        assert!(snapshot.media.is_none());
    }

    #[test]
    fn test_media_without_metadata() {
        let media = Media {
            content_id: "live".to_string(),
            content_type: "video/mp2t".to_string(),
            stream_type: StreamType::Live,
            metadata: None,
            duration: None,
        };

        let item = media_item(&media);
        assert!(item.metadata.is_none());
        assert!(item.duration.is_none());
    }
}
