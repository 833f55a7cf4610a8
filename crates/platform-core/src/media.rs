//! Media tracks and streams returned by capture backends.
//!
//! A [`MediaTrack`] has exactly one owner. The capture source that produced
//! it keeps a [`TrackController`] instead, which can end the track from the
//! outside (the user revoking the share through a system control) and can
//! observe what the owner did to it.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::DisplaySurface;

/// Kind of media a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// Lifecycle of a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    /// Producing media.
    Live,
    /// Stopped by its owner.
    Stopped,
    /// Ended by the source.
    Ended,
}

/// Where a track's media comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackSource {
    /// A PipeWire node handed out by the ScreenCast portal.
    PipeWire { node_id: u32 },
    /// A system audio device (e.g. a PulseAudio/PipeWire monitor source).
    SystemAudio { device: String },
    /// Locally generated test pattern.
    TestPattern,
    /// Locally rendered stand-in for a remote session.
    Placeholder { session_id: String },
    /// Generated silence.
    Silence { sample_rate: u32 },
}

/// Negotiated video settings of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub display_surface: Option<DisplaySurface>,
}

struct TrackShared {
    enabled: AtomicBool,
    state: watch::Sender<TrackState>,
}

impl TrackShared {
    fn new() -> Arc<Self> {
        let (state, _) = watch::channel(TrackState::Live);
        Arc::new(Self {
            enabled: AtomicBool::new(true),
            state,
        })
    }

    fn transition(&self, to: TrackState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == TrackState::Live {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}

/// A single audio or video track.
pub struct MediaTrack {
    id: String,
    kind: TrackKind,
    label: String,
    source: TrackSource,
    settings: Option<VideoSettings>,
    shared: Arc<TrackShared>,
}

impl MediaTrack {
    /// Create a video track and the controller its source keeps.
    pub fn video(
        label: impl Into<String>,
        source: TrackSource,
        settings: VideoSettings,
    ) -> (Self, TrackController) {
        Self::build(TrackKind::Video, label.into(), source, Some(settings))
    }

    /// Create an audio track and the controller its source keeps.
    pub fn audio(label: impl Into<String>, source: TrackSource) -> (Self, TrackController) {
        Self::build(TrackKind::Audio, label.into(), source, None)
    }

    fn build(
        kind: TrackKind,
        label: String,
        source: TrackSource,
        settings: Option<VideoSettings>,
    ) -> (Self, TrackController) {
        let shared = TrackShared::new();
        let track = Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            label,
            source,
            settings,
            shared: shared.clone(),
        };
        (track, TrackController { shared })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &TrackSource {
        &self.source
    }

    pub fn settings(&self) -> Option<VideoSettings> {
        self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    /// Enable or mute the track in place. The track keeps running.
    pub fn set_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn state(&self) -> TrackState {
        *self.shared.state.borrow()
    }

    /// Stop the track. Stopping a track that already ended is a no-op.
    pub fn stop(&self) {
        self.shared.transition(TrackState::Stopped);
    }

    /// Resolves once the source ends the track.
    ///
    /// Stopping the track through [`MediaTrack::stop`] never resolves this.
    pub fn ended(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.shared.state.subscribe();
        async move {
            let ended = rx.wait_for(|state| *state == TrackState::Ended).await.is_ok();
            if !ended {
                std::future::pending::<()>().await;
            }
        }
    }

    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            id: self.id.clone(),
            kind: self.kind,
            label: self.label.clone(),
            source: self.source.clone(),
            enabled: self.is_enabled(),
            state: self.state(),
            settings: self.settings,
        }
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("enabled", &self.is_enabled())
            .field("state", &self.state())
            .finish()
    }
}

/// Source-side handle to a track.
#[derive(Clone)]
pub struct TrackController {
    shared: Arc<TrackShared>,
}

impl TrackController {
    /// End the track from the source side. Returns false if the track was
    /// no longer live.
    pub fn end(&self) -> bool {
        self.shared.transition(TrackState::Ended)
    }

    pub fn state(&self) -> TrackState {
        *self.shared.state.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == TrackState::Stopped
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for TrackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackController")
            .field("state", &self.state())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// A set of tracks acquired together.
///
/// Platform resources that must outlive the tracks (a portal PipeWire
/// remote, for example) can be attached and are released by
/// [`MediaStream::stop_all`].
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
    resources: Vec<Box<dyn Any + Send + Sync>>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tracks,
            resources: Vec::new(),
        }
    }

    /// Keep a platform resource alive for as long as the stream runs.
    pub fn attach_resource<R: Any + Send + Sync>(&mut self, resource: R) {
        self.resources.push(Box::new(resource));
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    /// The first video track, if any.
    pub fn primary_video(&self) -> Option<&MediaTrack> {
        self.video_tracks().next()
    }

    /// Stop every track and release attached resources.
    pub fn stop_all(&mut self) {
        for track in &self.tracks {
            track.stop();
        }
        self.resources.clear();
    }

    pub fn info(&self) -> MediaStreamInfo {
        MediaStreamInfo {
            id: self.id.clone(),
            tracks: self.tracks.iter().map(MediaTrack::info).collect(),
        }
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks)
            .field("resources", &self.resources.len())
            .finish()
    }
}

/// Read-only description of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    pub source: TrackSource,
    pub enabled: bool,
    pub state: TrackState,
    pub settings: Option<VideoSettings>,
}

/// Read-only description of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStreamInfo {
    pub id: String,
    pub tracks: Vec<TrackInfo>,
}

impl MediaStreamInfo {
    pub fn video(&self) -> Option<&TrackInfo> {
        self.tracks.iter().find(|t| t.kind == TrackKind::Video)
    }

    pub fn audio(&self) -> impl Iterator<Item = &TrackInfo> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }
}
