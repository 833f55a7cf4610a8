//! Capture session management.
//!
//! A [`CaptureSession`] owns at most one [`MediaStream`] at a time, whether
//! it was captured locally (host) or delivered by a [`JoinTransport`]
//! (viewer). Every state change is published as a complete
//! [`SessionSnapshot`], so observers never see a half-applied transition.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use streamscribe_common::clock::SessionClock;
use streamscribe_common::error::{ScribeError, ScribeResult, SessionFailure};
use streamscribe_platform_core::{
    CaptureRequest, CursorCapture, DisplaySurface, MediaStream, MediaStreamInfo, VideoConstraints,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::CaptureBackend;
use crate::identity::{LinkCodec, SessionId};
use crate::join::JoinTransport;
use crate::quality::{resolve, QualityTier};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No media held.
    #[default]
    Idle,
    /// Waiting for a capture or join to complete.
    Requesting,
    /// Media is live.
    Active,
    /// The last start or join failed.
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Active => "active",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller wants captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    pub audio: bool,
    pub video: bool,
    pub display_surface: DisplaySurface,
    pub quality: QualityTier,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
            display_surface: DisplaySurface::Monitor,
            quality: QualityTier::High,
        }
    }
}

/// Outcome of [`CaptureSession::change_quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityChange {
    /// Takes effect on the next start.
    Applied,
    /// Stored, but the live capture keeps its current parameters until it
    /// is restarted.
    DeferredUntilRestart,
}

/// Complete, immutable view of a session at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub media: Option<MediaStreamInfo>,
    pub error: Option<SessionFailure>,
    pub audio_enabled: bool,
    pub quality: QualityTier,
    pub session_id: Option<SessionId>,
    pub is_host: bool,
    /// Wall-clock time the current media became active.
    pub active_since: Option<String>,
}

impl SessionSnapshot {
    /// True while capturing or waiting for a capture.
    pub fn is_streaming(&self) -> bool {
        matches!(self.status, SessionStatus::Active | SessionStatus::Requesting)
    }
}

struct SessionInner {
    status: SessionStatus,
    media: Option<MediaStream>,
    error: Option<SessionFailure>,
    audio_enabled: bool,
    quality: QualityTier,
    session_id: Option<SessionId>,
    is_host: bool,
    generation: u64,
    end_observer: Option<JoinHandle<()>>,
    clock: Option<SessionClock>,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            media: self.media.as_ref().map(MediaStream::info),
            error: self.error.clone(),
            audio_enabled: self.audio_enabled,
            quality: self.quality,
            session_id: self.session_id.clone(),
            is_host: self.is_host,
            active_since: self.clock.as_ref().map(|c| c.epoch_wall().to_string()),
        }
    }

    /// Stop and drop held media. Leaves status and identity untouched.
    fn release_media(&mut self) -> bool {
        if let Some(handle) = self.end_observer.take() {
            handle.abort();
        }
        self.clock = None;
        match self.media.take() {
            Some(mut media) => {
                media.stop_all();
                true
            }
            None => false,
        }
    }

    fn reset_to_idle(&mut self) {
        self.release_media();
        self.status = SessionStatus::Idle;
        self.error = None;
        self.session_id = None;
    }
}

struct Shared {
    inner: Mutex<SessionInner>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl Shared {
    fn publish(&self, inner: &SessionInner) {
        self.snapshots.send_replace(inner.snapshot());
    }

    /// Stop the session if it still holds the media of `generation`.
    fn stop_generation(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.media.is_none() {
            return false;
        }
        inner.reset_to_idle();
        self.publish(&inner);
        true
    }
}

/// A screen capture session, hosted or joined.
pub struct CaptureSession {
    shared: Arc<Shared>,
    backend: Arc<dyn CaptureBackend>,
    transport: Arc<dyn JoinTransport>,
    links: LinkCodec,
}

impl CaptureSession {
    /// Create an idle session with audio enabled and `high` quality.
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        transport: Arc<dyn JoinTransport>,
        links: LinkCodec,
    ) -> Self {
        let inner = SessionInner {
            status: SessionStatus::Idle,
            media: None,
            error: None,
            audio_enabled: true,
            quality: QualityTier::default(),
            session_id: None,
            is_host: false,
            generation: 0,
            end_observer: None,
            clock: None,
        };
        let (snapshots, _) = watch::channel(inner.snapshot());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(inner),
                snapshots,
            }),
            backend,
            transport,
            links,
        }
    }

    /// Override the initial audio flag and quality tier.
    pub fn with_defaults(self, audio_enabled: bool, quality: QualityTier) -> Self {
        {
            let mut inner = self.shared.inner.lock();
            inner.audio_enabled = audio_enabled;
            inner.quality = quality;
            self.shared.publish(&inner);
        }
        self
    }

    /// Start a hosted capture.
    ///
    /// Any media still held is released first. On success the session is
    /// `active` as host with a freshly minted identifier; on failure it is
    /// in `error` and the previous identifier is left as it was.
    pub async fn start(&self, options: CaptureOptions) -> ScribeResult<MediaStreamInfo> {
        let pending = self.begin_request("start")?;

        let profile = resolve(options.quality);
        let request = CaptureRequest {
            audio: options.audio,
            video: options.video.then_some(VideoConstraints {
                width: profile.width,
                height: profile.height,
                frame_rate: profile.frame_rate,
                display_surface: options.display_surface,
                cursor: CursorCapture::Always,
            }),
        };
        tracing::info!(
            backend = self.backend.name(),
            quality = %options.quality,
            %profile,
            surface = %options.display_surface,
            audio = options.audio,
            "Starting screen share"
        );

        let outcome = self.backend.acquire(&request).await;
        let generation = pending.complete();
        match outcome {
            Ok(stream) => {
                let info = self.adopt(generation, stream, SessionId::mint(), true);
                tracing::info!(session_id = %self.session_id_string(), "Screen sharing started");
                Ok(info)
            }
            Err(err) => {
                self.fail(&err);
                tracing::error!(error = %err, "Failed to start screen sharing");
                Err(err)
            }
        }
    }

    /// Join an existing session as a viewer through the join transport.
    pub async fn join(&self, session_id: SessionId) -> ScribeResult<MediaStreamInfo> {
        let pending = self.begin_request("join")?;
        tracing::info!(%session_id, transport = self.transport.name(), "Joining session");

        let outcome = self.transport.join(&session_id).await;
        let generation = pending.complete();
        match outcome {
            Ok(stream) => {
                let info = self.adopt(generation, stream, session_id, false);
                tracing::info!(session_id = %self.session_id_string(), "Joined session");
                Ok(info)
            }
            Err(err) => {
                let err = match err {
                    err @ ScribeError::JoinFailed { .. } => err,
                    other => ScribeError::join_failed(other.to_string()),
                };
                self.fail(&err);
                tracing::error!(error = %err, "Failed to join session");
                Err(err)
            }
        }
    }

    /// Join the session named by a page locator's `join` parameter, if any.
    pub async fn join_from_location(
        &self,
        location: &str,
    ) -> ScribeResult<Option<MediaStreamInfo>> {
        match LinkCodec::decode_str(location)? {
            Some(session_id) => self.join(session_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Stop all tracks and return to `idle`. No-op when no media is held.
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.media.is_none() {
            return;
        }
        inner.reset_to_idle();
        self.shared.publish(&inner);
        tracing::info!("Screen sharing stopped");
    }

    /// Flip the audio flag, muting or unmuting live audio tracks in place.
    pub fn toggle_audio(&self) -> bool {
        let mut inner = self.shared.inner.lock();
        inner.audio_enabled = !inner.audio_enabled;
        let enabled = inner.audio_enabled;
        if let Some(media) = inner.media.as_ref() {
            for track in media.audio_tracks() {
                track.set_enabled(enabled);
            }
        }
        self.shared.publish(&inner);
        tracing::info!(enabled, "Audio {}", if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Select a quality tier for the next capture.
    ///
    /// A live capture is never renegotiated; callers should tell the user a
    /// restart is needed when this returns
    /// [`QualityChange::DeferredUntilRestart`].
    pub fn change_quality(&self, tier: QualityTier) -> QualityChange {
        let mut inner = self.shared.inner.lock();
        inner.quality = tier;
        self.shared.publish(&inner);
        if inner.status == SessionStatus::Active {
            tracing::warn!(quality = %tier, "To apply {tier} quality, please restart your stream");
            QualityChange::DeferredUntilRestart
        } else {
            QualityChange::Applied
        }
    }

    /// Share link for the current session, or an empty string.
    pub fn shareable_link(&self) -> String {
        self.links.encode(self.shared.inner.lock().session_id.as_ref())
    }

    pub fn link_codec(&self) -> &LinkCodec {
        &self.links
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.inner.lock().status
    }

    pub fn media(&self) -> Option<MediaStreamInfo> {
        self.shared.inner.lock().media.as_ref().map(MediaStream::info)
    }

    pub fn error(&self) -> Option<SessionFailure> {
        self.shared.inner.lock().error.clone()
    }

    pub fn audio_enabled(&self) -> bool {
        self.shared.inner.lock().audio_enabled
    }

    pub fn quality(&self) -> QualityTier {
        self.shared.inner.lock().quality
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.shared.inner.lock().session_id.clone()
    }

    pub fn is_host(&self) -> bool {
        self.shared.inner.lock().is_host
    }

    /// Seconds since the current media became active.
    pub fn elapsed_secs(&self) -> f64 {
        self.shared
            .inner
            .lock()
            .clock
            .as_ref()
            .map(|c| c.elapsed_secs())
            .unwrap_or(0.0)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    // Internal helpers

    fn session_id_string(&self) -> String {
        self.session_id().map(String::from).unwrap_or_default()
    }

    /// Enter `requesting`, releasing held media.
    ///
    /// The returned guard puts the session back to `idle` if the request is
    /// dropped before it completes.
    fn begin_request(&self, operation: &str) -> ScribeResult<PendingRequest> {
        let mut inner = self.shared.inner.lock();
        if inner.status == SessionStatus::Requesting {
            return Err(ScribeError::busy(format!(
                "cannot {operation} while another request is in flight"
            )));
        }
        if inner.release_media() {
            tracing::debug!(operation, "Released previous media");
        }
        inner.status = SessionStatus::Requesting;
        inner.error = None;
        inner.generation += 1;
        self.shared.publish(&inner);
        Ok(PendingRequest {
            shared: Arc::downgrade(&self.shared),
            generation: inner.generation,
            armed: true,
        })
    }

    fn adopt(
        &self,
        generation: u64,
        stream: MediaStream,
        session_id: SessionId,
        is_host: bool,
    ) -> MediaStreamInfo {
        let mut inner = self.shared.inner.lock();
        if is_host {
            for track in stream.audio_tracks() {
                track.set_enabled(inner.audio_enabled);
            }
        }
        inner.end_observer = stream.primary_video().map(|track| {
            watch_for_end(Arc::downgrade(&self.shared), generation, track.ended())
        });
        let info = stream.info();
        inner.media = Some(stream);
        inner.status = SessionStatus::Active;
        inner.error = None;
        inner.session_id = Some(session_id);
        inner.is_host = is_host;
        inner.clock = Some(SessionClock::start());
        self.shared.publish(&inner);
        info
    }

    fn fail(&self, err: &ScribeError) {
        let mut inner = self.shared.inner.lock();
        inner.release_media();
        inner.status = SessionStatus::Error;
        inner.error = Some(SessionFailure::from(err));
        self.shared.publish(&inner);
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let mut inner = self.shared.inner.lock();
        if inner.media.is_some() {
            tracing::debug!("Releasing media on session teardown");
        }
        inner.reset_to_idle();
        self.shared.publish(&inner);
    }
}

/// An in-flight `start` or `join`.
struct PendingRequest {
    shared: Weak<Shared>,
    generation: u64,
    armed: bool,
}

impl PendingRequest {
    /// The request ran to completion. Returns its generation.
    fn complete(mut self) -> u64 {
        self.armed = false;
        self.generation
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut inner = shared.inner.lock();
        if inner.generation != self.generation || inner.status != SessionStatus::Requesting {
            return;
        }
        inner.reset_to_idle();
        shared.publish(&inner);
        tracing::info!(generation = self.generation, "Request cancelled before completion");
    }
}

/// Stop the session when the source ends the primary video track.
fn watch_for_end(
    shared: Weak<Shared>,
    generation: u64,
    ended: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        ended.await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        if shared.stop_generation(generation) {
            tracing::info!("Screen sharing has ended");
        }
    })
}
