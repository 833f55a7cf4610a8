//! Viewer side of a session.
//!
//! [`JoinTransport`] is the seam where a real signaling and relay client
//! would deliver the host's media. The only implementation here,
//! [`SimulatedJoin`], is a placeholder: it never contacts the host and
//! renders a local stand-in stream instead.

use std::time::Duration;

use streamscribe_common::error::ScribeResult;
use streamscribe_platform_core::{MediaStream, MediaTrack, TrackSource, VideoSettings};

use crate::identity::SessionId;
use crate::quality::QualityTier;

/// Delivers the media of an existing session to a viewer.
#[async_trait::async_trait]
pub trait JoinTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Produce the media a viewer of `session_id` should see.
    async fn join(&self, session_id: &SessionId) -> ScribeResult<MediaStream>;
}

/// Placeholder transport that fabricates the viewer's stream locally.
#[derive(Debug, Clone)]
pub struct SimulatedJoin {
    latency: Duration,
    tier: QualityTier,
}

impl SimulatedJoin {
    /// User-facing disclosure that joining does not receive the host's media.
    pub const NOTICE: &'static str =
        "Joining is simulated: a local placeholder is shown and no media is received from the host.";

    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1500);

    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            tier: QualityTier::Standard,
        }
    }

    /// Tier whose resolution the placeholder video uses.
    pub fn with_tier(mut self, tier: QualityTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedJoin {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait::async_trait]
impl JoinTransport for SimulatedJoin {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn join(&self, session_id: &SessionId) -> ScribeResult<MediaStream> {
        tracing::debug!(%session_id, latency_ms = self.latency.as_millis() as u64, "Simulating join latency");
        tokio::time::sleep(self.latency).await;

        let profile = self.tier.profile();
        let (video, _) = MediaTrack::video(
            "placeholder",
            TrackSource::Placeholder {
                session_id: session_id.to_string(),
            },
            VideoSettings {
                width: profile.width,
                height: profile.height,
                frame_rate: profile.frame_rate,
                display_surface: None,
            },
        );
        let (audio, _) = MediaTrack::audio("placeholder-audio", TrackSource::Silence { sample_rate: 48000 });
        audio.set_enabled(false);

        Ok(MediaStream::new(vec![video, audio]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamscribe_platform_core::{TrackKind, TrackState};

    #[tokio::test(start_paused = true)]
    async fn waits_for_latency_then_builds_placeholder() {
        let join = SimulatedJoin::default();
        let id = SessionId::new("abc123").unwrap();
        let started = tokio::time::Instant::now();

        let stream = join.join(&id).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        let info = stream.info();
        let video = info.video().unwrap();
        assert_eq!(
            video.source,
            TrackSource::Placeholder {
                session_id: "abc123".to_string()
            }
        );
        assert_eq!(video.settings.unwrap().width, 1280);
        assert_eq!(video.state, TrackState::Live);

        let audio: Vec<_> = info.audio().collect();
        assert_eq!(audio.len(), 1);
        assert_eq!(audio[0].kind, TrackKind::Audio);
        assert!(!audio[0].enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn tier_controls_placeholder_resolution() {
        let join = SimulatedJoin::new(Duration::ZERO).with_tier(QualityTier::Ultra);
        let stream = join.join(&SessionId::mint()).await.unwrap();
        let settings = stream.primary_video().unwrap().settings().unwrap();
        assert_eq!((settings.width, settings.height), (3840, 2160));
    }
}
