//! Headless capture backend producing a synthetic test pattern.

use parking_lot::Mutex;
use streamscribe_common::error::{FailureKind, ScribeError, ScribeResult};
use streamscribe_platform_core::{
    CaptureRequest, MediaStream, MediaTrack, TrackController, TrackSource, VideoSettings,
};

use crate::backend::{require_video, CaptureBackend};

/// Capture backend that needs no display server.
///
/// It grants every request with a test-pattern video track (and a silent
/// audio track when audio is requested), or refuses every request when
/// built with [`TestPatternBackend::refusing`]. It keeps the source-side
/// controller of every track it hands out, so a caller can simulate the
/// user revoking the share.
#[derive(Debug, Default)]
pub struct TestPatternBackend {
    refusal: Option<FailureKind>,
    controllers: Mutex<Vec<TrackController>>,
    requests: Mutex<Vec<CaptureRequest>>,
}

impl TestPatternBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that fails every acquisition with the given kind.
    pub fn refusing(kind: FailureKind) -> Self {
        Self {
            refusal: Some(kind),
            ..Self::default()
        }
    }

    /// Controllers of every track handed out so far, oldest first.
    pub fn controllers(&self) -> Vec<TrackController> {
        self.controllers.lock().clone()
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.requests.lock().clone()
    }

    /// End every live track, as if the user stopped sharing from a system
    /// control. Returns how many tracks were ended.
    pub fn revoke(&self) -> usize {
        self.controllers
            .lock()
            .iter()
            .filter(|controller| controller.end())
            .count()
    }
}

#[async_trait::async_trait]
impl CaptureBackend for TestPatternBackend {
    fn name(&self) -> &'static str {
        "test-pattern"
    }

    async fn acquire(&self, request: &CaptureRequest) -> ScribeResult<MediaStream> {
        self.requests.lock().push(*request);

        match self.refusal {
            Some(FailureKind::AcquisitionDenied) => {
                return Err(ScribeError::denied("test pattern source refused capture"))
            }
            Some(_) => return Err(ScribeError::unavailable("test pattern source is offline")),
            None => {}
        }

        let video = require_video(request)?;
        let mut controllers = self.controllers.lock();

        let (video_track, video_ctl) = MediaTrack::video(
            format!("test-pattern:{}", video.display_surface),
            TrackSource::TestPattern,
            VideoSettings {
                width: video.width,
                height: video.height,
                frame_rate: video.frame_rate,
                display_surface: Some(video.display_surface),
            },
        );
        controllers.push(video_ctl);
        let mut tracks = vec![video_track];

        if request.audio {
            let (audio_track, audio_ctl) =
                MediaTrack::audio("test-tone", TrackSource::Silence { sample_rate: 48000 });
            controllers.push(audio_ctl);
            tracks.push(audio_track);
        }

        tracing::debug!(tracks = tracks.len(), "Test pattern stream acquired");
        Ok(MediaStream::new(tracks))
    }
}
