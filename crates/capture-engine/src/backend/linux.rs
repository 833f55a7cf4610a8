use std::future::Future;
use std::sync::Arc;

use streamscribe_common::error::{ScribeError, ScribeResult};
use streamscribe_platform_core::{
    CaptureRequest, MediaStream, MediaTrack, TrackController, TrackSource, VideoSettings,
};
use streamscribe_platform_linux::portal::{
    close_session, is_portal_available, request_screencast, wait_for_close, ScreencastSession,
};
use streamscribe_platform_linux::{detect_display_server, DisplayServer};
use tokio::task::JoinHandle;

use crate::backend::{require_video, CaptureBackend};

/// PulseAudio-compatible name of the default output monitor.
const SYSTEM_AUDIO_MONITOR: &str = "@DEFAULT_MONITOR@";

/// Screen capture through the XDG ScreenCast portal.
///
/// The returned video track references the portal's PipeWire node. The
/// PipeWire remote and the portal session stay attached to the stream until
/// it is stopped; if the compositor closes the session first, the video
/// track ends.
#[derive(Debug, Default)]
pub struct PortalBackend;

impl PortalBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CaptureBackend for PortalBackend {
    fn name(&self) -> &'static str {
        "portal"
    }

    async fn acquire(&self, request: &CaptureRequest) -> ScribeResult<MediaStream> {
        let video = require_video(request)?;

        let display_server = detect_display_server();
        tracing::info!(?display_server, "Detected display server on portal backend");
        if display_server != DisplayServer::Wayland || !is_portal_available() {
            return Err(ScribeError::unavailable(
                "XDG ScreenCast portal is not available for this session",
            ));
        }

        let portal = request_screencast(video.display_surface, video.cursor).await?;
        let (width, height) = portal.size.unwrap_or((video.width, video.height));

        let (video_track, video_ctl) = MediaTrack::video(
            format!("screen:{}", video.display_surface),
            TrackSource::PipeWire {
                node_id: portal.pipewire_node_id,
            },
            VideoSettings {
                width,
                height,
                frame_rate: video.frame_rate,
                display_surface: Some(video.display_surface),
            },
        );
        let mut tracks = vec![video_track];

        if request.audio {
            let (audio_track, _) = MediaTrack::audio(
                "system-audio",
                TrackSource::SystemAudio {
                    device: SYSTEM_AUDIO_MONITOR.to_string(),
                },
            );
            tracks.push(audio_track);
        }

        let session = Arc::new(portal.session);
        let close_watch = {
            let session = session.clone();
            end_track_on(
                async move {
                    if let Err(e) = wait_for_close(&session).await {
                        tracing::warn!(error = %e, "Revoking the share will not stop the session");
                        std::future::pending::<()>().await;
                    }
                },
                video_ctl,
            )
        };

        let mut stream = MediaStream::new(tracks);
        stream.attach_resource(portal.pipewire_fd);
        stream.attach_resource(PortalLease {
            session,
            close_watch,
        });
        Ok(stream)
    }
}

/// End the track behind `controller` once `closed` resolves.
fn end_track_on(
    closed: impl Future<Output = ()> + Send + 'static,
    controller: TrackController,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        closed.await;
        if controller.end() {
            tracing::debug!("Video track ended by its source");
        }
    })
}

/// Keeps the portal session open while the stream holds it.
struct PortalLease {
    session: Arc<ScreencastSession>,
    close_watch: JoinHandle<()>,
}

impl Drop for PortalLease {
    fn drop(&mut self) {
        self.close_watch.abort();
        let session = self.session.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = close_session(&session).await {
                        tracing::warn!(error = %e, "Portal session left open");
                    }
                });
            }
            Err(_) => tracing::warn!("No runtime to close the portal session on"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamscribe_platform_core::TrackState;
    use tokio::sync::oneshot;

    fn screen_track() -> (MediaTrack, TrackController) {
        MediaTrack::video(
            "screen:monitor",
            TrackSource::PipeWire { node_id: 42 },
            VideoSettings {
                width: 1920,
                height: 1080,
                frame_rate: 60,
                display_surface: None,
            },
        )
    }

    #[tokio::test]
    async fn closing_the_portal_ends_the_video_track() {
        let (track, controller) = screen_track();
        let (closed_tx, closed_rx) = oneshot::channel::<()>();

        let watch = end_track_on(
            async move {
                let _ = closed_rx.await;
            },
            controller,
        );
        closed_tx.send(()).unwrap();
        watch.await.unwrap();

        assert_eq!(track.state(), TrackState::Ended);
        track.ended().await;
    }

    #[tokio::test]
    async fn stopped_track_is_not_ended_by_a_late_close() {
        let (track, controller) = screen_track();
        let (closed_tx, closed_rx) = oneshot::channel::<()>();
        let watch = end_track_on(
            async move {
                let _ = closed_rx.await;
            },
            controller,
        );

        track.stop();
        closed_tx.send(()).unwrap();
        watch.await.unwrap();

        assert_eq!(track.state(), TrackState::Stopped);
    }
}
