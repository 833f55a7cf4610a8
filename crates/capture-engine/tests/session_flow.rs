use std::sync::Arc;
use std::time::Duration;

use streamscribe_capture_engine::backend::{CaptureBackend, TestPatternBackend};
use streamscribe_capture_engine::identity::parse_link;
use streamscribe_capture_engine::{
    CaptureOptions, CaptureSession, JoinTransport, LinkCodec, QualityChange, QualityTier,
    SessionId, SessionStatus, SimulatedJoin,
};
use streamscribe_common::error::{FailureKind, ScribeError, ScribeResult};
use streamscribe_platform_core::{
    CaptureRequest, DisplaySurface, MediaStream, TrackSource, TrackState,
};

const BASE: &str = "http://localhost:8080/";

fn session(backend: Arc<dyn CaptureBackend>) -> CaptureSession {
    CaptureSession::new(
        backend,
        Arc::new(SimulatedJoin::default()),
        LinkCodec::new(BASE).unwrap(),
    )
}

struct BrokenTransport;

#[async_trait::async_trait]
impl JoinTransport for BrokenTransport {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn join(&self, _session_id: &SessionId) -> ScribeResult<MediaStream> {
        Err(ScribeError::platform("relay unreachable"))
    }
}

/// Backend whose consent dialog is never answered.
struct UnansweredBackend;

#[async_trait::async_trait]
impl CaptureBackend for UnansweredBackend {
    fn name(&self) -> &'static str {
        "unanswered"
    }

    async fn acquire(&self, _request: &CaptureRequest) -> ScribeResult<MediaStream> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn ultra_start_goes_active_with_fresh_identifier_and_link() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = session(backend.clone());

    let info = session
        .start(CaptureOptions {
            audio: true,
            video: true,
            display_surface: DisplaySurface::Monitor,
            quality: QualityTier::Ultra,
        })
        .await
        .unwrap();

    let settings = info.video().unwrap().settings.unwrap();
    assert_eq!(
        (settings.width, settings.height, settings.frame_rate),
        (3840, 2160, 60)
    );
    assert_eq!(session.status(), SessionStatus::Active);
    assert!(session.media().is_some());
    assert!(session.is_host());
    assert!(session.error().is_none());

    let id = session.session_id().unwrap();
    assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());

    let link = session.shareable_link();
    assert_eq!(link, format!("{BASE}?join={id}"));
    assert_eq!(LinkCodec::decode(&parse_link(&link).unwrap()), Some(id));
}

#[tokio::test]
async fn denied_start_ends_in_error_without_media() {
    let backend = Arc::new(TestPatternBackend::refusing(FailureKind::AcquisitionDenied));
    let session = session(backend);

    let err = session.start(CaptureOptions::default()).await.unwrap_err();

    assert!(matches!(err, ScribeError::AcquisitionDenied { .. }));
    assert_eq!(session.status(), SessionStatus::Error);
    assert!(session.media().is_none());
    assert_eq!(session.session_id(), None);
    let failure = session.error().unwrap();
    assert_eq!(failure.kind, FailureKind::AcquisitionDenied);
}

#[tokio::test]
async fn error_is_cleared_by_the_next_attempt() {
    let session = session(Arc::new(TestPatternBackend::new()));
    session
        .start(CaptureOptions {
            video: false,
            ..CaptureOptions::default()
        })
        .await
        .unwrap_err();
    assert_eq!(session.status(), SessionStatus::Error);

    session.start(CaptureOptions::default()).await.unwrap();

    assert_eq!(session.status(), SessionStatus::Active);
    assert!(session.error().is_none());
}

#[tokio::test]
async fn stop_releases_every_track() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = session(backend.clone());
    session.start(CaptureOptions::default()).await.unwrap();

    session.stop();

    assert_eq!(session.status(), SessionStatus::Idle);
    assert!(session.media().is_none());
    assert_eq!(session.session_id(), None);
    assert_eq!(session.shareable_link(), "");
    let controllers = backend.controllers();
    assert_eq!(controllers.len(), 2);
    assert!(controllers.iter().all(|c| c.is_stopped()));

    // Idempotent
    session.stop();
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn toggle_audio_twice_restores_flag_without_touching_capture() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = session(backend.clone());
    session.start(CaptureOptions::default()).await.unwrap();
    let media_id = session.media().unwrap().id;
    let audio = backend.controllers()[1].clone();

    assert!(!session.toggle_audio());
    assert!(!audio.is_enabled());
    assert!(!audio.is_stopped());

    assert!(session.toggle_audio());
    assert!(audio.is_enabled());
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.media().unwrap().id, media_id);
}

#[tokio::test]
async fn toggle_audio_without_media_only_flips_flag() {
    let session = session(Arc::new(TestPatternBackend::new()));
    assert!(!session.toggle_audio());
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn quality_change_is_deferred_while_active() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = session(backend.clone());
    assert_eq!(session.change_quality(QualityTier::Standard), QualityChange::Applied);

    session
        .start(CaptureOptions {
            quality: session.quality(),
            ..CaptureOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(
        session.change_quality(QualityTier::Ultra),
        QualityChange::DeferredUntilRestart
    );

    assert_eq!(session.quality(), QualityTier::Ultra);
    let live = session.media().unwrap();
    assert_eq!(live.video().unwrap().settings.unwrap().width, 1280);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn revoking_the_share_stops_the_session() {
    let backend = Arc::new(TestPatternBackend::new());
    let session = session(backend.clone());
    let mut rx = session.subscribe();
    session.start(CaptureOptions::default()).await.unwrap();

    assert_eq!(backend.revoke(), 2);
    rx.wait_for(|s| s.status == SessionStatus::Idle)
        .await
        .unwrap();

    assert!(session.media().is_none());
    assert_eq!(session.session_id(), None);
    assert!(backend
        .controllers()
        .iter()
        .all(|c| c.state() != TrackState::Live));
}

#[tokio::test(start_paused = true)]
async fn join_becomes_active_viewer_after_latency() {
    let session = session(Arc::new(TestPatternBackend::new()));
    let id = SessionId::new("abc123").unwrap();
    let started = tokio::time::Instant::now();

    let info = session.join(id.clone()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(session.status(), SessionStatus::Active);
    assert!(!session.is_host());
    assert_eq!(session.session_id(), Some(id));
    assert_eq!(
        info.video().unwrap().source,
        TrackSource::Placeholder {
            session_id: "abc123".to_string()
        }
    );
    assert!(info.audio().all(|t| !t.enabled));
}

#[tokio::test(start_paused = true)]
async fn join_reports_requesting_while_waiting() {
    let session = Arc::new(session(Arc::new(TestPatternBackend::new())));
    let joining = {
        let session = session.clone();
        tokio::spawn(async move { session.join(SessionId::new("abc123").unwrap()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(session.status(), SessionStatus::Requesting);
    assert!(matches!(
        session.start(CaptureOptions::default()).await,
        Err(ScribeError::SessionBusy { .. })
    ));

    joining.await.unwrap().unwrap();
    assert_eq!(session.status(), SessionStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn startup_location_with_join_parameter_auto_joins() {
    let session = session(Arc::new(TestPatternBackend::new()));

    let joined = session
        .join_from_location("http://localhost:8080/?join=abc123")
        .await
        .unwrap();

    assert!(joined.is_some());
    assert_eq!(session.status(), SessionStatus::Active);
    assert!(!session.is_host());
    assert_eq!(session.session_id().unwrap().as_str(), "abc123");
}

#[tokio::test]
async fn startup_location_without_join_parameter_stays_idle() {
    let session = session(Arc::new(TestPatternBackend::new()));

    let joined = session.join_from_location(BASE).await.unwrap();

    assert!(joined.is_none());
    assert_eq!(session.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn transport_failure_is_reported_as_join_failed() {
    let session = CaptureSession::new(
        Arc::new(TestPatternBackend::new()),
        Arc::new(BrokenTransport),
        LinkCodec::new(BASE).unwrap(),
    );

    let err = session
        .join(SessionId::new("abc123").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ScribeError::JoinFailed { .. }));
    assert_eq!(session.status(), SessionStatus::Error);
    assert_eq!(session.error().unwrap().kind, FailureKind::JoinFailed);
    assert!(session.media().is_none());
}

#[tokio::test(start_paused = true)]
async fn viewer_stop_returns_to_idle() {
    let session = session(Arc::new(TestPatternBackend::new()));
    session.join(SessionId::new("abc123").unwrap()).await.unwrap();

    session.stop();

    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.shareable_link(), "");
}

#[tokio::test(start_paused = true)]
async fn timed_out_join_returns_to_idle_and_can_be_retried() {
    let session = session(Arc::new(TestPatternBackend::new()));
    let mut rx = session.subscribe();

    let timed_out = tokio::time::timeout(
        Duration::from_millis(100),
        session.join(SessionId::new("abc123").unwrap()),
    )
    .await;

    assert!(timed_out.is_err());
    assert_eq!(session.status(), SessionStatus::Idle);
    assert_eq!(session.session_id(), None);
    assert_eq!(rx.borrow_and_update().status, SessionStatus::Idle);

    session.join(SessionId::new("abc123").unwrap()).await.unwrap();
    assert_eq!(session.status(), SessionStatus::Active);
    assert!(!session.is_host());

    session.start(CaptureOptions::default()).await.unwrap();
    assert!(session.is_host());
}

#[tokio::test(start_paused = true)]
async fn aborted_start_does_not_lock_the_session() {
    let session = Arc::new(CaptureSession::new(
        Arc::new(UnansweredBackend),
        Arc::new(SimulatedJoin::default()),
        LinkCodec::new(BASE).unwrap(),
    ));
    let starting = {
        let session = session.clone();
        tokio::spawn(async move { session.start(CaptureOptions::default()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.status(), SessionStatus::Requesting);

    starting.abort();
    assert!(starting.await.unwrap_err().is_cancelled());

    assert_eq!(session.status(), SessionStatus::Idle);
    session.join(SessionId::new("abc123").unwrap()).await.unwrap();
    assert_eq!(session.status(), SessionStatus::Active);
}
