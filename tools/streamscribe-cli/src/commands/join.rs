//! Join a session by link or identifier.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use streamscribe_capture_engine::backend::TestPatternBackend;
use streamscribe_capture_engine::synthetic::SyntheticFeed;
use streamscribe_capture_engine::{CaptureSession, LinkCodec, SimulatedJoin};

pub async fn run(
    target: String,
    latency_ms: u64,
    base_url: String,
    snapshot: Option<PathBuf>,
) -> anyhow::Result<()> {
    let session_id = LinkCodec::identifier_from_input(&target)?;

    println!("{}", SimulatedJoin::NOTICE);
    println!();
    println!("Joining session {session_id}...");

    // Viewers never capture; the backend only satisfies the constructor.
    let session = CaptureSession::new(
        Arc::new(TestPatternBackend::new()),
        Arc::new(SimulatedJoin::new(Duration::from_millis(latency_ms))),
        LinkCodec::new(&base_url)?,
    );
    let info = session.join(session_id).await?;
    tracing::debug!(tracks = info.tracks.len(), "Placeholder stream ready");

    let snapshot_view = session.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot_view)?);

    if let Some(path) = snapshot {
        let video = info
            .video()
            .ok_or_else(|| anyhow::anyhow!("Joined stream has no video track"))?;
        let mut feed = SyntheticFeed::for_track(video)
            .ok_or_else(|| anyhow::anyhow!("Joined video is not rendered locally"))?;
        let frame = feed.next_frame().await;
        frame
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        println!("Placeholder frame written to: {}", path.display());
    }

    session.stop();
    Ok(())
}
