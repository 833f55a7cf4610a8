//! Host a screen share.

use std::sync::Arc;

use streamscribe_capture_engine::backend::{get_backend, BackendKind};
use streamscribe_capture_engine::{
    CaptureOptions, CaptureSession, LinkCodec, QualityChange, QualityTier, SessionStatus,
    SimulatedJoin,
};
use streamscribe_common::clock::SessionClock;
use streamscribe_platform_core::{DisplaySurface, MediaStreamInfo};
use tokio::io::{AsyncBufReadExt, BufReader};

pub struct HostArgs {
    pub surface: String,
    pub quality: String,
    pub audio: bool,
    pub video: bool,
    pub backend: String,
    pub base_url: String,
}

enum Command {
    ToggleAudio,
    Quality(QualityTier),
    Stop,
    Help,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "a" | "audio" => Some(Command::ToggleAudio),
        "q" | "quality" => Some(Command::Quality(QualityTier::from_name(
            parts.next().unwrap_or_default(),
        ))),
        "s" | "stop" => Some(Command::Stop),
        _ => Some(Command::Help),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  a            toggle audio");
    println!("  q <tier>     select quality (standard|high|ultra)");
    println!("  s            stop sharing");
}

fn print_media(info: &MediaStreamInfo) {
    for track in &info.tracks {
        match track.settings {
            Some(s) => println!(
                "  {:?} [{}] {}x{} @ {}fps",
                track.kind, track.label, s.width, s.height, s.frame_rate
            ),
            None => println!(
                "  {:?} [{}] {}",
                track.kind,
                track.label,
                if track.enabled { "enabled" } else { "muted" }
            ),
        }
    }
}

/// Capture request for the host flags. Audio is only captured when wanted.
fn capture_options(args: &HostArgs) -> CaptureOptions {
    CaptureOptions {
        audio: args.audio,
        video: args.video,
        display_surface: DisplaySurface::from_name(&args.surface),
        quality: QualityTier::from_name(&args.quality),
    }
}

pub async fn run(args: HostArgs) -> anyhow::Result<()> {
    let backend = get_backend(BackendKind::from_name(&args.backend)?)?;
    let options = capture_options(&args);
    let CaptureOptions {
        quality,
        display_surface,
        ..
    } = options;

    let session = CaptureSession::new(
        backend,
        Arc::new(SimulatedJoin::default()),
        LinkCodec::new(&args.base_url)?,
    )
    .with_defaults(args.audio, quality);

    println!("Starting screen share");
    println!("  Backend: {}", args.backend);
    println!("  Surface: {display_surface}");
    println!("  Quality: {} ({})", quality.label(), quality.profile());
    println!("  Audio: {}", if args.audio { "on" } else { "off" });
    println!();

    let info = session.start(options).await?;

    tracing::info!(
        backend = %args.backend,
        tracks = info.tracks.len(),
        link = %session.shareable_link(),
        "Hosting session"
    );
    print_media(&info);
    println!();
    println!("Share this link: {}", session.shareable_link());
    println!();
    print_help();
    println!("Press Ctrl+C to stop sharing...");

    let clock = SessionClock::start();
    let mut snapshots = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                session.stop();
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() || snapshots.borrow_and_update().status != SessionStatus::Active {
                    println!("Screen sharing has ended");
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    continue;
                };
                match parse_command(&line) {
                    Some(Command::ToggleAudio) => {
                        let enabled = session.toggle_audio();
                        println!("Audio {}", if enabled { "enabled" } else { "disabled" });
                    }
                    Some(Command::Quality(tier)) => match session.change_quality(tier) {
                        QualityChange::Applied => println!("Quality set to {}", tier.label()),
                        QualityChange::DeferredUntilRestart => {
                            println!("To apply {tier} quality, please restart your stream")
                        }
                    },
                    Some(Command::Stop) => {
                        session.stop();
                        break;
                    }
                    Some(Command::Help) => print_help(),
                    None => {}
                }
            }
        }
    }

    tracing::info!(elapsed_secs = clock.elapsed_secs(), "Hosting finished");
    println!("Shared for {:.1}s", clock.elapsed_secs());
    Ok(())
}
