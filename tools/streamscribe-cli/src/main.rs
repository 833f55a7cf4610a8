//! Stream Scribe CLI - host a screen share or join one by link.
//!
//! Usage:
//!   streamscribe host [OPTIONS]         Start sharing and print the link
//!   streamscribe join <LINK_OR_ID>      Join a session (simulated)
//!   streamscribe link <ID>              Build a share link
//!   streamscribe decode <URL>           Read the session id from a link
//!   streamscribe profiles               List quality tiers
//!   streamscribe check                  Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use streamscribe_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "streamscribe",
    about = "Share your screen and hand out a link to it",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start sharing the screen
    Host {
        /// Surface to capture: monitor|window|browser
        #[arg(long)]
        surface: Option<String>,

        /// Quality tier: standard|high|ultra
        #[arg(long)]
        quality: Option<String>,

        /// Share without audio
        #[arg(long)]
        no_audio: bool,

        /// Request no video (capture will be refused)
        #[arg(long)]
        no_video: bool,

        /// Capture backend: portal|test-pattern
        #[arg(long, default_value = "portal")]
        backend: String,

        /// Page locator share links are built on
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Join an existing session by link or identifier
    Join {
        /// Share link or bare session identifier
        target: String,

        /// Simulated connection latency in milliseconds
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Write one placeholder frame to this PNG file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Build the share link for a session identifier
    Link {
        /// Session identifier
        id: String,

        /// Page locator to build on
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the session identifier carried by a link
    Decode {
        /// Share link
        url: String,
    },

    /// List quality tiers and their capture parameters
    Profiles,

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    streamscribe_common::logging::init_logging(&logging);

    let defaults = config.session;
    match cli.command {
        Commands::Host {
            surface,
            quality,
            no_audio,
            no_video,
            backend,
            base_url,
        } => {
            commands::host::run(commands::host::HostArgs {
                surface: surface.unwrap_or(defaults.display_surface),
                quality: quality.unwrap_or(defaults.default_quality),
                audio: defaults.audio_enabled && !no_audio,
                video: !no_video,
                backend,
                base_url: base_url.unwrap_or(defaults.share_base_url),
            })
            .await
        }
        Commands::Join {
            target,
            latency_ms,
            snapshot,
        } => {
            commands::join::run(
                target,
                latency_ms.unwrap_or(defaults.join_latency_ms),
                defaults.share_base_url,
                snapshot,
            )
            .await
        }
        Commands::Link { id, base_url } => {
            commands::link::encode(id, base_url.unwrap_or(defaults.share_base_url))
        }
        Commands::Decode { url } => commands::link::decode(url),
        Commands::Profiles => commands::profiles::run(),
        Commands::Check => commands::check::run(),
    }
}
