//! Capability detection and guidance for Linux.
//!
//! Screen sharing needs a portal-capable desktop session and PipeWire;
//! system audio is optional.

use std::path::PathBuf;

/// A system capability that screen sharing may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities and report status.
pub fn check_capabilities() -> Vec<Capability> {
    vec![
        check_portal_access(),
        check_pipewire_access(),
        check_system_audio_access(),
    ]
}

fn runtime_dir() -> Option<PathBuf> {
    std::env::var("XDG_RUNTIME_DIR").ok().map(PathBuf::from)
}

/// Check if the ScreenCast portal can be reached.
fn check_portal_access() -> Capability {
    let available = crate::portal::is_portal_available();

    Capability {
        name: "Screen Capture Portal".to_string(),
        description: "XDG Desktop Portal for screen sharing consent".to_string(),
        available,
        required: true,
        fix_instructions: (!available).then(|| {
            "Run inside a Wayland desktop session with xdg-desktop-portal installed".to_string()
        }),
    }
}

/// Check PipeWire availability.
fn check_pipewire_access() -> Capability {
    let available = runtime_dir()
        .map(|dir| dir.join("pipewire-0").exists())
        .unwrap_or(false);

    Capability {
        name: "PipeWire".to_string(),
        description: "PipeWire multimedia server delivering the shared screen".to_string(),
        available,
        required: true,
        fix_instructions: (!available)
            .then(|| "Install and start PipeWire: systemctl --user enable --now pipewire".to_string()),
    }
}

/// Check system audio capture capability.
fn check_system_audio_access() -> Capability {
    let available = runtime_dir()
        .map(|dir| dir.join("pulse").join("native").exists())
        .unwrap_or(false);

    Capability {
        name: "System Audio".to_string(),
        description: "PulseAudio-compatible monitor source for sharing system audio".to_string(),
        available,
        required: false,
        fix_instructions: (!available)
            .then(|| "Install pipewire-pulse to share system audio".to_string()),
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Stream Scribe System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
