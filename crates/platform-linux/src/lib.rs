//! Stream Scribe Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **XDG Desktop Portal:** Screen capture consent and PipeWire node negotiation
//! - **Display Detection:** Which display server the session runs on
//! - **Permissions:** Capability detection and user guidance

pub mod permissions;
pub mod portal;

use serde::{Deserialize, Serialize};

/// Display server type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayServer {
    Wayland,
    X11,
    Unknown,
}

/// Detect the current display server.
pub fn detect_display_server() -> DisplayServer {
    display_server_from(
        std::env::var("WAYLAND_DISPLAY").ok().as_deref(),
        std::env::var("XDG_SESSION_TYPE").ok().as_deref(),
        std::env::var("DISPLAY").ok().as_deref(),
    )
}

fn display_server_from(
    wayland_display: Option<&str>,
    session_type: Option<&str>,
    x_display: Option<&str>,
) -> DisplayServer {
    if wayland_display.is_some_and(|v| !v.is_empty()) || session_type == Some("wayland") {
        DisplayServer::Wayland
    } else if x_display.is_some_and(|v| !v.is_empty()) {
        DisplayServer::X11
    } else {
        DisplayServer::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wayland_wins_over_xwayland_display() {
        assert_eq!(
            display_server_from(Some("wayland-0"), None, Some(":0")),
            DisplayServer::Wayland
        );
        assert_eq!(
            display_server_from(None, Some("wayland"), None),
            DisplayServer::Wayland
        );
    }

    #[test]
    fn x11_and_headless_detection() {
        assert_eq!(display_server_from(None, Some("x11"), Some(":0")), DisplayServer::X11);
        assert_eq!(display_server_from(Some(""), None, None), DisplayServer::Unknown);
    }
}
