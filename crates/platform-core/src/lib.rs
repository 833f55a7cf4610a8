//! Stream Scribe platform core contracts.
//!
//! This crate contains the cross-platform shapes that cross the acquisition
//! boundary: what a caller asks a capture backend for, and the media a
//! backend hands back. It does not know about any concrete OS backend.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod media;

pub use media::*;

/// Kind of display surface the user is asked to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplaySurface {
    /// A whole monitor.
    #[default]
    Monitor,
    /// A single application window.
    Window,
    /// A browser tab.
    Browser,
}

impl DisplaySurface {
    pub const ALL: [DisplaySurface; 3] = [Self::Monitor, Self::Window, Self::Browser];

    /// Parse a surface name, falling back to [`DisplaySurface::Monitor`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "window" => Self::Window,
            "browser" => Self::Browser,
            _ => Self::Monitor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Window => "window",
            Self::Browser => "browser",
        }
    }
}

impl fmt::Display for DisplaySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the pointer appears in captured video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorCapture {
    /// Cursor is always drawn into the frames.
    #[default]
    Always,
    /// Cursor is never drawn.
    Never,
}

/// Concrete video parameters requested from a backend.
///
/// Dimensions and frame rate are targets, not guarantees: a backend may
/// deliver whatever the source actually produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub display_surface: DisplaySurface,
    pub cursor: CursorCapture,
}

/// A single capture acquisition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Whether an audio track is wanted.
    pub audio: bool,
    /// Video parameters, or `None` when no video is wanted.
    pub video: Option<VideoConstraints>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_names_parse_leniently() {
        assert_eq!(DisplaySurface::from_name("window"), DisplaySurface::Window);
        assert_eq!(DisplaySurface::from_name(" Browser "), DisplaySurface::Browser);
        assert_eq!(DisplaySurface::from_name("monitor"), DisplaySurface::Monitor);
        assert_eq!(DisplaySurface::from_name("tv"), DisplaySurface::Monitor);
    }

    #[test]
    fn surface_display_matches_wire_name() {
        for surface in DisplaySurface::ALL {
            assert_eq!(DisplaySurface::from_name(&surface.to_string()), surface);
        }
        assert_eq!(DisplaySurface::Browser.to_string(), "browser");
    }
}
