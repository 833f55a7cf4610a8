//! Capture backends: the acquisition boundary.
//!
//! A backend turns a [`CaptureRequest`] into a [`MediaStream`] or fails
//! with [`ScribeError::AcquisitionDenied`] / [`ScribeError::AcquisitionUnavailable`].
//! Acquisition is all-or-nothing: a backend never returns a stream missing
//! a requested track.

use std::sync::Arc;

use streamscribe_common::error::{ScribeError, ScribeResult};
use streamscribe_platform_core::{CaptureRequest, MediaStream};

#[cfg(target_os = "linux")]
pub mod linux;
pub mod test_pattern;

#[cfg(target_os = "linux")]
pub use linux::PortalBackend;
pub use test_pattern::TestPatternBackend;

/// Abstract interface for platform-specific capture capabilities.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Acquire the requested capture. May wait indefinitely on user consent.
    async fn acquire(&self, request: &CaptureRequest) -> ScribeResult<MediaStream>;
}

/// Selectable backend implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// XDG Desktop Portal screencast (Linux).
    Portal,
    /// Locally generated test pattern.
    TestPattern,
}

impl BackendKind {
    pub fn from_name(name: &str) -> ScribeResult<Self> {
        match name {
            "portal" => Ok(Self::Portal),
            "test-pattern" => Ok(Self::TestPattern),
            other => Err(ScribeError::config(format!(
                "unknown capture backend {other:?} (expected \"portal\" or \"test-pattern\")"
            ))),
        }
    }
}

/// Get a backend implementation.
pub fn get_backend(kind: BackendKind) -> ScribeResult<Arc<dyn CaptureBackend>> {
    match kind {
        BackendKind::TestPattern => Ok(Arc::new(TestPatternBackend::new())),
        #[cfg(target_os = "linux")]
        BackendKind::Portal => Ok(Arc::new(PortalBackend::new())),
        #[cfg(not(target_os = "linux"))]
        BackendKind::Portal => Err(ScribeError::unavailable(
            "Portal capture is only available on Linux",
        )),
    }
}

/// Reject requests without video; display capture always carries a screen.
pub(crate) fn require_video(
    request: &CaptureRequest,
) -> ScribeResult<streamscribe_platform_core::VideoConstraints> {
    request
        .video
        .ok_or_else(|| ScribeError::unavailable("display capture requires a video track"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!(BackendKind::from_name("portal").unwrap(), BackendKind::Portal);
        assert_eq!(
            BackendKind::from_name("test-pattern").unwrap(),
            BackendKind::TestPattern
        );
        assert!(BackendKind::from_name("x11").is_err());
    }

    #[test]
    fn test_pattern_backend_is_always_constructible() {
        let backend = get_backend(BackendKind::TestPattern).unwrap();
        assert_eq!(backend.name(), "test-pattern");
    }
}
