//! XDG Desktop Portal integration for screen sharing.
//!
//! On modern Linux (Wayland), screen capture must go through the
//! XDG Desktop Portal, which provides a user-consented, sandboxed
//! way to access screen content.
//!
//! # Flow
//!
//! 1. Connect to `org.freedesktop.portal.ScreenCast` via DBus
//! 2. Create a session
//! 3. Select sources (monitor or window) with the cursor embedded
//! 4. Start the session; the compositor shows its picker dialog
//! 5. Receive a PipeWire node ID and open the PipeWire remote
//! 6. Keep the portal session until the share stops, or until the
//!    compositor closes it (the user revoked sharing)

use std::os::fd::OwnedFd;
use std::pin::pin;

use ashpd::desktop::screencast::{CursorMode, Screencast, SourceType};
use ashpd::desktop::{PersistMode, Session};
use futures::StreamExt;
use streamscribe_common::error::{ScribeError, ScribeResult};
use streamscribe_platform_core::{CursorCapture, DisplaySurface};

/// A live ScreenCast portal session.
pub type ScreencastSession = Session<'static, Screencast<'static>>;

/// Result of a successful portal session setup.
#[derive(Debug)]
pub struct PortalSession {
    /// PipeWire node ID for the video stream.
    pub pipewire_node_id: u32,

    /// Stream dimensions reported by the portal, if any.
    pub size: Option<(u32, u32)>,

    /// PipeWire remote; the stream stays readable while this is open.
    pub pipewire_fd: OwnedFd,

    /// The portal session. Close it with [`close_session`] to end the share.
    pub session: ScreencastSession,
}

/// Portal source type for a display surface.
///
/// The portal has no notion of a browser tab, so tabs are offered as windows.
pub fn source_type_for(surface: DisplaySurface) -> SourceType {
    match surface {
        DisplaySurface::Monitor => SourceType::Monitor,
        DisplaySurface::Window | DisplaySurface::Browser => SourceType::Window,
    }
}

fn cursor_mode_for(cursor: CursorCapture) -> CursorMode {
    match cursor {
        CursorCapture::Always => CursorMode::Embedded,
        CursorCapture::Never => CursorMode::Hidden,
    }
}

/// Request a screen capture session through the XDG Desktop Portal.
///
/// A refused or cancelled picker dialog is reported as
/// [`ScribeError::AcquisitionDenied`]; everything that prevents the dialog
/// from appearing at all is [`ScribeError::AcquisitionUnavailable`].
pub async fn request_screencast(
    surface: DisplaySurface,
    cursor: CursorCapture,
) -> ScribeResult<PortalSession> {
    tracing::info!(%surface, ?cursor, "Requesting XDG ScreenCast session");

    let screencast: Screencast<'static> = Screencast::new()
        .await
        .map_err(|e| ScribeError::unavailable(format!("Portal connection failed: {e}")))?;

    let session = screencast
        .create_session()
        .await
        .map_err(|e| ScribeError::unavailable(format!("Session creation failed: {e}")))?;

    screencast
        .select_sources(
            &session,
            cursor_mode_for(cursor),
            source_type_for(surface).into(),
            false,
            None,
            PersistMode::DoNot,
        )
        .await
        .map_err(|e| ScribeError::unavailable(format!("Source selection failed: {e}")))?;

    tracing::debug!("Sources selected, starting portal session");

    let response = screencast
        .start(&session, None)
        .await
        .map_err(|e| ScribeError::unavailable(format!("Screencast start failed: {e}")))?
        .response()
        .map_err(|e| ScribeError::denied(format!("Screencast request was not granted: {e}")))?;

    let stream = response
        .streams()
        .first()
        .ok_or_else(|| ScribeError::unavailable("Portal returned no streams"))?;

    let pipewire_node_id = stream.pipe_wire_node_id();
    if pipewire_node_id == 0 {
        return Err(ScribeError::unavailable(
            "Portal returned invalid PipeWire node ID (0)",
        ));
    }
    let size = stream.size().map(|(w, h)| (w.max(0) as u32, h.max(0) as u32));

    let pipewire_fd = screencast
        .open_pipe_wire_remote(&session)
        .await
        .map_err(|e| ScribeError::unavailable(format!("PipeWire remote failed: {e}")))?;

    tracing::info!(node_id = pipewire_node_id, ?size, "Screen share permission granted");

    Ok(PortalSession {
        pipewire_node_id,
        size,
        pipewire_fd,
        session,
    })
}

/// Resolve once the compositor closes `session`.
///
/// The portal emits `Closed` when the user stops sharing from a system
/// control. Closing the session ourselves does not emit it.
pub async fn wait_for_close(session: &ScreencastSession) -> ScribeResult<()> {
    let closed = session
        .receive_closed()
        .await
        .map_err(|e| ScribeError::platform(format!("Cannot watch portal session: {e}")))?;
    let mut closed = pin!(closed);
    closed.next().await;
    tracing::info!("Portal session closed by the compositor");
    Ok(())
}

/// Close a portal session, ending the screencast.
pub async fn close_session(session: &ScreencastSession) -> ScribeResult<()> {
    session
        .close()
        .await
        .map_err(|e| ScribeError::platform(format!("Failed to close portal session: {e}")))
}

/// Check if the XDG ScreenCast portal is likely reachable.
pub fn is_portal_available() -> bool {
    std::env::var("DBUS_SESSION_BUS_ADDRESS").is_ok()
        && crate::detect_display_server() == crate::DisplayServer::Wayland
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_tabs_are_offered_as_windows() {
        assert_eq!(source_type_for(DisplaySurface::Browser), SourceType::Window);
        assert_eq!(source_type_for(DisplaySurface::Monitor), SourceType::Monitor);
    }

    #[test]
    fn cursor_is_embedded_when_always_captured() {
        assert_eq!(cursor_mode_for(CursorCapture::Always), CursorMode::Embedded);
        assert_eq!(cursor_mode_for(CursorCapture::Never), CursorMode::Hidden);
    }
}
