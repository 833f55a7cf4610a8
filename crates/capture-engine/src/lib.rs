//! Stream Scribe Capture Engine
//!
//! Owns the lifecycle of a screen share: turning a quality tier into
//! capture parameters, acquiring media from a backend, muting audio in
//! place, minting the session identifier and share link, and the viewer
//! side of a session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  CaptureSession                  │
//! │  ┌──────────┐ ┌──────────────┐ ┌──────────────┐  │
//! │  │ Quality  │ │ Capture      │ │ Join         │  │
//! │  │ resolver │ │ backend      │ │ transport    │  │
//! │  └────┬─────┘ └──────┬───────┘ └──────┬───────┘  │
//! │       │              │                │          │
//! │       ▼              ▼                ▼          │
//! │  ┌────────────────────────────────────────────┐  │
//! │  │  MediaStream (single owner) + SessionId    │  │
//! │  └────────────────────────────────────────────┘  │
//! │                       │                          │
//! │                       ▼                          │
//! │            LinkCodec  (?join=<id>)               │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The join side is a placeholder: [`join::SimulatedJoin`] renders a local
//! stand-in instead of receiving the host's media.

pub mod backend;
pub mod identity;
pub mod join;
pub mod quality;
pub mod session;
pub mod synthetic;

pub use identity::{LinkCodec, SessionId};
pub use join::{JoinTransport, SimulatedJoin};
pub use quality::{resolve, resolve_named, QualityProfile, QualityTier};
pub use session::*;
