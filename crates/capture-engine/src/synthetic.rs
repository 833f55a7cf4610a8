//! Locally generated video frames.
//!
//! Two kinds of synthetic feed exist: the placeholder shown to a viewer
//! that "joined" a session, and the test pattern produced by the headless
//! capture backend. Both are paced by a [`RateController`].

use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use streamscribe_common::clock::{RateController, SessionClock};
use streamscribe_platform_core::{TrackInfo, TrackSource};

const MIN_SIDE: u32 = 32;
const BACKGROUND: Rgb<u8> = Rgb([22, 24, 32]);

/// What a synthetic feed draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Stand-in for a remote session's screen.
    Placeholder { session_id: String },
    /// Color bars with a moving marker.
    TestPattern,
}

/// A paced sequence of synthetic frames.
#[derive(Debug)]
pub struct SyntheticFeed {
    kind: FeedKind,
    width: u32,
    height: u32,
    clock: SessionClock,
    rate: RateController,
    frame_index: u64,
}

impl SyntheticFeed {
    pub fn new(kind: FeedKind, width: u32, height: u32, frame_rate: u32) -> Self {
        Self {
            kind,
            width: width.max(MIN_SIDE),
            height: height.max(MIN_SIDE),
            clock: SessionClock::start(),
            rate: RateController::new(frame_rate),
            frame_index: 0,
        }
    }

    /// Feed for a track, if the track's media is generated locally.
    pub fn for_track(track: &TrackInfo) -> Option<Self> {
        let settings = track.settings?;
        let kind = match &track.source {
            TrackSource::Placeholder { session_id } => FeedKind::Placeholder {
                session_id: session_id.clone(),
            },
            TrackSource::TestPattern => FeedKind::TestPattern,
            _ => return None,
        };
        Some(Self::new(
            kind,
            settings.width,
            settings.height,
            settings.frame_rate,
        ))
    }

    pub fn kind(&self) -> &FeedKind {
        &self.kind
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of frames produced so far.
    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }

    /// Render the frame with the given index without advancing the feed.
    pub fn render(&self, frame_index: u64) -> RgbImage {
        match &self.kind {
            FeedKind::Placeholder { session_id } => {
                render_placeholder(self.width, self.height, session_id, frame_index)
            }
            FeedKind::TestPattern => render_test_pattern(self.width, self.height, frame_index),
        }
    }

    /// Next frame if the frame interval has elapsed.
    pub fn poll_frame(&mut self) -> Option<RgbImage> {
        if !self.rate.should_tick(self.clock.elapsed_ns()) {
            return None;
        }
        let frame = self.render(self.frame_index);
        self.frame_index += 1;
        Some(frame)
    }

    /// Wait for and return the next frame.
    pub async fn next_frame(&mut self) -> RgbImage {
        loop {
            if let Some(frame) = self.poll_frame() {
                return frame;
            }
            tokio::time::sleep(self.rate.interval() / 4).await;
        }
    }
}

/// FNV-1a hash, used to derive stable colors from a session id.
fn fnv1a_64(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Accent color for a session id.
pub fn session_color(session_id: &str) -> Rgb<u8> {
    let hash = fnv1a_64(session_id);
    // Keep every channel bright enough to read against the background.
    let channel = |shift: u32| 96 + ((hash >> shift) & 0x9f) as u8;
    Rgb([channel(0), channel(8), channel(16)])
}

fn marker_position(width: u32, height: u32, frame_index: u64, y_frac: f64) -> (i32, i32) {
    let travel = (width / 2).max(1) as u64;
    let step = frame_index % (2 * travel);
    let offset = if step < travel { step } else { 2 * travel - step };
    let x = width / 4 + offset as u32;
    let y = (height as f64 * y_frac) as u32;
    (x as i32, y as i32)
}

/// Render one placeholder frame for a joined session.
///
/// The frame carries an identicon derived from the session id and a marker
/// sweeping left and right, so a viewer can tell the feed is live.
pub fn render_placeholder(width: u32, height: u32, session_id: &str, frame_index: u64) -> RgbImage {
    let width = width.max(MIN_SIDE);
    let height = height.max(MIN_SIDE);
    let mut img = ImageBuffer::from_pixel(width, height, BACKGROUND);
    let accent = session_color(session_id);

    // Accent bands top and bottom
    let band = (height / 16).max(1);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(width, band), accent);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(0, (height - band) as i32).of_size(width, band),
        accent,
    );

    // 5x5 mirrored identicon in the center
    let hash = fnv1a_64(session_id);
    let cell = (height.min(width) / 12).max(1);
    let grid = cell * 5;
    let origin_x = (width.saturating_sub(grid) / 2) as i32;
    let origin_y = (height.saturating_sub(grid) / 2) as i32;
    for row in 0..5u32 {
        for col in 0..3u32 {
            if (hash >> (row * 3 + col)) & 1 == 0 {
                continue;
            }
            for mirrored in [col, 4 - col] {
                draw_filled_rect_mut(
                    &mut img,
                    Rect::at(
                        origin_x + (mirrored * cell) as i32,
                        origin_y + (row * cell) as i32,
                    )
                    .of_size(cell, cell),
                    accent,
                );
            }
        }
    }

    let (mx, my) = marker_position(width, height, frame_index, 0.8);
    draw_filled_circle_mut(
        &mut img,
        (mx, my),
        (cell / 2).max(2) as i32,
        Rgb([235, 235, 240]),
    );

    img
}

/// Render one test-pattern frame.
pub fn render_test_pattern(width: u32, height: u32, frame_index: u64) -> RgbImage {
    let width = width.max(MIN_SIDE);
    let height = height.max(MIN_SIDE);
    let mut img = ImageBuffer::from_pixel(width, height, BACKGROUND);

    let colors = [
        Rgb([255, 0, 0]),
        Rgb([0, 255, 0]),
        Rgb([0, 0, 255]),
        Rgb([255, 255, 0]),
        Rgb([255, 0, 255]),
        Rgb([0, 255, 255]),
    ];
    let bar_width = (width / colors.len() as u32).max(1);
    for (i, color) in colors.iter().enumerate() {
        let x = i as u32 * bar_width;
        if x >= width {
            break;
        }
        draw_filled_rect_mut(
            &mut img,
            Rect::at(x as i32, 0).of_size(bar_width.min(width - x), height / 2),
            *color,
        );
    }

    let (mx, my) = marker_position(width, height, frame_index, 0.75);
    draw_filled_circle_mut(&mut img, (mx, my), (height / 20).max(2) as i32, Rgb([50, 255, 50]));

    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamscribe_platform_core::{MediaTrack, VideoSettings};

    #[test]
    fn placeholder_is_deterministic_per_session() {
        let a = render_placeholder(320, 180, "abc123", 7);
        let b = render_placeholder(320, 180, "abc123", 7);
        let other = render_placeholder(320, 180, "zzz999", 7);
        assert_eq!(a.as_raw(), b.as_raw());
        assert_ne!(a.as_raw(), other.as_raw());
        assert_eq!(a.dimensions(), (320, 180));
    }

    #[test]
    fn marker_moves_between_frames() {
        let first = render_placeholder(320, 180, "abc123", 0);
        let later = render_placeholder(320, 180, "abc123", 40);
        assert_ne!(first.as_raw(), later.as_raw());
    }

    #[test]
    fn tiny_dimensions_are_clamped() {
        let frame = render_test_pattern(1, 1, 0);
        assert_eq!(frame.dimensions(), (MIN_SIDE, MIN_SIDE));
    }

    #[test]
    fn session_color_is_stable() {
        assert_eq!(session_color("abc123"), session_color("abc123"));
    }

    #[test]
    fn feed_is_built_only_for_local_sources() {
        let settings = VideoSettings {
            width: 640,
            height: 360,
            frame_rate: 30,
            display_surface: None,
        };
        let (track, _) = MediaTrack::video(
            "placeholder",
            TrackSource::Placeholder {
                session_id: "abc123".to_string(),
            },
            settings,
        );
        let feed = SyntheticFeed::for_track(&track.info()).unwrap();
        assert_eq!(feed.dimensions(), (640, 360));

        let (remote, _) = MediaTrack::video("screen", TrackSource::PipeWire { node_id: 42 }, settings);
        assert!(SyntheticFeed::for_track(&remote.info()).is_none());
    }

    #[test]
    fn first_poll_always_yields_a_frame() {
        let mut feed = SyntheticFeed::new(FeedKind::TestPattern, 64, 64, 30);
        assert!(feed.poll_frame().is_some());
        assert_eq!(feed.frames_produced(), 1);
    }
}
