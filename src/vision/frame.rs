//! Captured screen frames and located template matches

use super::region::Region;
use image::GrayImage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One grayscale screen capture. Cloning shares the pixel buffer.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<GrayImage>,
    pub captured_at: Instant,
    /// Sequential capture count (per frame source)
    pub index: u64,
}

impl Frame {
    pub fn new(image: GrayImage, index: u64) -> Self {
        Self {
            image: Arc::new(image),
            captured_at: Instant::now(),
            index,
        }
    }

    pub fn age(&self) -> Duration {
        self.captured_at.elapsed()
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() <= window
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Where a template was found in a frame, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f32,
}

impl MatchResult {
    pub fn new(x: u32, y: u32, width: u32, height: u32, confidence: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn bounds(&self) -> Region {
        Region::from_origin(self.x, self.y, self.width, self.height)
    }
}
