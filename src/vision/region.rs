//! Screen regions used for click targets and search crops

use rand::Rng;

/// Axis-aligned box in screen pixels, both corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl Region {
    pub const fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        assert!(min_x <= max_x && min_y <= max_y, "region corners out of order");
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Region covering `width` x `height` pixels from a top-left corner
    pub fn from_origin(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::new(
            x,
            y,
            x + width.saturating_sub(1),
            y + height.saturating_sub(1),
        )
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (u32, u32) {
        (
            self.min_x + self.width() / 2,
            self.min_y + self.height() / 2,
        )
    }

    pub fn contains(&self, (x, y): (u32, u32)) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Uniform random point inside the region, used to humanize taps
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, u32) {
        (
            rng.gen_range(self.min_x..=self.max_x),
            rng.gen_range(self.min_y..=self.max_y),
        )
    }

    /// Clip to a `width` x `height` frame. `None` when nothing is left.
    pub fn clip_to(&self, width: u32, height: u32) -> Option<Region> {
        if width == 0 || height == 0 || self.min_x >= width || self.min_y >= height {
            return None;
        }
        Some(Region::new(
            self.min_x,
            self.min_y,
            self.max_x.min(width - 1),
            self.max_y.min(height - 1),
        ))
    }

    fn area(&self) -> u64 {
        (self.width() as u64 + 1) * (self.height() as u64 + 1)
    }

    /// Share of this region's area that is covered by `other` (0.0 to 1.0)
    pub fn overlap_ratio(&self, other: &Region) -> f32 {
        let min_x = self.min_x.max(other.min_x);
        let min_y = self.min_y.max(other.min_y);
        let max_x = self.max_x.min(other.max_x);
        let max_y = self.max_y.min(other.max_y);
        if min_x > max_x || min_y > max_y {
            return 0.0;
        }
        let intersection = (max_x - min_x + 1) as u64 * (max_y - min_y + 1) as u64;
        intersection as f32 / self.area() as f32
    }
}
