//! Template search over captured frames
//!
//! Scores are correlation coefficients (zero-mean normalized cross correlation) built from
//! `imageproc` cross correlation and integral images, optionally restricted to a capture
//! region. Flat windows score zero, so a blank or single-colour screen never matches.
//! Multi-match search suppresses overlapping detections so one on-screen object is
//! reported once.

use super::frame::{Frame, MatchResult};
use super::region::Region;
use super::template::{Template, TemplateKey, TemplateStore};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::integral_image::{integral_image, integral_squared_image};
use imageproc::template_matching::{MatchTemplateMethod, match_template};

/// Threshold for plain presence checks
pub const DEFAULT_CONFIDENCE: f32 = 0.8;
/// Threshold for prompts that overlap other UI (choice offers, shop icons)
pub const STRICT_CONFIDENCE: f32 = 0.9;
/// A weaker detection is dropped once this share of its box is covered by a stronger one
pub const OVERLAP_SUPPRESSION_RATIO: f32 = 0.3;
/// Per-pixel variance below which a window (or template) has no shape to correlate
const MIN_VARIANCE: f64 = 1.0;

type ScoreImage = ImageBuffer<Luma<f32>, Vec<f32>>;

pub trait ScreenProbe: Send + Sync {
    /// Best match of `key` inside `region` (whole frame when `None`) scoring at least `threshold`
    fn find(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Option<MatchResult>;

    /// All distinct matches of `key`, strongest first
    fn find_all(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Vec<MatchResult>;
}

/// Score surface of one template over a (cropped) frame
struct ScoreMap<'a> {
    template: &'a Template,
    scores: ScoreImage,
    offset_x: u32,
    offset_y: u32,
}

impl ScoreMap<'_> {
    fn candidates(&self, threshold: f32) -> impl Iterator<Item = MatchResult> + '_ {
        self.scores.enumerate_pixels().filter_map(move |(x, y, pixel)| {
            let confidence = pixel[0];
            (confidence.is_finite() && confidence >= threshold).then(|| {
                MatchResult::new(
                    self.offset_x + x,
                    self.offset_y + y,
                    self.template.width(),
                    self.template.height(),
                    confidence,
                )
            })
        })
    }
}

pub struct TemplateProbe<S> {
    store: S,
}

impl<S: TemplateStore> TemplateProbe<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn score_map(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
    ) -> Option<ScoreMap<'_>> {
        let Some(template) = self.store.load(key) else {
            log::warn!("⚠️ Template {key} is not loaded, treating it as not on screen");
            return None;
        };

        let (frame_width, frame_height) = frame.dimensions();
        let search = match region {
            Some(region) => region.clip_to(frame_width, frame_height)?,
            None => Region::from_origin(0, 0, frame_width, frame_height),
        };
        let search_width = search.width() + 1;
        let search_height = search.height() + 1;

        if template.width() > search_width || template.height() > search_height {
            log::debug!(
                "Template {key} ({}x{}) larger than search area {}x{}",
                template.width(),
                template.height(),
                search_width,
                search_height
            );
            return None;
        }

        let cropped: GrayImage = image::imageops::crop_imm(
            frame.image.as_ref(),
            search.min_x,
            search.min_y,
            search_width,
            search_height,
        )
        .to_image();

        let scores = correlation_coefficient(&cropped, &template.image);

        Some(ScoreMap {
            template,
            scores,
            offset_x: search.min_x,
            offset_y: search.min_y,
        })
    }
}

/// Correlation coefficient of `template` at every offset of `image`:
/// `(sum(I*T) - mean(T) * sum(I)) / sqrt(var_sum(I) * var_sum(T))`.
/// Windows or templates without variance score zero.
fn correlation_coefficient(image: &GrayImage, template: &GrayImage) -> ScoreImage {
    let (tw, th) = template.dimensions();
    let n = f64::from(tw * th);

    let (t_sum, t_squares) = template.pixels().fold((0.0f64, 0.0f64), |(sum, sq), p| {
        let v = f64::from(p[0]);
        (sum + v, sq + v * v)
    });
    let t_mean = t_sum / n;
    let t_var_sum = t_squares - t_sum * t_mean;

    let cross = match_template(image, template, MatchTemplateMethod::CrossCorrelation);
    if t_var_sum < MIN_VARIANCE * n {
        log::debug!("Flat {tw}x{th} template can never match");
        return ScoreImage::new(cross.width(), cross.height());
    }

    let sums: ImageBuffer<Luma<u64>, Vec<u64>> = integral_image(image);
    let squares: ImageBuffer<Luma<u64>, Vec<u64>> = integral_squared_image(image);
    // Integral images carry a leading zero row and column: (x, y) sums pixels above-left
    let window = |table: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32| -> f64 {
        let at = |x: u32, y: u32| table.get_pixel(x, y)[0];
        let total = at(x + tw, y + th) + at(x, y) - at(x + tw, y) - at(x, y + th);
        total as f64
    };

    ImageBuffer::from_fn(cross.width(), cross.height(), |x, y| {
        let i_sum = window(&sums, x, y);
        let i_var_sum = window(&squares, x, y) - i_sum * i_sum / n;
        if i_var_sum < MIN_VARIANCE * n {
            return Luma([0.0]);
        }
        let numerator = f64::from(cross.get_pixel(x, y)[0]) - t_mean * i_sum;
        Luma([(numerator / (i_var_sum * t_var_sum).sqrt()) as f32])
    })
}

impl<S: TemplateStore> ScreenProbe for TemplateProbe<S> {
    fn find(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Option<MatchResult> {
        let map = self.score_map(frame, key, region)?;
        map.candidates(threshold).max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    fn find_all(
        &self,
        frame: &Frame,
        key: &TemplateKey,
        region: Option<Region>,
        threshold: f32,
    ) -> Vec<MatchResult> {
        let Some(map) = self.score_map(frame, key, region) else {
            return Vec::new();
        };
        suppress_overlaps(map.candidates(threshold).collect())
    }
}

/// Greedy non-maximum suppression: keep the strongest detection, drop any weaker one whose
/// box is covered beyond [`OVERLAP_SUPPRESSION_RATIO`] by something already kept.
pub fn suppress_overlaps(mut candidates: Vec<MatchResult>) -> Vec<MatchResult> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<MatchResult> = Vec::new();
    for candidate in candidates {
        let bounds = candidate.bounds();
        let overlaps_stronger = kept
            .iter()
            .any(|k| bounds.overlap_ratio(&k.bounds()) > OVERLAP_SUPPRESSION_RATIO);
        if !overlaps_stronger {
            kept.push(candidate);
        }
    }
    kept
}
