// THEORY:
// The `MotionDetector` is the stateful core of the vision system. It keeps
// exactly one preprocessed field from the previous frame and measures how much
// of the scene changed between that field and the current one.
//
// Key architectural principles:
// 1.  **One-Frame Memory**: The only state is `previous_field`. It is replaced,
//     never merged, on every call. The first call (and the first call after a
//     resolution change) has nothing to compare against and reports no motion.
// 2.  **Differencing**: The absolute per-pixel difference between the two
//     fields is binarized against `sensitivity`.
// 3.  **Morphology**: The change mask is dilated so that the fragments of one
//     moving subject (split by shadows or partial occlusion) merge into a
//     single region.
// 4.  **External Regions**: Regions are 8-connected groups of changed pixels
//     with their holes filled, which is the area enclosed by each outer
//     boundary. Regions at or below `min_area` are treated as flicker.
// 5.  **Scoring**: The surviving area is expressed as an amplified percentage
//     of the frame and clamped to [0, 100].

use crate::core_modules::frame_preprocessor::frame_preprocessor::preprocess;
use crate::error::VisionError;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::region_labelling::{Connectivity, connected_components};
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

const ON: u8 = 255;
const OFF: u8 = 0;

pub const DEFAULT_SENSITIVITY: u8 = 25;
pub const DEFAULT_MIN_AREA: u32 = 20;
pub const DEFAULT_DILATE_ITERATIONS: u32 = 2;
/// A bee covers a tiny fraction of the frame; without amplification realistic
/// traffic rounds to zero on the percentage scale.
pub const DEFAULT_SCORE_SCALE: f64 = 10.0;

/// Tunable parameters of the motion detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Minimum absolute intensity difference (1-255) for a pixel to count as
    /// changed. Lower values are more sensitive. Zero behaves like 1, so an
    /// unchanged pixel never counts.
    pub sensitivity: u8,
    /// Regions with an area at or below this many pixels are discarded.
    pub min_area: u32,
    /// Number of 3x3 dilation passes applied to the change mask.
    pub dilate_iterations: u32,
    /// Amplification applied to the changed-area percentage before clamping.
    pub score_scale: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            min_area: DEFAULT_MIN_AREA,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            score_scale: DEFAULT_SCORE_SCALE,
        }
    }
}

/// The result of comparing one frame with its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityReading {
    /// Amplified percentage of the frame covered by motion, in [0, 100].
    pub score: f64,
    /// Summed area of the motion regions that passed the area filter.
    pub motion_pixels: u64,
}

/// Frame-differencing detector with a single frame of lookback.
pub struct MotionDetector {
    config: DetectorConfig,
    /// The preprocessed field of the last frame seen, if any.
    previous_field: Option<GrayImage>,
}

impl MotionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            previous_field: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Whether a previous field is stored for the next comparison.
    pub fn has_reference(&self) -> bool {
        self.previous_field.is_some()
    }

    /// Forgets the previous field. The next call behaves like a cold start.
    pub fn reset(&mut self) {
        self.previous_field = None;
    }

    /// Measures motion between `image` and the previous frame, then makes
    /// `image` the new reference.
    ///
    /// Fails only when the frame cannot be preprocessed, in which case the
    /// stored reference is left untouched.
    pub fn detect_motion(&mut self, image: &DynamicImage) -> Result<ActivityReading, VisionError> {
        let current = preprocess(image)?;

        let reading = match self.previous_field.as_ref() {
            None => {
                debug!("No previous frame yet, storing {}x{} reference", current.width(), current.height());
                ActivityReading::default()
            }
            Some(previous) if previous.dimensions() != current.dimensions() => {
                warn!(
                    "Frame size changed from {:?} to {:?}, restarting comparison",
                    previous.dimensions(),
                    current.dimensions()
                );
                ActivityReading::default()
            }
            Some(previous) => measure_motion(previous, &current, &self.config),
        };

        self.previous_field = Some(current);
        Ok(reading)
    }
}

/// Compares two preprocessed fields of equal dimensions.
pub fn measure_motion(previous: &GrayImage, current: &GrayImage, config: &DetectorConfig) -> ActivityReading {
    // --- 1. Differencing & Binarization ---
    let mask = change_mask(previous, current, config.sensitivity);

    // --- 2. Dilation ---
    let mask = dilate_mask(mask, config.dilate_iterations);

    // --- 3. Region Extraction & Area Filter ---
    // Areas are summed as reals and truncated once.
    let min_area = config.min_area as f64;
    let areas = external_region_areas(&mask);
    let kept: Vec<f64> = areas.iter().copied().filter(|&area| area > min_area).collect();
    let motion_area: f64 = kept.iter().sum();

    // --- 4. Scoring ---
    let frame_area = current.width() as f64 * current.height() as f64;
    let score = activity_score(motion_area, frame_area, config.score_scale);

    debug!(
        "{} regions, {} above {} px, motion_pixels={}, score={:.1}",
        areas.len(),
        kept.len(),
        config.min_area,
        motion_area as u64,
        score
    );

    ActivityReading {
        score,
        motion_pixels: motion_area as u64,
    }
}

/// Binary mask of pixels whose absolute difference is at least `sensitivity`.
/// A zero difference is never a change, whatever the sensitivity.
pub fn change_mask(previous: &GrayImage, current: &GrayImage, sensitivity: u8) -> GrayImage {
    let threshold = sensitivity.max(1);
    GrayImage::from_fn(current.width(), current.height(), |x, y| {
        let delta = previous.get_pixel(x, y).0[0].abs_diff(current.get_pixel(x, y).0[0]);
        Luma([if delta >= threshold { ON } else { OFF }])
    })
}

/// Applies `iterations` passes of a 3x3 square dilation.
pub fn dilate_mask(mask: GrayImage, iterations: u32) -> GrayImage {
    (0..iterations).fold(mask, |mask, _| dilate(&mask, Norm::LInf, 1))
}

/// Areas of the external regions of a binary mask, in label order.
///
/// Each region is an 8-connected group of set pixels together with every hole
/// it encloses, so a region nested inside another region's hole is part of the
/// outer one.
pub fn external_region_areas(mask: &GrayImage) -> Vec<f64> {
    let filled = fill_holes(mask);
    let labels = connected_components(&filled, Connectivity::Eight, Luma([OFF]));

    let mut areas: BTreeMap<u32, f64> = BTreeMap::new();
    for label in labels.pixels().map(|p| p.0[0]).filter(|&label| label != 0) {
        *areas.entry(label).or_insert(0.0) += 1.0;
    }
    areas.into_values().collect()
}

/// Sets every background pixel that is not 4-connected to the image border.
fn fill_holes(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    if width == 0 || height == 0 {
        return mask.clone();
    }

    let background = GrayImage::from_fn(width, height, |x, y| {
        Luma([if mask.get_pixel(x, y).0[0] == OFF { ON } else { OFF }])
    });
    // The complement of an 8-connected foreground is 4-connected.
    let labels = connected_components(&background, Connectivity::Four, Luma([OFF]));

    let mut outside: HashSet<u32> = HashSet::new();
    for x in 0..width {
        outside.insert(labels.get_pixel(x, 0).0[0]);
        outside.insert(labels.get_pixel(x, height - 1).0[0]);
    }
    for y in 0..height {
        outside.insert(labels.get_pixel(0, y).0[0]);
        outside.insert(labels.get_pixel(width - 1, y).0[0]);
    }

    GrayImage::from_fn(width, height, |x, y| {
        let label = labels.get_pixel(x, y).0[0];
        let in_hole = label != 0 && !outside.contains(&label);
        Luma([if mask.get_pixel(x, y).0[0] != OFF || in_hole { ON } else { OFF }])
    })
}

/// Amplified percentage of `frame_area` covered by `motion_pixels`, clamped to
/// [0, 100]. Returns 0 for a non-positive frame area.
pub fn activity_score(motion_pixels: f64, frame_area: f64, scale: f64) -> f64 {
    if frame_area.is_nan() || frame_area <= 0.0 {
        return 0.0;
    }
    let score = (motion_pixels / frame_area) * 100.0 * scale;
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}
