// THEORY:
// The `pipeline` module is the top-level API of the vision crate. It wires the
// stages together for a single frame: preprocessing and differencing in the
// `MotionDetector`, then classification of the resulting score, then the
// bees-per-minute estimate. Callers own one `ActivityPipeline` for the life of
// the monitoring loop, since the detector inside it remembers the previous
// frame.

use crate::core_modules::activity_classifier;
use crate::core_modules::motion_detector::MotionDetector;
use crate::error::VisionError;
use image::DynamicImage;

// Re-export key data structures for the public API.
pub use crate::core_modules::activity_classifier::{ActivityFlags, ActivityLevel, Classification};
pub use crate::core_modules::motion_detector::{ActivityReading, DetectorConfig};

/// Motion pixels attributed to one bee per minute. An empirical proxy, not a
/// calibrated count.
pub const DEFAULT_BEES_PER_MINUTE_DIVISOR: u64 = 75;

/// Configuration for the ActivityPipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub detector: DetectorConfig,
    pub bees_per_minute_divisor: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            bees_per_minute_divisor: DEFAULT_BEES_PER_MINUTE_DIVISOR,
        }
    }
}

/// Everything derived from one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityReport {
    pub reading: ActivityReading,
    pub level: ActivityLevel,
    pub flags: ActivityFlags,
    pub bees_per_minute: u64,
}

pub struct ActivityPipeline {
    detector: MotionDetector,
    config: PipelineConfig,
    frames_processed: u64,
}

impl ActivityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            detector: MotionDetector::new(config.detector.clone()),
            config,
            frames_processed: 0,
        }
    }

    pub fn generate_report(&mut self, image: &DynamicImage) -> Result<ActivityReport, VisionError> {
        // Stage 1: Frame differencing
        let reading = self.detector.detect_motion(image)?;
        self.frames_processed += 1;

        // Stage 2: Classification
        let Classification { level, flags } = activity_classifier::classify(reading.score);

        // Stage 3: Throughput estimate
        let bees_per_minute = bees_per_minute(reading.motion_pixels, self.config.bees_per_minute_divisor);

        Ok(ActivityReport {
            reading,
            level,
            flags,
            bees_per_minute,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of frames that made it through detection.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

/// Linear bees-per-minute proxy. Zero when the divisor is zero.
pub fn bees_per_minute(motion_pixels: u64, divisor: u64) -> u64 {
    motion_pixels.checked_div(divisor).unwrap_or(0)
}
