// THEORY:
// This file is the main entry point for the `hive_vision` library crate.
// It exposes the `ActivityPipeline` and its data structures (`PipelineConfig`,
// `ActivityReport`) as the high-level interface, while the individual stages
// (preprocessing, motion detection, classification) live in `core_modules` and
// can also be used on their own.
//
// The crate performs no I/O. Fetching frames and publishing readings belong to
// the `hive_monitor` application.

pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use error::VisionError;
