pub mod activity_classifier;
pub mod frame_preprocessor;
pub mod motion_detector;
