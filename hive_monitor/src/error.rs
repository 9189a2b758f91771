use reqwest::StatusCode;
use thiserror::Error;

/// Why a frame could not be obtained from the camera.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timed out waiting for the camera")]
    Timeout,
    #[error("camera returned HTTP {0}")]
    Status(StatusCode),
    #[error("camera request failed: {0}")]
    Transport(reqwest::Error),
    #[error("could not decode frame: {0}")]
    Decode(#[from] image::ImageError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status)
        } else {
            FetchError::Transport(err)
        }
    }
}

/// Why a single state update was rejected or lost.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("timed out waiting for Home Assistant")]
    Timeout,
    #[error("Home Assistant returned HTTP {0}")]
    Status(StatusCode),
    #[error("state request failed: {0}")]
    Transport(reqwest::Error),
}

impl From<reqwest::Error> for PublishError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PublishError::Timeout
        } else if let Some(status) = err.status() {
            PublishError::Status(status)
        } else {
            PublishError::Transport(err)
        }
    }
}
