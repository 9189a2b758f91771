// THEORY:
// The camera side of the monitor. `FrameSource` is the seam the monitoring loop
// depends on: one call, one decoded frame or one failure. The production
// implementation pulls a still image through Home Assistant's camera proxy, so
// the hive camera itself never has to be reachable from the monitor host.

use crate::error::FetchError;
use image::DynamicImage;
use log::{debug, info};
use reqwest::Client;
use std::time::Duration;

/// A fetch that takes longer than this counts as an ordinary failure.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce the current camera frame.
pub trait FrameSource {
    async fn get_frame(&self) -> Result<DynamicImage, FetchError>;
}

/// Fetches snapshots from `{ha_url}/api/camera_proxy/{camera_entity}`.
pub struct HomeAssistantCamera {
    client: Client,
    snapshot_url: String,
    token: String,
}

impl HomeAssistantCamera {
    pub fn new(ha_url: &str, token: &str, camera_entity: &str) -> Result<Self, reqwest::Error> {
        Self::with_timeout(ha_url, token, camera_entity, FETCH_TIMEOUT)
    }

    pub fn with_timeout(ha_url: &str, token: &str, camera_entity: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            snapshot_url: snapshot_url(ha_url, camera_entity),
            token: token.to_string(),
        })
    }

    pub fn snapshot_url(&self) -> &str {
        &self.snapshot_url
    }
}

impl FrameSource for HomeAssistantCamera {
    async fn get_frame(&self) -> Result<DynamicImage, FetchError> {
        let response = self
            .client
            .get(&self.snapshot_url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Fetched {} byte snapshot", body.len());
        Ok(image::load_from_memory(&body)?)
    }
}

/// Fetches one frame to confirm the source is reachable and returns its size.
pub async fn probe(source: &impl FrameSource) -> Result<(u32, u32), FetchError> {
    let frame = source.get_frame().await?;
    info!("Camera connected! Frame size: {}x{}", frame.width(), frame.height());
    Ok((frame.width(), frame.height()))
}

pub fn snapshot_url(ha_url: &str, camera_entity: &str) -> String {
    format!("{}/api/camera_proxy/{}", ha_url.trim_end_matches('/'), camera_entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{Reply, closed_port, serve_once};
    use image::ImageFormat;
    use reqwest::StatusCode;
    use std::io::Cursor;

    const ENTITY: &str = "camera.bee_hive_monitor_camera";

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn builds_camera_proxy_url() {
        assert_eq!(
            snapshot_url("http://192.168.1.50:8123/", "camera.bee_hive_monitor_camera"),
            "http://192.168.1.50:8123/api/camera_proxy/camera.bee_hive_monitor_camera"
        );
        assert_eq!(
            snapshot_url("http://hass.local:8123", "camera.front"),
            "http://hass.local:8123/api/camera_proxy/camera.front"
        );
    }

    #[test]
    fn undecodable_bodies_are_decode_failures() {
        let err: FetchError = image::load_from_memory(b"not a jpeg").unwrap_err().into();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn fetches_and_decodes_snapshots() {
        let (base_url, request) = serve_once(Reply::ok("image/png", png(8, 6))).await;
        let camera = HomeAssistantCamera::new(&base_url, "secret", ENTITY).unwrap();

        assert_eq!(probe(&camera).await.unwrap(), (8, 6));

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/camera_proxy/camera.bee_hive_monitor_camera http/1.1"));
        assert!(request.contains("authorization: bearer secret"));
    }

    #[tokio::test]
    async fn error_statuses_are_fetch_failures() {
        let (base_url, _) = serve_once(Reply::status(503, "Service Unavailable")).await;
        let camera = HomeAssistantCamera::new(&base_url, "secret", ENTITY).unwrap();

        let err = camera.get_frame().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn non_image_bodies_are_decode_failures() {
        let (base_url, _) = serve_once(Reply::ok("text/html", b"<html>login</html>".to_vec())).await;
        let camera = HomeAssistantCamera::new(&base_url, "secret", ENTITY).unwrap();

        assert!(matches!(probe(&camera).await, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn slow_cameras_time_out() {
        let reply = Reply::ok("image/png", png(4, 4)).delayed(Duration::from_secs(5));
        let (base_url, _) = serve_once(reply).await;
        let camera = HomeAssistantCamera::with_timeout(&base_url, "secret", ENTITY, Duration::from_millis(200)).unwrap();

        assert!(matches!(camera.get_frame().await, Err(FetchError::Timeout)));
    }

    #[tokio::test]
    async fn unreachable_hosts_are_transport_failures() {
        let camera = HomeAssistantCamera::new(&closed_port().await, "secret", ENTITY).unwrap();

        assert!(matches!(camera.get_frame().await, Err(FetchError::Transport(_))));
    }
}
