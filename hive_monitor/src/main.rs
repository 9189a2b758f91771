mod camera;
mod config;
mod error;
mod logging;
mod monitor;
mod sensors;
mod state_sink;
#[cfg(test)]
mod test_server;

use anyhow::{Context, Result, bail};
use camera::{HomeAssistantCamera, probe};
use config::MonitorConfig;
use hive_vision::pipeline::ActivityPipeline;
use log::{error, info, warn};
use monitor::{Monitor, MonitorExit};
use state_sink::HomeAssistantStateSink;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // --- 1. Logging & Configuration ---
    let config = MonitorConfig::from_args()?;
    logging::init(config.log_file.as_deref())?;

    info!("Bee Hive Activity Monitor Starting...");
    info!("Home Assistant: {}", config.ha_url);
    info!("Camera Entity: {}", config.camera_entity);
    info!("Motion Sensitivity: {}", config.pipeline.detector.sensitivity);
    info!("Min Motion Area: {}", config.pipeline.detector.min_area);
    info!("Update Interval: {}s", config.update_interval.as_secs());

    // --- 2. Client Initialization ---
    let camera = HomeAssistantCamera::new(&config.ha_url, &config.ha_token, &config.camera_entity)
        .context("failed to build camera client")?;
    let sink = HomeAssistantStateSink::new(&config.ha_url, &config.ha_token)
        .context("failed to build Home Assistant client")?;

    // --- 3. Connection Probe ---
    info!("Testing connection to {}", camera.snapshot_url());
    if let Err(err) = probe(&camera).await {
        error!("Cannot get frames from camera: {}", err);
        error!("Please check:");
        error!("  1. Home Assistant URL is correct");
        error!("  2. Camera is online in Home Assistant");
        error!("  3. Token is valid");
        error!("  4. Camera entity ID is correct: {}", config.camera_entity);
        bail!("camera connection test failed");
    }

    // --- 4. Monitoring Loop ---
    let mut monitor = Monitor::new(
        camera,
        sink,
        ActivityPipeline::new(config.pipeline.clone()),
        config.update_interval,
        config.max_consecutive_failures,
    );
    let exit = monitor.run(shutdown_signal()).await;

    // --- 5. Shutdown ---
    match exit {
        MonitorExit::Interrupted => info!("Monitoring stopped by user"),
        MonitorExit::CameraUnreachable => error!("Too many consecutive failures. Exiting."),
    }
    info!("Bee hive activity monitor stopped");

    if exit == MonitorExit::CameraUnreachable {
        bail!("camera unreachable after {} attempts", config.max_consecutive_failures);
    }
    Ok(())
}

/// Resolves on Ctrl+C. If the handler cannot be installed the loop runs until
/// the failure ceiling.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
}
