// Command line and environment configuration for the monitor.

use crate::monitor::{DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_UPDATE_INTERVAL};
use anyhow::{Context, Result, bail};
use clap::{Arg, ArgMatches, Command, crate_authors, crate_version, value_parser};
use hive_vision::core_modules::motion_detector::{DEFAULT_DILATE_ITERATIONS, DEFAULT_MIN_AREA, DEFAULT_SCORE_SCALE, DEFAULT_SENSITIVITY};
use hive_vision::pipeline::{DEFAULT_BEES_PER_MINUTE_DIVISOR, DetectorConfig, PipelineConfig};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CAMERA_ENTITY: &str = "camera.bee_hive_monitor_camera";

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub ha_url: String,
    pub ha_token: String,
    pub camera_entity: String,
    pub pipeline: PipelineConfig,
    pub update_interval: Duration,
    pub max_consecutive_failures: u32,
    /// Log records are also appended here when set.
    pub log_file: Option<PathBuf>,
}

impl MonitorConfig {
    pub fn from_args() -> Result<Self> {
        Self::from_matches(&command().get_matches())
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let ha_url = matches
            .get_one::<String>("ha-url")
            .cloned()
            .context("Home Assistant URL is required")?;
        let ha_token = matches
            .get_one::<String>("ha-token")
            .cloned()
            .context("Home Assistant token is required")?;
        let camera_entity = matches
            .get_one::<String>("camera-entity")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CAMERA_ENTITY.to_string());

        let sensitivity = matches
            .get_one::<u8>("sensitivity")
            .copied()
            .unwrap_or(DEFAULT_SENSITIVITY);
        let min_area = matches
            .get_one::<u32>("min-area")
            .copied()
            .unwrap_or(DEFAULT_MIN_AREA);
        let score_scale = matches
            .get_one::<f64>("score-scale")
            .copied()
            .unwrap_or(DEFAULT_SCORE_SCALE);
        let bees_per_minute_divisor = matches
            .get_one::<u64>("bees-divisor")
            .copied()
            .unwrap_or(DEFAULT_BEES_PER_MINUTE_DIVISOR);
        let interval = matches
            .get_one::<u64>("interval")
            .copied()
            .unwrap_or(DEFAULT_UPDATE_INTERVAL.as_secs());
        let max_consecutive_failures = matches
            .get_one::<u32>("max-failures")
            .copied()
            .unwrap_or(DEFAULT_MAX_CONSECUTIVE_FAILURES);
        let log_file = matches.get_one::<PathBuf>("log-file").cloned();

        if ha_url.trim().is_empty() {
            bail!("Home Assistant URL must not be empty");
        }
        if sensitivity == 0 {
            bail!("--sensitivity must be at least 1");
        }
        if max_consecutive_failures == 0 {
            bail!("--max-failures must be at least 1");
        }
        if bees_per_minute_divisor == 0 {
            bail!("--bees-divisor must be at least 1");
        }
        if !score_scale.is_finite() || score_scale < 0.0 {
            bail!("--score-scale must be a non-negative number, got {}", score_scale);
        }

        Ok(Self {
            ha_url,
            ha_token,
            camera_entity,
            pipeline: PipelineConfig {
                detector: DetectorConfig {
                    sensitivity,
                    min_area,
                    dilate_iterations: DEFAULT_DILATE_ITERATIONS,
                    score_scale,
                },
                bees_per_minute_divisor,
            },
            update_interval: Duration::from_secs(interval),
            max_consecutive_failures,
            log_file,
        })
    }
}

pub fn command() -> Command<'static> {
    Command::new("hive_monitor")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Watches a bee hive entrance camera and publishes activity to Home Assistant")
        .arg(
            Arg::new("ha-url")
                .long("ha-url")
                .env("HIVE_HA_URL")
                .takes_value(true)
                .required(true)
                .help("Base URL of the Home Assistant instance"),
        )
        .arg(
            Arg::new("ha-token")
                .long("ha-token")
                .env("HIVE_HA_TOKEN")
                .hide_env_values(true)
                .takes_value(true)
                .required(true)
                .help("Long-lived access token"),
        )
        .arg(
            Arg::new("camera-entity")
                .long("camera-entity")
                .env("HIVE_CAMERA_ENTITY")
                .takes_value(true)
                .default_value(DEFAULT_CAMERA_ENTITY)
                .help("Camera entity to pull snapshots from"),
        )
        .arg(
            Arg::new("sensitivity")
                .long("sensitivity")
                .env("HIVE_SENSITIVITY")
                .takes_value(true)
                .value_parser(value_parser!(u8))
                .default_value("25")
                .help("Minimum intensity change for a pixel to count as motion"),
        )
        .arg(
            Arg::new("min-area")
                .long("min-area")
                .env("HIVE_MIN_AREA")
                .takes_value(true)
                .value_parser(value_parser!(u32))
                .default_value("20")
                .help("Motion regions must be larger than this many pixels"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .env("HIVE_INTERVAL")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .default_value("5")
                .help("Seconds to wait between cycles"),
        )
        .arg(
            Arg::new("max-failures")
                .long("max-failures")
                .env("HIVE_MAX_FAILURES")
                .takes_value(true)
                .value_parser(value_parser!(u32))
                .default_value("10")
                .help("Consecutive camera failures before giving up"),
        )
        .arg(
            Arg::new("score-scale")
                .long("score-scale")
                .env("HIVE_SCORE_SCALE")
                .takes_value(true)
                .value_parser(value_parser!(f64))
                .default_value("10.0")
                .help("Multiplier applied to the motion fraction before clamping"),
        )
        .arg(
            Arg::new("bees-divisor")
                .long("bees-divisor")
                .env("HIVE_BEES_DIVISOR")
                .takes_value(true)
                .value_parser(value_parser!(u64))
                .default_value("75")
                .help("Motion pixels per estimated bee per minute"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .env("HIVE_LOG_FILE")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .help("Also append log records to this file"),
        )
}
