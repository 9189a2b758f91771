// THEORY:
// The `Monitor` is the orchestration loop. It owns the camera, the state sink
// and the single `ActivityPipeline` whose detector carries the one frame of
// lookback, so no state lives outside this struct.
//
// Key architectural principles:
// 1.  **One Cycle at a Time**: fetch, detect, classify, publish, sleep. A cycle
//     always runs to completion (or is abandoned on shutdown) before the next.
// 2.  **Bounded Failure**: consecutive fetch failures are counted; a success
//     resets the count, and reaching the ceiling ends the loop.
// 3.  **Isolated Publishing**: a rejected update is logged and the remaining
//     updates of the cycle still go out. Publish failures never touch the
//     fetch-failure count.
// 4.  **Cooperative Shutdown**: the shutdown future is raced against both the
//     cycle's I/O and the sleep between cycles.

use crate::camera::FrameSource;
use crate::sensors::sensor_readings;
use crate::state_sink::StateSink;
use chrono::Local;
use hive_vision::pipeline::{ActivityPipeline, ActivityReport};
use log::{error, info, warn};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A frame was analysed and its readings were pushed.
    Published { report: ActivityReport, failed_updates: usize },
    /// The camera failed; `consecutive` failures so far, below the ceiling.
    FetchFailed { consecutive: u32 },
    /// The frame arrived but could not be analysed. Nothing was published.
    DetectionFailed,
    /// The camera failed and the consecutive-failure ceiling was reached.
    FailureCeilingReached,
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    Interrupted,
    CameraUnreachable,
}

pub struct Monitor<C, S> {
    camera: C,
    sink: S,
    pipeline: ActivityPipeline,
    update_interval: Duration,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
}

impl<C: FrameSource, S: StateSink> Monitor<C, S> {
    pub fn new(
        camera: C,
        sink: S,
        pipeline: ActivityPipeline,
        update_interval: Duration,
        max_consecutive_failures: u32,
    ) -> Self {
        Self {
            camera,
            sink,
            pipeline,
            update_interval,
            max_consecutive_failures,
            consecutive_failures: 0,
        }
    }

    /// Runs one fetch, detect, classify and publish cycle.
    pub async fn tick(&mut self) -> CycleOutcome {
        let frame = match self.camera.get_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                self.consecutive_failures += 1;
                warn!(
                    "Failed to get frame ({}/{}): {}",
                    self.consecutive_failures, self.max_consecutive_failures, err
                );
                if self.consecutive_failures >= self.max_consecutive_failures {
                    return CycleOutcome::FailureCeilingReached;
                }
                return CycleOutcome::FetchFailed {
                    consecutive: self.consecutive_failures,
                };
            }
        };
        self.consecutive_failures = 0;

        let report = match self.pipeline.generate_report(&frame) {
            Ok(report) => report,
            Err(err) => {
                error!("Skipping frame: {}", err);
                return CycleOutcome::DetectionFailed;
            }
        };

        info!(
            "Activity: {:5.1}% | Level: {:10} | Bees/min: {:3}",
            report.reading.score, report.level, report.bees_per_minute
        );

        let mut failed_updates = 0;
        for reading in sensor_readings(&report, Local::now()) {
            if let Err(err) = self
                .sink
                .update(reading.entity_id, &reading.state, &reading.attributes)
                .await
            {
                failed_updates += 1;
                error!("Failed to update {}: {}", reading.entity_id, err);
            }
        }

        CycleOutcome::Published { report, failed_updates }
    }

    /// Loops until the failure ceiling is reached or `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F) -> MonitorExit
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => return MonitorExit::Interrupted,
                outcome = self.tick() => {
                    if matches!(outcome, CycleOutcome::FailureCeilingReached) {
                        return MonitorExit::CameraUnreachable;
                    }
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => return MonitorExit::Interrupted,
                _ = tokio::time::sleep(self.update_interval) => {}
            }
        }
    }
}
