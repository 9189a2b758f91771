// The five entities published after every successful cycle.

use crate::state_sink::{Attributes, SensorState};
use chrono::{DateTime, Local};
use hive_vision::pipeline::ActivityReport;
use serde_json::{Value, json};

pub const ACTIVITY_SCORE: &str = "sensor.bee_hive_monitor_activity_score";
pub const BEES_PER_MINUTE: &str = "sensor.bee_hive_monitor_estimated_bees_per_minute";
pub const ACTIVITY_LEVEL: &str = "sensor.bee_hive_monitor_activity_level";
pub const HIGH_ACTIVITY: &str = "binary_sensor.bee_hive_monitor_high_activity";
pub const LOW_ACTIVITY_ALERT: &str = "binary_sensor.bee_hive_monitor_low_activity_alert";

/// One entity update.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub entity_id: &'static str,
    pub state: SensorState,
    pub attributes: Attributes,
}

/// Builds the updates for a report, in publishing order.
pub fn sensor_readings(report: &ActivityReport, timestamp: DateTime<Local>) -> Vec<SensorReading> {
    vec![
        SensorReading {
            entity_id: ACTIVITY_SCORE,
            state: SensorState::measurement(report.reading.score),
            attributes: attributes([
                ("motion_pixels", json!(report.reading.motion_pixels)),
                ("timestamp", json!(timestamp.to_rfc3339())),
                ("unit_of_measurement", json!("%")),
                ("state_class", json!("measurement")),
                ("icon", json!("mdi:bee")),
            ]),
        },
        SensorReading {
            entity_id: BEES_PER_MINUTE,
            state: SensorState::Count(report.bees_per_minute),
            attributes: attributes([
                ("unit_of_measurement", json!("bees/min")),
                ("state_class", json!("measurement")),
                ("icon", json!("mdi:bee")),
            ]),
        },
        SensorReading {
            entity_id: ACTIVITY_LEVEL,
            state: SensorState::Text(report.level.label().to_string()),
            attributes: attributes([("icon", json!("mdi:chart-line"))]),
        },
        SensorReading {
            entity_id: HIGH_ACTIVITY,
            state: SensorState::switch(report.flags.high_activity),
            attributes: attributes([("device_class", json!("motion"))]),
        },
        SensorReading {
            entity_id: LOW_ACTIVITY_ALERT,
            state: SensorState::switch(report.flags.low_activity_alert),
            attributes: attributes([("device_class", json!("problem"))]),
        },
    ]
}

fn attributes<const N: usize>(pairs: [(&str, Value); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
