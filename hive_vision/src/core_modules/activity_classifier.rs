// THEORY:
// The `activity_classifier` maps an activity score onto the discrete level and
// the two alert flags published to the home-automation hub. It is pure and
// stateless. Level breakpoints are exclusive (`>`), evaluated from the top
// down. The low-activity alert uses a strict `<`.

use std::fmt;

const VERY_HIGH_ABOVE: f64 = 80.0;
const HIGH_ABOVE: f64 = 60.0;
const MODERATE_ABOVE: f64 = 40.0;
const LOW_ABOVE: f64 = 20.0;
const LOW_ACTIVITY_ALERT_BELOW: f64 = 10.0;

/// Discrete hive activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
    VeryLow,
}

impl ActivityLevel {
    pub fn classify(score: f64) -> Self {
        if score > VERY_HIGH_ABOVE {
            ActivityLevel::VeryHigh
        } else if score > HIGH_ABOVE {
            ActivityLevel::High
        } else if score > MODERATE_ABOVE {
            ActivityLevel::Moderate
        } else if score > LOW_ABOVE {
            ActivityLevel::Low
        } else {
            ActivityLevel::VeryLow
        }
    }

    /// The label published as the level sensor's state.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::VeryHigh => "Very High",
            ActivityLevel::High => "High",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::Low => "Low",
            ActivityLevel::VeryLow => "Very Low",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Boolean conditions derived from the same score as the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityFlags {
    pub high_activity: bool,
    pub low_activity_alert: bool,
}

impl ActivityFlags {
    pub fn from_score(score: f64) -> Self {
        Self {
            high_activity: score > VERY_HIGH_ABOVE,
            low_activity_alert: score < LOW_ACTIVITY_ALERT_BELOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: ActivityLevel,
    pub flags: ActivityFlags,
}

pub fn classify(score: f64) -> Classification {
    Classification {
        level: ActivityLevel::classify(score),
        flags: ActivityFlags::from_score(score),
    }
}
