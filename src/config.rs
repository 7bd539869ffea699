// Timeouts, topics, drive configuration
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{DriveError, Result};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Control period in seconds, derived from LOOP_HZ
pub const LOOP_PERIOD_S: f32 = 1.0 / LOOP_HZ as f32;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_CONTROLLER: &str = "swerve/cmd/controller"; // operator input
pub const TOPIC_HEALTH: &str = "swerve/state/health"; // health status
pub const TOPIC_GYRO: &str = "swerve/state/gyro"; // heading feedback from hw node

// Per-module topics are "{prefix}/rt/module/{i}" and "{prefix}/state/module/{i}"
pub const DEFAULT_MODULE_PREFIX: &str = "swerve";

/// Heading PID gains (output in rad/s, input in rad)
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Errors smaller than this (radians) produce no output
    pub tolerance: f32,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 5.0,
            ki: 0.0,
            kd: 0.1,
            tolerance: 1.0_f32.to_radians(),
        }
    }
}

/// Values that tune the drive pipeline. Behavior lives in `crate::drive`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Full-stick translation speed (m/s)
    pub max_linear_speed: f32,
    /// Per-axis chassis acceleration bound (m/s^2)
    pub max_linear_accel: f32,
    /// Full-stick spin rate and hard clamp on commanded rotation (rad/s)
    pub max_angular_rate: f32,
    /// Scale applied to robot-centric translation for precision maneuvers
    pub robot_centric_scale: f32,
    pub heading_pid: PidGains,
    /// Snap interval for align mode (degrees)
    pub snap_interval_deg: f32,
    /// |heading_axis.y| below this means drift-hold
    pub drift_deadband: f32,
    /// While aligning, heading stick norm below this means drift-hold
    pub align_drift_threshold: f32,
    /// Analog trigger press threshold
    pub trigger_threshold: f32,
    /// Per-component deadband for the translation stick
    pub stick_deadband: f32,
    /// Module speeds below this are treated as zero in lazy mode (m/s)
    pub lazy_speed_deadband: f32,
    /// Fastest speed any single module can reach (m/s)
    pub max_module_speed: f32,
    /// Module locations relative to the chassis centre, [x, y] in meters
    pub module_locations: Vec<[f32; 2]>,
    /// Apply deadband/freeze/cosine optimizations to module setpoints
    pub lazy_optimization: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        let half = 0.28;
        Self {
            max_linear_speed: 4.5,
            max_linear_accel: 9.0,
            max_angular_rate: std::f32::consts::TAU,
            robot_centric_scale: 0.25,
            heading_pid: PidGains::default(),
            snap_interval_deg: 90.0,
            drift_deadband: 0.1,
            align_drift_threshold: 0.7,
            trigger_threshold: 0.5,
            stick_deadband: 0.05,
            lazy_speed_deadband: 0.025,
            max_module_speed: 4.8,
            // front-left, front-right, back-left, back-right
            module_locations: vec![[half, half], [half, -half], [-half, half], [-half, -half]],
            lazy_optimization: true,
        }
    }
}

impl DriveConfig {
    /// Load a JSON config file; fields not present keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading drive config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let config: DriveConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the control loop meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_linear_speed", self.max_linear_speed),
            ("max_linear_accel", self.max_linear_accel),
            ("max_angular_rate", self.max_angular_rate),
            ("max_module_speed", self.max_module_speed),
            ("snap_interval_deg", self.snap_interval_deg),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(DriveError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("robot_centric_scale", self.robot_centric_scale),
            ("drift_deadband", self.drift_deadband),
            ("align_drift_threshold", self.align_drift_threshold),
            ("trigger_threshold", self.trigger_threshold),
            ("stick_deadband", self.stick_deadband),
            ("lazy_speed_deadband", self.lazy_speed_deadband),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(DriveError::InvalidConfig(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        let gains = self.heading_pid;
        if [gains.kp, gains.ki, gains.kd, gains.tolerance]
            .iter()
            .any(|g| !g.is_finite() || *g < 0.0)
        {
            return Err(DriveError::InvalidConfig(format!(
                "heading_pid gains must be finite and non-negative: {:?}",
                gains
            )));
        }

        if self.module_locations.is_empty() {
            return Err(DriveError::InvalidConfig(
                "at least one module location is required".to_string(),
            ));
        }
        if self
            .module_locations
            .iter()
            .flatten()
            .any(|c| !c.is_finite())
        {
            return Err(DriveError::InvalidConfig(
                "module locations must be finite".to_string(),
            ));
        }

        Ok(())
    }

    pub fn snap_interval(&self) -> f32 {
        self.snap_interval_deg.to_radians()
    }
}
