// Request interpretation: raw operator axes -> semantic drive request
//
// Mode resolution is evaluated fresh every tick with no hysteresis.

use super::geometry::{Vec2, sanitize_axis};
use crate::config::DriveConfig;

/// Reference frame for translation commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationMode {
    FieldCentric,
    RobotCentric,
}

/// Rotation-control strategy for one tick. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    /// Direct teleoperated spin from the heading stick
    Spinning,
    /// Turn to the heading stick direction, snapped to the snap interval
    Snapping,
    /// Hold the heading captured when spinning stopped
    Drifting,
}

/// Raw operator input for one tick, before interpretation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawDriveInput {
    pub translation: Vec2,
    pub heading: Vec2,
    pub align_trigger: f32,
    pub robot_relative_trigger: f32,
}

/// Interpreted request, immutable for the tick it was built in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveRequest {
    pub translation_mode: TranslationMode,
    pub rotation_mode: RotationMode,
    /// Normalized translation in [-1, 1]^2
    pub translation_axis: Vec2,
    /// Normalized heading stick in [-1, 1]^2
    pub heading_axis: Vec2,
}

/// Thresholds used by [`interpret`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpreterThresholds {
    pub trigger: f32,
    pub drift_deadband: f32,
    pub align_drift: f32,
    pub stick_deadband: f32,
}

impl Default for InterpreterThresholds {
    fn default() -> Self {
        Self::from(&DriveConfig::default())
    }
}

impl From<&DriveConfig> for InterpreterThresholds {
    fn from(config: &DriveConfig) -> Self {
        Self {
            trigger: config.trigger_threshold,
            drift_deadband: config.drift_deadband,
            align_drift: config.align_drift_threshold,
            stick_deadband: config.stick_deadband,
        }
    }
}

fn deadband(value: f32, band: f32) -> f32 {
    if value.abs() < band { 0.0 } else { value }
}

fn sanitize(v: Vec2) -> Vec2 {
    Vec2::new(sanitize_axis(v.x), sanitize_axis(v.y))
}

/// Build a [`DriveRequest`] from raw axes and triggers
pub fn interpret(raw: &RawDriveInput, thresholds: &InterpreterThresholds) -> DriveRequest {
    let translation = sanitize(raw.translation);
    let translation_axis = Vec2::new(
        deadband(translation.x, thresholds.stick_deadband),
        deadband(translation.y, thresholds.stick_deadband),
    );
    let heading_axis = sanitize(raw.heading);

    // NaN triggers compare false and count as released
    let translation_mode = if raw.robot_relative_trigger > thresholds.trigger {
        TranslationMode::RobotCentric
    } else {
        TranslationMode::FieldCentric
    };

    let rotation_mode = if raw.align_trigger > thresholds.trigger {
        if heading_axis.norm() < thresholds.align_drift {
            RotationMode::Drifting
        } else {
            RotationMode::Snapping
        }
    } else if heading_axis.y.abs() < thresholds.drift_deadband {
        RotationMode::Drifting
    } else {
        RotationMode::Spinning
    };

    DriveRequest {
        translation_mode,
        rotation_mode,
        translation_axis,
        heading_axis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(heading: Vec2, align: bool) -> RawDriveInput {
        RawDriveInput {
            heading,
            align_trigger: if align { 1.0 } else { 0.0 },
            ..Default::default()
        }
    }

    #[test]
    fn test_mode_table() {
        let t = InterpreterThresholds::default();

        let r = interpret(&input(Vec2::new(0.0, 0.05), false), &t);
        assert_eq!(r.rotation_mode, RotationMode::Drifting);

        let r = interpret(&input(Vec2::new(0.0, 0.5), false), &t);
        assert_eq!(r.rotation_mode, RotationMode::Spinning);

        let r = interpret(&input(Vec2::new(0.3, 0.0), true), &t);
        assert_eq!(r.rotation_mode, RotationMode::Drifting);

        let r = interpret(&input(Vec2::new(0.0, 0.9), true), &t);
        assert_eq!(r.rotation_mode, RotationMode::Snapping);
    }

    #[test]
    fn test_spin_ignores_heading_x() {
        // Without align only the y component decides spin vs drift
        let t = InterpreterThresholds::default();
        let r = interpret(&input(Vec2::new(1.0, 0.0), false), &t);
        assert_eq!(r.rotation_mode, RotationMode::Drifting);
    }

    #[test]
    fn test_robot_relative_trigger() {
        let t = InterpreterThresholds::default();
        let mut raw = RawDriveInput::default();
        raw.robot_relative_trigger = 0.4;
        assert_eq!(interpret(&raw, &t).translation_mode, TranslationMode::FieldCentric);
        raw.robot_relative_trigger = 0.6;
        assert_eq!(interpret(&raw, &t).translation_mode, TranslationMode::RobotCentric);
    }

    #[test]
    fn test_nan_and_out_of_range_axes_are_clamped() {
        let t = InterpreterThresholds::default();
        let raw = RawDriveInput {
            translation: Vec2::new(f32::NAN, 4.0),
            heading: Vec2::new(-7.0, f32::NAN),
            align_trigger: f32::NAN,
            robot_relative_trigger: f32::NAN,
        };
        let r = interpret(&raw, &t);
        assert_eq!(r.translation_axis, Vec2::new(0.0, 1.0));
        assert_eq!(r.heading_axis, Vec2::new(-1.0, 0.0));
        assert_eq!(r.translation_mode, TranslationMode::FieldCentric);
        assert_eq!(r.rotation_mode, RotationMode::Drifting);
    }

    #[test]
    fn test_translation_deadband() {
        let t = InterpreterThresholds::default();
        let raw = RawDriveInput {
            translation: Vec2::new(0.02, -0.5),
            ..Default::default()
        };
        assert_eq!(interpret(&raw, &t).translation_axis, Vec2::new(0.0, -0.5));
    }
}
