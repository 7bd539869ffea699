// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::drive::{RawDriveInput, Vec2};

// Operator input from teleop -> runtime
// Stick axes in [-1, 1], triggers in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerInput {
    pub left_x: f32,
    pub left_y: f32,
    pub right_x: f32,
    pub right_y: f32,
    pub align_trigger: f32,
    pub robot_relative_trigger: f32,
    pub reset_heading: bool,
    pub x_lock: bool,
}

// Left stick drives translation, right stick drives heading
impl From<&ControllerInput> for RawDriveInput {
    fn from(input: &ControllerInput) -> Self {
        Self {
            translation: Vec2::new(input.left_x, input.left_y),
            heading: Vec2::new(input.right_x, input.right_y),
            align_trigger: input.align_trigger,
            robot_relative_trigger: input.robot_relative_trigger,
        }
    }
}

// Setpoint from runtime -> module hw node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleCommand {
    /// Azimuth setpoint in radians, wrapped to [-PI, PI)
    pub angle: f32,
    /// Wheel speed setpoint in m/s
    pub speed: f32,
    pub brake: bool,
}

// Measurement from module hw node -> runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleFeedback {
    pub angle: f32,
    pub angular_velocity: f32,
    pub speed: f32,
    pub distance: f32,
}

// Heading measurement from hw node -> runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GyroFeedback {
    /// Yaw in radians, counter-clockwise positive
    pub yaw: f32,
    pub yaw_rate: f32,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_input_missing_fields_default() {
        let input: ControllerInput = serde_json::from_str(r#"{ "left_y": 0.5 }"#).unwrap();
        assert_eq!(input.left_y, 0.5);
        assert!(!input.x_lock);
        assert_eq!(input.align_trigger, 0.0);
    }

    #[test]
    fn test_health_serializes_snake_case() {
        let json = serde_json::to_string(&RuntimeHealth::CmdStale).unwrap();
        assert_eq!(json, "\"cmd_stale\"");
    }

    #[test]
    fn test_controller_input_maps_sticks() {
        let input = ControllerInput {
            left_x: 0.1,
            left_y: 0.2,
            right_x: 0.3,
            right_y: 0.4,
            ..Default::default()
        };
        let raw = RawDriveInput::from(&input);
        assert_eq!(raw.translation, Vec2::new(0.1, 0.2));
        assert_eq!(raw.heading, Vec2::new(0.3, 0.4));
    }
}
