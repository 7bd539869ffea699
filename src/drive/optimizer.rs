// Module setpoint optimization
//
// Always: never rotate a module more than 90°, reverse the wheel instead.
// Lazy: drop tiny speeds, freeze idle modules, throttle misaligned modules.

use std::f32::consts::{FRAC_PI_2, PI};

use super::geometry::{shortest_delta, wrap_angle};
use super::kinematics::ModuleState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointOptimizer {
    /// Speeds with smaller magnitude are forced to zero in lazy mode (m/s)
    pub speed_deadband: f32,
}

impl SetpointOptimizer {
    pub fn new(speed_deadband: f32) -> Self {
        Self {
            speed_deadband: speed_deadband.abs(),
        }
    }

    /// Optimize one module's desired state against its measured state
    pub fn optimize(&self, desired: ModuleState, measured: ModuleState, lazy: bool) -> ModuleState {
        let mut speed = if desired.speed.is_finite() { desired.speed } else { 0.0 };
        let mut angle = wrap_angle(desired.angle);

        // Unknown measured angle: nothing to optimize against
        if !measured.angle.is_finite() {
            return ModuleState { angle, speed };
        }

        if shortest_delta(measured.angle, angle).abs() > FRAC_PI_2 {
            angle = wrap_angle(angle + PI);
            speed = -speed;
        }

        if !lazy {
            return ModuleState { angle, speed };
        }

        if speed.abs() < self.speed_deadband {
            speed = 0.0;
        }

        let angle_error = shortest_delta(measured.angle, angle);
        if speed == 0.0 {
            return ModuleState {
                angle: measured.angle,
                speed: 0.0,
            };
        }

        ModuleState {
            angle,
            speed: speed * angle_error.cos(),
        }
    }
}
