// Simulated module and gyro
//
// First-order model: azimuth slews toward its setpoint along the short way,
// wheel speed ramps toward its setpoint, distance integrates speed.

use crate::drive::geometry::{shortest_delta, wrap_angle};
use crate::error::Result;

use super::{GyroInputs, GyroIo, ModuleInputs, ModuleIo};

/// Max azimuth rate of the simulated steer motor (rad/s)
const STEER_RATE: f32 = 4.0 * std::f32::consts::TAU;
/// Wheel acceleration of the simulated drive motor (m/s^2)
const DRIVE_ACCEL: f32 = 20.0;
/// Coasting deceleration when brake mode is off (m/s^2)
const COAST_DECEL: f32 = 2.0;

#[derive(Debug, Clone, Default)]
pub struct SimModuleIo {
    angle: f32,
    angle_setpoint: f32,
    speed: f32,
    speed_setpoint: f32,
    distance: f32,
    brake: bool,
}

fn approach(current: f32, target: f32, max_step: f32) -> f32 {
    current + (target - current).clamp(-max_step, max_step)
}

impl ModuleIo for SimModuleIo {
    fn configure(&mut self) -> Result<()> {
        self.brake = true;
        Ok(())
    }

    fn update(&mut self, dt: f32) -> ModuleInputs {
        let previous = self.angle;
        let delta = shortest_delta(self.angle, self.angle_setpoint);
        let max_turn = STEER_RATE * dt;
        self.angle = wrap_angle(self.angle + delta.clamp(-max_turn, max_turn));

        let accel = if self.speed_setpoint == 0.0 && !self.brake {
            COAST_DECEL
        } else {
            DRIVE_ACCEL
        };
        self.speed = approach(self.speed, self.speed_setpoint, accel * dt);
        self.distance += self.speed.abs() * dt;

        let angular_velocity = if dt > 0.0 {
            shortest_delta(previous, self.angle) / dt
        } else {
            0.0
        };
        ModuleInputs {
            angle: self.angle,
            angular_velocity,
            speed: self.speed,
            distance: self.distance,
        }
    }

    fn set_angle_setpoint(&mut self, angle: f32) {
        self.angle_setpoint = wrap_angle(angle);
    }

    fn set_speed_setpoint(&mut self, speed: f32) {
        self.speed_setpoint = if speed.is_finite() { speed } else { 0.0 };
    }

    fn set_brake_mode(&mut self, brake: bool) {
        self.brake = brake;
    }
}

/// Integrates the wheel-odometry yaw rate
#[derive(Debug, Clone, Default)]
pub struct SimGyroIo {
    yaw: f32,
}

impl SimGyroIo {
    pub fn with_yaw(yaw: f32) -> Self {
        Self {
            yaw: wrap_angle(yaw),
        }
    }
}

impl GyroIo for SimGyroIo {
    fn update(&mut self, estimated_yaw_rate: f32, dt: f32) -> GyroInputs {
        let rate = if estimated_yaw_rate.is_finite() {
            estimated_yaw_rate
        } else {
            0.0
        };
        self.yaw = wrap_angle(self.yaw + rate * dt);
        GyroInputs {
            yaw: self.yaw,
            yaw_rate: rate,
        }
    }
}
