// Chassis composition and limiting
//
// Produces a robot-frame chassis velocity from the interpreted request and the
// commanded rotation, then bounds linear acceleration and angular rate.

use super::geometry::Vec2;
use super::request::{DriveRequest, TranslationMode};
use crate::config::DriveConfig;

/// Robot-frame chassis velocity: m/s for vx/vy, rad/s for omega
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChassisVelocity {
    pub vx: f32,
    pub vy: f32,
    pub omega: f32,
}

impl ChassisVelocity {
    pub fn new(vx: f32, vy: f32, omega: f32) -> Self {
        Self { vx, vy, omega }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Scale the translation stick to m/s and express it in the robot frame
pub fn compose(
    request: &DriveRequest,
    omega: f32,
    measured_heading: f32,
    max_linear_speed: f32,
    robot_centric_scale: f32,
) -> ChassisVelocity {
    let linear = request.translation_axis.scale(max_linear_speed);
    let robot_frame: Vec2 = match request.translation_mode {
        TranslationMode::RobotCentric => linear.scale(robot_centric_scale),
        // field -> robot is a rotation by -heading
        TranslationMode::FieldCentric => linear.rotate(-measured_heading),
    };
    ChassisVelocity::new(robot_frame.x, robot_frame.y, omega)
}

/// Bounds the rate of change of a signal to `rate` units per second
#[derive(Debug, Clone)]
pub struct SlewRateLimiter {
    rate: f32,
    value: f32,
}

impl SlewRateLimiter {
    pub fn new(rate: f32) -> Self {
        Self {
            rate: rate.abs(),
            value: 0.0,
        }
    }

    pub fn calculate(&mut self, input: f32, dt: f32) -> f32 {
        if !input.is_finite() {
            return self.value;
        }
        let max_step = self.rate * dt;
        self.value += (input - self.value).clamp(-max_step, max_step);
        self.value
    }

    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Per-axis acceleration limiting for vx/vy and a hard clamp for omega
#[derive(Debug, Clone)]
pub struct ChassisLimiter {
    vx: SlewRateLimiter,
    vy: SlewRateLimiter,
    max_angular_rate: f32,
    period: f32,
}

impl ChassisLimiter {
    pub fn new(config: &DriveConfig, period: f32) -> Self {
        Self {
            vx: SlewRateLimiter::new(config.max_linear_accel),
            vy: SlewRateLimiter::new(config.max_linear_accel),
            max_angular_rate: config.max_angular_rate,
            period,
        }
    }

    pub fn limit(&mut self, desired: ChassisVelocity) -> ChassisVelocity {
        let omega = if desired.omega.is_finite() {
            desired.omega.clamp(-self.max_angular_rate, self.max_angular_rate)
        } else {
            0.0
        };
        ChassisVelocity {
            vx: self.vx.calculate(desired.vx, self.period),
            vy: self.vy.calculate(desired.vy, self.period),
            omega,
        }
    }

    /// Forget accumulated velocity, e.g. after the base was stopped
    pub fn reset(&mut self) {
        self.vx.reset(0.0);
        self.vy.reset(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::request::RotationMode;
    use std::f32::consts::FRAC_PI_2;

    fn request(mode: TranslationMode, axis: Vec2) -> DriveRequest {
        DriveRequest {
            translation_mode: mode,
            rotation_mode: RotationMode::Drifting,
            translation_axis: axis,
            heading_axis: Vec2::ZERO,
        }
    }

    #[test]
    fn test_robot_centric_is_scaled_not_rotated() {
        let req = request(TranslationMode::RobotCentric, Vec2::new(1.0, 0.0));
        let v = compose(&req, 0.3, FRAC_PI_2, 4.0, 0.25);
        assert!((v.vx - 1.0).abs() < 1e-6);
        assert!(v.vy.abs() < 1e-6);
        assert_eq!(v.omega, 0.3);
    }

    #[test]
    fn test_field_centric_rotates_by_heading() {
        // Robot facing +90°: field-forward is robot-right (-y)
        let req = request(TranslationMode::FieldCentric, Vec2::new(1.0, 0.0));
        let v = compose(&req, 0.0, FRAC_PI_2, 4.0, 0.25);
        assert!(v.vx.abs() < 1e-5, "vx={}", v.vx);
        assert!((v.vy + 4.0).abs() < 1e-5, "vy={}", v.vy);
    }

    #[test]
    fn test_slew_rate_limiter_bounds_step() {
        let mut limiter = SlewRateLimiter::new(10.0);
        assert!((limiter.calculate(5.0, 0.02) - 0.2).abs() < 1e-6);
        assert!((limiter.calculate(5.0, 0.02) - 0.4).abs() < 1e-6);
        assert!((limiter.calculate(-5.0, 0.02) - 0.2).abs() < 1e-6);
        assert_eq!(limiter.calculate(f32::NAN, 0.02), limiter.value());
    }

    #[test]
    fn test_limiter_clamps_omega_without_rate_limit() {
        let config = DriveConfig::default();
        let mut limiter = ChassisLimiter::new(&config, 0.02);
        let out = limiter.limit(ChassisVelocity::new(0.0, 0.0, 100.0));
        assert_eq!(out.omega, config.max_angular_rate);
        let out = limiter.limit(ChassisVelocity::new(0.0, 0.0, -0.5));
        assert_eq!(out.omega, -0.5);
    }

    #[test]
    fn test_limiter_reset() {
        let config = DriveConfig::default();
        let mut limiter = ChassisLimiter::new(&config, 0.02);
        for _ in 0..10 {
            limiter.limit(ChassisVelocity::new(4.0, 0.0, 0.0));
        }
        limiter.reset();
        let out = limiter.limit(ChassisVelocity::zero());
        assert_eq!(out.vx, 0.0);
    }
}
