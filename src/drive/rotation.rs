// Rotation arbiter: fuses spin, snap and drift-hold into one angular velocity

use tracing::debug;

use super::geometry::{snap_to_nearest, wrap_angle};
use super::pid::PidController;
use super::request::{DriveRequest, RotationMode};
use crate::config::DriveConfig;

/// Owns the heading-hold setpoint and the previous tick's rotation mode.
///
/// The setpoint is only ever copied from a measured heading (on the
/// spin -> drift edge or an explicit reset) or from a snapped stick direction,
/// never from a commanded one.
#[derive(Debug, Clone)]
pub struct RotationArbiter {
    heading_setpoint: f32,
    previous_mode: RotationMode,
    pid: PidController,
    spin_scale: f32,
    snap_interval: f32,
    period: f32,
}

impl RotationArbiter {
    pub fn new(config: &DriveConfig, period: f32) -> Self {
        Self {
            heading_setpoint: 0.0,
            previous_mode: RotationMode::Drifting,
            pid: PidController::new(config.heading_pid, config.max_angular_rate)
                .with_continuous_input(),
            spin_scale: config.max_angular_rate,
            snap_interval: config.snap_interval(),
            period,
        }
    }

    pub fn heading_setpoint(&self) -> f32 {
        self.heading_setpoint
    }

    pub fn previous_mode(&self) -> RotationMode {
        self.previous_mode
    }

    /// Hold the given measured heading from now on (e.g. at match start)
    pub fn reset(&mut self, measured_heading: f32) {
        self.heading_setpoint = wrap_angle(measured_heading);
        self.previous_mode = RotationMode::Drifting;
        self.pid.reset();
        debug!("Heading hold reset to {:.1}°", self.heading_setpoint.to_degrees());
    }

    /// Commanded angular velocity (rad/s) for this tick
    pub fn resolve_angular_velocity(
        &mut self,
        request: &DriveRequest,
        measured_heading: f32,
    ) -> f32 {
        let measured = wrap_angle(measured_heading);
        let mode = request.rotation_mode;

        if self.previous_mode == RotationMode::Spinning && mode == RotationMode::Drifting {
            self.heading_setpoint = measured;
            debug!("Spin released, holding heading {:.1}°", measured.to_degrees());
        }
        if self.previous_mode != mode {
            // stale integral/derivative from another target would kick the output
            self.pid.reset();
        }

        let omega = match mode {
            RotationMode::Spinning => self.spin_scale * request.heading_axis.y,
            RotationMode::Snapping => {
                self.heading_setpoint =
                    snap_to_nearest(request.heading_axis.angle(), self.snap_interval);
                self.pid.calculate(measured, self.heading_setpoint, self.period)
            }
            RotationMode::Drifting => {
                self.pid
                    .calculate(measured, self.heading_setpoint, self.period)
            }
        };

        self.previous_mode = mode;
        omega
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOOP_PERIOD_S;
    use crate::drive::geometry::Vec2;
    use crate::drive::request::TranslationMode;

    fn request(mode: RotationMode, heading_axis: Vec2) -> DriveRequest {
        DriveRequest {
            translation_mode: TranslationMode::FieldCentric,
            rotation_mode: mode,
            translation_axis: Vec2::ZERO,
            heading_axis,
        }
    }

    fn arbiter() -> RotationArbiter {
        RotationArbiter::new(&DriveConfig::default(), LOOP_PERIOD_S)
    }

    fn deg(d: f32) -> f32 {
        d.to_radians()
    }

    #[test]
    fn test_heading_captured_on_spin_release() {
        let mut arb = arbiter();
        let spin = request(RotationMode::Spinning, Vec2::new(0.0, 0.5));
        let drift = request(RotationMode::Drifting, Vec2::ZERO);

        arb.resolve_angular_velocity(&spin, deg(10.0));
        arb.resolve_angular_velocity(&spin, deg(12.0));
        arb.resolve_angular_velocity(&drift, deg(15.0));

        assert!((arb.heading_setpoint() - deg(15.0)).abs() < 1e-6);
        assert_eq!(arb.previous_mode(), RotationMode::Drifting);
    }

    #[test]
    fn test_drift_does_not_recapture() {
        let mut arb = arbiter();
        let spin = request(RotationMode::Spinning, Vec2::new(0.0, 0.5));
        let drift = request(RotationMode::Drifting, Vec2::ZERO);

        arb.resolve_angular_velocity(&spin, deg(30.0));
        arb.resolve_angular_velocity(&drift, deg(31.0));
        arb.resolve_angular_velocity(&drift, deg(40.0));
        assert!((arb.heading_setpoint() - deg(31.0)).abs() < 1e-6);
    }

    #[test]
    fn test_noisy_stick_recaptures_each_release() {
        // A stick straddling the drift deadband flips modes every tick; each
        // spin -> drift edge re-captures the current heading.
        let mut arb = arbiter();
        let spin = request(RotationMode::Spinning, Vec2::new(0.0, 0.11));
        let drift = request(RotationMode::Drifting, Vec2::new(0.0, 0.09));
        let headings = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0];

        let mut captured = Vec::new();
        for (i, h) in headings.iter().enumerate() {
            let req = if i % 2 == 0 { &spin } else { &drift };
            arb.resolve_angular_velocity(req, deg(*h));
            if req.rotation_mode == RotationMode::Drifting {
                captured.push(arb.heading_setpoint().to_degrees());
            }
        }
        println!("captured setpoints: {:?}", captured);
        assert_eq!(captured.len(), 3);
        for (got, want) in captured.iter().zip([2.0, 6.0, 10.0]) {
            assert!((got - want).abs() < 1e-3);
        }
    }

    #[test]
    fn test_spinning_is_open_loop() {
        let mut arb = arbiter();
        let max = DriveConfig::default().max_angular_rate;
        let spin = request(RotationMode::Spinning, Vec2::new(0.0, -0.5));
        let omega = arb.resolve_angular_velocity(&spin, 1.0);
        assert!((omega + 0.5 * max).abs() < 1e-6);
    }

    #[test]
    fn test_snapping_targets_nearest_quarter() {
        let mut arb = arbiter();
        // stick pointing at 80° snaps to 90°
        let axis = Vec2::new(deg(80.0).cos(), deg(80.0).sin());
        let omega = arb.resolve_angular_velocity(&request(RotationMode::Snapping, axis), 0.0);
        assert!((arb.heading_setpoint() - deg(90.0)).abs() < 1e-5);
        assert!(omega > 0.0);
        assert!(omega <= DriveConfig::default().max_angular_rate);
    }

    #[test]
    fn test_drift_across_wrap_turns_short_way() {
        let mut arb = arbiter();
        arb.reset(deg(179.0));
        let drift = request(RotationMode::Drifting, Vec2::ZERO);
        // measured just past the wrap, setpoint at 179°: turn negative (short way)
        let omega = arb.resolve_angular_velocity(&drift, deg(-178.0));
        assert!(omega < 0.0, "omega={}", omega);
        assert!(omega.abs() < 1.0);
    }

    #[test]
    fn test_reset_seeds_from_measured() {
        let mut arb = arbiter();
        arb.reset(deg(370.0));
        assert!((arb.heading_setpoint() - deg(10.0)).abs() < 1e-5);
        let drift = request(RotationMode::Drifting, Vec2::ZERO);
        let omega = arb.resolve_angular_velocity(&drift, deg(10.0));
        assert_eq!(omega, 0.0);
    }
}
