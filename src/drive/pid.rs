// Discrete PID with optional continuous (circular) input

use super::geometry::wrap_angle;
use crate::config::PidGains;

/// PID controller stepped once per control tick
///
/// With continuous input enabled the error is taken along the shortest path
/// around the circle, so a setpoint of 179° and a measurement of -179° produce
/// a 2° error instead of 358°.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    max_output: f32,
    continuous: bool,
    integral: f32,
    prev_error: Option<f32>,
}

impl PidController {
    pub fn new(gains: PidGains, max_output: f32) -> Self {
        Self {
            gains,
            max_output: max_output.abs(),
            continuous: false,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Treat the input as an angle in radians
    pub fn with_continuous_input(mut self) -> Self {
        self.continuous = true;
        self
    }

    fn error(&self, measurement: f32, setpoint: f32) -> f32 {
        let error = setpoint - measurement;
        if self.continuous { wrap_angle(error) } else { error }
    }

    /// One controller step over `dt` seconds, saturated to the max output
    pub fn calculate(&mut self, measurement: f32, setpoint: f32, dt: f32) -> f32 {
        if !measurement.is_finite() || !setpoint.is_finite() || dt <= 0.0 {
            return 0.0;
        }

        let error = self.error(measurement, setpoint);
        if error.abs() <= self.gains.tolerance {
            self.reset();
            return 0.0;
        }

        self.integral += error * dt;
        if self.gains.ki > 0.0 {
            let i_max = self.max_output / self.gains.ki;
            self.integral = self.integral.clamp(-i_max, i_max);
        }

        let derivative = match self.prev_error {
            Some(prev) => {
                let delta = error - prev;
                let delta = if self.continuous { wrap_angle(delta) } else { delta };
                delta / dt
            }
            None => 0.0,
        };
        self.prev_error = Some(error);

        let output =
            self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        output.clamp(-self.max_output, self.max_output)
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
