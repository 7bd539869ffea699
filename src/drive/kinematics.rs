// Swerve kinematics for N independently steered modules
// Converts chassis velocity to per-module (angle, speed) and back.

use super::chassis::ChassisVelocity;
use super::geometry::{Vec2, wrap_angle};

/// Module angle (rad, wrapped) and signed wheel speed (m/s)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModuleState {
    pub angle: f32,
    pub speed: f32,
}

impl ModuleState {
    pub fn new(angle: f32, speed: f32) -> Self {
        Self {
            angle: wrap_angle(angle),
            speed,
        }
    }
}

/// Odometry-facing module reading: accumulated distance (m) and angle (rad)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulePosition {
    pub distance: f32,
    pub angle: f32,
}

/// Module speeds below this keep their previous heading (m/s)
const STATIONARY_SPEED: f32 = 1e-6;

#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    locations: Vec<Vec2>,
    /// Last heading handed out per module
    headings: Vec<f32>,
}

impl SwerveKinematics {
    pub fn new(locations: &[[f32; 2]]) -> Self {
        Self {
            locations: locations.iter().map(|&[x, y]| Vec2::new(x, y)).collect(),
            headings: vec![0.0; locations.len()],
        }
    }

    pub fn locations(&self) -> &[Vec2] {
        &self.locations
    }

    /// Inverse kinematics. A stationary module keeps its last heading.
    pub fn to_module_states(&mut self, chassis: ChassisVelocity) -> Vec<ModuleState> {
        self.locations
            .iter()
            .zip(self.headings.iter_mut())
            .map(|(loc, heading)| {
                // v_module = v_chassis + omega x r
                let vx = chassis.vx - chassis.omega * loc.y;
                let vy = chassis.vy + chassis.omega * loc.x;
                let v = Vec2::new(vx, vy);
                let speed = v.norm();
                if speed < STATIONARY_SPEED {
                    return ModuleState::new(*heading, 0.0);
                }
                let state = ModuleState::new(v.angle(), speed);
                *heading = state.angle;
                state
            })
            .collect()
    }

    /// Headings to keep for stationary modules until they move again
    pub fn hold_headings(&mut self, states: &[ModuleState]) {
        for (heading, state) in self.headings.iter_mut().zip(states) {
            *heading = wrap_angle(state.angle);
        }
    }

    /// Least-squares forward kinematics from measured module states
    pub fn to_chassis_velocity(&self, states: &[ModuleState]) -> ChassisVelocity {
        // Normal equations (A^T A) x = A^T b with rows
        //   [1, 0, -y_i] . x = vx_i
        //   [0, 1,  x_i] . x = vy_i
        let mut ata = [[0.0f32; 3]; 3];
        let mut atb = [0.0f32; 3];
        for (loc, state) in self.locations.iter().zip(states) {
            let (sin, cos) = state.angle.sin_cos();
            let vx = state.speed * cos;
            let vy = state.speed * sin;
            let rows = [([1.0, 0.0, -loc.y], vx), ([0.0, 1.0, loc.x], vy)];
            for (row, b) in rows {
                for i in 0..3 {
                    atb[i] += row[i] * b;
                    for j in 0..3 {
                        ata[i][j] += row[i] * row[j];
                    }
                }
            }
        }

        match solve3(ata, atb) {
            Some([vx, vy, omega]) => ChassisVelocity::new(vx, vy, omega),
            None => {
                // All modules at the centre: rotation is unobservable
                let n = states.len().max(1) as f32;
                ChassisVelocity::new(atb[0] / n, atb[1] / n, 0.0)
            }
        }
    }
}

/// Scale all module speeds by one factor so none exceeds `max_speed`
pub fn desaturate(states: &mut [ModuleState], max_speed: f32) {
    let fastest = states.iter().map(|s| s.speed.abs()).fold(0.0f32, f32::max);
    if fastest > max_speed && fastest > 0.0 {
        let scale = max_speed / fastest;
        for state in states.iter_mut() {
            state.speed *= scale;
        }
    }
}

/// Cramer's rule; None when the system is singular
fn solve3(a: [[f32; 3]; 3], b: [f32; 3]) -> Option<[f32; 3]> {
    let det = |m: [[f32; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let d = det(a);
    if d.abs() < 1e-9 {
        return None;
    }
    let mut x = [0.0f32; 3];
    for (col, out) in x.iter_mut().enumerate() {
        let mut m = a;
        for row in 0..3 {
            m[row][col] = b[row];
        }
        *out = det(m) / d;
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DriveConfig;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn kinematics() -> SwerveKinematics {
        SwerveKinematics::new(&DriveConfig::default().module_locations)
    }

    #[test]
    fn test_pure_translation_all_modules_agree() {
        let states = kinematics().to_module_states(ChassisVelocity::new(0.0, 2.0, 0.0));
        for s in &states {
            assert!((s.angle - FRAC_PI_2).abs() < 1e-6);
            assert!((s.speed - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pure_rotation_is_tangential() {
        let states = kinematics().to_module_states(ChassisVelocity::new(0.0, 0.0, 1.0));
        // front-left at (+, +) moves toward (-, +): 135°
        assert!((states[0].angle - 3.0 * FRAC_PI_4).abs() < 1e-5);
        let radius = (0.28f32 * 0.28 * 2.0).sqrt();
        for s in &states {
            assert!((s.speed - radius).abs() < 1e-5);
        }
    }

    #[test]
    fn test_zero_velocity() {
        for s in kinematics().to_module_states(ChassisVelocity::zero()) {
            assert_eq!(s, ModuleState::new(0.0, 0.0));
        }
    }

    #[test]
    fn test_stopping_keeps_last_heading() {
        let mut k = kinematics();
        k.to_module_states(ChassisVelocity::new(0.0, 1.0, 0.0));
        for s in k.to_module_states(ChassisVelocity::zero()) {
            assert!((s.angle - FRAC_PI_2).abs() < 1e-6);
            assert_eq!(s.speed, 0.0);
        }

        let held = vec![ModuleState::new(1.0, 0.0); 4];
        k.hold_headings(&held);
        for s in k.to_module_states(ChassisVelocity::zero()) {
            assert!((s.angle - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_desaturate_preserves_ratios() {
        let mut states: Vec<ModuleState> = [10.0, 6.0, -8.0, 4.0]
            .iter()
            .map(|&v| ModuleState::new(0.0, v))
            .collect();
        desaturate(&mut states, 8.0);
        let speeds: Vec<f32> = states.iter().map(|s| s.speed).collect();
        for (got, want) in speeds.iter().zip([8.0, 4.8, -6.4, 3.2]) {
            assert!((got - want).abs() < 1e-5, "{:?}", speeds);
        }
    }

    #[test]
    fn test_desaturate_leaves_attainable_speeds() {
        let mut states = vec![ModuleState::new(0.0, 3.0), ModuleState::new(1.0, -2.0)];
        desaturate(&mut states, 8.0);
        assert_eq!(states[0].speed, 3.0);
        assert_eq!(states[1].speed, -2.0);
    }

    #[test]
    fn test_forward_kinematics_recovers_chassis() {
        let mut k = kinematics();
        let chassis = ChassisVelocity::new(1.2, -0.7, 0.9);
        let states = k.to_module_states(chassis);
        let back = k.to_chassis_velocity(&states);
        assert!((back.vx - chassis.vx).abs() < 1e-4);
        assert!((back.vy - chassis.vy).abs() < 1e-4);
        assert!((back.omega - chassis.omega).abs() < 1e-4);
    }
}
