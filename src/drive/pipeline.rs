// One pass of the drive pipeline over sensor snapshots
//
// interpret -> arbitrate rotation -> compose -> limit -> kinematics
// -> desaturate -> optimize per module

use tracing::debug;

use super::chassis::{ChassisLimiter, ChassisVelocity, compose};
use super::geometry::wrap_angle;
use super::kinematics::{ModuleState, SwerveKinematics, desaturate};
use super::optimizer::SetpointOptimizer;
use super::request::{DriveRequest, InterpreterThresholds, RawDriveInput, RotationMode, interpret};
use super::rotation::RotationArbiter;
use crate::config::DriveConfig;

/// Everything produced by one tick
#[derive(Debug, Clone, PartialEq)]
pub struct DriveOutput {
    pub request: DriveRequest,
    /// Limited chassis velocity handed to kinematics
    pub chassis: ChassisVelocity,
    /// Optimized per-module setpoints, same order as the module locations
    pub setpoints: Vec<ModuleState>,
}

/// Stateful drive pipeline. Owns the heading hold, the previous rotation mode
/// and the acceleration limiter accumulators; nothing else writes them.
#[derive(Debug, Clone)]
pub struct DriveCore {
    thresholds: InterpreterThresholds,
    arbiter: RotationArbiter,
    limiter: ChassisLimiter,
    kinematics: SwerveKinematics,
    optimizer: SetpointOptimizer,
    max_linear_speed: f32,
    robot_centric_scale: f32,
    max_module_speed: f32,
    lazy: bool,
}

impl DriveCore {
    pub fn new(config: &DriveConfig, period: f32) -> Self {
        Self {
            thresholds: InterpreterThresholds::from(config),
            arbiter: RotationArbiter::new(config, period),
            limiter: ChassisLimiter::new(config, period),
            kinematics: SwerveKinematics::new(&config.module_locations),
            optimizer: SetpointOptimizer::new(config.lazy_speed_deadband),
            max_linear_speed: config.max_linear_speed,
            robot_centric_scale: config.robot_centric_scale,
            max_module_speed: config.max_module_speed,
            lazy: config.lazy_optimization,
        }
    }

    pub fn kinematics(&self) -> &SwerveKinematics {
        &self.kinematics
    }

    pub fn arbiter(&self) -> &RotationArbiter {
        &self.arbiter
    }

    pub fn set_lazy(&mut self, lazy: bool) {
        self.lazy = lazy;
    }

    /// Run the full pipeline for one tick
    pub fn step(
        &mut self,
        input: &RawDriveInput,
        measured_heading: f32,
        measured: &[ModuleState],
    ) -> DriveOutput {
        let heading = wrap_angle(measured_heading);
        let request = interpret(input, &self.thresholds);

        let previous = self.arbiter.previous_mode();
        let omega = self.arbiter.resolve_angular_velocity(&request, heading);
        if previous != request.rotation_mode {
            debug!("Rotation mode {:?} -> {:?}", previous, request.rotation_mode);
        }

        let desired = compose(
            &request,
            omega,
            heading,
            self.max_linear_speed,
            self.robot_centric_scale,
        );
        let chassis = self.limiter.limit(desired);

        let mut states = self.kinematics.to_module_states(chassis);
        desaturate(&mut states, self.max_module_speed);

        let setpoints = self.optimize_all(&states, measured, self.lazy);
        DriveOutput {
            request,
            chassis,
            setpoints,
        }
    }

    /// Point every module at the chassis centre so the base resists pushing.
    ///
    /// The arbiter still sees a drift request so spin-release edges are not
    /// missed while locked.
    pub fn x_lock(&mut self, measured_heading: f32, measured: &[ModuleState]) -> Vec<ModuleState> {
        let heading = wrap_angle(measured_heading);
        let hold = interpret(&RawDriveInput::default(), &self.thresholds);
        debug_assert_eq!(hold.rotation_mode, RotationMode::Drifting);
        self.arbiter.resolve_angular_velocity(&hold, heading);
        self.limiter.reset();

        let states: Vec<ModuleState> = self
            .kinematics
            .locations()
            .iter()
            .map(|loc| ModuleState::new(loc.angle(), 0.0))
            .collect();
        self.kinematics.hold_headings(&states);
        self.optimize_all(&states, measured, false)
    }

    /// Stop the base: zero speeds with angles held, limiter cleared and heading
    /// hold re-seeded from the measured heading.
    pub fn stop(&mut self, measured_heading: f32, measured: &[ModuleState]) -> Vec<ModuleState> {
        self.limiter.reset();
        self.arbiter.reset(measured_heading);
        let setpoints: Vec<ModuleState> = measured
            .iter()
            .map(|m| ModuleState {
                angle: m.angle,
                speed: 0.0,
            })
            .collect();
        self.kinematics.hold_headings(&setpoints);
        setpoints
    }

    /// Re-seed the heading hold from the measured heading
    pub fn reset_heading(&mut self, measured_heading: f32) {
        self.arbiter.reset(measured_heading);
    }

    fn optimize_all(
        &self,
        desired: &[ModuleState],
        measured: &[ModuleState],
        lazy: bool,
    ) -> Vec<ModuleState> {
        desired
            .iter()
            .enumerate()
            .map(|(i, &d)| match measured.get(i) {
                Some(&m) => self.optimizer.optimize(d, m, lazy),
                None => d,
            })
            .collect()
    }
}
