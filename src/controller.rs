// Drive controller: sensor read -> drive pipeline -> actuator write, once per tick

use tracing::{debug, info, warn};

use crate::config::DriveConfig;
use crate::drive::{DriveCore, ModulePosition, ModuleState, RawDriveInput};
use crate::io::{DriveIo, GyroIo, ModuleInputs, ModuleIo};
use crate::messages::ControllerInput;

/// Result of one controller tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub heading: f32,
    pub setpoints: Vec<ModuleState>,
}

/// The single drive controller instance. Constructed once at startup and
/// handed by reference to whatever drives it.
pub struct DriveController {
    core: DriveCore,
    modules: Vec<Box<dyn ModuleIo>>,
    gyro: Box<dyn GyroIo>,
    inputs: Vec<ModuleInputs>,
    heading: f32,
    period: f32,
}

impl DriveController {
    pub fn new(config: &DriveConfig, io: DriveIo, period: f32) -> Self {
        let DriveIo { modules, gyro } = io;
        if modules.len() != config.module_locations.len() {
            warn!(
                "{} module IOs for {} module locations, extra entries are ignored",
                modules.len(),
                config.module_locations.len()
            );
        }
        let inputs = vec![ModuleInputs::default(); modules.len()];
        Self {
            core: DriveCore::new(config, period),
            modules,
            gyro,
            inputs,
            heading: 0.0,
            period,
        }
    }

    /// Configure every module; a failing module is logged and left running
    pub fn configure(&mut self) {
        for (i, module) in self.modules.iter_mut().enumerate() {
            match module.configure() {
                Ok(()) => debug!("Module {} configured", i),
                Err(e) => warn!("Module {} configure failed: {}", i, e),
            }
            module.set_brake_mode(true);
        }
        info!("Drive controller configured ({} modules)", self.modules.len());
    }

    pub fn set_lazy(&mut self, lazy: bool) {
        self.core.set_lazy(lazy);
    }

    pub fn heading(&self) -> f32 {
        self.heading
    }

    pub fn heading_setpoint(&self) -> f32 {
        self.core.arbiter().heading_setpoint()
    }

    /// Read-only odometry view of the modules, as of the last tick
    pub fn module_positions(&self) -> Vec<ModulePosition> {
        self.inputs.iter().map(ModuleInputs::position).collect()
    }

    fn measured_states(&self) -> Vec<ModuleState> {
        self.inputs.iter().map(ModuleInputs::state).collect()
    }

    fn read_sensors(&mut self) {
        for (input, module) in self.inputs.iter_mut().zip(self.modules.iter_mut()) {
            *input = module.update(self.period);
        }
        let yaw_rate = self
            .core
            .kinematics()
            .to_chassis_velocity(&self.measured_states())
            .omega;
        self.heading = self.gyro.update(yaw_rate, self.period).yaw;
    }

    fn write_setpoints(&mut self, setpoints: &[ModuleState]) {
        for (module, setpoint) in self.modules.iter_mut().zip(setpoints) {
            module.set_angle_setpoint(setpoint.angle);
            module.set_speed_setpoint(setpoint.speed);
        }
    }

    /// Run one control tick for the given operator input
    pub fn tick(&mut self, input: &ControllerInput) -> TickReport {
        self.read_sensors();
        let measured = self.measured_states();

        if input.reset_heading {
            self.core.reset_heading(self.heading);
        }

        let setpoints = if input.x_lock {
            self.core.x_lock(self.heading, &measured)
        } else {
            let output = self
                .core
                .step(&RawDriveInput::from(input), self.heading, &measured);
            debug!(
                "mode={:?} chassis=({:.2}, {:.2}, {:.2})",
                output.request.rotation_mode,
                output.chassis.vx,
                output.chassis.vy,
                output.chassis.omega
            );
            output.setpoints
        };

        self.write_setpoints(&setpoints);
        TickReport {
            heading: self.heading,
            setpoints,
        }
    }

    /// Stop the base for this tick (watchdog): zero speed, angles held
    pub fn stop(&mut self) -> TickReport {
        self.read_sensors();
        let measured = self.measured_states();
        let setpoints = self.core.stop(self.heading, &measured);
        self.write_setpoints(&setpoints);
        TickReport {
            heading: self.heading,
            setpoints,
        }
    }

    /// Stop and let the modules coast, e.g. on shutdown
    pub fn disable(&mut self) {
        info!("Disabling drive");
        self.stop();
        for module in self.modules.iter_mut() {
            module.set_brake_mode(false);
        }
    }
}
