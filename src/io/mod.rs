// Hardware collaborators for the drive controller
//
// Provides:
// - ModuleIo: one steer + drive module (angle/speed setpoints, measured state)
// - GyroIo: chassis heading
// - Simulated and Bridged (zenoh hw node) variants, chosen once at construction

mod bridged;
mod sim;

pub use bridged::{BridgedGyroIo, BridgedModuleIo};
pub use sim::{SimGyroIo, SimModuleIo};

use tracing::info;
use zenoh::Session;

use crate::drive::{ModulePosition, ModuleState};
use crate::error::Result;

/// Snapshot of one module, returned by [`ModuleIo::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModuleInputs {
    /// Azimuth in radians, wrapped
    pub angle: f32,
    /// Azimuth rate in rad/s
    pub angular_velocity: f32,
    /// Wheel surface speed in m/s
    pub speed: f32,
    /// Accumulated wheel travel in meters
    pub distance: f32,
}

impl ModuleInputs {
    pub fn state(&self) -> ModuleState {
        ModuleState::new(self.angle, self.speed)
    }

    pub fn position(&self) -> ModulePosition {
        ModulePosition {
            distance: self.distance,
            angle: self.angle,
        }
    }
}

/// Snapshot of the heading sensor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GyroInputs {
    /// Yaw in radians, wrapped, counter-clockwise positive
    pub yaw: f32,
    pub yaw_rate: f32,
}

/// A steerable, driven wheel module. Calls must return immediately; the
/// implementation owns its own timeouts and retries.
pub trait ModuleIo: Send {
    /// One-time setup before the first tick
    fn configure(&mut self) -> Result<()>;

    /// Advance `dt` seconds and return the latest measurement
    fn update(&mut self, dt: f32) -> ModuleInputs;

    fn set_angle_setpoint(&mut self, angle: f32);

    fn set_speed_setpoint(&mut self, speed: f32);

    fn set_brake_mode(&mut self, brake: bool);
}

pub trait GyroIo: Send {
    /// Advance `dt` seconds. `estimated_yaw_rate` is the wheel-odometry yaw
    /// rate; hardware gyros ignore it.
    fn update(&mut self, estimated_yaw_rate: f32, dt: f32) -> GyroInputs;
}

/// Which collaborator variants to build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoMode {
    Simulated,
    /// Talk to a hardware node over zenoh under this topic prefix
    Bridged { prefix: String },
}

/// Drive hardware handed to the controller
pub struct DriveIo {
    pub modules: Vec<Box<dyn ModuleIo>>,
    pub gyro: Box<dyn GyroIo>,
}

/// Build the module and gyro IO for `module_count` modules
pub async fn create_io(mode: &IoMode, module_count: usize, session: &Session) -> Result<DriveIo> {
    match mode {
        IoMode::Simulated => {
            info!("Using simulated drive IO ({} modules)", module_count);
            Ok(simulated_io(module_count))
        }
        IoMode::Bridged { prefix } => {
            info!(
                "Using bridged drive IO ({} modules) under '{}'",
                module_count, prefix
            );
            let mut modules: Vec<Box<dyn ModuleIo>> = Vec::with_capacity(module_count);
            for index in 0..module_count {
                modules.push(Box::new(BridgedModuleIo::declare(session, prefix, index).await?));
            }
            let gyro = Box::new(BridgedGyroIo::declare(session).await?);
            Ok(DriveIo { modules, gyro })
        }
    }
}

/// Simulated IO needs no session; used by tests and `--sim`
pub fn simulated_io(module_count: usize) -> DriveIo {
    DriveIo {
        modules: (0..module_count)
            .map(|_| Box::new(SimModuleIo::default()) as Box<dyn ModuleIo>)
            .collect(),
        gyro: Box::new(SimGyroIo::default()),
    }
}
