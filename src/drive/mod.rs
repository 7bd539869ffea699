// Swerve drive control core
//
// Provides:
// - Request interpretation (raw axes -> translation/rotation modes)
// - Rotation arbitration (spin, snap-to-heading, drift-hold) with a continuous PID
// - Chassis composition and acceleration limiting
// - Swerve kinematics and desaturation
// - Module setpoint optimization

pub mod chassis;
pub mod geometry;
pub mod kinematics;
pub mod optimizer;
pub mod pid;
mod pipeline;
pub mod request;
pub mod rotation;

pub use chassis::{ChassisLimiter, ChassisVelocity, SlewRateLimiter};
pub use geometry::{Vec2, snap_to_nearest, wrap_angle};
pub use kinematics::{ModulePosition, ModuleState, SwerveKinematics, desaturate};
pub use optimizer::SetpointOptimizer;
pub use pipeline::{DriveCore, DriveOutput};
pub use request::{DriveRequest, RawDriveInput, RotationMode, TranslationMode, interpret};
pub use rotation::RotationArbiter;
