// Swerve drive runtime: operator input over zenoh -> per-module angle/speed setpoints

pub mod config;
pub mod controller;
pub mod drive;
pub mod error;
pub mod io;
pub mod messages;
pub mod runtime;
