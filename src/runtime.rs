// 50 Hz drive loop with watchdog
// If operator input stops arriving, the base is stopped instead of replaying the last command.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

// local imports
use crate::config::{
    CMD_TIMEOUT, DriveConfig, LOOP_HZ, LOOP_PERIOD_S, TOPIC_CMD_CONTROLLER, TOPIC_HEALTH,
};
use crate::controller::DriveController;
use crate::io::{IoMode, create_io};
use crate::messages::{ControllerInput, RuntimeHealth};

/// What the runtime should do with the controller this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickAction {
    Drive(ControllerInput),
    Stop,
}

pub struct Runtime {
    latest_cmd: Option<ControllerInput>,
    cmd_received_at: Instant,
    health: RuntimeHealth,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            latest_cmd: None,
            cmd_received_at: Instant::now(),
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process incoming operator input
    pub fn on_command(&mut self, cmd: ControllerInput) {
        if self.health == RuntimeHealth::CmdStale {
            info!("Operator input received, driving");
        }
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = Instant::now();
    }

    /// Decide this tick's action based on watchdog state
    pub fn next_action(&mut self) -> TickAction {
        self.next_action_at(Instant::now())
    }

    fn next_action_at(&mut self, now: Instant) -> TickAction {
        let cmd_age = now.saturating_duration_since(self.cmd_received_at);

        match self.latest_cmd {
            Some(cmd) if cmd_age <= CMD_TIMEOUT => {
                self.health = RuntimeHealth::Ok;
                TickAction::Drive(cmd)
            }
            Some(_) => {
                // Watchdog triggered - stop the robot
                if self.health != RuntimeHealth::CmdStale {
                    warn!("Command stale ({:?} old), stopping robot", cmd_age);
                }
                self.health = RuntimeHealth::CmdStale;
                TickAction::Stop
            }
            None => {
                // No command ever received
                self.health = RuntimeHealth::CmdStale;
                TickAction::Stop
            }
        }
    }
}

/// Options chosen on the command line
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    pub config: DriveConfig,
    pub io_mode: IoMode,
    pub lazy: bool,
}

pub async fn run(options: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    options.config.validate()?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_CONTROLLER).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let io = create_io(
        &options.io_mode,
        options.config.module_locations.len(),
        &session,
    )
    .await?;
    let mut controller = DriveController::new(&options.config, io, LOOP_PERIOD_S);
    controller.set_lazy(options.lazy);
    controller.configure();

    let mut runtime = Runtime::new();
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout, lazy optimization {}",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis(),
        if options.lazy { "on" } else { "off" }
    );
    info!("Subscribed to: {}", TOPIC_CMD_CONTROLLER);
    info!("Publishing to: {}", TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                controller.disable();
                return Ok(());
            }
        }

        // 1. Drain all pending commands (non-blocking), keep latest
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<ControllerInput>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Drive or stop (watchdog), setpoints go straight to the module IO
        match runtime.next_action() {
            TickAction::Drive(cmd) => {
                controller.tick(&cmd);
            }
            TickAction::Stop => {
                controller.stop();
            }
        }

        // 3. Publish health
        let health_json = serde_json::to_string(&runtime.health())?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_stale_and_stops() {
        let mut runtime = Runtime::new();
        assert_eq!(runtime.next_action(), TickAction::Stop);
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_fresh_command_drives() {
        let mut runtime = Runtime::new();
        let cmd = ControllerInput {
            left_x: 0.5,
            ..Default::default()
        };
        runtime.on_command(cmd);
        assert_eq!(runtime.next_action(), TickAction::Drive(cmd));
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
    }

    #[test]
    fn test_watchdog_stops_stale_command() {
        let mut runtime = Runtime::new();
        runtime.on_command(ControllerInput::default());
        let later = Instant::now() + CMD_TIMEOUT + Duration::from_millis(10);
        assert_eq!(runtime.next_action_at(later), TickAction::Stop);
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
    }
}
