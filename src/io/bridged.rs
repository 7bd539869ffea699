// Module and gyro IO bridged to a hardware node over zenoh
//
// Setpoints are published on "{prefix}/rt/module/{i}", measurements arrive on
// "{prefix}/state/module/{i}". Both directions are non-blocking: publishing
// uses the synchronous `wait()` resolver and feedback is drained with try_recv.

use tracing::{debug, warn};
use zenoh::Session;
use zenoh::Wait;
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;

use crate::config::TOPIC_GYRO;
use crate::drive::geometry::wrap_angle;
use crate::error::{DriveError, Result};
use crate::messages::{GyroFeedback, ModuleCommand, ModuleFeedback};

use super::{GyroInputs, GyroIo, ModuleInputs, ModuleIo};

/// Drain all pending samples, keep the last one that parses
fn latest<T: serde::de::DeserializeOwned>(
    subscriber: &Subscriber<FifoChannelHandler<Sample>>,
) -> Option<T> {
    let mut latest = None;
    while let Ok(Some(sample)) = subscriber.try_recv() {
        let payload = sample.payload().to_bytes();
        match serde_json::from_slice::<T>(&payload) {
            Ok(value) => latest = Some(value),
            Err(e) => warn!("Failed to parse feedback on {}: {}", sample.key_expr(), e),
        }
    }
    latest
}

pub struct BridgedModuleIo {
    index: usize,
    publisher: Publisher<'static>,
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    command: ModuleCommand,
    inputs: ModuleInputs,
}

impl BridgedModuleIo {
    pub async fn declare(session: &Session, prefix: &str, index: usize) -> Result<Self> {
        let rt_topic = format!("{}/rt/module/{}", prefix, index);
        let state_topic = format!("{}/state/module/{}", prefix, index);
        debug!("Module {}: publishing {}, subscribing {}", index, rt_topic, state_topic);

        let publisher = session.declare_publisher(rt_topic).await?;
        let subscriber = session.declare_subscriber(state_topic).await?;
        Ok(Self {
            index,
            publisher,
            subscriber,
            command: ModuleCommand::default(),
            inputs: ModuleInputs::default(),
        })
    }

    fn publish(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.command)?;
        self.publisher.put(json).wait().map_err(|e| DriveError::Module {
            index: self.index,
            reason: e.to_string(),
        })
    }
}

impl ModuleIo for BridgedModuleIo {
    fn configure(&mut self) -> Result<()> {
        self.command = ModuleCommand {
            brake: true,
            ..ModuleCommand::default()
        };
        self.publish()
    }

    fn update(&mut self, _dt: f32) -> ModuleInputs {
        if let Some(feedback) = latest::<ModuleFeedback>(&self.subscriber) {
            self.inputs = ModuleInputs {
                angle: wrap_angle(feedback.angle),
                angular_velocity: feedback.angular_velocity,
                speed: feedback.speed,
                distance: feedback.distance,
            };
        }
        self.inputs
    }

    fn set_angle_setpoint(&mut self, angle: f32) {
        self.command.angle = wrap_angle(angle);
    }

    // The speed setpoint completes a command, so it is what goes out on the wire
    fn set_speed_setpoint(&mut self, speed: f32) {
        self.command.speed = speed;
        if let Err(e) = self.publish() {
            warn!("{}", e);
        }
    }

    // Brake changes go out immediately, not with the next speed setpoint
    fn set_brake_mode(&mut self, brake: bool) {
        self.command.brake = brake;
        if let Err(e) = self.publish() {
            warn!("{}", e);
        }
    }
}

pub struct BridgedGyroIo {
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    inputs: GyroInputs,
}

impl BridgedGyroIo {
    pub async fn declare(session: &Session) -> Result<Self> {
        let subscriber = session.declare_subscriber(TOPIC_GYRO).await?;
        Ok(Self {
            subscriber,
            inputs: GyroInputs::default(),
        })
    }
}

impl GyroIo for BridgedGyroIo {
    fn update(&mut self, _estimated_yaw_rate: f32, _dt: f32) -> GyroInputs {
        if let Some(feedback) = latest::<GyroFeedback>(&self.subscriber) {
            self.inputs = GyroInputs {
                yaw: wrap_angle(feedback.yaw),
                yaw_rate: feedback.yaw_rate,
            };
        }
        self.inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_brake_mode_goes_out_on_the_wire() {
        let session = zenoh::open(zenoh::Config::default()).await.unwrap();
        let prefix = "swerve_test_brake";
        let listener = session
            .declare_subscriber(format!("{}/rt/module/0", prefix))
            .await
            .unwrap();
        let mut module = BridgedModuleIo::declare(&session, prefix, 0).await.unwrap();

        module.configure().unwrap();
        module.set_angle_setpoint(0.0);
        module.set_speed_setpoint(0.0);
        module.set_brake_mode(false);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let last = latest::<ModuleCommand>(&listener);
        println!("last command: {:?}", last);
        assert_eq!(last.map(|c| c.brake), Some(false));

        module.set_brake_mode(true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(latest::<ModuleCommand>(&listener).map(|c| c.brake), Some(true));
    }
}
