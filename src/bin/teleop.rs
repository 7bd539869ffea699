// Keyboard teleop: WASD translate, Z/X spin, arrows snap (hold-to-align), C robot-relative,
// SPACE x-lock, H reset heading, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::{Duration, Instant};
use tracing::info;

use swerve_zenoh_runtime::config::TOPIC_CMD_CONTROLLER;
use swerve_zenoh_runtime::messages::ControllerInput;

const INPUT_TIMEOUT_MS: u64 = 100; // Release sticks after this much time with no input
const STICK: f32 = 0.6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_CONTROLLER).await?;

    info!("Controls: WASD=move, Z/X=spin, arrows=snap, C=robot-relative");
    info!("          SPACE=x-lock, H=reset heading, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut input = ControllerInput::default();
    let mut robot_relative = false;
    let mut last_movement_input = Instant::now();

    loop {
        // One-shot buttons only last a single message
        input.reset_heading = false;

        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if pressed {
                    last_movement_input = Instant::now();
                }

                match code {
                    // Translation (x forward, y left)
                    KeyCode::Char('w') if pressed => input.left_x = STICK,
                    KeyCode::Char('s') if pressed => input.left_x = -STICK,
                    KeyCode::Char('a') if pressed => input.left_y = STICK,
                    KeyCode::Char('d') if pressed => input.left_y = -STICK,

                    // Manual spin
                    KeyCode::Char('z') if pressed => input.right_y = STICK,
                    KeyCode::Char('x') if pressed => input.right_y = -STICK,

                    // Snap to a field heading
                    KeyCode::Up if pressed => snap(&mut input, 1.0, 0.0),
                    KeyCode::Down if pressed => snap(&mut input, -1.0, 0.0),
                    KeyCode::Left if pressed => snap(&mut input, 0.0, 1.0),
                    KeyCode::Right if pressed => snap(&mut input, 0.0, -1.0),

                    KeyCode::Char('c') if pressed => {
                        robot_relative = !robot_relative;
                        info!("Robot-relative: {}", robot_relative);
                    }
                    KeyCode::Char(' ') if pressed => input.x_lock = true,
                    KeyCode::Char('h') if pressed => {
                        input.reset_heading = true;
                        info!("Heading hold reset");
                    }

                    // Quit
                    KeyCode::Char('q') | KeyCode::Esc if pressed => break,

                    _ => {}
                }
            }
        }

        // Release everything if no input for INPUT_TIMEOUT_MS
        if last_movement_input.elapsed() > Duration::from_millis(INPUT_TIMEOUT_MS) {
            input = ControllerInput {
                reset_heading: input.reset_heading,
                ..ControllerInput::default()
            };
        }
        input.robot_relative_trigger = if robot_relative { 1.0 } else { 0.0 };

        // Always publish at ~50Hz
        publisher.put(serde_json::to_string(&input)?).await?;
    }

    Ok(())
}

fn snap(input: &mut ControllerInput, x: f32, y: f32) {
    input.align_trigger = 1.0;
    input.right_x = x;
    input.right_y = y;
}
