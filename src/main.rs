use clap::{Parser, Subcommand};
use maestro::{
    Controller, SerialConfig, SerialTransport, DEFAULT_BAUD_RATE, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_PORT, DEFAULT_TIMEOUT_MS,
};
use std::error::Error;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "maestro", about = "Drive a Pololu Maestro servo controller over serial")]
struct Cli {
    /// Serial device of the controller's command port
    #[arg(long, env = "MAESTRO_PORT", default_value = DEFAULT_PORT)]
    port: String,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set a channel's target pulse width in microseconds
    Target { channel: u8, microseconds: f64 },
    /// Set a channel's speed limit in microseconds per millisecond
    Speed { channel: u8, value: f64 },
    /// Set a channel's acceleration limit in microseconds per millisecond squared
    Accel { channel: u8, value: f64 },
    /// Read a channel's current pulse width
    Position { channel: u8 },
    /// Read and decode the error register
    Errors,
    /// Send every channel to its stored home position
    Home,
    /// Block until no channel is moving (Ctrl-C to give up)
    Wait {
        #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
        interval_ms: u64,
    },
    /// Center a pan/tilt mount on channels 0 and 1, then step both
    PanTilt {
        #[arg(long, default_value_t = 1560.0)]
        center: f64,
        #[arg(long, default_value_t = 720.0)]
        minimum: f64,
        #[arg(long, default_value_t = 2300.0)]
        maximum: f64,
        /// Degrees of travel between minimum and maximum
        #[arg(long, default_value_t = 160.0)]
        range: f64,
        #[arg(long, default_value_t = 0.8)]
        speed: f64,
        #[arg(long, default_value_t = 0.005)]
        acceleration: f64,
        /// Degrees to step after centering
        #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
        step: f64,
    },
}

/// Waits for motion to end; Ctrl-C aborts with an error so nothing moves afterwards.
async fn wait(controller: &Controller, interval: Duration) -> Result<(), Box<dyn Error>> {
    if let Err(e) = controller
        .wait_until_stopped_or(interval, tokio::signal::ctrl_c())
        .await
    {
        warn!("Stopped waiting for servos: {}", e);
        return Err(e.into());
    }
    info!("All servos stopped");
    Ok(())
}

struct Mount {
    center: f64,
    minimum: f64,
    maximum: f64,
    range: f64,
    speed: f64,
    acceleration: f64,
}

async fn pan_tilt(config: &SerialConfig, mount: &Mount, step: f64) -> Result<(), Box<dyn Error>> {
    let transport = SerialTransport::open(config)?;
    let (controller, mut servos) = Controller::with_servos(transport, &["pan", "tilt"])?;
    let interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

    for servo in servos.iter_mut() {
        servo.set_limits(mount.minimum, mount.maximum).set_range(mount.range);
        servo.set_speed(mount.speed).await?;
        servo.set_acceleration(mount.acceleration).await?;
        servo.set_position(mount.center).await?;
    }
    wait(&controller, interval).await?;

    let pan = servos.require_mut("pan")?.nudge(step).await?;
    let tilt = servos.require_mut("tilt")?.nudge(-step).await?;
    info!("Stepped pan to {}us and tilt to {}us", pan, tilt);
    wait(&controller, interval).await?;

    for servo in servos.iter() {
        println!("{} position: {:.2}us", servo.name(), servo.position().await?);
    }
    Ok(())
}

async fn run(controller: &Controller, command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Target {
            channel,
            microseconds,
        } => controller.set_target(channel, microseconds).await?,
        Command::Speed { channel, value } => controller.set_speed(channel, value).await?,
        Command::Accel { channel, value } => {
            controller.set_acceleration(channel, value).await?
        }
        Command::Position { channel } => {
            let position = controller.get_position(channel).await?;
            println!("Channel {} position: {:.2}us", channel, position);
        }
        Command::Errors => {
            let errors = controller.get_errors().await?;
            println!("Errors (0x{:04x}): {}", errors.bits(), errors);
        }
        Command::Home => controller.go_home().await?,
        Command::Wait { interval_ms } => {
            wait(controller, Duration::from_millis(interval_ms)).await?
        }
        Command::PanTilt { .. } => return Err("pan-tilt needs named servos".into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = SerialConfig {
        baud_rate: cli.baud,
        timeout: Duration::from_millis(cli.timeout_ms),
        ..SerialConfig::new(cli.port)
    };

    match cli.command {
        Command::PanTilt {
            center,
            minimum,
            maximum,
            range,
            speed,
            acceleration,
            step,
        } => {
            let mount = Mount {
                center,
                minimum,
                maximum,
                range,
                speed,
                acceleration,
            };
            pan_tilt(&config, &mount, step).await?;
        }
        command => run(&Controller::open(&config)?, command).await?,
    }

    Ok(())
}
