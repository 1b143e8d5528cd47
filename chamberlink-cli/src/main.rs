//! chamberlink - command-line interface for the chamber controller
//!
//! Streams live telemetry and sends one-shot control commands.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use chamberlink_client::{ChamberClient, ClientConfig};
use colored::Colorize;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chamberlink")]
#[command(about = "Command-line interface for the chamber environmental controller")]
#[command(version)]
struct Cli {
    /// Controller WebSocket endpoint
    #[arg(short, long, default_value = "ws://chamber.local/ws", env = "CHAMBER_URL")]
    url: String,

    /// Keepalive interval in milliseconds
    #[arg(long, default_value = "3500")]
    keep_alive_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(s: Switch) -> bool {
        s == Switch::On
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Stream telemetry until interrupted
    Watch {
        /// Emit one JSON object per frame instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Print the first telemetry frame and exit
    Status {
        /// Emit JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Set the chamber temperature set point in degrees Celsius
    SetTemp {
        deg_c: u16,
    },

    /// Set the heater run timer in minutes
    SetHeaterTime {
        mins: u32,
    },

    /// Switch the chamber light
    Light {
        state: Switch,
    },

    /// Switch the heater fan
    HeaterFan {
        state: Switch,
    },

    /// Switch the door vent fan
    DoorFan {
        state: Switch,
    },

    /// Switch the auxiliary fan
    AuxFan {
        state: Switch,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new(cli.url.clone())
        .with_keep_alive_interval(Duration::from_millis(cli.keep_alive_ms));
    let client = ChamberClient::connect(config);

    let result = match cli.command {
        Commands::Watch { json } => commands::watch(&client, json).await,
        Commands::Status { json } => commands::status(&client, json).await,
        Commands::SetTemp { deg_c } => {
            commands::one_shot(&client, chamberlink_protocol::Command::SetTemperature(deg_c)).await
        }
        Commands::SetHeaterTime { mins } => {
            commands::one_shot(
                &client,
                chamberlink_protocol::Command::SetHeaterTimeLeft(mins),
            )
            .await
        }
        Commands::Light { state } => {
            commands::one_shot(&client, chamberlink_protocol::Command::SetLight(state.into())).await
        }
        Commands::HeaterFan { state } => {
            commands::one_shot(
                &client,
                chamberlink_protocol::Command::SetHeaterFan(state.into()),
            )
            .await
        }
        Commands::DoorFan { state } => {
            commands::one_shot(
                &client,
                chamberlink_protocol::Command::SetDoorVentFan(state.into()),
            )
            .await
        }
        Commands::AuxFan { state } => {
            commands::one_shot(
                &client,
                chamberlink_protocol::Command::SetAuxFan(state.into()),
            )
            .await
        }
    };

    client.close().await;

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }

    Ok(())
}
