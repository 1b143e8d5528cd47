//! Command execution.

use chamberlink_client::{ChamberClient, ChamberState, ClientError};
use chamberlink_protocol::Command;
use colored::Colorize;
use std::time::Duration;

/// How long to wait for the controller before giving up on a one-shot
/// command or status query.
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(30);

/// Streams telemetry to stdout until Ctrl+C.
pub async fn watch(client: &ChamberClient, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let shared = client.shared();
    eprintln!("{}", "Waiting for telemetry (Ctrl+C to stop)...".dimmed());

    loop {
        tokio::select! {
            _ = shared.changed() => {
                print_state(&client.state(), json)?;
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("{}", "Stopped".yellow());
                return Ok(());
            }
        }
    }
}

/// Waits for the first telemetry frame, prints it, and returns.
pub async fn status(client: &ChamberClient, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    wait_for_frame(client).await?;
    print_state(&client.state(), json)?;
    Ok(())
}

/// Sends a single command once the connection is live.
pub async fn one_shot(
    client: &ChamberClient,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    // Wait for telemetry first so the command lands on an open session
    // instead of sitting in the outbound queue of a client we are about to
    // close.
    wait_for_frame(client).await?;
    client.send(command).await?;

    // Give the session a beat to flush the frame before teardown.
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("{} {:?}", "Sent".green(), command);
    Ok(())
}

async fn wait_for_frame(client: &ChamberClient) -> Result<(), ClientError> {
    let shared = client.shared();
    tokio::time::timeout(FIRST_FRAME_TIMEOUT, shared.changed())
        .await
        .map_err(|_| ClientError::TelemetryTimeout)
}

fn print_state(state: &ChamberState, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(state)?);
        return Ok(());
    }

    let t = &state.telemetry;
    let link = if state.connected {
        "online".green()
    } else {
        "offline".red()
    };
    let switch = |on: bool| if on { "on".green() } else { "off".dimmed() };

    println!(
        "[{}] {} {:.1}{} (set {}{})  heater {} ({:.0}%, {} min left, {} ohm)  light {}  fans: heater {}/{} door {}/{} aux {}/{}",
        link,
        "temp".bold(),
        t.temp_deg_c,
        "degC".dimmed(),
        t.temp_set_deg_c,
        "degC".dimmed(),
        switch(t.flags.heater_on),
        t.heater_duty_cycle_pct,
        t.heater_time_left_mins,
        t.heater_resistance_ohms,
        switch(t.flags.light_on),
        switch(t.flags.heater_fan_set),
        switch(t.flags.heater_fan_on),
        switch(t.flags.door_vent_fan_set),
        switch(t.flags.door_vent_fan_on),
        switch(t.flags.aux_fan_set),
        switch(t.flags.aux_fan_on),
    );
    Ok(())
}
