//! Command line controller for Mira BLE mixing valves
//!
//! Scans for valves and reads or changes their state over GATT.

use clap::{Args, Parser, Subcommand};

use miramode_ble::BleTransport;
use miramode_session::{DeviceIdentity, DeviceState, Session};

#[derive(Parser)]
#[command(name = "miramode")]
#[command(about = "Control Mira BLE shower/bath mixing valves")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Identifiers of the valve to talk to.
#[derive(Args)]
struct Device {
    /// Transport address of the valve (MAC, or CoreBluetooth UUID on macOS)
    #[arg(short, long)]
    address: String,
    /// Device id of the valve unit (0-255)
    #[arg(short, long)]
    device_id: u8,
    /// Paired client id; required for anything that changes state
    #[arg(short, long)]
    client_id: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for Mira valves
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Read the current valve state
    State {
        #[command(flatten)]
        device: Device,
    },
    /// Set the temperature setpoint in degrees Celsius
    SetTemperature {
        #[command(flatten)]
        device: Device,
        celsius: f64,
    },
    /// Start or stop the shower outlet
    Shower {
        #[command(flatten)]
        device: Device,
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
    /// Start or stop the bath outlet
    Bath {
        #[command(flatten)]
        device: Device,
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

enum Op {
    Refresh,
    SetTemperature(f64),
    Shower(bool),
    Bath(bool),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { duration } => scan_valves(duration).await?,
        Commands::State { device } => run_op(device, Op::Refresh).await?,
        Commands::SetTemperature { device, celsius } => {
            run_op(device, Op::SetTemperature(celsius)).await?
        }
        Commands::Shower { device, state } => run_op(device, Op::Shower(state == "on")).await?,
        Commands::Bath { device, state } => run_op(device, Op::Bath(state == "on")).await?,
    }

    Ok(())
}

async fn scan_valves(duration: u64) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for Mira valves ({} seconds)...", duration);

    let devices = miramode_ble::scan(duration).await?;
    println!("\nFound {} devices:", devices.len());
    for device in devices {
        let rssi = device
            .rssi
            .map(|r| format!("{} dBm", r))
            .unwrap_or_else(|| "N/A".to_string());
        let marker = if device.is_mira { " [MIRA]" } else { "" };
        println!("  {} ({}) RSSI: {}{}", device.name, device.address, rssi, marker);
    }

    Ok(())
}

/// Run one session operation, print the resulting state and always shut the
/// session down afterwards.
async fn run_op(device: Device, op: Op) -> Result<(), Box<dyn std::error::Error>> {
    let identity = DeviceIdentity::new(device.address, device.device_id, device.client_id)?;
    let session = Session::new(identity, BleTransport::new().await?);

    let result = match op {
        Op::Refresh => session.refresh().await,
        Op::SetTemperature(celsius) => session.set_temperature(celsius).await,
        Op::Shower(on) => session.set_shower(on).await,
        Op::Bath(on) => session.set_bath(on).await,
    };
    session.shutdown().await;

    print_state(&result?);
    Ok(())
}

fn print_state(state: &DeviceState) {
    let outlet = |on: bool| if on { "on" } else { "off" };
    println!(
        "Temperature: {:.2} C, Shower: {}, Bath: {}",
        state.temperature,
        outlet(state.shower),
        outlet(state.bath)
    );
}
