//! Commandline argument parsers using clap for BrainBridge

use clap::Parser;
use std::path::PathBuf;

/// Bridges two headsets' OSC streams to the actuator's serial port.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct BridgeArgs {
    /// UDP port the first player's headset streams OSC to
    pub port_p1: u16,

    /// UDP port the second player's headset streams OSC to
    pub port_p2: u16,

    /// Serial device the actuator is plugged into, e.g. /dev/ttyACM0 or COM3
    pub serial_device: PathBuf,

    /// Baud rate the actuator firmware was built for
    pub baud_rate: u32,

    /// RON file overriding the default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum time between frames sent to the actuator, in milliseconds
    #[arg(short = 'w', long = "write-interval-ms")]
    pub write_interval_ms: Option<u64>,
}

/// Runs the session against two fake headsets, logging frames instead of
/// writing them to a device.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct MonitorArgs {
    /// RON file overriding the default settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Minimum time between frames, in milliseconds
    #[arg(short = 'w', long = "write-interval-ms")]
    pub write_interval_ms: Option<u64>,

    /// How many polls the fake headsets take to settle on good contact
    #[arg(short, long, default_value_t = 2000)]
    pub settle_polls: u32,

    /// Seed for the fake headsets, random if left out
    #[arg(long)]
    pub seed: Option<u64>,
}
