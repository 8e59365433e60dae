//! Bridges two headsets streaming OSC over UDP to the actuator on a serial
//! port.
//!
//! ```text
//! brainbridge <port_p1> <port_p2> <serial_device> <baud_rate>
//! ```
//!
//! Set `RUST_LOG=info` (or `debug` to see every frame) for logs.

use brainbridge::{
    args::BridgeArgs,
    config::Config,
    error::BridgeError,
    headset_source::HeadsetListener,
    link::{Backoff, LinkWriter, SerialConnector},
    player::PlayerId,
    session::{Session, TickOutcome},
};
use clap::Parser;
use log::{error, info};
use std::{process, time::Instant};

fn main() {
    env_logger::init();
    let args = BridgeArgs::parse();

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: BridgeArgs) -> Result<(), BridgeError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(ms) = args.write_interval_ms {
        config.write_interval_ms = ms;
    }

    let mut listeners = [
        HeadsetListener::bind(PlayerId::One, args.port_p1, config.paths.clone())?,
        HeadsetListener::bind(PlayerId::Two, args.port_p2, config.paths.clone())?,
    ];
    info!(
        "Listening for player 1 on UDP {} and player 2 on UDP {}",
        args.port_p1, args.port_p2
    );

    let connector = SerialConnector {
        device: args.serial_device,
        baud_rate: args.baud_rate,
        write_timeout: config.write_timeout(),
    };
    let mut link = LinkWriter::new(connector, Backoff::from(&config.backoff));
    link.connect_blocking()?;

    let mut session = Session::with_write_interval(config.write_interval());

    loop {
        link.maintain(Instant::now())?;

        for listener in listeners.iter_mut() {
            session.drain(listener);
        }

        match session.tick(link.sink()) {
            Ok(TickOutcome::Reported(reports)) => {
                println!("Waiting for headsets...");
                for report in reports {
                    println!("{}", report);
                }
            }
            Ok(_) => {}
            Err(e) => link.close(&e),
        }

        spin_sleep::sleep(config.poll_interval());
    }
}
