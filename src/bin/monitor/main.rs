//! Runs a session against two fake headsets, with frames going to the log
//! instead of a serial port. Handy for checking the calibration flow and
//! frame timing without any hardware.

use brainbridge::{
    args::MonitorArgs,
    config::Config,
    dummy_headset::DummyHeadset,
    error::BridgeError,
    player::PlayerId,
    session::{Session, TickOutcome},
    sink::LogSink,
};
use clap::Parser;
use log::{error, info};
use std::process;

fn main() {
    env_logger::init();
    let args = MonitorArgs::parse();

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: MonitorArgs) -> Result<(), BridgeError> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(ms) = args.write_interval_ms {
        config.write_interval_ms = ms;
    }

    let mut headsets = PlayerId::ALL.map(|player| {
        let builder = DummyHeadset::builder(player).settle_polls(args.settle_polls);
        match args.seed {
            // Different seeds so the two players don't mirror each other
            Some(seed) => builder.seed(seed.wrapping_add(player.number() as u64)).build(),
            None => builder.build(),
        }
    });

    let mut session = Session::with_write_interval(config.write_interval());
    let mut sink = LogSink::new();

    loop {
        for headset in headsets.iter_mut() {
            session.drain(headset);
        }

        match session.tick(Some(&mut sink))? {
            TickOutcome::Reported(reports) => {
                println!("Waiting for headsets...");
                for report in reports {
                    println!("{}", report);
                }
            }
            TickOutcome::Wrote(frame) => info!("Frame {:?}", frame),
            _ => {}
        }

        spin_sleep::sleep(config.poll_interval());
    }
}
