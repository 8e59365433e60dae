//! BrainBridge connects two EEG headsets to the actuator of a two-player
//! biofeedback installation.
//!
//! Each headset streams OSC over UDP: how well each of its four electrodes
//! touches the skin, and band-power readings. Nothing goes to the actuator
//! until both players are wearing their headsets properly. After that, both
//! players' band power goes out over a serial link to an Arduino as a small
//! 5-byte frame, at most once every 50 ms by default.
//!
//! The pieces, roughly bottom up:
//!
//! * [`sensor_quality`] and [`signal_buffer`] hold one headset's state,
//!   and [`player`] groups them.
//! * [`session`] is the state machine that decides, every polling cycle,
//!   whether to report calibration status or send a frame.
//! * [`osc_decoder`], [`headset_event`] and [`headset_source`] turn UDP
//!   datagrams into events for a player.
//! * [`sink`] and [`link`] are the outbound side: the serial port and its
//!   reconnect logic.
//! * [`dummy_headset`] fakes a headset so the whole thing can run on a
//!   laptop with nothing plugged in.

#![warn(missing_docs)]
pub mod args;
pub mod config;
pub mod dummy_headset;
pub mod error;
pub mod headset_event;
pub mod headset_source;
pub mod link;
pub mod osc_decoder;
pub mod player;
pub mod sensor_quality;
pub mod session;
pub mod signal_buffer;
pub mod sink;
