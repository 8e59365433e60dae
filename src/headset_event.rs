//! Typed events pulled out of the headset's OSC stream. Only four addresses
//! matter to the installation; everything else the headset sends is
//! ignored.

use crate::config::OscPaths;
use crate::osc_decoder::{OscArg, OscMessage};
use crate::sensor_quality::NUM_SENSORS;
use crate::signal_buffer::{Sample, NUM_CHANNELS};

/// One reading from a headset, already reduced to what the session needs.
#[derive(Debug, Clone, PartialEq)]
pub enum HeadsetEvent {
    /// Quality codes for the four electrodes
    ContactQuality([i32; NUM_SENSORS]),
    /// Whether the band sits on the forehead
    ForeheadContact(bool),
    /// A new band A sample
    BandA(Sample),
    /// A new band B sample
    BandB(Sample),
}

/// Quality codes arrive as floats from some senders. Anything that isn't a
/// whole number can't be a valid code, so it's mapped to 0 (bad).
fn arg_to_code(arg: &OscArg) -> i32 {
    match arg.as_f64() {
        Some(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => v as i32,
        _ => 0,
    }
}

fn arg_to_sample_value(arg: &OscArg) -> f32 {
    arg.as_f64().map_or(f32::NAN, |v| v as f32)
}

/// Converts the first `N` arguments, ignoring any extras.
fn first_n<T: Default + Copy, const N: usize>(
    args: &[OscArg],
    f: fn(&OscArg) -> T,
) -> Option<[T; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [T::default(); N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = f(arg);
    }
    Some(out)
}

impl HeadsetEvent {
    /// Interprets a decoded message. Returns `None` for addresses we don't
    /// listen to and for messages with too few arguments.
    pub fn from_message(msg: &OscMessage, paths: &OscPaths) -> Option<Self> {
        let addr = msg.address.as_str();

        if addr == paths.horseshoe {
            first_n::<i32, NUM_SENSORS>(&msg.args, arg_to_code).map(HeadsetEvent::ContactQuality)
        } else if addr == paths.touching_forehead {
            msg.args
                .first()
                .map(|arg| HeadsetEvent::ForeheadContact(arg.as_f64().is_some_and(|v| v != 0.0)))
        } else if addr == paths.band_a {
            first_n::<f32, NUM_CHANNELS>(&msg.args, arg_to_sample_value).map(HeadsetEvent::BandA)
        } else if addr == paths.band_b {
            first_n::<f32, NUM_CHANNELS>(&msg.args, arg_to_sample_value).map(HeadsetEvent::BandB)
        } else {
            None
        }
    }
}
