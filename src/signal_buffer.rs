//! Holds the latest band-power samples for a player and squeezes each one
//! down into the single byte the actuator firmware expects.

/// Channels per band-power sample, one per electrode.
pub const NUM_CHANNELS: usize = 4;

/// One band-power sample across all channels.
pub type Sample = [f32; NUM_CHANNELS];

/// Encodes a sample as `floor(mean * 255)`.
///
/// The arithmetic is done in `f64` and truncated toward zero, matching the
/// firmware. Anything that can't be represented in one byte (NaN, infinities,
/// negative or oversized means) is sent as 0.
pub fn encode_band(sample: &Sample) -> u8 {
    let sum: f64 = sample.iter().map(|&v| v as f64).sum();
    let scaled = (sum / NUM_CHANNELS as f64 * 255.0).trunc();

    if scaled.is_finite() && (0.0..=255.0).contains(&scaled) {
        scaled as u8
    } else {
        0
    }
}

/// The two most recent band-power samples for one headset. Band A and band B
/// are alpha and beta with the default paths.
#[derive(Debug, Clone, Default)]
pub struct SignalBuffer {
    band_a: Sample,
    band_b: Sample,
}

impl SignalBuffer {
    /// Both bands start at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole band A sample.
    pub fn set_band_a(&mut self, sample: Sample) {
        self.band_a = sample;
    }

    /// Replaces the whole band B sample.
    pub fn set_band_b(&mut self, sample: Sample) {
        self.band_b = sample;
    }

    #[allow(missing_docs)]
    pub fn band_a(&self) -> Sample {
        self.band_a
    }

    #[allow(missing_docs)]
    pub fn band_b(&self) -> Sample {
        self.band_b
    }

    /// Band A as its wire byte, see [`encode_band`].
    pub fn encode_band_a(&self) -> u8 {
        encode_band(&self.band_a)
    }

    /// Band B as its wire byte, see [`encode_band`].
    pub fn encode_band_b(&self) -> u8 {
        encode_band(&self.band_b)
    }
}
