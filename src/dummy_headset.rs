//! A fake headset for running the bridge without any hardware. Contact
//! quality starts out noisy and settles to all-good after a while, band power
//! is uniform noise.

use crate::headset_event::HeadsetEvent;
use crate::headset_source::HeadsetSource;
use crate::player::PlayerId;
use crate::sensor_quality::NUM_SENSORS;

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;

/// Generates one round of readings per drain. Build with
/// [`DummyHeadset::builder`].
pub struct DummyHeadset {
    player: PlayerId,
    settle_polls: u32,
    polls: u32,
    rng: StdRng,
    pending: VecDeque<HeadsetEvent>,
}

/// Settings for a [`DummyHeadset`].
pub struct DummyHeadsetBuilder {
    player: PlayerId,
    settle_polls: u32,
    seed: Option<u64>,
}

impl DummyHeadsetBuilder {
    /// How many drains it takes for every electrode to read good.
    pub fn settle_polls(mut self, settle_polls: u32) -> Self {
        self.settle_polls = settle_polls;
        self
    }

    /// Fixes the random sequence, for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Seeds the generator (from entropy unless a seed was set) and queues
    /// the first round of readings.
    pub fn build(self) -> DummyHeadset {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut headset = DummyHeadset {
            player: self.player,
            settle_polls: self.settle_polls,
            polls: 0,
            rng,
            pending: VecDeque::new(),
        };
        headset.refill();
        headset
    }
}

impl DummyHeadset {
    /// Defaults to settling after 100 drains with an unseeded generator.
    pub fn builder(player: PlayerId) -> DummyHeadsetBuilder {
        DummyHeadsetBuilder {
            player,
            settle_polls: 100,
            seed: None,
        }
    }

    /// Queues up the next round of readings. The odds of any electrode
    /// reading good rise linearly until `settle_polls`, after which it always
    /// does.
    fn refill(&mut self) {
        let p_good = if self.polls >= self.settle_polls {
            1.0
        } else {
            self.polls as f64 / self.settle_polls as f64
        };

        let mut codes = [0; NUM_SENSORS];
        for code in codes.iter_mut() {
            *code = if self.rng.gen_bool(p_good) {
                1
            } else {
                self.rng.gen_range(2..=4)
            };
        }

        let touching = self.rng.gen_bool(p_good.max(0.5));
        let band_a = [(); 4].map(|_| self.rng.gen_range(0.0..1.0));
        let band_b = [(); 4].map(|_| self.rng.gen_range(0.0..1.0));

        self.pending.extend([
            HeadsetEvent::ContactQuality(codes),
            HeadsetEvent::ForeheadContact(touching),
            HeadsetEvent::BandA(band_a),
            HeadsetEvent::BandB(band_b),
        ]);
        self.polls = self.polls.saturating_add(1);
    }
}

// Each drain yields one round of readings, then `None`. The next round is
// ready for the following drain.
impl Iterator for DummyHeadset {
    type Item = HeadsetEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.pending.pop_front();
        if event.is_none() {
            self.refill();
        }
        event
    }
}

impl HeadsetSource for DummyHeadset {
    fn player(&self) -> PlayerId {
        self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionState, TickOutcome};
    use crate::sink::MemorySink;

    #[test]
    fn test_one_round_per_drain() {
        let mut headset = DummyHeadset::builder(PlayerId::One).seed(7).build();
        let first: Vec<_> = headset.by_ref().collect();
        assert_eq!(first.len(), 4);
        assert!(matches!(first[0], HeadsetEvent::ContactQuality(_)));
        let second: Vec<_> = headset.by_ref().collect();
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn test_band_power_in_range() {
        let mut headset = DummyHeadset::builder(PlayerId::Two).seed(1).build();
        for event in headset.by_ref().take(4) {
            if let HeadsetEvent::BandA(s) | HeadsetEvent::BandB(s) = event {
                assert!(s.iter().all(|v| (0.0..1.0).contains(v)));
            }
        }
    }

    #[test]
    fn test_settles_and_starts_streaming() {
        let mut headsets = [
            DummyHeadset::builder(PlayerId::One)
                .settle_polls(10)
                .seed(3)
                .build(),
            DummyHeadset::builder(PlayerId::Two)
                .settle_polls(20)
                .seed(4)
                .build(),
        ];
        let mut session = Session::new();
        let mut sink = MemorySink::new();

        for _ in 0..25 {
            for headset in headsets.iter_mut() {
                assert_eq!(session.drain(headset), 4);
            }
            session.tick(Some(&mut sink)).unwrap();
        }

        assert_eq!(session.state(), SessionState::Streaming);
        assert!(matches!(
            session.tick(Some(&mut sink)).unwrap(),
            TickOutcome::Wrote(_) | TickOutcome::Throttled
        ));
        assert!(!sink.bytes.is_empty());
        assert_eq!(sink.bytes[0], b'|');
    }
}
