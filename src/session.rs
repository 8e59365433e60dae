//! The two-player session. Every polling cycle the session looks at both
//! headsets and decides between two things:
//!
//! 1. At least one headset isn't sitting right yet, so report any change in
//!    contact quality and keep the actuator quiet.
//! 2. Both headsets are good, so stream band power to the actuator, at most
//!    once per write interval.
//!
//! The state is recomputed from the players on every tick, there is nothing
//! latched between cycles.

use crate::headset_event::HeadsetEvent;
use crate::headset_source::HeadsetSource;
use crate::player::{index_of, Player, PlayerId};
use crate::sensor_quality::{Grade, NUM_SENSORS};
use crate::sink::ByteSink;

use log::{debug, info, trace};
use std::{
    fmt::Display,
    io,
    time::{Duration, Instant},
};

/// First byte of every frame, so the firmware can find frame boundaries.
pub const FRAME_MARKER: u8 = b'|';

/// Marker plus two bytes per player.
pub const FRAME_LEN: usize = 5;

/// Minimum spacing between frames unless configured otherwise.
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_millis(50);

/// Whether frames are flowing yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for both players to put their headsets on properly
    Calibrating,
    /// Both headsets are good and frames are going out
    Streaming,
}

/// One frame as it goes over the wire: `| p1A p1B p2A p2B`.
pub type Frame = [u8; FRAME_LEN];

/// A snapshot of one player's contact quality, for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Whose headset this is
    pub player: PlayerId,
    /// Left ear, left front, right front, right ear
    pub grades: [Grade; NUM_SENSORS],
    /// Shown only when it's false
    pub touching_forehead: bool,
}

impl Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Player {} sensor status (left ear, left front, right front, right ear):",
            self.player
        )?;
        let [le, lf, rf, re] = self.grades;
        write!(f, "{le} {lf} {rf} {re}")?;
        if !self.touching_forehead {
            write!(f, " (not touching forehead)")?;
        }
        Ok(())
    }
}

/// What a single call to [`Session::tick`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Calibrating, and nothing changed since the last report
    Waiting,
    /// Calibrating, and these players' contact quality changed
    Reported(Vec<StatusReport>),
    /// Streaming, but there's no open link to write to
    SinkUnavailable,
    /// Streaming, but the last frame went out too recently
    Throttled,
    /// Streaming, and this frame was written and flushed
    Wrote(Frame),
}

/// Owns both players and decides, once per cycle, what to do with them.
#[derive(Debug)]
pub struct Session {
    players: [Player; 2],
    state: SessionState,
    min_write_interval: Duration,
    last_write: Option<Instant>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Two fresh players, calibrating, frames at most every 50 ms.
    pub fn new() -> Self {
        Self::with_write_interval(DEFAULT_WRITE_INTERVAL)
    }

    /// Like [`Session::new`] with a different minimum frame spacing.
    pub fn with_write_interval(min_write_interval: Duration) -> Self {
        Self {
            players: [Player::new(PlayerId::One), Player::new(PlayerId::Two)],
            state: SessionState::Calibrating,
            min_write_interval,
            last_write: None,
        }
    }

    /// The state as of the last [`Session::tick`].
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[allow(missing_docs)]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[index_of(id)]
    }

    #[allow(missing_docs)]
    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[index_of(id)]
    }

    /// Routes an inbound headset event to the player it came from.
    pub fn apply(&mut self, id: PlayerId, event: HeadsetEvent) {
        trace!("Player {id} : {event:?}");
        let player = self.player_mut(id);
        match event {
            HeadsetEvent::ContactQuality(codes) => player.quality.update_contact_readings(codes),
            HeadsetEvent::ForeheadContact(touching) => {
                player.quality.update_forehead_contact(touching)
            }
            HeadsetEvent::BandA(sample) => player.signal.set_band_a(sample),
            HeadsetEvent::BandB(sample) => player.signal.set_band_b(sample),
        }
    }

    /// Applies everything `source` has ready, returning how many events that
    /// was. Doesn't block.
    pub fn drain<S: HeadsetSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let id = source.player();
        let mut count = 0;
        while let Some(event) = source.next() {
            self.apply(id, event);
            count += 1;
        }
        count
    }

    /// Encodes the current band power of both players into a frame.
    pub fn frame(&self) -> Frame {
        let [p1, p2] = &self.players;
        [
            FRAME_MARKER,
            p1.signal.encode_band_a(),
            p1.signal.encode_band_b(),
            p2.signal.encode_band_a(),
            p2.signal.encode_band_b(),
        ]
    }

    fn compute_state(&self) -> SessionState {
        if self.players.iter().all(|p| p.quality.is_ready()) {
            SessionState::Streaming
        } else {
            SessionState::Calibrating
        }
    }

    /// Runs one polling cycle against the current time.
    pub fn tick(&mut self, sink: Option<&mut dyn ByteSink>) -> io::Result<TickOutcome> {
        self.tick_at(Instant::now(), sink)
    }

    /// Runs one polling cycle as if it were `now`.
    ///
    /// Errors only come from writing or flushing the sink. In that case the
    /// frame is considered not sent, and the next cycle will try again as soon
    /// as the link is back.
    pub fn tick_at(
        &mut self,
        now: Instant,
        sink: Option<&mut dyn ByteSink>,
    ) -> io::Result<TickOutcome> {
        let state = self.compute_state();
        if state != self.state {
            info!("Session : {:?} -> {:?}", self.state, state);
            self.state = state;
        }

        match state {
            SessionState::Calibrating => Ok(self.report_changes()),
            SessionState::Streaming => self.stream(now, sink),
        }
    }

    /// Only players whose own contact quality changed get reported.
    fn report_changes(&mut self) -> TickOutcome {
        let reports: Vec<StatusReport> = self
            .players
            .iter_mut()
            .filter(|p| p.quality.has_changed())
            .map(|p| {
                let id = p.id();
                p.quality.consume_change_report(id)
            })
            .collect();

        if reports.is_empty() {
            TickOutcome::Waiting
        } else {
            TickOutcome::Reported(reports)
        }
    }

    fn stream(&mut self, now: Instant, sink: Option<&mut dyn ByteSink>) -> io::Result<TickOutcome> {
        let sink = match sink {
            Some(sink) if sink.is_open_for_writing() => sink,
            _ => return Ok(TickOutcome::SinkUnavailable),
        };

        if let Some(last) = self.last_write {
            if now.saturating_duration_since(last) < self.min_write_interval {
                return Ok(TickOutcome::Throttled);
            }
        }

        let frame = self.frame();
        sink.write_all(&frame)?;
        sink.flush()?;
        self.last_write = Some(now);

        debug!("Session : wrote {frame:?}");
        Ok(TickOutcome::Wrote(frame))
    }
}
