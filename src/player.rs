//! A player is just one headset's worth of state.

use crate::sensor_quality::SensorQuality;
use crate::signal_buffer::SignalBuffer;
use std::fmt::Display;

/// Which of the two seats a headset belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// Both players, in the order their bytes go on the wire.
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// The 1-based number shown to humans and used by the protocol layer.
    pub fn number(self) -> usize {
        match self {
            PlayerId::One => 1,
            PlayerId::Two => 2,
        }
    }
}

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Everything the bridge knows about one headset.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    /// Contact grades and the change flag driving the status reports.
    pub quality: SensorQuality,
    /// Latest band powers, sent on once streaming.
    pub signal: SignalBuffer,
}

impl Player {
    /// A player with every sensor `Bad` and both bands at zero.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            quality: SensorQuality::new(),
            signal: SignalBuffer::new(),
        }
    }

    /// Which seat this player is in.
    pub fn id(&self) -> PlayerId {
        self.id
    }
}

/// Index into a fixed pair of players.
pub(crate) fn index_of(id: PlayerId) -> usize {
    id.number() - 1
}
