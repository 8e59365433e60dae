//! Per-player electrode contact model. The headset reports a quality code for
//! each of its four electrodes (the "horseshoe") plus whether the band is
//! touching the forehead. A player is ready once every electrode reads
//! [`Grade::Good`].

use crate::player::PlayerId;
use crate::session::StatusReport;
use std::fmt::Display;

/// Number of electrodes on a headset.
pub const NUM_SENSORS: usize = 4;

/// The quality of a single electrode's skin contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Grade {
    Good,
    Ok,
    Bad,
}

impl Grade {
    /// Maps the headset's integer quality code onto a [`Grade`]. Anything the
    /// headset might send besides 1 or 2 (including 3, "no contact") is bad.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Grade::Good,
            2 => Grade::Ok,
            _ => Grade::Bad,
        }
    }
}

impl Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::Good => "good",
            Grade::Ok => "ok",
            Grade::Bad => "bad",
        };
        f.pad(s)
    }
}

/// Contact quality for one headset.
///
/// Slots are ordered left ear, left front, right front, right ear, which is
/// the order the headset sends them in.
#[derive(Debug, Clone)]
pub struct SensorQuality {
    grades: [Grade; NUM_SENSORS],
    touching_forehead: bool,
    changed: bool,
}

impl Default for SensorQuality {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorQuality {
    /// Every electrode starts out bad, and the change flag starts raised so
    /// that the first status report always goes out.
    pub fn new() -> Self {
        Self {
            grades: [Grade::Bad; NUM_SENSORS],
            touching_forehead: false,
            changed: true,
        }
    }

    /// Takes a fresh set of quality codes from the headset. Each slot is only
    /// ever compared against its own previous grade.
    pub fn update_contact_readings(&mut self, codes: [i32; NUM_SENSORS]) {
        for (slot, code) in self.grades.iter_mut().zip(codes) {
            let grade = Grade::from_code(code);
            if grade != *slot {
                *slot = grade;
                self.changed = true;
            }
        }
    }

    /// Forehead contact is informational, it neither raises the change flag
    /// nor counts towards readiness.
    pub fn update_forehead_contact(&mut self, touching: bool) {
        self.touching_forehead = touching;
    }

    /// True once all four electrodes read good.
    pub fn is_ready(&self) -> bool {
        self.grades.iter().all(|&g| g == Grade::Good)
    }

    /// Whether any grade moved since the last report.
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Current grades, in slot order.
    pub fn grades(&self) -> [Grade; NUM_SENSORS] {
        self.grades
    }

    /// The last forehead flag the headset sent.
    pub fn touching_forehead(&self) -> bool {
        self.touching_forehead
    }

    /// Snapshots the current grades for display and lowers the change flag.
    /// This is the only place the flag is ever cleared.
    pub fn consume_change_report(&mut self, player: PlayerId) -> StatusReport {
        self.changed = false;
        StatusReport {
            player,
            grades: self.grades,
            touching_forehead: self.touching_forehead,
        }
    }
}
