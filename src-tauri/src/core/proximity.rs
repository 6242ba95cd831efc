//! Signal strength to distance band.
//!
//! Banded-rank scheme: every 5 dB above -100 dBm earns one bar, plus one
//! bar for being heard at all. Fewer than 4 bars is far, fewer than 7 is
//! medium, anything else is near. In dBm: near at -70 and above, medium
//! from -71 to -85, far below -85.
//!
//! The band only colors the list; it never affects matching or ordering.

use serde::Serialize;

const FLOOR_DBM: u16 = 100;
const DB_PER_BAR: u16 = 5;
const MEDIUM_MIN_BARS: u8 = 4;
const NEAR_MIN_BARS: u8 = 7;

/// Coarse distance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Band {
    Far,
    Medium,
    Near,
}

impl Band {
    /// Display color used by the list.
    pub fn color(self) -> &'static str {
        match self {
            Self::Far => "red",
            Self::Medium => "yellow",
            Self::Near => "green",
        }
    }
}

/// Classified signal reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proximity {
    pub bars: u8,
    pub band: Band,
}

impl Proximity {
    pub fn from_rssi(rssi: i16) -> Self {
        let bars = bars_for(rssi);
        let band = if bars < MEDIUM_MIN_BARS {
            Band::Far
        } else if bars < NEAR_MIN_BARS {
            Band::Medium
        } else {
            Band::Near
        };
        Self { bars, band }
    }

    /// Bar meter as shown next to "Distance:", one `o` per bar.
    pub fn meter(&self) -> String {
        "o".repeat(usize::from(self.bars))
    }
}

fn bars_for(rssi: i16) -> u8 {
    let magnitude = rssi.unsigned_abs();
    let rank = FLOOR_DBM.saturating_sub(magnitude) / DB_PER_BAR;
    // rank is at most 20
    rank as u8 + 1
}
