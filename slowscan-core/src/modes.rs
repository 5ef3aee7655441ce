// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `modes` module provides the static registry of SSTV transmission modes and the per-mode
//! scanline timing derived from it.
//!
//! The declaration order of [`Mode`] is stable and part of the public interface: persisted
//! images may reference a mode by index.

use crate::errors::{config_error, Result};

/// Total number of registered modes.
pub const MODE_COUNT: usize = 43;

/// A `Mode` identifies one standardized SSTV transmission mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Robot36,
    Robot72,
    Avt90,
    Scottie1,
    Scottie2,
    ScottieDx,
    Martin1,
    Martin2,
    Sc2180,
    Sc2120,
    Sc260,
    Pd50,
    Pd90,
    Pd120,
    Pd160,
    Pd180,
    Pd240,
    Pd290,
    P3,
    P5,
    P7,
    Mr73,
    Mr90,
    Mr115,
    Mr140,
    Mr175,
    Mp73,
    Mp115,
    Mp140,
    Mp175,
    Ml180,
    Ml240,
    Ml280,
    Ml320,
    Robot24,
    Bw8,
    Bw12,
    Mn73,
    Mn110,
    Mn140,
    Mc110,
    Mc140,
    Mc180,
}

/// A `ModeDescriptor` stores the build-time facts about one mode: display name, picture
/// geometry, VIS identification, and nominal duration.
#[derive(Copy, Clone, Debug)]
pub struct ModeDescriptor {
    /// The mode this descriptor describes.
    pub mode: Mode,
    /// Human-readable display name, e.g. "Scottie 1".
    pub name: &'static str,
    /// Picture width in pixels.
    pub width: u32,
    /// Picture height in pixels.
    pub height: u32,
    /// The 8-bit VIS code (data and parity). 0 means the mode has no defined VIS and can only
    /// be received with a mode hint.
    pub vis_code: u8,
    /// Nominal duration of the picture portion of a transmission in seconds.
    pub duration_secs: f64,
    /// True for color modes, false for black-and-white.
    pub color: bool,
}

macro_rules! mode {
    ($mode:ident, $name:expr, $w:expr, $h:expr, $vis:expr, $dur:expr, $color:expr) => {
        ModeDescriptor {
            mode: Mode::$mode,
            name: $name,
            width: $w,
            height: $h,
            vis_code: $vis,
            duration_secs: $dur,
            color: $color,
        }
    };
}

/// The mode registry. Declaration order is the index order and must never change.
#[rustfmt::skip]
static MODES: [ModeDescriptor; MODE_COUNT] = [
    mode!(Robot36,   "Robot 36",  320, 240, 0x88, 36.0,    true),
    mode!(Robot72,   "Robot 72",  320, 240, 0x0c, 72.0,    true),
    mode!(Avt90,     "AVT 90",    320, 240, 0x44, 90.0,    true),
    mode!(Scottie1,  "Scottie 1", 320, 256, 0x3c, 109.624, true),
    mode!(Scottie2,  "Scottie 2", 320, 256, 0xb8, 71.089,  true),
    mode!(ScottieDx, "ScottieDX", 320, 256, 0xcc, 268.877, true),
    mode!(Martin1,   "Martin 1",  320, 256, 0xac, 114.290, true),
    mode!(Martin2,   "Martin 2",  320, 256, 0x28, 58.060,  true),
    mode!(Sc2180,    "SC2 180",   320, 256, 0xb7, 182.027, true),
    mode!(Sc2120,    "SC2 120",   320, 256, 0x3f, 121.734, true),
    mode!(Sc260,     "SC2 60",    320, 256, 0xbb, 61.539,  true),
    mode!(Pd50,      "PD50",      320, 256, 0xdd, 49.684,  true),
    mode!(Pd90,      "PD90",      320, 256, 0x63, 89.989,  true),
    mode!(Pd120,     "PD120",     640, 496, 0x5f, 126.103, true),
    mode!(Pd160,     "PD160",     512, 400, 0xe2, 160.883, true),
    mode!(Pd180,     "PD180",     640, 496, 0x60, 187.051, true),
    mode!(Pd240,     "PD240",     640, 496, 0xe1, 248.000, true),
    mode!(Pd290,     "PD290",     800, 616, 0xde, 288.682, true),
    mode!(P3,        "P3",        640, 496, 0x71, 203.050, true),
    mode!(P5,        "P5",        640, 496, 0x72, 304.575, true),
    mode!(P7,        "P7",        640, 496, 0xf3, 406.100, true),
    mode!(Mr73,      "MR73",      320, 256, 0x45, 73.293,  true),
    mode!(Mr90,      "MR90",      320, 256, 0x46, 90.189,  true),
    mode!(Mr115,     "MR115",     320, 256, 0x49, 115.277, true),
    mode!(Mr140,     "MR140",     320, 256, 0x4a, 140.365, true),
    mode!(Mr175,     "MR175",     320, 256, 0x4c, 175.181, true),
    mode!(Mp73,      "MP73",      320, 256, 0x25, 72.960,  true),
    mode!(Mp115,     "MP115",     320, 256, 0x29, 115.456, true),
    mode!(Mp140,     "MP140",     320, 256, 0x2a, 139.520, true),
    mode!(Mp175,     "MP175",     320, 256, 0x2c, 175.360, true),
    mode!(Ml180,     "ML180",     640, 496, 0x85, 180.197, true),
    mode!(Ml240,     "ML240",     640, 496, 0x86, 239.717, true),
    mode!(Ml280,     "ML280",     640, 496, 0x89, 280.389, true),
    mode!(Ml320,     "ML320",     640, 496, 0x8a, 320.069, true),
    mode!(Robot24,   "Robot 24",  320, 240, 0x84, 24.000,  true),
    mode!(Bw8,       "B/W 8",     320, 240, 0x82, 8.028,   false),
    mode!(Bw12,      "B/W 12",    320, 240, 0x86, 12.000,  false),
    mode!(Mn73,      "MP73-N",    320, 256, 0x00, 72.960,  true),
    mode!(Mn110,     "MP110-N",   320, 256, 0x00, 109.824, true),
    mode!(Mn140,     "MP140-N",   320, 256, 0x00, 139.520, true),
    mode!(Mc110,     "MC110-N",   320, 256, 0x00, 109.696, true),
    mode!(Mc140,     "MC140-N",   320, 256, 0x00, 140.416, true),
    mode!(Mc180,     "MC180-N",   320, 256, 0x00, 180.352, true),
];

/// Get the descriptor for a mode.
pub fn descriptor(mode: Mode) -> &'static ModeDescriptor {
    &MODES[mode as usize]
}

/// Get the full registry in index order.
pub fn all_modes() -> &'static [ModeDescriptor] {
    &MODES
}

/// Find a mode by its display name, case-insensitively.
pub fn find_mode_by_name(name: &str) -> Result<Mode> {
    for desc in MODES.iter() {
        if desc.name.eq_ignore_ascii_case(name) {
            return Ok(desc.mode);
        }
    }
    config_error("modes: unknown mode name")
}

/// Get the picture geometry of a mode as `(width, height)`.
pub fn dimensions(mode: Mode) -> (u32, u32) {
    let desc = descriptor(mode);
    (desc.width, desc.height)
}

impl Mode {
    /// Get a mode by its registry index.
    pub fn from_index(index: usize) -> Option<Mode> {
        MODES.get(index).map(|desc| desc.mode)
    }

    /// The registry index of this mode.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The descriptor for this mode.
    pub fn descriptor(&self) -> &'static ModeDescriptor {
        descriptor(*self)
    }

    /// True if the mode uses the narrow 1900-2300 Hz deviation.
    pub fn is_narrow(&self) -> bool {
        matches!(
            *self,
            Mode::Mn73 | Mode::Mn110 | Mode::Mn140 | Mode::Mc110 | Mode::Mc140 | Mode::Mc180
        )
    }

    /// The 16-bit extended VIS word for this mode, or 0 if the mode uses a plain 8-bit VIS.
    ///
    /// The low byte is always the `0x23` extension sentinel; the high byte carries the mode
    /// code looked up in the extended table.
    pub fn extended_vis_word(&self) -> u16 {
        match *self {
            Mode::Mp73 => 0x2523,
            Mode::Mp115 => 0x2923,
            Mode::Mp140 => 0x2a23,
            Mode::Mp175 => 0x2c23,
            Mode::Mr73 => 0x4523,
            Mode::Mr90 => 0x4623,
            Mode::Mr115 => 0x4923,
            Mode::Mr140 => 0x4a23,
            Mode::Mr175 => 0x4c23,
            Mode::Ml180 => 0x8523,
            Mode::Ml240 => 0x8623,
            Mode::Ml280 => 0x8923,
            Mode::Ml320 => 0x8a23,
            _ => 0x0000,
        }
    }
}

/// The scanline shape family a mode belongs to. The family selects the transmit line writer
/// and gives meaning to the timing fields of [`ModeTiming`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScanFamily {
    /// Robot 24: sync, porch, Y, then R-Y and B-Y halves with polarity markers. Two image
    /// rows per timed line.
    Robot24,
    /// Robot 36: sync, porch, Y, then R-Y on even lines and B-Y on odd lines.
    Robot36,
    /// Robot 72: sync, porch, Y, then both chroma halves every line.
    Robot72,
    /// AVT 90: bare R, G, and B runs with no sync pulse.
    Avt,
    /// Scottie: separator-G-separator-B-sync-separator-R, with a single leading sync pulse
    /// before the first line.
    Scottie,
    /// Martin: sync, then separator-delimited G, B, and R runs with a trailing separator.
    Martin,
    /// SC2: sync, porch, then back-to-back R, G, and B runs.
    Sc2,
    /// PD: long sync, porch, then Y1, R-Y, B-Y, Y2 covering two image rows.
    Pd,
    /// Pasokon: sync, then porch-delimited R, G, and B runs with a trailing porch.
    Pasokon,
    /// MR / ML: sync, porch, full-width Y, then half-width R-Y and B-Y with settling tones.
    MartinR,
    /// MP: sync, porch, then Y1, R-Y, B-Y, Y2 covering two image rows.
    MartinP,
    /// MP-N: the MP shape with narrow sync/porch tones and narrow pixel mapping.
    NarrowYc,
    /// MC-N: narrow sync and porch, then narrow-mapped R, G, and B runs.
    NarrowRgb,
    /// B/W: sync, porch, and a single luminance run averaged over two image rows.
    Bw,
}

/// Scanline timing for one mode. All durations are in milliseconds; sample counts are derived
/// by the transmit scheduler at its configured sample rate.
#[derive(Copy, Clone, Debug)]
pub struct ModeTiming {
    /// The scanline shape family.
    pub family: ScanFamily,
    /// Number of timed scanlines per picture.
    pub line_count: u32,
    /// Nominal duration of one timed scanline.
    pub line_ms: f64,
    /// Sync pulse duration.
    pub sync_ms: f64,
    /// Porch duration following the sync pulse.
    pub porch_ms: f64,
    /// Duration of one full-width channel run (the luminance run for YC families).
    pub channel_ms: f64,
    /// Duration of one chroma run for the Robot families.
    pub chroma_ms: f64,
    /// Channel separator duration (Scottie/Martin separators, Robot polarity markers).
    pub separator_ms: f64,
    /// Settling tone duration between MR/ML channels.
    pub settle_ms: f64,
    /// The 16-bit extended VIS word, or 0 when the mode transmits a plain 8-bit VIS.
    pub vis_word: u16,
    /// True when the mode uses the narrow frequency plan.
    pub narrow: bool,
}

impl ModeTiming {
    /// Derive the scanline timing for a mode.
    pub fn new(mode: Mode) -> ModeTiming {
        use ScanFamily::*;

        // (family, line_count, line_ms, sync, porch, channel, chroma, separator, settle)
        let t = match mode {
            Mode::Robot24 => (Robot24, 120, 200.0, 6.0, 2.0, 92.0, 46.0, 3.0, 1.0),
            Mode::Robot36 => (Robot36, 240, 150.0, 9.0, 3.0, 88.0, 44.0, 4.5, 1.5),
            Mode::Robot72 => (Robot72, 240, 300.0, 9.0, 3.0, 138.0, 69.0, 4.5, 1.5),
            Mode::Avt90 => (Avt, 240, 375.0, 0.0, 0.0, 125.0, 0.0, 0.0, 0.0),
            Mode::Scottie1 => (Scottie, 256, 428.22, 9.0, 0.0, 138.24, 0.0, 1.5, 0.0),
            Mode::Scottie2 => (Scottie, 256, 277.692, 9.0, 0.0, 88.064, 0.0, 1.5, 0.0),
            Mode::ScottieDx => (Scottie, 256, 1050.3, 9.0, 0.0, 345.6, 0.0, 1.5, 0.0),
            Mode::Martin1 => (Martin, 256, 446.446, 4.862, 0.0, 146.432, 0.0, 0.572, 0.0),
            Mode::Martin2 => (Martin, 256, 226.798, 4.862, 0.0, 73.216, 0.0, 0.572, 0.0),
            Mode::Sc2180 => (Sc2, 256, 711.0437, 5.5437, 0.5, 235.0, 0.0, 0.0, 0.0),
            Mode::Sc2120 => (Sc2, 256, 475.52248, 5.52248, 0.5, 156.5, 0.0, 0.0, 0.0),
            Mode::Sc260 => (Sc2, 256, 240.3846, 5.5006, 0.5, 78.128, 0.0, 0.0, 0.0),
            Mode::Pd50 => (Pd, 128, 388.160, 20.0, 2.080, 91.520, 0.0, 0.0, 0.0),
            Mode::Pd90 => (Pd, 128, 703.040, 20.0, 2.080, 170.240, 0.0, 0.0, 0.0),
            Mode::Pd120 => (Pd, 248, 508.480, 20.0, 2.080, 121.600, 0.0, 0.0, 0.0),
            Mode::Pd160 => (Pd, 200, 804.416, 20.0, 2.080, 195.584, 0.0, 0.0, 0.0),
            Mode::Pd180 => (Pd, 248, 754.24, 20.0, 2.080, 183.040, 0.0, 0.0, 0.0),
            Mode::Pd240 => (Pd, 248, 1000.00, 20.0, 2.080, 244.480, 0.0, 0.0, 0.0),
            Mode::Pd290 => (Pd, 308, 937.28, 20.0, 2.080, 228.800, 0.0, 0.0, 0.0),
            Mode::P3 => (Pasokon, 496, 409.375, 5.208, 1.042, 133.333, 0.0, 0.0, 0.0),
            Mode::P5 => (Pasokon, 496, 614.0625, 7.813, 1.562375, 200.000, 0.0, 0.0, 0.0),
            Mode::P7 => (Pasokon, 496, 818.75, 10.417, 2.083, 266.667, 0.0, 0.0, 0.0),
            Mode::Mr73 => (MartinR, 256, 286.3, 9.0, 1.0, 138.0, 0.0, 0.0, 0.1),
            Mode::Mr90 => (MartinR, 256, 352.3, 9.0, 1.0, 171.0, 0.0, 0.0, 0.1),
            Mode::Mr115 => (MartinR, 256, 450.3, 9.0, 1.0, 220.0, 0.0, 0.0, 0.1),
            Mode::Mr140 => (MartinR, 256, 548.3, 9.0, 1.0, 269.0, 0.0, 0.0, 0.1),
            Mode::Mr175 => (MartinR, 256, 684.3, 9.0, 1.0, 337.0, 0.0, 0.0, 0.1),
            Mode::Mp73 => (MartinP, 128, 570.0, 9.0, 1.0, 140.0, 0.0, 0.0, 0.0),
            Mode::Mp115 => (MartinP, 128, 902.0, 9.0, 1.0, 223.0, 0.0, 0.0, 0.0),
            Mode::Mp140 => (MartinP, 128, 1090.0, 9.0, 1.0, 270.0, 0.0, 0.0, 0.0),
            Mode::Mp175 => (MartinP, 128, 1370.0, 9.0, 1.0, 340.0, 0.0, 0.0, 0.0),
            Mode::Ml180 => (MartinR, 496, 363.3, 9.0, 1.0, 176.5, 0.0, 0.0, 0.1),
            Mode::Ml240 => (MartinR, 496, 483.3, 9.0, 1.0, 236.5, 0.0, 0.0, 0.1),
            Mode::Ml280 => (MartinR, 496, 565.3, 9.0, 1.0, 277.5, 0.0, 0.0, 0.1),
            Mode::Ml320 => (MartinR, 496, 645.3, 9.0, 1.0, 317.5, 0.0, 0.0, 0.1),
            Mode::Bw8 => (Bw, 120, 66.89709, 6.0, 2.0, 58.89709, 0.0, 0.0, 0.0),
            Mode::Bw12 => (Bw, 120, 100.0, 6.0, 2.0, 92.0, 0.0, 0.0, 0.0),
            Mode::Mn73 => (NarrowYc, 128, 570.0, 9.0, 1.0, 140.0, 0.0, 0.0, 0.0),
            Mode::Mn110 => (NarrowYc, 128, 858.0, 9.0, 1.0, 212.0, 0.0, 0.0, 0.0),
            Mode::Mn140 => (NarrowYc, 128, 1090.0, 9.0, 1.0, 270.0, 0.0, 0.0, 0.0),
            Mode::Mc110 => (NarrowRgb, 256, 428.5, 8.0, 0.5, 140.0, 0.0, 0.0, 0.0),
            Mode::Mc140 => (NarrowRgb, 256, 548.5, 8.0, 0.5, 180.0, 0.0, 0.0, 0.0),
            Mode::Mc180 => (NarrowRgb, 256, 704.5, 8.0, 0.5, 232.0, 0.0, 0.0, 0.0),
        };

        ModeTiming {
            family: t.0,
            line_count: t.1,
            line_ms: t.2,
            sync_ms: t.3,
            porch_ms: t.4,
            channel_ms: t.5,
            chroma_ms: t.6,
            separator_ms: t.7,
            settle_ms: t.8,
            vis_word: mode.extended_vis_word(),
            narrow: mode.is_narrow(),
        }
    }

    /// Number of image rows consumed per timed scanline.
    pub fn rows_per_line(&self) -> u32 {
        match self.family {
            ScanFamily::Robot24
            | ScanFamily::Pd
            | ScanFamily::MartinP
            | ScanFamily::NarrowYc
            | ScanFamily::Bw => 2,
            _ => 1,
        }
    }

    /// Duration of the tuning preamble for this mode: eight 100 ms tones for the standard
    /// deviation plan, four for the narrow plan.
    pub fn preamble_ms(&self) -> f64 {
        if self.narrow {
            400.0
        }
        else {
            800.0
        }
    }
}
