// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `vis` module provides the Vertical Interval Signalling header: the code-to-mode lookup
//! tables, parity helpers, and the timed tone generator used by the transmit core.
//!
//! A VIS header carries one byte: seven mode-identification bits transmitted LSB first,
//! followed by an even-parity bit. The reserved value `0x23` announces that a second byte
//! follows, addressing the extended mode namespace. The two bytes of an extended header are
//! transmitted back to back with no intervening stop bit and a single trailing stop bit.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use smallvec::SmallVec;

use crate::modes::Mode;

/// Leader tone in Hz.
pub const LEADER_HZ: f64 = 1900.0;
/// Break, start-bit, and stop-bit tone in Hz.
pub const SYNC_HZ: f64 = 1200.0;
/// Mark tone (bit value 1) in Hz.
pub const MARK_HZ: f64 = 1080.0;
/// Space tone (bit value 0) in Hz.
pub const SPACE_HZ: f64 = 1320.0;

/// Leader duration in milliseconds.
pub const LEADER_MS: f64 = 300.0;
/// Break duration in milliseconds.
pub const BREAK_MS: f64 = 10.0;
/// Bit-cell duration in milliseconds, shared by the start, data, parity, and stop bits.
pub const BIT_MS: f64 = 30.0;

/// The reserved 8-bit value announcing a 16-bit extended VIS.
pub const EXTENDED_SENTINEL: u8 = 0x23;

/// Parity of the seven data bits of a VIS byte.
pub fn data_parity(code: u8) -> u8 {
    ((code & 0x7f).count_ones() & 1) as u8
}

/// Check that the parity bit of a received VIS byte matches its data bits.
pub fn parity_ok(code: u8) -> bool {
    data_parity(code) == (code >> 7)
}

// Entries are written as the canonical transmitted byte but keyed on the seven data bits;
// modes are identified by the data pattern alone.
macro_rules! vis_map {
    ($(($code:expr, $mode:ident)),+ $(,)?) => {{
        let mut map = HashMap::new();
        $(map.insert($code & 0x7f, Mode::$mode);)+
        map
    }};
}

static STANDARD_VIS: Lazy<HashMap<u8, Mode>> = Lazy::new(|| {
    vis_map![
        (0x84, Robot24),
        (0x88, Robot36),
        (0x0c, Robot72),
        (0x44, Avt90),
        (0x3c, Scottie1),
        (0xb8, Scottie2),
        (0xcc, ScottieDx),
        (0xac, Martin1),
        (0x28, Martin2),
        (0xb7, Sc2180),
        (0x3f, Sc2120),
        (0xbb, Sc260),
        (0xdd, Pd50),
        (0x63, Pd90),
        (0x5f, Pd120),
        (0xe2, Pd160),
        (0x60, Pd180),
        (0xe1, Pd240),
        (0xde, Pd290),
        (0x71, P3),
        (0x72, P5),
        (0xf3, P7),
        (0x82, Bw8),
        (0x86, Bw12),
    ]
});

// Codes received after the 0x23 sentinel. Some values collide with the standard table (0x86 is
// both B/W 12 and ML240) and are disambiguated purely by the preceding sentinel.
static EXTENDED_VIS: Lazy<HashMap<u8, Mode>> = Lazy::new(|| {
    vis_map![
        (0x45, Mr73),
        (0x46, Mr90),
        (0x49, Mr115),
        (0x4a, Mr140),
        (0x4c, Mr175),
        (0x25, Mp73),
        (0x29, Mp115),
        (0x2a, Mp140),
        (0x2c, Mp175),
        (0x85, Ml180),
        (0x86, Ml240),
        (0x89, Ml280),
        (0x8a, Ml320),
        (0x73, Mn73),
        (0x6e, Mn110),
        (0x8c, Mn140),
        (0x6a, Mc110),
        (0x8d, Mc140),
        (0x8e, Mc180),
    ]
});

/// Resolve a received VIS byte to a mode. Only the seven data bits participate in the match;
/// parity is checked separately by the caller and never causes a rejection.
///
/// `extended` selects the namespace reached through the `0x23` sentinel. In the standard
/// namespace the sentinel itself never resolves; callers must switch namespaces and collect a
/// second byte instead.
pub fn lookup_mode(code: u8, extended: bool) -> Option<Mode> {
    let data = code & 0x7f;
    if extended {
        EXTENDED_VIS.get(&data).copied()
    }
    else if data == EXTENDED_SENTINEL {
        None
    }
    else {
        STANDARD_VIS.get(&data).copied()
    }
}

/// One scheduled header tone.
type Tone = (f64, usize);

/// A timed generator for one VIS header.
///
/// `VisEncoder` exposes a pull interface: [`next_frequency`](VisEncoder::next_frequency)
/// returns the tone for the current sample and advances the internal schedule; once the header
/// is exhausted it returns the `0.0` sentinel forever.
#[derive(Clone, Debug)]
pub struct VisEncoder {
    schedule: SmallVec<[Tone; 21]>,
    position: usize,
    remaining: usize,
    total_samples: usize,
}

impl VisEncoder {
    /// Schedule a standard 8-bit header. The full byte is transmitted LSB first; callers are
    /// expected to pass a registry code with the parity bit already embedded in bit 7.
    pub fn new(code: u8, sample_rate: f64) -> VisEncoder {
        let mut schedule = SmallVec::new();
        push_preface(&mut schedule, sample_rate);
        push_byte(&mut schedule, code, sample_rate);
        push_tone(&mut schedule, SYNC_HZ, BIT_MS, sample_rate);
        VisEncoder::from_schedule(schedule)
    }

    /// Schedule a 16-bit extended header: the low byte (the `0x23` sentinel), then the high
    /// byte, back to back, with one trailing stop bit.
    pub fn new_extended(word: u16, sample_rate: f64) -> VisEncoder {
        let mut schedule = SmallVec::new();
        push_preface(&mut schedule, sample_rate);
        push_byte(&mut schedule, (word & 0xff) as u8, sample_rate);
        push_byte(&mut schedule, (word >> 8) as u8, sample_rate);
        push_tone(&mut schedule, SYNC_HZ, BIT_MS, sample_rate);
        VisEncoder::from_schedule(schedule)
    }

    fn from_schedule(schedule: SmallVec<[Tone; 21]>) -> VisEncoder {
        let total_samples = schedule.iter().map(|tone| tone.1).sum();
        let remaining = schedule.first().map(|tone| tone.1).unwrap_or(0);
        VisEncoder { schedule, position: 0, remaining, total_samples }
    }

    /// The tone frequency for the current sample, or `0.0` once the header is complete.
    /// Advances the schedule by one sample.
    pub fn next_frequency(&mut self) -> f64 {
        while self.remaining == 0 {
            if self.position + 1 >= self.schedule.len() {
                self.position = self.schedule.len();
                return 0.0;
            }
            self.position += 1;
            self.remaining = self.schedule[self.position].1;
        }

        self.remaining -= 1;
        self.schedule[self.position].0
    }

    /// True once every scheduled sample has been pulled.
    pub fn is_complete(&self) -> bool {
        self.position >= self.schedule.len()
            || (self.position + 1 == self.schedule.len() && self.remaining == 0)
    }

    /// Total number of samples in the header.
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }
}

fn push_tone(schedule: &mut SmallVec<[Tone; 21]>, freq: f64, ms: f64, sample_rate: f64) {
    schedule.push((freq, (ms * sample_rate / 1000.0) as usize));
}

// Leader, break, leader, start bit.
fn push_preface(schedule: &mut SmallVec<[Tone; 21]>, sample_rate: f64) {
    push_tone(schedule, LEADER_HZ, LEADER_MS, sample_rate);
    push_tone(schedule, SYNC_HZ, BREAK_MS, sample_rate);
    push_tone(schedule, LEADER_HZ, LEADER_MS, sample_rate);
    push_tone(schedule, SYNC_HZ, BIT_MS, sample_rate);
}

fn push_byte(schedule: &mut SmallVec<[Tone; 21]>, code: u8, sample_rate: f64) {
    for bit in 0..8 {
        let freq = if code & (1 << bit) != 0 { MARK_HZ } else { SPACE_HZ };
        push_tone(schedule, freq, BIT_MS, sample_rate);
    }
}
