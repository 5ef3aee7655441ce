// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The sync/VIS state machine: start-bit detection, bit sampling, and mode resolution.

use log::{debug, warn};

use slowscan_core::modes::Mode;
use slowscan_core::vis::{data_parity, lookup_mode, parity_ok, EXTENDED_SENTINEL};

use crate::tones::ToneEnergies;

// Detection windows. The 12 ms guard rejects the 10 ms VIS break, which is also 1200 Hz.
const GUARD_MS: f64 = 12.0;
const VALIDATE_MS: f64 = 15.0;
const BIT_MS: f64 = 30.0;

// Secondary threshold below which mark and space are considered indistinguishable.
const SENSE_LEVEL_2: f64 = 80.0;

/// Start-bit sensitivity presets, most sensitive first.
const SENSE_LEVELS: [f64; 4] = [2400.0, 3500.0, 4800.0, 6000.0];

/// The phase of VIS acquisition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Waiting for sustained 1200 Hz.
    Idle,
    /// 12 ms of sustained 1200 Hz observed; confirming the remainder of the start bit.
    Validating,
    /// Sampling data bits at 30 ms intervals.
    Decoding,
    /// The first byte was the extension sentinel; collecting the second byte.
    ExtendedWait,
    /// A mode has been resolved and scanline data follows.
    Locked,
}

/// The start-bit detector and VIS bit sampler.
#[derive(Clone, Debug)]
pub struct SyncDetector {
    state: SyncState,
    sense_index: u8,
    sense_level: f64,

    guard_samples: u32,
    validate_samples: u32,
    bit_samples: u32,

    // Countdown within the current window.
    timer: u32,
    vis_data: u8,
    bits_remaining: u8,
}

impl SyncDetector {
    pub fn new(sample_rate: f64) -> SyncDetector {
        SyncDetector {
            state: SyncState::Idle,
            sense_index: 0,
            sense_level: SENSE_LEVELS[0],
            guard_samples: ((GUARD_MS * sample_rate / 1000.0) as u32).max(1),
            validate_samples: ((VALIDATE_MS * sample_rate / 1000.0) as u32).max(1),
            bit_samples: ((BIT_MS * sample_rate / 1000.0) as u32).max(1),
            timer: 0,
            vis_data: 0,
            bits_remaining: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// True once the start bit has been validated; the front end then switches to its narrow
    /// band-pass.
    pub fn is_acquired(&self) -> bool {
        matches!(self.state, SyncState::Decoding | SyncState::ExtendedWait | SyncState::Locked)
    }

    /// Select a sensitivity preset. Levels above the highest preset are clamped.
    pub fn set_sense_level(&mut self, level: u8) {
        self.sense_index = level.min(SENSE_LEVELS.len() as u8 - 1);
        self.sense_level = SENSE_LEVELS[self.sense_index as usize];
    }

    pub fn sense_level(&self) -> u8 {
        self.sense_index
    }

    pub fn reset(&mut self) {
        self.state = SyncState::Idle;
        self.timer = 0;
        self.vis_data = 0;
        self.bits_remaining = 0;
    }

    /// Force the locked state, used when a mode hint replaces VIS detection.
    pub fn force_lock(&mut self) {
        self.state = SyncState::Locked;
    }

    fn start_bit_present(&self, e: &ToneEnergies) -> bool {
        e.sync > e.leader && e.sync > self.sense_level && e.sync - e.leader >= self.sense_level
    }

    fn to_idle(&mut self) {
        self.state = SyncState::Idle;
        self.timer = 0;
    }

    /// Advance the detector by one sample. Returns the resolved mode on the sample that
    /// completes a recognized VIS header.
    pub fn process(&mut self, e: &ToneEnergies) -> Option<Mode> {
        match self.state {
            SyncState::Idle => {
                if self.start_bit_present(e) {
                    if self.timer == 0 {
                        self.timer = self.guard_samples;
                    }
                    else {
                        self.timer -= 1;
                        if self.timer == 0 {
                            debug!("rx: start bit candidate, validating");
                            self.state = SyncState::Validating;
                            self.timer = self.validate_samples;
                        }
                    }
                }
                else {
                    self.timer = 0;
                }
                None
            }
            SyncState::Validating => {
                if !self.start_bit_present(e) {
                    debug!("rx: start bit dropped during validation");
                    self.to_idle();
                    return None;
                }
                self.timer -= 1;
                if self.timer == 0 {
                    debug!("rx: start bit validated, sampling bits");
                    self.state = SyncState::Decoding;
                    self.timer = self.bit_samples;
                    self.vis_data = 0;
                    self.bits_remaining = 8;
                }
                None
            }
            SyncState::Decoding | SyncState::ExtendedWait => self.sample_bit(e),
            SyncState::Locked => None,
        }
    }

    fn sample_bit(&mut self, e: &ToneEnergies) -> Option<Mode> {
        self.timer -= 1;
        if self.timer != 0 {
            return None;
        }

        // Neither tone discriminable: treat as noise and rearm.
        if e.mark < e.leader && e.space < e.leader && (e.mark - e.space).abs() < SENSE_LEVEL_2 {
            debug!("rx: vis tones indiscriminable, rearming");
            self.to_idle();
            return None;
        }

        self.timer = self.bit_samples;

        // LSB first; equal energies resolve to space (0).
        let position = 8 - self.bits_remaining;
        if e.mark > e.space {
            self.vis_data |= 1 << position;
        }

        self.bits_remaining -= 1;
        if self.bits_remaining != 0 {
            return None;
        }

        let code = self.vis_data;
        let extended = self.state == SyncState::ExtendedWait;

        if !parity_ok(code) {
            // Accepted regardless; the lookup is still attempted.
            warn!(
                "rx: vis parity mismatch (code=0x{:02x}, expected parity {})",
                code,
                data_parity(code)
            );
        }

        if !extended && (code & 0x7f) == EXTENDED_SENTINEL {
            debug!("rx: extended vis announced");
            self.state = SyncState::ExtendedWait;
            self.vis_data = 0;
            self.bits_remaining = 8;
            return None;
        }

        match lookup_mode(code, extended) {
            Some(mode) => {
                debug!("rx: vis 0x{:02x} resolved to {}", code, mode.descriptor().name);
                self.state = SyncState::Locked;
                Some(mode)
            }
            None => {
                debug!("rx: vis 0x{:02x} unrecognized", code);
                self.to_idle();
                None
            }
        }
    }
}
