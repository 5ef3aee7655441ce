// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The tone-energy bank: four resonators whose rectified, smoothed outputs are the decision
//! variables of the sync/VIS state machine and the image assembler.

use slowscan_core::dsp::iir::{CascadedIir, IirFamily};
use slowscan_core::dsp::tank::Tank;
use slowscan_core::vis::{LEADER_HZ, MARK_HZ, SPACE_HZ, SYNC_HZ};

const MARK_SPACE_BW: f64 = 80.0;
const SYNC_LEADER_BW: f64 = 100.0;
const ENVELOPE_LPF_HZ: f64 = 50.0;

/// The rectified envelope of each detector for one sample.
#[derive(Copy, Clone, Debug, Default)]
pub struct ToneEnergies {
    /// 1080 Hz mark energy.
    pub mark: f64,
    /// 1200 Hz sync/start energy.
    pub sync: f64,
    /// 1320 Hz space energy.
    pub space: f64,
    /// 1900 Hz leader energy.
    pub leader: f64,
}

/// Four tank resonators with 50 Hz envelope smoothing.
#[derive(Clone, Debug)]
pub struct ToneBank {
    sample_rate: f64,
    mark: Tank,
    sync: Tank,
    space: Tank,
    leader: Tank,
    mark_lpf: CascadedIir,
    sync_lpf: CascadedIir,
    space_lpf: CascadedIir,
    leader_lpf: CascadedIir,
}

impl ToneBank {
    pub fn new(sample_rate: f64) -> ToneBank {
        let lpf = || CascadedIir::lowpass(ENVELOPE_LPF_HZ, sample_rate, 2, IirFamily::Butterworth);
        ToneBank {
            sample_rate,
            mark: Tank::new(MARK_HZ, sample_rate, MARK_SPACE_BW),
            sync: Tank::new(SYNC_HZ, sample_rate, SYNC_LEADER_BW),
            space: Tank::new(SPACE_HZ, sample_rate, MARK_SPACE_BW),
            leader: Tank::new(LEADER_HZ, sample_rate, SYNC_LEADER_BW),
            mark_lpf: lpf(),
            sync_lpf: lpf(),
            space_lpf: lpf(),
            leader_lpf: lpf(),
        }
    }

    /// Retune the mark and space detectors, e.g. for a signal using non-standard VIS tones.
    pub fn set_vis_tones(&mut self, mark_hz: f64, space_hz: f64) {
        self.mark.tune(mark_hz, self.sample_rate, MARK_SPACE_BW);
        self.space.tune(space_hz, self.sample_rate, MARK_SPACE_BW);
    }

    pub fn reset(&mut self) {
        self.mark.reset();
        self.sync.reset();
        self.space.reset();
        self.leader.reset();
        self.mark_lpf.reset();
        self.sync_lpf.reset();
        self.space_lpf.reset();
        self.leader_lpf.reset();
    }

    /// Run one working-signal sample through all four detectors.
    pub fn process(&mut self, d: f64) -> ToneEnergies {
        ToneEnergies {
            mark: self.mark_lpf.process(self.mark.process(d).abs()),
            sync: self.sync_lpf.process(self.sync.process(d).abs()),
            space: self.space_lpf.process(self.space.process(d).abs()),
            leader: self.leader_lpf.process(self.leader.process(d).abs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RATE: f64 = 48000.0;

    fn settle(bank: &mut ToneBank, freq: f64, amp: f64) -> ToneEnergies {
        let mut energies = ToneEnergies::default();
        for n in 0..(RATE as usize / 5) {
            let x = amp * (2.0 * PI * freq * n as f64 / RATE).sin();
            energies = bank.process(x);
        }
        energies
    }

    #[test]
    fn verify_sync_tone_dominates() {
        let mut bank = ToneBank::new(RATE);
        let e = settle(&mut bank, 1200.0, 16384.0);

        assert!(e.sync > e.leader, "sync {} leader {}", e.sync, e.leader);
        assert!(e.sync > e.mark, "sync {} mark {}", e.sync, e.mark);
        assert!(e.sync > e.space, "sync {} space {}", e.sync, e.space);
        assert!(e.sync > 2400.0, "sync {}", e.sync);
    }

    #[test]
    fn verify_mark_space_discrimination() {
        let mut bank = ToneBank::new(RATE);
        let mark = settle(&mut bank, 1080.0, 16384.0);
        assert!(mark.mark > mark.space);

        bank.reset();
        let space = settle(&mut bank, 1320.0, 16384.0);
        assert!(space.space > space.mark);
    }

    #[test]
    fn verify_retuned_vis_tones() {
        let mut bank = ToneBank::new(RATE);
        bank.set_vis_tones(1100.0, 1300.0);
        let e = settle(&mut bank, 1100.0, 16384.0);
        assert!(e.mark > e.space);
    }
}
