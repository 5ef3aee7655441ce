// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The receive front end: input conditioning, band-pass filtering, and gain control.
//!
//! Per sample the front end hard-clips the input, applies an adjacent-average low-pass,
//! band-pass filters it (wide during acquisition, narrow once a start bit has been
//! validated), normalizes the level, and scales the result onto the fixed range the tone
//! detectors and sense thresholds are calibrated for.

use slowscan_core::dsp::fir::{design_kaiser, FirDelay, FirShape, FirSpec};

// Working-signal calibration. Sense thresholds and the tone detectors assume these.
const INPUT_CLIP: f64 = 24576.0;
const AGC_TARGET: f64 = 16384.0;
const AGC_FLOOR: f64 = 32.0;
const OUTPUT_SCALE: f64 = 32.0;
const OUTPUT_CLIP: f64 = 16384.0;

/// Behavior of the level-tracking gain stage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AgcMode {
    /// Unity gain; the caller supplies a pre-conditioned signal.
    Off,
    /// Recompute the gain from the peak of every 100 ms window.
    #[default]
    Fast,
    /// Average the peak over five windows before updating the gain, favouring stability on
    /// fading signals.
    Slow,
}

/// Peak-tracking automatic gain control over 100 ms windows.
#[derive(Clone, Debug)]
pub struct LevelTracker {
    mode: AgcMode,
    window_len: u32,
    count: u32,
    window_peak: f64,
    peak: f64,
    peak_max: f64,
    peak_avg: f64,
    window_count: u32,
    gain: f64,
}

impl LevelTracker {
    pub fn new(sample_rate: f64, mode: AgcMode) -> LevelTracker {
        LevelTracker {
            mode,
            window_len: (sample_rate * 100.0 / 1000.0) as u32,
            count: 0,
            window_peak: 0.0,
            peak: 0.0,
            peak_max: 0.0,
            peak_avg: 0.0,
            window_count: 0,
            gain: 1.0,
        }
    }

    pub fn set_mode(&mut self, mode: AgcMode) {
        self.mode = mode;
        if mode == AgcMode::Off {
            self.gain = 1.0;
        }
    }

    pub fn mode(&self) -> AgcMode {
        self.mode
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.window_peak = 0.0;
        self.peak = 0.0;
        self.peak_max = 0.0;
        self.peak_avg = 0.0;
        self.window_count = 0;
        self.gain = 1.0;
    }

    /// Track one sample and return it with the current gain applied.
    pub fn process(&mut self, d: f64) -> f64 {
        if self.mode == AgcMode::Off {
            return d;
        }

        self.window_peak = self.window_peak.max(d.abs());
        self.count += 1;

        if self.count >= self.window_len {
            self.count = 0;
            self.window_count += 1;
            self.peak = self.peak.max(self.window_peak);

            if self.window_count >= 5 {
                self.window_count = 0;
                self.peak_max = self.window_peak;
                self.peak_avg = (self.peak_avg + self.window_peak) * 0.5;
                self.peak = 0.0;
                if self.mode == AgcMode::Slow {
                    if self.peak_avg > AGC_FLOOR && self.peak_max > 0.0 {
                        self.gain = AGC_TARGET / self.peak_max;
                    }
                    else {
                        self.gain = AGC_TARGET / AGC_FLOOR;
                    }
                }
            }
            else {
                self.peak_max = self.peak_max.max(self.window_peak);
            }

            if self.mode == AgcMode::Fast {
                self.gain = AGC_TARGET / self.window_peak.max(AGC_FLOOR);
            }

            self.window_peak = 0.0;
        }

        d * self.gain
    }
}

/// The complete input conditioning chain ahead of the tone detectors.
#[derive(Clone, Debug)]
pub struct FrontEnd {
    prev_sample: f64,
    bpf: FirDelay,
    // Wide taps cover 400-2500 Hz for acquisition; narrow taps cover 1080-2600 Hz once the
    // start bit has been validated.
    wide_taps: Vec<f64>,
    narrow_taps: Vec<f64>,
    agc: LevelTracker,
}

impl FrontEnd {
    pub fn new(sample_rate: f64) -> FrontEnd {
        let taps = ((24.0 * sample_rate / 11025.0) as usize).max(1);

        let narrow_taps = design_kaiser(&FirSpec {
            shape: FirShape::Bandpass,
            taps,
            sample_rate,
            low_hz: 1080.0,
            high_hz: 2600.0,
            attenuation_db: 20.0,
            gain: 1.0,
        });
        let wide_taps = design_kaiser(&FirSpec {
            shape: FirShape::Bandpass,
            taps,
            sample_rate,
            low_hz: 400.0,
            high_hz: 2500.0,
            attenuation_db: 20.0,
            gain: 1.0,
        });

        FrontEnd {
            prev_sample: 0.0,
            bpf: FirDelay::new(narrow_taps.len()),
            wide_taps,
            narrow_taps,
            agc: LevelTracker::new(sample_rate, AgcMode::Fast),
        }
    }

    pub fn agc(&mut self) -> &mut LevelTracker {
        &mut self.agc
    }

    pub fn agc_mode(&self) -> AgcMode {
        self.agc.mode()
    }

    pub fn reset(&mut self) {
        self.prev_sample = 0.0;
        self.bpf.reset();
        self.agc.reset();
    }

    /// Condition one input sample into the working signal. `acquired` selects the narrow
    /// band-pass used once the start bit has been validated.
    pub fn process(&mut self, sample: f64, acquired: bool) -> f64 {
        let x = sample.clamp(-INPUT_CLIP, INPUT_CLIP);

        let d = (x + self.prev_sample) * 0.5;
        self.prev_sample = x;

        let taps = if acquired { &self.narrow_taps } else { &self.wide_taps };
        let d = self.bpf.process(d, taps);

        let d = self.agc.process(d);

        (d * OUTPUT_SCALE).clamp(-OUTPUT_CLIP, OUTPUT_CLIP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RATE: f64 = 48000.0;

    #[test]
    fn verify_fast_agc_normalizes_weak_and_strong_input() {
        // Weak and strong inputs must settle to the same working level.
        let mut weak_peak: f64 = 0.0;
        let mut strong_peak: f64 = 0.0;

        for (amp, peak) in [(500.0, &mut weak_peak), (20000.0, &mut strong_peak)] {
            let mut agc = LevelTracker::new(RATE, AgcMode::Fast);
            for n in 0..RATE as usize {
                let x = amp * (2.0 * PI * 1900.0 * n as f64 / RATE).sin();
                let y = agc.process(x);
                if n > (RATE as usize) / 2 {
                    *peak = peak.max(y.abs());
                }
            }
        }

        assert!((weak_peak - AGC_TARGET).abs() < 0.05 * AGC_TARGET, "weak {}", weak_peak);
        assert!((strong_peak - AGC_TARGET).abs() < 0.05 * AGC_TARGET, "strong {}", strong_peak);
    }

    #[test]
    fn verify_agc_floor_bounds_gain() {
        // Near-silence must not be amplified past the fixed maximum gain.
        let mut agc = LevelTracker::new(RATE, AgcMode::Fast);
        let mut peak: f64 = 0.0;
        for n in 0..RATE as usize {
            let x = 0.001 * (2.0 * PI * 1200.0 * n as f64 / RATE).sin();
            peak = peak.max(agc.process(x).abs());
        }
        assert!(peak <= 0.001 * AGC_TARGET / AGC_FLOOR + 1e-9, "peak {}", peak);
    }

    #[test]
    fn verify_output_clamped() {
        let mut fe = FrontEnd::new(RATE);
        for n in 0..RATE as usize {
            let x = 1.0e6 * (2.0 * PI * 1500.0 * n as f64 / RATE).sin();
            let y = fe.process(x, false);
            assert!(y.abs() <= OUTPUT_CLIP);
        }
    }

    #[test]
    fn verify_wide_band_rejects_out_of_band() {
        let mut agc_off = FrontEnd::new(RATE);
        agc_off.agc().set_mode(AgcMode::Off);

        // 8 kHz is outside both pass-bands; compare raw filter output with AGC off.
        let mut in_band = 0.0;
        let mut out_band = 0.0;
        for n in 0..RATE as usize {
            let t = n as f64 / RATE;
            let y = agc_off.process(10000.0 * (2.0 * PI * 1500.0 * t).sin(), false);
            if n > 200 {
                in_band += y * y;
            }
        }
        agc_off.reset();
        agc_off.agc().set_mode(AgcMode::Off);
        for n in 0..RATE as usize {
            let t = n as f64 / RATE;
            let y = agc_off.process(10000.0 * (2.0 * PI * 8000.0 * t).sin(), false);
            if n > 200 {
                out_band += y * y;
            }
        }
        assert!(in_band > 10.0 * out_band, "in {} out {}", in_band, out_band);
    }

    #[test]
    fn verify_agc_off_is_unity() {
        let mut agc = LevelTracker::new(RATE, AgcMode::Off);
        for n in 0..10000 {
            let x = (n % 7) as f64;
            assert_eq!(agc.process(x), x);
        }
    }
}
