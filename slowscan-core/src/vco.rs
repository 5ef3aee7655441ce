// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Table-lookup sine oscillator with a linear frequency control input.

use std::f64::consts::PI;

/// The linear mapping from a normalized control value to an output frequency.
///
/// A control value of 0.0 produces `base_hz`; 1.0 produces `base_hz + span_hz`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FreqMapping {
    pub base_hz: f64,
    pub span_hz: f64,
}

impl FreqMapping {
    /// The MMSSTV-compatible mapping, 1080-2300 Hz. Aligns the oscillator with the 1080/1320 Hz
    /// VIS mark and space tones and is the default for transmission.
    pub const MMSSTV: FreqMapping = FreqMapping { base_hz: 1080.0, span_hz: 1220.0 };

    /// The classic 1100-2300 Hz mapping.
    pub const CLASSIC: FreqMapping = FreqMapping { base_hz: 1100.0, span_hz: 1200.0 };

    /// Normalize a frequency in Hz to the control range, clamped to `[0, 1]`.
    pub fn normalize(&self, freq_hz: f64) -> f64 {
        ((freq_hz - self.base_hz) / self.span_hz).clamp(0.0, 1.0)
    }
}

impl Default for FreqMapping {
    fn default() -> Self {
        FreqMapping::MMSSTV
    }
}

/// A sample-rate sine oscillator. The output frequency follows the control input sample by
/// sample, which makes it directly usable as the FM modulator of the transmit core.
#[derive(Clone, Debug)]
pub struct Vco {
    table: Vec<f64>,
    phase: f64,
    // Table entries advanced per sample at control 0 and the additional advance at control 1.
    incr_base: f64,
    incr_span: f64,
    sample_rate: f64,
}

impl Vco {
    /// Create an oscillator for the given sample rate and frequency mapping. The sine table
    /// holds two seconds worth of entries.
    pub fn new(sample_rate: f64, mapping: FreqMapping) -> Vco {
        let table_size = (sample_rate * 2.0) as usize;
        let mut table = Vec::with_capacity(table_size);
        for i in 0..table_size {
            table.push((i as f64 * 2.0 * PI / table_size as f64).sin());
        }

        let mut vco =
            Vco { table, phase: 0.0, incr_base: 0.0, incr_span: 0.0, sample_rate };
        vco.set_mapping(mapping);
        vco
    }

    /// Select the control-to-frequency mapping. Phase is preserved.
    pub fn set_mapping(&mut self, mapping: FreqMapping) {
        let table_size = self.table.len() as f64;
        self.incr_base = table_size * mapping.base_hz / self.sample_rate;
        self.incr_span = table_size * mapping.span_hz / self.sample_rate;
    }

    /// Restart the oscillator at zero phase.
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    /// Advance one sample with the normalized control value `u` and return the sine output.
    ///
    /// `u` is expected in `[0, 1]`; the output is always within `[-1, 1]`.
    pub fn process(&mut self, u: f64) -> f64 {
        let table_size = self.table.len() as f64;

        self.phase += self.incr_base + self.incr_span * u;
        while self.phase >= table_size {
            self.phase -= table_size;
        }
        while self.phase < 0.0 {
            self.phase += table_size;
        }

        self.table[self.phase as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Count zero crossings to estimate the oscillator frequency.
    fn measure_freq(vco: &mut Vco, u: f64, rate: f64) -> f64 {
        let n = rate as usize;
        let mut crossings = 0u32;
        let mut prev = vco.process(u);
        for _ in 1..n {
            let y = vco.process(u);
            if prev < 0.0 && y >= 0.0 {
                crossings += 1;
            }
            prev = y;
        }
        f64::from(crossings)
    }

    #[test]
    fn verify_control_endpoints() {
        const RATE: f64 = 48000.0;

        let mut vco = Vco::new(RATE, FreqMapping::MMSSTV);
        let low = measure_freq(&mut vco, 0.0, RATE);
        assert!((low - 1080.0).abs() < 2.0, "low {}", low);

        vco.reset_phase();
        let high = measure_freq(&mut vco, 1.0, RATE);
        assert!((high - 2300.0).abs() < 2.0, "high {}", high);
    }

    #[test]
    fn verify_classic_mapping() {
        const RATE: f64 = 48000.0;

        let mut vco = Vco::new(RATE, FreqMapping::CLASSIC);
        let mid = measure_freq(&mut vco, 0.5, RATE);
        assert!((mid - 1700.0).abs() < 2.0, "mid {}", mid);
    }

    #[test]
    fn verify_output_bounded() {
        let mut vco = Vco::new(8000.0, FreqMapping::MMSSTV);
        for n in 0..16000 {
            let u = (n % 100) as f64 / 100.0;
            let y = vco.process(u);
            assert!(y >= -1.0 && y <= 1.0);
        }
    }

    #[test]
    fn verify_normalize_clamps() {
        let m = FreqMapping::MMSSTV;
        assert_eq!(m.normalize(1080.0), 0.0);
        assert_eq!(m.normalize(2300.0), 1.0);
        assert_eq!(m.normalize(500.0), 0.0);
        assert_eq!(m.normalize(9000.0), 1.0);
    }
}
