// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-pole resonant band-pass section used as a tone-energy detector.

use std::f64::consts::PI;

use super::squash_denormal;

/// A `Tank` is a narrow-bandwidth second-order resonator. Driving it with a signal containing
/// energy at its center frequency produces a large output; off-center energy is rejected in
/// proportion to the configured bandwidth.
#[derive(Clone, Debug)]
pub struct Tank {
    a0: f64,
    b1: f64,
    b2: f64,
    z1: f64,
    z2: f64,
}

impl Tank {
    /// Create a resonator centered on `freq` Hz with the given bandwidth in Hz.
    pub fn new(freq: f64, sample_rate: f64, bandwidth: f64) -> Tank {
        let mut tank = Tank { a0: 0.0, b1: 0.0, b2: 0.0, z1: 0.0, z2: 0.0 };
        tank.tune(freq, sample_rate, bandwidth);
        tank
    }

    /// Retune the resonator. Filter state is preserved.
    pub fn tune(&mut self, freq: f64, sample_rate: f64, bandwidth: f64) {
        self.b1 = 2.0 * (-PI * bandwidth / sample_rate).exp() * (2.0 * PI * freq / sample_rate).cos();
        self.b2 = -(-2.0 * PI * bandwidth / sample_rate).exp();

        self.a0 = if bandwidth > 0.0 {
            (2.0 * PI * freq / sample_rate).sin() / ((sample_rate / 6.0) / bandwidth)
        }
        else {
            (2.0 * PI * freq / sample_rate).sin()
        };
    }

    /// Zero the resonator state.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    /// Process one sample.
    pub fn process(&mut self, x: f64) -> f64 {
        let mut d = x * self.a0;
        d += self.z1 * self.b1;
        d += self.z2 * self.b2;
        self.z2 = self.z1;
        self.z1 = squash_denormal(d);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mean rectified steady-state response of a fresh resonator to a unit sine at `freq`.
    fn response(center: f64, bandwidth: f64, freq: f64) -> f64 {
        const RATE: f64 = 48000.0;

        let mut tank = Tank::new(center, RATE, bandwidth);
        let mut energy = 0.0;
        let warmup = RATE as usize / 10;
        let measure = RATE as usize / 10;

        for n in 0..(warmup + measure) {
            let x = (2.0 * PI * freq * n as f64 / RATE).sin();
            let y = tank.process(x);
            if n >= warmup {
                energy += y.abs();
            }
        }

        energy / measure as f64
    }

    #[test]
    fn verify_selectivity() {
        for &(center, bandwidth) in &[(1200.0, 100.0), (1900.0, 100.0), (1080.0, 80.0)] {
            let on = response(center, bandwidth, center);
            let below = response(center, bandwidth, center - bandwidth - 100.0);
            let above = response(center, bandwidth, center + bandwidth + 100.0);

            assert!(on > below, "center {} vs below: {} <= {}", center, on, below);
            assert!(on > above, "center {} vs above: {} <= {}", center, on, above);
        }
    }

    #[test]
    fn verify_output_is_finite_on_silence() {
        let mut tank = Tank::new(1200.0, 48000.0, 100.0);
        let mut y = 0.0;
        for _ in 0..100_000 {
            y = tank.process(0.0);
        }
        assert_eq!(y, 0.0);
    }
}
