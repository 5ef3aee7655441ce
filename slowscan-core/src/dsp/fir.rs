// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Kaiser-windowed FIR design and a circular-buffer convolver.

use std::f64::consts::PI;

/// Frequency response shape for [`design_kaiser`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FirShape {
    Lowpass,
    Highpass,
    Bandpass,
    Bandstop,
}

/// Parameters of a Kaiser-windowed FIR design.
#[derive(Copy, Clone, Debug)]
pub struct FirSpec {
    pub shape: FirShape,
    /// Number of delay taps. The designed filter has `2 * (taps / 2) + 1` coefficients.
    pub taps: usize,
    pub sample_rate: f64,
    /// Low cutoff in Hz. The only cutoff for low- and high-pass shapes.
    pub low_hz: f64,
    /// High cutoff in Hz. Ignored for low- and high-pass shapes.
    pub high_hz: f64,
    /// Stop-band attenuation in dB, controlling the Kaiser window parameter.
    pub attenuation_db: f64,
    /// Pass-band gain.
    pub gain: f64,
}

// Modified Bessel function of the first kind, I0(x), for the Kaiser window.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0;
    let mut xj = 1.0;
    let mut j = 1;
    loop {
        xj *= (0.5 * x) / f64::from(j);
        sum += xj * xj;
        j += 1;
        if 1.0e-8 * sum - xj * xj > 0.0 {
            break;
        }
    }
    sum
}

/// Design a symmetric linear-phase FIR per `spec`. The returned coefficient vector has odd
/// length and is symmetric around its midpoint; low-pass designs are normalized so the
/// coefficients sum to the requested gain at DC.
pub fn design_kaiser(spec: &FirSpec) -> Vec<f64> {
    let half = spec.taps / 2;
    let mut h = vec![0.0; half + 1];

    let fc = match spec.shape {
        FirShape::Highpass => 0.5 * spec.sample_rate - spec.low_hz,
        FirShape::Bandpass | FirShape::Bandstop => (spec.high_hz - spec.low_hz) / 2.0,
        FirShape::Lowpass => spec.low_hz,
    };

    let att = spec.attenuation_db;
    let alpha = if att >= 50.0 {
        0.1102 * (att - 8.7)
    }
    else if att >= 21.0 {
        0.5842 * (att - 21.0).powf(0.4) + 0.07886 * (att - 21.0)
    }
    else {
        0.0
    };

    let wc = PI * 2.0 * fc / spec.sample_rate;
    for (j, hj) in h.iter_mut().enumerate() {
        if j == 0 {
            *hj = fc * 2.0 / spec.sample_rate;
            continue;
        }

        let sinc = (j as f64 * wc).sin() / (PI * j as f64);
        if att >= 21.0 {
            let fm = 2.0 * j as f64 / spec.taps as f64;
            let win = bessel_i0(alpha * (1.0 - fm * fm).sqrt()) / bessel_i0(alpha);
            *hj = sinc * win;
        }
        else {
            *hj = sinc;
        }
    }

    // Normalize to unity DC gain before shifting the band.
    let sum = h[0] + 2.0 * h[1..].iter().sum::<f64>();
    if sum > 0.0 {
        for hj in h.iter_mut() {
            *hj /= sum;
        }
    }

    match spec.shape {
        FirShape::Lowpass => {}
        FirShape::Highpass => {
            for (j, hj) in h.iter_mut().enumerate() {
                *hj *= (j as f64 * PI).cos();
            }
        }
        FirShape::Bandpass => {
            let w0 = PI * (spec.low_hz + spec.high_hz) / spec.sample_rate;
            for (j, hj) in h.iter_mut().enumerate() {
                *hj *= 2.0 * (j as f64 * w0).cos();
            }
        }
        FirShape::Bandstop => {
            let w0 = PI * (spec.low_hz + spec.high_hz) / spec.sample_rate;
            h[0] = 1.0 - 2.0 * h[0];
            for (j, hj) in h.iter_mut().enumerate().skip(1) {
                *hj *= -2.0 * (j as f64 * w0).cos();
            }
        }
    }

    // Unfold the half-band design into the full symmetric coefficient set.
    let mut taps = Vec::with_capacity(2 * half + 1);
    for j in (0..=half).rev() {
        taps.push(h[j] * spec.gain);
    }
    for hj in h.iter().take(half + 1).skip(1) {
        taps.push(hj * spec.gain);
    }

    taps
}

/// FIR Hilbert transformer coefficients for the `fc1..fc2` Hz band, Hamming windowed.
///
/// The returned `n + 1` coefficients are anti-symmetric around the center tap, which is zero.
pub fn design_hilbert(n: usize, sample_rate: f64, fc1: f64, fc2: f64) -> Vec<f64> {
    let n = n.max(2);
    let l = n / 2;
    let t = 1.0 / sample_rate;
    let w1 = 2.0 * PI * fc1;
    let w2 = 2.0 * PI * fc2;

    let mut h = vec![0.0; n + 1];
    for (i, hi) in h.iter_mut().enumerate() {
        let k = i as f64 - l as f64;
        let (x1, x2) = if i == l {
            (0.0, 0.0)
        }
        else {
            ((k * w1 * t).cos() / (k * w1 * t), (k * w2 * t).cos() / (k * w2 * t))
        };
        let w = 0.54 - 0.46 * (2.0 * PI * i as f64 / n as f64).cos();
        *hi = -(2.0 * fc2 * t * x2 - 2.0 * fc1 * t * x1) * w;
    }

    // Short transformers are magnitude-normalized.
    if n < 8 {
        let norm: f64 = h.iter().map(|hi| hi.abs()).sum();
        if norm > 0.0 {
            for hi in h.iter_mut() {
                *hi /= norm;
            }
        }
    }

    h
}

/// A circular delay line evaluated against caller-supplied coefficients, so a single line can
/// feed multiple differently-tuned filters.
#[derive(Clone, Debug)]
pub struct FirDelay {
    z: Vec<f64>,
    w: usize,
    len: usize,
}

impl FirDelay {
    /// Create a delay line for coefficient vectors of length `len`.
    pub fn new(len: usize) -> FirDelay {
        FirDelay { z: vec![0.0; 2 * len.max(1)], w: 0, len: len.max(1) }
    }

    /// Zero the delay line.
    pub fn reset(&mut self) {
        for z in self.z.iter_mut() {
            *z = 0.0;
        }
        self.w = 0;
    }

    /// Push `x` and evaluate the dot product with `taps`.
    ///
    /// `taps` must not be longer than the length the line was created with.
    pub fn process(&mut self, x: f64, taps: &[f64]) -> f64 {
        self.process_with_delayed(x, taps).1
    }

    /// Push `x` and evaluate `taps`, additionally returning the raw input delayed by half the
    /// line length. For a symmetric or anti-symmetric tap set the delayed sample is
    /// group-delay aligned with the filter output, which is what a quadrature demodulator
    /// needs.
    pub fn process_with_delayed(&mut self, x: f64, taps: &[f64]) -> (f64, f64) {
        // The sample is mirrored into both halves so the dot product below never wraps.
        let top = self.w + self.len;
        self.z[top] = x;
        self.z[self.w] = x;

        let mut acc = 0.0;
        for (i, h) in taps.iter().enumerate() {
            acc += self.z[top - i] * h;
        }

        let delayed = self.z[top - self.len / 2];

        self.w += 1;
        if self.w >= self.len {
            self.w = 0;
        }

        (delayed, acc)
    }
}

/// A FIR filter owning both its coefficients and delay line.
#[derive(Clone, Debug)]
pub struct Fir {
    taps: Vec<f64>,
    delay: FirDelay,
}

impl Fir {
    /// Create a filter from a coefficient vector.
    pub fn new(taps: Vec<f64>) -> Fir {
        let delay = FirDelay::new(taps.len());
        Fir { taps, delay }
    }

    /// Design and create a Kaiser-windowed filter.
    pub fn kaiser(spec: &FirSpec) -> Fir {
        Fir::new(design_kaiser(spec))
    }

    /// Zero the delay line. Coefficients are unaffected.
    pub fn reset(&mut self) {
        self.delay.reset();
    }

    /// Process one sample.
    pub fn process(&mut self, x: f64) -> f64 {
        self.delay.process(x, &self.taps)
    }

    /// The filter coefficients.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_lowpass_taps_symmetric_and_normalized() {
        let spec = FirSpec {
            shape: FirShape::Lowpass,
            taps: 64,
            sample_rate: 48000.0,
            low_hz: 3000.0,
            high_hz: 0.0,
            attenuation_db: 40.0,
            gain: 1.0,
        };
        let taps = design_kaiser(&spec);

        assert_eq!(taps.len(), 65);
        for i in 0..taps.len() {
            let mirrored = taps[taps.len() - 1 - i];
            assert!((taps[i] - mirrored).abs() < 1e-12, "tap {} not symmetric", i);
        }

        let sum: f64 = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3, "dc gain {}", sum);
    }

    #[test]
    fn verify_bandpass_response() {
        let spec = FirSpec {
            shape: FirShape::Bandpass,
            taps: 104,
            sample_rate: 48000.0,
            low_hz: 1080.0,
            high_hz: 2600.0,
            attenuation_db: 20.0,
            gain: 1.0,
        };
        let mut fir = Fir::kaiser(&spec);

        let rate = 48000.0;
        let mut in_band = 0.0;
        let mut out_band = 0.0;
        for n in 0..48000 {
            let t = n as f64 / rate;
            let y1 = fir.process((2.0 * PI * 1800.0 * t).sin());
            if n > 200 {
                in_band += y1 * y1;
            }
        }
        fir.reset();
        for n in 0..48000 {
            let t = n as f64 / rate;
            let y2 = fir.process((2.0 * PI * 6000.0 * t).sin());
            if n > 200 {
                out_band += y2 * y2;
            }
        }

        assert!(in_band > 10.0 * out_band, "in {} out {}", in_band, out_band);
    }

    #[test]
    fn verify_center_impulse_is_pure_delay() {
        // A single unit coefficient at the midpoint delays the input by half the tap count.
        let mut taps = vec![0.0; 33];
        taps[16] = 1.0;
        let mut fir = Fir::new(taps);

        let mut out = Vec::new();
        for n in 0..64 {
            out.push(fir.process(n as f64));
        }
        for n in 16..64 {
            assert_eq!(out[n], (n - 16) as f64);
        }
    }

    #[test]
    fn verify_shared_delay_line() {
        // One delay line may be evaluated against different tap sets from sample to sample.
        let a = vec![0.5, 0.25, 0.125];
        let b = vec![1.0, -1.0, 0.0];

        let mut shared = FirDelay::new(3);
        let mut history: Vec<f64> = Vec::new();

        for n in 0..32 {
            let x = ((n * 7) % 5) as f64 - 2.0;
            history.push(x);

            let taps = if n % 2 == 0 { &a } else { &b };
            let y = shared.process(x, taps);

            let mut expected = 0.0;
            for (i, h) in taps.iter().enumerate() {
                if n >= i {
                    expected += h * history[n - i];
                }
            }
            assert!((y - expected).abs() < 1e-12, "sample {}: {} vs {}", n, y, expected);
        }
    }

    #[test]
    fn verify_delayed_output_is_half_length() {
        let taps = vec![0.25; 9];
        let mut line = FirDelay::new(9);

        let mut out = Vec::new();
        for n in 0..32 {
            let (delayed, _) = line.process_with_delayed(n as f64, &taps);
            out.push(delayed);
        }
        for n in 4..32 {
            assert_eq!(out[n], (n - 4) as f64);
        }
    }

    #[test]
    fn verify_hilbert_antisymmetry() {
        let h = design_hilbert(64, 48000.0, 300.0, 3000.0);

        assert_eq!(h.len(), 65);
        assert!(h[32].abs() < 1e-12, "center tap {}", h[32]);

        for i in 0..h.len() {
            assert!((h[i] + h[h.len() - 1 - i]).abs() < 1e-9, "tap {} not anti-symmetric", i);
        }

        let sum: f64 = h.iter().sum();
        assert!(sum.abs() < 1e-9, "sum {}", sum);
    }
}
