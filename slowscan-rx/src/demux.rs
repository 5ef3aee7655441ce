// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mode-aware picture assembly: an FM discriminator and a scanline demultiplexer that walks
//! the same per-mode timing used on transmit, separating sync, porch, and channel runs and
//! recovering RGB or luminance/color-difference pixels from the instantaneous scan frequency.

use log::debug;

use slowscan_core::color::{freq_to_component, freq_to_component_narrow, ycc_to_rgb};
use slowscan_core::dsp::fir::{design_hilbert, FirDelay};
use slowscan_core::image::{ImageBuffer, ImageRef};
use slowscan_core::modes::{descriptor, Mode, ModeTiming, ScanFamily};

/// Quadrature FM discriminator: the working signal and its Hilbert transform form an analytic
/// pair whose per-sample phase advance is the instantaneous frequency.
#[derive(Clone, Debug)]
pub struct FmDiscriminator {
    taps: Vec<f64>,
    delay: FirDelay,
    prev_i: f64,
    prev_q: f64,
    sample_rate: f64,
}

impl FmDiscriminator {
    pub fn new(sample_rate: f64) -> FmDiscriminator {
        // Same length scaling as the front-end band-pass, forced even so the transformer has
        // a zero center tap.
        let n = (((24.0 * sample_rate / 11025.0) as usize).max(8)) & !1;
        let taps = design_hilbert(n, sample_rate, 300.0, 3000.0);

        FmDiscriminator {
            delay: FirDelay::new(taps.len()),
            taps,
            prev_i: 0.0,
            prev_q: 0.0,
            sample_rate,
        }
    }

    pub fn reset(&mut self) {
        self.delay.reset();
        self.prev_i = 0.0;
        self.prev_q = 0.0;
    }

    /// Estimate the instantaneous frequency in Hz at this sample. Returns 0 on silence.
    pub fn process(&mut self, x: f64) -> f64 {
        let (i, q) = self.delay.process_with_delayed(x, &self.taps);

        // Conjugate product of consecutive analytic samples; its argument is the phase step.
        let re = i * self.prev_i + q * self.prev_q;
        let im = q * self.prev_i - i * self.prev_q;
        self.prev_i = i;
        self.prev_q = q;

        im.atan2(re) * self.sample_rate / (2.0 * std::f64::consts::PI)
    }
}

// What a scanline interval carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
    Luma,
    Luma2,
    ChromaR,
    ChromaB,
    Mono,
}

#[derive(Copy, Clone, Debug)]
enum Slot {
    Gap(f64),
    Run { channel: Channel, pixels: u32, ms: f64 },
}

fn run(channel: Channel, pixels: u32, ms: f64) -> Slot {
    Slot::Run { channel, pixels, ms }
}

// The receive-side mirror of the transmit line writers: the interval sequence of one timed
// scanline.
fn line_plan(t: &ModeTiming, width: u32, line: u32) -> Vec<Slot> {
    use Channel::*;
    use Slot::Gap;

    match t.family {
        ScanFamily::Scottie => {
            let mut plan = Vec::new();
            if line == 0 {
                plan.push(Gap(t.sync_ms));
            }
            plan.extend_from_slice(&[
                Gap(t.separator_ms),
                run(Green, 320, t.channel_ms),
                Gap(t.separator_ms),
                run(Blue, 320, t.channel_ms),
                Gap(t.sync_ms),
                Gap(t.separator_ms),
                run(Red, 320, t.channel_ms),
            ]);
            plan
        }
        ScanFamily::Martin => vec![
            Gap(t.sync_ms),
            Gap(t.separator_ms),
            run(Green, 320, t.channel_ms),
            Gap(t.separator_ms),
            run(Blue, 320, t.channel_ms),
            Gap(t.separator_ms),
            run(Red, 320, t.channel_ms),
            Gap(t.separator_ms),
        ],
        ScanFamily::Sc2 => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Red, 320, t.channel_ms),
            run(Green, 320, t.channel_ms),
            run(Blue, 320, t.channel_ms),
        ],
        ScanFamily::Pasokon => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Red, width, t.channel_ms),
            Gap(t.porch_ms),
            run(Green, width, t.channel_ms),
            Gap(t.porch_ms),
            run(Blue, width, t.channel_ms),
            Gap(t.porch_ms),
        ],
        ScanFamily::Avt => vec![
            run(Red, 320, t.channel_ms),
            run(Green, 320, t.channel_ms),
            run(Blue, 320, t.channel_ms),
        ],
        ScanFamily::Pd | ScanFamily::MartinP | ScanFamily::NarrowYc => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Luma, width, t.channel_ms),
            run(ChromaR, width, t.channel_ms),
            run(ChromaB, width, t.channel_ms),
            run(Luma2, width, t.channel_ms),
        ],
        ScanFamily::MartinR => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Luma, width, t.channel_ms),
            Gap(t.settle_ms),
            run(ChromaR, width, t.channel_ms / 2.0),
            Gap(t.settle_ms),
            run(ChromaB, width, t.channel_ms / 2.0),
            Gap(t.settle_ms),
        ],
        ScanFamily::NarrowRgb => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Red, 320, t.channel_ms),
            run(Green, 320, t.channel_ms),
            run(Blue, 320, t.channel_ms),
        ],
        ScanFamily::Bw => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Mono, width, t.channel_ms),
        ],
        ScanFamily::Robot24 => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Luma, 320, t.channel_ms),
            Gap(t.separator_ms),
            Gap(t.settle_ms),
            run(ChromaR, 320, t.chroma_ms),
            Gap(t.separator_ms),
            Gap(t.settle_ms),
            run(ChromaB, 320, t.chroma_ms),
        ],
        ScanFamily::Robot36 => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Luma, 320, t.channel_ms),
            Gap(t.separator_ms),
            Gap(t.settle_ms),
            run(if line & 1 == 1 { ChromaB } else { ChromaR }, 320, t.chroma_ms),
        ],
        ScanFamily::Robot72 => vec![
            Gap(t.sync_ms),
            Gap(t.porch_ms),
            run(Luma, 320, t.channel_ms),
            Gap(t.separator_ms),
            Gap(t.settle_ms),
            run(ChromaR, 320, t.chroma_ms),
            Gap(t.separator_ms),
            Gap(t.settle_ms),
            run(ChromaB, 320, t.chroma_ms),
        ],
    }
}

/// Assembles a picture by demultiplexing scanline intervals per the locked mode's timing.
///
/// The assembler free-runs on sample counts from the moment it is started, with the same
/// fractional-sample accounting the transmit scheduler uses, so a whole picture stays within
/// one sample per line of nominal timing.
#[derive(Clone, Debug)]
pub struct ScanAssembler {
    buffer: ImageBuffer,
    timing: ModeTiming,
    sample_rate: f64,
    width: u32,

    line: u32,
    row: u32,
    plan: Vec<Slot>,
    slot: usize,
    slot_samples: usize,
    slot_pos: usize,
    pixel: u32,
    freq_acc: f64,
    freq_n: u32,
    fraction: f64,
    skip: usize,

    luma: Vec<u8>,
    luma2: Vec<u8>,
    chroma_r: Vec<u8>,
    chroma_b: Vec<u8>,
    // Scanline pairing for the interleaved-chroma family.
    prev_luma: Vec<u8>,
    prev_chroma_r: Vec<u8>,

    complete: bool,
}

impl ScanAssembler {
    /// Allocate the picture buffer and the line plan for a locked mode. `skip_ms` of signal
    /// is discarded before the first scanline, covering whatever remains of the VIS header
    /// past the lock instant. Returns `None` when the allocation fails.
    pub fn new(mode: Mode, sample_rate: f64, skip_ms: f64) -> Option<ScanAssembler> {
        let desc = descriptor(mode);
        let buffer = ImageBuffer::allocate(desc.width, desc.height)?;
        let timing = ModeTiming::new(mode);
        let width = desc.width;

        debug!("rx: scan assembly of {}x{} ({})", desc.width, desc.height, desc.name);

        let mut assembler = ScanAssembler {
            buffer,
            timing,
            sample_rate,
            width,
            line: 0,
            row: 0,
            plan: Vec::new(),
            slot: 0,
            slot_samples: 0,
            slot_pos: 0,
            pixel: 0,
            freq_acc: 0.0,
            freq_n: 0,
            fraction: 0.0,
            skip: (skip_ms * sample_rate / 1000.0) as usize,
            luma: vec![0; width as usize],
            luma2: vec![0; width as usize],
            chroma_r: vec![128; width as usize],
            chroma_b: vec![128; width as usize],
            prev_luma: vec![0; width as usize],
            prev_chroma_r: vec![128; width as usize],
            complete: false,
        };
        assembler.begin_line();

        Some(assembler)
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn current_row(&self) -> u32 {
        self.row.min(self.buffer.height())
    }

    pub fn image(&self) -> ImageRef<'_> {
        self.buffer.as_ref()
    }

    fn begin_line(&mut self) {
        self.plan = line_plan(&self.timing, self.width, self.line);

        // The final line needs no trailing gaps; dropping them lets the picture finish on its
        // last pixel even when the signal ends immediately after it.
        if self.line + 1 == self.timing.line_count {
            while matches!(self.plan.last(), Some(Slot::Gap(_))) {
                self.plan.pop();
            }
        }

        self.slot = 0;
        self.enter_slot();
    }

    fn enter_slot(&mut self) {
        let ms = match self.plan.get(self.slot) {
            Some(Slot::Gap(ms)) => *ms,
            Some(Slot::Run { ms, .. }) => *ms,
            None => 0.0,
        };

        let exact = ms * self.sample_rate / 1000.0 + self.fraction;
        self.slot_samples = exact as usize;
        self.fraction = exact - self.slot_samples as f64;
        self.slot_pos = 0;
        self.pixel = 0;
        self.freq_acc = 0.0;
        self.freq_n = 0;
    }

    /// Consume one instantaneous-frequency sample.
    pub fn process(&mut self, freq_hz: f64) {
        if self.complete {
            return;
        }

        if self.skip > 0 {
            self.skip -= 1;
            return;
        }

        // Advance past exhausted (or zero-length) slots and completed lines.
        while self.slot_pos >= self.slot_samples {
            self.slot += 1;
            if self.slot >= self.plan.len() {
                self.finish_line();
                if self.complete {
                    return;
                }
            }
            else {
                self.enter_slot();
            }
        }

        self.slot_pos += 1;

        if let Slot::Run { channel, pixels, .. } = self.plan[self.slot] {
            self.freq_acc += freq_hz;
            self.freq_n += 1;

            let boundary = (self.pixel as usize + 1) * self.slot_samples / pixels as usize;
            if self.slot_pos >= boundary && self.pixel < pixels {
                let mean = self.freq_acc / f64::from(self.freq_n.max(1));
                let value = if self.timing.narrow {
                    freq_to_component_narrow(mean)
                }
                else {
                    freq_to_component(mean)
                };
                self.store(channel, pixels, value);

                self.pixel += 1;
                self.freq_acc = 0.0;
                self.freq_n = 0;
            }
        }

        // Close the line as soon as its last slot is exhausted rather than on the next
        // sample; the signal may end exactly on the final pixel of the picture.
        if self.slot_pos >= self.slot_samples && self.slot + 1 >= self.plan.len() {
            self.finish_line();
        }
    }

    fn store(&mut self, channel: Channel, pixels: u32, value: u8) {
        let col = self.pixel * self.width / pixels;
        match channel {
            Channel::Red => self.buffer.put_channel(col, self.row, 0, value),
            Channel::Green => self.buffer.put_channel(col, self.row, 1, value),
            Channel::Blue => self.buffer.put_channel(col, self.row, 2, value),
            Channel::Luma => self.luma[col as usize] = value,
            Channel::Luma2 => self.luma2[col as usize] = value,
            Channel::ChromaR => self.chroma_r[col as usize] = value,
            Channel::ChromaB => self.chroma_b[col as usize] = value,
            Channel::Mono => {
                self.buffer.put_gray(col, self.row, value);
                self.buffer.put_gray(col, self.row + 1, value);
            }
        }
    }

    fn finish_line(&mut self) {
        match self.timing.family {
            ScanFamily::Robot24 => {
                for col in 0..self.width {
                    let c = col as usize;
                    let rgb = ycc_to_rgb(self.luma[c], self.chroma_r[c], self.chroma_b[c]);
                    self.buffer.put_rgb(col, self.row, rgb);
                    self.buffer.put_rgb(col, self.row + 1, rgb);
                }
            }
            ScanFamily::Robot72 | ScanFamily::MartinR => {
                for col in 0..self.width {
                    let c = col as usize;
                    let rgb = ycc_to_rgb(self.luma[c], self.chroma_r[c], self.chroma_b[c]);
                    self.buffer.put_rgb(col, self.row, rgb);
                }
            }
            ScanFamily::Robot36 => {
                if self.line & 1 == 0 {
                    // Even lines carry R-Y; the pair completes on the next line.
                    self.prev_luma.copy_from_slice(&self.luma);
                    self.prev_chroma_r.copy_from_slice(&self.chroma_r);
                }
                else {
                    for col in 0..self.width {
                        let c = col as usize;
                        let upper = ycc_to_rgb(
                            self.prev_luma[c],
                            self.prev_chroma_r[c],
                            self.chroma_b[c],
                        );
                        let lower = ycc_to_rgb(
                            self.luma[c],
                            self.prev_chroma_r[c],
                            self.chroma_b[c],
                        );
                        self.buffer.put_rgb(col, self.row - 1, upper);
                        self.buffer.put_rgb(col, self.row, lower);
                    }
                }
            }
            ScanFamily::Pd | ScanFamily::MartinP | ScanFamily::NarrowYc => {
                for col in 0..self.width {
                    let c = col as usize;
                    let upper = ycc_to_rgb(self.luma[c], self.chroma_r[c], self.chroma_b[c]);
                    let lower = ycc_to_rgb(self.luma2[c], self.chroma_r[c], self.chroma_b[c]);
                    self.buffer.put_rgb(col, self.row, upper);
                    self.buffer.put_rgb(col, self.row + 1, lower);
                }
            }
            // Direct-written RGB and B/W families have nothing to compose.
            _ => {}
        }

        self.line += 1;
        self.row += self.timing.rows_per_line();

        if self.line >= self.timing.line_count {
            self.complete = true;
            debug!("rx: scan assembly complete");
        }
        else {
            if self.line % 16 == 0 {
                debug!("rx: line {}/{}", self.line, self.timing.line_count);
            }
            self.begin_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RATE: f64 = 48000.0;

    #[test]
    fn verify_discriminator_tracks_tones() {
        for &target in &[1200.0, 1500.0, 1900.0, 2300.0] {
            let mut fm = FmDiscriminator::new(RATE);
            let mut acc = 0.0;
            let mut count = 0;
            for n in 0..4800 {
                let x = 16384.0 * (2.0 * PI * target * n as f64 / RATE).sin();
                let f = fm.process(x);
                if n >= 2400 {
                    acc += f;
                    count += 1;
                }
            }
            let mean = acc / f64::from(count);
            assert!((mean - target).abs() < 5.0, "target {} estimate {}", target, mean);
        }
    }

    #[test]
    fn verify_discriminator_on_silence() {
        let mut fm = FmDiscriminator::new(RATE);
        let mut last = 1.0;
        for _ in 0..4800 {
            last = fm.process(0.0);
        }
        assert_eq!(last, 0.0);
    }

    #[test]
    fn verify_line_plans_match_line_duration() {
        use slowscan_core::modes::all_modes;

        for desc in all_modes() {
            let timing = ModeTiming::new(desc.mode);
            let plan = line_plan(&timing, desc.width, 1);
            let total_ms: f64 = plan
                .iter()
                .map(|slot| match slot {
                    Slot::Gap(ms) => *ms,
                    Slot::Run { ms, .. } => *ms,
                })
                .sum();

            assert!(
                (total_ms - timing.line_ms).abs() < 1.0e-6,
                "{}: plan {} vs line {}",
                desc.name,
                total_ms,
                timing.line_ms
            );
        }
    }

    #[test]
    fn verify_uniform_tone_fills_mono_picture() {
        // A constant mid-scale frequency must fill a B/W picture with mid-gray.
        let mut asm = ScanAssembler::new(Mode::Bw12, RATE, 0.0).unwrap();
        let total = (Mode::Bw12.descriptor().duration_secs * RATE) as usize;

        for _ in 0..total + 4800 {
            asm.process(1900.0);
            if asm.is_complete() {
                break;
            }
        }

        assert!(asm.is_complete());
        let image = asm.image();
        let (r, g, b) = image.rgb(160, 120);
        let expected = freq_to_component(1900.0);
        assert_eq!(r, expected);
        assert_eq!(g, expected);
        assert_eq!(b, expected);
    }

    #[test]
    fn verify_skip_discards_leading_samples() {
        let mut asm = ScanAssembler::new(Mode::Bw12, RATE, 10.0).unwrap();
        let skip = (10.0 * RATE / 1000.0) as usize;

        // While skipping, no row advances and nothing is stored.
        for _ in 0..skip {
            asm.process(2300.0);
        }
        assert_eq!(asm.current_row(), 0);
        assert_eq!(asm.image().rgb(0, 0), (0, 0, 0));
    }
}
