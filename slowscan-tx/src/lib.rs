// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! SSTV transmit core.
//!
//! An [`Encoder`] renders a borrowed image into a mono `f32` sample stream: an optional tuning
//! preamble, an optional VIS header identifying the mode, and the mode's scanline schedule,
//! all synthesized through a single frequency-controlled oscillator.
//!
//! ```no_run
//! use slowscan_core::image::ImageRef;
//! use slowscan_core::modes::Mode;
//! use slowscan_tx::Encoder;
//!
//! let pixels = vec![0u8; 320 * 256 * 3];
//! let image = ImageRef::from_rgb24(&pixels, 320, 256).unwrap();
//!
//! let mut encoder = Encoder::new(Mode::Scottie1, 48000.0).unwrap();
//! encoder.set_image(image).unwrap();
//!
//! let mut buf = vec![0.0f32; 4096];
//! while !encoder.is_complete() {
//!     let n = encoder.generate(&mut buf);
//!     // deliver buf[..n] to the sound device or file writer
//! }
//! ```

pub mod scanline;

use log::debug;

use slowscan_core::errors::{config_error, Result};
use slowscan_core::image::ImageRef;
use slowscan_core::modes::{descriptor, Mode, ModeDescriptor, ModeTiming};
use slowscan_core::vco::{FreqMapping, Vco};
use slowscan_core::vis::VisEncoder;

use crate::scanline::{LineScheduler, SegmentQueue};

/// Options common to all encoders.
#[derive(Copy, Clone, Debug)]
pub struct EncoderOptions {
    /// Transmit the VIS header. Enabled by default. Modes without a registered VIS code
    /// transmit none regardless.
    pub vis_enabled: bool,
    /// Transmit the tuning preamble ahead of the VIS header. Enabled by default.
    pub preamble_enabled: bool,
    /// The oscillator's control-to-frequency mapping. The default MMSSTV mapping keeps the
    /// synthesized VIS tones exactly on the 1080/1320 Hz mark and space frequencies.
    pub mapping: FreqMapping,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            vis_enabled: true,
            preamble_enabled: true,
            mapping: FreqMapping::MMSSTV,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Preamble,
    Vis,
    Lines,
    Done,
}

/// An SSTV encoder holding a borrowed image for the duration of one encoding pass.
pub struct Encoder<'img> {
    mode: Mode,
    sample_rate: f64,
    options: EncoderOptions,
    image: Option<ImageRef<'img>>,

    vco: Vco,
    vis: Option<VisEncoder>,
    queue: SegmentQueue,
    scheduler: LineScheduler,

    stage: Stage,
    primed: bool,
    samples_generated: u64,
    total_samples: u64,
    complete: bool,
}

impl<'img> Encoder<'img> {
    /// Create an encoder for `mode` with default options.
    pub fn new(mode: Mode, sample_rate: f64) -> Result<Encoder<'img>> {
        Encoder::new_with_options(mode, sample_rate, EncoderOptions::default())
    }

    /// Create an encoder for `mode` with explicit options.
    pub fn new_with_options(
        mode: Mode,
        sample_rate: f64,
        options: EncoderOptions,
    ) -> Result<Encoder<'img>> {
        if !(sample_rate > 0.0) {
            return config_error("tx: sample rate must be positive");
        }

        let mut encoder = Encoder {
            mode,
            sample_rate,
            options,
            image: None,
            vco: Vco::new(sample_rate, options.mapping),
            vis: None,
            queue: SegmentQueue::new(sample_rate),
            scheduler: LineScheduler::new(mode),
            stage: Stage::Preamble,
            primed: false,
            samples_generated: 0,
            total_samples: 0,
            complete: false,
        };
        encoder.recompute_total_samples();

        Ok(encoder)
    }

    /// The mode this encoder renders.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn mode_descriptor(&self) -> &'static ModeDescriptor {
        descriptor(self.mode)
    }

    fn timing(&self) -> &ModeTiming {
        self.scheduler.timing()
    }

    /// Borrow the image to transmit. Fails if its dimensions disagree with the mode, leaving
    /// the encoder inert.
    pub fn set_image(&mut self, image: ImageRef<'img>) -> Result<()> {
        let desc = self.mode_descriptor();
        if image.width() != desc.width || image.height() != desc.height {
            return config_error("tx: image dimensions do not match mode");
        }
        self.image = Some(image);
        Ok(())
    }

    /// Enable or disable the VIS header.
    pub fn set_vis_enabled(&mut self, enabled: bool) {
        self.options.vis_enabled = enabled;
        self.recompute_total_samples();
    }

    /// Enable or disable the tuning preamble.
    pub fn set_preamble_enabled(&mut self, enabled: bool) {
        self.options.preamble_enabled = enabled;
        self.recompute_total_samples();
    }

    fn vis_header(&self) -> Option<VisEncoder> {
        let desc = self.mode_descriptor();
        if !self.options.vis_enabled || desc.vis_code == 0 || self.mode.is_narrow() {
            return None;
        }

        let word = self.mode.extended_vis_word();
        if word != 0 {
            Some(VisEncoder::new_extended(word, self.sample_rate))
        }
        else {
            Some(VisEncoder::new(desc.vis_code, self.sample_rate))
        }
    }

    fn recompute_total_samples(&mut self) {
        let timing = self.timing();
        let picture_ms = timing.line_ms * f64::from(timing.line_count);
        let mut total = (picture_ms * self.sample_rate / 1000.0) as u64;

        if let Some(vis) = self.vis_header() {
            total += vis.total_samples() as u64;
        }
        if self.options.preamble_enabled {
            total += (timing.preamble_ms() * self.sample_rate / 1000.0) as u64;
        }

        self.total_samples = total;
    }

    fn write_preamble(&mut self) {
        let tones: &[f64] = if self.timing().narrow {
            &[1900.0, 2300.0, 1900.0, 2300.0]
        }
        else {
            &[1900.0, 1500.0, 1900.0, 1500.0, 2300.0, 1500.0, 2300.0, 1500.0]
        };
        for &freq in tones {
            self.queue.push_ms(freq, 100.0);
        }
    }

    fn prime(&mut self) {
        self.queue.reset();
        self.scheduler.reset();
        self.vco.reset_phase();
        self.vis = self.vis_header();
        self.stage = if self.options.preamble_enabled {
            Stage::Preamble
        }
        else if self.vis.is_some() {
            Stage::Vis
        }
        else {
            Stage::Lines
        };
        if self.stage == Stage::Preamble {
            self.write_preamble();
        }
        self.primed = true;

        debug!(
            "tx: start mode={} vis={} preamble={}",
            self.mode_descriptor().name,
            self.vis.is_some(),
            self.options.preamble_enabled
        );
    }

    /// Synthesize up to `buf.len()` samples, returning the number written.
    ///
    /// Values are bounded in `[-1, +1]`. Returns 0 when the transmission is complete or when
    /// no image has been set.
    pub fn generate(&mut self, buf: &mut [f32]) -> usize {
        if self.complete || self.image.is_none() {
            return 0;
        }

        if !self.primed {
            self.prime();
        }

        let mapping = self.options.mapping;
        let mut produced = 0;

        while produced < buf.len() {
            let freq = match self.stage {
                Stage::Preamble => match self.queue.next_sample() {
                    Some(freq) => freq,
                    None => {
                        self.queue.clear();
                        self.stage = if self.vis.is_some() { Stage::Vis } else { Stage::Lines };
                        continue;
                    }
                },
                Stage::Vis => {
                    let freq = self.vis.as_mut().map(|vis| vis.next_frequency()).unwrap_or(0.0);
                    if freq <= 0.0 {
                        self.stage = Stage::Lines;
                        continue;
                    }
                    freq
                }
                Stage::Lines => match self.queue.next_sample() {
                    Some(freq) => freq,
                    None => {
                        self.queue.clear();
                        let image = match self.image {
                            Some(image) => image,
                            None => break,
                        };
                        if !self.scheduler.write_next_line(&mut self.queue, &image) {
                            self.stage = Stage::Done;
                            self.complete = true;
                            break;
                        }
                        continue;
                    }
                },
                Stage::Done => break,
            };

            buf[produced] = self.vco.process(mapping.normalize(freq)) as f32;
            produced += 1;
            self.samples_generated += 1;
        }

        produced
    }

    /// True once every stage of the transmission has been rendered.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Fraction of the transmission generated so far, monotonically non-decreasing in
    /// `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.total_samples == 0 {
            return 0.0;
        }
        (self.samples_generated as f64 / self.total_samples as f64).min(1.0) as f32
    }

    /// The pre-computed length of the whole transmission in samples.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Samples generated since construction or the last reset.
    pub fn samples_generated(&self) -> u64 {
        self.samples_generated
    }

    /// Return the encoder to its initial state. A subsequent [`generate`](Encoder::generate)
    /// pass produces bit-identical output.
    pub fn reset(&mut self) {
        self.samples_generated = 0;
        self.complete = false;
        self.primed = false;
        self.queue.reset();
        self.scheduler.reset();
        self.vco.reset_phase();
        self.vis = None;
        self.stage = Stage::Preamble;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slowscan_core::modes::dimensions;

    const RATE: f64 = 48000.0;

    fn uniform_pixels(mode: Mode, value: u8) -> (Vec<u8>, u32, u32) {
        let (w, h) = dimensions(mode);
        (vec![value; (w * h * 3) as usize], w, h)
    }

    fn drain(encoder: &mut Encoder<'_>) -> Vec<f32> {
        let mut out = Vec::new();
        let mut buf = vec![0.0f32; 8192];
        loop {
            let n = encoder.generate(&mut buf);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn verify_rejects_bad_sample_rate() {
        assert!(Encoder::new(Mode::Scottie1, 0.0).is_err());
        assert!(Encoder::new(Mode::Scottie1, -48000.0).is_err());
    }

    #[test]
    fn verify_rejects_mismatched_image() {
        // A Robot 36 encoder (320x240) must refuse a 320x256 image and stay inert.
        let pixels = vec![0u8; 320 * 256 * 3];
        let image = ImageRef::from_rgb24(&pixels, 320, 256).unwrap();

        let mut encoder = Encoder::new(Mode::Robot36, RATE).unwrap();
        assert!(encoder.set_image(image).is_err());

        let mut buf = [0.0f32; 256];
        assert_eq!(encoder.generate(&mut buf), 0);
    }

    #[test]
    fn verify_generate_without_image_returns_zero() {
        let mut encoder = Encoder::new(Mode::Martin1, RATE).unwrap();
        let mut buf = [0.0f32; 256];
        assert_eq!(encoder.generate(&mut buf), 0);
        assert!(!encoder.is_complete());
    }

    #[test]
    fn verify_scottie1_total_samples() {
        let (pixels, w, h) = uniform_pixels(Mode::Scottie1, 127);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut encoder = Encoder::new(Mode::Scottie1, RATE).unwrap();
        encoder.set_image(image).unwrap();

        // preamble 0.8 s + VIS 0.91 s + picture 109.624 s.
        let expected = (RATE * (0.8 + 0.91 + 109.624)) as i64;
        let total = encoder.total_samples() as i64;
        assert!((total - expected).abs() <= 256, "total {} expected {}", total, expected);
    }

    #[test]
    fn verify_output_amplitude_bounded() {
        let (pixels, w, h) = uniform_pixels(Mode::Bw12, 255);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut encoder = Encoder::new(Mode::Bw12, RATE).unwrap();
        encoder.set_image(image).unwrap();

        for s in drain(&mut encoder) {
            assert!(s >= -1.0 && s <= 1.0);
        }
        assert!(encoder.is_complete());
    }

    #[test]
    fn verify_progress_monotonic_and_complete() {
        let (pixels, w, h) = uniform_pixels(Mode::Robot36, 90);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut encoder = Encoder::new(Mode::Robot36, RATE).unwrap();
        encoder.set_image(image).unwrap();

        let mut buf = vec![0.0f32; 4096];
        let mut last = 0.0f32;
        while encoder.generate(&mut buf) != 0 {
            let p = encoder.progress();
            assert!(p >= last);
            last = p;
        }
        assert!(encoder.is_complete());
        assert!(last >= 0.99, "final progress {}", last);

        let generated = encoder.samples_generated() as i64;
        let total = encoder.total_samples() as i64;
        assert!((generated - total).abs() <= 512, "{} vs {}", generated, total);
    }

    #[test]
    fn verify_reset_reproduces_output() {
        let (pixels, w, h) = uniform_pixels(Mode::Bw8, 30);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut encoder = Encoder::new(Mode::Bw8, RATE).unwrap();
        encoder.set_image(image).unwrap();

        let first = drain(&mut encoder);
        encoder.reset();
        let second = drain(&mut encoder);

        assert_eq!(first.len(), second.len());
        assert_eq!(first, second);
    }

    #[test]
    fn verify_vis_can_be_disabled() {
        let (pixels, w, h) = uniform_pixels(Mode::Martin2, 127);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut with_vis = Encoder::new(Mode::Martin2, RATE).unwrap();
        with_vis.set_image(image).unwrap();

        let mut without_vis = Encoder::new(Mode::Martin2, RATE).unwrap();
        without_vis.set_image(image).unwrap();
        without_vis.set_vis_enabled(false);

        let diff = with_vis.total_samples() - without_vis.total_samples();
        assert_eq!(diff, (0.910 * RATE) as u64);
    }

    #[test]
    fn verify_extended_vis_length() {
        let (pixels, w, h) = uniform_pixels(Mode::Mr73, 127);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut with_vis = Encoder::new(Mode::Mr73, RATE).unwrap();
        with_vis.set_image(image).unwrap();

        let mut without_vis = Encoder::new(Mode::Mr73, RATE).unwrap();
        without_vis.set_image(image).unwrap();
        without_vis.set_vis_enabled(false);

        let diff = with_vis.total_samples() - without_vis.total_samples();
        assert_eq!(diff, (1.150 * RATE) as u64);
    }

    #[test]
    fn verify_narrow_mode_has_short_preamble_and_no_vis() {
        let (pixels, w, h) = uniform_pixels(Mode::Mc110, 127);
        let image = ImageRef::from_rgb24(&pixels, w, h).unwrap();

        let mut encoder = Encoder::new(Mode::Mc110, RATE).unwrap();
        encoder.set_image(image).unwrap();

        let desc = Mode::Mc110.descriptor();
        let expected = (0.4 * RATE) as u64 + (desc.duration_secs * RATE) as u64;
        let total = encoder.total_samples() as i64;
        assert!((total - expected as i64).abs() <= 256, "total {}", total);
    }
}
