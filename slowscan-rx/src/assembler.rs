// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The image assembler: converting tone energies into pixels once a mode has locked.
//!
//! This is the mode-agnostic baseline: the instantaneous scan frequency is estimated from the
//! mark/space energy ratio, averaged over each pixel period, and committed as a luminance
//! value. Per-mode channel demultiplexing is intentionally not performed here.

use log::debug;

use slowscan_core::color::freq_to_component;
use slowscan_core::image::{ImageBuffer, ImageRef};
use slowscan_core::modes::{descriptor, Mode};

use crate::tones::ToneEnergies;

/// Accumulates pixels row by row while scanline data arrives.
#[derive(Clone, Debug)]
pub struct ImageAssembler {
    buffer: ImageBuffer,
    col: u32,
    row: u32,
    samples_per_pixel: f64,
    sample_count: u32,
    value_acc: f64,
    value_count: u32,
    complete: bool,
}

impl ImageAssembler {
    /// Allocate the picture buffer for a locked mode. Returns `None` when the allocation
    /// fails.
    pub fn new(mode: Mode, sample_rate: f64) -> Option<ImageAssembler> {
        let desc = descriptor(mode);
        let buffer = ImageBuffer::allocate(desc.width, desc.height)?;

        let samples_per_line = desc.duration_secs / f64::from(desc.height) * sample_rate;
        let samples_per_pixel = samples_per_line / f64::from(desc.width);

        debug!(
            "rx: assembling {}x{} ({}), {:.2} samples/pixel",
            desc.width, desc.height, desc.name, samples_per_pixel
        );

        Some(ImageAssembler {
            buffer,
            col: 0,
            row: 0,
            samples_per_pixel,
            sample_count: 0,
            value_acc: 0.0,
            value_count: 0,
            complete: false,
        })
    }

    /// True once every row has been filled.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The row currently being filled.
    pub fn current_row(&self) -> u32 {
        self.row
    }

    /// The assembled picture.
    pub fn image(&self) -> ImageRef<'_> {
        self.buffer.as_ref()
    }

    /// Consume one sample of tone energies.
    pub fn process(&mut self, e: &ToneEnergies) {
        if self.complete {
            return;
        }

        // Ratio-based frequency estimate from the mark and space envelopes, mapped onto the
        // 1500-2300 Hz luminance range.
        let total = (e.mark + e.space).max(1.0);
        let estimate = 1500.0 + 800.0 * e.space / total;
        let value = freq_to_component(estimate);

        self.value_acc += f64::from(value);
        self.value_count += 1;
        self.sample_count += 1;

        if self.sample_count < self.samples_per_pixel as u32 {
            return;
        }

        let mean = (self.value_acc / f64::from(self.value_count.max(1)) + 0.5) as i64;
        self.buffer.put_gray(self.col, self.row, mean.clamp(0, 255) as u8);

        self.sample_count = 0;
        self.value_acc = 0.0;
        self.value_count = 0;

        self.col += 1;
        if self.col >= self.buffer.width() {
            self.col = 0;
            self.row += 1;
            if self.row % 16 == 0 {
                debug!("rx: line {}/{}", self.row, self.buffer.height());
            }
            if self.row >= self.buffer.height() {
                self.complete = true;
                debug!("rx: picture complete");
            }
        }
    }
}
