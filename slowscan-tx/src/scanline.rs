// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scanline scheduling: turning image rows into timed `(frequency, sample count)` segments.

use slowscan_core::color::{
    component_to_freq, component_to_freq_narrow, rgb_to_ycc, NARROW_LOW_HZ, NARROW_SYNC_HZ,
};
use slowscan_core::image::ImageRef;
use slowscan_core::modes::{Mode, ModeTiming, ScanFamily};

/// One constant-frequency run of samples.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment {
    pub freq_hz: f64,
    pub samples: usize,
}

/// An ordered queue of segments with fractional-sample accounting.
///
/// Durations are supplied in milliseconds; the fractional remainder of each conversion is
/// carried into the next push so the running total never drifts more than one sample from the
/// nominal schedule, no matter how many segments are queued.
#[derive(Clone, Debug)]
pub struct SegmentQueue {
    sample_rate: f64,
    segments: Vec<Segment>,
    index: usize,
    offset: usize,
    fraction: f64,
}

impl SegmentQueue {
    pub fn new(sample_rate: f64) -> SegmentQueue {
        SegmentQueue {
            sample_rate,
            segments: Vec::with_capacity(2048),
            index: 0,
            offset: 0,
            fraction: 0.0,
        }
    }

    /// Append a run of `ms` milliseconds at `freq_hz`.
    pub fn push_ms(&mut self, freq_hz: f64, ms: f64) {
        if ms <= 0.0 {
            return;
        }

        let exact = ms * self.sample_rate / 1000.0 + self.fraction;
        let samples = exact as usize;
        self.fraction = exact - samples as f64;

        if samples > 0 {
            self.segments.push(Segment { freq_hz, samples });
        }
    }

    /// Pull the frequency for the next sample, or `None` when the queue is exhausted.
    pub fn next_sample(&mut self) -> Option<f64> {
        while let Some(seg) = self.segments.get(self.index) {
            if self.offset < seg.samples {
                self.offset += 1;
                return Some(seg.freq_hz);
            }
            self.index += 1;
            self.offset = 0;
        }
        None
    }

    /// True when every queued sample has been pulled.
    pub fn is_exhausted(&self) -> bool {
        self.index >= self.segments.len()
    }

    /// Drop all queued segments but keep the fractional residue, ready for the next line.
    pub fn clear(&mut self) {
        self.segments.clear();
        self.index = 0;
        self.offset = 0;
    }

    /// Return to the pristine state, discarding the fractional residue as well.
    pub fn reset(&mut self) {
        self.clear();
        self.fraction = 0.0;
    }

    /// Total samples currently queued.
    pub fn queued_samples(&self) -> usize {
        self.segments.iter().map(|seg| seg.samples).sum()
    }
}

/// Generates the segment list for each timed scanline of a transmission.
#[derive(Clone, Debug)]
pub struct LineScheduler {
    mode: Mode,
    timing: ModeTiming,
    timed_line: u32,
    image_row: u32,
}

impl LineScheduler {
    pub fn new(mode: Mode) -> LineScheduler {
        LineScheduler { mode, timing: ModeTiming::new(mode), timed_line: 0, image_row: 0 }
    }

    pub fn timing(&self) -> &ModeTiming {
        &self.timing
    }

    pub fn reset(&mut self) {
        self.timed_line = 0;
        self.image_row = 0;
    }

    /// True when every scanline has been scheduled.
    pub fn is_done(&self) -> bool {
        self.timed_line >= self.timing.line_count
    }

    /// Schedule the next scanline into `queue`. Returns false once the picture is complete.
    pub fn write_next_line(&mut self, queue: &mut SegmentQueue, image: &ImageRef<'_>) -> bool {
        if self.is_done() {
            return false;
        }

        // Scottie transmissions begin with a single sync pulse ahead of the first line.
        if self.timed_line == 0 && self.timing.family == ScanFamily::Scottie {
            queue.push_ms(1200.0, self.timing.sync_ms);
        }

        let row = self.image_row;
        match self.timing.family {
            ScanFamily::Robot24 => self.write_robot24(queue, image, row),
            ScanFamily::Robot36 => self.write_robot36(queue, image, row),
            ScanFamily::Robot72 => self.write_robot72(queue, image, row),
            ScanFamily::Avt => self.write_avt(queue, image, row),
            ScanFamily::Scottie => self.write_scottie(queue, image, row),
            ScanFamily::Martin => self.write_martin(queue, image, row),
            ScanFamily::Sc2 => self.write_sc2(queue, image, row),
            ScanFamily::Pd => self.write_pd(queue, image, row),
            ScanFamily::Pasokon => self.write_pasokon(queue, image, row),
            ScanFamily::MartinR => self.write_martin_r(queue, image, row),
            ScanFamily::MartinP | ScanFamily::NarrowYc => self.write_martin_p(queue, image, row),
            ScanFamily::NarrowRgb => self.write_narrow_rgb(queue, image, row),
            ScanFamily::Bw => self.write_bw(queue, image, row),
        }

        self.timed_line += 1;
        self.image_row += self.timing.rows_per_line();
        true
    }

    fn ycc_row(&self, image: &ImageRef<'_>, row: u32) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
        let width = image.width();
        let mut y = Vec::with_capacity(width as usize);
        let mut ry = Vec::with_capacity(width as usize);
        let mut by = Vec::with_capacity(width as usize);
        for col in 0..width {
            let (yv, ryv, byv) = rgb_to_ycc(image.rgb(col, row));
            y.push(yv);
            ry.push(ryv);
            by.push(byv);
        }
        (y, ry, by)
    }

    // Scottie, Martin, SC2, and the narrow RGB modes scan a fixed 320-column raster and
    // resample wider or narrower sources onto it.
    fn push_rgb_channel_320(
        &self,
        queue: &mut SegmentQueue,
        image: &ImageRef<'_>,
        row: u32,
        channel: usize,
        pixel_ms: f64,
        narrow: bool,
    ) {
        let width = image.width();
        for x in 0u32..320 {
            let col = x * width / 320;
            let rgb = image.rgb(col, row);
            let c = [rgb.0, rgb.1, rgb.2][channel];
            let freq =
                if narrow { component_to_freq_narrow(c) } else { component_to_freq(c) };
            queue.push_ms(freq, pixel_ms);
        }
    }

    fn write_robot24(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;
        let chroma_ms = t.chroma_ms / 320.0;
        let (y, ry, by) = self.ycc_row(image, row);

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        for &v in &y {
            queue.push_ms(component_to_freq(v), pixel_ms);
        }
        queue.push_ms(1500.0, t.separator_ms);
        queue.push_ms(1900.0, t.settle_ms);
        for &v in &ry {
            queue.push_ms(component_to_freq(v), chroma_ms);
        }
        queue.push_ms(2300.0, t.separator_ms);
        queue.push_ms(1900.0, t.settle_ms);
        for &v in &by {
            queue.push_ms(component_to_freq(v), chroma_ms);
        }
    }

    fn write_robot36(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;
        let chroma_ms = t.chroma_ms / 320.0;
        let (y, ry, by) = self.ycc_row(image, row);
        let odd = row & 1 == 1;

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        for &v in &y {
            queue.push_ms(component_to_freq(v), pixel_ms);
        }
        // The polarity marker announces which color-difference half follows: R-Y on even
        // lines, B-Y on odd lines.
        queue.push_ms(if odd { 2300.0 } else { 1500.0 }, t.separator_ms);
        queue.push_ms(1900.0, t.settle_ms);
        for &v in if odd { &by } else { &ry } {
            queue.push_ms(component_to_freq(v), chroma_ms);
        }
    }

    fn write_robot72(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;
        let chroma_ms = t.chroma_ms / 320.0;
        let (y, ry, by) = self.ycc_row(image, row);

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        for &v in &y {
            queue.push_ms(component_to_freq(v), pixel_ms);
        }
        queue.push_ms(1500.0, t.separator_ms);
        queue.push_ms(1900.0, t.settle_ms);
        for &v in &ry {
            queue.push_ms(component_to_freq(v), chroma_ms);
        }
        queue.push_ms(2300.0, t.separator_ms);
        queue.push_ms(1900.0, t.settle_ms);
        for &v in &by {
            queue.push_ms(component_to_freq(v), chroma_ms);
        }
    }

    fn write_avt(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let pixel_ms = self.timing.channel_ms / 320.0;
        for channel in 0..3 {
            for col in 0..image.width() {
                let rgb = image.rgb(col, row);
                let c = [rgb.0, rgb.1, rgb.2][channel];
                queue.push_ms(component_to_freq(c), pixel_ms);
            }
        }
    }

    fn write_scottie(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;

        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 1, pixel_ms, false);
        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 2, pixel_ms, false);
        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 0, pixel_ms, false);
    }

    fn write_martin(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 1, pixel_ms, false);
        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 2, pixel_ms, false);
        queue.push_ms(1500.0, t.separator_ms);
        self.push_rgb_channel_320(queue, image, row, 0, pixel_ms, false);
        queue.push_ms(1500.0, t.separator_ms);
    }

    fn write_sc2(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        self.push_rgb_channel_320(queue, image, row, 0, pixel_ms, false);
        self.push_rgb_channel_320(queue, image, row, 1, pixel_ms, false);
        self.push_rgb_channel_320(queue, image, row, 2, pixel_ms, false);
    }

    fn write_pd(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let width = image.width();
        let pixel_ms = t.channel_ms / f64::from(width);
        let next = (row + 1).min(image.height().saturating_sub(1));

        let (y1, ry1, by1) = self.ycc_row(image, row);
        let (y2, ry2, by2) = self.ycc_row(image, next);

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        for &v in &y1 {
            queue.push_ms(component_to_freq(v), pixel_ms);
        }
        // Chroma is shared by both rows of the pair and transmitted as their average.
        for col in 0..width as usize {
            let v = (u16::from(ry1[col]) + u16::from(ry2[col])) / 2;
            queue.push_ms(component_to_freq(v as u8), pixel_ms);
        }
        for col in 0..width as usize {
            let v = (u16::from(by1[col]) + u16::from(by2[col])) / 2;
            queue.push_ms(component_to_freq(v as u8), pixel_ms);
        }
        for &v in &y2 {
            queue.push_ms(component_to_freq(v), pixel_ms);
        }
    }

    fn write_pasokon(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 640.0;

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);
        for channel in [0usize, 1, 2] {
            for col in 0..image.width() {
                let rgb = image.rgb(col, row);
                let c = [rgb.0, rgb.1, rgb.2][channel];
                queue.push_ms(component_to_freq(c), pixel_ms);
            }
            queue.push_ms(1500.0, t.porch_ms);
        }
    }

    fn write_martin_r(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let width = image.width();
        let luma_ms = t.channel_ms / f64::from(width);
        let chroma_ms = luma_ms / 2.0;
        let (y, ry, by) = self.ycc_row(image, row);

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);

        let mut last = 1500.0;
        for &v in &y {
            last = component_to_freq(v);
            queue.push_ms(last, luma_ms);
        }
        // The settling tone holds the last pixel frequency briefly between channels.
        queue.push_ms(last, t.settle_ms);
        for &v in &ry {
            last = component_to_freq(v);
            queue.push_ms(last, chroma_ms);
        }
        queue.push_ms(last, t.settle_ms);
        for &v in &by {
            last = component_to_freq(v);
            queue.push_ms(last, chroma_ms);
        }
        queue.push_ms(last, t.settle_ms);
    }

    fn write_martin_p(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let width = image.width();
        let pixel_ms = t.channel_ms / f64::from(width);
        let next = (row + 1).min(image.height().saturating_sub(1));
        let narrow = t.narrow;

        let (y1, ry, by) = self.ycc_row(image, row);
        let (y2, _, _) = self.ycc_row(image, next);

        let to_freq: fn(u8) -> f64 =
            if narrow { component_to_freq_narrow } else { component_to_freq };

        if narrow {
            queue.push_ms(f64::from(NARROW_SYNC_HZ), t.sync_ms);
            queue.push_ms(f64::from(NARROW_LOW_HZ), t.porch_ms);
        }
        else {
            queue.push_ms(1200.0, t.sync_ms);
            queue.push_ms(1500.0, t.porch_ms);
        }

        for &v in &y1 {
            queue.push_ms(to_freq(v), pixel_ms);
        }
        for &v in &ry {
            queue.push_ms(to_freq(v), pixel_ms);
        }
        for &v in &by {
            queue.push_ms(to_freq(v), pixel_ms);
        }
        for &v in &y2 {
            queue.push_ms(to_freq(v), pixel_ms);
        }
    }

    fn write_narrow_rgb(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let pixel_ms = t.channel_ms / 320.0;

        queue.push_ms(f64::from(NARROW_SYNC_HZ), t.sync_ms);
        queue.push_ms(f64::from(NARROW_LOW_HZ), t.porch_ms);
        self.push_rgb_channel_320(queue, image, row, 0, pixel_ms, true);
        self.push_rgb_channel_320(queue, image, row, 1, pixel_ms, true);
        self.push_rgb_channel_320(queue, image, row, 2, pixel_ms, true);
    }

    fn write_bw(&self, queue: &mut SegmentQueue, image: &ImageRef<'_>, row: u32) {
        let t = &self.timing;
        let width = image.width();
        let pixel_ms = t.channel_ms / f64::from(width);
        let next = (row + 1).min(image.height().saturating_sub(1));

        queue.push_ms(1200.0, t.sync_ms);
        queue.push_ms(1500.0, t.porch_ms);

        // Luminance averaged across the two source rows this line covers.
        for col in 0..width {
            let (y1, _, _) = rgb_to_ycc(image.rgb(col, row));
            let (y2, _, _) = rgb_to_ycc(image.rgb(col, next));
            let y = (u16::from(y1) + u16::from(y2)) / 2;
            queue.push_ms(component_to_freq(y as u8), pixel_ms);
        }
    }

    /// The mode this scheduler was built for.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The timed line that will be scheduled next.
    pub fn current_line(&self) -> u32 {
        self.timed_line
    }
}
