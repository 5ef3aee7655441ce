// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! SSTV receive core.
//!
//! A [`Decoder`] consumes a mono `f32` sample stream, recovers the transmission mode from its
//! VIS header, and assembles the picture row by row. Processing is fully synchronous: all
//! work happens inside [`feed`](Decoder::feed) on the caller's thread.
//!
//! ```no_run
//! use slowscan_rx::{Decoder, RxStatus};
//!
//! let mut decoder = Decoder::new(48000.0).unwrap();
//! # let chunks: Vec<Vec<f32>> = Vec::new();
//! for chunk in chunks {
//!     if decoder.feed(&chunk).unwrap() == RxStatus::ImageReady {
//!         let image = decoder.image().unwrap();
//!         // hand the RGB24 view to the caller
//!         break;
//!     }
//! }
//! ```

pub mod assembler;
pub mod demux;
pub mod frontend;
pub mod sync;
pub mod tones;

use log::{debug, error};

use slowscan_core::errors::{config_error, contract_error, resource_error, underflow_error, Result};
use slowscan_core::image::ImageRef;
use slowscan_core::modes::Mode;

pub use crate::frontend::AgcMode;
use crate::assembler::ImageAssembler;
use crate::demux::{FmDiscriminator, ScanAssembler};
use crate::frontend::FrontEnd;
use crate::sync::{SyncDetector, SyncState};
use crate::tones::ToneBank;

// Stop-bit signal remaining in the stream when the final VIS bit decision fires; discarded
// before scan assembly begins.
const VIS_TAIL_SKIP_MS: f64 = 15.0;

/// The outcome of one [`Decoder::feed`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RxStatus {
    /// Samples were consumed but the decoder is idle: VIS detection is disabled and no mode
    /// hint has been supplied.
    Ok,
    /// Acquisition or picture decode is in progress; more samples are needed.
    NeedMore,
    /// A complete picture is available through [`Decoder::image`].
    ImageReady,
}

/// A diagnostic snapshot of the decoder.
#[derive(Copy, Clone, Debug)]
pub struct DecoderState {
    /// The detected mode, or the configured hint while none has been detected.
    pub current_mode: Option<Mode>,
    /// VIS detection enabled.
    pub vis_enabled: bool,
    /// A start bit has been observed and not abandoned.
    pub sync_detected: bool,
    /// A complete picture is available.
    pub image_ready: bool,
    /// The scanline currently being filled.
    pub current_line: u32,
    /// Total scanlines of the locked mode, or 0 before a lock.
    pub total_lines: u32,
}

// Either picture assembly strategy: the mode-agnostic envelope-ratio baseline or the
// mode-aware scanline demultiplexer.
enum Assembly {
    Baseline(ImageAssembler),
    Scan(ScanAssembler),
}

impl Assembly {
    fn is_complete(&self) -> bool {
        match self {
            Assembly::Baseline(a) => a.is_complete(),
            Assembly::Scan(a) => a.is_complete(),
        }
    }

    fn current_row(&self) -> u32 {
        match self {
            Assembly::Baseline(a) => a.current_row(),
            Assembly::Scan(a) => a.current_row(),
        }
    }

    fn image(&self) -> ImageRef<'_> {
        match self {
            Assembly::Baseline(a) => a.image(),
            Assembly::Scan(a) => a.image(),
        }
    }
}

/// A streaming SSTV decoder.
pub struct Decoder {
    sample_rate: f64,
    vis_enabled: bool,
    scan_demux: bool,
    mode_hint: Option<Mode>,
    detected_mode: Option<Mode>,

    front: FrontEnd,
    tones: ToneBank,
    detector: SyncDetector,
    fm: FmDiscriminator,
    assembly: Option<Assembly>,

    image_ready: bool,
    errored: bool,
}

impl Decoder {
    /// Create a decoder for the given sample rate.
    pub fn new(sample_rate: f64) -> Result<Decoder> {
        if !(sample_rate > 0.0) {
            return config_error("rx: sample rate must be positive");
        }

        Ok(Decoder {
            sample_rate,
            vis_enabled: true,
            scan_demux: true,
            mode_hint: None,
            detected_mode: None,
            front: FrontEnd::new(sample_rate),
            tones: ToneBank::new(sample_rate),
            detector: SyncDetector::new(sample_rate),
            fm: FmDiscriminator::new(sample_rate),
            assembly: None,
            image_ready: false,
            errored: false,
        })
    }

    /// Suggest a mode ahead of detection. With VIS detection disabled the hint is adopted
    /// directly on the next feed; this is the only way to receive the narrow modes, which
    /// define no VIS code.
    pub fn set_mode_hint(&mut self, mode: Mode) {
        self.mode_hint = Some(mode);
    }

    /// Enable or disable VIS detection.
    pub fn set_vis_enabled(&mut self, enabled: bool) {
        self.vis_enabled = enabled;
    }

    /// Retune the mark and space detectors for non-standard VIS tones.
    pub fn set_vis_tones(&mut self, mark_hz: f64, space_hz: f64) -> Result<()> {
        if !(mark_hz > 0.0) || !(space_hz > 0.0) {
            return config_error("rx: vis tones must be positive");
        }
        self.tones.set_vis_tones(mark_hz, space_hz);
        Ok(())
    }

    /// Select the gain-control behavior.
    pub fn set_agc_mode(&mut self, mode: AgcMode) {
        self.front.agc().set_mode(mode);
    }

    /// The current gain-control behavior.
    pub fn agc_mode(&self) -> AgcMode {
        self.front.agc_mode()
    }

    /// Select the start-bit sensitivity preset, 0 (most sensitive) to 3.
    pub fn set_sense_level(&mut self, level: u8) {
        self.detector.set_sense_level(level);
    }

    /// Choose the picture assembly strategy for subsequent mode locks: the mode-aware
    /// scanline demultiplexer (default) or the mode-agnostic grayscale baseline.
    pub fn set_scan_demux(&mut self, enabled: bool) {
        self.scan_demux = enabled;
    }

    fn lock(&mut self, mode: Mode, skip_ms: f64) -> Result<()> {
        let assembly = if self.scan_demux {
            ScanAssembler::new(mode, self.sample_rate, skip_ms).map(Assembly::Scan)
        }
        else {
            ImageAssembler::new(mode, self.sample_rate).map(Assembly::Baseline)
        };

        match assembly {
            Some(assembly) => {
                self.detected_mode = Some(mode);
                self.assembly = Some(assembly);
                self.detector.force_lock();
                Ok(())
            }
            None => {
                error!("rx: picture buffer allocation failed");
                self.errored = true;
                resource_error("rx: picture buffer allocation failed")
            }
        }
    }

    /// Consume a block of samples.
    ///
    /// Samples are processed strictly in order; an empty block is a contract violation and
    /// changes no state. After a resource failure every call fails until [`reset`](Decoder::reset).
    pub fn feed(&mut self, samples: &[f32]) -> Result<RxStatus> {
        if self.errored {
            return resource_error("rx: decoder requires reset");
        }
        if samples.is_empty() {
            return contract_error("rx: empty sample buffer");
        }

        // Without VIS detection a configured hint stands in for the header; the picture then
        // begins at the first fed sample.
        if !self.vis_enabled && self.assembly.is_none() {
            if let Some(hint) = self.mode_hint {
                debug!("rx: adopting mode hint {}", hint.descriptor().name);
                self.lock(hint, 0.0)?;
            }
        }

        for &sample in samples {
            let acquired = self.detector.is_acquired();
            // Lift the [-1, 1] API samples onto the 16-bit scale the front end, tone
            // detectors, and sense thresholds are calibrated for.
            let d = self.front.process(f64::from(sample) * 32768.0, acquired);
            let energies = self.tones.process(d);

            if self.assembly.is_some() {
                let fm = &mut self.fm;
                let mut done = false;
                if let Some(assembly) = self.assembly.as_mut() {
                    if !assembly.is_complete() {
                        match assembly {
                            Assembly::Baseline(a) => a.process(&energies),
                            Assembly::Scan(a) => a.process(fm.process(d)),
                        }
                        done = assembly.is_complete();
                    }
                }
                if done {
                    self.image_ready = true;
                }
            }
            else if self.vis_enabled {
                if let Some(mode) = self.detector.process(&energies) {
                    self.lock(mode, VIS_TAIL_SKIP_MS)?;
                }
            }
        }

        Ok(self.status())
    }

    /// Convenience wrapper feeding a single sample.
    pub fn feed_sample(&mut self, sample: f32) -> Result<RxStatus> {
        self.feed(&[sample])
    }

    fn status(&self) -> RxStatus {
        if self.image_ready {
            RxStatus::ImageReady
        }
        else if self.assembly.is_some() || self.vis_enabled {
            RxStatus::NeedMore
        }
        else {
            RxStatus::Ok
        }
    }

    /// A diagnostic snapshot.
    pub fn state(&self) -> DecoderState {
        let (current_line, total_lines) = match self.assembly.as_ref() {
            Some(assembly) => (assembly.current_row(), assembly.image().height()),
            None => (0, 0),
        };

        DecoderState {
            current_mode: self.detected_mode.or(self.mode_hint),
            vis_enabled: self.vis_enabled,
            sync_detected: self.detector.state() != SyncState::Idle,
            image_ready: self.image_ready,
            current_line,
            total_lines,
        }
    }

    /// The assembled picture as a read-only RGB24 view. Fails until a picture is complete.
    pub fn image(&self) -> Result<ImageRef<'_>> {
        match self.assembly.as_ref() {
            Some(assembly) if self.image_ready => Ok(assembly.image()),
            _ => underflow_error("rx: no picture decoded yet"),
        }
    }

    /// Return the decoder to its initial state. Signal-path state, any in-flight picture, and
    /// the mode hint are discarded; configuration (VIS enable, sensitivity, gain control,
    /// retuned tones, assembly strategy) persists.
    pub fn reset(&mut self) {
        self.front.reset();
        self.tones.reset();
        self.detector.reset();
        self.fm.reset();
        self.assembly = None;
        self.detected_mode = None;
        self.mode_hint = None;
        self.image_ready = false;
        self.errored = false;
    }
}
