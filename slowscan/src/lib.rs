// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Slowscan
//!
//! Slowscan is a pure Rust Slow-Scan Television (SSTV) codec: it converts still images into
//! the narrow-band FM audio signals that carry them over voice channels, and recovers images
//! from such signals.
//!
//! Roughly 43 standardized modes are supported (Robot, Scottie, Martin, SC2, PD, Pasokon,
//! MR/MP/ML, the narrow MN/MC variants, and B/W), each with its own scanline geometry, color
//! ordering, and VIS identification.
//!
//! # Transmitting
//!
//! Create a [`tx::Encoder`] for a mode, borrow it an image of exactly the mode's geometry,
//! and pull `f32` samples in `[-1, +1]` with `generate` until it reports completion. The
//! encoder renders a tuning preamble, the VIS header, and every scanline, all with
//! sample-exact timing.
//!
//! # Receiving
//!
//! Create an [`rx::Decoder`] for your sample rate and push mono `f32` samples into `feed`.
//! Once a VIS header locks a mode the decoder allocates the picture buffer and fills it row
//! by row; `feed` returns [`rx::RxStatus::ImageReady`] when the picture is complete, after
//! which `image` exposes an RGB24 view.
//!
//! Sample rates from 8 to 96 kHz are supported; 48 kHz is canonical. WAV framing, image
//! scaling, and file I/O are deliberately left to the caller.

pub use slowscan_core as core;
pub use slowscan_rx as rx;
pub use slowscan_tx as tx;

pub use slowscan_core::errors::{Error, Result};
pub use slowscan_core::image::{ImageBuffer, ImageRef, PixelFormat};
pub use slowscan_core::modes::{
    all_modes, descriptor, dimensions, find_mode_by_name, Mode, ModeDescriptor,
};
