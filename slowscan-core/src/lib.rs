// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Shared structs, DSP primitives, and the mode registry for Project Slowscan.
//!
//! This crate provides the foundation the transmit (`slowscan-tx`) and receive
//! (`slowscan-rx`) cores are built on:
//!
//! * [`errors`] -- the common error and result types.
//! * [`image`] -- borrowed and owned pixel buffer views.
//! * [`modes`] -- the static registry of 43 SSTV modes and their scanline timing.
//! * [`color`] -- BT.601 conversion and the component-to-frequency mappings.
//! * [`dsp`] -- tank resonators, cascaded IIR, Kaiser FIR design, and convolvers.
//! * [`vco`] -- the table-lookup sine oscillator driving FM synthesis.
//! * [`vis`] -- VIS header constants, lookup tables, and the header tone generator.

pub mod color;
pub mod dsp;
pub mod errors;
pub mod image;
pub mod modes;
pub mod vco;
pub mod vis;
