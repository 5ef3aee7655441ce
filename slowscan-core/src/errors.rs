// Slowscan
// Copyright (c) 2026 The Slowscan Project Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Slowscan.
#[derive(Debug)]
pub enum Error {
    /// A parameter was invalid at configuration time: an unknown mode name, a non-positive
    /// sample rate, or an image whose dimensions disagree with the selected mode.
    ConfigError(&'static str),
    /// The signal violated the transmission protocol and could not be decoded. Protocol errors
    /// are normally recovered internally by returning the decoder to its idle state; they only
    /// surface when the caller asks for something the protocol never delivered.
    ProtocolError(&'static str),
    /// An output was requested before the data required to produce it was supplied.
    Underflow(&'static str),
    /// A buffer required by the decoder could not be allocated. The decoder must be reset
    /// before continuing.
    ResourceExhausted(&'static str),
    /// The API contract was violated by the caller: an empty sample buffer, or a request that
    /// is invalid in the current state. No internal state is changed.
    ContractViolation(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::ConfigError(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
            Error::ProtocolError(msg) => {
                write!(f, "malformed signal: {}", msg)
            }
            Error::Underflow(msg) => {
                write!(f, "underflow: {}", msg)
            }
            Error::ResourceExhausted(msg) => {
                write!(f, "resource exhausted: {}", msg)
            }
            Error::ContractViolation(msg) => {
                write!(f, "contract violation: {}", msg)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a configuration error.
pub fn config_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::ConfigError(msg))
}

/// Convenience function to create a protocol error.
pub fn protocol_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::ProtocolError(msg))
}

/// Convenience function to create an underflow error.
pub fn underflow_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::Underflow(msg))
}

/// Convenience function to create a resource exhaustion error.
pub fn resource_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::ResourceExhausted(msg))
}

/// Convenience function to create a contract violation error.
pub fn contract_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::ContractViolation(msg))
}
