// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Errors of the few operations in this crate which can fail.
//!
//! Failures while querying the OS trust store deliberately do not surface here: a store which
//! cannot be read behaves like an empty store, and the eventual TLS handshake reports the actual
//! verification failure.  See the crate documentation.

/// An error of a truststore operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Writing or removing a truststore file failed.
    #[error("Failed to write truststore file: {0}")]
    Io(#[from] std::io::Error),
    /// A TLS handshake through the Security framework failed.
    #[cfg(target_os = "macos")]
    #[error("TLS handshake failed: {0}")]
    Handshake(#[from] security_framework::base::Error),
}
