// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Access the trust store of macOS.
//!
//! The [`keychain`] submodule queries the Security framework for trusted certificates and client
//! identities.  The [`secure_transport`] submodule goes one step further and leaves the entire
//! TLS handshake to the Security framework, for callers which want the OS to do the verification
//! instead of exporting anchors into a Rust TLS stack.
//!
//! This module exports [`Keychain`] as the live trust source of this platform: it re-queries the
//! keychain on every call to [`crate::TrustSource::trust_anchors`].  Use
//! [`crate::Truststore::snapshot`] to capture its state once.

use crate::types::TrustSource;

pub mod keychain;
pub mod secure_transport;

/// The live macOS keychain as a trust source.
///
/// Combines all trusted certificates from the user and admin trust-settings domains with the
/// system root certificates; see [`keychain::trusted_certs`] and [`keychain::system_roots`].  No
/// deduplication or ordering is applied beyond what the keychain queries return.
#[derive(Debug, Clone, Copy, Default)]
pub struct Keychain;

static_assertions::assert_impl_all!(Keychain: Send, Sync);

impl TrustSource for Keychain {
    fn trust_anchors(&self) -> Vec<Vec<u8>> {
        let mut anchors = keychain::trusted_certs()
            .iter()
            .map(|cert| cert.to_der())
            .collect::<Vec<_>>();
        anchors.extend(keychain::system_roots().iter().map(|cert| cert.to_der()));
        anchors
    }
}
