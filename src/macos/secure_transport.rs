// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TLS through the Security framework itself.
//!
//! Instead of exporting keychain anchors into a Rust TLS stack, [`SecureTransportConnector`]
//! drives the Security framework's own TLS implementation over a caller-supplied stream.  Server
//! certificates are verified against the keychain anchors captured at construction, and the
//! client identity, if requested, is resolved by common name through
//! [`crate::macos::keychain::client_identity`] rather than loaded from a file.
//!
//! This is a blocking API; Secure Transport is deprecated by Apple but still the only keychain
//! native TLS surface with a stable C interface.

use std::io::{Read, Write};

use security_framework::certificate::SecCertificate;
use security_framework::identity::SecIdentity;
use security_framework::secure_transport::{ClientBuilder, ClientHandshakeError, SslStream};

use super::keychain;
use crate::Error;

/// Connect TLS streams verified by the macOS keychain.
pub struct SecureTransportConnector {
    anchors: Vec<SecCertificate>,
    identity: Option<SecIdentity>,
}

static_assertions::assert_impl_all!(SecureTransportConnector: Send, Sync);

impl SecureTransportConnector {
    /// Create a connector trusting the current keychain anchors.
    ///
    /// Captures all trusted certificates and system roots once; create a new connector to pick
    /// up later keychain changes.
    pub fn new() -> Self {
        let mut anchors = keychain::trusted_certs();
        anchors.extend(keychain::system_roots());
        Self {
            anchors,
            identity: None,
        }
    }

    /// Use the keychain identity with the given common `name` for client authentication.
    ///
    /// If no identity matches, the connector proceeds without a client certificate; servers
    /// which require one will then reject the handshake.
    pub fn with_client_identity(mut self, name: &str) -> Self {
        self.identity = keychain::client_identity(name);
        self
    }

    /// Perform a TLS handshake with `domain` over `stream`.
    ///
    /// `domain` is the host name presented for SNI and certificate verification.  The server
    /// certificate is verified against this connector's anchors only.
    pub fn connect<S: Read + Write>(&self, domain: &str, stream: S) -> Result<SslStream<S>, Error> {
        let mut builder = ClientBuilder::new();
        builder.anchor_certificates(&self.anchors);
        builder.trust_anchor_certificates_only(true);
        if let Some(ref identity) = self.identity {
            builder.identity(identity, &[]);
        }
        let mut result = builder.handshake(domain, stream);
        loop {
            match result {
                Ok(stream) => return Ok(stream),
                Err(ClientHandshakeError::Failure(error)) => return Err(error.into()),
                // Non-blocking streams surface spurious interruptions; retry until the
                // handshake completes or fails.
                Err(ClientHandshakeError::Interrupted(mid)) => result = mid.handshake(),
            }
        }
    }
}

impl Default for SecureTransportConnector {
    fn default() -> Self {
        Self::new()
    }
}
