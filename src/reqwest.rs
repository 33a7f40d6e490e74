// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Preconfigure reqwest clients with a trust source.
//!
//! [`client_builder`] disables reqwest's built-in roots and adds the anchors of a
//! [`TrustSource`] instead, so certificate verification follows the OS trust store:
//!
//! ```ignore
//! let client = system_truststore::reqwest::client(&system_truststore::macos::Keychain)
//!     .expect("failed to build client");
//! ```
//!
//! This module requires the `reqwest` feature, which selects reqwest's rustls backend.

use crate::types::TrustSource;

/// Preconfigure a reqwest client builder with the anchors of `source`.
///
/// With `verify` the builder uses the rustls backend without reqwest's built-in roots, and adds
/// every anchor of `source` instead; anchors reqwest rejects are skipped with a debug log.
/// Further builder customization remains available to the caller.
///
/// Without `verify` the source is never queried and certificate verification is disabled
/// entirely.  Only do this for debugging.
pub fn client_builder<S: TrustSource>(source: &S, verify: bool) -> ::reqwest::ClientBuilder {
    let builder = ::reqwest::Client::builder().use_rustls_tls();
    if !verify {
        log::warn!("Certificate verification disabled; accepting any certificate");
        return builder.danger_accept_invalid_certs(true);
    }
    let mut builder = builder.tls_built_in_root_certs(false);
    for anchor in source.trust_anchors() {
        match ::reqwest::Certificate::from_der(&anchor) {
            Ok(cert) => builder = builder.add_root_certificate(cert),
            Err(error) => {
                log::debug!("Skipping trust anchor rejected by reqwest: {}", error);
            }
        }
    }
    builder
}

/// Build a reqwest client verifying certificates against `source`.
///
/// See [`client_builder`] to customize the client further.
pub fn client<S: TrustSource>(source: &S) -> ::reqwest::Result<::reqwest::Client> {
    client_builder(source, true).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    /// Count how often the source is queried.
    struct CountingSource(Cell<usize>);

    impl TrustSource for CountingSource {
        fn trust_anchors(&self) -> Vec<Vec<u8>> {
            self.0.set(self.0.get() + 1);
            vec![rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
                .unwrap()
                .cert
                .der()
                .to_vec()]
        }
    }

    #[test]
    fn verify_disabled_bypasses_the_source() {
        let source = CountingSource(Cell::new(0));
        client_builder(&source, false).build().unwrap();
        assert_eq!(source.0.get(), 0);
    }

    #[test]
    fn verify_enabled_queries_the_source_once() {
        let source = CountingSource(Cell::new(0));
        client_builder(&source, true).build().unwrap();
        assert_eq!(source.0.get(), 1);
    }

    #[test]
    fn client_builds_with_source_anchors() {
        let source = CountingSource(Cell::new(0));
        client(&source).unwrap();
        assert_eq!(source.0.get(), 1);
    }
}
