// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build rustls configurations from a trust source.
//!
//! This replaces the compiled-in root set a rustls client would otherwise use, e.g.
//! `webpki-roots`, with the anchors of a [`TrustSource`].  Pass the resulting
//! [`ClientConfig`] to whatever sits on top of rustls; for reqwest see the
//! [`crate::reqwest`] module.
//!
//! This module requires the `rustls` feature.

use std::sync::Arc;

use ::rustls::crypto::CryptoProvider;
use ::rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::CertificateDer;

use crate::types::TrustSource;

/// Build a rustls root store from the anchors of `source`.
///
/// Not every certificate in an OS trust store is a valid webpki trust anchor; anchors rejected
/// by rustls are skipped with a debug log, so one odd system certificate does not take down the
/// whole store.
pub fn root_cert_store<S: TrustSource>(source: &S) -> RootCertStore {
    let mut store = RootCertStore::empty();
    for anchor in source.trust_anchors() {
        if let Err(error) = store.add(CertificateDer::from(anchor)) {
            log::debug!("Skipping trust anchor not usable with rustls: {}", error);
        }
    }
    log::debug!("Built rustls root store with {} anchors", store.roots.len());
    store
}

/// Build a safe-default rustls client configuration trusting `source`, without client
/// authentication.
///
/// Uses the process-level default crypto provider; see [`client_config_with_provider`] for
/// explicit control.
pub fn client_config<S: TrustSource>(source: &S) -> ClientConfig {
    ClientConfig::builder()
        .with_root_certificates(root_cert_store(source))
        .with_no_client_auth()
}

/// Build a rustls client configuration trusting `source` with the given crypto `provider`.
///
/// Propagate any error of
/// [`with_safe_default_protocol_versions`][::rustls::ConfigBuilder::with_safe_default_protocol_versions].
pub fn client_config_with_provider<S: TrustSource>(
    source: &S,
    provider: Arc<CryptoProvider>,
) -> Result<ClientConfig, ::rustls::Error> {
    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(root_cert_store(source))
        .with_no_client_auth())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Truststore;
    use pretty_assertions::assert_eq;

    fn test_cert_der() -> Vec<u8> {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .unwrap()
            .cert
            .der()
            .to_vec()
    }

    #[test]
    fn root_cert_store_from_empty_source() {
        let store = root_cert_store(&Truststore::from_der_certs(Vec::new()));
        assert_eq!(store.roots.len(), 0);
    }

    #[test]
    fn root_cert_store_adds_valid_anchors() {
        let source = Truststore::from_der_certs(vec![test_cert_der()]);
        assert_eq!(root_cert_store(&source).roots.len(), 1);
    }

    #[test]
    fn root_cert_store_skips_invalid_anchors() {
        let source =
            Truststore::from_der_certs(vec![b"not a certificate".to_vec(), test_cert_der()]);
        assert_eq!(root_cert_store(&source).roots.len(), 1);
    }

    #[test]
    fn client_config_with_explicit_provider() {
        let source = Truststore::from_der_certs(vec![test_cert_der()]);
        let provider = Arc::new(::rustls::crypto::aws_lc_rs::default_provider());
        let config = client_config_with_provider(&source, provider).unwrap();
        assert!(config.alpn_protocols.is_empty());
    }
}
