// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A point-in-time snapshot of a trust store.
//!
//! [`Truststore`] captures the trust anchors of a [`TrustSource`] once, and serves them as a
//! PEM-encoded blob, either in memory via [`Truststore::pem_data`] or as a temporary file via
//! [`Truststore::persist`] for HTTP clients which only accept a CA bundle path.
//!
//! A snapshot is never invalidated automatically: if the underlying store changes, call
//! [`Truststore::refresh`] to capture it again.

use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;

use crate::types::TrustSource;
use crate::Error;

/// Width of base64 lines in PEM output, per RFC 7468.
const PEM_LINE_WIDTH: usize = 64;

/// PEM-encode a single DER certificate.
fn pem_armor(der: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(b"-----BEGIN CERTIFICATE-----\n");
    let encoded = STANDARD.encode(der);
    for line in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
        out.extend_from_slice(line);
        out.push(b'\n');
    }
    out.extend_from_slice(b"-----END CERTIFICATE-----\n");
}

/// A point-in-time snapshot of the trust anchors of a [`TrustSource`].
#[derive(Debug, Default)]
pub struct Truststore {
    anchors: Vec<Vec<u8>>,
    file: Option<NamedTempFile>,
}

static_assertions::assert_impl_all!(Truststore: Send, Sync);

impl Truststore {
    /// Capture the current trust anchors of `source`.
    ///
    /// If the source fails to provide anchors the snapshot is empty; certificate verification
    /// against an empty snapshot then fails in the TLS handshake of the consuming HTTP client.
    pub fn snapshot<S: TrustSource>(source: &S) -> Self {
        let anchors = source.trust_anchors();
        log::debug!("Captured truststore snapshot with {} anchors", anchors.len());
        Self {
            anchors,
            file: None,
        }
    }

    /// Create a snapshot directly from DER-encoded certificates.
    pub fn from_der_certs(anchors: Vec<Vec<u8>>) -> Self {
        Self {
            anchors,
            file: None,
        }
    }

    /// Whether this snapshot contains no trust anchors.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// The number of trust anchors in this snapshot.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Capture the trust anchors of `source` again.
    ///
    /// Only needed if the underlying store changed after this snapshot was taken.  If the
    /// snapshot was persisted rewrite the truststore file in place, so paths handed out by
    /// [`Truststore::persist`] remain valid.
    pub fn refresh<S: TrustSource>(&mut self, source: &S) -> Result<(), Error> {
        self.anchors = source.trust_anchors();
        if let Some(ref mut file) = self.file {
            let data = pem_data_of(&self.anchors);
            let file = file.as_file_mut();
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&data)?;
            file.flush()?;
            log::debug!("Rewrote truststore file with {} anchors", self.anchors.len());
        }
        Ok(())
    }

    /// The PEM encoding of all trust anchors in this snapshot.
    ///
    /// Return the concatenated PEM blocks of all anchors, or an empty vector if the snapshot is
    /// empty.  The result is never a partial blob.
    pub fn pem_data(&self) -> Vec<u8> {
        pem_data_of(&self.anchors)
    }

    /// Write the PEM data of this snapshot to a temporary file.
    ///
    /// Create the file on first call and return its path; subsequent calls return the same path
    /// without rewriting.  Each snapshot owns at most one file.  The file is removed when the
    /// snapshot is dropped, but not if the process exits without unwinding.
    pub fn persist(&mut self) -> Result<&Path, Error> {
        if self.file.is_none() {
            let mut file = NamedTempFile::new()?;
            file.write_all(&self.pem_data())?;
            file.flush()?;
            log::debug!("Wrote truststore file {}", file.path().display());
            self.file = Some(file);
        }
        // The branch above ensures the file exists.
        Ok(self.file.as_ref().unwrap().path())
    }
}

fn pem_data_of(anchors: &[Vec<u8>]) -> Vec<u8> {
    let mut data = Vec::new();
    for anchor in anchors {
        pem_armor(anchor, &mut data);
    }
    data
}

impl TrustSource for Truststore {
    fn trust_anchors(&self) -> Vec<Vec<u8>> {
        self.anchors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct FixedSource(Vec<Vec<u8>>);

    impl TrustSource for FixedSource {
        fn trust_anchors(&self) -> Vec<Vec<u8>> {
            self.0.clone()
        }
    }

    fn test_cert_der() -> Vec<u8> {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
            .unwrap()
            .cert
            .der()
            .to_vec()
    }

    #[test]
    fn empty_snapshot_has_empty_pem_data() {
        let store = Truststore::from_der_certs(Vec::new());
        assert!(store.is_empty());
        assert_eq!(store.pem_data(), Vec::<u8>::new());
    }

    #[test]
    fn failing_source_yields_empty_snapshot() {
        // A source which cannot read its store reports no anchors at all.
        let store = Truststore::snapshot(&FixedSource(Vec::new()));
        assert!(store.is_empty());
        assert_eq!(store.pem_data(), Vec::<u8>::new());
    }

    #[test]
    fn pem_data_decodes_to_the_same_der() {
        let der = test_cert_der();
        let store = Truststore::from_der_certs(vec![der.clone()]);
        let pem_data = store.pem_data();
        let (rem, pem) = x509_parser::pem::parse_x509_pem(&pem_data).unwrap();
        assert_eq!(pem.label, "CERTIFICATE");
        assert_eq!(pem.contents, der);
        assert!(rem.is_empty());
    }

    #[test]
    fn pem_data_wraps_lines() {
        let store = Truststore::from_der_certs(vec![test_cert_der()]);
        let data = String::from_utf8(store.pem_data()).unwrap();
        let lines = data.lines().collect::<Vec<_>>();
        assert_eq!(lines.first(), Some(&"-----BEGIN CERTIFICATE-----"));
        assert_eq!(lines.last(), Some(&"-----END CERTIFICATE-----"));
        for line in &lines[1..lines.len() - 1] {
            assert!(line.len() <= PEM_LINE_WIDTH, "line too long: {}", line);
        }
    }

    #[test]
    fn pem_data_concatenates_all_anchors() {
        let store = Truststore::from_der_certs(vec![test_cert_der(), test_cert_der()]);
        let data = String::from_utf8(store.pem_data()).unwrap();
        assert_eq!(data.matches("-----BEGIN CERTIFICATE-----").count(), 2);
        assert_eq!(data.matches("-----END CERTIFICATE-----").count(), 2);
    }

    #[test]
    fn persist_writes_pem_data_once() {
        let mut store = Truststore::from_der_certs(vec![test_cert_der()]);
        let path = store.persist().unwrap().to_owned();
        assert_eq!(std::fs::read(&path).unwrap(), store.pem_data());
        // A second call must not create a new file.
        assert_eq!(store.persist().unwrap(), path.as_path());
    }

    #[test]
    fn file_is_removed_on_drop() {
        let mut store = Truststore::from_der_certs(vec![test_cert_der()]);
        let path = store.persist().unwrap().to_owned();
        assert!(path.exists());
        drop(store);
        assert!(!path.exists());
    }

    #[test]
    fn refresh_rewrites_persisted_file() {
        let mut store = Truststore::snapshot(&FixedSource(vec![test_cert_der()]));
        let path = store.persist().unwrap().to_owned();

        store.refresh(&FixedSource(Vec::new())).unwrap();
        assert!(store.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn snapshot_is_a_trust_source() {
        let anchors = vec![test_cert_der()];
        let store = Truststore::from_der_certs(anchors.clone());
        assert_eq!(store.trust_anchors(), anchors);
    }
}
