// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Select a client identity among keychain candidates.
//!
//! The keychain is queried by a human-readable name, so a query can match more than one identity,
//! e.g. when an MDM has re-issued a SCEP certificate under the same name and the old one is still
//! around.  [`select_identity`] makes that choice deterministic: only candidates whose subject
//! common name equals the requested name exactly are considered, and among those the one with the
//! latest expiration date wins.
//!
//! The selection itself is independent of the OS; the keychain backend in [`crate::macos`] maps
//! its search results into [`IdentityCandidate`]s and delegates here.

use x509_parser::prelude::{FromDer, X509Certificate};

/// A candidate for client identity selection.
///
/// `T` is whatever handle the OS search returned for the identity; the selection logic only
/// inspects the certificate fields extracted alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityCandidate<T> {
    /// The subject common name of the candidate's certificate.
    pub common_name: String,
    /// The `notAfter` date of the candidate's certificate, as Unix timestamp.
    pub not_after: i64,
    /// The identity handle itself.
    pub identity: T,
}

impl<T> IdentityCandidate<T> {
    /// Create a candidate from the DER encoding of an identity's certificate.
    ///
    /// Extract the subject common name and the expiration date from `der`.  Return `None` if the
    /// certificate does not parse or has no common name; such identities can never match a
    /// requested name and are dropped from selection.
    pub fn from_der(der: &[u8], identity: T) -> Option<Self> {
        let (_, cert) = X509Certificate::from_der(der).ok()?;
        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())?
            .to_owned();
        Some(Self {
            common_name,
            not_after: cert.validity().not_after.timestamp(),
            identity,
        })
    }
}

/// Select the identity to use for the requested common `name`.
///
/// Keep only candidates whose common name equals `name` exactly; a keychain search matches on
/// substrings, so a request for `client` must not select `client-old`.  Among the remaining
/// candidates return the one with the latest expiration date; on equal dates the candidate
/// returned later by the underlying query wins.
///
/// Return `None` if no candidate remains.  Callers then proceed without a client certificate
/// rather than failing.
pub fn select_identity<T>(name: &str, candidates: Vec<IdentityCandidate<T>>) -> Option<T> {
    candidates
        .into_iter()
        .filter(|candidate| candidate.common_name == name)
        .max_by_key(|candidate| candidate.not_after)
        .map(|candidate| candidate.identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidate(common_name: &str, not_after: i64, identity: &'static str) -> IdentityCandidate<&'static str> {
        IdentityCandidate {
            common_name: common_name.to_string(),
            not_after,
            identity,
        }
    }

    #[test]
    fn select_identity_no_candidates() {
        assert_eq!(select_identity::<&str>("client", Vec::new()), None);
    }

    #[test]
    fn select_identity_no_exact_match() {
        // A keychain subject search would return both of these for "client".
        let candidates = vec![
            candidate("client-old", 1000, "old"),
            candidate("my client", 2000, "spaced"),
        ];
        assert_eq!(select_identity("client", candidates), None);
    }

    #[test]
    fn select_identity_single_match() {
        let candidates = vec![
            candidate("client", 1000, "exact"),
            candidate("client-old", 2000, "substring"),
        ];
        assert_eq!(select_identity("client", candidates), Some("exact"));
    }

    #[test]
    fn select_identity_latest_expiration_wins() {
        let candidates = vec![
            candidate("client", 2000, "renewed"),
            candidate("client", 1000, "expiring"),
            candidate("client", 3000, "latest"),
        ];
        assert_eq!(select_identity("client", candidates), Some("latest"));
    }

    #[test]
    fn select_identity_equal_expiration_is_deterministic() {
        let candidates = vec![
            candidate("client", 1000, "first"),
            candidate("client", 1000, "second"),
        ];
        assert_eq!(select_identity("client", candidates), Some("second"));
    }

    #[test]
    fn candidate_from_der() {
        let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()]).unwrap();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "test client");
        params.not_after = rcgen::date_time_ymd(2031, 1, 1);
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();

        let candidate = IdentityCandidate::from_der(cert.der(), "id").unwrap();
        assert_eq!(candidate.common_name, "test client");
        assert_eq!(
            candidate.not_after,
            rcgen::date_time_ymd(2031, 1, 1).unix_timestamp()
        );
        assert_eq!(candidate.identity, "id");
    }

    #[test]
    fn candidate_from_garbage_der() {
        assert_eq!(IdentityCandidate::from_der(b"not a certificate", "id"), None);
    }
}
