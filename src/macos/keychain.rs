// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Query the macOS keychain for trusted certificates and client identities.
//!
//! All functions in this module degrade to an empty result if the Security framework reports an
//! error, and log the failure with [`log::warn!`].  Callers therefore see "no trusted
//! certificates" or "no identity found", and the actual verification failure surfaces later in
//! the TLS handshake of the consuming HTTP client.  Use `RUST_LOG` style logging configuration in
//! the consuming application to make these failures visible.

use security_framework::base::Error as SecurityError;
use security_framework::certificate::SecCertificate;
use security_framework::identity::SecIdentity;
use security_framework::item::{ItemClass, ItemSearchOptions, Limit, Reference, SearchResult};
use security_framework::os::macos::item::ItemSearchOptionsExt;
use security_framework::os::macos::keychain::SecKeychain;
use security_framework::trust_settings::{Domain, TrustSettings, TrustSettingsForCertificate};

use crate::identity::{select_identity, IdentityCandidate};

/// The keychain holding the immutable system root certificates.
const SYSTEM_ROOTS_KEYCHAIN: &str = "/System/Library/Keychains/SystemRootCertificates.keychain";

/// Get all trusted certificates from the user and admin trust-settings domains.
///
/// A certificate counts as trusted if its TLS trust settings mark it as a trust root, either
/// built-in or promoted by the user ("Always Trust" in Keychain Access).  Certificates the user
/// explicitly distrusts are skipped.
///
/// Return an empty vector if the trust settings cannot be read.
pub fn trusted_certs() -> Vec<SecCertificate> {
    let mut certs = Vec::new();
    for domain in [Domain::User, Domain::Admin] {
        match trusted_certs_in(domain) {
            Ok(mut domain_certs) => certs.append(&mut domain_certs),
            Err(error) => {
                log::warn!(
                    "Failed to read trust settings in domain {:?}: {}",
                    domain,
                    error
                );
            }
        }
    }
    certs
}

fn trusted_certs_in(domain: Domain) -> Result<Vec<SecCertificate>, SecurityError> {
    let trust_settings = TrustSettings::new(domain);
    let mut certs = Vec::new();
    for cert in trust_settings.iter()? {
        let settings = trust_settings.tls_trust_settings_for_certificate(&cert)?;
        // Certificates without explicit TLS trust settings inherit the default of their
        // domain, which is "trusted" only in the system domain.
        let trusted = match settings {
            Some(TrustSettingsForCertificate::TrustRoot)
            | Some(TrustSettingsForCertificate::TrustAsRoot) => true,
            None => matches!(domain, Domain::System),
            Some(_) => false,
        };
        if trusted {
            certs.push(cert);
        }
    }
    Ok(certs)
}

/// Get all certificates from the system roots keychain.
///
/// Every certificate in this keychain is implicitly trusted.  If the keychain cannot be opened by
/// path, e.g. on a future macOS release which moves it, fall back to the system trust-settings
/// domain which covers the same set.
///
/// Return an empty vector if neither query succeeds.
pub fn system_roots() -> Vec<SecCertificate> {
    match system_roots_from_keychain() {
        Ok(certs) => certs,
        Err(error) => {
            log::warn!(
                "Failed to read {}, falling back to system trust settings: {}",
                SYSTEM_ROOTS_KEYCHAIN,
                error
            );
            trusted_certs_in(Domain::System).unwrap_or_else(|error| {
                log::warn!("Failed to read system domain trust settings: {}", error);
                Vec::new()
            })
        }
    }
}

fn system_roots_from_keychain() -> Result<Vec<SecCertificate>, SecurityError> {
    let keychain = SecKeychain::open(SYSTEM_ROOTS_KEYCHAIN)?;
    let results = ItemSearchOptions::new()
        .class(ItemClass::certificate())
        .keychains(&[keychain])
        .load_refs(true)
        .limit(Limit::All)
        .search()?;
    Ok(results
        .into_iter()
        .filter_map(|result| match result {
            SearchResult::Ref(Reference::Certificate(cert)) => Some(cert),
            _ => None,
        })
        .collect())
}

/// Find the client identity for the given common `name`.
///
/// Query all identities in the current keychain search list, keep those whose certificate subject
/// common name equals `name` exactly, and return the one with the latest expiration date; see
/// [`crate::identity::select_identity`] for the precise rule.
///
/// Return `None` if no identity matches or the keychain query fails; callers then proceed without
/// a client certificate and let the server reject the connection if it requires one.
pub fn client_identity(name: &str) -> Option<SecIdentity> {
    let identities = match all_identities() {
        Ok(identities) => identities,
        Err(error) => {
            log::warn!("Failed to search keychain identities: {}", error);
            return None;
        }
    };
    let candidates = identities
        .into_iter()
        .filter_map(|identity| {
            let cert = identity.certificate().ok()?;
            IdentityCandidate::from_der(&cert.to_der(), identity)
        })
        .collect();
    let selected = select_identity(name, candidates);
    if selected.is_none() {
        log::debug!("No keychain identity with common name {}", name);
    }
    selected
}

fn all_identities() -> Result<Vec<SecIdentity>, SecurityError> {
    let results = ItemSearchOptions::new()
        .class(ItemClass::identity())
        .load_refs(true)
        .limit(Limit::All)
        .search()?;
    Ok(results
        .into_iter()
        .filter_map(|result| match result {
            SearchResult::Ref(Reference::Identity(identity)) => Some(identity),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // These touch the real keychain of the host running the tests.

    #[test]
    fn system_roots_are_not_empty() {
        // Every macOS installation ships system roots.
        assert!(!system_roots().is_empty());
    }

    #[test]
    fn client_identity_for_unknown_name() {
        assert!(client_identity("system_truststore test identity which does not exist").is_none());
    }
}
