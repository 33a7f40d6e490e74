// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![deny(missing_docs, clippy::all)]

//! Use the OS trust store with Rust HTTP clients, instead of a bundled CA file.
//!
//! The typical use case is a managed Mac where an MDM provisions certificates through the
//! keychain: a SCEP identity for client certificate authentication, and x509 payloads for
//! internal servers.  HTTP clients with a bundled root set never see either.  This crate reads
//! both from the keychain and feeds them into the TLS configuration surfaces of the Rust HTTP
//! ecosystem; it implements no TLS and no trust evaluation itself.
//!
//! ## Available integration surfaces
//!
//! - [`rustls::client_config`] builds a rustls client configuration whose trust anchors come
//!   from the OS trust store instead of a compiled-in root set.  This requires the `rustls`
//!   feature.
//! - [`reqwest::client_builder`] preconfigures a reqwest client accordingly, with an optional
//!   escape hatch to disable verification entirely.  This requires the `reqwest` feature.
//! - [`macos::secure_transport::SecureTransportConnector`] leaves the TLS handshake to the
//!   Security framework itself, verifying against keychain anchors and resolving the client
//!   identity by common name through the keychain rather than by file path.
//!
//! All three sit on the same keychain queries in [`macos::keychain`], exposed through the
//! [`TrustSource`] trait and the point-in-time [`Truststore`] snapshot.
//!
//! ## Failure behaviour
//!
//! Trust store queries which fail degrade to an empty result with a log message, never to an
//! error: an unreadable store behaves like an empty store, and the consuming HTTP client reports
//! the resulting verification failure in its TLS handshake.  See [`macos::keychain`].
//!
//! # Operating system support
//!
//! ## macOS
//!
//! Fully supported; see [`macos`].
//!
//! ## Windows and Linux
//!
//! Not supported.  The portable pieces of this crate compile everywhere, but there is no trust
//! store backend for these systems; use the `rustls-native-certs` crate instead.

mod error;
pub mod identity;
#[cfg(target_os = "macos")]
pub mod macos;
#[cfg(feature = "reqwest")]
pub mod reqwest;
#[cfg(feature = "rustls")]
pub mod rustls;
mod truststore;
mod types;

pub use error::Error;
pub use truststore::Truststore;
pub use types::TrustSource;

/// Capture a snapshot of the OS trust store.
///
/// Equivalent to [`Truststore::snapshot`] of [`macos::Keychain`].
#[cfg(target_os = "macos")]
pub fn truststore() -> Truststore {
    Truststore::snapshot(&macos::Keychain)
}
