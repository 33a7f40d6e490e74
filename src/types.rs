// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Provide TLS trust anchors.
pub trait TrustSource {
    /// Get all trust anchors of this source.
    ///
    /// Return the DER encoding of every certificate the source currently considers a trust
    /// anchor, in whatever order the underlying store returns them.  Return an empty vector if
    /// the source has no anchors or if querying the underlying store failed; a source never
    /// returns a partial result.
    fn trust_anchors(&self) -> Vec<Vec<u8>>;
}

impl<T: TrustSource + ?Sized> TrustSource for &T {
    fn trust_anchors(&self) -> Vec<Vec<u8>> {
        (**self).trust_anchors()
    }
}
