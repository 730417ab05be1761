// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wire payload — optional language tag line followed by the PNG bytes.

use sha2::{Digest, Sha256};

use scanlink_core::types::LanguageSelector;

/// Immutable bytes written to the recognizer in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
    tag_len: usize,
    digest: String,
}

impl EncodedPayload {
    /// Prefix `png` with the language tag, if the selector has one.
    pub fn new(language: LanguageSelector, png: &[u8]) -> Self {
        let tag = language.tag_line().unwrap_or_default();
        let mut bytes = Vec::with_capacity(tag.len() + png.len());
        bytes.extend_from_slice(tag);
        bytes.extend_from_slice(png);

        let digest = hex::encode(Sha256::digest(&bytes));
        Self {
            bytes,
            tag_len: tag.len(),
            digest,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes following the tag line.
    pub fn image_bytes(&self) -> &[u8] {
        &self.bytes[self.tag_len..]
    }

    pub fn has_tag(&self) -> bool {
        self.tag_len > 0
    }

    /// Hex SHA-256 of the full payload, for logs.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}
