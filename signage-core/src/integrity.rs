// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content checksums for change detection
//!
//! Manifests and downloaded files are compared against the checksums the
//! CMS advertises. A matching checksum means the local copy is current and
//! no network or disk work is needed.
//!
//! Checksums the crate computes are SHA-256 in the form `"sha256:<hex>"`.
//! Expected values may also name MD5, either as `"md5:<hex>"` or as the
//! bare 32-digit hex string the CMS sends in its file lists.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};
use ring::digest::{Context, SHA256};
use thiserror::Error;

const SHA256_PREFIX: &str = "sha256:";
const MD5_PREFIX: &str = "md5:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Sha256,
    Md5,
}

impl Algorithm {
    fn hex_len(self) -> usize {
        match self {
            Algorithm::Sha256 => 64,
            Algorithm::Md5 => 32,
        }
    }
}

/// Running digest for either algorithm
enum Hasher {
    Sha256(Context),
    Md5(Md5),
}

impl Hasher {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha256 => Hasher::Sha256(Context::new(&SHA256)),
            Algorithm::Md5 => Hasher::Md5(Md5::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(context) => context.update(data),
            Hasher::Md5(md5) => md5.update(data),
        }
    }

    fn finish_hex(self) -> String {
        match self {
            Hasher::Sha256(context) => hex::encode(context.finish().as_ref()),
            Hasher::Md5(md5) => hex::encode(md5.finalize()),
        }
    }
}

/// Splits an expected checksum into its algorithm and hex digest.
fn parse_expected(expected: &str) -> Result<(Algorithm, &str), IntegrityError> {
    let expected = expected.trim();
    let (algorithm, digest) = if let Some(digest) = expected.strip_prefix(SHA256_PREFIX) {
        (Algorithm::Sha256, digest)
    } else if let Some(digest) = expected.strip_prefix(MD5_PREFIX) {
        (Algorithm::Md5, digest)
    } else {
        (Algorithm::Md5, expected)
    };

    if digest.len() == algorithm.hex_len() && digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok((algorithm, digest))
    } else {
        Err(IntegrityError::InvalidFormat(expected.to_string()))
    }
}

/// Checks `data` against an expected checksum.
///
/// The algorithm is taken from `expected`: `sha256:<hex>`, `md5:<hex>` or
/// a bare MD5 hex digest. Hex comparison ignores case.
///
/// ```
/// use signage_core::integrity::{compute_checksum, verify_checksum};
///
/// assert!(verify_checksum(b"hello world", &compute_checksum(b"hello world")).is_ok());
/// assert!(verify_checksum(b"hello world", "5eb63bbbe01eeed093cb22bb8f5acdc3").is_ok());
/// ```
pub fn verify_checksum(data: &[u8], expected: &str) -> Result<(), IntegrityError> {
    let (algorithm, expected_hex) = parse_expected(expected)?;

    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);

    compare(expected_hex, hasher.finish_hex())
}

/// SHA-256 checksum of `data` as `"sha256:<hex>"`
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Hasher::new(Algorithm::Sha256);
    hasher.update(data);
    format!("{}{}", SHA256_PREFIX, hasher.finish_hex())
}

/// SHA-256 checksum of a file on disk, read in chunks.
pub fn checksum_file(path: &Path) -> io::Result<String> {
    digest_file(path, Algorithm::Sha256).map(|hex| format!("{}{}", SHA256_PREFIX, hex))
}

fn digest_file(path: &Path, algorithm: Algorithm) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new(algorithm);
    let mut buf = [0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(hasher.finish_hex())
}

/// Returns true if `path` is a non-empty regular file whose checksum
/// equals `expected`.
///
/// Missing, empty or unreadable files never match, and neither does a
/// malformed `expected` value. Callers treat a non-match as "fetch it".
pub fn file_matches(path: &Path, expected: &str) -> bool {
    let Ok((algorithm, expected_hex)) = parse_expected(expected) else {
        return false;
    };

    match path.metadata() {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {}
        _ => return false,
    }

    match digest_file(path, algorithm) {
        Ok(actual) => compare(expected_hex, actual).is_ok(),
        Err(_) => false,
    }
}

fn compare(expected_hex: &str, actual_hex: String) -> Result<(), IntegrityError> {
    if actual_hex.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(IntegrityError::ChecksumMismatch {
            expected: expected_hex.to_string(),
            actual: actual_hex,
        })
    }
}

/// Errors from checksum verification
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// Not a `sha256:`, `md5:` or bare MD5 hex checksum
    #[error("unrecognized checksum {0:?}")]
    InvalidFormat(String),

    /// Content hashed to a different value
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Expected hex digest
        expected: String,
        /// Computed hex digest
        actual: String,
    },
}
