// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity: SHA-256 content addressing of uploads.

use docurex_core::error::DocurexError;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Content address of an uploaded file.
///
/// Digest input is the file name, the decimal byte size, and the raw file
/// bytes, concatenated with no separator.  For UTF-8 files this equals the
/// digest of the string `name + size + text`.
pub fn hash_upload(name: &str, size: u64, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(size.to_string().as_bytes());
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Verify that `data` matches the expected SHA-256 hex digest.
///
/// Returns `Err(DocurexError::IntegrityMismatch)` with the expected and
/// actual values when it does not.
pub fn verify_hash(data: &[u8], expected_hex: &str) -> Result<(), DocurexError> {
    let actual = hash_bytes(data);
    if actual.eq_ignore_ascii_case(expected_hex) {
        Ok(())
    } else {
        Err(DocurexError::IntegrityMismatch {
            expected: expected_hex.to_owned(),
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty byte slice (well-known constant).
    const EMPTY_SHA256: &str =
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(hash_bytes(b""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(hash_bytes(b"hello"), expected);
    }

    #[test]
    fn upload_hash_is_concatenation_of_fields() {
        assert_eq!(
            hash_upload("report.pdf", 500, b"X"),
            hash_bytes(b"report.pdf500X")
        );
    }

    #[test]
    fn upload_hash_is_deterministic_and_fixed_length() {
        let a = hash_upload("lab.txt", 3, b"abc");
        let b = hash_upload("lab.txt", 3, b"abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn upload_hash_changes_with_each_field() {
        let base = hash_upload("lab.txt", 3, b"abc");
        assert_ne!(base, hash_upload("lab2.txt", 3, b"abc"));
        assert_ne!(base, hash_upload("lab.txt", 4, b"abc"));
        assert_ne!(base, hash_upload("lab.txt", 3, b"abd"));
    }

    #[test]
    fn binary_content_hashes_stably() {
        let bytes = [0xff, 0xfe, 0x00, 0x80];
        assert_eq!(
            hash_upload("scan.png", 4, &bytes),
            hash_upload("scan.png", 4, &bytes)
        );
        assert_ne!(
            hash_upload("scan.png", 4, &bytes),
            hash_upload("scan.png", 4, &[0xff, 0xfe, 0x00, 0x81])
        );
    }

    #[test]
    fn verify_matching_hash() {
        let data = b"docurex";
        assert!(verify_hash(data, &hash_bytes(data)).is_ok());
    }

    #[test]
    fn verify_mismatched_hash() {
        match verify_hash(b"a", "0000") {
            Err(DocurexError::IntegrityMismatch { expected, actual }) => {
                assert_eq!(expected, "0000");
                assert_eq!(actual, hash_bytes(b"a"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
