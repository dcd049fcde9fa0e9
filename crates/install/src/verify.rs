//! Streaming size and SHA-256 verification.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use toolpin_core::AssetDescriptor;

/// Hashes and counts bytes as they stream past.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    hasher: Sha256,
    size: u64,
}

impl Verifier {
    /// Start with nothing seen.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of downloaded bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.size += chunk.len() as u64;
    }

    /// Number of bytes seen so far.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Compare everything seen against `asset`. Size is checked first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SizeMismatch`] or [`Error::HashMismatch`], each
    /// naming `command`.
    pub fn verify(self, asset: &AssetDescriptor, command: &str) -> Result<()> {
        if self.size != asset.file_size {
            return Err(Error::SizeMismatch {
                command: command.to_string(),
                expected: asset.file_size,
                actual: self.size,
            });
        }

        let actual = hex::encode(self.hasher.finalize());
        if actual != asset.hash {
            return Err(Error::HashMismatch {
                command: command.to_string(),
                expected: asset.hash.clone(),
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolpin_core::ArchiveKind;

    // sha256("hello world")
    const HELLO: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    fn asset(hash: &str, file_size: u64) -> AssetDescriptor {
        AssetDescriptor {
            hash: hash.to_string(),
            url: "https://example.test/tool.gz".to_string(),
            file_size,
            file_name: "tool".to_string(),
            archive: ArchiveKind::Gz,
        }
    }

    #[test]
    fn test_chunked_input_matches() {
        let mut verifier = Verifier::new();
        verifier.update(b"hello");
        verifier.update(b" ");
        verifier.update(b"world");
        assert_eq!(verifier.size(), 11);
        assert!(verifier.verify(&asset(HELLO, 11), "GET u").is_ok());
    }

    #[test]
    fn test_size_checked_before_hash() {
        let mut verifier = Verifier::new();
        verifier.update(b"hello");
        let err = verifier.verify(&asset(&"0".repeat(64), 11), "GET u").unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 11,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_hash_mismatch_reports_actual() {
        let mut verifier = Verifier::new();
        verifier.update(b"hello world");
        let err = verifier
            .verify(&asset(&"0".repeat(64), 11), "curl -#fL u")
            .unwrap_err();
        match err {
            Error::HashMismatch {
                command, actual, ..
            } => {
                assert_eq!(command, "curl -#fL u");
                assert_eq!(actual, HELLO);
            }
            other => panic!("Expected HashMismatch, got {other:?}"),
        }
    }
}
