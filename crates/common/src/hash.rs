//! Content digests for uploaded bundles.

use blake2::{digest::typenum::U32, Blake2b, Digest};

/// Prefix that marks a digest embedded into free-form text.
pub const DIGEST_PREFIX: &str = "blake2:";

/// Blake2b-256 digest of the provided bytes.
pub fn blake2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hex-encoded digest of the provided bytes, tagged with [`DIGEST_PREFIX`].
pub fn tagged_digest(data: &[u8]) -> String {
    format!("{DIGEST_PREFIX}{}", hex::encode(blake2(data)))
}

/// Find a tagged digest inside of some free-form text, such as a version description.
pub fn find_tagged_digest(text: &str) -> Option<&str> {
    let start = text.find(DIGEST_PREFIX)?;
    let digest = &text[start..];
    let len = DIGEST_PREFIX.len()
        + digest[DIGEST_PREFIX.len()..]
            .chars()
            .take_while(char::is_ascii_hexdigit)
            .count();

    (len > DIGEST_PREFIX.len()).then(|| &digest[..len])
}
