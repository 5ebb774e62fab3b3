//! BLAKE3 hashing helpers.
//!
//! The composer's gcid hash (spec §3) and the single-file-per-key name
//! used by [`crate::kvstore`] both go through BLAKE3, the same hashing
//! primitive the teacher pins as a security-critical dependency and
//! already reaches for in its insight cache.

/// Hash arbitrary bytes and return the lowercase hex digest.
#[must_use]
pub fn hex_digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hash a component's normalized serialization for use as a gcid's
/// `{hash}` segment. Truncated to 16 hex chars (64 bits) — enough to
/// make accidental collisions between distinct components astronomically
/// unlikely while keeping gcid strings short, matching the terse hash
/// suffixes real AppStream generators use.
#[must_use]
pub fn gcid_hash(normalized_serialization: &str) -> String {
    hex_digest(normalized_serialization.as_bytes())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identical_input_hashes_identically() {
        assert_eq!(gcid_hash("same"), gcid_hash("same"));
    }

    #[test]
    fn different_input_hashes_differently() {
        assert_ne!(gcid_hash("a"), gcid_hash("b"));
    }

    #[test]
    fn gcid_hash_is_sixteen_hex_chars() {
        let h = gcid_hash("anything");
        assert_eq!(h.len(), 16);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    proptest! {
        #[test]
        fn gcid_hash_is_always_sixteen_lowercase_hex_chars(input in ".*") {
            let h = gcid_hash(&input);
            prop_assert_eq!(h.len(), 16);
            prop_assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }

        #[test]
        fn gcid_hash_is_deterministic_for_any_input(input in ".*") {
            prop_assert_eq!(gcid_hash(&input), gcid_hash(&input));
        }

        #[test]
        fn hex_digest_is_always_sixty_four_lowercase_hex_chars(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let h = hex_digest(&bytes);
            prop_assert_eq!(h.len(), 64);
            prop_assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}
