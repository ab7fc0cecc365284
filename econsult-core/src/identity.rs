//! Identity types: record ids, timestamps and content fingerprints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned by the persistence gateway. Monotonically increasing,
/// never reused.
pub type RecordId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Per-request correlation id (UUIDv7, timestamp-sortable). Never persisted.
pub type SubmissionId = Uuid;

/// Generate a new submission id.
pub fn new_submission_id() -> SubmissionId {
    Uuid::now_v7()
}

/// Deterministic cache key derived from normalized submission text.
///
/// The key is the first eight bytes of a BLAKE3 digest over the trimmed UTF-8
/// text, so it is stable across calls and across process restarts. Letter
/// case is preserved.
///
/// Distinct texts may collide on 64 bits. A collision makes two texts share a
/// cached artifact; this is accepted because the caches are advisory and every
/// persisted record carries its own raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Fingerprint the given text.
    pub fn of(text: &str) -> Self {
        let normalized = text.trim();
        let digest = blake3::hash(normalized.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        Self(u64::from_le_bytes(prefix))
    }

    /// Construct from a raw value. Intended for tests and diagnostics.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit key.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_ignores_surrounding_whitespace() {
        assert_eq!(
            Fingerprint::of("  support the plan \n"),
            Fingerprint::of("support the plan")
        );
    }

    #[test]
    fn test_fingerprint_is_case_sensitive() {
        assert_ne!(Fingerprint::of("Support"), Fingerprint::of("support"));
    }

    #[test]
    fn test_fingerprint_golden_values() {
        // Keys must never change between releases or process restarts.
        assert_eq!(Fingerprint::of("stable").as_u64(), 0x4d85_5ff0_9cc8_0185);
        assert_eq!(
            Fingerprint::of("  support the plan\n").as_u64(),
            0x17ea_cdb5_1d28_5cb0
        );
        assert_eq!(Fingerprint::of("").to_string(), "a6a1f9f5b94913af");
    }

    #[test]
    fn test_fingerprint_display_is_fixed_width() {
        assert_eq!(Fingerprint::from_raw(0xab).to_string(), "00000000000000ab");
        assert_eq!(Fingerprint::of("anything").to_string().len(), 16);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: fingerprinting is deterministic and whitespace-padding invariant
        #[test]
        fn prop_fingerprint_deterministic(text in "\\PC{0,300}", pad in "[ \\t\\n]{0,5}") {
            let a = Fingerprint::of(&text);
            let b = Fingerprint::of(&text);
            prop_assert_eq!(a, b);
            let padded = format!("{pad}{text}{pad}");
            prop_assert_eq!(Fingerprint::of(&padded), Fingerprint::of(text.trim()));
        }
    }
}
