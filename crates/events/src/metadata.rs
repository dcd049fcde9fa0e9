//! Correlation ID tracking for event emission.

use std::sync::OnceLock;
use uuid::Uuid;

static CORRELATION_ID: OnceLock<Uuid> = OnceLock::new();

/// Get or create the correlation ID for this process.
///
/// Every event emitted during one toolpin invocation carries the same ID.
#[must_use]
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Set the correlation ID for this process.
///
/// Only the first call wins. Returns `true` if the ID was set.
pub fn set_correlation_id(id: Uuid) -> bool {
    CORRELATION_ID.set(id).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_consistency() {
        assert_eq!(correlation_id(), correlation_id());
        assert!(!correlation_id().is_nil());
    }

    #[test]
    fn test_set_correlation_id_after_init() {
        let _ = correlation_id();
        assert!(!set_correlation_id(Uuid::new_v4()));
    }
}
