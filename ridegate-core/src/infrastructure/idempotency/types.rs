//! Idempotency key types

/// Caller-supplied operation key, conventionally `{subjectId}:{operationId}`.
///
/// An empty key is representable on purpose: the gate answers it with
/// [`ClaimOutcome::MissingKey`] instead of ever treating it as unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey(String);

impl OperationKey {
    /// Build `{subject_id}:{operation_id}`. Blank parts yield an empty key.
    pub fn new(subject_id: &str, operation_id: &str) -> Self {
        let subject_id = subject_id.trim();
        let operation_id = operation_id.trim();

        if subject_id.is_empty() || operation_id.is_empty() {
            return Self(String::new());
        }

        Self(format!("{}:{}", subject_id, operation_id))
    }

    /// Use an opaque key as-is
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Convert to a Redis-compatible key string
    pub fn to_redis_key(&self, prefix: &str) -> String {
        format!("{}:{}", prefix, self.0)
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of claiming an operation key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This call created the marker; the operation may run
    FirstClaim,
    /// The marker already existed; treat the operation as already performed
    Duplicate,
    /// The key was empty, so uniqueness cannot be established
    MissingKey,
}

impl ClaimOutcome {
    pub fn is_first(&self) -> bool {
        matches!(self, ClaimOutcome::FirstClaim)
    }

    /// Get the outcome name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimOutcome::FirstClaim => "first_claim",
            ClaimOutcome::Duplicate => "duplicate",
            ClaimOutcome::MissingKey => "missing_key",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_key_joins_subject_and_operation() {
        let key = OperationKey::new("rider-42", "req-7");
        assert_eq!(key.as_str(), "rider-42:req-7");
        assert_eq!(key.to_redis_key("idempotency"), "idempotency:rider-42:req-7");
    }

    #[test]
    fn test_blank_parts_give_empty_key() {
        assert!(OperationKey::new("rider-42", "  ").is_empty());
        assert!(OperationKey::new("", "req-7").is_empty());
        assert!(OperationKey::raw("   ").is_empty());
        assert!(!OperationKey::raw("opaque").is_empty());
    }

    #[test]
    fn test_only_first_claim_is_first() {
        assert!(ClaimOutcome::FirstClaim.is_first());
        assert!(!ClaimOutcome::Duplicate.is_first());
        assert!(!ClaimOutcome::MissingKey.is_first());
    }
}
