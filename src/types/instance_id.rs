use std::fmt;

/// Stable per-instance identity, distinct from value equality.
///
/// The sub-pool uses instance identities to guard against inserting the
/// same instance twice and to drop a specific idle entry without a linear
/// value scan. The backend assigns them; they only need to be unique and
/// stable for the lifetime of the instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Create a new InstanceId from a u64 value.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<InstanceId> for u64 {
    fn from(id: InstanceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_id_creation() {
        let id = InstanceId::new(42);
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn test_instance_id_in_set() {
        use rustc_hash::FxHashSet;
        let mut set = FxHashSet::default();
        assert!(set.insert(InstanceId::new(1)));
        assert!(!set.insert(InstanceId::new(1)));
        assert!(set.insert(InstanceId::new(2)));
    }
}
