/// Counters describing pool traffic, for monitoring.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolStats {
    /// Gets satisfied by a recycled instance.
    pub hits: u64,
    /// Gets that had to spawn a fresh instance.
    pub spawns: u64,
    /// Idle instances skipped because they were invalidated out of band.
    pub stale_skips: u64,
    /// Returns ignored because the instance was already pooled.
    pub double_returns: u64,
    /// Idle instances destroyed by the eviction sweep or a shrink.
    pub evicted_items: u64,
    /// Sub-pools removed after staying empty past their threshold.
    pub expired_pools: u64,
}

impl PoolStats {
    /// Fraction of gets served from the idle set (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.spawns;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
