//! Durability mode configuration
//!
//! Controls when fsync is called to ensure data reaches disk.

/// Durability mode for the write-ahead log
///
/// # Modes
///
/// - `Always` - fsync after every commit (slow, zero data loss)
/// - `Standard` - fsync every N commits OR every T milliseconds (DEFAULT)
///
/// Both modes hand every commit to the OS before returning, so a process
/// that exits cleanly never loses a commit; `Standard` only trades away
/// the last interval on power loss or kernel crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// fsync after every commit
    Always,

    /// fsync every N commits OR every T milliseconds (the default)
    Standard {
        /// Maximum time between fsyncs in milliseconds
        interval_ms: u64,
        /// Maximum commits between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check if this mode requires immediate fsync on every commit
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Always => "Always sync (safest, slowest)",
            DurabilityMode::Standard { .. } => "Standard (balanced speed/safety)",
        }
    }

    /// `Standard { interval_ms: 100, batch_size: 1000 }`
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        assert_eq!(
            DurabilityMode::default(),
            DurabilityMode::Standard {
                interval_ms: 100,
                batch_size: 1000
            }
        );
    }

    #[test]
    fn test_immediate_fsync() {
        assert!(DurabilityMode::Always.requires_immediate_fsync());
        assert!(!DurabilityMode::standard_default().requires_immediate_fsync());
    }
}
