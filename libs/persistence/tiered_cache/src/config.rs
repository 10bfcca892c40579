use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MemoryConfig {
    /// Upper bound on entries. `None` leaves the tier unbounded; entries
    /// then only disappear through expiry or invalidation.
    #[serde(default)]
    pub capacity: Option<u64>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PersistentConfig {
    #[serde(default = "default_persistent_path")]
    pub path: PathBuf,
    /// Use a throwaway location removed on drop; `path` is ignored.
    #[serde(default)]
    pub temporary: bool,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TieredConfig {
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub persistent: PersistentConfig,
}

/// Lifetimes for one resource type in each tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct TtlPolicy {
    pub memory_ttl_secs: u64,
    pub persistent_ttl_secs: u64,
}

impl TtlPolicy {
    pub const fn from_secs(memory_ttl_secs: u64, persistent_ttl_secs: u64) -> Self {
        Self {
            memory_ttl_secs,
            persistent_ttl_secs,
        }
    }

    pub fn memory_ttl(&self) -> Duration { Duration::from_secs(self.memory_ttl_secs) }

    pub fn persistent_ttl(&self) -> Duration {
        Duration::from_secs(self.persistent_ttl_secs)
    }
}

impl Default for PersistentConfig {
    fn default() -> Self {
        Self {
            path: default_persistent_path(),
            temporary: false,
        }
    }
}

impl PersistentConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temporary: false,
        }
    }

    pub fn temporary() -> Self {
        Self {
            path: std::env::temp_dir().join("content-cache-tmp"),
            temporary: true,
        }
    }
}

fn default_persistent_path() -> PathBuf { PathBuf::from(".cache/content") }
