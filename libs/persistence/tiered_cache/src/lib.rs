pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod macros;
pub mod memory;
pub mod persistent;
pub mod tiered;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::{MemoryConfig, PersistentConfig, TieredConfig, TtlPolicy};
pub use entry::{CacheEntry, CacheValue, Json};
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, KeySegment};
pub use memory::MemoryTier;
pub use persistent::PersistentTier;
pub use tiered::{
    CacheOutcome, CacheStats, InvalidationReport, Lookup, TieredCache,
};
