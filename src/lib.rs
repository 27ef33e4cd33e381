//! Keyed object-reuse pools for engine-driven applications.
//!
//! The registry hands out live instances by composite key, keeps returned
//! instances warm for reuse and evicts them on two timers: per-instance
//! idle age and whole-pool empty age. A companion [`CommonPool`] recycles
//! plain values by type with the same eviction model.
//!
//! Engine specifics (instantiation, destruction, template loading,
//! lifecycle hooks) live behind the [`PoolBackend`] trait; the core never
//! names a concrete scene-object type.
//!
//! ```
//! use repool::{ObjectPool, PoolBackend, PoolConfig, PoolKey};
//! # use repool::{AssetPath, InstanceId, Result, TypeTag};
//! # struct Noop;
//! # impl PoolBackend for Noop {
//! #     type Handle = u64;
//! #     type Template = ();
//! #     fn validate_tag(&self, _: TypeTag) -> bool { true }
//! #     fn load_template(&mut self, _: &PoolKey) -> Result<()> { Ok(()) }
//! #     fn instantiate(&mut self, _: &()) -> Option<u64> { Some(1) }
//! #     fn destroy(&mut self, _: u64) {}
//! #     fn is_alive(&self, _: &u64) -> bool { true }
//! #     fn instance_id(&self, h: &u64) -> InstanceId { InstanceId::new(*h) }
//! # }
//! let mut pool = ObjectPool::new(Noop, PoolConfig::default());
//! let key = PoolKey::resource(TypeTag::new("Prefab"), AssetPath::from("fx/spark"));
//! if let Some(handle) = pool.get(&key) {
//!     pool.dispose(handle, &key);
//! }
//! pool.tick();
//! ```

pub mod backend;
pub mod clock;
pub mod common;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod types;

pub use backend::{AttachmentId, HookKind, PoolBackend};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use common::CommonPool;
pub use config::PoolConfig;
pub use engine::{ObjectPool, PoolStats, ReleaseId};
pub use error::{Error, Result};
pub use policy::IdlePolicy;
pub use types::{AssetPath, InstanceId, LoadSource, PoolKey, TypeTag};
