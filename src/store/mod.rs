//! Storage: the key-value capability, an in-memory backend and the session
//! repository built on top of them.

pub mod kv;
pub mod memory;
pub mod repository;

pub use kv::{KvStore, StoreError};
pub use memory::MemoryStore;
pub use repository::{SessionRepository, Stored};
