//! Persisted profiles
//!
//! A profile is a named layout plus the serialized state of every registered
//! view. [`ConfigurationState`] keeps the known profiles and the global
//! settings, and writes them to a [`Storage`] as a single JSON document
//! ([`ProfilesData`]).
//!
//! Storage is best effort. A failed write is logged and the in-memory state
//! stays as it is; malformed stored data is logged and ignored.

mod configuration;
mod data;
mod storage;

pub use configuration::ConfigurationState;
pub use data::{Profile, ProfilesData};
pub use storage::{FileStorage, MemoryStorage, Storage};
