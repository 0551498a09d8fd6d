//! File-backed durable storage for Promptly clients
//!
//! This crate implements the `KeyValueStore` trait on top of a single JSON
//! file. Every mutation is written through to disk with an atomic rename,
//! so a crash never leaves a half-written store behind.
//!
//! # Example
//! ```no_run
//! # use promptly_storage::FileKeyValueStore;
//! # use promptly_core::KeyValueStore;
//! # fn example() -> promptly_core::Result<()> {
//! let store = FileKeyValueStore::open("/tmp/promptly/storage.json")?;
//! store.set("selectedProfileId", "p1")?;
//! # Ok(())
//! # }
//! ```

mod atomic_writer;
mod file_store;

pub use file_store::FileKeyValueStore;
