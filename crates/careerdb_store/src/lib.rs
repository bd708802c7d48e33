//! # CareerDB Store
//!
//! Object store trait and implementations for CareerDB.
//!
//! This crate provides the remote-storage abstraction the sync layer is
//! built on. Stores are **opaque blob buckets** - whole objects are read
//! and replaced by key, and the store does not interpret the bytes it
//! holds (snapshot files and lock markers look the same to it).
//!
//! ## Design Principles
//!
//! - Stores are simple keyed blob buckets (exists, get, put, delete, list)
//! - Per-object writes replace the full object, never patch it
//! - Deletes are idempotent - removing a missing key is not an error
//! - Must be `Send + Sync` so independent managers can share one store
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral use
//! - [`FsStore`] - A directory acting as the bucket (shared filesystem)
//!
//! A cloud object store client (S3 and friends) satisfies the same
//! contract and plugs in behind the [`ObjectStore`] trait.
//!
//! ## Example
//!
//! ```rust
//! use careerdb_store::{InMemoryStore, ObjectStore};
//!
//! let store = InMemoryStore::new();
//! store.put("career_data.db", b"snapshot bytes").unwrap();
//! assert!(store.exists("career_data.db").unwrap());
//! assert_eq!(store.get("career_data.db").unwrap().unwrap(), b"snapshot bytes");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod fs;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use fs::FsStore;
pub use memory::InMemoryStore;
pub use store::ObjectStore;
