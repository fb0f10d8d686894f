//! taskgen record store infrastructure adapters.
//!
//! Implements the [`pipeline::RecordStore`] trait:
//!
//! - [`JsonFileStore`] keeps the whole store document in one JSON file,
//!   loading and persisting it in one piece.
//! - [`MemoryStore`] keeps the document in process memory. Used by tests and
//!   for dry runs.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File handling and encoding live here. The [`pipeline`]
//! crate sees only [`pipeline::RecordStore`] and [`pipeline::StoreDocument`].

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
