//! # Nexus Core
//!
//! Shared building blocks for the Nexus document backend:
//!
//! - [`Document`] - a markdown file with a YAML header parsed into metadata
//! - [`DocumentStore`] - root-confined async reads, writes and directory walks
//! - [`extract_tags`] - tag references pulled out of document metadata
//!
//! The filesystem is the source of truth. Nothing in this crate caches
//! documents; every read re-parses the file.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod paths;
pub mod store;
pub mod tags;

pub use document::{Document, Metadata};
pub use error::{StorageError, StorageResult};
pub use store::DocumentStore;
pub use tags::extract_tags;
