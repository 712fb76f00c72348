//! # Nexus Tags
//!
//! In-memory tag relationship graph. Every distinct tag found in document
//! metadata gets a node holding:
//!
//! - the documents that carry it
//! - a single optional parent and a set of children
//! - typed, weighted relationships to other tags, stored on both endpoints
//!
//! The graph is not persisted. [`TagIndex::initialize`] builds it from a full
//! scan of the document store and the vault keeps it current with
//! [`TagGraph::index_document`] / [`TagGraph::remove_document`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod graph;
mod index;
mod types;

pub use error::{TagError, TagResult};
pub use graph::{normalize_tag, TagGraph, TagNode};
pub use index::{scan_store, TagIndex};
pub use types::{
    Hierarchy, Relationship, RelationshipType, SearchOperator, SearchOptions, TagCount,
    UsageBands,
};
