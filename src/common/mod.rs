//! Common types and utilities shared across mwaytree.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`TreeConfig`](config::TreeConfig)
//! - Error types
//! - Identifiers ([`NodeId`]) and the [`Key`] type

pub mod config;
pub mod error;
mod node_id;

pub use error::{Error, Result};
pub use node_id::NodeId;

/// Keys indexed by the tree and the data store.
pub type Key = i32;
