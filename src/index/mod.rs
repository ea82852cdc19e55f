//! Index structures.

pub mod btree;

pub use btree::{IntegrityChecker, IntegrityViolation, MWayTree, SearchResult};
