//! In-memory note tree, attribute inheritance and store reconciliation.
//!
//! # Responsibility
//! - Build a `NoteNode` tree from outline text, children before parents.
//! - Merge child attributes into parents under fixed precedence.
//! - Decide which notes changed relative to the store.
//!
//! # Invariants
//! - A parent always references every direct and indirect child id.
//! - Only changed notes are re-derived; unchanged notes mirror the store.

pub mod ids;
pub mod inherit;
pub mod node;
pub mod reconcile;
