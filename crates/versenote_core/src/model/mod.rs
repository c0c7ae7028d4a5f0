//! Domain records shared by parsing, reconciliation and persistence.
//!
//! # Invariants
//! - Every note is identified by an opaque `NoteId` that is never reassigned.
//! - Tag/reference collections have set semantics (`BTreeSet`/`BTreeMap`) so
//!   equality and serialization are order-independent and deterministic.

pub mod note;
pub mod verse;
