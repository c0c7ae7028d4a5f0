//! Note id generation.

use crate::model::note::NoteId;
use uuid::Uuid;

/// Source of fresh note ids.
///
/// Generated ids must match the id-marker token shape (`[a-z0-9]+`) so they
/// survive a write-back round trip.
pub trait IdGenerator {
    fn next_id(&mut self) -> NoteId;
}

/// Random UUID v4 ids in simple (hyphen-free, lowercase) form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> NoteId {
        Uuid::new_v4().simple().to_string()
    }
}

impl<G: IdGenerator + ?Sized> IdGenerator for &mut G {
    fn next_id(&mut self) -> NoteId {
        (**self).next_id()
    }
}

#[cfg(test)]
mod tests {
    use super::{IdGenerator, UuidIdGenerator};
    use crate::markup::grammar::{self_id, self_id_line};

    #[test]
    fn uuid_ids_round_trip_through_markers() {
        let id = UuidIdGenerator.next_id();
        assert_eq!(self_id(&self_id_line(&id)), Some(id));
    }
}
