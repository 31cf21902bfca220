//! Document mappers.
//!
//! Each entity has a declarative [`Schema`](schema::Schema).  Reading goes
//! through [`StoredEntity::from_stored_doc`], which never fails and fills
//! every missing or malformed field with a type-safe default.  Writing goes
//! through a [`Candidate`] whose [`Candidate::validate`] reports every
//! violated rule before anything touches the store.

pub mod coerce;
pub mod comment;
pub mod event;
pub mod friend;
pub mod notification;
pub mod profile;
pub mod rsvp;
pub mod schema;

use campus_store::{Document, Fields};

use crate::model::schema::{Reader, Schema, Validation};

/// A record normalized from a stored document.
pub trait StoredEntity: Sized {
    fn schema() -> &'static Schema;

    fn from_fields(id: &str, reader: &Reader<'_>) -> Self;

    /// `None` only when the document does not exist.
    fn from_stored_doc(id: &str, raw: Option<&Fields>) -> Option<Self> {
        raw.map(|raw| Self::from_fields(id, &Self::schema().reader(raw)))
    }

    fn from_document(doc: &Document) -> Self {
        Self::from_fields(&doc.id, &Self::schema().reader(&doc.fields))
    }
}

/// A record about to be written.
pub trait Candidate {
    fn schema() -> &'static Schema;

    fn to_fields(&self) -> Fields;

    fn validate(&self) -> Validation {
        Self::schema().validate(&self.to_fields())
    }
}
