//! Typed read-only queries against the picture database.

pub mod memory;
pub mod sqlite;

use chrono::NaiveDate;

use crate::error::Result;
use crate::picture::{Picture, PictureId, PictureLocation};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagTypeId(pub i64);

/// A tag attached to a picture: its tag type and text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagValue {
    pub tag_type: TagTypeId,
    pub content: String,
}

/// Query interface the slideshow needs from the picture database.
///
/// Implementations never retry; a failed query is reported as
/// [`crate::error::Error::StoreUnavailable`].
pub trait MetadataStore {
    /// Every calendar day on which at least one dated picture was taken.
    fn distinct_dates(&self) -> Result<Vec<NaiveDate>>;

    /// All pictures taken on `date`, ordered by timestamp then file name.
    fn pictures_on(&self, date: NaiveDate) -> Result<Vec<Picture>>;

    /// True when exactly one filter with this name exists.
    fn filter_exists(&self, name: &str) -> Result<bool>;

    /// Locations of every picture selected by the named filter.
    fn filter_matches(&self, name: &str) -> Result<Vec<PictureLocation>>;

    fn picture_at(&self, location: &PictureLocation) -> Result<Option<Picture>>;

    fn tag_type_id(&self, tag_type: &str) -> Result<Option<TagTypeId>>;

    fn tags_for(&self, picture: PictureId) -> Result<Vec<TagValue>>;

    fn filter_names(&self) -> Result<Vec<String>>;
}

impl<S: MetadataStore + ?Sized> MetadataStore for &S {
    fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        (**self).distinct_dates()
    }

    fn pictures_on(&self, date: NaiveDate) -> Result<Vec<Picture>> {
        (**self).pictures_on(date)
    }

    fn filter_exists(&self, name: &str) -> Result<bool> {
        (**self).filter_exists(name)
    }

    fn filter_matches(&self, name: &str) -> Result<Vec<PictureLocation>> {
        (**self).filter_matches(name)
    }

    fn picture_at(&self, location: &PictureLocation) -> Result<Option<Picture>> {
        (**self).picture_at(location)
    }

    fn tag_type_id(&self, tag_type: &str) -> Result<Option<TagTypeId>> {
        (**self).tag_type_id(tag_type)
    }

    fn tags_for(&self, picture: PictureId) -> Result<Vec<TagValue>> {
        (**self).tags_for(picture)
    }

    fn filter_names(&self) -> Result<Vec<String>> {
        (**self).filter_names()
    }
}
