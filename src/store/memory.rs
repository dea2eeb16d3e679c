use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::NaiveDate;

use super::{MetadataStore, TagTypeId, TagValue};
use crate::error::{Error, Result};
use crate::picture::{Picture, PictureId, PictureLocation, parse_timestamp, sort_pictures};

/// In-process picture database used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pictures: Vec<Picture>,
    tag_types: Vec<(TagTypeId, String)>,
    tags: Vec<(PictureId, TagValue)>,
    filters: BTreeMap<String, Vec<PictureLocation>>,
    offline: AtomicBool,
    tag_type_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a picture; `taken_at` uses the database layout `YYYY-MM-DD HH:MM:SS`.
    ///
    /// # Panics
    /// Panics when `taken_at` does not parse.
    pub fn with_picture(mut self, id: i64, taken_at: &str, folder: &str, filename: &str) -> Self {
        let taken_at = parse_timestamp(taken_at)
            .unwrap_or_else(|| panic!("invalid picture timestamp {taken_at:?}"));
        self.pictures.push(Picture {
            id: PictureId(id),
            taken_at,
            folder: folder.to_owned(),
            filename: filename.to_owned(),
        });
        self
    }

    pub fn with_tag_type(mut self, id: i64, name: &str) -> Self {
        self.tag_types.push((TagTypeId(id), name.to_owned()));
        self
    }

    pub fn with_tag(mut self, picture: i64, tag_type: i64, content: &str) -> Self {
        self.tags.push((
            PictureId(picture),
            TagValue {
                tag_type: TagTypeId(tag_type),
                content: content.to_owned(),
            },
        ));
        self
    }

    pub fn with_filter(mut self, name: &str, matches: Vec<PictureLocation>) -> Self {
        self.filters.insert(name.to_owned(), matches);
        self
    }

    /// Makes every subsequent query fail, as if the database went away.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Number of tag-type lookups answered so far.
    pub fn tag_type_lookups(&self) -> usize {
        self.tag_type_lookups.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

impl MetadataStore for MemoryStore {
    fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        self.check_online()?;
        let mut dates: Vec<NaiveDate> = self.pictures.iter().map(Picture::date).collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    fn pictures_on(&self, date: NaiveDate) -> Result<Vec<Picture>> {
        self.check_online()?;
        let mut pictures: Vec<Picture> = self
            .pictures
            .iter()
            .filter(|p| p.date() == date)
            .cloned()
            .collect();
        sort_pictures(&mut pictures);
        Ok(pictures)
    }

    fn filter_exists(&self, name: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self.filters.contains_key(name))
    }

    fn filter_matches(&self, name: &str) -> Result<Vec<PictureLocation>> {
        self.check_online()?;
        Ok(self.filters.get(name).cloned().unwrap_or_default())
    }

    fn picture_at(&self, location: &PictureLocation) -> Result<Option<Picture>> {
        self.check_online()?;
        Ok(self
            .pictures
            .iter()
            .find(|p| p.folder == location.folder && p.filename == location.filename)
            .cloned())
    }

    fn tag_type_id(&self, tag_type: &str) -> Result<Option<TagTypeId>> {
        self.check_online()?;
        self.tag_type_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tag_types
            .iter()
            .find(|(_, name)| name == tag_type)
            .map(|(id, _)| *id))
    }

    fn tags_for(&self, picture: PictureId) -> Result<Vec<TagValue>> {
        self.check_online()?;
        Ok(self
            .tags
            .iter()
            .filter(|(id, _)| *id == picture)
            .map(|(_, tag)| tag.clone())
            .collect())
    }

    fn filter_names(&self) -> Result<Vec<String>> {
        self.check_online()?;
        Ok(self.filters.keys().cloned().collect())
    }
}
