use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

/// Timestamp layout used by the picture database.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// File extensions the slideshow can display.
pub const PICTURE_FORMATS: &[&str] = &[
    "bmp", "jpeg", "jpg", "gif", "png", "tiff", "mng", "ico", "pcx", "tga",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PictureId(pub i64);

impl fmt::Display for PictureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dated picture row as stored in the picture database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub id: PictureId,
    pub taken_at: NaiveDateTime,
    pub folder: String,
    pub filename: String,
}

impl Picture {
    pub fn date(&self) -> NaiveDate {
        self.taken_at.date()
    }

    pub fn path(&self) -> PathBuf {
        Path::new(&self.folder).join(&self.filename)
    }

    pub fn is_displayable(&self) -> bool {
        is_displayable(&self.filename)
    }
}

/// Folder and file name of a picture, as returned by filter lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PictureLocation {
    pub folder: String,
    pub filename: String,
}

impl PictureLocation {
    pub fn new(folder: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            filename: filename.into(),
        }
    }
}

pub fn is_displayable(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PICTURE_FORMATS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Sort into slideshow order: by timestamp, ties broken by file name.
pub fn sort_pictures(pictures: &mut [Picture]) {
    pictures.sort_by(|a, b| {
        a.taken_at
            .cmp(&b.taken_at)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}
