use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use tracing::debug;

use super::{MetadataStore, TagTypeId, TagValue};
use crate::error::Result;
use crate::picture::{Picture, PictureId, PictureLocation, parse_timestamp};

const DATE_FORMAT: &str = "%Y-%m-%d";

const PICTURE_COLUMNS: &str = "idFile, ImageDateTime, strPath, strFilename";

/// Read-only adapter over a MyPicturesDatabase SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

struct FilterDefinition {
    id: i64,
    match_all: bool,
    date_start: Option<String>,
    date_end: Option<String>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wraps an already opened connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    fn filter_definition(&self, name: &str) -> Result<Option<FilterDefinition>> {
        let definition = self
            .conn
            .query_row(
                "SELECT pkFilter, bMatchAll, dateStart, dateEnd FROM FilterWizard \
                 WHERE strFilterName = ?1",
                params![name],
                |row| {
                    Ok(FilterDefinition {
                        id: row.get(0)?,
                        match_all: row.get::<_, Option<i64>>(1)?.unwrap_or(0) != 0,
                        date_start: non_empty(row.get(2)?),
                        date_end: non_empty(row.get(3)?),
                    })
                },
            )
            .optional()?;
        Ok(definition)
    }

    /// Ids of every file tagged with `content`.
    fn files_tagged(&self, content: &str) -> Result<HashSet<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT tif.idFile FROM TagsInFiles tif \
             JOIN TagContents tc ON tc.idTagContent = tif.idTagContent \
             WHERE tc.TagContent = ?1",
        )?;
        let ids = stmt
            .query_map(params![content], |row| row.get::<_, i64>(0))?
            .collect::<rusqlite::Result<HashSet<i64>>>()?;
        Ok(ids)
    }
}

impl MetadataStore for SqliteStore {
    fn distinct_dates(&self) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT substr(ImageDateTime, 1, 10) FROM Files \
             WHERE ImageDateTime IS NOT NULL AND ImageDateTime != ''",
        )?;
        let raw = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        let mut dates: Vec<NaiveDate> = raw
            .iter()
            .filter_map(|day| match NaiveDate::parse_from_str(day, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    debug!(day, "skipping unparsable picture date");
                    None
                }
            })
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    fn pictures_on(&self, date: NaiveDate) -> Result<Vec<Picture>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PICTURE_COLUMNS} FROM Files \
             WHERE substr(ImageDateTime, 1, 10) = ?1 \
             ORDER BY ImageDateTime, strFilename"
        ))?;
        let day = date.format(DATE_FORMAT).to_string();
        let rows = stmt
            .query_map(params![day], picture_row)?
            .collect::<rusqlite::Result<Vec<Option<Picture>>>>()?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn filter_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM FilterWizard WHERE strFilterName = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count == 1)
    }

    fn filter_matches(&self, name: &str) -> Result<Vec<PictureLocation>> {
        let Some(filter) = self.filter_definition(name)? else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare("SELECT strItem, intCondition FROM FilterWizardItems WHERE fkFilter = ?1")?;
        let items = stmt
            .query_map(params![filter.id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

        let mut included: Option<HashSet<i64>> = None;
        let mut excluded: HashSet<i64> = HashSet::new();
        for (item, condition) in &items {
            match *condition {
                1 => {
                    let tagged = self.files_tagged(item)?;
                    included = Some(match included {
                        None => tagged,
                        Some(acc) if filter.match_all => {
                            acc.intersection(&tagged).copied().collect()
                        }
                        Some(mut acc) => {
                            acc.extend(tagged);
                            acc
                        }
                    });
                }
                -1 => excluded.extend(self.files_tagged(item)?),
                _ => {}
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT idFile, substr(ImageDateTime, 1, 10), strPath, strFilename FROM Files \
             ORDER BY ImageDateTime, strFilename",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let matches = rows
            .into_iter()
            .filter(|(id, _, _, _)| included.as_ref().is_none_or(|set| set.contains(id)))
            .filter(|(id, _, _, _)| !excluded.contains(id))
            .filter(|(_, day, _, _)| {
                within_range(
                    day.as_deref(),
                    filter.date_start.as_deref(),
                    filter.date_end.as_deref(),
                )
            })
            .map(|(_, _, folder, filename)| PictureLocation { folder, filename })
            .collect();
        Ok(matches)
    }

    fn picture_at(&self, location: &PictureLocation) -> Result<Option<Picture>> {
        let picture = self
            .conn
            .query_row(
                &format!(
                    "SELECT {PICTURE_COLUMNS} FROM Files WHERE strPath = ?1 AND strFilename = ?2"
                ),
                params![location.folder, location.filename],
                picture_row,
            )
            .optional()?;
        Ok(picture.flatten())
    }

    fn tag_type_id(&self, tag_type: &str) -> Result<Option<TagTypeId>> {
        let id = self
            .conn
            .query_row(
                "SELECT idTagType FROM TagTypes WHERE TagType = ?1",
                params![tag_type],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id.map(TagTypeId))
    }

    fn tags_for(&self, picture: PictureId) -> Result<Vec<TagValue>> {
        let mut stmt = self.conn.prepare(
            "SELECT tc.idTagType, tc.TagContent FROM TagsInFiles tif \
             JOIN TagContents tc ON tc.idTagContent = tif.idTagContent \
             WHERE tif.idFile = ?1 ORDER BY tc.idTagContent",
        )?;
        let tags = stmt
            .query_map(params![picture.0], |row| {
                Ok(TagValue {
                    tag_type: TagTypeId(row.get(0)?),
                    content: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<TagValue>>>()?;
        Ok(tags)
    }

    fn filter_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT strFilterName FROM FilterWizard ORDER BY strFilterName")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

/// Maps a `PICTURE_COLUMNS` row; rows with a missing or malformed timestamp map to `None`.
fn picture_row(row: &Row<'_>) -> rusqlite::Result<Option<Picture>> {
    let id: i64 = row.get(0)?;
    let raw: Option<String> = row.get(1)?;
    let Some(taken_at) = raw.as_deref().and_then(parse_timestamp) else {
        debug!(id, timestamp = ?raw, "skipping picture without a usable timestamp");
        return Ok(None);
    };
    Ok(Some(Picture {
        id: PictureId(id),
        taken_at,
        folder: row.get(2)?,
        filename: row.get(3)?,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Inclusive day-string comparison; open bounds always pass.
fn within_range(day: Option<&str>, start: Option<&str>, end: Option<&str>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Some(day) = day.filter(|d| !d.is_empty()) else {
        return false;
    };
    start.is_none_or(|s| day >= s.get(..10).unwrap_or(s))
        && end.is_none_or(|e| day <= e.get(..10).unwrap_or(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(within_range(Some("2020-05-01"), Some("2020-05-01"), Some("2020-05-31")));
        assert!(within_range(Some("2020-05-31"), None, Some("2020-05-31 23:59:59")));
        assert!(!within_range(Some("2020-06-01"), None, Some("2020-05-31")));
        assert!(!within_range(None, Some("2020-05-01"), None));
        assert!(within_range(None, None, None));
    }
}
