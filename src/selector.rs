use std::fmt;

use chrono::NaiveDate;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::burst::{self, SlideGroup};
use crate::config::SelectionSettings;
use crate::error::{ConfigurationError, Error, Result};
use crate::picture::{Picture, PictureId};
use crate::store::MetadataStore;

/// A filter-matched picture that starts a group in filtered mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterMatch {
    pub picture: PictureId,
    pub date: NaiveDate,
}

/// The exhaustible unit of group selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Date(NaiveDate),
    FilterMatch(FilterMatch),
}

impl GroupKey {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::FilterMatch(m) => m.date,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::FilterMatch(m) => write!(f, "{} (picture {})", m.date, m.picture),
        }
    }
}

/// Shuffled keys plus a cursor. Every key is handed out once per pass; the
/// order is reshuffled when a pass completes.
#[derive(Debug, Clone)]
pub struct Pool<T> {
    keys: Vec<T>,
    index: usize,
}

impl<T: Clone> Pool<T> {
    pub fn new<R: Rng + ?Sized>(mut keys: Vec<T>, rng: &mut R) -> Self {
        keys.shuffle(rng);
        Self { keys, index: 0 }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of the next key within the current pass.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        let key = self.keys.get(self.index)?.clone();
        self.index += 1;
        if self.index == self.keys.len() {
            self.keys.shuffle(rng);
            self.index = 0;
        }
        Some(key)
    }
}

#[derive(Debug)]
enum SelectionMode {
    Dates(Pool<NaiveDate>),
    Filtered { name: String, pool: Pool<FilterMatch> },
}

/// The outcome of one group request.
#[derive(Debug, Clone)]
pub struct Selection {
    pub key: GroupKey,
    pub start_offset: usize,
    pub group: SlideGroup,
}

/// A freshly opened selector and the filter problem it fell back from, if any.
#[derive(Debug)]
pub struct SelectorStart {
    pub selector: GroupSelector,
    pub fallback: Option<ConfigurationError>,
}

/// Chooses which date or filter match to show next and fetches its pictures.
#[derive(Debug)]
pub struct GroupSelector {
    mode: SelectionMode,
    group_limit: usize,
    burst_enabled: bool,
    rng: StdRng,
}

impl GroupSelector {
    /// Builds the session pool.
    ///
    /// Filter problems do not fail the session: they are logged, returned in
    /// [`SelectorStart::fallback`] and the selector falls back to date groups.
    /// An empty date pool fails with [`Error::NothingToShow`].
    pub fn open<S: MetadataStore>(
        store: &S,
        settings: &SelectionSettings,
        mut rng: StdRng,
    ) -> Result<SelectorStart> {
        let mut fallback = None;
        if settings.use_filter {
            match filtered_pool(store, &settings.filter_name, &mut rng) {
                Ok(pool) => {
                    info!(
                        filter = settings.filter_name,
                        matches = pool.len(),
                        "grouping pictures by filter matches"
                    );
                    let selector = Self {
                        mode: SelectionMode::Filtered {
                            name: settings.filter_name.clone(),
                            pool,
                        },
                        group_limit: settings.group_limit,
                        burst_enabled: settings.burst_enabled,
                        rng,
                    };
                    return Ok(SelectorStart {
                        selector,
                        fallback: None,
                    });
                }
                Err(Error::Configuration(problem)) => {
                    error!(
                        filter = settings.filter_name,
                        "{problem}; falling back to date groups"
                    );
                    fallback = Some(problem);
                }
                Err(other) => return Err(other),
            }
        }

        let dates = store.distinct_dates()?;
        if dates.is_empty() {
            return Err(Error::NothingToShow);
        }
        info!(dates = dates.len(), "grouping pictures by date");
        let pool = Pool::new(dates, &mut rng);
        Ok(SelectorStart {
            selector: Self {
                mode: SelectionMode::Dates(pool),
                group_limit: settings.group_limit,
                burst_enabled: settings.burst_enabled,
                rng,
            },
            fallback,
        })
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.mode, SelectionMode::Filtered { .. })
    }

    pub fn filter_name(&self) -> Option<&str> {
        match &self.mode {
            SelectionMode::Filtered { name, .. } => Some(name),
            SelectionMode::Dates(_) => None,
        }
    }

    /// Number of keys in one pass of the pool.
    pub fn pool_len(&self) -> usize {
        match &self.mode {
            SelectionMode::Dates(pool) => pool.len(),
            SelectionMode::Filtered { pool, .. } => pool.len(),
        }
    }

    /// Next key of the pool; `None` only for an empty pool.
    pub fn next_group_key(&mut self) -> Option<GroupKey> {
        match &mut self.mode {
            SelectionMode::Dates(pool) => pool.next(&mut self.rng).map(GroupKey::Date),
            SelectionMode::Filtered { pool, .. } => {
                pool.next(&mut self.rng).map(GroupKey::FilterMatch)
            }
        }
    }

    /// Displayable pictures of the key's date and the offset to start from.
    pub fn fetch_picture_list<S: MetadataStore>(
        &mut self,
        store: &S,
        key: &GroupKey,
    ) -> Result<(Vec<Picture>, usize)> {
        let mut pictures = store.pictures_on(key.date())?;
        pictures.retain(Picture::is_displayable);

        let offset = match key {
            GroupKey::Date(_) => {
                if pictures.len() > self.group_limit {
                    self.rng
                        .random_range(0..=pictures.len() - self.group_limit)
                } else {
                    0
                }
            }
            GroupKey::FilterMatch(m) => {
                match pictures.iter().position(|p| p.id == m.picture) {
                    Some(offset) => offset,
                    None => {
                        warn!(
                            picture = %m.picture,
                            date = %m.date,
                            "filter match missing from its own date; starting at first picture"
                        );
                        0
                    }
                }
            }
        };
        Ok((pictures, offset))
    }

    /// Selects the next group and applies burst detection to it.
    pub fn next_selection<S: MetadataStore>(&mut self, store: &S) -> Result<Selection> {
        let key = self.next_group_key().ok_or(Error::NothingToShow)?;
        let (pictures, start_offset) = self.fetch_picture_list(store, &key)?;
        let group = burst::detect(
            &pictures,
            start_offset,
            self.group_limit,
            self.burst_enabled,
        );
        debug!(
            key = %key,
            available = pictures.len(),
            start_offset,
            shown = group.len(),
            burst = group.is_burst(),
            "selected group"
        );
        Ok(Selection {
            key,
            start_offset,
            group,
        })
    }
}

fn filtered_pool<S: MetadataStore>(
    store: &S,
    name: &str,
    rng: &mut StdRng,
) -> Result<Pool<FilterMatch>> {
    if name.trim().is_empty() {
        return Err(ConfigurationError::EmptyFilterName.into());
    }
    if !store.filter_exists(name)? {
        return Err(ConfigurationError::UnknownFilter(name.to_owned()).into());
    }

    let mut matches = Vec::new();
    for location in store.filter_matches(name)? {
        if !crate::picture::is_displayable(&location.filename) {
            continue;
        }
        match store.picture_at(&location)? {
            Some(picture) => matches.push(FilterMatch {
                picture: picture.id,
                date: picture.date(),
            }),
            None => debug!(
                folder = location.folder,
                file = location.filename,
                "filter match has no dated picture row"
            ),
        }
    }
    if matches.is_empty() {
        return Err(ConfigurationError::EmptyFilter(name.to_owned()).into());
    }
    Ok(Pool::new(matches, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::PictureLocation;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn settings(limit: usize) -> SelectionSettings {
        SelectionSettings {
            group_limit: limit,
            use_filter: false,
            filter_name: String::new(),
            burst_enabled: true,
        }
    }

    fn filtered(name: &str) -> SelectionSettings {
        SelectionSettings {
            use_filter: true,
            filter_name: name.into(),
            ..settings(3)
        }
    }

    fn five_dates() -> MemoryStore {
        (1..=5).fold(MemoryStore::new(), |store, day| {
            store.with_picture(
                day,
                &format!("2022-03-0{day} 08:00:00"),
                "/photos",
                &format!("day{day}.jpg"),
            )
        })
    }

    #[test]
    fn pool_hands_out_every_key_once_per_pass() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut pool = Pool::new((0..7).collect::<Vec<u32>>(), &mut rng);
        for _ in 0..5 {
            let pass: Vec<u32> = (0..7).map(|_| pool.next(&mut rng).unwrap()).collect();
            let unique: HashSet<u32> = pass.iter().copied().collect();
            assert_eq!(unique.len(), 7, "pass repeated a key: {pass:?}");
            assert_eq!(pool.index(), 0);
        }
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool: Pool<u8> = Pool::new(Vec::new(), &mut rng);
        assert!(pool.next(&mut rng).is_none());
        assert_eq!(pool.index(), 0);
    }

    #[test]
    fn five_dates_exhaust_before_repeating() {
        let store = five_dates();
        let start = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(3)).unwrap();
        assert!(start.fallback.is_none());
        let mut selector = start.selector;
        let first_pass: HashSet<GroupKey> =
            (0..5).map(|_| selector.next_group_key().unwrap()).collect();
        assert_eq!(first_pass.len(), 5);
        let sixth = selector.next_group_key().unwrap();
        assert!(first_pass.contains(&sixth));
    }

    #[test]
    fn large_date_groups_start_at_random_valid_offset() {
        let store = (0..10).fold(MemoryStore::new(), |store, i| {
            store.with_picture(
                i,
                &format!("2022-04-01 09:{:02}:00", i * 5),
                "/photos",
                &format!("p{i}.jpg"),
            )
        });
        let mut selector = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(5))
            .unwrap()
            .selector;
        let key = GroupKey::Date(NaiveDate::from_ymd_opt(2022, 4, 1).unwrap());
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let (pictures, offset) = selector.fetch_picture_list(&store, &key).unwrap();
            assert_eq!(pictures.len(), 10);
            assert!(offset <= 7);
            seen.insert(offset);
            let group = burst::detect(&pictures, offset, 3, true);
            assert!(!group.is_burst());
            assert_eq!(group.len(), 3);
        }
        assert_eq!(seen.len(), 8, "every offset in 0..=7 should occur");
    }

    #[test]
    fn small_date_groups_start_at_zero() {
        let store = five_dates();
        let mut selector = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(9))
            .unwrap()
            .selector;
        let key = GroupKey::Date(NaiveDate::from_ymd_opt(2022, 3, 2).unwrap());
        let (pictures, offset) = selector.fetch_picture_list(&store, &key).unwrap();
        assert_eq!(pictures.len(), 1);
        assert_eq!(offset, 0);
    }

    #[test]
    fn non_displayable_files_are_dropped() {
        let store = MemoryStore::new()
            .with_picture(1, "2022-05-01 10:00:00", "/p", "a.jpg")
            .with_picture(2, "2022-05-01 10:00:01", "/p", "clip.mov")
            .with_picture(3, "2022-05-01 10:00:02", "/p", "b.PNG");
        let mut selector = GroupSelector::open(&store, &settings(5), StdRng::seed_from_u64(2))
            .unwrap()
            .selector;
        let key = GroupKey::Date(NaiveDate::from_ymd_opt(2022, 5, 1).unwrap());
        let (pictures, _) = selector.fetch_picture_list(&store, &key).unwrap();
        let ids: Vec<i64> = pictures.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn filtered_mode_starts_at_matched_picture() {
        let store = MemoryStore::new()
            .with_picture(1, "2022-06-01 10:00:00", "/p", "a.jpg")
            .with_picture(2, "2022-06-01 11:00:00", "/p", "b.jpg")
            .with_picture(3, "2022-06-01 12:00:00", "/p", "c.jpg")
            .with_picture(4, "2022-06-02 12:00:00", "/p", "d.jpg")
            .with_filter("family", vec![PictureLocation::new("/p", "b.jpg")]);
        let start =
            GroupSelector::open(&store, &filtered("family"), StdRng::seed_from_u64(4)).unwrap();
        assert!(start.fallback.is_none());
        let mut selector = start.selector;
        assert!(selector.is_filtered());
        assert_eq!(selector.filter_name(), Some("family"));

        let selection = selector.next_selection(&store).unwrap();
        assert_eq!(selection.start_offset, 1);
        let ids: Vec<i64> = selection.group.pictures.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn filter_pool_exhausts_matches_before_repeating() {
        let store = MemoryStore::new()
            .with_picture(1, "2022-06-01 10:00:00", "/p", "a.jpg")
            .with_picture(2, "2022-06-03 11:00:00", "/p", "b.jpg")
            .with_picture(3, "2022-06-05 12:00:00", "/p", "c.jpg")
            .with_filter(
                "all",
                vec![
                    PictureLocation::new("/p", "a.jpg"),
                    PictureLocation::new("/p", "b.jpg"),
                    PictureLocation::new("/p", "c.jpg"),
                ],
            );
        let mut selector = GroupSelector::open(&store, &filtered("all"), StdRng::seed_from_u64(8))
            .unwrap()
            .selector;
        for _ in 0..3 {
            let pass: HashSet<GroupKey> =
                (0..3).map(|_| selector.next_group_key().unwrap()).collect();
            assert_eq!(pass.len(), 3);
            assert!(pass.iter().all(|k| matches!(k, GroupKey::FilterMatch(_))));
        }
    }

    #[test]
    fn empty_filter_name_falls_back_to_dates() {
        let store = five_dates();
        let start = GroupSelector::open(&store, &filtered("  "), StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(start.fallback, Some(ConfigurationError::EmptyFilterName));
        assert!(!start.selector.is_filtered());
        assert_eq!(start.selector.pool_len(), 5);
    }

    #[test]
    fn unknown_filter_falls_back_to_dates() {
        let store = five_dates();
        let start =
            GroupSelector::open(&store, &filtered("missing"), StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            start.fallback,
            Some(ConfigurationError::UnknownFilter("missing".into()))
        );
        assert!(!start.selector.is_filtered());
    }

    #[test]
    fn filter_without_displayable_pictures_falls_back() {
        let store = five_dates()
            .with_picture(9, "2022-03-09 10:00:00", "/p", "movie.mp4")
            .with_filter("videos", vec![PictureLocation::new("/p", "movie.mp4")]);
        let start =
            GroupSelector::open(&store, &filtered("videos"), StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(
            start.fallback,
            Some(ConfigurationError::EmptyFilter("videos".into()))
        );
        assert!(!start.selector.is_filtered());
    }

    #[test]
    fn missing_filter_match_starts_at_list_head() {
        let store = MemoryStore::new()
            .with_picture(1, "2022-06-01 10:00:00", "/p", "a.jpg")
            .with_picture(2, "2022-06-01 11:00:00", "/p", "b.jpg");
        let mut selector = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(1))
            .unwrap()
            .selector;
        let key = GroupKey::FilterMatch(FilterMatch {
            picture: PictureId(77),
            date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        });
        let (pictures, offset) = selector.fetch_picture_list(&store, &key).unwrap();
        assert_eq!(pictures.len(), 2);
        assert_eq!(offset, 0);
    }

    #[test]
    fn empty_database_is_nothing_to_show() {
        let store = MemoryStore::new();
        let err = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, Error::NothingToShow));
    }

    #[test]
    fn store_failure_propagates() {
        let store = five_dates();
        let mut selector = GroupSelector::open(&store, &settings(3), StdRng::seed_from_u64(1))
            .unwrap()
            .selector;
        store.go_offline();
        assert!(matches!(
            selector.next_selection(&store),
            Err(Error::StoreUnavailable(_))
        ));
    }
}
