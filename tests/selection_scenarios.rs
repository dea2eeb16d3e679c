use std::collections::HashSet;

use grouped_slideshow::config::Settings;
use grouped_slideshow::error::ConfigurationError;
use grouped_slideshow::selector::GroupKey;
use grouped_slideshow::session::Session;
use grouped_slideshow::store::SqliteStore;
use rusqlite::{Connection, params};
use tempfile::TempDir;

const SCHEMA: &str = "
CREATE TABLE Files (idFile INTEGER PRIMARY KEY, strPath TEXT, strFilename TEXT, ImageDateTime TEXT);
CREATE TABLE TagTypes (idTagType INTEGER PRIMARY KEY, TagType TEXT);
CREATE TABLE TagContents (idTagContent INTEGER PRIMARY KEY, idTagType INTEGER, TagContent TEXT);
CREATE TABLE TagsInFiles (idTagContent INTEGER, idFile INTEGER);
CREATE TABLE FilterWizard (pkFilter INTEGER PRIMARY KEY, strFilterName TEXT, bMatchAll INTEGER, dateStart TEXT, dateEnd TEXT);
CREATE TABLE FilterWizardItems (fkFilter INTEGER, strItem TEXT, intCondition INTEGER);
";

/// A library on disk: ten pictures a minute apart on 2019-08-10, six burst
/// frames on 2019-08-11 and a tagged video on 2019-08-12.
fn library(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("MyPictures.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    for i in 0..10 {
        conn.execute(
            "INSERT INTO Files VALUES (?1, '/lib/walk', ?2, ?3)",
            params![i + 1, format!("walk{i}.jpg"), format!("2019-08-10 14:{i:02}:00")],
        )
        .unwrap();
    }
    for i in 0..6 {
        conn.execute(
            "INSERT INTO Files VALUES (?1, '/lib/race', ?2, ?3)",
            params![i + 20, format!("race{i}.jpg"), format!("2019-08-11 16:00:0{i}")],
        )
        .unwrap();
    }
    conn.execute_batch(
        "
        INSERT INTO Files VALUES (30, '/lib/clips', 'party.mp4', '2019-08-12 20:00:00');
        INSERT INTO TagTypes VALUES (1, 'Keywords');
        INSERT INTO TagContents VALUES (1, 1, 'dog'), (2, 1, 'party');
        INSERT INTO TagsInFiles VALUES (1, 5), (1, 22), (2, 30);
        INSERT INTO FilterWizard VALUES (1, 'Dog', 0, NULL, NULL), (2, 'Party', 0, NULL, NULL);
        INSERT INTO FilterWizardItems VALUES (1, 'dog', 1), (2, 'party', 1);
        ",
    )
    .unwrap();
    path
}

fn settings(seed: u64) -> Settings {
    Settings {
        group_limit: 3,
        shuffle_seed: Some(seed),
        ..Settings::default()
    }
}

#[test]
fn date_pool_covers_every_day_once_per_pass() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(library(&dir)).unwrap();
    let mut session = Session::start(store, settings(5)).unwrap();
    assert_eq!(session.selector().pool_len(), 3);

    let plan = session.plan(9).unwrap();
    for pass in plan.chunks(3) {
        let days: HashSet<_> = pass.iter().map(|s| s.key).collect();
        assert_eq!(days.len(), 3);
    }
}

#[test]
fn spaced_day_shows_a_three_picture_window() {
    let dir = TempDir::new().unwrap();
    let path = library(&dir);
    let mut offsets = HashSet::new();
    for seed in 0..40 {
        let store = SqliteStore::open(&path).unwrap();
        let mut session = Session::start(store, settings(seed)).unwrap();
        for selection in session.plan(3).unwrap() {
            if selection.key.date().to_string() != "2019-08-10" {
                continue;
            }
            assert!(selection.start_offset <= 7);
            assert!(!selection.group.is_burst());
            assert_eq!(selection.group.len(), 3);
            assert_eq!(
                selection.group.pictures[0].filename,
                format!("walk{}.jpg", selection.start_offset)
            );
            offsets.insert(selection.start_offset);
        }
    }
    assert!(offsets.len() > 1, "offsets never varied: {offsets:?}");
}

#[test]
fn burst_day_plays_the_whole_cluster() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(library(&dir)).unwrap();
    let mut session = Session::start(store, settings(11)).unwrap();
    let burst = session
        .plan(3)
        .unwrap()
        .into_iter()
        .find(|s| s.key.date().to_string() == "2019-08-11")
        .unwrap();
    assert!(burst.group.is_burst());
    assert_eq!(burst.group.len(), 6);
}

#[test]
fn filtered_groups_start_at_the_matching_picture() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(library(&dir)).unwrap();
    let settings = Settings {
        use_filter: true,
        filter_name: "Dog".into(),
        ..settings(2)
    };
    let mut session = Session::start(store, settings).unwrap();
    assert!(session.configuration_problem().is_none());
    assert_eq!(session.selector().filter_name(), Some("Dog"));
    assert_eq!(session.selector().pool_len(), 2);

    for selection in session.plan(4).unwrap() {
        let GroupKey::FilterMatch(found) = selection.key else {
            panic!("expected a filter match, got {}", selection.key);
        };
        match found.picture.0 {
            // walk4.jpg starts a plain window
            5 => {
                assert_eq!(selection.start_offset, 4);
                assert_eq!(selection.group.pictures[0].filename, "walk4.jpg");
                assert_eq!(selection.group.len(), 3);
            }
            // race2.jpg sits inside the burst
            22 => {
                assert_eq!(selection.start_offset, 2);
                assert!(selection.group.is_burst());
                assert_eq!(selection.group.pictures[0].filename, "race0.jpg");
            }
            other => panic!("unexpected match {other}"),
        }
    }
}

#[test]
fn filter_of_videos_falls_back_to_dates() {
    let dir = TempDir::new().unwrap();
    let store = SqliteStore::open(library(&dir)).unwrap();
    let settings = Settings {
        use_filter: true,
        filter_name: "Party".into(),
        ..settings(2)
    };
    let mut session = Session::start(store, settings).unwrap();
    assert_eq!(
        session.configuration_problem(),
        Some(&ConfigurationError::EmptyFilter("Party".into()))
    );
    assert!(!session.selector().is_filtered());

    // the video's day stays in the pool but has nothing displayable
    let plan = session.plan(3).unwrap();
    let video_day = plan
        .iter()
        .find(|s| s.key.date().to_string() == "2019-08-12")
        .unwrap();
    assert!(video_day.group.is_empty());
}
