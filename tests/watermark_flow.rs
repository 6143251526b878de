//! End-to-end checks of the watermark protocol: new-item detection,
//! ordering, advance monotonicity, and store failure behavior.

use chrono::{DateTime, TimeZone, Utc};
use tubecast::feed::types::FeedItem;
use tubecast::watermark::{advance, newer_than, WatermarkStore};

fn item(id: &str, published: DateTime<Utc>) -> FeedItem {
    FeedItem {
        video_id: id.to_string(),
        title: format!("video {id}"),
        link: format!("https://www.youtube.com/watch?v={id}"),
        published,
        author: "Example Channel".to_string(),
    }
}

fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

#[test]
fn test_first_run_processes_whole_feed_in_order() {
    // 1. No store file yet -> no watermark
    let dir = tempfile::tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("last_seen.json"));
    assert_eq!(store.load(), None);

    // 2. Feed is newest-first; everything counts as new
    let feed = vec![item("t3", ts(3, 0)), item("t2", ts(2, 0)), item("t1", ts(1, 0))];
    let fresh = newer_than(&feed, store.load());
    let ids: Vec<&str> = fresh.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t2", "t3"]);

    // 3. Advancing through all three lands on the newest
    let mut watermark = store.load();
    for it in &fresh {
        let next = advance(watermark, it.published);
        store.persist(next).unwrap();
        watermark = Some(next);
    }
    assert_eq!(store.load(), Some(ts(3, 0)));

    // 4. Second run against the same feed finds nothing
    assert!(newer_than(&feed, store.load()).is_empty());
}

#[test]
fn test_watermark_boundary_is_strict() {
    let feed = vec![item("t3", ts(3, 0)), item("t2", ts(2, 0)), item("t1", ts(1, 0))];
    let fresh = newer_than(&feed, Some(ts(2, 0)));
    let ids: Vec<&str> = fresh.iter().map(|i| i.video_id.as_str()).collect();
    assert_eq!(ids, vec!["t3"]);
}

#[test]
fn test_recomputation_is_idempotent() {
    let feed = vec![item("t2", ts(2, 0)), item("t1", ts(1, 0))];
    let first = newer_than(&feed, Some(ts(1, 0)));
    let second = newer_than(&feed, Some(ts(1, 0)));
    assert_eq!(first, second);
}

#[test]
fn test_advance_is_monotone() {
    assert_eq!(advance(Some(ts(3, 0)), ts(1, 0)), ts(3, 0));
    assert_eq!(advance(Some(ts(1, 0)), ts(3, 0)), ts(3, 0));
    assert_eq!(advance(None, ts(1, 0)), ts(1, 0));
}

#[test]
fn test_malformed_store_reprocesses_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_seen.json");
    std::fs::write(&path, "{{{{ definitely not json").unwrap();

    let store = WatermarkStore::new(&path);
    // Treated as absent, not fatal
    assert_eq!(store.load(), None);

    let feed = vec![item("t2", ts(2, 0)), item("t1", ts(1, 0))];
    let fresh = newer_than(&feed, store.load());
    assert_eq!(fresh.len(), 2);

    // A successful persist repairs the store
    store.persist(ts(2, 0)).unwrap();
    assert_eq!(store.load(), Some(ts(2, 0)));
}

#[test]
fn test_empty_feed_leaves_watermark_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = WatermarkStore::new(dir.path().join("last_seen.json"));
    store.persist(ts(5, 0)).unwrap();

    let fresh = newer_than(&[], store.load());
    assert!(fresh.is_empty());
    assert_eq!(store.load(), Some(ts(5, 0)));
}

#[test]
fn test_store_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_seen.json");
    WatermarkStore::new(&path).persist(ts(4, 12)).unwrap();

    // A fresh handle (next process run) sees the same value
    let reopened = WatermarkStore::new(&path);
    assert_eq!(reopened.load(), Some(ts(4, 12)));
}
