use chrono::Locale;
use gallery::{Aggregator, GalleryState, GalleryStore, MonthLabeler, ViewerNavState};
use media_index::MediaIndex;
use media_source::{AccessPolicy, MediaRecord};
use std::sync::Arc;
use tempfile::NamedTempFile;

const DAY: i64 = 86_400_000;
// 2024-03-01T00:00:00Z
const MARCH_2024: i64 = 1_709_251_200_000;
// 2024-01-01T00:00:00Z
const JAN_2024: i64 = 1_704_067_200_000;

fn indexed(records: &[MediaRecord]) -> (NamedTempFile, Arc<MediaIndex>) {
    let file = NamedTempFile::new().unwrap();
    let index = MediaIndex::new(file.path()).unwrap();
    index.insert_records(records).unwrap();
    (file, Arc::new(index))
}

fn sample_records() -> Vec<MediaRecord> {
    vec![
        MediaRecord::image(1, JAN_2024 + 3 * DAY, 10, 10),
        MediaRecord::image(2, MARCH_2024 + 10 * DAY, 10, 10),
        MediaRecord::video(3, MARCH_2024 + 2 * DAY, 10, 10, 3_000),
        MediaRecord::image(4, JAN_2024 + 20 * DAY, 10, 10),
        MediaRecord::image(5, MARCH_2024 + 20 * DAY, 10, 10),
    ]
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let (_file, index) = indexed(&sample_records());
    let agg = Aggregator::new(index, AccessPolicy::All, MonthLabeler::utc(Locale::en_US));
    let first = agg.fetch().await.unwrap();
    let second = agg.fetch().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_buckets_follow_first_appearance_and_newest_first() {
    let (_file, index) = indexed(&sample_records());
    let agg = Aggregator::new(index, AccessPolicy::All, MonthLabeler::utc(Locale::en_US));
    let records = agg.fetch().await.unwrap();
    let buckets = agg.group_by_month(&records);

    let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["March 2024", "January 2024"]);
    for bucket in &buckets {
        assert!(bucket
            .records
            .windows(2)
            .all(|w| w[0].capture_timestamp >= w[1].capture_timestamp));
    }
    let flattened: Vec<_> = buckets.iter().flat_map(|b| b.records.iter().map(|r| r.id)).collect();
    let global: Vec<_> = records.iter().map(|r| r.id).collect();
    assert_eq!(flattened, global);
    assert_eq!(global, vec![5, 2, 3, 4, 1]);
}

#[tokio::test]
async fn test_store_loads_index_and_opens_viewer() {
    let (_file, index) = indexed(&sample_records());
    let mut store = GalleryStore::new(Aggregator::new(
        index,
        AccessPolicy::All,
        MonthLabeler::utc(Locale::en_US),
    ));
    let mut nav = store.subscribe_viewer();
    assert_eq!(nav.recv().await, Some(ViewerNavState::Hidden));

    store.refresh();
    assert!(store.next_completion().await);
    match store.state() {
        GalleryState::Loaded { records, buckets } => {
            assert_eq!(records.len(), 5);
            assert_eq!(buckets.len(), 2);
        }
        other => panic!("expected Loaded, got {:?}", other),
    }

    assert!(store.request_viewer(3));
    assert_eq!(nav.recv().await, Some(ViewerNavState::Viewing { initial_index: 2 }));
    store.close_viewer();
    assert_eq!(nav.recv().await, Some(ViewerNavState::Hidden));
}

#[tokio::test]
async fn test_unauthorized_volume_yields_empty_gallery() {
    let (_file, index) = indexed(&sample_records());
    let mut store = GalleryStore::new(Aggregator::new(
        index,
        AccessPolicy::from_volumes(["sdcard"]),
        MonthLabeler::utc(Locale::en_US),
    ));
    store.refresh();
    store.next_completion().await;
    assert!(matches!(store.state(), GalleryState::Loaded { records, .. } if records.is_empty()));
}
