use media_source::MediaId;
use serde::Serialize;

use crate::aggregator::MonthBucket;
use crate::month::MonthLabeler;

/// A featured card shown in the memories carousel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: usize,
    pub title: String,
    pub cover: Option<MediaId>,
    pub record_count: usize,
}

/// One card per month bucket, newest first, at most `limit` cards.
///
/// The cover prefers the first still image of the month and falls back to
/// its first record.
pub fn memories(buckets: &[MonthBucket], labeler: &MonthLabeler, limit: usize) -> Vec<Memory> {
    buckets
        .iter()
        .filter(|b| !b.is_empty())
        .take(limit)
        .enumerate()
        .map(|(id, bucket)| {
            let cover = bucket
                .records
                .iter()
                .find(|r| !r.is_video())
                .or_else(|| bucket.records.first());
            Memory {
                id,
                title: labeler.memory_title(bucket.records[0].capture_timestamp),
                cover: cover.map(|r| r.id),
                record_count: bucket.len(),
            }
        })
        .collect()
}
