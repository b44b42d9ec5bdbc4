//! Fetching, sorting and month grouping of media records.

use media_source::{AccessPolicy, MediaRecord, MediaSource, SourceError};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::month::MonthLabeler;
use crate::GalleryError;

/// Records sharing one formatted capture month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub label: String,
    pub records: Vec<MediaRecord>,
}

impl MonthBucket {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fetched records together with their month buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryContent {
    pub records: Vec<MediaRecord>,
    pub buckets: Vec<MonthBucket>,
}

/// Stable sort by capture time, newest first.
pub fn sort_newest_first(mut records: Vec<MediaRecord>) -> Vec<MediaRecord> {
    records.sort_by(|a, b| b.capture_timestamp.cmp(&a.capture_timestamp));
    records
}

/// Rows needed to lay out `count` thumbnails in a fixed column grid.
pub fn grid_rows(count: usize, columns: usize) -> usize {
    if columns == 0 {
        return 0;
    }
    count.div_ceil(columns)
}

#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn MediaSource>,
    policy: AccessPolicy,
    labeler: MonthLabeler,
}

impl Aggregator {
    pub fn new(source: Arc<dyn MediaSource>, policy: AccessPolicy, labeler: MonthLabeler) -> Self {
        Aggregator {
            source,
            policy,
            labeler,
        }
    }

    pub fn labeler(&self) -> &MonthLabeler {
        &self.labeler
    }

    /// Query the source on a blocking worker and sort the result newest first.
    ///
    /// Nothing is cached; every call queries again. A failed query yields no
    /// partial result.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn fetch(&self) -> Result<Vec<MediaRecord>, GalleryError> {
        let source = Arc::clone(&self.source);
        let policy = self.policy.clone();
        let records = tokio::task::spawn_blocking(move || source.query(&policy))
            .await
            .map_err(|e| {
                GalleryError::SourceUnavailable(format!("Media query task failed: {}", e))
            })?
            .map_err(|e| match e {
                SourceError::PermissionDenied => {
                    GalleryError::SourceUnavailable("Permission to read media was denied".into())
                }
                SourceError::Unavailable(msg) => GalleryError::SourceUnavailable(msg),
            })?;
        tracing::debug!(items = records.len(), "Fetched media records");
        Ok(sort_newest_first(records))
    }

    /// Group records by formatted month, in order of first appearance.
    pub fn group_by_month(&self, records: &[MediaRecord]) -> Vec<MonthBucket> {
        let mut buckets: Vec<MonthBucket> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for record in records {
            let label = self.labeler.month_label(record.capture_timestamp);
            match positions.get(&label) {
                Some(&pos) => buckets[pos].records.push(record.clone()),
                None => {
                    positions.insert(label.clone(), buckets.len());
                    buckets.push(MonthBucket {
                        label,
                        records: vec![record.clone()],
                    });
                }
            }
        }
        buckets
    }

    /// Fetch and group in one step.
    pub async fn load(&self) -> Result<GalleryContent, GalleryError> {
        let records = self.fetch().await?;
        let buckets = self.group_by_month(&records);
        tracing::info!(items = records.len(), months = buckets.len(), "Gallery loaded");
        Ok(GalleryContent { records, buckets })
    }
}
