//! Media record model and the source interface the gallery reads from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Stable identifier of a record inside the media index.
pub type MediaId = i64;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One photo or video entry.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: MediaId,
    /// Opaque resource reference handed to the renderer.
    pub locator: String,
    /// Capture time in epoch milliseconds.
    pub capture_timestamp: i64,
    /// Pixel dimensions, 0 when unknown.
    pub width: u32,
    pub height: u32,
    pub kind: MediaKind,
    #[serde(default)]
    pub duration_millis: u64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default = "default_volume")]
    pub volume: String,
}

pub const DEFAULT_VOLUME: &str = "external_primary";

fn default_volume() -> String {
    DEFAULT_VOLUME.to_string()
}

impl MediaRecord {
    pub fn image(id: MediaId, capture_timestamp: i64, width: u32, height: u32) -> Self {
        MediaRecord {
            id,
            locator: format!("content://media/external/images/media/{}", id),
            capture_timestamp,
            width,
            height,
            kind: MediaKind::Image,
            duration_millis: 0,
            is_favorite: false,
            volume: default_volume(),
        }
    }

    pub fn video(
        id: MediaId,
        capture_timestamp: i64,
        width: u32,
        height: u32,
        duration_millis: u64,
    ) -> Self {
        MediaRecord {
            id,
            locator: format!("content://media/external/video/media/{}", id),
            capture_timestamp,
            width,
            height,
            kind: MediaKind::Video,
            duration_millis,
            is_favorite: false,
            volume: default_volume(),
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    /// Duration label for video badges, `None` for stills.
    pub fn duration_label(&self) -> Option<String> {
        if self.is_video() {
            Some(format_duration(self.duration_millis))
        } else {
            None
        }
    }
}

/// What the permission boundary currently allows the app to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    Denied,
    Volumes(BTreeSet<String>),
    All,
}

impl AccessPolicy {
    /// Build a policy from configured volume names; an empty list means every volume.
    pub fn from_volumes<I, S>(volumes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = volumes.into_iter().map(Into::into).collect();
        if set.is_empty() {
            AccessPolicy::All
        } else {
            AccessPolicy::Volumes(set)
        }
    }

    pub fn allows(&self, volume: &str) -> bool {
        match self {
            AccessPolicy::Denied => false,
            AccessPolicy::Volumes(set) => set.contains(volume),
            AccessPolicy::All => true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Permission to read media was denied")]
    PermissionDenied,
    #[error("Media source unavailable: {0}")]
    Unavailable(String),
}

/// A queryable index of photo and video records.
///
/// Implementations return every record the policy allows. Ordering is only a
/// hint; callers sort on their own.
pub trait MediaSource: Send + Sync {
    fn query(&self, policy: &AccessPolicy) -> Result<Vec<MediaRecord>, SourceError>;
}

/// Source over a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<MediaRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<MediaRecord>) -> Self {
        InMemorySource { records }
    }

    pub fn from_json(data: &str) -> Result<Self, SourceError> {
        let records: Vec<MediaRecord> = serde_json::from_str(data)
            .map_err(|e| SourceError::Unavailable(format!("Invalid record JSON: {}", e)))?;
        Ok(InMemorySource { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MediaSource for InMemorySource {
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    fn query(&self, policy: &AccessPolicy) -> Result<Vec<MediaRecord>, SourceError> {
        if *policy == AccessPolicy::Denied {
            return Err(SourceError::PermissionDenied);
        }
        let items: Vec<MediaRecord> = self
            .records
            .iter()
            .filter(|r| policy.allows(&r.volume))
            .cloned()
            .collect();
        tracing::debug!(items = items.len(), "in-memory query");
        Ok(items)
    }
}

/// Format a duration as `M:SS`, or `H:MM:SS` from one hour on.
pub fn format_duration(duration_millis: u64) -> String {
    let total_seconds = duration_millis / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_json() {
        let json = r#"[
            {
                "id": 7,
                "locator": "content://media/external/video/media/7",
                "captureTimestamp": 1704067200000,
                "width": 1920,
                "height": 1080,
                "kind": "video",
                "durationMillis": 65000,
                "isFavorite": true
            }
        ]"#;

        let source = InMemorySource::from_json(json).unwrap();
        let items = source.query(&AccessPolicy::All).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_video());
        assert!(items[0].is_favorite);
        assert_eq!(items[0].volume, DEFAULT_VOLUME);
        assert_eq!(items[0].duration_label().as_deref(), Some("1:05"));
    }

    #[test]
    fn test_invalid_json_is_unavailable() {
        let res = InMemorySource::from_json("{not json");
        assert!(matches!(res, Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(9_999), "0:09");
        assert_eq!(format_duration(61_000), "1:01");
        assert_eq!(format_duration(3_600_000), "1:00:00");
        assert_eq!(format_duration(3_725_000), "1:02:05");
    }

    #[test]
    fn test_policy_filters_volumes() {
        let mut sd = MediaRecord::image(2, 10, 1, 1);
        sd.volume = "sdcard".into();
        let source = InMemorySource::new(vec![MediaRecord::image(1, 20, 1, 1), sd]);

        let only_sd = AccessPolicy::from_volumes(["sdcard"]);
        let items = source.query(&only_sd).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 2);

        let none = AccessPolicy::Volumes(BTreeSet::new());
        assert!(source.query(&none).unwrap().is_empty());

        assert_eq!(source.query(&AccessPolicy::Denied), Err(SourceError::PermissionDenied));
        assert_eq!(AccessPolicy::from_volumes(Vec::<String>::new()), AccessPolicy::All);
    }
}
