use media_source::MediaRecord;
use serde::Serialize;

/// Text shown over the current page while the overlay is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataOverlay {
    pub date: String,
    /// `None` when the source did not report dimensions.
    pub dimensions: Option<String>,
    pub duration: Option<String>,
}

impl MetadataOverlay {
    /// `date` is the already localized capture date of `record`.
    pub fn for_record(record: &MediaRecord, date: impl Into<String>) -> Self {
        let dimensions = (record.width > 0 && record.height > 0)
            .then(|| format!("{} × {}", record.width, record.height));
        let duration = record.duration_label();
        MetadataOverlay {
            date: date.into(),
            dimensions,
            duration,
        }
    }
}
