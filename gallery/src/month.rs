//! Locale-aware labels derived from capture timestamps.

use chrono::{DateTime, FixedOffset, Locale, Offset, Utc};

use crate::GalleryError;

const MONTH_YEAR: &str = "%B %Y";
const DAY_MONTH_YEAR: &str = "%B %-d, %Y";

/// Formats capture timestamps in one locale and UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct MonthLabeler {
    locale: Locale,
    offset: FixedOffset,
}

impl Default for MonthLabeler {
    fn default() -> Self {
        MonthLabeler {
            locale: Locale::en_US,
            offset: chrono::Local::now().offset().fix(),
        }
    }
}

impl MonthLabeler {
    pub fn new(locale: Locale, offset: FixedOffset) -> Self {
        MonthLabeler { locale, offset }
    }

    /// Build from config values. A missing offset means the local one.
    pub fn from_config(
        locale: &str,
        utc_offset_minutes: Option<i32>,
    ) -> Result<Self, GalleryError> {
        let locale = Locale::try_from(locale)
            .map_err(|_| GalleryError::InvalidLocale(locale.to_string()))?;
        let offset = match utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes * 60)
                .ok_or(GalleryError::InvalidOffset(minutes))?,
            None => chrono::Local::now().offset().fix(),
        };
        Ok(MonthLabeler { locale, offset })
    }

    pub fn utc(locale: Locale) -> Self {
        MonthLabeler {
            locale,
            offset: Utc.fix(),
        }
    }

    fn local_time(&self, timestamp_millis: i64) -> DateTime<FixedOffset> {
        DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }

    /// "Month Year", e.g. "January 2024".
    pub fn month_label(&self, timestamp_millis: i64) -> String {
        self.local_time(timestamp_millis)
            .format_localized(MONTH_YEAR, self.locale)
            .to_string()
    }

    /// "Month d, Year", e.g. "January 5, 2024".
    pub fn day_label(&self, timestamp_millis: i64) -> String {
        self.local_time(timestamp_millis)
            .format_localized(DAY_MONTH_YEAR, self.locale)
            .to_string()
    }

    /// Two-line card title, e.g. "JAN\n2024".
    pub fn memory_title(&self, timestamp_millis: i64) -> String {
        let t = self.local_time(timestamp_millis);
        format!(
            "{}\n{}",
            t.format_localized("%b", self.locale).to_string().to_uppercase(),
            t.format("%Y")
        )
    }
}
