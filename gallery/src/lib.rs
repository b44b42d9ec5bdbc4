//! Gallery aggregation and state for the photos app.

mod aggregator;
mod memories;
mod month;
mod store;

pub use aggregator::{grid_rows, sort_newest_first, Aggregator, GalleryContent, MonthBucket};
pub use memories::{memories, Memory};
pub use month::MonthLabeler;
pub use store::{FetchCompletion, GalleryState, GalleryStore, ViewerNavState};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GalleryError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Unknown locale: {0}")]
    InvalidLocale(String),
    #[error("Invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),
}
