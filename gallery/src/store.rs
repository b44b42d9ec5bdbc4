//! Observable gallery state owned by the UI loop.

use media_source::{MediaId, MediaRecord};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::aggregator::{Aggregator, GalleryContent, MonthBucket};
use crate::GalleryError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryState {
    Loading,
    Loaded {
        records: Arc<Vec<MediaRecord>>,
        buckets: Arc<Vec<MonthBucket>>,
    },
    Failed {
        message: String,
    },
}

impl GalleryState {
    pub fn is_loading(&self) -> bool {
        matches!(self, GalleryState::Loading)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerNavState {
    Hidden,
    Viewing { initial_index: usize },
}

/// Result of one refresh, tagged with the generation that issued it.
#[derive(Debug)]
pub struct FetchCompletion {
    pub generation: u64,
    pub result: Result<GalleryContent, GalleryError>,
}

/// Holds the current [`GalleryState`] and viewer navigation state.
///
/// Lives on a single owner loop. Fetches run on the runtime and report back
/// through a completion channel; only the latest refresh may be applied.
pub struct GalleryStore {
    aggregator: Aggregator,
    state: GalleryState,
    viewer: ViewerNavState,
    generation: u64,
    state_subscribers: Vec<mpsc::UnboundedSender<GalleryState>>,
    viewer_subscribers: Vec<mpsc::UnboundedSender<ViewerNavState>>,
    completion_tx: mpsc::UnboundedSender<FetchCompletion>,
    completion_rx: mpsc::UnboundedReceiver<FetchCompletion>,
}

impl GalleryStore {
    pub fn new(aggregator: Aggregator) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        GalleryStore {
            aggregator,
            state: GalleryState::Loading,
            viewer: ViewerNavState::Hidden,
            generation: 0,
            state_subscribers: Vec::new(),
            viewer_subscribers: Vec::new(),
            completion_tx,
            completion_rx,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn viewer_state(&self) -> ViewerNavState {
        self.viewer
    }

    /// Records of the current `Loaded` state, empty otherwise.
    pub fn records(&self) -> &[MediaRecord] {
        match &self.state {
            GalleryState::Loaded { records, .. } => records.as_slice(),
            _ => &[],
        }
    }

    /// Receive the current state followed by every transition.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<GalleryState> {
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(self.state.clone()).is_ok() {
            self.state_subscribers.push(tx);
        }
        rx
    }

    pub fn subscribe_viewer(&mut self) -> mpsc::UnboundedReceiver<ViewerNavState> {
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(self.viewer).is_ok() {
            self.viewer_subscribers.push(tx);
        }
        rx
    }

    fn set_state(&mut self, state: GalleryState) {
        self.state = state;
        let current = &self.state;
        self.state_subscribers.retain(|tx| tx.send(current.clone()).is_ok());
    }

    fn set_viewer(&mut self, viewer: ViewerNavState) {
        self.viewer = viewer;
        self.viewer_subscribers.retain(|tx| tx.send(viewer).is_ok());
    }

    /// Switch to `Loading` and start a fetch. Returns the new generation.
    ///
    /// Must be called from within a tokio runtime.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn refresh(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        self.set_state(GalleryState::Loading);

        let aggregator = self.aggregator.clone();
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = aggregator.load().await;
            if let Err(e) = tx.send(FetchCompletion { generation, result }) {
                tracing::error!(error = ?e, "Failed to deliver fetch completion");
            }
        });
        tracing::debug!(generation, "Refresh started");
        generation
    }

    /// Apply a completion if it belongs to the latest refresh.
    pub fn apply(&mut self, completion: FetchCompletion) -> bool {
        if completion.generation != self.generation {
            tracing::debug!(
                generation = completion.generation,
                latest = self.generation,
                "Dropping superseded fetch result"
            );
            return false;
        }
        match completion.result {
            Ok(content) => self.set_state(GalleryState::Loaded {
                records: Arc::new(content.records),
                buckets: Arc::new(content.buckets),
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Gallery refresh failed");
                self.set_state(GalleryState::Failed {
                    message: e.to_string(),
                })
            }
        }
        true
    }

    /// Wait for the next fetch to finish and apply it.
    pub async fn next_completion(&mut self) -> bool {
        match self.completion_rx.recv().await {
            Some(completion) => self.apply(completion),
            None => false,
        }
    }

    /// Apply every completion that has already arrived. Returns how many were applied.
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Open the viewer on `id` if it is part of the loaded records.
    pub fn request_viewer(&mut self, id: MediaId) -> bool {
        let index = match &self.state {
            GalleryState::Loaded { records, .. } => records.iter().position(|r| r.id == id),
            _ => None,
        };
        match index {
            Some(initial_index) => {
                self.set_viewer(ViewerNavState::Viewing { initial_index });
                true
            }
            None => {
                tracing::debug!(id, "Viewer request ignored");
                false
            }
        }
    }

    pub fn close_viewer(&mut self) {
        self.set_viewer(ViewerNavState::Hidden);
    }
}
