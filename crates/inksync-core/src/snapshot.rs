//! Rebuilds the visible drawing from the relay's stroke history.
//!
//! A load is split in two: [`SnapshotLoader::begin`] clears the surface and
//! returns the `strokes` request to send; [`SnapshotLoader::complete`] replays
//! the response when it arrives. Responses always draw against the extent
//! current at completion, so a response that was overtaken by a later resize
//! still lands at the right scale.

use crate::canvas::Canvas;
use crate::protocol::{ClientMessage, StrokesResponse};
use crate::reconcile::RemoteStrokeReconciler;
use crate::surface::RasterSurface;
use std::collections::BTreeSet;

/// What a completed load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOutcome {
    pub request_id: u64,
    pub strokes_replayed: usize,
    pub segments_drawn: usize,
    /// A newer load was issued after this one.
    pub stale: bool,
}

#[derive(Debug, Default)]
pub struct SnapshotLoader {
    next_id: u64,
    pending: BTreeSet<u64>,
}

impl SnapshotLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the surface and issue a history request.
    pub fn begin<S: RasterSurface>(&mut self, canvas: &mut Canvas<S>) -> ClientMessage {
        canvas.clear();
        self.next_id += 1;
        self.pending.insert(self.next_id);
        log::debug!("Snapshot load {} issued at {:?}", self.next_id, canvas.extent());
        ClientMessage::RequestStrokes { request_id: self.next_id }
    }

    /// Requests still waiting for a response.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Forget every outstanding request. Their responses are ignored when
    /// they arrive. Returns how many were dropped.
    pub fn cancel(&mut self) -> usize {
        let dropped = self.pending.len();
        if dropped > 0 {
            log::debug!("Cancelling {} outstanding snapshot loads", dropped);
        }
        self.pending.clear();
        dropped
    }

    pub fn latest_request(&self) -> Option<u64> {
        (self.next_id > 0).then_some(self.next_id)
    }

    /// Replay a history response.
    ///
    /// Responses without a request id are matched to the most recent
    /// outstanding request. Responses for unknown requests are ignored.
    pub fn complete<S: RasterSurface>(
        &mut self,
        response: &StrokesResponse,
        canvas: &mut Canvas<S>,
        reconciler: &mut RemoteStrokeReconciler,
    ) -> Option<SnapshotOutcome> {
        let request_id = match response.request_id {
            Some(id) => id,
            None => *self.pending.last()?,
        };
        if !self.pending.remove(&request_id) {
            log::debug!("Ignoring strokes response for unknown request {}", request_id);
            return None;
        }

        let stale = request_id != self.next_id;
        if stale {
            log::debug!(
                "Snapshot {} completed after newer load {}, drawing at current extent",
                request_id,
                self.next_id
            );
        }

        let strokes = response.strokes.as_deref().unwrap_or_default();
        let segments_drawn: usize = strokes
            .iter()
            .map(|stroke| reconciler.replay(stroke, canvas))
            .sum();

        log::debug!(
            "Snapshot {} replayed {} strokes ({} segments) at {:?}",
            request_id,
            strokes.len(),
            segments_drawn,
            canvas.extent()
        );

        Some(SnapshotOutcome {
            request_id,
            strokes_replayed: strokes.len(),
            segments_drawn,
            stale,
        })
    }
}
