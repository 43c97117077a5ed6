pub mod download;
pub mod raster;

pub use download::{DownloadSink, FileSink, DOWNLOAD_FILE_NAME};
pub use raster::{capture_png, render_card, CardTheme, RenderOptions};

use crate::error::CaptureError;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureId(u64);

impl fmt::Display for CaptureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// PNG bytes produced by one capture. Handed to the download sink once,
/// then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureArtifact {
    pub id: CaptureId,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Capturing,
    Ready,
    Failed { id: CaptureId, message: String },
}

/// Result of handing a finished capture to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Ready,
    Failed(String),
    /// The id was not in flight: already completed or never issued.
    Unknown,
}

/// Rasterize-then-download sequencing.
///
/// Every `begin` gets its own id. A completed artifact is queued as ready
/// and can be taken exactly once, so a redraw never triggers a second
/// download of the same capture. The reported failure always belongs to the
/// newest capture that has finished.
#[derive(Debug, Default)]
pub struct CapturePipeline {
    next_id: u64,
    in_flight: BTreeSet<CaptureId>,
    ready: VecDeque<CaptureArtifact>,
    newest_finished: Option<CaptureId>,
    failure: Option<(CaptureId, String)>,
}

impl CapturePipeline {
    pub fn begin(&mut self) -> CaptureId {
        self.next_id += 1;
        let id = CaptureId(self.next_id);
        self.in_flight.insert(id);
        self.failure = None;
        id
    }

    pub fn complete(&mut self, id: CaptureId, result: Result<Vec<u8>, CaptureError>) -> Completion {
        if !self.in_flight.remove(&id) {
            tracing::warn!(%id, "ignoring completion of unknown capture");
            return Completion::Unknown;
        }

        // An older capture finishing late does not override a newer outcome.
        let newest = self.newest_finished.map_or(true, |newest| id > newest);
        if newest {
            self.newest_finished = Some(id);
        }

        match result {
            Ok(png) => {
                tracing::debug!(%id, bytes = png.len(), "capture ready");
                self.ready.push_back(CaptureArtifact { id, png });
                if newest {
                    self.failure = None;
                }
                Completion::Ready
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "capture failed");
                let message = e.to_string();
                if newest {
                    self.failure = Some((id, message.clone()));
                }
                Completion::Failed(message)
            }
        }
    }

    /// Take the oldest ready artifact for delivery.
    pub fn take_ready(&mut self) -> Option<CaptureArtifact> {
        self.ready.pop_front()
    }

    pub fn phase(&self) -> CapturePhase {
        if !self.ready.is_empty() {
            CapturePhase::Ready
        } else if !self.in_flight.is_empty() {
            CapturePhase::Capturing
        } else if let Some((id, message)) = &self.failure {
            CapturePhase::Failed {
                id: *id,
                message: message.clone(),
            }
        } else {
            CapturePhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_capture_lifecycle() {
        let mut pipeline = CapturePipeline::default();
        assert_eq!(pipeline.phase(), CapturePhase::Idle);

        let id = pipeline.begin();
        assert_eq!(pipeline.phase(), CapturePhase::Capturing);

        assert_eq!(pipeline.complete(id, Ok(vec![1, 2, 3])), Completion::Ready);
        assert_eq!(pipeline.phase(), CapturePhase::Ready);

        let artifact = pipeline.take_ready().unwrap();
        assert_eq!(artifact.id, id);
        assert_eq!(artifact.png, vec![1, 2, 3]);
        assert_eq!(pipeline.phase(), CapturePhase::Idle);

        // Ready is one-shot.
        assert!(pipeline.take_ready().is_none());
    }

    #[test]
    fn test_two_captures_deliver_independently() {
        let mut pipeline = CapturePipeline::default();
        let first = pipeline.begin();
        let second = pipeline.begin();
        assert_ne!(first, second);

        pipeline.complete(second, Ok(vec![2]));
        pipeline.complete(first, Ok(vec![1]));

        let a = pipeline.take_ready().unwrap();
        let b = pipeline.take_ready().unwrap();
        assert_eq!((a.id, a.png), (second, vec![2]));
        assert_eq!((b.id, b.png), (first, vec![1]));
        assert!(pipeline.take_ready().is_none());
    }

    #[test]
    fn test_failure_is_reported_and_cleared_by_retry() {
        let mut pipeline = CapturePipeline::default();
        let id = pipeline.begin();
        let completion = pipeline.complete(id, Err(CaptureError::Worker("panicked".into())));
        assert!(matches!(completion, Completion::Failed(m) if m.contains("panicked")));

        match pipeline.phase() {
            CapturePhase::Failed { id: failed, message } => {
                assert_eq!(failed, id);
                assert!(message.contains("panicked"));
            }
            other => panic!("unexpected phase {:?}", other),
        }

        pipeline.begin();
        assert_eq!(pipeline.phase(), CapturePhase::Capturing);
    }

    #[test]
    fn test_duplicate_completion_is_ignored() {
        let mut pipeline = CapturePipeline::default();
        let id = pipeline.begin();
        assert_eq!(pipeline.complete(id, Ok(vec![])), Completion::Ready);
        assert_eq!(pipeline.complete(id, Ok(vec![])), Completion::Unknown);
        assert!(pipeline.take_ready().is_some());
        assert!(pipeline.take_ready().is_none());
    }

    #[test]
    fn test_newer_success_clears_overlapping_failure() {
        let mut pipeline = CapturePipeline::default();
        let first = pipeline.begin();
        let second = pipeline.begin();

        let completion = pipeline.complete(first, Err(CaptureError::Worker("boom".into())));
        assert!(matches!(completion, Completion::Failed(_)));
        assert_eq!(pipeline.phase(), CapturePhase::Capturing);

        assert_eq!(pipeline.complete(second, Ok(vec![2])), Completion::Ready);
        assert_eq!(pipeline.take_ready().unwrap().id, second);
        assert_eq!(pipeline.phase(), CapturePhase::Idle);
    }

    #[test]
    fn test_late_older_failure_keeps_newer_success() {
        let mut pipeline = CapturePipeline::default();
        let first = pipeline.begin();
        let second = pipeline.begin();

        pipeline.complete(second, Ok(vec![2]));
        pipeline.take_ready();
        pipeline.complete(first, Err(CaptureError::Worker("late".into())));
        assert_eq!(pipeline.phase(), CapturePhase::Idle);

        let third = pipeline.begin();
        let fourth = pipeline.begin();
        pipeline.complete(fourth, Err(CaptureError::Worker("newest".into())));
        pipeline.complete(third, Ok(vec![3]));
        pipeline.take_ready();
        assert!(matches!(
            pipeline.phase(),
            CapturePhase::Failed { id, .. } if id == fourth
        ));
    }
}
