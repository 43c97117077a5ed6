use crate::avatar;
use crate::capture::{capture_png, CaptureId, RenderOptions};
use crate::error::CaptureError;
use crate::lookup::ProfileLookup;
use crate::message::{Effect, SessionEvent};
use crate::state::{PreviewState, RequestToken};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Runs background work on the tokio runtime and reports every completion
/// as a [`SessionEvent`].
#[derive(Clone)]
pub struct Worker {
    tx: UnboundedSender<SessionEvent>,
    lookup: Arc<dyn ProfileLookup>,
    client: reqwest::Client,
    render: RenderOptions,
}

impl Worker {
    pub fn new(
        tx: UnboundedSender<SessionEvent>,
        lookup: Arc<dyn ProfileLookup>,
        client: reqwest::Client,
        render: RenderOptions,
    ) -> Self {
        Self {
            tx,
            lookup,
            client,
            render,
        }
    }

    fn send(tx: &UnboundedSender<SessionEvent>, event: SessionEvent) {
        if tx.send(event).is_err() {
            tracing::debug!("session closed before task finished");
        }
    }

    pub fn load_avatar_file(&self, token: RequestToken, path: PathBuf) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = avatar::load_file(&path).await;
            Self::send(&tx, SessionEvent::AvatarLoaded { token, result });
        });
    }

    pub fn fetch_avatar(&self, token: RequestToken, url: String) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = avatar::fetch_remote(&client, &url).await;
            Self::send(&tx, SessionEvent::AvatarLoaded { token, result });
        });
    }

    pub fn lookup(&self, token: RequestToken, query: String) {
        let tx = self.tx.clone();
        let lookup = Arc::clone(&self.lookup);
        tokio::spawn(async move {
            let result = lookup.lookup(&query).await;
            Self::send(
                &tx,
                SessionEvent::LookupFinished {
                    token,
                    query,
                    result,
                },
            );
        });
    }

    /// Rasterizes on the blocking pool; a panic there is reported as a
    /// failed capture instead of leaving the pipeline waiting.
    pub fn capture(&self, id: CaptureId, state: PreviewState) {
        let tx = self.tx.clone();
        let render = self.render;
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || capture_png(&state, render))
                .await
                .unwrap_or_else(|e| Err(CaptureError::Worker(e.to_string())));
            Self::send(&tx, SessionEvent::CaptureFinished { id, result });
        });
    }

    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::FetchAvatar { token, url } => self.fetch_avatar(token, url),
        }
    }
}
