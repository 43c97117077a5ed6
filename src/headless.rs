use crate::avatar;
use crate::capture::{capture_png, CapturePhase, DownloadSink, RenderOptions};
use crate::error::CaptureError;
use crate::lang::Language;
use crate::lookup::ProfileLookup;
use crate::message::{Effect, SessionEvent};
use crate::session::{Counter, Session, StatusKind};
use crate::state::{PreviewState, Verified};
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

/// Field values for a one-shot export. Explicit values win over anything a
/// lookup filled in.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub body: Option<String>,
    pub avatar: Option<PathBuf>,
    pub retweets: Option<String>,
    pub quotes: Option<String>,
    pub likes: Option<String>,
    pub verified: bool,
    pub fetch: bool,
    pub language: Language,
}

/// Runs the editor's pipeline without a terminal: optional lookup, avatar,
/// capture, delivery. Returns where the PNG was written.
pub async fn render(
    request: RenderRequest,
    lookup: &dyn ProfileLookup,
    client: &reqwest::Client,
    options: RenderOptions,
    sink: Box<dyn DownloadSink>,
) -> Result<PathBuf> {
    let mut session = Session::new(PreviewState::default(), sink);
    session.set_language(request.language);

    if let Some(handle) = &request.handle {
        session.set_handle(handle.as_str());
    }

    if request.fetch {
        let (token, query) = session
            .begin_lookup()
            .ok_or_else(|| anyhow!("--fetch needs a --handle"))?;
        let result = lookup.lookup(&query).await;
        let effect = session.apply(SessionEvent::LookupFinished {
            token,
            query,
            result,
        });
        fail_on_error(&session)?;

        if let Some(Effect::FetchAvatar { token, url }) = effect {
            let result = avatar::fetch_remote(client, &url).await;
            session.apply(SessionEvent::AvatarLoaded { token, result });
        }
    }

    apply_overrides(&mut session, &request)?;

    if let Some(path) = &request.avatar {
        let token = session.begin_avatar_load();
        let result = avatar::load_file(path).await;
        session.apply(SessionEvent::AvatarLoaded { token, result });
        if let Some(status) = session.status().filter(|s| s.kind != StatusKind::Info) {
            bail!("{}", status.text);
        }
    }

    let (id, snapshot) = session.begin_capture();
    let result = tokio::task::spawn_blocking(move || capture_png(&snapshot, options))
        .await
        .unwrap_or_else(|e| Err(CaptureError::Worker(e.to_string())));
    session.apply(SessionEvent::CaptureFinished { id, result });

    if let CapturePhase::Failed { message, .. } = session.capture_phase() {
        bail!("capture failed: {}", message);
    }
    fail_on_error(&session)?;

    session
        .last_export()
        .cloned()
        .ok_or_else(|| anyhow!("capture finished without an export"))
}

fn apply_overrides(session: &mut Session, request: &RenderRequest) -> Result<()> {
    if let Some(name) = &request.name {
        session.set_name(name.as_str());
    }
    if let Some(handle) = &request.handle {
        session.set_handle(handle.as_str());
    }
    if let Some(body) = &request.body {
        if !session.set_body(body.as_str()) {
            bail!("tweet body is longer than the post limit");
        }
    }
    let counters = [
        (Counter::Retweets, &request.retweets),
        (Counter::Quotes, &request.quotes),
        (Counter::Likes, &request.likes),
    ];
    for (counter, value) in counters {
        if let Some(raw) = value {
            session.set_count(counter, raw.as_str());
        }
    }
    if request.verified {
        session.set_verified(Verified::Yes);
    }
    Ok(())
}

fn fail_on_error(session: &Session) -> Result<()> {
    match session.status() {
        Some(status) if status.kind == StatusKind::Error => bail!("{}", status.text),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::sample_png;
    use crate::capture::FileSink;
    use crate::error::LookupError;
    use crate::lookup::LookupRecord;
    use async_trait::async_trait;

    struct StaticLookup(Option<LookupRecord>);

    #[async_trait]
    impl ProfileLookup for StaticLookup {
        async fn lookup(&self, handle: &str) -> Result<LookupRecord, LookupError> {
            self.0
                .clone()
                .ok_or_else(|| LookupError::NotFound(handle.to_string()))
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            scale: 1,
            ..RenderOptions::default()
        }
    }

    #[tokio::test]
    async fn test_render_writes_tweet_png() {
        let dir = tempfile::tempdir().unwrap();
        let avatar_path = dir.path().join("me.png");
        std::fs::write(&avatar_path, sample_png(8, 8, [200, 10, 10])).unwrap();

        let request = RenderRequest {
            name: Some("Ada".into()),
            handle: Some("ada".into()),
            body: Some("hello #rust".into()),
            avatar: Some(avatar_path),
            likes: Some("1234".into()),
            verified: true,
            ..RenderRequest::default()
        };

        let out = render(
            request,
            &StaticLookup(None),
            &reqwest::Client::new(),
            options(),
            Box::new(FileSink::new(dir.path().join("out"), false)),
        )
        .await
        .unwrap();

        assert_eq!(out, dir.path().join("out").join("tweet.png"));
        assert!(std::fs::read(&out).unwrap().starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_fetch_without_handle_fails() {
        let dir = tempfile::tempdir().unwrap();
        let request = RenderRequest {
            fetch: true,
            ..RenderRequest::default()
        };

        let err = render(
            request,
            &StaticLookup(None),
            &reqwest::Client::new(),
            options(),
            Box::new(FileSink::new(dir.path(), false)),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("--handle"));
        assert!(!dir.path().join("tweet.png").exists());
    }

    #[tokio::test]
    async fn test_failed_lookup_stops_export() {
        let dir = tempfile::tempdir().unwrap();
        let request = RenderRequest {
            handle: Some("ghost".into()),
            fetch: true,
            language: Language::En,
            ..RenderRequest::default()
        };

        let err = render(
            request,
            &StaticLookup(None),
            &reqwest::Client::new(),
            options(),
            Box::new(FileSink::new(dir.path(), false)),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Lookup failed"));
        assert!(!dir.path().join("tweet.png").exists());
    }

    #[tokio::test]
    async fn test_broken_avatar_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let avatar_path = dir.path().join("bad.png");
        std::fs::write(&avatar_path, b"not an image").unwrap();

        let request = RenderRequest {
            avatar: Some(avatar_path),
            ..RenderRequest::default()
        };
        let result = render(
            request,
            &StaticLookup(None),
            &reqwest::Client::new(),
            options(),
            Box::new(FileSink::new(dir.path(), false)),
        )
        .await;
        assert!(result.is_err());
    }
}
