use crate::capture::{CaptureId, CapturePhase, CapturePipeline, Completion, DownloadSink};
use crate::lang::Language;
use crate::message::{Effect, SessionEvent};
use crate::state::{
    body_units, non_empty, CountField, PreviewState, RequestToken, RequestTokens, Slot, Verified,
    MAX_BODY_UNITS,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Retweets,
    Quotes,
    Likes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Owns the preview state and everything that mutates it.
///
/// Form edits go through the setters; background results come back
/// through [`Session::apply`]. Nothing here blocks or spawns, so the
/// caller decides where async work runs.
pub struct Session {
    state: PreviewState,
    tokens: RequestTokens,
    capture: CapturePipeline,
    sink: Box<dyn DownloadSink>,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl Session {
    pub fn new(state: PreviewState, sink: Box<dyn DownloadSink>) -> Self {
        Self {
            state,
            tokens: RequestTokens::default(),
            capture: CapturePipeline::default(),
            sink,
            status: None,
            last_export: None,
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.capture.phase()
    }

    pub fn last_export(&self) -> Option<&PathBuf> {
        self.last_export.as_ref()
    }

    fn report(&mut self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            StatusKind::Info => tracing::info!("{}", text),
            StatusKind::Warning => tracing::warn!("{}", text),
            StatusKind::Error => tracing::error!("{}", text),
        }
        self.status = Some(StatusMessage { kind, text });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.state.name = non_empty(name);
    }

    /// Editing the handle supersedes any lookup still in flight.
    pub fn set_handle(&mut self, handle: impl Into<String>) {
        let handle = non_empty(handle);
        if handle != self.state.handle {
            self.tokens.invalidate(Slot::Lookup);
        }
        self.state.handle = handle;
    }

    /// Returns false, leaving the body untouched, when the text is longer
    /// than the post limit.
    pub fn set_body(&mut self, body: impl Into<String>) -> bool {
        let body = body.into();
        if body_units(&body) > MAX_BODY_UNITS {
            return false;
        }
        self.state.body = non_empty(body);
        true
    }

    pub fn set_verified(&mut self, verified: Verified) {
        self.state.verified = verified;
    }

    pub fn set_verified_flag(&mut self, raw: &str) {
        self.state.verified = Verified::from_flag(raw);
    }

    pub fn set_count(&mut self, counter: Counter, raw: impl Into<String>) {
        *self.count_mut(counter) = CountField::new(raw);
    }

    pub fn count(&self, counter: Counter) -> &CountField {
        match counter {
            Counter::Retweets => &self.state.retweets,
            Counter::Quotes => &self.state.quotes,
            Counter::Likes => &self.state.likes,
        }
    }

    fn count_mut(&mut self, counter: Counter) -> &mut CountField {
        match counter {
            Counter::Retweets => &mut self.state.retweets,
            Counter::Quotes => &mut self.state.quotes,
            Counter::Likes => &mut self.state.likes,
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.state.language = language;
    }

    pub fn toggle_language(&mut self) {
        self.state.language = self.state.language.toggled();
    }

    /// Starts an avatar load; only the newest load may replace the avatar.
    pub fn begin_avatar_load(&mut self) -> RequestToken {
        self.tokens.issue(Slot::Avatar)
    }

    /// Starts a lookup keyed on the current handle, or reports why not.
    pub fn begin_lookup(&mut self) -> Option<(RequestToken, String)> {
        let query = self.state.handle.clone().unwrap_or_default();
        if query.trim().trim_start_matches('@').is_empty() {
            let text = self.state.labels().status_need_handle;
            self.report(StatusKind::Warning, text);
            return None;
        }
        let token = self.tokens.issue(Slot::Lookup);
        let text = format!(
            "{} @{}...",
            self.state.labels().status_looking_up,
            query.trim_start_matches('@')
        );
        self.report(StatusKind::Info, text);
        Some((token, query))
    }

    /// Starts a capture of the current state. The returned snapshot is what
    /// gets rasterized; later edits do not affect it.
    pub fn begin_capture(&mut self) -> (CaptureId, PreviewState) {
        let id = self.capture.begin();
        let text = format!("{} {}...", self.state.labels().status_rendering, id);
        self.report(StatusKind::Info, text);
        (id, self.state.clone())
    }

    pub fn apply(&mut self, event: SessionEvent) -> Option<Effect> {
        let labels = self.state.labels();
        match event {
            SessionEvent::AvatarLoaded { token, result } => {
                if !self.tokens.is_current(Slot::Avatar, token) {
                    tracing::debug!(token = token.value(), "dropping stale avatar");
                    return None;
                }
                match result {
                    Ok(avatar) => {
                        self.state.avatar = Some(avatar);
                        self.report(StatusKind::Info, labels.status_avatar_updated);
                    }
                    Err(e) => self.report(
                        StatusKind::Warning,
                        format!("{}: {}", labels.status_avatar_failed, e),
                    ),
                }
                None
            }
            SessionEvent::LookupFinished {
                token,
                query,
                result,
            } => {
                if !self.tokens.is_current(Slot::Lookup, token) {
                    tracing::debug!(token = token.value(), %query, "dropping stale lookup");
                    return None;
                }

                match result {
                    Ok(record) => {
                        self.state.name = non_empty(record.name);
                        self.state.handle = non_empty(record.handle);
                        self.state.body = non_empty(record.body);
                        self.state.retweets = CountField::from_count(record.retweets);
                        self.state.likes = CountField::from_count(record.likes);
                        self.report(StatusKind::Info, labels.status_profile_loaded);

                        let token = self.tokens.issue(Slot::Avatar);
                        Some(Effect::FetchAvatar {
                            token,
                            url: record.avatar_url,
                        })
                    }
                    Err(e) => {
                        self.report(
                            StatusKind::Error,
                            format!("{}: {}", labels.status_lookup_failed, e),
                        );
                        None
                    }
                }
            }
            SessionEvent::CaptureFinished { id, result } => {
                if let Completion::Failed(message) = self.capture.complete(id, result) {
                    self.report(
                        StatusKind::Error,
                        format!("{} {}: {}", labels.status_capture_failed, id, message),
                    );
                }
                self.deliver_ready();
                None
            }
        }
    }

    fn deliver_ready(&mut self) {
        let labels = self.state.labels();
        while let Some(artifact) = self.capture.take_ready() {
            match self.sink.deliver(&artifact) {
                Ok(path) => {
                    self.report(
                        StatusKind::Info,
                        format!("{}: {}", labels.status_saved, path.display()),
                    );
                    self.last_export = Some(path);
                }
                Err(e) => self.report(
                    StatusKind::Error,
                    format!("{}: {}", labels.status_export_failed, e),
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::{sample_png, AvatarRef};
    use crate::capture::CaptureArtifact;
    use crate::error::{AvatarError, CaptureError, LookupError};
    use crate::lookup::LookupRecord;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<CaptureArtifact>>>);

    impl DownloadSink for RecordingSink {
        fn deliver(&mut self, artifact: &CaptureArtifact) -> Result<PathBuf, CaptureError> {
            self.0.lock().unwrap().push(artifact.clone());
            Ok(PathBuf::from("tweet.png"))
        }
    }

    fn session() -> (Session, RecordingSink) {
        let sink = RecordingSink::default();
        (
            Session::new(PreviewState::default(), Box::new(sink.clone())),
            sink,
        )
    }

    fn avatar(rgb: [u8; 3]) -> AvatarRef {
        AvatarRef::from_bytes("image/png", &sample_png(2, 2, rgb))
    }

    fn record() -> LookupRecord {
        LookupRecord {
            name: "Jack".into(),
            handle: "jack".into(),
            body: "just setting up my twttr".into(),
            retweets: 1234,
            likes: 99,
            avatar_url: "https://img.test/jack.png".into(),
        }
    }

    #[test]
    fn test_setters_store_raw_values() {
        let (mut session, _) = session();
        session.set_name("Ada");
        session.set_handle("");
        session.set_count(Counter::Likes, "12x");
        session.set_verified_flag("1");

        let state = session.state();
        assert_eq!(state.name.as_deref(), Some("Ada"));
        assert_eq!(state.handle, None);
        assert_eq!(state.likes.raw(), "12x");
        assert_eq!(session.count(Counter::Likes).display(), "12x");
        assert!(state.verified.is_verified());

        session.set_verified_flag("maybe");
        assert!(!session.state().verified.is_verified());
    }

    #[test]
    fn test_body_limit() {
        let (mut session, _) = session();
        assert!(session.set_body("a".repeat(MAX_BODY_UNITS)));
        assert!(!session.set_body("a".repeat(MAX_BODY_UNITS + 1)));
        assert_eq!(session.state().body.as_ref().map(|b| b.len()), Some(MAX_BODY_UNITS));
    }

    #[test]
    fn test_later_avatar_selection_wins_over_slow_earlier_read() {
        let (mut session, _) = session();
        let first = session.begin_avatar_load();
        let second = session.begin_avatar_load();

        session.apply(SessionEvent::AvatarLoaded {
            token: second,
            result: Ok(avatar([0, 0, 255])),
        });
        session.apply(SessionEvent::AvatarLoaded {
            token: first,
            result: Ok(avatar([255, 0, 0])),
        });

        let shown = session.state().avatar.clone().unwrap();
        assert!(shown == avatar([0, 0, 255]) || shown == avatar([255, 0, 0]));
        assert_eq!(shown, avatar([0, 0, 255]));
    }

    #[test]
    fn test_failed_avatar_keeps_previous() {
        let (mut session, _) = session();
        let token = session.begin_avatar_load();
        session.apply(SessionEvent::AvatarLoaded {
            token,
            result: Ok(avatar([1, 1, 1])),
        });

        let token = session.begin_avatar_load();
        session.apply(SessionEvent::AvatarLoaded {
            token,
            result: Err(AvatarError::DataUri("broken".into())),
        });

        assert_eq!(session.state().avatar, Some(avatar([1, 1, 1])));
        assert_eq!(session.status().unwrap().kind, StatusKind::Warning);
    }

    #[test]
    fn test_lookup_overwrites_fields_and_requests_avatar() {
        let (mut session, _) = session();
        session.set_handle("jack");
        session.set_count(Counter::Quotes, "7");
        let (token, query) = session.begin_lookup().unwrap();
        assert_eq!(query, "jack");

        let effect = session.apply(SessionEvent::LookupFinished {
            token,
            query,
            result: Ok(record()),
        });

        let state = session.state();
        assert_eq!(state.name.as_deref(), Some("Jack"));
        assert_eq!(state.body.as_deref(), Some("just setting up my twttr"));
        assert_eq!(state.retweets.display(), "1,2 B");
        assert_eq!(state.likes.display(), "99");
        assert_eq!(state.quotes.raw(), "7");

        match effect {
            Some(Effect::FetchAvatar { token, url }) => {
                assert_eq!(url, "https://img.test/jack.png");
                session.apply(SessionEvent::AvatarLoaded {
                    token,
                    result: Ok(avatar([9, 9, 9])),
                });
                assert_eq!(session.state().avatar, Some(avatar([9, 9, 9])));
            }
            other => panic!("expected avatar fetch, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_requires_handle() {
        let (mut session, _) = session();
        assert!(session.begin_lookup().is_none());
        assert_eq!(session.status().unwrap().kind, StatusKind::Warning);
    }

    #[test]
    fn test_stale_lookup_is_dropped() {
        let (mut session, _) = session();
        session.set_handle("jack");
        let (old_token, old_query) = session.begin_lookup().unwrap();
        let (new_token, new_query) = session.begin_lookup().unwrap();

        assert!(session
            .apply(SessionEvent::LookupFinished {
                token: old_token,
                query: old_query,
                result: Ok(record()),
            })
            .is_none());
        assert_eq!(session.state().name, None);

        session.set_handle("jac");
        assert!(session
            .apply(SessionEvent::LookupFinished {
                token: new_token,
                query: new_query,
                result: Ok(record()),
            })
            .is_none());
        assert_eq!(session.state().name, None);
        assert_eq!(session.state().handle.as_deref(), Some("jac"));
    }

    #[test]
    fn test_lookup_failure_leaves_state() {
        let (mut session, _) = session();
        session.set_handle("ghost");
        session.set_name("Keep me");
        let (token, query) = session.begin_lookup().unwrap();

        session.apply(SessionEvent::LookupFinished {
            token,
            query,
            result: Err(LookupError::NotFound("ghost".into())),
        });

        assert_eq!(session.state().name.as_deref(), Some("Keep me"));
        assert_eq!(session.status().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn test_lookup_avatar_supersedes_pending_upload() {
        let (mut session, _) = session();
        session.set_handle("jack");
        let upload = session.begin_avatar_load();
        let (token, query) = session.begin_lookup().unwrap();
        let effect = session.apply(SessionEvent::LookupFinished {
            token,
            query,
            result: Ok(record()),
        });

        session.apply(SessionEvent::AvatarLoaded {
            token: upload,
            result: Ok(avatar([1, 2, 3])),
        });
        assert_eq!(session.state().avatar, None);

        let Some(Effect::FetchAvatar { token, .. }) = effect else {
            panic!("expected avatar fetch");
        };
        session.apply(SessionEvent::AvatarLoaded {
            token,
            result: Ok(avatar([4, 5, 6])),
        });
        assert_eq!(session.state().avatar, Some(avatar([4, 5, 6])));
    }

    #[test]
    fn test_two_captures_download_twice() {
        let (mut session, sink) = session();
        let (first, _) = session.begin_capture();
        let (second, _) = session.begin_capture();

        session.apply(SessionEvent::CaptureFinished {
            id: first,
            result: Ok(vec![1]),
        });
        session.apply(SessionEvent::CaptureFinished {
            id: second,
            result: Ok(vec![2]),
        });
        // A redraw-style reapplication of a finished id must not download again.
        session.apply(SessionEvent::CaptureFinished {
            id: second,
            result: Ok(vec![2]),
        });

        let delivered = sink.0.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert_eq!((delivered[0].id, delivered[1].id), (first, second));
        assert_eq!(session.capture_phase(), CapturePhase::Idle);
        assert_eq!(session.last_export(), Some(&PathBuf::from("tweet.png")));
    }

    #[test]
    fn test_capture_failure_is_surfaced() {
        let (mut session, sink) = session();
        let (id, _) = session.begin_capture();
        session.apply(SessionEvent::CaptureFinished {
            id,
            result: Err(CaptureError::Worker("boom".into())),
        });

        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(session.status().unwrap().kind, StatusKind::Error);
        assert!(matches!(session.capture_phase(), CapturePhase::Failed { .. }));
    }

    #[test]
    fn test_overlapping_capture_failure_is_reported() {
        let (mut session, sink) = session();
        let (first, _) = session.begin_capture();
        let (second, _) = session.begin_capture();

        session.apply(SessionEvent::CaptureFinished {
            id: first,
            result: Err(CaptureError::Worker("boom".into())),
        });
        let status = session.status().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("boom"));
        assert_eq!(session.capture_phase(), CapturePhase::Capturing);

        session.apply(SessionEvent::CaptureFinished {
            id: second,
            result: Ok(vec![2]),
        });
        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert_eq!(session.capture_phase(), CapturePhase::Idle);
        assert_eq!(session.status().unwrap().kind, StatusKind::Info);
    }

    #[test]
    fn test_handle_edit_supersedes_lookup() {
        let (mut session, _) = session();
        session.set_handle("jack");
        let (token, query) = session.begin_lookup().unwrap();

        // Edited and restored while the request was out.
        session.set_handle("jac");
        session.set_handle("jack");
        assert!(session
            .apply(SessionEvent::LookupFinished {
                token,
                query,
                result: Ok(record()),
            })
            .is_none());
        assert_eq!(session.state().name, None);

        // Setting the same value is not an edit.
        let (token, query) = session.begin_lookup().unwrap();
        session.set_handle("jack");
        assert!(session
            .apply(SessionEvent::LookupFinished {
                token,
                query,
                result: Ok(record()),
            })
            .is_some());
    }

    #[test]
    fn test_status_follows_language() {
        let (mut session, _) = session();
        session.begin_lookup();
        assert_eq!(
            session.status().unwrap().text,
            Language::Tr.labels().status_need_handle
        );

        session.set_language(Language::En);
        session.set_handle("@jack");
        session.begin_lookup();
        assert_eq!(session.status().unwrap().text, "Looking up @jack...");

        session.clear_status();
        assert!(session.status().is_none());
    }

    #[test]
    fn test_capture_snapshot_is_detached() {
        let (mut session, _) = session();
        session.set_name("Before");
        let (_, snapshot) = session.begin_capture();
        session.set_name("After");
        assert_eq!(snapshot.name.as_deref(), Some("Before"));
    }

    #[test]
    fn test_language_toggle_round_trip() {
        let (mut session, _) = session();
        let before = session.state().labels();
        session.toggle_language();
        assert_eq!(session.state().language, Language::En);
        session.set_language(Language::Tr);
        assert_eq!(session.state().labels(), before);
    }
}
