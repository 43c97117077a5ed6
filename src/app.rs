use crate::avatar::AvatarRef;
use crate::message::SessionEvent;
use crate::session::{Counter, Session};
use crate::state::Verified;
use crate::ui;
use crate::ui::avatar::AvatarPixels;
use crate::worker::Worker;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

const TICK: Duration = Duration::from_millis(50);

/// Terminal rows and columns used by the avatar in the preview.
pub const AVATAR_PREVIEW_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Handle,
    Body,
    Avatar,
    Retweets,
    Quotes,
    Likes,
    Verified,
    Fetch,
    Create,
}

impl Field {
    pub const ORDER: [Field; 10] = [
        Field::Name,
        Field::Handle,
        Field::Body,
        Field::Avatar,
        Field::Retweets,
        Field::Quotes,
        Field::Likes,
        Field::Verified,
        Field::Fetch,
        Field::Create,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    fn counter(self) -> Option<Counter> {
        match self {
            Field::Retweets => Some(Counter::Retweets),
            Field::Quotes => Some(Counter::Quotes),
            Field::Likes => Some(Counter::Likes),
            _ => None,
        }
    }
}

pub struct App {
    session: Session,
    worker: Worker,
    rx: UnboundedReceiver<SessionEvent>,
    focus: Field,
    avatar_path: String,
    avatar_pixels: Option<(AvatarRef, AvatarPixels)>,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session, worker: Worker, rx: UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            session,
            worker,
            rx,
            focus: Field::Name,
            avatar_path: String::new(),
            avatar_pixels: None,
            should_quit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn avatar_path(&self) -> &str {
        &self.avatar_path
    }

    pub fn avatar_pixels(&self) -> Option<&AvatarPixels> {
        self.avatar_pixels.as_ref().map(|(_, pixels)| pixels)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        tracing::info!("editor started");

        while !self.should_quit {
            self.refresh_avatar_pixels();
            terminal.draw(|frame| ui::render(frame, &self))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            self.drain_events();
            tokio::task::yield_now().await;
        }

        tracing::info!("editor closed");
        Ok(())
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            if let Some(effect) = self.session.apply(event) {
                self.worker.run(effect);
            }
        }
    }

    /// Re-decode the terminal avatar only when the avatar itself changed.
    fn refresh_avatar_pixels(&mut self) {
        let current = self.session.state().avatar.as_ref();
        let cached = self.avatar_pixels.as_ref().map(|(source, _)| source);
        if current == cached {
            return;
        }

        self.avatar_pixels = current.and_then(|avatar| {
            match AvatarPixels::from_avatar(avatar, AVATAR_PREVIEW_SIZE) {
                Ok(pixels) => Some((avatar.clone(), pixels)),
                Err(e) => {
                    tracing::warn!(error = %e, "cannot preview avatar");
                    None
                }
            }
        });
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.dismiss_or_quit(),
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('f') if ctrl => self.fetch(),
            KeyCode::Char('s') if ctrl => self.capture(),
            KeyCode::Char('l') if ctrl => self.session.toggle_language(),
            KeyCode::Char('u') if ctrl => self.clear_field(),
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => self.activate(),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Char(c) if !ctrl => self.add_char(c),
            _ => {}
        }
    }

    /// Esc first dismisses a status message; with nothing to dismiss it quits.
    fn dismiss_or_quit(&mut self) {
        if self.session.status().is_some() {
            self.session.clear_status();
        } else {
            self.should_quit = true;
        }
    }

    fn activate(&mut self) {
        match self.focus {
            Field::Body => self.add_char('\n'),
            Field::Avatar => self.load_avatar(),
            Field::Verified => self.toggle_verified(),
            Field::Fetch => self.fetch(),
            Field::Create => self.capture(),
            _ => self.focus = self.focus.next(),
        }
    }

    fn toggle_verified(&mut self) {
        let verified = self.session.state().verified.toggled();
        self.session.set_verified(verified);
    }

    fn add_char(&mut self, c: char) {
        let state = self.session.state();
        match self.focus {
            Field::Name => {
                let mut name = state.name.clone().unwrap_or_default();
                name.push(c);
                self.session.set_name(name);
            }
            Field::Handle => {
                let mut handle = state.handle.clone().unwrap_or_default();
                handle.push(c);
                self.session.set_handle(handle);
            }
            Field::Body => {
                let mut body = state.body.clone().unwrap_or_default();
                body.push(c);
                // Input past the limit is dropped, like a maxlength textarea.
                self.session.set_body(body);
            }
            Field::Avatar => self.avatar_path.push(c),
            Field::Retweets | Field::Quotes | Field::Likes => {
                if let Some(counter) = self.focus.counter() {
                    let mut raw = self.session.count(counter).raw().to_string();
                    raw.push(c);
                    self.session.set_count(counter, raw);
                }
            }
            Field::Verified => match c {
                ' ' => self.toggle_verified(),
                '0' | '1' => self.session.set_verified_flag(&c.to_string()),
                _ => {}
            },
            Field::Fetch | Field::Create => {
                if c == ' ' {
                    self.activate();
                }
            }
        }
    }

    fn delete_char(&mut self) {
        let state = self.session.state();
        match self.focus {
            Field::Name => {
                let mut name = state.name.clone().unwrap_or_default();
                name.pop();
                self.session.set_name(name);
            }
            Field::Handle => {
                let mut handle = state.handle.clone().unwrap_or_default();
                handle.pop();
                self.session.set_handle(handle);
            }
            Field::Body => {
                let mut body = state.body.clone().unwrap_or_default();
                body.pop();
                self.session.set_body(body);
            }
            Field::Avatar => {
                self.avatar_path.pop();
            }
            Field::Retweets | Field::Quotes | Field::Likes => {
                if let Some(counter) = self.focus.counter() {
                    let mut raw = self.session.count(counter).raw().to_string();
                    raw.pop();
                    self.session.set_count(counter, raw);
                }
            }
            Field::Verified | Field::Fetch | Field::Create => {}
        }
    }

    fn clear_field(&mut self) {
        match self.focus {
            Field::Name => self.session.set_name(""),
            Field::Handle => self.session.set_handle(""),
            Field::Body => {
                self.session.set_body("");
            }
            Field::Avatar => self.avatar_path.clear(),
            Field::Retweets | Field::Quotes | Field::Likes => {
                if let Some(counter) = self.focus.counter() {
                    self.session.set_count(counter, "");
                }
            }
            Field::Verified | Field::Fetch | Field::Create => {}
        }
    }

    fn load_avatar(&mut self) {
        let path = self.avatar_path.trim();
        if path.is_empty() {
            return;
        }
        let path = expand_home(path);
        let token = self.session.begin_avatar_load();
        tracing::debug!(path = %path.display(), token = token.value(), "loading avatar file");
        self.worker.load_avatar_file(token, path);
    }

    fn fetch(&mut self) {
        if let Some((token, query)) = self.session.begin_lookup() {
            self.worker.lookup(token, query);
        }
    }

    fn capture(&mut self) {
        let (id, snapshot) = self.session.begin_capture();
        self.worker.capture(id, snapshot);
    }

    /// Whether the focused field takes text, for cursor display.
    pub fn editing_text(&self) -> bool {
        !matches!(self.focus, Field::Verified | Field::Fetch | Field::Create)
    }

    pub fn verified(&self) -> Verified {
        self.session.state().verified
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{FileSink, RenderOptions};
    use crate::lookup::HttpLookup;
    use crate::state::PreviewState;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn app(export_dir: &std::path::Path) -> App {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = reqwest::Client::new();
        let worker = Worker::new(
            tx,
            Arc::new(HttpLookup::new("http://127.0.0.1:9", client.clone())),
            client,
            RenderOptions {
                scale: 1,
                ..RenderOptions::default()
            },
        );
        let session = Session::new(
            PreviewState::default(),
            Box::new(FileSink::new(export_dir, false)),
        );
        App::new(session, worker, rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn ctrl(app: &mut App, c: char) {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(Field::Name.prev(), Field::Create);
        assert_eq!(Field::Create.next(), Field::Name);
        assert_eq!(Field::Body.next(), Field::Avatar);
    }

    #[tokio::test]
    async fn test_typing_edits_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        type_text(&mut app, "Ada");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "ada");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "hi");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "#there");
        press(&mut app, KeyCode::Backspace);

        let state = app.session().state();
        assert_eq!(state.name.as_deref(), Some("Ada"));
        assert_eq!(state.handle.as_deref(), Some("ada"));
        assert_eq!(state.body.as_deref(), Some("hi\n#ther"));

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "1500");
        assert_eq!(app.session().state().retweets.raw(), "1500");

        ctrl(&mut app, 'u');
        assert_eq!(app.session().state().retweets.display(), "0");
    }

    #[tokio::test]
    async fn test_verified_and_language_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        for _ in 0..7 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focus(), Field::Verified);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.verified(), Verified::Yes);
        press(&mut app, KeyCode::Char('0'));
        assert_eq!(app.verified(), Verified::No);

        ctrl(&mut app, 'l');
        assert_eq!(app.session().state().language, crate::lang::Language::En);

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_esc_dismisses_status_before_quitting() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());

        ctrl(&mut app, 'f');
        assert!(app.session().status().is_some());

        press(&mut app, KeyCode::Esc);
        assert!(app.session().status().is_none());
        assert!(!app.should_quit());

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_create_writes_tweet_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path());
        type_text(&mut app, "Ada");
        ctrl(&mut app, 's');

        let event = app.rx.recv().await.unwrap();
        assert!(app.session.apply(event).is_none());

        let exported = dir.path().join("tweet.png");
        assert_eq!(app.session().last_export(), Some(&exported));
        assert!(std::fs::read(&exported).unwrap().starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/a.png"), PathBuf::from("/tmp/a.png"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a.png"), home.join("a.png"));
        }
    }
}
