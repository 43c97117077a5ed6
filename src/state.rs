use crate::avatar::AvatarRef;
use crate::format::{format_body, format_count, FormattedBody};
use crate::lang::{Labels, Language};
use std::collections::HashMap;

/// Body length limit, counted in UTF-16 code units like a browser textarea.
pub const MAX_BODY_UNITS: usize = 290;

pub fn body_units(text: &str) -> usize {
    text.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verified {
    Yes,
    #[default]
    No,
}

impl Verified {
    /// `"1"` means verified; every other stored value reads as not verified.
    pub fn from_flag(raw: &str) -> Self {
        if raw.trim() == "1" {
            Verified::Yes
        } else {
            Verified::No
        }
    }

    pub fn is_verified(self) -> bool {
        self == Verified::Yes
    }

    pub fn toggled(self) -> Self {
        match self {
            Verified::Yes => Verified::No,
            Verified::No => Verified::Yes,
        }
    }

    pub fn label(self, labels: &Labels) -> &'static str {
        match self {
            Verified::Yes => labels.yes,
            Verified::No => labels.no,
        }
    }
}

/// A counter exactly as typed; formatting decides how it displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountField(String);

impl Default for CountField {
    fn default() -> Self {
        Self("0".to_string())
    }
}

impl CountField {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_count(n: u64) -> Self {
        Self(n.to_string())
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn display(&self) -> String {
        format_count(Some(&self.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewState {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub verified: Verified,
    pub body: Option<String>,
    pub avatar: Option<AvatarRef>,
    pub retweets: CountField,
    pub quotes: CountField,
    pub likes: CountField,
    pub language: Language,
}

impl PreviewState {
    pub fn labels(&self) -> &'static Labels {
        self.language.labels()
    }

    pub fn formatted_body(&self) -> FormattedBody {
        format_body(self.body.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(self.labels().name_placeholder)
    }

    pub fn display_handle(&self) -> String {
        let handle = self
            .handle
            .as_deref()
            .filter(|h| !h.is_empty())
            .unwrap_or(self.labels().username_placeholder);
        format!("@{}", handle)
    }
}

/// Empty input clears an optional text field.
pub fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Async work whose results race on shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Avatar,
    Lookup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Last-issued-wins bookkeeping: only the newest token of a slot may apply
/// its result.
#[derive(Debug, Default)]
pub struct RequestTokens {
    next: u64,
    latest: HashMap<Slot, RequestToken>,
}

impl RequestTokens {
    pub fn issue(&mut self, slot: Slot) -> RequestToken {
        self.next += 1;
        let token = RequestToken(self.next);
        self.latest.insert(slot, token);
        token
    }

    pub fn is_current(&self, slot: Slot, token: RequestToken) -> bool {
        self.latest.get(&slot) == Some(&token)
    }

    /// Marks the slot's outstanding request as superseded without issuing a
    /// new one.
    pub fn invalidate(&mut self, slot: Slot) {
        self.latest.remove(&slot);
    }
}
