use crate::avatar::AvatarRef;
use crate::capture::CaptureId;
use crate::error::{AvatarError, CaptureError, LookupError};
use crate::lookup::LookupRecord;
use crate::state::RequestToken;

/// Completion of a background task, delivered to the UI loop.
#[derive(Debug)]
pub enum SessionEvent {
    AvatarLoaded {
        token: RequestToken,
        result: Result<AvatarRef, AvatarError>,
    },
    LookupFinished {
        token: RequestToken,
        query: String,
        result: Result<LookupRecord, LookupError>,
    },
    CaptureFinished {
        id: CaptureId,
        result: Result<Vec<u8>, CaptureError>,
    },
}

/// Follow-up work a completion asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchAvatar { token: RequestToken, url: String },
}
