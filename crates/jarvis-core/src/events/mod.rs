//! Event types crossing the session boundary.
//!
//! # Structure
//!
//! - `backend` - Notifications received from the voice backend
//! - `session` - Change notifications sent to presentation
//!
//! # Wire Format
//!
//! Session events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "download_progress", "percent": 42 }
//! ```

mod backend;
mod session;

pub use backend::{
    BackendEvent, DOWNLOAD_COMPLETE, DOWNLOAD_PROGRESS, DownloadProgressPayload, MESSAGE_META,
    MessageMetaPayload, NEW_MESSAGE, NewMessagePayload, STATE_CHANGED, WireError,
};
pub use session::{SessionEvent, TransitionCause};
