//! Conversation file naming rules.

use jarvis_core::domain::{CONVERSATION_EXTENSION, ConversationId, UNTITLED_TITLE};
use jarvis_core::ports::StoreError;

/// Characters that are not allowed in file names on Windows.
const INVALID_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Make `title` safe to use as a file name.
///
/// Invalid characters become spaces, then whitespace runs collapse to a
/// single space.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitise `title` and check it can be used for a rename.
pub fn validate_title(title: &str) -> Result<String, StoreError> {
    let sanitized = sanitize_title(title);
    if sanitized.is_empty() {
        return Err(StoreError::InvalidTitle("title is empty".to_string()));
    }
    if sanitized.eq_ignore_ascii_case(UNTITLED_TITLE) {
        return Err(StoreError::InvalidTitle(format!(
            "{UNTITLED_TITLE:?} is reserved for untitled conversations"
        )));
    }
    // Dots alone would resolve to the directory or its parent.
    if sanitized.chars().all(|c| c == '.') {
        return Err(StoreError::InvalidTitle(sanitized));
    }
    Ok(sanitized)
}

/// Check that `id` is a plain conversation file name.
///
/// Without separators the name cannot leave the history directory, so dots
/// inside a title are fine.
pub fn validate_id(id: &ConversationId) -> Result<(), StoreError> {
    let raw = id.as_str();
    let has_extension = raw.rsplit_once('.').is_some_and(|(stem, ext)| {
        !stem.is_empty() && ext.eq_ignore_ascii_case(CONVERSATION_EXTENSION)
    });

    if raw.is_empty()
        || raw.contains(['/', '\\'])
        || raw.chars().any(char::is_control)
        || !has_extension
    {
        return Err(StoreError::InvalidId(raw.to_string()));
    }
    Ok(())
}

/// The `attempt`-th candidate id for `title` with timestamp `stem`.
///
/// Attempt 1 is the plain name; later attempts append ` (n)` to the stem.
pub fn candidate_id(title: &str, stem: &str, attempt: u32) -> ConversationId {
    if attempt <= 1 {
        ConversationId::compose(title, stem)
    } else {
        ConversationId::compose(title, &format!("{stem} ({attempt})"))
    }
}
