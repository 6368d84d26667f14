//! Terminal formatting helpers. Format only, no domain logic.

use chrono::{DateTime, Local};
use jarvis_core::domain::{Message, MessageMeta};

/// Truncate to `max_len` characters, adding an ellipsis when cut.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Local wall-clock time of a millisecond timestamp.
pub fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis).map_or_else(
        || "--".to_string(),
        |at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// `latency 1200 ms, 42 tts chars` style summary; empty when nothing is set.
pub fn format_meta(meta: &MessageMeta) -> String {
    let mut parts = Vec::new();
    if let Some(ms) = meta.latency_ms {
        parts.push(format!("latency {ms} ms"));
    }
    if let Some(chars) = meta.tts_chars {
        parts.push(format!("{chars} tts chars"));
    }
    if let Some(tokens) = meta.tts_tokens_est {
        parts.push(format!("~{tokens} tts tokens"));
    }
    parts.join(", ")
}

pub fn print_message(message: &Message) {
    println!(
        "[{}] {:<9} {}",
        format_millis(message.created_at),
        message.role,
        message.content
    );
    if let Some(meta) = message.meta.as_ref().filter(|meta| !meta.is_empty()) {
        println!("{:>31} ({})", "", format_meta(meta));
    }
}
