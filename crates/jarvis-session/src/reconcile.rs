//! Merging out-of-band notifications into the in-memory projection.

use jarvis_core::domain::{Message, MessageMeta, MessageRole, Turn};
use jarvis_core::events::DownloadProgressPayload;

/// Why a notification was not applied.
///
/// Misses are expected under normal operation and are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// No assistant message has the meta's `createdAt`.
    NoMatchingAssistant { created_at: i64 },
    /// Meta published for a conversation that is no longer active.
    StaleMeta,
    /// Message published for a conversation that no longer exists.
    StaleTargetGone,
    UnknownRole(String),
    UnknownState(String),
    /// No conversation is active to receive the message.
    NoActiveConversation,
    /// The active conversation was removed from the store before the
    /// message could be saved. Another conversation is active afterwards.
    ActiveConversationGone,
    /// Progress for a download session that already completed.
    DownloadAlreadyComplete,
}

/// Result of reconciling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Applied to the projection (and persisted where applicable).
    Applied,
    /// Persisted to its original conversation, not projected.
    PersistedOnly,
    /// Logged and dropped.
    Dropped(MissReason),
}

impl ReconcileOutcome {
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// The active conversation's messages, in receipt order.
#[derive(Debug, Clone, Default)]
pub struct MessageProjection {
    messages: Vec<Message>,
}

impl MessageProjection {
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self {
            messages: turns.into_iter().map(Message::from).collect(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Merge `meta` into the latest assistant message created at `created_at`.
    pub fn merge_meta(&mut self, created_at: i64, meta: MessageMeta) -> ReconcileOutcome {
        let target = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == MessageRole::Assistant && m.created_at == created_at);

        match target {
            Some(message) => {
                message.attach_meta(meta);
                ReconcileOutcome::Applied
            }
            None => ReconcileOutcome::Dropped(MissReason::NoMatchingAssistant { created_at }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DownloadPhase {
    #[default]
    Idle,
    InProgress { percent: u8, total: u64 },
    Completed { total: Option<u64> },
}

/// Tracks model download progress across sessions.
///
/// Completion is final for its session: later ticks are ignored until the
/// next session starts. A session starts with a tick that has
/// `downloaded == 0`, a `total` different from the finished session's, or
/// the single-byte tick sent when the model is already on disk.
#[derive(Debug, Clone, Default)]
pub struct DownloadTracker {
    phase: DownloadPhase,
}

impl DownloadTracker {
    /// Current percentage while a download is in progress.
    pub const fn percent(&self) -> Option<u8> {
        match self.phase {
            DownloadPhase::InProgress { percent, .. } => Some(percent),
            DownloadPhase::Idle | DownloadPhase::Completed { .. } => None,
        }
    }

    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, DownloadPhase::Completed { .. })
    }

    pub fn on_progress(&mut self, tick: &DownloadProgressPayload) -> ReconcileOutcome {
        if let DownloadPhase::Completed { total } = self.phase {
            if !starts_session(tick, total) {
                return ReconcileOutcome::Dropped(MissReason::DownloadAlreadyComplete);
            }
        }
        self.phase = DownloadPhase::InProgress {
            percent: tick.clamped_percent(),
            total: tick.total,
        };
        ReconcileOutcome::Applied
    }

    pub fn on_complete(&mut self) -> ReconcileOutcome {
        let total = match self.phase {
            DownloadPhase::Completed { .. } => {
                return ReconcileOutcome::Dropped(MissReason::DownloadAlreadyComplete);
            }
            DownloadPhase::InProgress { total, .. } => Some(total),
            DownloadPhase::Idle => None,
        };
        self.phase = DownloadPhase::Completed { total };
        ReconcileOutcome::Applied
    }
}

/// Whether `tick` opens a new session after one of size `finished` ended.
fn starts_session(tick: &DownloadProgressPayload, finished: Option<u64>) -> bool {
    let already_on_disk = tick.downloaded == 1 && tick.total == 1;
    tick.downloaded == 0 || already_on_disk || finished.is_some_and(|total| total != tick.total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant(content: &str, created_at: i64) -> Message {
        Message::from(Turn::new(MessageRole::Assistant, content, created_at))
    }

    fn latency(ms: u64) -> MessageMeta {
        MessageMeta {
            latency_ms: Some(ms),
            ..MessageMeta::default()
        }
    }

    fn tick(downloaded: u64, total: u64) -> DownloadProgressPayload {
        DownloadProgressPayload {
            downloaded,
            total,
            percent: 0.0,
        }
    }

    #[test]
    fn meta_merges_into_matching_assistant_message() {
        let mut projection = MessageProjection::default();
        projection.push(Message::from(Turn::new(MessageRole::User, "hi", 100)));
        projection.push(assistant("hello", 200));

        assert!(projection.merge_meta(200, latency(900)).is_applied());
        assert_eq!(
            projection.messages()[1].meta.unwrap().latency_ms,
            Some(900)
        );
    }

    #[test]
    fn meta_prefers_latest_message_with_same_timestamp() {
        let mut projection = MessageProjection::default();
        projection.push(assistant("first", 200));
        projection.push(assistant("second", 200));

        projection.merge_meta(200, latency(5));
        assert!(projection.messages()[0].meta.is_none());
        assert!(projection.messages()[1].meta.is_some());
    }

    #[test]
    fn meta_without_match_leaves_messages_unchanged() {
        let mut projection = MessageProjection::default();
        projection.push(Message::from(Turn::new(MessageRole::User, "hi", 200)));
        let before = projection.messages().to_vec();

        let outcome = projection.merge_meta(200, latency(5));

        assert_eq!(
            outcome,
            ReconcileOutcome::Dropped(MissReason::NoMatchingAssistant { created_at: 200 })
        );
        assert_eq!(projection.messages(), before.as_slice());
    }

    #[test]
    fn completion_is_final_for_its_session() {
        let mut tracker = DownloadTracker::default();
        tracker.on_progress(&tick(0, 100));
        tracker.on_progress(&tick(40, 100));
        assert_eq!(tracker.percent(), Some(40));

        assert!(tracker.on_complete().is_applied());
        assert_eq!(tracker.percent(), None);

        // A straggler from the finished session is ignored.
        assert!(!tracker.on_progress(&tick(90, 100)).is_applied());
        assert!(tracker.is_complete());
        assert!(!tracker.on_complete().is_applied());
    }

    #[test]
    fn zero_tick_starts_a_new_session() {
        let mut tracker = DownloadTracker::default();
        tracker.on_progress(&tick(0, 10));
        tracker.on_complete();

        assert!(tracker.on_progress(&tick(0, 50)).is_applied());
        assert_eq!(tracker.percent(), Some(0));
        tracker.on_progress(&tick(25, 50));
        assert_eq!(tracker.percent(), Some(50));
    }

    #[test]
    fn already_present_model_starts_a_session_each_time() {
        let mut tracker = DownloadTracker::default();
        for _ in 0..2 {
            assert!(tracker.on_progress(&tick(1, 1)).is_applied());
            assert_eq!(tracker.percent(), Some(100));
            assert!(tracker.on_complete().is_applied());
        }
    }

    #[test]
    fn different_total_starts_a_new_session() {
        let mut tracker = DownloadTracker::default();
        tracker.on_progress(&tick(0, 100));
        tracker.on_complete();

        assert!(tracker.on_progress(&tick(30, 300)).is_applied());
        assert_eq!(tracker.percent(), Some(10));
        // Same size as the finished session: still a straggler.
        tracker.on_complete();
        assert!(!tracker.on_progress(&tick(150, 300)).is_applied());
    }
}
