//! Automatic conversation titling helpers.

use jarvis_core::domain::Turn;

/// Number of leading turns used to seed a title.
pub const TITLE_SEED_TURNS: usize = 4;

/// Seed used when a conversation has no turns yet.
pub const EMPTY_SEED: &str = "New conversation";

/// Build the title seed from the first turns of a conversation.
pub fn title_seed(turns: &[Turn]) -> String {
    let seed: String = turns
        .iter()
        .take(TITLE_SEED_TURNS)
        .map(|turn| format!("{}\n", turn.content))
        .collect();
    if seed.trim().is_empty() {
        EMPTY_SEED.to_string()
    } else {
        seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jarvis_core::domain::MessageRole;

    #[test]
    fn seed_uses_first_four_turns() {
        let turns: Vec<_> = (1..=6)
            .map(|n| Turn::new(MessageRole::User, format!("turn {n}"), n))
            .collect();
        assert_eq!(title_seed(&turns), "turn 1\nturn 2\nturn 3\nturn 4\n");
    }

    #[test]
    fn empty_conversation_gets_placeholder_seed() {
        assert_eq!(title_seed(&[]), EMPTY_SEED);
    }
}
