use serde::{Deserialize, Serialize};

use crate::constants::{DECLARED_POINTS_STEP, MAX_DECLARED_POINTS, MAX_MESSAGE_CHARS};

/// Card record stored in redb; immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardRecord {
    pub sender_id: String,
    pub primary_recipient_id: String,
    pub additional_recipient_ids: Vec<String>,
    pub message: String,
    /// Descriptive point amount chosen by the sender; moves no points
    pub declared_points: i64,
    /// Unix timestamp
    pub created_at: i64,
}

impl CardRecord {
    /// All recipients, primary first
    pub fn recipients(&self) -> Vec<&str> {
        std::iter::once(self.primary_recipient_id.as_str())
            .chain(self.additional_recipient_ids.iter().map(String::as_str))
            .collect()
    }

    /// Whether `user_id` is among the card's recipients
    pub fn is_recipient(&self, user_id: &str) -> bool {
        self.primary_recipient_id == user_id
            || self.additional_recipient_ids.iter().any(|r| r == user_id)
    }

    /// Whether `user_id` sent or received this card (and so may not like it)
    pub fn involves(&self, user_id: &str) -> bool {
        self.sender_id == user_id || self.is_recipient(user_id)
    }
}

/// Card model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: u64,
    pub sender_id: String,
    pub primary_recipient_id: String,
    pub additional_recipient_ids: Vec<String>,
    pub message: String,
    pub declared_points: i64,
    /// Unix timestamp
    pub created_at: i64,
}

impl Card {
    pub fn from_record(id: u64, record: CardRecord) -> Self {
        Self {
            id,
            sender_id: record.sender_id,
            primary_recipient_id: record.primary_recipient_id,
            additional_recipient_ids: record.additional_recipient_ids,
            message: record.message,
            declared_points: record.declared_points,
            created_at: record.created_at,
        }
    }

    /// Validate the card message (1-140 characters)
    pub fn validate_message(message: &str) -> bool {
        let chars = message.chars().count();
        chars >= 1 && chars <= MAX_MESSAGE_CHARS
    }

    /// Validate a declared point amount (0..=140, steps of 5)
    pub fn validate_declared_points(points: i64) -> bool {
        (0..=MAX_DECLARED_POINTS).contains(&points) && points % DECLARED_POINTS_STEP == 0
    }

    /// Check the recipient set: non-empty by construction (the primary is
    /// required), pairwise distinct, and never containing the sender.
    /// Returns the offending rule as an error message, or None if valid.
    pub fn recipient_error(
        sender_id: &str,
        primary_recipient_id: &str,
        additional_recipient_ids: &[String],
    ) -> Option<&'static str> {
        if primary_recipient_id == sender_id
            || additional_recipient_ids.iter().any(|r| r == sender_id)
        {
            return Some("Sender may not be a recipient of their own card");
        }

        if additional_recipient_ids
            .iter()
            .any(|r| r == primary_recipient_id)
        {
            return Some("Additional recipients must not repeat the primary recipient");
        }

        for (i, r) in additional_recipient_ids.iter().enumerate() {
            if additional_recipient_ids[..i].contains(r) {
                return Some("Recipients must be distinct");
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CardRecord {
        CardRecord {
            sender_id: "alice".to_string(),
            primary_recipient_id: "bob".to_string(),
            additional_recipient_ids: vec!["dana".to_string()],
            message: "great launch work".to_string(),
            declared_points: 20,
            created_at: 1_000_000,
        }
    }

    #[test]
    fn test_recipients_includes_primary_first() {
        let card = sample_record();
        assert_eq!(card.recipients(), vec!["bob", "dana"]);
    }

    #[test]
    fn test_involves_sender_and_recipients() {
        let card = sample_record();

        assert!(card.involves("alice"));
        assert!(card.involves("bob"));
        assert!(card.involves("dana"));
        assert!(!card.involves("carol"));
    }

    #[test]
    fn test_validate_message() {
        assert!(Card::validate_message("thanks!"));
        assert!(Card::validate_message(&"x".repeat(140)));
        assert!(!Card::validate_message(""));
        assert!(!Card::validate_message(&"x".repeat(141)));
    }

    #[test]
    fn test_validate_message_counts_chars_not_bytes() {
        // 140 multi-byte characters are within the limit
        assert!(Card::validate_message(&"é".repeat(140)));
    }

    #[test]
    fn test_validate_declared_points() {
        assert!(Card::validate_declared_points(0));
        assert!(Card::validate_declared_points(5));
        assert!(Card::validate_declared_points(140));
        assert!(!Card::validate_declared_points(3));
        assert!(!Card::validate_declared_points(145));
        assert!(!Card::validate_declared_points(-5));
    }

    #[test]
    fn test_recipient_error_cases() {
        assert!(Card::recipient_error("alice", "bob", &[]).is_none());
        assert!(Card::recipient_error("alice", "bob", &["dana".to_string()]).is_none());

        // Sender among recipients
        assert!(Card::recipient_error("alice", "alice", &[]).is_some());
        assert!(Card::recipient_error("alice", "bob", &["alice".to_string()]).is_some());

        // Duplicates
        assert!(Card::recipient_error("alice", "bob", &["bob".to_string()]).is_some());
        assert!(
            Card::recipient_error("alice", "bob", &["dana".to_string(), "dana".to_string()])
                .is_some()
        );
    }
}
