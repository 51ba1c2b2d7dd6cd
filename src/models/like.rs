use serde::{Deserialize, Serialize};

/// Like record stored in redb; immutable once created
///
/// `receiver_id` (the card's sender, credited 1 weekly point) and
/// `beneficiary_id` (the recipient drawn for the lifetime credit) are
/// denormalized here so aggregation never has to join back to the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub card_id: u64,
    pub actor_id: String,
    pub receiver_id: String,
    pub beneficiary_id: String,
    pub points_debited: i64,
    /// Unix timestamp
    pub created_at: i64,
}

/// Like model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: u64,
    pub card_id: u64,
    pub actor_id: String,
    pub points_debited: i64,
    /// Unix timestamp
    pub created_at: i64,
}

impl Like {
    pub fn from_record(id: u64, record: &LikeRecord) -> Self {
        Self {
            id,
            card_id: record.card_id,
            actor_id: record.actor_id.clone(),
            points_debited: record.points_debited,
            created_at: record.created_at,
        }
    }
}
