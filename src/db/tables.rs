use redb::TableDefinition;

/// Balances table: user_id -> BalanceRecord (serialized)
pub const BALANCES: TableDefinition<&str, &[u8]> = TableDefinition::new("balances");

/// Cards table: card_id -> CardRecord (serialized)
pub const CARDS: TableDefinition<u64, &[u8]> = TableDefinition::new("cards");

/// Likes table: like_id -> LikeRecord (serialized)
pub const LIKES: TableDefinition<u64, &[u8]> = TableDefinition::new("likes");

/// Monotonic id sequences: sequence name -> last issued id
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter key for the card id sequence
pub const CARD_ID_SEQUENCE: &str = "card_id";

/// Counter key for the like id sequence
pub const LIKE_ID_SEQUENCE: &str = "like_id";

// =============================================================================
// Secondary indexes
//
// Maintained in the same write transaction as the primary-table append.
// Tuple keys order lexicographically, so `(a, from, 0)..(a, to, 0)` is a
// cheap range scan of one user's events inside a `[from, to)` time window.
// =============================================================================

/// Likes per card: (card_id, like_id). Range-counted to enforce the
/// per-card like cap inside the like transaction.
pub const CARD_LIKES: TableDefinition<(u64, u64), ()> = TableDefinition::new("card_likes");

/// All cards by creation time: (created_at, card_id)
pub const CARDS_BY_TIME: TableDefinition<(i64, u64), ()> = TableDefinition::new("cards_by_time");

/// Cards by sender: (sender_id, created_at, card_id)
pub const CARDS_BY_SENDER: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("cards_by_sender");

/// Cards by recipient, one entry per recipient: (recipient_id, created_at, card_id)
pub const CARDS_BY_RECIPIENT: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("cards_by_recipient");

/// All likes by creation time: (created_at, like_id)
pub const LIKES_BY_TIME: TableDefinition<(i64, u64), ()> = TableDefinition::new("likes_by_time");

/// Likes by the acting user: (actor_id, created_at, like_id)
pub const LIKES_BY_ACTOR: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("likes_by_actor");

/// Likes by the credited card sender: (receiver_id, created_at, like_id)
pub const LIKES_BY_RECEIVER: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("likes_by_receiver");

/// Likes by the recipient drawn for the lifetime credit:
/// (beneficiary_id, created_at, like_id)
pub const LIKES_BY_BENEFICIARY: TableDefinition<(&str, i64, u64), ()> =
    TableDefinition::new("likes_by_beneficiary");
