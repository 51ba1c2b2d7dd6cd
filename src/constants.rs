/// Weekly spendable allowance every user is reset to (points)
pub const WEEKLY_ALLOWANCE: i64 = 500;

/// Points debited from a user for each like they give
pub const LIKE_COST: i64 = 2;

/// Points credited to a card's sender for each like it receives
pub const LIKE_SENDER_CREDIT: i64 = 1;

/// Lifetime points credited to the drawn recipient for each like
pub const LIKE_RECIPIENT_CREDIT: i64 = 1;

/// Points counted per sent card in the dashboard "points sent" total
pub const POINTS_PER_CARD_SENT: i64 = 1;

/// Maximum number of likes a single card can accumulate
pub const MAX_LIKES_PER_CARD: u32 = 50;

/// Maximum card message length in characters
pub const MAX_MESSAGE_CHARS: usize = 140;

/// Maximum declared point amount a sender can attach to a card
pub const MAX_DECLARED_POINTS: i64 = 140;

/// Declared point amounts must be a multiple of this step
pub const DECLARED_POINTS_STEP: i64 = 5;

/// Maximum user ID length in characters
pub const MAX_USER_ID_CHARS: usize = 64;

/// Upper bound on the `limit` parameter of ranking queries
pub const MAX_RANKING_LIMIT: usize = 100;

/// Bounded retries for opening read transactions in aggregation queries
pub const AGGREGATION_READ_RETRIES: u32 = 2;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for invalid user ID format
pub const ERR_INVALID_USER_ID: &str =
    "User ID must be 1-64 characters of letters, digits, '-' or '_'";

/// Error message for invalid card message length
pub const ERR_INVALID_MESSAGE: &str = "Message must be 1-140 characters";

/// Error message for invalid declared point amounts
pub const ERR_INVALID_DECLARED_POINTS: &str =
    "Declared points must be between 0 and 140 in steps of 5";

/// Error message for a ranking window with from >= to
pub const ERR_INVALID_WINDOW: &str = "Window start must be before window end";
