use serde::{Deserialize, Serialize};

use crate::constants::WEEKLY_ALLOWANCE;
use crate::error::{AppError, Result};

/// Per-user point balances stored in redb
///
/// Mutated only inside a single store transaction (the like processor, the
/// weekly reset sweep, or a direct ledger operation), so the check-then-write
/// in `debit` is atomic with respect to concurrent callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    /// Spendable weekly allowance; never negative
    pub weekly_balance: i64,
    /// Uncapped, monotonically increasing received-points counter
    pub lifetime_received: i64,
    /// Unix timestamp of the last weekly reset, None until the first one
    pub last_reset_at: Option<i64>,
}

impl BalanceRecord {
    /// Create a fresh record with the full weekly allowance
    pub fn new() -> Self {
        Self {
            weekly_balance: WEEKLY_ALLOWANCE,
            lifetime_received: 0,
            last_reset_at: None,
        }
    }

    /// Subtract `amount` from the weekly balance, or fail without changing
    /// anything when the balance does not cover it
    pub fn debit(&mut self, amount: i64) -> Result<i64> {
        if amount > self.weekly_balance {
            tracing::debug!(
                "Debit of {} rejected: balance is {}",
                amount,
                self.weekly_balance
            );
            return Err(AppError::InsufficientBalance);
        }

        self.weekly_balance -= amount;
        Ok(self.weekly_balance)
    }

    /// Add `amount` to the weekly balance
    ///
    /// May push the balance above the weekly allowance; the cap is enforced
    /// only at reset time.
    pub fn credit(&mut self, amount: i64) -> i64 {
        self.weekly_balance += amount;
        self.weekly_balance
    }

    /// Add `amount` to the lifetime-received counter
    pub fn credit_lifetime(&mut self, amount: i64) -> i64 {
        self.lifetime_received += amount;
        self.lifetime_received
    }

    /// Whether this record has not yet been reset in the week starting at
    /// `week_start`
    pub fn is_reset_due(&self, week_start: i64) -> bool {
        self.last_reset_at.map_or(true, |t| t < week_start)
    }

    /// Restore the weekly allowance and stamp the reset time
    ///
    /// Leaves `lifetime_received` untouched. A user that missed several
    /// weekly resets is reset once, to the standard allowance.
    pub fn apply_reset(&mut self, now: i64) {
        self.weekly_balance = WEEKLY_ALLOWANCE;
        self.last_reset_at = Some(now);
    }
}
