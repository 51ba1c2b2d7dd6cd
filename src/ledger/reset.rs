//! WeeklyResetScheduler: restores every user's weekly allowance once per
//! calendar week, anchored to Monday 00:00 in the deployment's configured
//! UTC offset.
//!
//! The sweep is stateless and idempotent: it is keyed off each user's
//! `last_reset_at`, so running it hourly, after downtime spanning several
//! weeks, or twice in a row never double- or zero-resets anyone.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, FixedOffset, NaiveTime, Utc};
use redb::{Database, ReadableTable};

use crate::db::{tables, Db};
use crate::error::Result;
use crate::ledger::balances::{load_balance, store_balance};

/// Outcome of one reset sweep
#[derive(Debug, Clone, Copy, Default)]
pub struct SweepSummary {
    /// Balance records examined
    pub scanned: usize,
    /// Users whose allowance was restored
    pub reset: usize,
    /// Users skipped because of an error; retried on the next tick
    pub failed: usize,
}

/// The most recent Monday 00:00 in `offset`, as a unix timestamp
pub fn week_start(now: i64, offset: FixedOffset) -> i64 {
    let local = DateTime::from_timestamp(now, 0)
        .unwrap_or_else(Utc::now)
        .with_timezone(&offset);
    let days_into_week = i64::from(local.weekday().num_days_from_monday());
    let monday = local.date_naive() - ChronoDuration::days(days_into_week);

    // A fixed offset has no DST transitions, so local-midnight arithmetic
    // is a plain subtraction.
    monday.and_time(NaiveTime::MIN).and_utc().timestamp() - i64::from(offset.local_minus_utc())
}

/// Reset every user whose balance has not been reset since `week_start`
///
/// One write transaction per user: a failure for one user is logged and
/// counted, never blocking the rest. The due-check runs again inside each
/// transaction, so a sweep racing a like (which applies due resets itself)
/// stays idempotent.
pub fn sweep(db: &Database, now: i64, week_start: i64) -> Result<SweepSummary> {
    let mut summary = SweepSummary::default();

    let due_users: Vec<String> = {
        let read_txn = db.begin_read()?;
        let balances = read_txn.open_table(tables::BALANCES)?;

        let mut due = Vec::new();
        for entry in balances.iter()? {
            let (key, value) = entry?;
            summary.scanned += 1;
            match crate::db::decode::<crate::models::BalanceRecord>(value.value()) {
                Ok(record) => {
                    if record.is_reset_due(week_start) {
                        due.push(key.value().to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable balance record {}: {}", key.value(), e);
                    summary.failed += 1;
                }
            }
        }
        due
    };

    for user_id in due_users {
        match reset_user(db, &user_id, now, week_start) {
            Ok(true) => summary.reset += 1,
            Ok(false) => {} // someone else reset them since the scan
            Err(e) => {
                tracing::warn!("Weekly reset failed for {}: {}", user_id, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Reset a single user if still due; returns whether a reset happened
fn reset_user(db: &Database, user_id: &str, now: i64, week_start: i64) -> Result<bool> {
    let write_txn = db.begin_write()?;
    let did_reset = {
        let mut balances = write_txn.open_table(tables::BALANCES)?;
        match load_balance(&balances, user_id)? {
            Some(mut record) if record.is_reset_due(week_start) => {
                record.apply_reset(now);
                store_balance(&mut balances, user_id, &record)?;
                true
            }
            _ => false,
        }
    };

    if did_reset {
        write_txn.commit()?;
    }

    Ok(did_reset)
}

/// Periodic sweep task spawned from `main`
pub async fn run(db: Db, offset: FixedOffset, interval_secs: u64) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        let db = db.clone();
        let now = Utc::now().timestamp();
        let boundary = week_start(now, offset);

        match tokio::task::spawn_blocking(move || sweep(&db, now, boundary)).await {
            Ok(Ok(summary)) => {
                if summary.reset > 0 || summary.failed > 0 {
                    tracing::info!(
                        "Weekly reset sweep: {} scanned, {} reset, {} failed",
                        summary.scanned,
                        summary.reset,
                        summary.failed
                    );
                } else {
                    tracing::debug!("Weekly reset sweep: nothing due");
                }
            }
            Ok(Err(e)) => tracing::error!("Weekly reset sweep failed: {}", e),
            Err(e) => tracing::error!("Weekly reset task join error: {}", e),
        }
    }
}
