//! BalanceLedger: the single source of truth for a user's spendable weekly
//! balance and lifetime-received total.

use redb::{Database, ReadableTable, Table};

use crate::db::{self, tables};
use crate::error::{AppError, Result};
use crate::models::BalanceRecord;

/// Read one user's balance record from an open table
pub(crate) fn load_balance(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    user_id: &str,
) -> Result<Option<BalanceRecord>> {
    match table.get(user_id)? {
        Some(guard) => Ok(Some(db::decode(guard.value())?)),
        None => Ok(None),
    }
}

/// Write one user's balance record to an open table
pub(crate) fn store_balance(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    user_id: &str,
    record: &BalanceRecord,
) -> Result<()> {
    let bytes = db::encode(record)?;
    table.insert(user_id, bytes.as_slice())?;
    Ok(())
}

/// Create a balance record for a newly registered user
///
/// Starts with the full weekly allowance, zero lifetime points and no reset
/// timestamp. Fails with `UserAlreadyExists` if the user is registered.
pub fn create_user(db: &Database, user_id: &str) -> Result<BalanceRecord> {
    let write_txn = db.begin_write()?;
    let record = {
        let mut balances = write_txn.open_table(tables::BALANCES)?;

        if balances.get(user_id)?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let record = BalanceRecord::new();
        store_balance(&mut balances, user_id, &record)?;
        record
    };
    write_txn.commit()?;

    Ok(record)
}

/// Atomically subtract `amount` from a user's weekly balance
///
/// The balance check and the write commit together; two concurrent debits
/// that would jointly overdraw can never both succeed.
pub fn debit(db: &Database, user_id: &str, amount: i64) -> Result<i64> {
    let write_txn = db.begin_write()?;
    let new_balance = {
        let mut balances = write_txn.open_table(tables::BALANCES)?;
        let mut record = load_balance(&balances, user_id)?.ok_or(AppError::UserNotFound)?;
        let new_balance = record.debit(amount)?;
        store_balance(&mut balances, user_id, &record)?;
        new_balance
    };
    write_txn.commit()?;

    Ok(new_balance)
}

/// Atomically add `amount` to a user's weekly balance
pub fn credit(db: &Database, user_id: &str, amount: i64) -> Result<i64> {
    let write_txn = db.begin_write()?;
    let new_balance = {
        let mut balances = write_txn.open_table(tables::BALANCES)?;
        let mut record = load_balance(&balances, user_id)?.ok_or(AppError::UserNotFound)?;
        let new_balance = record.credit(amount);
        store_balance(&mut balances, user_id, &record)?;
        new_balance
    };
    write_txn.commit()?;

    Ok(new_balance)
}

/// Atomically add `amount` to a user's lifetime-received counter
pub fn credit_lifetime(db: &Database, user_id: &str, amount: i64) -> Result<i64> {
    let write_txn = db.begin_write()?;
    let new_total = {
        let mut balances = write_txn.open_table(tables::BALANCES)?;
        let mut record = load_balance(&balances, user_id)?.ok_or(AppError::UserNotFound)?;
        let new_total = record.credit_lifetime(amount);
        store_balance(&mut balances, user_id, &record)?;
        new_total
    };
    write_txn.commit()?;

    Ok(new_total)
}

/// Point-in-time read of a user's balances
pub fn snapshot(db: &Database, user_id: &str) -> Result<BalanceRecord> {
    let read_txn = db.begin_read()?;
    let balances = read_txn.open_table(tables::BALANCES)?;
    load_balance(&balances, user_id)?.ok_or(AppError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEKLY_ALLOWANCE;
    use crate::db::{open_database, Db};
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Db) {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_create_user_starts_with_allowance() {
        let (_dir, db) = test_db();

        let record = create_user(&db, "alice").unwrap();
        assert_eq!(record.weekly_balance, WEEKLY_ALLOWANCE);
        assert_eq!(record.lifetime_received, 0);

        let snap = snapshot(&db, "alice").unwrap();
        assert_eq!(snap, record);
    }

    #[test]
    fn test_create_user_twice_conflicts() {
        let (_dir, db) = test_db();

        create_user(&db, "alice").unwrap();
        assert!(matches!(
            create_user(&db, "alice"),
            Err(AppError::UserAlreadyExists)
        ));
    }

    #[test]
    fn test_debit_and_credit_round_trip() {
        let (_dir, db) = test_db();
        create_user(&db, "alice").unwrap();

        assert_eq!(debit(&db, "alice", 2).unwrap(), WEEKLY_ALLOWANCE - 2);
        assert_eq!(credit(&db, "alice", 1).unwrap(), WEEKLY_ALLOWANCE - 1);
        assert_eq!(credit_lifetime(&db, "alice", 1).unwrap(), 1);

        let snap = snapshot(&db, "alice").unwrap();
        assert_eq!(snap.weekly_balance, WEEKLY_ALLOWANCE - 1);
        assert_eq!(snap.lifetime_received, 1);
    }

    #[test]
    fn test_debit_insufficient_leaves_balance_unchanged() {
        let (_dir, db) = test_db();
        create_user(&db, "alice").unwrap();
        debit(&db, "alice", WEEKLY_ALLOWANCE - 1).unwrap();

        assert!(matches!(
            debit(&db, "alice", 2),
            Err(AppError::InsufficientBalance)
        ));
        assert_eq!(snapshot(&db, "alice").unwrap().weekly_balance, 1);
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let (_dir, db) = test_db();

        assert!(matches!(debit(&db, "ghost", 1), Err(AppError::UserNotFound)));
        assert!(matches!(snapshot(&db, "ghost"), Err(AppError::UserNotFound)));
    }

    #[test]
    fn test_concurrent_debits_cannot_jointly_overdraw() {
        let (_dir, db) = test_db();
        create_user(&db, "alice").unwrap();

        // Two debits of 300 against a balance of 500: exactly one may win.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || debit(&db, "alice", 300).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(
            snapshot(&db, "alice").unwrap().weekly_balance,
            WEEKLY_ALLOWANCE - 300
        );
    }
}
