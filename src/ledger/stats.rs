//! AggregationEngine: read-side statistics over the card/like history.
//!
//! Every query reads one committed snapshot (a redb read transaction), so a
//! half-applied like can never be observed; queries are not linearizable
//! with concurrent writes, which is acceptable for dashboards.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use redb::{Database, ReadTransaction, ReadableTable};
use serde::Serialize;

use crate::constants::{
    AGGREGATION_READ_RETRIES, LIKE_COST, LIKE_RECIPIENT_CREDIT, LIKE_SENDER_CREDIT,
    POINTS_PER_CARD_SENT, WEEKLY_ALLOWANCE,
};
use crate::db::{self, tables};
use crate::error::Result;
use crate::ledger::balances;
use crate::models::{CardRecord, LikeRecord};

/// Half-open time window `[from, to)` in unix seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub from: i64,
    pub to: i64,
}

impl Window {
    /// Everything ever recorded
    pub fn all() -> Self {
        Self {
            from: 0,
            to: i64::MAX,
        }
    }

    /// The calendar month containing `now`, in the deployment offset
    pub fn month_of(now: i64, offset: FixedOffset) -> Self {
        let local = DateTime::from_timestamp(now, 0)
            .unwrap_or_else(Utc::now)
            .with_timezone(&offset);
        let today = local.date_naive();

        let first = NaiveDate::from_ymd_opt(local.year(), local.month(), 1).unwrap_or(today);
        let (next_year, next_month) = if local.month() == 12 {
            (local.year() + 1, 1)
        } else {
            (local.year(), local.month() + 1)
        };
        let next = NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap_or(today);

        let offset_secs = i64::from(offset.local_minus_utc());
        Self {
            from: first.and_time(NaiveTime::MIN).and_utc().timestamp() - offset_secs,
            to: next.and_time(NaiveTime::MIN).and_utc().timestamp() - offset_secs,
        }
    }
}

/// One leaderboard row
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub user_id: String,
    pub count: i64,
}

/// The four leaderboards for one window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rankings {
    pub card_senders: Vec<RankEntry>,
    pub card_receivers: Vec<RankEntry>,
    pub like_senders: Vec<RankEntry>,
    pub like_receivers: Vec<RankEntry>,
}

/// Per-user activity counts and point totals within a window
///
/// `points_sent` reconstructs the debit side of the ledger from the event
/// log: 1 per card sent plus 2 per like given. `points_received` mirrors the
/// credit side: 1 per like on the user's cards plus 1 per lifetime credit
/// drawn in their favor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalStats {
    pub cards_sent: i64,
    pub cards_received: i64,
    pub likes_sent: i64,
    pub likes_received: i64,
    pub points_sent: i64,
    pub points_received: i64,
}

/// Current standing straight from the balance ledger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStanding {
    pub balance: i64,
    pub allowance: i64,
    pub lifetime_received: i64,
    /// Unix timestamp of the last weekly reset
    pub last_reset_at: Option<i64>,
}

/// Everything the dashboard needs in one response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub weekly: WeeklyStanding,
    pub monthly: PersonalStats,
    pub lifetime: PersonalStats,
    pub rankings: Rankings,
}

/// Open a read transaction, retrying a bounded number of times
fn begin_read_with_retry(db: &Database) -> Result<ReadTransaction> {
    let mut attempt = 0;
    loop {
        match db.begin_read() {
            Ok(txn) => return Ok(txn),
            Err(e) if attempt < AGGREGATION_READ_RETRIES => {
                attempt += 1;
                tracing::warn!("Read transaction failed (attempt {}): {}", attempt, e);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Sort grouped counts into a leaderboard: count descending, ties broken by
/// ascending user id for a stable, reproducible order
fn into_leaderboard(counts: BTreeMap<String, i64>, limit: usize) -> Vec<RankEntry> {
    let mut entries: Vec<RankEntry> = counts
        .into_iter()
        .map(|(user_id, count)| RankEntry { user_id, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
    entries.truncate(limit);
    entries
}

/// Count the entries of a per-user index inside a window
fn count_user_range(
    table: &impl ReadableTable<(&'static str, i64, u64), ()>,
    user_id: &str,
    window: Window,
) -> Result<i64> {
    let mut count = 0;
    for entry in table.range((user_id, window.from, 0u64)..(user_id, window.to, 0u64))? {
        entry?;
        count += 1;
    }
    Ok(count)
}

/// Top senders/receivers of cards and likes within a window
pub fn rankings(db: &Database, window: Window, limit: usize) -> Result<Rankings> {
    let read_txn = begin_read_with_retry(db)?;

    let mut card_senders: BTreeMap<String, i64> = BTreeMap::new();
    let mut card_receivers: BTreeMap<String, i64> = BTreeMap::new();
    {
        let by_time = read_txn.open_table(tables::CARDS_BY_TIME)?;
        let cards = read_txn.open_table(tables::CARDS)?;

        for entry in by_time.range((window.from, 0u64)..(window.to, 0u64))? {
            let (key, _) = entry?;
            let (_, card_id) = key.value();

            let card: CardRecord = match cards.get(card_id)? {
                Some(guard) => db::decode(guard.value())?,
                None => {
                    tracing::warn!("Card index entry without a record: {}", card_id);
                    continue;
                }
            };

            *card_senders.entry(card.sender_id.clone()).or_insert(0) += 1;
            for recipient in card.recipients() {
                *card_receivers.entry(recipient.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut like_senders: BTreeMap<String, i64> = BTreeMap::new();
    let mut like_receivers: BTreeMap<String, i64> = BTreeMap::new();
    {
        let by_time = read_txn.open_table(tables::LIKES_BY_TIME)?;
        let likes = read_txn.open_table(tables::LIKES)?;

        for entry in by_time.range((window.from, 0u64)..(window.to, 0u64))? {
            let (key, _) = entry?;
            let (_, like_id) = key.value();

            let like: LikeRecord = match likes.get(like_id)? {
                Some(guard) => db::decode(guard.value())?,
                None => {
                    tracing::warn!("Like index entry without a record: {}", like_id);
                    continue;
                }
            };

            *like_senders.entry(like.actor_id).or_insert(0) += 1;
            *like_receivers.entry(like.receiver_id).or_insert(0) += 1;
        }
    }

    Ok(Rankings {
        card_senders: into_leaderboard(card_senders, limit),
        card_receivers: into_leaderboard(card_receivers, limit),
        like_senders: into_leaderboard(like_senders, limit),
        like_receivers: into_leaderboard(like_receivers, limit),
    })
}

/// Activity counts and point totals for one user within a window
pub fn personal_stats(db: &Database, user_id: &str, window: Window) -> Result<PersonalStats> {
    let read_txn = begin_read_with_retry(db)?;

    let cards_sent = {
        let table = read_txn.open_table(tables::CARDS_BY_SENDER)?;
        count_user_range(&table, user_id, window)?
    };
    let cards_received = {
        let table = read_txn.open_table(tables::CARDS_BY_RECIPIENT)?;
        count_user_range(&table, user_id, window)?
    };
    let likes_sent = {
        let table = read_txn.open_table(tables::LIKES_BY_ACTOR)?;
        count_user_range(&table, user_id, window)?
    };
    let likes_received = {
        let table = read_txn.open_table(tables::LIKES_BY_RECEIVER)?;
        count_user_range(&table, user_id, window)?
    };
    let lifetime_credits = {
        let table = read_txn.open_table(tables::LIKES_BY_BENEFICIARY)?;
        count_user_range(&table, user_id, window)?
    };

    Ok(PersonalStats {
        cards_sent,
        cards_received,
        likes_sent,
        likes_received,
        points_sent: cards_sent * POINTS_PER_CARD_SENT + likes_sent * LIKE_COST,
        points_received: likes_received * LIKE_SENDER_CREDIT
            + lifetime_credits * LIKE_RECIPIENT_CREDIT,
    })
}

/// Assemble the dashboard: current standing, this month, all time, and the
/// current month's leaderboards
pub fn dashboard(
    db: &Database,
    user_id: &str,
    now: i64,
    offset: FixedOffset,
    limit: usize,
) -> Result<DashboardStats> {
    let snapshot = balances::snapshot(db, user_id)?;
    let month = Window::month_of(now, offset);

    Ok(DashboardStats {
        weekly: WeeklyStanding {
            balance: snapshot.weekly_balance,
            allowance: WEEKLY_ALLOWANCE,
            lifetime_received: snapshot.lifetime_received,
            last_reset_at: snapshot.last_reset_at,
        },
        monthly: personal_stats(db, user_id, month)?,
        lifetime: personal_stats(db, user_id, Window::all())?,
        rankings: rankings(db, month, limit)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_database, Db};
    use crate::ledger::cards::{self, NewCard};
    use crate::ledger::{balances, likes};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    const WEEK_START: i64 = 0;

    fn test_db() -> (TempDir, Db) {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();
        (temp_dir, db)
    }

    fn make_card(db: &Db, sender: &str, primary: &str, at: i64) -> u64 {
        cards::create_card(
            db,
            NewCard {
                sender_id: sender.to_string(),
                primary_recipient_id: primary.to_string(),
                additional_recipient_ids: Vec::new(),
                message: "nice work".to_string(),
                declared_points: 5,
            },
            at,
        )
        .unwrap()
        .id
    }

    fn like(db: &Db, card_id: u64, actor: &str, at: i64) {
        let mut rng = StdRng::seed_from_u64(1);
        likes::process_like(db, card_id, actor, at, WEEK_START, &mut rng).unwrap();
    }

    #[test]
    fn test_rankings_count_and_order() {
        let (_dir, db) = test_db();
        for user in ["alice", "bob", "carol", "dana"] {
            balances::create_user(&db, user).unwrap();
        }

        // alice sends two cards, bob one; carol likes all three
        let c1 = make_card(&db, "alice", "bob", 100);
        let c2 = make_card(&db, "alice", "dana", 200);
        let c3 = make_card(&db, "bob", "dana", 300);
        for card in [c1, c2, c3] {
            like(&db, card, "carol", 400);
        }

        let result = rankings(&db, Window::all(), 10).unwrap();

        assert_eq!(
            result.card_senders,
            vec![
                RankEntry {
                    user_id: "alice".to_string(),
                    count: 2
                },
                RankEntry {
                    user_id: "bob".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            result.card_receivers,
            vec![
                RankEntry {
                    user_id: "dana".to_string(),
                    count: 2
                },
                RankEntry {
                    user_id: "bob".to_string(),
                    count: 1
                },
            ]
        );
        assert_eq!(
            result.like_senders,
            vec![RankEntry {
                user_id: "carol".to_string(),
                count: 3
            }]
        );
        assert_eq!(
            result.like_receivers,
            vec![
                RankEntry {
                    user_id: "alice".to_string(),
                    count: 2
                },
                RankEntry {
                    user_id: "bob".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_ranking_ties_break_by_ascending_user_id() {
        let (_dir, db) = test_db();
        for user in ["zoe", "abe", "mia", "bob"] {
            balances::create_user(&db, user).unwrap();
        }
        make_card(&db, "zoe", "abe", 100);
        make_card(&db, "abe", "zoe", 200);
        make_card(&db, "mia", "bob", 300);

        let result = rankings(&db, Window::all(), 10).unwrap();
        let senders: Vec<&str> = result
            .card_senders
            .iter()
            .map(|e| e.user_id.as_str())
            .collect();
        assert_eq!(senders, vec!["abe", "mia", "zoe"]);

        // Same data, same order, every time
        let again = rankings(&db, Window::all(), 10).unwrap();
        assert_eq!(result.card_senders, again.card_senders);
    }

    #[test]
    fn test_rankings_respect_the_limit() {
        let (_dir, db) = test_db();
        for i in 0..5 {
            balances::create_user(&db, &format!("sender-{i}")).unwrap();
        }
        balances::create_user(&db, "bob").unwrap();
        for i in 0..5 {
            make_card(&db, &format!("sender-{i}"), "bob", 100 + i);
        }

        let result = rankings(&db, Window::all(), 3).unwrap();
        assert_eq!(result.card_senders.len(), 3);
    }

    #[test]
    fn test_window_is_half_open() {
        let (_dir, db) = test_db();
        for user in ["alice", "bob"] {
            balances::create_user(&db, user).unwrap();
        }
        make_card(&db, "alice", "bob", 100);
        make_card(&db, "alice", "bob", 200);

        // [100, 200) includes the first card only
        let result = rankings(&db, Window { from: 100, to: 200 }, 10).unwrap();
        assert_eq!(result.card_senders[0].count, 1);

        let stats = personal_stats(&db, "alice", Window { from: 100, to: 200 }).unwrap();
        assert_eq!(stats.cards_sent, 1);
        let stats = personal_stats(&db, "alice", Window { from: 100, to: 201 }).unwrap();
        assert_eq!(stats.cards_sent, 2);
    }

    #[test]
    fn test_personal_stats_point_totals() {
        let (_dir, db) = test_db();
        for user in ["alice", "bob", "carol"] {
            balances::create_user(&db, user).unwrap();
        }

        // carol: 1 card sent, 2 likes given
        let own = make_card(&db, "carol", "bob", 100);
        let c1 = make_card(&db, "alice", "bob", 200);
        let c2 = make_card(&db, "bob", "alice", 300);
        like(&db, c1, "carol", 400);
        like(&db, c2, "carol", 500);
        // alice likes carol's card: carol gets the sender credit
        like(&db, own, "alice", 600);

        let stats = personal_stats(&db, "carol", Window::all()).unwrap();
        assert_eq!(stats.cards_sent, 1);
        assert_eq!(stats.cards_received, 0);
        assert_eq!(stats.likes_sent, 2);
        assert_eq!(stats.likes_received, 1);
        assert_eq!(stats.points_sent, 1 + 2 * LIKE_COST);
        // 1 from the like on carol's card; the lifetime credit went to bob
        assert_eq!(stats.points_received, 1);

        let bob = personal_stats(&db, "bob", Window::all()).unwrap();
        assert_eq!(bob.cards_received, 2);
        // 1 sender credit from the like on bob's card, 2 lifetime draws
        assert_eq!(bob.likes_received, 1);
        assert_eq!(bob.points_received, 1 + 2);
    }

    #[test]
    fn test_dashboard_shape() {
        let (_dir, db) = test_db();
        for user in ["alice", "bob", "carol"] {
            balances::create_user(&db, user).unwrap();
        }
        let now = chrono::Utc::now().timestamp();
        let card = make_card(&db, "alice", "bob", now);
        let mut rng = StdRng::seed_from_u64(1);
        likes::process_like(&db, card, "carol", now, WEEK_START, &mut rng).unwrap();

        let offset = FixedOffset::east_opt(0).unwrap();
        let stats = dashboard(&db, "alice", now, offset, 10).unwrap();

        assert_eq!(stats.weekly.allowance, WEEKLY_ALLOWANCE);
        assert_eq!(stats.weekly.balance, WEEKLY_ALLOWANCE + 1);
        assert_eq!(stats.monthly.cards_sent, 1);
        assert_eq!(stats.monthly.likes_received, 1);
        assert_eq!(stats.lifetime.cards_sent, 1);
        assert_eq!(stats.rankings.card_senders[0].user_id, "alice");
    }

    #[test]
    fn test_month_window_boundaries() {
        let offset = FixedOffset::east_opt(0).unwrap();
        // 2026-08-07 12:00:00 UTC
        let now = 1_786_104_000;
        let window = Window::month_of(now, offset);

        // [2026-08-01, 2026-09-01) UTC
        assert_eq!(window.from, 1_785_542_400);
        assert_eq!(window.to, 1_788_220_800);
        assert!(window.from <= now && now < window.to);
    }

    #[test]
    fn test_month_window_respects_offset() {
        // At UTC+3, 2026-08-31 23:00 UTC is already September
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        let late_august_utc = 1_788_220_800 - 3600; // 2026-08-31 23:00 UTC
        let window = Window::month_of(late_august_utc, offset);

        // September at UTC+3 starts at 2026-08-31 21:00 UTC
        assert_eq!(window.from, 1_788_220_800 - 3 * 3600);
    }

    #[test]
    fn test_stats_for_quiet_user_are_zero() {
        let (_dir, db) = test_db();
        balances::create_user(&db, "alice").unwrap();

        let stats = personal_stats(&db, "alice", Window::all()).unwrap();
        assert_eq!(stats.cards_sent, 0);
        assert_eq!(stats.points_sent, 0);
        assert_eq!(stats.points_received, 0);

        let empty = rankings(&db, Window::all(), 10).unwrap();
        assert!(empty.card_senders.is_empty());
        assert!(empty.like_receivers.is_empty());
    }
}
