//! LikeTransactionProcessor: the only path by which points move between
//! users.
//!
//! A like debits 2 points from the acting user, credits 1 weekly point to
//! the card's sender, credits 1 lifetime point to one recipient drawn
//! uniformly at random, and appends the like event. All of it commits in
//! one write transaction or not at all.

use rand::seq::SliceRandom;
use rand::Rng;
use redb::{Database, ReadableTable};
use serde::Serialize;

use crate::constants::{LIKE_COST, LIKE_RECIPIENT_CREDIT, LIKE_SENDER_CREDIT, MAX_LIKES_PER_CARD};
use crate::db::{self, tables};
use crate::error::{AppError, Result};
use crate::ledger::balances::{load_balance, store_balance};
use crate::models::{CardRecord, Like, LikeRecord};

/// The persisted like plus every balance it touched, so callers can update
/// cached views without re-reading
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeReceipt {
    pub like: Like,
    pub actor_balance: i64,
    pub sender_balance: i64,
    pub beneficiary_id: String,
    pub beneficiary_lifetime: i64,
}

/// Execute a like as a single atomic unit
///
/// Failure taxonomy: `CardNotFound`, `SelfInteraction` (the sender and every
/// recipient of a card may never like it), `LikeLimitReached` (the card
/// already carries 50 likes), `InsufficientBalance` (the actor cannot cover
/// the 2-point cost). Any failure leaves the ledger exactly as it was.
///
/// The beneficiary draw is independent per like; repeated likes on the same
/// multi-recipient card may pick different recipients each time.
///
/// `week_start` is the current week boundary: a due weekly reset for the
/// actor or the sender is applied here, inside the same transaction, before
/// their balance is touched.
pub fn process_like<R: Rng>(
    db: &Database,
    card_id: u64,
    actor_id: &str,
    now: i64,
    week_start: i64,
    rng: &mut R,
) -> Result<LikeReceipt> {
    let write_txn = db.begin_write()?;
    let receipt = {
        let cards = write_txn.open_table(tables::CARDS)?;
        let card: CardRecord = match cards.get(card_id)? {
            Some(guard) => db::decode(guard.value())?,
            None => return Err(AppError::CardNotFound),
        };
        drop(cards);

        if card.involves(actor_id) {
            return Err(AppError::SelfInteraction);
        }

        // The cap check runs inside the write transaction, so it is
        // serialized against every concurrent insert on this card.
        let mut card_likes = write_txn.open_table(tables::CARD_LIKES)?;
        let mut like_count: u32 = 0;
        for entry in card_likes.range((card_id, 0u64)..=(card_id, u64::MAX))? {
            entry?;
            like_count += 1;
        }
        if like_count >= MAX_LIKES_PER_CARD {
            return Err(AppError::LikeLimitReached);
        }

        let mut balances = write_txn.open_table(tables::BALANCES)?;

        let mut actor = load_balance(&balances, actor_id)?.ok_or(AppError::UserNotFound)?;
        if actor.is_reset_due(week_start) {
            actor.apply_reset(now);
        }
        actor.debit(LIKE_COST)?;
        store_balance(&mut balances, actor_id, &actor)?;

        let mut sender =
            load_balance(&balances, &card.sender_id)?.ok_or(AppError::UserNotFound)?;
        if sender.is_reset_due(week_start) {
            sender.apply_reset(now);
        }
        sender.credit(LIKE_SENDER_CREDIT);
        store_balance(&mut balances, &card.sender_id, &sender)?;

        let beneficiary_id = card
            .recipients()
            .choose(rng)
            .map(|r| r.to_string())
            .ok_or_else(|| AppError::InvalidInput("Card has no recipients".to_string()))?;
        let mut beneficiary =
            load_balance(&balances, &beneficiary_id)?.ok_or(AppError::UserNotFound)?;
        beneficiary.credit_lifetime(LIKE_RECIPIENT_CREDIT);
        store_balance(&mut balances, &beneficiary_id, &beneficiary)?;
        drop(balances);

        let mut counters = write_txn.open_table(tables::COUNTERS)?;
        let like_id = db::next_id(&mut counters, tables::LIKE_ID_SEQUENCE)?;
        drop(counters);

        let record = LikeRecord {
            card_id,
            actor_id: actor_id.to_string(),
            receiver_id: card.sender_id.clone(),
            beneficiary_id: beneficiary_id.clone(),
            points_debited: LIKE_COST,
            created_at: now,
        };

        let mut likes = write_txn.open_table(tables::LIKES)?;
        let bytes = db::encode(&record)?;
        likes.insert(like_id, bytes.as_slice())?;
        drop(likes);

        card_likes.insert((card_id, like_id), ())?;
        drop(card_likes);

        let mut by_time = write_txn.open_table(tables::LIKES_BY_TIME)?;
        by_time.insert((now, like_id), ())?;
        drop(by_time);

        let mut by_actor = write_txn.open_table(tables::LIKES_BY_ACTOR)?;
        by_actor.insert((actor_id, now, like_id), ())?;
        drop(by_actor);

        let mut by_receiver = write_txn.open_table(tables::LIKES_BY_RECEIVER)?;
        by_receiver.insert((record.receiver_id.as_str(), now, like_id), ())?;
        drop(by_receiver);

        let mut by_beneficiary = write_txn.open_table(tables::LIKES_BY_BENEFICIARY)?;
        by_beneficiary.insert((beneficiary_id.as_str(), now, like_id), ())?;
        drop(by_beneficiary);

        LikeReceipt {
            like: Like::from_record(like_id, &record),
            actor_balance: actor.weekly_balance,
            sender_balance: sender.weekly_balance,
            beneficiary_id,
            beneficiary_lifetime: beneficiary.lifetime_received,
        }
    };
    write_txn.commit()?;

    Ok(receipt)
}
