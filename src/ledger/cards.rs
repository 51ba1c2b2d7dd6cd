//! Card creation and lookup: the card side of the transaction store.
//!
//! Cards are stored verbatim and move no points; `declared_points` is
//! descriptive metadata chosen by the sender. Only the like flow touches
//! balances.

use redb::{Database, ReadableTable};

use crate::db::{self, tables};
use crate::error::{AppError, Result};
use crate::models::{Card, CardRecord};

/// Input for a card append; callers validate shape before this point
#[derive(Debug, Clone)]
pub struct NewCard {
    pub sender_id: String,
    pub primary_recipient_id: String,
    pub additional_recipient_ids: Vec<String>,
    pub message: String,
    pub declared_points: i64,
}

/// Append a card and its index entries in one transaction
///
/// Verifies the sender and every recipient are registered, assigns the next
/// card id and maintains the time/sender/recipient indexes alongside the
/// primary record.
pub fn create_card(db: &Database, new_card: NewCard, now: i64) -> Result<Card> {
    let write_txn = db.begin_write()?;
    let (card_id, record) = {
        let balances = write_txn.open_table(tables::BALANCES)?;

        if balances.get(new_card.sender_id.as_str())?.is_none() {
            tracing::warn!("Card attempt by unregistered user {}", new_card.sender_id);
            return Err(AppError::UserNotFound);
        }

        let record = CardRecord {
            sender_id: new_card.sender_id,
            primary_recipient_id: new_card.primary_recipient_id,
            additional_recipient_ids: new_card.additional_recipient_ids,
            message: new_card.message,
            declared_points: new_card.declared_points,
            created_at: now,
        };

        for recipient in record.recipients() {
            if balances.get(recipient)?.is_none() {
                tracing::warn!("Card addressed to unregistered user {}", recipient);
                return Err(AppError::UserNotFound);
            }
        }
        drop(balances);

        let mut counters = write_txn.open_table(tables::COUNTERS)?;
        let card_id = db::next_id(&mut counters, tables::CARD_ID_SEQUENCE)?;
        drop(counters);

        let mut cards = write_txn.open_table(tables::CARDS)?;
        let bytes = db::encode(&record)?;
        cards.insert(card_id, bytes.as_slice())?;
        drop(cards);

        let mut by_time = write_txn.open_table(tables::CARDS_BY_TIME)?;
        by_time.insert((now, card_id), ())?;
        drop(by_time);

        let mut by_sender = write_txn.open_table(tables::CARDS_BY_SENDER)?;
        by_sender.insert((record.sender_id.as_str(), now, card_id), ())?;
        drop(by_sender);

        let mut by_recipient = write_txn.open_table(tables::CARDS_BY_RECIPIENT)?;
        for recipient in record.recipients() {
            by_recipient.insert((recipient, now, card_id), ())?;
        }
        drop(by_recipient);

        (card_id, record)
    };
    write_txn.commit()?;

    Ok(Card::from_record(card_id, record))
}

/// Fetch a stored card
pub fn get_card(db: &Database, card_id: u64) -> Result<Card> {
    let read_txn = db.begin_read()?;
    let cards = read_txn.open_table(tables::CARDS)?;

    let record: CardRecord = match cards.get(card_id)? {
        Some(guard) => db::decode(guard.value())?,
        None => return Err(AppError::CardNotFound),
    };

    Ok(Card::from_record(card_id, record))
}
