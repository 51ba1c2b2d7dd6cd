use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::constants::{ERR_INVALID_DECLARED_POINTS, ERR_INVALID_MESSAGE, ERR_INVALID_USER_ID};
use crate::error::{AppError, Result};
use crate::ledger::cards::{self, NewCard};
use crate::models::Card;
use crate::routes::validation::validate_user_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "primaryRecipientId")]
    pub primary_recipient_id: String,
    #[serde(rename = "additionalRecipientIds", default)]
    pub additional_recipient_ids: Vec<String>,
    pub message: String,
    #[serde(rename = "declaredPoints")]
    pub declared_points: i64,
}

/// Create a recognition card
///
/// The card is stored verbatim and has no balance effect; `declaredPoints`
/// is descriptive metadata shown with the card. Points only move when other
/// users like it.
pub async fn create_card(
    State(state): State<AppState>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<Json<Card>> {
    for id in std::iter::once(&payload.sender_id)
        .chain(std::iter::once(&payload.primary_recipient_id))
        .chain(payload.additional_recipient_ids.iter())
    {
        if !validate_user_id(id) {
            tracing::warn!("Invalid user ID format in card: {}", id);
            return Err(AppError::InvalidInput(ERR_INVALID_USER_ID.to_string()));
        }
    }

    if let Some(reason) = Card::recipient_error(
        &payload.sender_id,
        &payload.primary_recipient_id,
        &payload.additional_recipient_ids,
    ) {
        return Err(AppError::InvalidInput(reason.to_string()));
    }

    if !Card::validate_message(&payload.message) {
        return Err(AppError::InvalidInput(ERR_INVALID_MESSAGE.to_string()));
    }

    if !Card::validate_declared_points(payload.declared_points) {
        return Err(AppError::InvalidInput(
            ERR_INVALID_DECLARED_POINTS.to_string(),
        ));
    }

    let db = state.db.clone();
    let new_card = NewCard {
        sender_id: payload.sender_id,
        primary_recipient_id: payload.primary_recipient_id,
        additional_recipient_ids: payload.additional_recipient_ids,
        message: payload.message,
        declared_points: payload.declared_points,
    };
    let now = Utc::now().timestamp();

    let card =
        tokio::task::spawn_blocking(move || cards::create_card(&db, new_card, now)).await??;

    tracing::info!(
        "Card {} created by {} for {} recipient(s)",
        card.id,
        card.sender_id,
        1 + card.additional_recipient_ids.len()
    );

    Ok(Json(card))
}

/// Fetch a single card
pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<u64>,
) -> Result<Json<Card>> {
    let db = state.db.clone();

    let card = tokio::task::spawn_blocking(move || cards::get_card(&db, card_id)).await??;

    Ok(Json(card))
}
