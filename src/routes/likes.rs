use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;

use crate::constants::ERR_INVALID_USER_ID;
use crate::error::{AppError, Result};
use crate::ledger::likes::{self, LikeReceipt};
use crate::ledger::reset::week_start;
use crate::routes::validation::validate_user_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLikeRequest {
    #[serde(rename = "cardId")]
    pub card_id: u64,
    #[serde(rename = "actorId")]
    pub actor_id: String,
}

/// Like a card
///
/// The only way points move between users: debits 2 from the actor, credits
/// 1 to the card's sender and 1 lifetime point to one randomly drawn
/// recipient, as a single atomic unit. On any failure (404 unknown card,
/// 422 self-interaction, 409 like limit or insufficient balance) nothing is
/// committed, so a client that received an error can safely not retry.
pub async fn create_like(
    State(state): State<AppState>,
    Json(payload): Json<CreateLikeRequest>,
) -> Result<Json<LikeReceipt>> {
    if !validate_user_id(&payload.actor_id) {
        tracing::warn!("Invalid user ID format: {}", payload.actor_id);
        return Err(AppError::InvalidInput(ERR_INVALID_USER_ID.to_string()));
    }

    let db = state.db.clone();
    let card_id = payload.card_id;
    let actor_id = payload.actor_id.clone();
    let now = Utc::now().timestamp();
    let boundary = week_start(now, state.config.reset_utc_offset);

    let receipt = tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();
        likes::process_like(&db, card_id, &actor_id, now, boundary, &mut rng)
    })
    .await??;

    tracing::info!(
        "Like {} on card {} by {}",
        receipt.like.id,
        card_id,
        payload.actor_id
    );

    Ok(Json(receipt))
}
