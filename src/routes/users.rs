use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::constants::ERR_INVALID_USER_ID;
use crate::error::{AppError, Result};
use crate::ledger::balances;
use crate::routes::validation::validate_user_id;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterUserResponse {
    pub success: bool,
    /// The freshly created weekly balance (the standard allowance)
    pub balance: i64,
}

/// Register a user with the ledger
///
/// The user id comes from the external identity subsystem and is trusted as
/// authenticated; this endpoint only creates the balance record backing it,
/// starting at the full weekly allowance.
///
/// Returns 409 Conflict if the user is already registered.
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<RegisterUserResponse>> {
    if !validate_user_id(&payload.user_id) {
        tracing::warn!("Invalid user ID format: {}", payload.user_id);
        return Err(AppError::InvalidInput(ERR_INVALID_USER_ID.to_string()));
    }

    let db = state.db.clone();
    let user_id = payload.user_id.clone();

    let record =
        tokio::task::spawn_blocking(move || balances::create_user(&db, &user_id)).await??;

    tracing::info!("Registered user {}", payload.user_id);

    Ok(Json(RegisterUserResponse {
        success: true,
        balance: record.weekly_balance,
    }))
}
