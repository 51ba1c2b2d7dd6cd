use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::constants::{ERR_INVALID_USER_ID, MAX_RANKING_LIMIT};
use crate::error::{AppError, Result};
use crate::ledger::stats::{self, DashboardStats, Rankings, Window};
use crate::routes::validation::{resolve_window, validate_user_id};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(rename = "userId")]
    pub user_id: String,
}

/// Dashboard statistics for one user
///
/// Current balances from the ledger, this month's and all-time activity
/// derived from the event log, plus the current month's leaderboards.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardStats>> {
    if !validate_user_id(&params.user_id) {
        return Err(AppError::InvalidInput(ERR_INVALID_USER_ID.to_string()));
    }

    let db = state.db.clone();
    let user_id = params.user_id.clone();
    let offset = state.config.reset_utc_offset;
    let limit = state.config.ranking_limit;
    let now = Utc::now().timestamp();

    let dashboard = tokio::task::spawn_blocking(move || {
        stats::dashboard(&db, &user_id, now, offset, limit)
    })
    .await??;

    Ok(Json(dashboard))
}

#[derive(Debug, Deserialize)]
pub struct RankingsParams {
    /// Window start, unix seconds (inclusive)
    pub from: Option<i64>,
    /// Window end, unix seconds (exclusive)
    pub to: Option<i64>,
    pub limit: Option<usize>,
}

/// Leaderboards for a time window, defaulting to the current calendar month
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(params): Query<RankingsParams>,
) -> Result<Json<Rankings>> {
    let now = Utc::now().timestamp();
    let month = Window::month_of(now, state.config.reset_utc_offset);
    let window = resolve_window(params.from, params.to, month)?;

    let limit = params
        .limit
        .unwrap_or(state.config.ranking_limit)
        .min(MAX_RANKING_LIMIT);

    let db = state.db.clone();
    let rankings =
        tokio::task::spawn_blocking(move || stats::rankings(&db, window, limit)).await??;

    Ok(Json(rankings))
}
