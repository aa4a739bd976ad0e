use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use validator::Validate;

use crate::{
    dto::{
        admin::{AdminActionItem, RoundHistoryItem},
        game::{
            CountdownRequest, CountdownStatusResponse, CurrentRoundRequest, GameActionRequest,
            GameSettingsResponse, GameStateResponse, NextRoundRequest, RoundInfoRequest,
            TimerStatusResponse, TimersRequest, UpdateSettingsRequest,
        },
    },
    error::AppError,
    services::game_service,
    state::{SharedState, state_machine::PromotionVariant},
};

/// Round, timer and countdown endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/api/game-settings", get(get_settings).put(update_settings))
        .route("/api/round-info", put(update_round_info))
        .route("/api/next-round", put(update_next_round))
        .route("/api/update-current-round", put(update_current_round))
        .route("/api/timers", put(set_timers))
        .route("/api/countdown", put(set_countdown))
        .route("/api/start-next-round", post(start_next_round))
        .route("/api/start-next-round-early", post(start_next_round_early))
        .route("/api/game-action", post(game_action))
        .route("/api/timer-status", get(timer_status))
        .route("/api/countdown-status", get(countdown_status))
        .route("/api/game-state", get(game_state))
        .route("/api/round-history", get(round_history))
        .route("/api/admin-actions", get(admin_actions))
}

/// Return the stored game state, creating the defaults on first use.
#[utoipa::path(
    get,
    path = "/api/game-settings",
    tag = "game",
    responses(
        (status = 200, description = "Stored game state", body = GameSettingsResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_settings(
    State(state): State<SharedState>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(game_service::get_settings(&state).await?))
}

/// Replace any subset of the game settings.
#[utoipa::path(
    put,
    path = "/api/game-settings",
    tag = "game",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = GameSettingsResponse),
        (status = 400, description = "Invalid settings")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::update_settings(&state, payload).await?))
}

/// Replace the live round's name, details and attachments.
#[utoipa::path(
    put,
    path = "/api/round-info",
    tag = "game",
    request_body = RoundInfoRequest,
    responses((status = 200, description = "Round updated", body = GameSettingsResponse))
)]
pub async fn update_round_info(
    State(state): State<SharedState>,
    Json(payload): Json<RoundInfoRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::update_round_info(&state, payload).await?))
}

/// Replace the queued round.
#[utoipa::path(
    put,
    path = "/api/next-round",
    tag = "game",
    request_body = NextRoundRequest,
    responses((status = 200, description = "Next round updated", body = GameSettingsResponse))
)]
pub async fn update_next_round(
    State(state): State<SharedState>,
    Json(payload): Json<NextRoundRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::update_next_round(&state, payload).await?))
}

/// Edit the live round; a changed timer restarts a running round.
#[utoipa::path(
    put,
    path = "/api/update-current-round",
    tag = "game",
    request_body = CurrentRoundRequest,
    responses((status = 200, description = "Current round updated", body = GameSettingsResponse))
)]
pub async fn update_current_round(
    State(state): State<SharedState>,
    Json(payload): Json<CurrentRoundRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(
        game_service::update_current_round(&state, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/api/timers",
    tag = "game",
    request_body = TimersRequest,
    responses((status = 200, description = "Timers set", body = GameSettingsResponse))
)]
/// Set the current and next timer budgets.
pub async fn set_timers(
    State(state): State<SharedState>,
    Json(payload): Json<TimersRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(game_service::set_timers(&state, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/countdown",
    tag = "game",
    request_body = CountdownRequest,
    responses(
        (status = 200, description = "Countdown set", body = GameSettingsResponse),
        (status = 400, description = "Zero budget on activation"),
        (status = 409, description = "A round is running")
    )
)]
/// Overwrite the pre-game countdown.
pub async fn set_countdown(
    State(state): State<SharedState>,
    Json(payload): Json<CountdownRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(game_service::set_countdown(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/api/start-next-round",
    tag = "game",
    responses((status = 200, description = "Next round started", body = GameSettingsResponse))
)]
/// Archive the finished round and promote the queued one.
pub async fn start_next_round(
    State(state): State<SharedState>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(
        game_service::start_next_round(&state, PromotionVariant::AtNaturalEnd).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/start-next-round-early",
    tag = "game",
    responses((status = 200, description = "Next round started early", body = GameSettingsResponse))
)]
/// Cut the live round short and promote the queued one.
pub async fn start_next_round_early(
    State(state): State<SharedState>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    Ok(Json(
        game_service::start_next_round(&state, PromotionVariant::Early).await?,
    ))
}

/// Apply one operator keyword such as `start_game` or `end_game`.
#[utoipa::path(
    post,
    path = "/api/game-action",
    tag = "game",
    request_body = GameActionRequest,
    responses(
        (status = 200, description = "Action applied", body = GameSettingsResponse),
        (status = 400, description = "Unknown action"),
        (status = 409, description = "Action not allowed in the current status")
    )
)]
pub async fn game_action(
    State(state): State<SharedState>,
    Json(payload): Json<GameActionRequest>,
) -> Result<Json<GameSettingsResponse>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::game_action(&state, payload).await?))
}

/// Remaining round time; advances an expired round first.
#[utoipa::path(
    get,
    path = "/api/timer-status",
    tag = "game",
    responses((status = 200, description = "Derived round timer", body = TimerStatusResponse))
)]
pub async fn timer_status(
    State(state): State<SharedState>,
) -> Result<Json<TimerStatusResponse>, AppError> {
    Ok(Json(game_service::timer_status(&state).await?))
}

/// Remaining pre-game countdown.
#[utoipa::path(
    get,
    path = "/api/countdown-status",
    tag = "game",
    responses((status = 200, description = "Derived countdown", body = CountdownStatusResponse))
)]
pub async fn countdown_status(
    State(state): State<SharedState>,
) -> Result<Json<CountdownStatusResponse>, AppError> {
    Ok(Json(game_service::countdown_status(&state).await?))
}

/// Stored settings plus every derived view.
#[utoipa::path(
    get,
    path = "/api/game-state",
    tag = "game",
    responses((status = 200, description = "Derived game state", body = GameStateResponse))
)]
pub async fn game_state(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(game_service::game_state(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/round-history",
    tag = "game",
    responses((status = 200, description = "Archived rounds, newest first", body = [RoundHistoryItem]))
)]
/// Archived rounds, newest first.
pub async fn round_history(
    State(state): State<SharedState>,
) -> Result<Json<Vec<RoundHistoryItem>>, AppError> {
    Ok(Json(game_service::round_history(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin-actions",
    tag = "game",
    responses((status = 200, description = "Audit log, newest first", body = [AdminActionItem]))
)]
/// Audit log, newest first.
pub async fn admin_actions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminActionItem>>, AppError> {
    Ok(Json(game_service::admin_actions(&state).await?))
}
