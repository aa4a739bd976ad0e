use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::participant::{
        CountResponse, CreateParticipantRequest, EliminateRequest, EliminateResponse,
        EliminateTeamRequest, ParticipantDto, ParticipantQuery, ParticipantStats,
    },
    error::AppError,
    services::participant_service,
    state::SharedState,
};

/// Roster and elimination endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/participants",
            get(list_participants).post(create_participant),
        )
        .route("/api/participants-status", get(participants_status))
        .route("/api/participants/stats", get(participant_stats))
        .route("/api/participants/eliminate", post(eliminate))
        .route("/api/participants/eliminate-team", post(eliminate_team))
        .route(
            "/api/participants/{rollNumber}",
            get(get_participant).delete(delete_participant),
        )
        .route("/api/reset-participants", post(reset_participants))
}

/// List participants sorted by roll number.
#[utoipa::path(
    get,
    path = "/api/participants",
    tag = "participants",
    params(ParticipantQuery),
    responses((status = 200, description = "Participants", body = [ParticipantDto]))
)]
pub async fn list_participants(
    State(state): State<SharedState>,
    Query(query): Query<ParticipantQuery>,
) -> Result<Json<Vec<ParticipantDto>>, AppError> {
    Ok(Json(participant_service::list(&state, query.status).await?))
}

/// Full roster for polling displays.
#[utoipa::path(
    get,
    path = "/api/participants-status",
    tag = "participants",
    responses((status = 200, description = "Every participant with its status", body = [ParticipantDto]))
)]
pub async fn participants_status(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ParticipantDto>>, AppError> {
    Ok(Json(participant_service::list(&state, None).await?))
}

#[utoipa::path(
    get,
    path = "/api/participants/{rollNumber}",
    tag = "participants",
    params(("rollNumber" = String, Path, description = "Roll number of the participant")),
    responses(
        (status = 200, description = "Participant", body = ParticipantDto),
        (status = 404, description = "Unknown roll number")
    )
)]
/// Retrieve one participant.
pub async fn get_participant(
    State(state): State<SharedState>,
    Path(roll_number): Path<String>,
) -> Result<Json<ParticipantDto>, AppError> {
    Ok(Json(participant_service::get(&state, roll_number).await?))
}

/// Register a participant.
#[utoipa::path(
    post,
    path = "/api/participants",
    tag = "participants",
    request_body = CreateParticipantRequest,
    responses(
        (status = 201, description = "Participant registered", body = ParticipantDto),
        (status = 400, description = "Missing or malformed fields"),
        (status = 409, description = "Roll number or email already registered")
    )
)]
pub async fn create_participant(
    State(state): State<SharedState>,
    Json(payload): Json<CreateParticipantRequest>,
) -> Result<(StatusCode, Json<ParticipantDto>), AppError> {
    let created = participant_service::create(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    delete,
    path = "/api/participants/{rollNumber}",
    tag = "participants",
    params(("rollNumber" = String, Path, description = "Roll number of the participant")),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 404, description = "Unknown roll number")
    )
)]
/// Remove a participant.
pub async fn delete_participant(
    State(state): State<SharedState>,
    Path(roll_number): Path<String>,
) -> Result<StatusCode, AppError> {
    participant_service::delete(&state, roll_number).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Eliminate a list of roll numbers, reporting each one.
#[utoipa::path(
    post,
    path = "/api/participants/eliminate",
    tag = "participants",
    request_body = EliminateRequest,
    responses((status = 200, description = "Per-item elimination report", body = EliminateResponse))
)]
pub async fn eliminate(
    State(state): State<SharedState>,
    Json(payload): Json<EliminateRequest>,
) -> Result<Json<EliminateResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        participant_service::eliminate(&state, payload.roll_numbers).await?,
    ))
}

/// Eliminate the alive members of a team.
#[utoipa::path(
    post,
    path = "/api/participants/eliminate-team",
    tag = "participants",
    request_body = EliminateTeamRequest,
    responses((status = 200, description = "Number of participants eliminated", body = CountResponse))
)]
pub async fn eliminate_team(
    State(state): State<SharedState>,
    Json(payload): Json<EliminateTeamRequest>,
) -> Result<Json<CountResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        participant_service::eliminate_team(&state, payload.team).await?,
    ))
}

/// Bring every eliminated participant back.
#[utoipa::path(
    post,
    path = "/api/reset-participants",
    tag = "participants",
    responses((status = 200, description = "Number of participants reset", body = CountResponse))
)]
pub async fn reset_participants(
    State(state): State<SharedState>,
) -> Result<Json<CountResponse>, AppError> {
    Ok(Json(participant_service::reset(&state).await?))
}

/// Head counts per status.
#[utoipa::path(
    get,
    path = "/api/participants/stats",
    tag = "participants",
    responses((status = 200, description = "Participant statistics", body = ParticipantStats))
)]
pub async fn participant_stats(
    State(state): State<SharedState>,
) -> Result<Json<ParticipantStats>, AppError> {
    Ok(Json(participant_service::stats(&state).await?))
}
