use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        game_store::GameStore,
        models::{AdminActionEntity, AdminActionKind, ParticipantEntity, ParticipantStatus},
    },
    dto::participant::{
        CountResponse, CreateParticipantRequest, DEFAULT_AVATAR, EliminateResponse,
        EliminationOutcome, EliminationResult, ParticipantDto, ParticipantStats,
    },
    error::ServiceError,
    services::sse_events::broadcast_participants_updated,
    state::SharedState,
};

/// Participants sorted by roll number, optionally filtered by status.
pub async fn list(
    state: &SharedState,
    status: Option<ParticipantStatus>,
) -> Result<Vec<ParticipantDto>, ServiceError> {
    let store = state.require_game_store().await?;
    let participants = store.list_participants(status).await?;
    Ok(participants.into_iter().map(Into::into).collect())
}

/// Fetch one participant by roll number.
pub async fn get(state: &SharedState, roll_number: String) -> Result<ParticipantDto, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .find_participant(roll_number.clone())
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("participant `{roll_number}` not found")))
}

/// Register a participant.
///
/// Fields are normalised before validation; a taken roll number or email is
/// rejected before anything is written.
pub async fn create(
    state: &SharedState,
    request: CreateParticipantRequest,
) -> Result<ParticipantDto, ServiceError> {
    let request = request.normalised();
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(format!("validation failed: {err}")))?;

    let store = state.require_game_store().await?;
    if store
        .find_participant(request.roll_number.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "a participant with rollNumber `{}` already exists",
            request.roll_number
        )));
    }
    if store
        .find_participant_by_email(request.email.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "a participant with email `{}` already exists",
            request.email
        )));
    }

    let now = SystemTime::now();
    let participant = ParticipantEntity {
        name: request.name,
        roll_number: request.roll_number,
        email: request.email,
        phone: request.phone,
        college: request.college,
        branch: request.branch,
        year: request.year,
        degree: request.degree,
        avatar: request.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        team: request.team,
        status: ParticipantStatus::Alive,
        eliminated_at: None,
        registered_at: now,
        last_updated: now,
    };
    store.insert_participant(participant.clone()).await?;
    info!(roll_number = %participant.roll_number, "participant registered");

    record(
        store.as_ref(),
        AdminActionKind::AddParticipant,
        format!(
            "Added participant {} ({})",
            participant.name, participant.roll_number
        ),
        now,
    )
    .await;
    notify(state, store.as_ref()).await;
    Ok(participant.into())
}

/// Remove a participant by roll number.
pub async fn delete(state: &SharedState, roll_number: String) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    if !store.delete_participant(roll_number.clone()).await? {
        return Err(ServiceError::NotFound(format!(
            "participant `{roll_number}` not found"
        )));
    }
    info!(%roll_number, "participant removed");

    record(
        store.as_ref(),
        AdminActionKind::RemoveParticipant,
        format!("Removed participant {roll_number}"),
        SystemTime::now(),
    )
    .await;
    notify(state, store.as_ref()).await;
    Ok(())
}

/// Eliminate each roll number in turn.
///
/// Unknown roll numbers and per-item storage failures are reported in the
/// result list; they never abort the batch.
pub async fn eliminate(
    state: &SharedState,
    roll_numbers: Vec<String>,
) -> Result<EliminateResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let now = SystemTime::now();

    let mut results = Vec::with_capacity(roll_numbers.len());
    let mut eliminated = Vec::new();
    for roll_number in roll_numbers {
        let roll_number = roll_number.trim().to_string();
        let (outcome, error) = match store.eliminate_participant(roll_number.clone(), now).await {
            Ok(true) => {
                eliminated.push(roll_number.clone());
                (EliminationOutcome::Eliminated, None)
            }
            Ok(false) => (EliminationOutcome::NotFound, None),
            Err(err) => {
                warn!(%roll_number, error = %err, "failed to eliminate participant");
                (EliminationOutcome::Failed, Some(err.to_string()))
            }
        };
        results.push(EliminationResult {
            roll_number,
            outcome,
            error,
        });
    }

    let count = u64::try_from(eliminated.len()).unwrap_or(u64::MAX);
    if count > 0 {
        info!(count, "participants eliminated");
        record(
            store.as_ref(),
            AdminActionKind::EliminatePlayer,
            format!("Eliminated {}", eliminated.join(", ")),
            now,
        )
        .await;
        notify(state, store.as_ref()).await;
    }
    Ok(EliminateResponse { count, results })
}

/// Eliminate every alive member of `team`.
pub async fn eliminate_team(state: &SharedState, team: String) -> Result<CountResponse, ServiceError> {
    let team = team.trim().to_string();
    if team.is_empty() {
        return Err(ServiceError::InvalidInput("team must not be empty".into()));
    }
    let store = state.require_game_store().await?;
    let now = SystemTime::now();
    let count = store.eliminate_team(team.clone(), now).await?;
    info!(%team, count, "team eliminated");

    if count > 0 {
        record(
            store.as_ref(),
            AdminActionKind::EliminateTeam,
            format!("Eliminated team {team} ({count} participants)"),
            now,
        )
        .await;
        notify(state, store.as_ref()).await;
    }
    Ok(CountResponse { count })
}

/// Return every eliminated participant to play.
pub async fn reset(state: &SharedState) -> Result<CountResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let now = SystemTime::now();
    let count = store.reset_participants(now).await?;
    info!(count, "participants reset");

    if count > 0 {
        record(
            store.as_ref(),
            AdminActionKind::ResetParticipants,
            format!("Reset {count} eliminated participants"),
            now,
        )
        .await;
        notify(state, store.as_ref()).await;
    }
    Ok(CountResponse { count })
}

/// Head counts per status.
pub async fn stats(state: &SharedState) -> Result<ParticipantStats, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store.participant_stats().await?.into())
}

/// Append a roster audit record. The roster change already happened, so a
/// failure here is logged rather than returned.
async fn record(store: &dyn GameStore, action: AdminActionKind, details: String, at: SystemTime) {
    let entry = AdminActionEntity {
        id: Uuid::new_v4(),
        action,
        details,
        timestamp: at,
        game_state: None,
    };
    if let Err(err) = store.append_admin_action(entry).await {
        warn!(?action, error = %err, "failed to record roster action");
    }
}

async fn notify(state: &SharedState, store: &dyn GameStore) {
    match store.participant_stats().await {
        Ok(stats) => broadcast_participants_updated(state, stats.into()),
        Err(err) => warn!(error = %err, "failed to compute participant stats for broadcast"),
    }
}
