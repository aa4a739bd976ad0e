use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Mission Control Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::game::get_settings,
        crate::routes::game::update_settings,
        crate::routes::game::update_round_info,
        crate::routes::game::update_next_round,
        crate::routes::game::update_current_round,
        crate::routes::game::set_timers,
        crate::routes::game::set_countdown,
        crate::routes::game::start_next_round,
        crate::routes::game::start_next_round_early,
        crate::routes::game::game_action,
        crate::routes::game::timer_status,
        crate::routes::game::countdown_status,
        crate::routes::game::game_state,
        crate::routes::game::round_history,
        crate::routes::game::admin_actions,
        crate::routes::participants::list_participants,
        crate::routes::participants::participants_status,
        crate::routes::participants::get_participant,
        crate::routes::participants::create_participant,
        crate::routes::participants::delete_participant,
        crate::routes::participants::eliminate,
        crate::routes::participants::eliminate_team,
        crate::routes::participants::reset_participants,
        crate::routes::participants::participant_stats,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::game::GameSettingsResponse,
            crate::dto::game::GameStateResponse,
            crate::dto::game::TimerStatusResponse,
            crate::dto::game::CountdownStatusResponse,
            crate::dto::game::RoundTimerDto,
            crate::dto::game::CountdownSettings,
            crate::dto::game::NextRoundDto,
            crate::dto::game::UpdateSettingsRequest,
            crate::dto::game::RoundInfoRequest,
            crate::dto::game::NextRoundRequest,
            crate::dto::game::CurrentRoundRequest,
            crate::dto::game::TimersRequest,
            crate::dto::game::CountdownRequest,
            crate::dto::game::GameActionRequest,
            crate::dto::admin::RoundHistoryItem,
            crate::dto::admin::AdminActionItem,
            crate::dto::participant::ParticipantDto,
            crate::dto::participant::CreateParticipantRequest,
            crate::dto::participant::EliminateRequest,
            crate::dto::participant::EliminateTeamRequest,
            crate::dto::participant::EliminateResponse,
            crate::dto::participant::EliminationResult,
            crate::dto::participant::EliminationOutcome,
            crate::dto::participant::CountResponse,
            crate::dto::participant::ParticipantStats,
            crate::dao::models::GameStatus,
            crate::dao::models::RoundStatus,
            crate::dao::models::AdminActionKind,
            crate::dao::models::ParticipantStatus,
            crate::dao::models::AttachmentEntity,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Round, timer and countdown control"),
        (name = "participants", description = "Participant roster and elimination"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_game_and_roster_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/game-settings"));
        assert!(paths.contains_key("/api/participants/{rollNumber}"));
        assert!(paths.contains_key("/sse/public"));
    }
}
