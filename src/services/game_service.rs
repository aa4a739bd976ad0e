use tracing::info;

use crate::{
    dto::{
        admin::{AdminActionItem, RoundHistoryItem},
        game::{
            CountdownRequest, CountdownStatusResponse, CurrentRoundRequest, GameActionRequest,
            GameSettingsResponse, GameStateResponse, NextRoundRequest, RoundInfoRequest,
            TimerStatusResponse, TimersRequest, UpdateSettingsRequest,
        },
    },
    error::ServiceError,
    state::{
        SharedState,
        state_machine::{GameAction, PromotionVariant, UnknownAction},
        transitions::{
            Settle, Settled, observe_game, read_game, run_game_transition, run_settled_transition,
        },
    },
};

fn settings(settled: Settled) -> GameSettingsResponse {
    (&settled.game).into()
}

/// Stored game state, initialised with the defaults on first use.
pub async fn get_settings(state: &SharedState) -> Result<GameSettingsResponse, ServiceError> {
    read_game(state).await.map(settings)
}

/// Apply a partial settings replacement.
pub async fn update_settings(
    state: &SharedState,
    request: UpdateSettingsRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    let patch = request.into_patch().map_err(ServiceError::InvalidInput)?;
    run_game_transition(state, |game, now, _| Ok(vec![game.replace_settings(patch, now)?]))
        .await
        .map(settings)
}

/// Replace the live round text.
pub async fn update_round_info(
    state: &SharedState,
    request: RoundInfoRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    run_game_transition(state, |game, now, _| {
        Ok(vec![game.set_round_info(
            request.round_name,
            request.round_details,
            request.attachments,
            now,
        )])
    })
    .await
    .map(settings)
}

/// Replace the queued round.
pub async fn update_next_round(
    state: &SharedState,
    request: NextRoundRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    run_game_transition(state, |game, now, _| {
        Ok(vec![game.set_next_round(
            request.name,
            request.details,
            request.attachments,
            request.timer,
            now,
        )])
    })
    .await
    .map(settings)
}

/// Edit the live round.
pub async fn update_current_round(
    state: &SharedState,
    request: CurrentRoundRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    run_game_transition(state, |game, now, _| {
        Ok(vec![game.update_current_round(request.into(), now)])
    })
    .await
    .map(settings)
}

/// Set both timer budgets.
pub async fn set_timers(
    state: &SharedState,
    request: TimersRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    run_game_transition(state, |game, now, _| {
        Ok(vec![game.set_timers(
            request.current_timer,
            request.next_timer,
            now,
        )])
    })
    .await
    .map(settings)
}

/// Overwrite the pre-game countdown.
pub async fn set_countdown(
    state: &SharedState,
    request: CountdownRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    run_game_transition(state, |game, now, _| {
        Ok(vec![game.set_countdown(request.into(), now)?])
    })
    .await
    .map(settings)
}

/// Archive the current round and promote the queued one.
///
/// An expired round is not auto-advanced first: the promotion is what ends it.
pub async fn start_next_round(
    state: &SharedState,
    variant: PromotionVariant,
) -> Result<GameSettingsResponse, ServiceError> {
    let settled = run_settled_transition(state, Settle::CountdownOnly, |game, now, defaults| {
        Ok(vec![game.promote_next_round(variant, now, defaults)?])
    })
    .await?;
    info!(
        round = settled.game.current_round,
        name = %settled.game.round_name,
        early = variant == PromotionVariant::Early,
        "promoted next round"
    );
    Ok(settings(settled))
}

/// Apply one operator keyword.
pub async fn game_action(
    state: &SharedState,
    request: GameActionRequest,
) -> Result<GameSettingsResponse, ServiceError> {
    let action: GameAction = request
        .action
        .parse()
        .map_err(|err: UnknownAction| ServiceError::InvalidInput(err.to_string()))?;
    let details = request.details;
    let settled = run_game_transition(state, |game, now, defaults| {
        Ok(vec![game.apply_action(action, details, now, defaults)?])
    })
    .await?;
    info!(action = action.as_str(), status = settled.game.status.as_str(), "game action applied");
    Ok(settings(settled))
}

/// Newest-first round archive.
pub async fn round_history(state: &SharedState) -> Result<Vec<RoundHistoryItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let records = store
        .list_round_history(state.config().history_limit())
        .await?;
    Ok(records.into_iter().map(Into::into).collect())
}

/// Newest-first audit log.
pub async fn admin_actions(state: &SharedState) -> Result<Vec<AdminActionItem>, ServiceError> {
    let store = state.require_game_store().await?;
    let records = store
        .list_admin_actions(state.config().actions_limit())
        .await?;
    Ok(records.into_iter().map(Into::into).collect())
}

/// Derived round timer; may advance an expired round.
pub async fn timer_status(state: &SharedState) -> Result<TimerStatusResponse, ServiceError> {
    let settled = observe_game(state).await?;
    Ok(TimerStatusResponse::at(&settled.game, settled.now))
}

/// Derived countdown; may mark a finished countdown.
pub async fn countdown_status(
    state: &SharedState,
) -> Result<CountdownStatusResponse, ServiceError> {
    let settled = observe_game(state).await?;
    Ok(CountdownStatusResponse::at(&settled.game, settled.now))
}

/// Full derived game state.
pub async fn game_state(state: &SharedState) -> Result<GameStateResponse, ServiceError> {
    let settled = observe_game(state).await?;
    Ok(GameStateResponse::at(&settled.game, settled.now))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::{AdminActionKind, GameCommit, GameStatus, RoundStatus},
        },
        state::AppState,
    };

    async fn setup() -> (SharedState, MemoryGameStore) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::new();
        state.set_game_store(Arc::new(store.clone())).await;
        (state, store)
    }

    fn action(name: &str) -> GameActionRequest {
        GameActionRequest {
            action: name.into(),
            details: None,
        }
    }

    /// Rewrite the stored round anchor as if the round started `secs` ago.
    async fn age_round(store: &MemoryGameStore, secs: u64) {
        let mut stored = store.load_game_state().await.unwrap().unwrap();
        let expected = stored.version;
        stored.version += 1;
        stored.round_start_time = Some(SystemTime::now() - Duration::from_secs(secs));
        store
            .commit(GameCommit {
                state: stored,
                expected_version: Some(expected),
                history: Vec::new(),
                actions: Vec::new(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn expired_round_advances_on_timer_read() {
        let (state, store) = setup().await;
        game_action(&state, action("start_game")).await.unwrap();
        age_round(&store, 301).await;

        let status = timer_status(&state).await.unwrap();
        assert_eq!(status.current_round, 2);
        assert_eq!(status.remaining_time, 180);
        assert!(status.is_round_active);

        let history = round_history(&state).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, RoundStatus::Completed);

        let actions = admin_actions(&state).await.unwrap();
        assert_eq!(actions[0].action, AdminActionKind::AutoAdvanceRound);
        assert_eq!(actions[1].action, AdminActionKind::StartGame);

        let again = game_state(&state).await.unwrap();
        assert_eq!(again.settings.current_round, 2);
        assert_eq!(round_history(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_reads_advance_only_once() {
        let (state, store) = setup().await;
        game_action(&state, action("start_game")).await.unwrap();
        age_round(&store, 400).await;

        let reads = (0..8).map(|_| {
            let state = state.clone();
            tokio::spawn(async move { timer_status(&state).await.unwrap().current_round })
        });
        for read in reads {
            assert_eq!(read.await.unwrap(), 2);
        }
        assert_eq!(round_history(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_mutation_logs_exactly_one_action() {
        let (state, _store) = setup().await;
        get_settings(&state).await.unwrap();
        assert!(admin_actions(&state).await.unwrap().is_empty());

        set_timers(
            &state,
            TimersRequest {
                current_timer: 120,
                next_timer: 60,
            },
        )
        .await
        .unwrap();
        update_round_info(
            &state,
            RoundInfoRequest {
                round_name: "Reactor".into(),
                round_details: "Fix it".into(),
                attachments: None,
            },
        )
        .await
        .unwrap();
        game_action(&state, action("start_game")).await.unwrap();

        let kinds: Vec<_> = admin_actions(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.action)
            .collect();
        assert_eq!(
            kinds,
            vec![
                AdminActionKind::StartGame,
                AdminActionKind::UpdateRoundInfo,
                AdminActionKind::SetTimers,
            ]
        );
    }

    #[tokio::test]
    async fn promotion_archives_and_increments() {
        let (state, _store) = setup().await;
        update_next_round(
            &state,
            NextRoundRequest {
                name: "Reactor".into(),
                details: "Fix it".into(),
                attachments: None,
                timer: Some(240),
            },
        )
        .await
        .unwrap();

        let promoted = start_next_round(&state, PromotionVariant::Early).await.unwrap();
        assert_eq!(promoted.current_round, 2);
        assert_eq!(promoted.round_name, "Reactor");
        assert_eq!(promoted.current_timer, 240);
        assert_eq!(promoted.game_status, GameStatus::Active);
        assert_eq!(promoted.next_round.name, "Mission Beta");

        let history = round_history(&state).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].round_number, 1);
        assert_eq!(history[0].round_name, "Mission Alpha");
    }

    #[tokio::test]
    async fn promotion_after_expiry_advances_once() {
        let (state, store) = setup().await;
        game_action(&state, action("start_game")).await.unwrap();
        age_round(&store, 301).await;

        let promoted = start_next_round(&state, PromotionVariant::AtNaturalEnd)
            .await
            .unwrap();
        assert_eq!(promoted.current_round, 2);

        let history = round_history(&state).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].round_number, 1);
        let actions = admin_actions(&state).await.unwrap();
        assert_eq!(actions[0].action, AdminActionKind::StartNextRound);
        assert_eq!(actions[1].action, AdminActionKind::StartGame);
    }

    #[tokio::test]
    async fn last_numbered_round_cannot_be_promoted() {
        let (state, store) = setup().await;
        update_settings(
            &state,
            UpdateSettingsRequest {
                current_round: Some(u32::MAX),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            start_next_round(&state, PromotionVariant::Early).await,
            Err(ServiceError::InvalidInput(_))
        ));
        let stored = store.load_game_state().await.unwrap().unwrap();
        assert_eq!(stored.current_round, u32::MAX);
        assert!(round_history(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn end_game_restores_defaults() {
        let (state, _store) = setup().await;
        game_action(&state, action("start_game")).await.unwrap();
        start_next_round(&state, PromotionVariant::AtNaturalEnd)
            .await
            .unwrap();

        let ended = game_action(&state, action("end_game")).await.unwrap();
        assert_eq!(ended.round_name, "Mission Alpha");
        assert_eq!(ended.current_round, 1);
        assert_eq!(ended.game_status, GameStatus::Waiting);
        assert!(ended.round_start_time.is_none());
    }

    #[tokio::test]
    async fn unknown_and_invalid_actions_are_rejected() {
        let (state, _store) = setup().await;
        assert!(matches!(
            game_action(&state, action("launch")).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            game_action(&state, action("resume_game")).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn countdown_status_reflects_armed_countdown() {
        let (state, _store) = setup().await;
        set_countdown(
            &state,
            CountdownRequest {
                hours: 1,
                is_active: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let status = countdown_status(&state).await.unwrap();
        assert!(status.is_active);
        assert!(!status.finished);
        assert!(status.remaining > 3590 && status.remaining <= 3600);
        assert_eq!(
            game_state(&state).await.unwrap().settings.game_status,
            GameStatus::Countdown
        );
    }
}
