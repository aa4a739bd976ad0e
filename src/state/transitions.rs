use std::time::SystemTime;

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::GameDefaults,
    dao::models::{AdminActionEntity, GameCommit, GameStateEntity},
    error::ServiceError,
    services::sse_events::broadcast_game_state,
    state::{
        SharedState,
        game::GameState,
        state_machine::{Transition, TransitionError},
    },
};

/// Game state after a gated operation, with the instant it was evaluated at.
#[derive(Debug, Clone)]
pub struct Settled {
    /// State as committed (or as read, when nothing changed).
    pub game: GameState,
    /// Instant every derived value was computed at.
    pub now: SystemTime,
}

/// Time-driven changes settled before a gated mutation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Countdown expiry and round expiry.
    All,
    /// Countdown expiry only, for mutations that end the running round themselves.
    CountdownOnly,
}

/// Load the stored game state, synthesising and persisting the defaults on first use.
///
/// No time-driven change is applied; callers hold the transition gate.
async fn load_or_init(
    state: &SharedState,
    now: SystemTime,
) -> Result<(GameState, Option<u64>), ServiceError> {
    let store = state.require_game_store().await?;
    match store.load_game_state().await? {
        Some(entity) => {
            let version = entity.version;
            Ok((entity.into(), Some(version)))
        }
        None => {
            let mut game = GameState::initial(state.config().defaults(), now);
            game.version = 1;
            store
                .commit(GameCommit {
                    state: game.clone().into(),
                    expected_version: None,
                    history: Vec::new(),
                    actions: Vec::new(),
                })
                .await?;
            info!("no game state stored; initialised defaults");
            Ok((game, Some(1)))
        }
    }
}

/// Raw stored state, created with defaults when absent.
pub async fn read_game(state: &SharedState) -> Result<Settled, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    let now = SystemTime::now();
    let (game, _) = load_or_init(state, now).await?;
    Ok(Settled { game, now })
}

/// Run one logical step on the game state record, settling every due change first.
pub async fn run_game_transition<F>(state: &SharedState, mutate: F) -> Result<Settled, ServiceError>
where
    F: FnOnce(&mut GameState, SystemTime, &GameDefaults) -> Result<Vec<Transition>, TransitionError>,
{
    run_settled_transition(state, Settle::All, mutate).await
}

/// Run one logical step on the game state record.
///
/// Under the transition gate: load (or initialise), settle the time-driven
/// changes selected by `settle`, apply `mutate`, then commit the new state together with one history
/// record per archived round and one audit record per transition. The commit is
/// version checked, so a concurrent writer outside this process surfaces as a
/// conflict instead of a double advancement. Subscribers get the new state once
/// it is stored.
pub async fn run_settled_transition<F>(
    state: &SharedState,
    settle: Settle,
    mutate: F,
) -> Result<Settled, ServiceError>
where
    F: FnOnce(&mut GameState, SystemTime, &GameDefaults) -> Result<Vec<Transition>, TransitionError>,
{
    let _gate = state.transition_gate().lock().await;
    let now = SystemTime::now();
    let (mut game, expected_version) = load_or_init(state, now).await?;

    let mut transitions = match settle {
        Settle::All => game.observe(now),
        Settle::CountdownOnly => game.observe_countdown(now).into_iter().collect(),
    };
    transitions.extend(mutate(&mut game, now, state.config().defaults())?);

    if transitions.is_empty() {
        return Ok(Settled { game, now });
    }

    game.version = expected_version.map_or(1, |version| version + 1);
    let snapshot: GameStateEntity = game.clone().into();
    let mut history = Vec::new();
    let mut actions = Vec::with_capacity(transitions.len());
    for transition in transitions {
        debug!(action = ?transition.kind, details = %transition.details, "game transition");
        history.extend(transition.archived);
        actions.push(AdminActionEntity {
            id: Uuid::new_v4(),
            action: transition.kind,
            details: transition.details,
            timestamp: now,
            game_state: Some(snapshot.clone()),
        });
    }

    let store = state.require_game_store().await?;
    store
        .commit(GameCommit {
            state: snapshot,
            expected_version,
            history,
            actions,
        })
        .await?;
    info!(
        version = game.version,
        round = game.current_round,
        status = game.status.as_str(),
        "game state committed"
    );

    broadcast_game_state(state, &game, now);
    Ok(Settled { game, now })
}

/// Derived read: settles due time-driven changes and returns the resulting state.
pub async fn observe_game(state: &SharedState) -> Result<Settled, ServiceError> {
    run_game_transition(state, |_, _, _| Ok(Vec::new())).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::{GameStore, memory::MemoryGameStore},
            models::{AdminActionKind, GameStatus},
        },
        state::{AppState, state_machine::GameAction},
    };

    async fn setup() -> (SharedState, MemoryGameStore) {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::new();
        state.set_game_store(Arc::new(store.clone())).await;
        (state, store)
    }

    #[tokio::test]
    async fn first_read_initialises_without_audit() {
        let (state, store) = setup().await;
        let settled = read_game(&state).await.unwrap();
        assert_eq!(settled.game.version, 1);
        assert_eq!(settled.game.round_name, "Mission Alpha");
        assert!(store.list_admin_actions(50).await.unwrap().is_empty());
        assert!(store.load_game_state().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn each_mutation_appends_one_action_with_snapshot() {
        let (state, store) = setup().await;
        let settled = run_game_transition(&state, |game, now, defaults| {
            Ok(vec![game.apply_action(GameAction::StartGame, None, now, defaults)?])
        })
        .await
        .unwrap();
        assert_eq!(settled.game.status, GameStatus::Active);
        assert_eq!(settled.game.version, 2);

        let actions = store.list_admin_actions(50).await.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, AdminActionKind::StartGame);
        let snapshot = actions[0].game_state.as_ref().unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.game_status, GameStatus::Active);
    }

    #[tokio::test]
    async fn rejected_mutation_writes_nothing() {
        let (state, store) = setup().await;
        let err = run_game_transition(&state, |game, now, defaults| {
            Ok(vec![game.apply_action(GameAction::PauseGame, None, now, defaults)?])
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(store.load_game_state().await.unwrap().unwrap().version, 1);
        assert!(store.list_admin_actions(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn degraded_state_rejects_transitions() {
        let state = AppState::new(AppConfig::default());
        let err = observe_game(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn stale_writer_gets_a_conflict() {
        let (state, store) = setup().await;
        read_game(&state).await.unwrap();

        let mut stale = store.load_game_state().await.unwrap().unwrap();
        stale.version = 2;
        store
            .commit(GameCommit {
                state: stale.clone(),
                expected_version: Some(1),
                history: Vec::new(),
                actions: Vec::new(),
            })
            .await
            .unwrap();

        let err = store
            .commit(GameCommit {
                state: stale,
                expected_version: Some(1),
                history: Vec::new(),
                actions: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            ServiceError::from(err),
            ServiceError::Conflict(_)
        ));
    }
}
