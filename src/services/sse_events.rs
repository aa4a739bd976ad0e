use std::time::SystemTime;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    dto::{game::GameStateResponse, participant::ParticipantStats, sse::ServerEvent},
    state::{SharedState, game::GameState},
};

const EVENT_GAME_STATE: &str = "game.state";
const EVENT_PARTICIPANTS_UPDATED: &str = "participants.updated";

/// Broadcast the derived game state after it has been stored.
pub fn broadcast_game_state(state: &SharedState, game: &GameState, now: SystemTime) {
    let payload = GameStateResponse::at(game, now);
    send_public_event(state, EVENT_GAME_STATE, &payload);
}

/// Broadcast fresh roster statistics after a participant mutation.
pub fn broadcast_participants_updated(state: &SharedState, stats: ParticipantStats) {
    send_public_event(state, EVENT_PARTICIPANTS_UPDATED, &stats);
}

fn send_public_event(state: &SharedState, event: &'static str, payload: &impl Serialize) {
    match ServerEvent::new(event, payload) {
        Ok(message) => {
            let receivers = state.public_sse().broadcast(message);
            debug!(event, receivers, "public SSE event sent");
        }
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, GameDefaults},
        state::AppState,
    };

    #[tokio::test]
    async fn game_state_event_reaches_subscribers() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();
        let now = SystemTime::now();
        let game = GameState::initial(&GameDefaults::default(), now);

        broadcast_game_state(&state, &game, now);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, EVENT_GAME_STATE);
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(value["roundName"], "Mission Alpha");
        assert_eq!(value["roundTimer"]["display"], "05:00");
    }

    #[tokio::test]
    async fn participant_event_carries_stats() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();

        broadcast_participants_updated(
            &state,
            ParticipantStats {
                total: 8,
                alive: 5,
                eliminated: 3,
            },
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event, EVENT_PARTICIPANTS_UPDATED);
        assert_eq!(event.data, r#"{"total":8,"alive":5,"eliminated":3}"#);
    }
}
