use axum::Router;

use crate::state::SharedState;

/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Round, timer and countdown endpoints.
pub mod game;
/// Health check endpoint.
pub mod health;
/// Participant roster endpoints.
pub mod participants;
/// Server-sent events stream.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(game::router())
        .merge(participants::router())
        .merge(docs::router());

    api_router.with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, dao::game_store::memory::MemoryGameStore, state::AppState};

    async fn app() -> Router<()> {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        router(state)
    }

    async fn send(app: &Router<()>, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn first_read_returns_defaults() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api/game-settings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roundName"], "Mission Alpha");
        assert_eq!(body["currentRound"], 1);
        assert_eq!(body["gameStatus"], "waiting");
        assert_eq!(body["nextRound"]["name"], "Mission Beta");
    }

    #[tokio::test]
    async fn game_action_drives_the_state_machine() {
        let app = app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/game-action",
            Some(json!({"action": "start_game"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["gameStatus"], "active");

        let (status, body) = send(&app, Method::GET, "/api/timer-status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isRoundActive"], true);
        assert_eq!(body["currentRound"], 1);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/game-action",
            Some(json!({"action": "resume_game"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/game-action",
            Some(json!({"action": "self_destruct"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("self_destruct"));
    }

    #[tokio::test]
    async fn admin_actions_are_listed_newest_first() {
        let app = app().await;
        send(
            &app,
            Method::PUT,
            "/api/timers",
            Some(json!({"currentTimer": 90, "nextTimer": 60})),
        )
        .await;
        send(&app, Method::POST, "/api/start-next-round-early", None).await;

        let (status, body) = send(&app, Method::GET, "/api/admin-actions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["action"], "start_next_round_early");
        assert_eq!(body[1]["action"], "set_timers");
        assert_eq!(body[1]["gameState"]["currentTimer"], 90);

        let (_, history) = send(&app, Method::GET, "/api/round-history", None).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["status"], "completed");
    }

    #[tokio::test]
    async fn participant_routes_round_trip() {
        let app = app().await;
        let registration = json!({
            "name": "Red",
            "rollNumber": "R-1",
            "email": "Red@Skeld.io",
            "college": "Skeld",
            "branch": "CSE",
            "year": "1",
            "degree": "B.Tech",
            "team": "alpha",
        });
        let (status, body) = send(&app, Method::POST, "/api/participants", Some(registration.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "red@skeld.io");
        assert_eq!(body["avatar"], "blue.png");

        let (status, _) = send(&app, Method::POST, "/api/participants", Some(registration)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/participants/eliminate",
            Some(json!({"rollNumbers": ["R-1", "R-404"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][1]["outcome"], "not_found");

        let (_, stats) = send(&app, Method::GET, "/api/participants/stats", None).await;
        assert_eq!(stats, json!({"total": 1, "alive": 0, "eliminated": 1}));

        let (_, listed) = send(&app, Method::GET, "/api/participants?status=Eliminated", None).await;
        assert_eq!(listed[0]["rollNumber"], "R-1");

        let (_, reset) = send(&app, Method::POST, "/api/reset-participants", None).await;
        assert_eq!(reset["count"], 1);

        let (status, _) = send(&app, Method::DELETE, "/api/participants/R-1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, "/api/participants/R-1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = app().await;
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/participants",
            Some(json!({
                "name": "Blue",
                "rollNumber": "B-1",
                "email": "not-an-email",
                "college": "Skeld",
                "branch": "CSE",
                "year": "1",
                "degree": "B.Tech",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/game-settings",
            Some(json!({"totalRounds": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn degraded_mode_answers_503() {
        let app = router(AppState::new(AppConfig::default()));
        let (status, body) = send(&app, Method::GET, "/api/game-state", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["message"].is_string());

        let (status, body) = send(&app, Method::GET, "/healthcheck", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = app().await;
        let (status, body) = send(&app, Method::GET, "/api-doc/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/game-action"].is_object());
    }
}
