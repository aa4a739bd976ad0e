/// OpenAPI documentation generation.
pub mod documentation;
/// Round, timer and countdown operations on the game state record.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Participant roster and elimination operations.
pub mod participant_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
