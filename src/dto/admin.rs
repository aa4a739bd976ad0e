//! Read models for the round archive and the audit log.

use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{
        AdminActionEntity, AdminActionKind, AttachmentEntity, RoundHistoryEntity, RoundStatus,
    },
    dto::{format_system_time, game::GameSettingsResponse},
    state::game::GameState,
};

/// One archived round.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundHistoryItem {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Number the round had while live.
    pub round_number: u32,
    /// Display name of the round.
    pub round_name: String,
    /// Briefing text of the round.
    pub round_details: String,
    /// Timer budget in seconds.
    pub duration: u64,
    /// RFC 3339 start time.
    pub start_time: String,
    /// RFC 3339 end time.
    pub end_time: Option<String>,
    /// Files and links shown with the round.
    pub attachments: Vec<AttachmentEntity>,
    /// How the round ended.
    pub status: RoundStatus,
    /// RFC 3339 archive time.
    pub created_at: String,
}

impl From<RoundHistoryEntity> for RoundHistoryItem {
    fn from(value: RoundHistoryEntity) -> Self {
        Self {
            id: value.id,
            round_number: value.round_number,
            round_name: value.round_name,
            round_details: value.round_details,
            duration: value.duration,
            start_time: format_system_time(value.start_time),
            end_time: value.end_time.map(format_system_time),
            attachments: value.attachments,
            status: value.status,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// One audit record.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminActionItem {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Audited operation.
    pub action: AdminActionKind,
    /// Human readable description.
    pub details: String,
    /// RFC 3339 time the operation was applied.
    pub timestamp: String,
    /// Resulting game state; absent for roster operations.
    pub game_state: Option<GameSettingsResponse>,
}

impl From<AdminActionEntity> for AdminActionItem {
    fn from(value: AdminActionEntity) -> Self {
        Self {
            id: value.id,
            action: value.action,
            details: value.details,
            timestamp: format_system_time(value.timestamp),
            game_state: value
                .game_state
                .map(|snapshot| GameSettingsResponse::from(&GameState::from(snapshot))),
        }
    }
}
