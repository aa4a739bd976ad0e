use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{
    AdminActionEntity, AdminActionKind, AttachmentEntity, CountdownEntity, GameStateEntity,
    GameStatus, NextRoundEntity, ParticipantEntity, ParticipantStatus, RoundHistoryEntity,
    RoundStatus,
};

/// Well-known key of the singleton game state document.
pub const GAME_STATE_ID: &str = "current";

/// Filter selecting the singleton game state document.
pub fn game_state_filter() -> Document {
    doc! {"_id": GAME_STATE_ID}
}

fn to_bson_time(value: Option<std::time::SystemTime>) -> Option<DateTime> {
    value.map(DateTime::from_system_time)
}

fn from_bson_time(value: Option<DateTime>) -> Option<std::time::SystemTime> {
    value.map(DateTime::to_system_time)
}

/// Stored shape of the pre-game countdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCountdownDocument {
    days: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    is_active: bool,
    is_paused: bool,
    start_time: Option<DateTime>,
    #[serde(default)]
    paused_at: Option<DateTime>,
    original_duration: Option<u64>,
}

impl From<CountdownEntity> for MongoCountdownDocument {
    fn from(value: CountdownEntity) -> Self {
        Self {
            days: value.days,
            hours: value.hours,
            minutes: value.minutes,
            seconds: value.seconds,
            is_active: value.is_active,
            is_paused: value.is_paused,
            start_time: to_bson_time(value.start_time),
            paused_at: to_bson_time(value.paused_at),
            original_duration: value.original_duration,
        }
    }
}

impl From<MongoCountdownDocument> for CountdownEntity {
    fn from(value: MongoCountdownDocument) -> Self {
        Self {
            days: value.days,
            hours: value.hours,
            minutes: value.minutes,
            seconds: value.seconds,
            is_active: value.is_active,
            is_paused: value.is_paused,
            start_time: from_bson_time(value.start_time),
            paused_at: from_bson_time(value.paused_at),
            original_duration: value.original_duration,
        }
    }
}

/// Stored shape of the game state singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameStateDocument {
    #[serde(rename = "_id")]
    id: String,
    /// Compare-and-swap counter.
    pub version: u64,
    round_name: String,
    round_details: String,
    attachments: Vec<AttachmentEntity>,
    current_timer: u64,
    next_timer: u64,
    round_start_time: Option<DateTime>,
    #[serde(default)]
    paused_at: Option<DateTime>,
    cooldown_end_time: Option<DateTime>,
    pre_game_countdown: MongoCountdownDocument,
    next_round: NextRoundEntity,
    current_round: u32,
    total_rounds: u32,
    game_status: GameStatus,
    created_at: DateTime,
    last_updated: DateTime,
}

impl From<GameStateEntity> for MongoGameStateDocument {
    fn from(value: GameStateEntity) -> Self {
        Self {
            id: GAME_STATE_ID.to_owned(),
            version: value.version,
            round_name: value.round_name,
            round_details: value.round_details,
            attachments: value.attachments,
            current_timer: value.current_timer,
            next_timer: value.next_timer,
            round_start_time: to_bson_time(value.round_start_time),
            paused_at: to_bson_time(value.paused_at),
            cooldown_end_time: to_bson_time(value.cooldown_end_time),
            pre_game_countdown: value.pre_game_countdown.into(),
            next_round: value.next_round,
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            game_status: value.game_status,
            created_at: DateTime::from_system_time(value.created_at),
            last_updated: DateTime::from_system_time(value.last_updated),
        }
    }
}

impl From<MongoGameStateDocument> for GameStateEntity {
    fn from(value: MongoGameStateDocument) -> Self {
        Self {
            version: value.version,
            round_name: value.round_name,
            round_details: value.round_details,
            attachments: value.attachments,
            current_timer: value.current_timer,
            next_timer: value.next_timer,
            round_start_time: from_bson_time(value.round_start_time),
            paused_at: from_bson_time(value.paused_at),
            cooldown_end_time: from_bson_time(value.cooldown_end_time),
            pre_game_countdown: value.pre_game_countdown.into(),
            next_round: value.next_round,
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            game_status: value.game_status,
            created_at: value.created_at.to_system_time(),
            last_updated: value.last_updated.to_system_time(),
        }
    }
}

/// Stored shape of an archived round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoRoundHistoryDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    round_number: u32,
    round_name: String,
    round_details: String,
    duration: u64,
    start_time: DateTime,
    end_time: Option<DateTime>,
    attachments: Vec<AttachmentEntity>,
    status: RoundStatus,
    created_at: DateTime,
}

impl From<RoundHistoryEntity> for MongoRoundHistoryDocument {
    fn from(value: RoundHistoryEntity) -> Self {
        Self {
            id: value.id,
            round_number: value.round_number,
            round_name: value.round_name,
            round_details: value.round_details,
            duration: value.duration,
            start_time: DateTime::from_system_time(value.start_time),
            end_time: to_bson_time(value.end_time),
            attachments: value.attachments,
            status: value.status,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoRoundHistoryDocument> for RoundHistoryEntity {
    fn from(value: MongoRoundHistoryDocument) -> Self {
        Self {
            id: value.id,
            round_number: value.round_number,
            round_name: value.round_name,
            round_details: value.round_details,
            duration: value.duration,
            start_time: value.start_time.to_system_time(),
            end_time: from_bson_time(value.end_time),
            attachments: value.attachments,
            status: value.status,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Stored shape of an audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAdminActionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    action: AdminActionKind,
    details: String,
    timestamp: DateTime,
    game_state: Option<MongoGameStateDocument>,
}

impl From<AdminActionEntity> for MongoAdminActionDocument {
    fn from(value: AdminActionEntity) -> Self {
        Self {
            id: value.id,
            action: value.action,
            details: value.details,
            timestamp: DateTime::from_system_time(value.timestamp),
            game_state: value.game_state.map(Into::into),
        }
    }
}

impl From<MongoAdminActionDocument> for AdminActionEntity {
    fn from(value: MongoAdminActionDocument) -> Self {
        Self {
            id: value.id,
            action: value.action,
            details: value.details,
            timestamp: value.timestamp.to_system_time(),
            game_state: value.game_state.map(Into::into),
        }
    }
}

/// Stored shape of a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    name: String,
    roll_number: String,
    email: String,
    phone: Option<String>,
    college: String,
    branch: String,
    year: String,
    degree: String,
    avatar: String,
    #[serde(default)]
    team: Option<String>,
    status: ParticipantStatus,
    eliminated_at: Option<DateTime>,
    registered_at: DateTime,
    last_updated: DateTime,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            name: value.name,
            roll_number: value.roll_number,
            email: value.email,
            phone: value.phone,
            college: value.college,
            branch: value.branch,
            year: value.year,
            degree: value.degree,
            avatar: value.avatar,
            team: value.team,
            status: value.status,
            eliminated_at: to_bson_time(value.eliminated_at),
            registered_at: DateTime::from_system_time(value.registered_at),
            last_updated: DateTime::from_system_time(value.last_updated),
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            name: value.name,
            roll_number: value.roll_number,
            email: value.email,
            phone: value.phone,
            college: value.college,
            branch: value.branch,
            year: value.year,
            degree: value.degree,
            avatar: value.avatar,
            team: value.team,
            status: value.status,
            eliminated_at: from_bson_time(value.eliminated_at),
            registered_at: value.registered_at.to_system_time(),
            last_updated: value.last_updated.to_system_time(),
        }
    }
}

/// One row of the `$group` by status aggregation.
#[derive(Debug, Deserialize)]
pub struct StatusCountDocument {
    /// Grouped status.
    #[serde(rename = "_id")]
    pub status: ParticipantStatus,
    /// Participants carrying it.
    pub count: i64,
}
