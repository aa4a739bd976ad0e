use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of the live game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Nothing running; the initial and post-reset status.
    Waiting,
    /// Pre-game countdown is armed.
    Countdown,
    /// Pre-game countdown ran out; waiting for the operator to start the round.
    CountdownFinished,
    /// A round timer is running.
    Active,
    /// The round timer is frozen.
    Paused,
    /// The event is over.
    Ended,
}

impl GameStatus {
    /// Wire/audit label of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Countdown => "countdown",
            GameStatus::CountdownFinished => "countdown_finished",
            GameStatus::Active => "active",
            GameStatus::Paused => "paused",
            GameStatus::Ended => "ended",
        }
    }
}

/// Outcome recorded for an archived round.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Round ran to its end or was promoted by the operator.
    Completed,
    /// Round was interrupted by a reset.
    Incomplete,
    /// Round was abandoned by ending the game.
    Cancelled,
}

/// Closed set of audited operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    /// Pre-game countdown armed or resumed.
    StartCountdown,
    /// Pre-game countdown frozen.
    PauseCountdown,
    /// Pre-game countdown disarmed.
    ResetCountdown,
    /// Pre-game countdown reached zero.
    CountdownFinished,
    /// Round timer started.
    StartGame,
    /// Round timer frozen.
    PauseGame,
    /// Round timer resumed.
    ResumeGame,
    /// Game sent back to round 1.
    ResetGame,
    /// Game ended and defaults restored.
    EndGame,
    /// Queued round promoted at the natural end of the current one.
    StartNextRound,
    /// Queued round promoted before the current one ran out.
    StartNextRoundEarly,
    /// Expired round replaced by the next one on observation.
    AutoAdvanceRound,
    /// Timer budgets replaced.
    SetTimers,
    /// Countdown budget or flags replaced.
    SetCountdown,
    /// Settings replaced in bulk.
    UpdateSettings,
    /// Live round text replaced.
    UpdateRoundInfo,
    /// Queued round replaced.
    UpdateNextRound,
    /// Live round edited.
    UpdateCurrentRound,
    /// Participant registered.
    AddParticipant,
    /// Participant removed.
    RemoveParticipant,
    /// Participants eliminated by roll number.
    EliminatePlayer,
    /// Alive members of a team eliminated.
    EliminateTeam,
    /// Eliminated participants brought back.
    ResetParticipants,
}

/// Whether a participant is still in play.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum ParticipantStatus {
    /// Still in play.
    Alive,
    /// Knocked out.
    Eliminated,
}

impl ParticipantStatus {
    /// Stored label (`Alive` / `Eliminated`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Alive => "Alive",
            ParticipantStatus::Eliminated => "Eliminated",
        }
    }
}

/// File or link attached to a round. Opaque to the round engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentEntity {
    /// Display name.
    pub name: String,
    /// Download or link target.
    pub url: String,
    /// MIME type or free-form kind label.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Size in bytes when known.
    #[serde(default)]
    pub size: Option<u64>,
    /// True for external links rather than uploaded files.
    #[serde(default)]
    pub is_link: bool,
}

/// Pre-game countdown budget and its anchors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CountdownEntity {
    /// Whole days of the budget.
    pub days: u64,
    /// Hours of the budget.
    pub hours: u64,
    /// Minutes of the budget.
    pub minutes: u64,
    /// Seconds of the budget.
    pub seconds: u64,
    /// Countdown is armed.
    pub is_active: bool,
    /// Countdown is frozen.
    pub is_paused: bool,
    /// Anchor of the running countdown.
    pub start_time: Option<SystemTime>,
    /// Instant the countdown was frozen, while paused.
    pub paused_at: Option<SystemTime>,
    /// Total seconds captured once at activation.
    pub original_duration: Option<u64>,
}

/// Round queued for promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextRoundEntity {
    /// Display name.
    pub name: String,
    /// Free-form briefing text.
    pub details: String,
    /// Files and links shown with the round.
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget (seconds) the round gets once promoted.
    pub timer: u64,
}

/// The single authoritative game state record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Compare-and-swap counter, bumped on every write.
    pub version: u64,
    /// Display name of the live round.
    pub round_name: String,
    /// Free-form briefing text of the live round.
    pub round_details: String,
    /// Files and links shown with the live round.
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget (seconds) of the live round.
    pub current_timer: u64,
    /// Timer budget (seconds) used when a round auto-advances.
    pub next_timer: u64,
    /// Anchor of the running round timer.
    pub round_start_time: Option<SystemTime>,
    /// Instant the round timer was frozen by `pause_game`.
    pub paused_at: Option<SystemTime>,
    /// Optional cooldown deadline shown between rounds.
    pub cooldown_end_time: Option<SystemTime>,
    /// Pre-game countdown.
    pub pre_game_countdown: CountdownEntity,
    /// Round queued for promotion.
    pub next_round: NextRoundEntity,
    /// 1-based number of the live round.
    pub current_round: u32,
    /// Planned number of rounds.
    pub total_rounds: u32,
    /// Lifecycle status.
    pub game_status: GameStatus,
    /// Creation time of the record.
    pub created_at: SystemTime,
    /// Time of the last mutation.
    pub last_updated: SystemTime,
}

/// Immutable archive entry for a finished round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundHistoryEntity {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Number the round had while live.
    pub round_number: u32,
    /// Display name of the round.
    pub round_name: String,
    /// Briefing text of the round.
    pub round_details: String,
    /// Timer budget (seconds) the round was given.
    pub duration: u64,
    /// When the round started.
    pub start_time: SystemTime,
    /// When the round ended.
    pub end_time: Option<SystemTime>,
    /// Files and links shown with the round.
    pub attachments: Vec<AttachmentEntity>,
    /// How the round ended.
    pub status: RoundStatus,
    /// Time the entry was archived.
    pub created_at: SystemTime,
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminActionEntity {
    /// Stable identifier for the entry.
    pub id: Uuid,
    /// Audited operation.
    pub action: AdminActionKind,
    /// Human readable description.
    pub details: String,
    /// Time the operation was applied.
    pub timestamp: SystemTime,
    /// Resulting game state; absent for roster-only operations.
    pub game_state: Option<GameStateEntity>,
}

/// Registered participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Full name.
    pub name: String,
    /// Unique key.
    pub roll_number: String,
    /// Unique, stored lowercased.
    pub email: String,
    /// Optional contact number.
    pub phone: Option<String>,
    /// College or institution.
    pub college: String,
    /// Branch of study.
    pub branch: String,
    /// Year of study.
    pub year: String,
    /// Degree being pursued.
    pub degree: String,
    /// Avatar image name.
    pub avatar: String,
    /// Optional team label used for team eliminations.
    pub team: Option<String>,
    /// Whether the participant is still in play.
    pub status: ParticipantStatus,
    /// Time of elimination, while eliminated.
    pub eliminated_at: Option<SystemTime>,
    /// Registration time.
    pub registered_at: SystemTime,
    /// Time of the last change.
    pub last_updated: SystemTime,
}

/// Head counts grouped by participant status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ParticipantStatsEntity {
    /// Registered participants.
    pub total: u64,
    /// Participants still in play.
    pub alive: u64,
    /// Participants knocked out.
    pub eliminated: u64,
}

/// One logical write of the game state plus the log records it produced.
///
/// Stores apply the state write only when the stored version equals
/// `expected_version` (`None` meaning "no record yet").
#[derive(Debug, Clone)]
pub struct GameCommit {
    /// New state to store.
    pub state: GameStateEntity,
    /// Version the stored record must still carry.
    pub expected_version: Option<u64>,
    /// Rounds archived by this write.
    pub history: Vec<RoundHistoryEntity>,
    /// Audit records produced by this write.
    pub actions: Vec<AdminActionEntity>,
}
