use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::{ParticipantEntity, ParticipantStatsEntity, ParticipantStatus},
    dto::format_system_time,
};

/// Avatar assigned when registration does not pick one.
pub const DEFAULT_AVATAR: &str = "blue.png";

/// Registered participant as exposed to clients.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    /// Full name.
    pub name: String,
    /// Unique roll number.
    pub roll_number: String,
    /// Lowercased email.
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
    /// Team label, when assigned.
    pub team: Option<String>,
    /// `Alive` or `Eliminated`.
    pub status: ParticipantStatus,
    /// RFC 3339 elimination time.
    pub eliminated_at: Option<String>,
    /// RFC 3339 registration time.
    pub registered_at: String,
    /// RFC 3339 time of the last change.
    pub last_updated: String,
}

impl From<ParticipantEntity> for ParticipantDto {
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
            eliminated_at: value.eliminated_at.map(format_system_time),
            registered_at: format_system_time(value.registered_at),
            last_updated: format_system_time(value.last_updated),
        }
    }
}

/// Registration payload. Text fields are trimmed before validation.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantRequest {
    /// Full name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Unique roll number.
    #[validate(length(min = 1))]
    pub roll_number: String,
    /// Email; stored lowercased and unique.
    #[validate(email)]
    pub email: String,
    /// Optional contact number.
    pub phone: Option<String>,
    /// College or institution.
    #[validate(length(min = 1))]
    pub college: String,
    /// Branch of study.
    #[validate(length(min = 1))]
    pub branch: String,
    /// Year of study.
    #[validate(length(min = 1))]
    pub year: String,
    /// Degree being pursued.
    #[validate(length(min = 1))]
    pub degree: String,
    /// Avatar image name; a default is used when absent.
    pub avatar: Option<String>,
    /// Optional team label.
    pub team: Option<String>,
}

fn trimmed_opt(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl CreateParticipantRequest {
    /// Trim every field and lowercase the email.
    pub fn normalised(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            roll_number: self.roll_number.trim().to_owned(),
            email: self.email.trim().to_lowercase(),
            phone: trimmed_opt(self.phone),
            college: self.college.trim().to_owned(),
            branch: self.branch.trim().to_owned(),
            year: self.year.trim().to_owned(),
            degree: self.degree.trim().to_owned(),
            avatar: trimmed_opt(self.avatar),
            team: trimmed_opt(self.team),
        }
    }
}

/// Filter for the participant listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ParticipantQuery {
    /// `Alive` or `Eliminated`.
    pub status: Option<ParticipantStatus>,
}

/// Roll numbers to eliminate.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EliminateRequest {
    /// Roll numbers to eliminate; unknown ones are reported, not rejected.
    #[validate(length(min = 1))]
    pub roll_numbers: Vec<String>,
}

/// Team whose alive members are eliminated.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EliminateTeamRequest {
    /// Team label.
    #[validate(length(min = 1))]
    pub team: String,
}

/// Result for one roll number of a batch elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EliminationOutcome {
    /// Participant is now eliminated (or already was).
    Eliminated,
    /// No participant carries the roll number.
    NotFound,
    /// The store failed for this item.
    Failed,
}

/// Per-item report of a batch elimination.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EliminationResult {
    /// Roll number as submitted.
    pub roll_number: String,
    /// What happened to it.
    pub outcome: EliminationOutcome,
    /// Failure reason, for `failed` items.
    pub error: Option<String>,
}

/// Batch elimination report.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EliminateResponse {
    /// Number of participants eliminated by this call.
    pub count: u64,
    /// One entry per submitted roll number, in order.
    pub results: Vec<EliminationResult>,
}

/// Number of records changed by a bulk operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    /// Records changed.
    pub count: u64,
}

/// Head counts per status.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ParticipantStats {
    /// Registered participants.
    pub total: u64,
    /// Participants still in play.
    pub alive: u64,
    /// Participants knocked out.
    pub eliminated: u64,
}

impl From<ParticipantStatsEntity> for ParticipantStats {
    fn from(value: ParticipantStatsEntity) -> Self {
        Self {
            total: value.total,
            alive: value.alive,
            eliminated: value.eliminated,
        }
    }
}
