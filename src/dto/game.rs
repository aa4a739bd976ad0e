use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{AttachmentEntity, GameStatus},
    dto::{format_system_time, parse_system_time},
    state::{
        game::{Countdown, GameState, NextRound},
        state_machine::{CountdownInput, CurrentRoundPatch, SettingsPatch},
        timer::{CountdownBreakdown, TimerReading},
    },
};

/// Pre-game countdown as stored.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSettings {
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
    /// RFC 3339 anchor of the running countdown.
    pub start_time: Option<String>,
    /// RFC 3339 instant the countdown was frozen.
    pub paused_at: Option<String>,
    /// Total seconds frozen at activation.
    pub original_duration: Option<u64>,
}

impl From<&Countdown> for CountdownSettings {
    fn from(value: &Countdown) -> Self {
        Self {
            days: value.budget.days,
            hours: value.budget.hours,
            minutes: value.budget.minutes,
            seconds: value.budget.seconds,
            is_active: value.is_active,
            is_paused: value.is_paused,
            start_time: value.start_time.map(format_system_time),
            paused_at: value.paused_at.map(format_system_time),
            original_duration: value.original_duration,
        }
    }
}

/// Round queued for promotion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundDto {
    /// Display name.
    pub name: String,
    /// Briefing text.
    pub details: String,
    /// Files and links shown with the round.
    #[serde(default)]
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget in seconds.
    #[serde(default)]
    pub timer: u64,
}

impl From<&NextRound> for NextRoundDto {
    fn from(value: &NextRound) -> Self {
        Self {
            name: value.name.clone(),
            details: value.details.clone(),
            attachments: value.attachments.clone(),
            timer: value.timer,
        }
    }
}

impl From<NextRoundDto> for NextRound {
    fn from(value: NextRoundDto) -> Self {
        Self {
            name: value.name,
            details: value.details,
            attachments: value.attachments,
            timer: value.timer,
        }
    }
}

/// Stored game state, without any time derivation.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSettingsResponse {
    /// Compare-and-swap counter of the stored record.
    pub version: u64,
    /// Display name of the live round.
    pub round_name: String,
    /// Briefing text of the live round.
    pub round_details: String,
    /// Files and links shown with the live round.
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget (seconds) of the live round.
    pub current_timer: u64,
    /// Timer budget (seconds) used when a round auto-advances.
    pub next_timer: u64,
    /// RFC 3339 anchor of the running round.
    pub round_start_time: Option<String>,
    /// RFC 3339 instant the round was paused.
    pub paused_at: Option<String>,
    /// RFC 3339 cooldown deadline.
    pub cooldown_end_time: Option<String>,
    /// Pre-game countdown as stored.
    pub pre_game_countdown: CountdownSettings,
    /// Round queued for promotion.
    pub next_round: NextRoundDto,
    /// 1-based number of the live round.
    pub current_round: u32,
    /// Planned number of rounds.
    pub total_rounds: u32,
    /// Lifecycle status.
    pub game_status: GameStatus,
    /// Derived from `gameStatus`.
    pub is_active: bool,
    /// Derived from `gameStatus`.
    pub countdown_finished: bool,
    /// Derived from `gameStatus`.
    pub current_round_started: bool,
    /// RFC 3339 creation time.
    pub created_at: String,
    /// RFC 3339 time of the last mutation.
    pub last_updated: String,
}

impl From<&GameState> for GameSettingsResponse {
    fn from(value: &GameState) -> Self {
        Self {
            version: value.version,
            round_name: value.round_name.clone(),
            round_details: value.round_details.clone(),
            attachments: value.attachments.clone(),
            current_timer: value.current_timer,
            next_timer: value.next_timer,
            round_start_time: value.round_start_time.map(format_system_time),
            paused_at: value.paused_at.map(format_system_time),
            cooldown_end_time: value.cooldown_end_time.map(format_system_time),
            pre_game_countdown: (&value.countdown).into(),
            next_round: (&value.next_round).into(),
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            game_status: value.status,
            is_active: value.is_active(),
            countdown_finished: value.countdown_finished(),
            current_round_started: value.current_round_started(),
            created_at: format_system_time(value.created_at),
            last_updated: format_system_time(value.last_updated),
        }
    }
}

/// Round timer derived at read time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundTimerDto {
    /// Remaining seconds.
    pub remaining_time: u64,
    /// Whole minutes remaining.
    pub minutes: u64,
    /// Seconds past the whole minutes.
    pub seconds: u64,
    /// Zero padded `MM:SS`.
    pub display: String,
    /// True while the timer is counting down.
    pub is_active: bool,
}

impl RoundTimerDto {
    fn new(reading: TimerReading, is_active: bool) -> Self {
        Self {
            remaining_time: reading.remaining,
            minutes: reading.minutes(),
            seconds: reading.seconds(),
            display: reading.display(),
            is_active,
        }
    }
}

/// Countdown derived at read time.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountdownStatusResponse {
    /// Whole days remaining.
    pub days: u64,
    /// Hours remaining past the whole days.
    pub hours: u64,
    /// Minutes remaining past the whole hours.
    pub minutes: u64,
    /// Seconds remaining past the whole minutes.
    pub seconds: u64,
    /// Countdown is armed.
    pub is_active: bool,
    /// Countdown is frozen.
    pub is_paused: bool,
    /// Remaining seconds.
    pub remaining: u64,
    /// Countdown ran out.
    pub finished: bool,
}

impl CountdownStatusResponse {
    /// Derive the countdown of `game` at `now`.
    pub fn at(game: &GameState, now: SystemTime) -> Self {
        let view = game.countdown_view(now);
        Self {
            days: view.breakdown.days,
            hours: view.breakdown.hours,
            minutes: view.breakdown.minutes,
            seconds: view.breakdown.seconds,
            is_active: view.is_active,
            is_paused: view.is_paused,
            remaining: view.remaining,
            finished: view.finished,
        }
    }
}

/// Round timer status for display clients.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatusResponse {
    /// Remaining seconds.
    pub remaining_time: u64,
    /// Whole minutes remaining.
    pub minutes: u64,
    /// Seconds past the whole minutes.
    pub seconds: u64,
    /// Zero padded `MM:SS`.
    pub display: String,
    /// Lifecycle status.
    pub game_status: GameStatus,
    /// True while the game status is `active`.
    pub is_active: bool,
    /// True while the round timer is counting down.
    pub is_round_active: bool,
    /// RFC 3339 anchor of the running round.
    pub round_start_time: Option<String>,
    /// RFC 3339 cooldown deadline.
    pub cooldown_end_time: Option<String>,
    /// 1-based number of the live round.
    pub current_round: u32,
    /// Display name of the live round.
    pub round_name: String,
    /// Briefing text of the live round.
    pub round_details: String,
    /// Files and links shown with the live round.
    pub attachments: Vec<AttachmentEntity>,
}

impl TimerStatusResponse {
    /// Derive the round timer of `game` at `now`.
    pub fn at(game: &GameState, now: SystemTime) -> Self {
        let view = game.round_timer(now);
        Self {
            remaining_time: view.reading.remaining,
            minutes: view.reading.minutes(),
            seconds: view.reading.seconds(),
            display: view.reading.display(),
            game_status: game.status,
            is_active: game.is_active(),
            is_round_active: view.is_round_active,
            round_start_time: game.round_start_time.map(format_system_time),
            cooldown_end_time: game.cooldown_end_time.map(format_system_time),
            current_round: game.current_round,
            round_name: game.round_name.clone(),
            round_details: game.round_details.clone(),
            attachments: game.attachments.clone(),
        }
    }
}

/// Stored state plus both derived timers; also the `game.state` SSE payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    /// Stored settings, flattened into the top level.
    #[serde(flatten)]
    pub settings: GameSettingsResponse,
    /// Derived countdown.
    pub countdown_status: CountdownStatusResponse,
    /// Derived round timer.
    pub round_timer: RoundTimerDto,
}

impl GameStateResponse {
    /// Derive the full view of `game` at `now`.
    pub fn at(game: &GameState, now: SystemTime) -> Self {
        let view = game.round_timer(now);
        Self {
            settings: game.into(),
            countdown_status: CountdownStatusResponse::at(game, now),
            round_timer: RoundTimerDto::new(view.reading, view.is_round_active),
        }
    }
}

/// Partial settings replacement; omitted fields are kept.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    /// New live round name.
    #[validate(length(min = 1))]
    pub round_name: Option<String>,
    /// New live round text.
    pub round_details: Option<String>,
    /// New live round attachments.
    pub attachments: Option<Vec<AttachmentEntity>>,
    /// New timer budget (seconds) of the live round.
    pub current_timer: Option<u64>,
    /// New auto-advance timer budget (seconds).
    pub next_timer: Option<u64>,
    /// New queued round.
    pub next_round: Option<NextRoundDto>,
    /// New 1-based round counter.
    #[validate(range(min = 1))]
    pub current_round: Option<u32>,
    /// New planned number of rounds.
    #[validate(range(min = 1))]
    pub total_rounds: Option<u32>,
    /// New lifecycle status.
    pub game_status: Option<GameStatus>,
    /// RFC 3339 timestamp.
    pub cooldown_end_time: Option<String>,
}

impl UpdateSettingsRequest {
    /// Convert into an engine patch, parsing the optional timestamp.
    pub fn into_patch(self) -> Result<SettingsPatch, String> {
        let cooldown_end_time = self
            .cooldown_end_time
            .as_deref()
            .map(parse_system_time)
            .transpose()
            .map_err(|err| format!("cooldownEndTime is not an RFC 3339 timestamp: {err}"))?;
        Ok(SettingsPatch {
            round_name: self.round_name,
            round_details: self.round_details,
            attachments: self.attachments,
            current_timer: self.current_timer,
            next_timer: self.next_timer,
            next_round: self.next_round.map(Into::into),
            current_round: self.current_round,
            total_rounds: self.total_rounds,
            status: self.game_status,
            cooldown_end_time,
        })
    }
}

/// Replacement of the live round text.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfoRequest {
    /// Display name of the live round.
    #[validate(length(min = 1))]
    pub round_name: String,
    /// Briefing text of the live round.
    #[serde(default)]
    pub round_details: String,
    /// Files and links; cleared when absent.
    pub attachments: Option<Vec<AttachmentEntity>>,
}

/// Replacement of the queued round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NextRoundRequest {
    /// Display name of the queued round.
    #[validate(length(min = 1))]
    pub name: String,
    /// Briefing text of the queued round.
    #[serde(default)]
    pub details: String,
    /// Files and links; cleared when absent.
    pub attachments: Option<Vec<AttachmentEntity>>,
    /// Timer budget (seconds); kept when absent.
    pub timer: Option<u64>,
}

/// Edit of the live round; empty values keep the current ones.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrentRoundRequest {
    /// New name; empty keeps the current one.
    pub round_name: Option<String>,
    /// New briefing text; empty keeps the current one.
    pub round_details: Option<String>,
    /// New timer budget (seconds); zero keeps the current one.
    pub current_timer: Option<u64>,
    /// New attachments.
    pub attachments: Option<Vec<AttachmentEntity>>,
}

impl From<CurrentRoundRequest> for CurrentRoundPatch {
    fn from(value: CurrentRoundRequest) -> Self {
        Self {
            round_name: value.round_name,
            round_details: value.round_details,
            current_timer: value.current_timer,
            attachments: value.attachments,
        }
    }
}

/// Both timer budgets, in seconds.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimersRequest {
    /// Budget (seconds) of the live round.
    pub current_timer: u64,
    /// Budget (seconds) used when a round auto-advances.
    pub next_timer: u64,
}

/// Countdown budget and flags as edited by the operator.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CountdownRequest {
    /// Whole days of the budget.
    pub days: u64,
    /// Hours of the budget.
    pub hours: u64,
    /// Minutes of the budget.
    pub minutes: u64,
    /// Seconds of the budget.
    pub seconds: u64,
    /// Arm the countdown.
    pub is_active: bool,
    /// Freeze the countdown.
    pub is_paused: bool,
}

impl From<CountdownRequest> for CountdownInput {
    fn from(value: CountdownRequest) -> Self {
        Self {
            budget: CountdownBreakdown {
                days: value.days,
                hours: value.hours,
                minutes: value.minutes,
                seconds: value.seconds,
            },
            is_active: value.is_active,
            is_paused: value.is_paused,
        }
    }
}

/// One operator keyword with optional audit text.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GameActionRequest {
    /// `start_game`, `pause_game`, `resume_game`, `reset_game`, `end_game`,
    /// `start_countdown`, `pause_countdown` or `reset_countdown`.
    #[validate(length(min = 1))]
    pub action: String,
    /// Audit text; a default is derived from the action when absent.
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::config::GameDefaults;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn game_state_payload_is_camel_case_with_derived_flags() {
        let mut game = GameState::initial(&GameDefaults::default(), at(0));
        game.status = GameStatus::Active;
        game.round_start_time = Some(at(0));

        let value = serde_json::to_value(GameStateResponse::at(&game, at(61))).unwrap();
        assert_eq!(value["roundName"], "Mission Alpha");
        assert_eq!(value["gameStatus"], "active");
        assert_eq!(value["isActive"], true);
        assert_eq!(value["currentRoundStarted"], true);
        assert_eq!(value["countdownFinished"], false);
        assert_eq!(value["roundTimer"]["remainingTime"], 239);
        assert_eq!(value["roundTimer"]["display"], "03:59");
        assert_eq!(value["preGameCountdown"]["isActive"], false);
        assert!(value.get("pausedAt").is_none());
    }

    #[test]
    fn settings_request_parses_cooldown_timestamp() {
        let request: UpdateSettingsRequest = serde_json::from_value(json!({
            "gameStatus": "countdown_finished",
            "cooldownEndTime": "2023-11-14T22:13:20Z"
        }))
        .unwrap();
        let patch = request.into_patch().unwrap();
        assert_eq!(patch.status, Some(GameStatus::CountdownFinished));
        assert_eq!(patch.cooldown_end_time, Some(at(0)));

        let request = UpdateSettingsRequest {
            cooldown_end_time: Some("soon".into()),
            ..Default::default()
        };
        assert!(request.into_patch().is_err());
    }

    #[test]
    fn countdown_request_defaults_missing_fields() {
        let request: CountdownRequest =
            serde_json::from_value(json!({"hours": 1, "isActive": true})).unwrap();
        let input = CountdownInput::from(request);
        assert_eq!(input.budget.total_seconds(), 3600);
        assert!(input.is_active);
        assert!(!input.is_paused);
    }
}
