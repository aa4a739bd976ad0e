//! Round and countdown lifecycle.
//!
//! Every operation is a synchronous mutation of a [`GameState`] value at an
//! explicit instant. Callers persist the result and the [`Transition`] records
//! it returns; nothing here touches storage or reads the clock.

use std::{
    str::FromStr,
    time::{Duration, SystemTime},
};

use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::GameDefaults,
    dao::models::{AdminActionKind, AttachmentEntity, GameStatus, RoundHistoryEntity, RoundStatus},
    state::{
        game::{GameState, NextRound},
        timer::{CountdownBreakdown, elapsed_seconds},
    },
};

/// Operator keywords accepted by the game action endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Start (or restart) the round timer from now.
    StartGame,
    /// Freeze the running round timer.
    PauseGame,
    /// Continue a paused round where it stopped.
    ResumeGame,
    /// Back to round 1, waiting.
    ResetGame,
    /// Restore every built-in default.
    EndGame,
    /// Arm or resume the pre-game countdown.
    StartCountdown,
    /// Freeze the pre-game countdown.
    PauseCountdown,
    /// Disarm the pre-game countdown.
    ResetCountdown,
}

impl GameAction {
    /// Audit kind recorded for this action.
    pub fn kind(&self) -> AdminActionKind {
        match self {
            GameAction::StartGame => AdminActionKind::StartGame,
            GameAction::PauseGame => AdminActionKind::PauseGame,
            GameAction::ResumeGame => AdminActionKind::ResumeGame,
            GameAction::ResetGame => AdminActionKind::ResetGame,
            GameAction::EndGame => AdminActionKind::EndGame,
            GameAction::StartCountdown => AdminActionKind::StartCountdown,
            GameAction::PauseCountdown => AdminActionKind::PauseCountdown,
            GameAction::ResetCountdown => AdminActionKind::ResetCountdown,
        }
    }

    /// Wire keyword of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::StartGame => "start_game",
            GameAction::PauseGame => "pause_game",
            GameAction::ResumeGame => "resume_game",
            GameAction::ResetGame => "reset_game",
            GameAction::EndGame => "end_game",
            GameAction::StartCountdown => "start_countdown",
            GameAction::PauseCountdown => "pause_countdown",
            GameAction::ResetCountdown => "reset_countdown",
        }
    }
}

/// Keyword outside the closed action set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game action `{0}`")]
pub struct UnknownAction(pub String);

impl FromStr for GameAction {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start_game" => Ok(GameAction::StartGame),
            "pause_game" => Ok(GameAction::PauseGame),
            "resume_game" => Ok(GameAction::ResumeGame),
            "reset_game" => Ok(GameAction::ResetGame),
            "end_game" => Ok(GameAction::EndGame),
            "start_countdown" => Ok(GameAction::StartCountdown),
            "pause_countdown" => Ok(GameAction::PauseCountdown),
            "reset_countdown" => Ok(GameAction::ResetCountdown),
            other => Err(UnknownAction(other.to_owned())),
        }
    }
}

/// How the outgoing round is archived by an explicit promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionVariant {
    /// The round ran its full budget: it started `currentTimer` seconds ago.
    AtNaturalEnd,
    /// The operator cut the round short: it started at the stored anchor.
    Early,
}

/// Record of one state change, to be written to the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Audited operation.
    pub kind: AdminActionKind,
    /// Human readable description.
    pub details: String,
    /// Round archived by this change, if any.
    pub archived: Option<RoundHistoryEntity>,
}

impl Transition {
    fn new(kind: AdminActionKind, details: impl Into<String>) -> Self {
        Self {
            kind,
            details: details.into(),
            archived: None,
        }
    }

    fn with_archive(mut self, record: Option<RoundHistoryEntity>) -> Self {
        self.archived = record;
        self
    }
}

/// Rejected mutation. The state is left untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The operation is not allowed from the current status.
    #[error("cannot {operation} while the game is {}", from.as_str())]
    InvalidTransition {
        /// Status the game was in.
        from: GameStatus,
        /// What was attempted, phrased for the error message.
        operation: &'static str,
    },
    /// The payload is structurally fine but semantically unusable.
    #[error("{0}")]
    InvalidInput(String),
}

/// Partial replacement of the game settings; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    /// New live round name.
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
    pub next_round: Option<NextRound>,
    /// New 1-based round counter.
    pub current_round: Option<u32>,
    /// New planned number of rounds.
    pub total_rounds: Option<u32>,
    /// New lifecycle status.
    pub status: Option<GameStatus>,
    /// New cooldown deadline.
    pub cooldown_end_time: Option<SystemTime>,
}

/// Edit of the live round; empty strings and a zero timer count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentRoundPatch {
    /// New live round name.
    pub round_name: Option<String>,
    /// New live round text.
    pub round_details: Option<String>,
    /// New timer budget (seconds); restarts a running round when changed.
    pub current_timer: Option<u64>,
    /// New live round attachments.
    pub attachments: Option<Vec<AttachmentEntity>>,
}

/// Countdown as submitted by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownInput {
    /// Countdown duration.
    pub budget: CountdownBreakdown,
    /// Arm the countdown.
    pub is_active: bool,
    /// Freeze the countdown.
    pub is_paused: bool,
}

fn shifted(anchor: SystemTime, paused_at: Option<SystemTime>, now: SystemTime) -> SystemTime {
    match paused_at {
        Some(paused_at) => anchor + now.duration_since(paused_at).unwrap_or_default(),
        None => anchor,
    }
}

impl GameState {
    fn invalid(&self, operation: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            from: self.status,
            operation,
        }
    }

    fn archive(
        &self,
        status: RoundStatus,
        start_time: SystemTime,
        end_time: SystemTime,
        now: SystemTime,
    ) -> RoundHistoryEntity {
        RoundHistoryEntity {
            id: Uuid::new_v4(),
            round_number: self.current_round,
            round_name: self.round_name.clone(),
            round_details: self.round_details.clone(),
            duration: self.current_timer,
            start_time,
            end_time: Some(end_time),
            attachments: self.attachments.clone(),
            status,
            created_at: now,
        }
    }

    /// Archive the running round, if one is running.
    fn archive_running(&self, status: RoundStatus, now: SystemTime) -> Option<RoundHistoryEntity> {
        if !self.current_round_started() {
            return None;
        }
        let start = self.round_start_time?;
        Some(self.archive(status, start, now, now))
    }

    fn arm_countdown(&mut self, now: SystemTime) -> Result<(), TransitionError> {
        let total = self.countdown.budget.total_seconds();
        if total == 0 {
            return Err(TransitionError::InvalidInput(
                "countdown budget must be greater than zero".into(),
            ));
        }
        self.countdown.is_active = true;
        self.countdown.is_paused = false;
        self.countdown.start_time = Some(now);
        self.countdown.paused_at = None;
        self.countdown.original_duration = Some(total);
        Ok(())
    }

    fn pause_countdown_at(&mut self, now: SystemTime) {
        let remaining = self.countdown.remaining(now);
        self.countdown.budget = CountdownBreakdown::from_seconds(remaining);
        self.countdown.is_paused = true;
        self.countdown.paused_at = Some(now);
    }

    fn resume_countdown_at(&mut self, now: SystemTime) {
        if let Some(start) = self.countdown.start_time {
            self.countdown.start_time = Some(shifted(start, self.countdown.paused_at, now));
        }
        self.countdown.is_paused = false;
        self.countdown.paused_at = None;
    }

    /// Restart the round anchor after a budget change, keeping a paused round paused.
    fn restamp_round(&mut self, now: SystemTime) {
        match self.status {
            GameStatus::Active => self.round_start_time = Some(now),
            GameStatus::Paused => {
                self.round_start_time = Some(now);
                self.paused_at = Some(now);
            }
            _ => {}
        }
    }

    /// Apply one operator keyword.
    pub fn apply_action(
        &mut self,
        action: GameAction,
        details: Option<String>,
        now: SystemTime,
        defaults: &GameDefaults,
    ) -> Result<Transition, TransitionError> {
        let mut archived = None;
        match action {
            GameAction::StartGame => {
                self.status = GameStatus::Active;
                self.round_start_time = Some(now);
                self.paused_at = None;
                self.countdown.is_active = false;
                self.countdown.is_paused = false;
                self.countdown.paused_at = None;
            }
            GameAction::PauseGame => {
                if self.status != GameStatus::Active {
                    return Err(self.invalid("pause the game"));
                }
                self.status = GameStatus::Paused;
                self.paused_at = Some(now);
            }
            GameAction::ResumeGame => {
                if self.status != GameStatus::Paused {
                    return Err(self.invalid("resume the game"));
                }
                self.round_start_time = Some(match self.round_start_time {
                    Some(start) => shifted(start, self.paused_at, now),
                    None => now,
                });
                self.paused_at = None;
                self.status = GameStatus::Active;
            }
            GameAction::ResetGame => {
                archived = self.archive_running(RoundStatus::Incomplete, now);
                self.status = GameStatus::Waiting;
                self.current_round = 1;
                self.round_start_time = None;
                self.paused_at = None;
                self.cooldown_end_time = None;
                self.countdown.disarm();
            }
            GameAction::EndGame => {
                archived = self.archive_running(RoundStatus::Cancelled, now);
                let version = self.version;
                let created_at = self.created_at;
                *self = GameState::initial(defaults, now);
                self.version = version;
                self.created_at = created_at;
            }
            GameAction::StartCountdown => {
                if !matches!(
                    self.status,
                    GameStatus::Waiting | GameStatus::Countdown | GameStatus::CountdownFinished
                ) {
                    return Err(self.invalid("start the countdown"));
                }
                if self.countdown.is_active && self.countdown.is_paused {
                    self.resume_countdown_at(now);
                } else if !self.countdown.is_running() {
                    self.arm_countdown(now)?;
                }
                self.status = GameStatus::Countdown;
            }
            GameAction::PauseCountdown => {
                if !self.countdown.is_running() {
                    return Err(self.invalid("pause a countdown that is not running"));
                }
                self.pause_countdown_at(now);
            }
            GameAction::ResetCountdown => {
                if let Some(original) = self.countdown.original_duration {
                    self.countdown.budget = CountdownBreakdown::from_seconds(original);
                }
                self.countdown.disarm();
                if matches!(
                    self.status,
                    GameStatus::Countdown | GameStatus::CountdownFinished
                ) {
                    self.status = GameStatus::Waiting;
                }
            }
        }
        self.last_updated = now;

        let details = details
            .filter(|details| !details.trim().is_empty())
            .unwrap_or_else(|| format!("Game action: {}", action.as_str()));
        Ok(Transition::new(action.kind(), details).with_archive(archived))
    }

    /// Settle time-driven changes that became due by `now`.
    ///
    /// At most one countdown expiry and one round expiry are applied per call,
    /// so repeated observation of the same instant is a no-op after the first.
    pub fn observe(&mut self, now: SystemTime) -> Vec<Transition> {
        self.observe_countdown(now)
            .into_iter()
            .chain(self.observe_round(now))
            .collect()
    }

    /// Mark a countdown that ran out by `now` as finished.
    pub fn observe_countdown(&mut self, now: SystemTime) -> Option<Transition> {
        if !self.countdown.is_running() || self.countdown.remaining(now) > 0 {
            return None;
        }
        self.countdown.budget = CountdownBreakdown::default();
        self.countdown.disarm();
        if self.status == GameStatus::Countdown {
            self.status = GameStatus::CountdownFinished;
        }
        self.last_updated = now;
        Some(Transition::new(
            AdminActionKind::CountdownFinished,
            "Pre-game countdown finished",
        ))
    }

    /// Archive an active round whose budget ran out and start the next one.
    ///
    /// A round counter already at its ceiling is left alone.
    pub fn observe_round(&mut self, now: SystemTime) -> Option<Transition> {
        let (GameStatus::Active, Some(start)) = (self.status, self.round_start_time) else {
            return None;
        };
        if self.current_timer == 0 || !self.round_timer(now).reading.is_expired() {
            return None;
        }
        let next_round = self.current_round.checked_add(1)?;

        let end = start + Duration::from_secs(self.current_timer);
        let record = self.archive(RoundStatus::Completed, start, end, now);
        let finished_round = self.current_round;
        self.current_timer = self.next_timer;
        self.round_start_time = Some(now);
        self.current_round = next_round;
        self.last_updated = now;
        Some(
            Transition::new(
                AdminActionKind::AutoAdvanceRound,
                format!(
                    "Round {finished_round} timer expired; round {} running for {}s",
                    self.current_round, self.current_timer
                ),
            )
            .with_archive(Some(record)),
        )
    }

    /// Archive the current round and promote the queued one.
    pub fn promote_next_round(
        &mut self,
        variant: PromotionVariant,
        now: SystemTime,
        defaults: &GameDefaults,
    ) -> Result<Transition, TransitionError> {
        let next_round = self.current_round.checked_add(1).ok_or_else(|| {
            TransitionError::InvalidInput(format!(
                "round {} is the last round that can be numbered",
                self.current_round
            ))
        })?;
        let start = match variant {
            PromotionVariant::AtNaturalEnd => now
                .checked_sub(Duration::from_secs(self.current_timer))
                .unwrap_or(now),
            PromotionVariant::Early => self.round_start_time.unwrap_or(now),
        };
        let record = self.archive(RoundStatus::Completed, start, now, now);

        let next = std::mem::replace(&mut self.next_round, NextRound::placeholder(defaults));
        self.round_name = next.name;
        self.round_details = next.details;
        self.attachments = next.attachments;
        self.current_timer = if next.timer > 0 {
            next.timer
        } else {
            self.next_timer
        };
        self.current_round = next_round;
        self.round_start_time = Some(now);
        self.paused_at = None;
        self.status = GameStatus::Active;
        self.last_updated = now;

        let (kind, details) = match variant {
            PromotionVariant::AtNaturalEnd => (
                AdminActionKind::StartNextRound,
                format!("Started round {}: {}", self.current_round, self.round_name),
            ),
            PromotionVariant::Early => (
                AdminActionKind::StartNextRoundEarly,
                format!(
                    "Started round {} early: {}",
                    self.current_round, self.round_name
                ),
            ),
        };
        Ok(Transition::new(kind, details).with_archive(Some(record)))
    }

    /// Replace the round text of the live round.
    pub fn set_round_info(
        &mut self,
        round_name: String,
        round_details: String,
        attachments: Option<Vec<AttachmentEntity>>,
        now: SystemTime,
    ) -> Transition {
        self.round_name = round_name;
        self.round_details = round_details;
        self.attachments = attachments.unwrap_or_default();
        self.last_updated = now;
        Transition::new(
            AdminActionKind::UpdateRoundInfo,
            format!("Round updated: {}", self.round_name),
        )
    }

    /// Replace the queued round.
    pub fn set_next_round(
        &mut self,
        name: String,
        details: String,
        attachments: Option<Vec<AttachmentEntity>>,
        timer: Option<u64>,
        now: SystemTime,
    ) -> Transition {
        self.next_round.name = name;
        self.next_round.details = details;
        self.next_round.attachments = attachments.unwrap_or_default();
        if let Some(timer) = timer {
            self.next_round.timer = timer;
        }
        self.last_updated = now;
        Transition::new(
            AdminActionKind::UpdateNextRound,
            format!("Next round updated: {}", self.next_round.name),
        )
    }

    /// Edit the live round; a new timer budget restarts a running round.
    pub fn update_current_round(&mut self, patch: CurrentRoundPatch, now: SystemTime) -> Transition {
        if let Some(name) = patch.round_name.filter(|name| !name.is_empty()) {
            self.round_name = name;
        }
        if let Some(details) = patch.round_details.filter(|details| !details.is_empty()) {
            self.round_details = details;
        }
        if let Some(attachments) = patch.attachments {
            self.attachments = attachments;
        }
        if let Some(timer) = patch
            .current_timer
            .filter(|timer| *timer > 0 && *timer != self.current_timer)
        {
            self.current_timer = timer;
            self.restamp_round(now);
        }
        self.last_updated = now;
        Transition::new(
            AdminActionKind::UpdateCurrentRound,
            format!("Current round updated: {}", self.round_name),
        )
    }

    /// Set both timer budgets, restarting a running round.
    pub fn set_timers(&mut self, current_timer: u64, next_timer: u64, now: SystemTime) -> Transition {
        self.current_timer = current_timer;
        self.next_timer = next_timer;
        self.restamp_round(now);
        self.last_updated = now;
        Transition::new(
            AdminActionKind::SetTimers,
            format!("Timers set: {current_timer}s current, {next_timer}s next"),
        )
    }

    /// Overwrite the countdown as submitted by the operator.
    ///
    /// The first activation stamps the anchor and freezes `original_duration`;
    /// later submissions only toggle pause and update the static fields.
    pub fn set_countdown(
        &mut self,
        input: CountdownInput,
        now: SystemTime,
    ) -> Result<Transition, TransitionError> {
        if input.is_active && self.current_round_started() {
            return Err(self.invalid("arm the countdown"));
        }

        let previous = self.countdown.clone();
        self.countdown.budget = input.budget;
        if !input.is_active {
            self.countdown.disarm();
            if self.status == GameStatus::Countdown {
                self.status = GameStatus::Waiting;
            }
        } else {
            let needs_arming = !previous.is_active || previous.start_time.is_none();
            if needs_arming {
                if let Err(err) = self.arm_countdown(now) {
                    self.countdown = previous;
                    return Err(err);
                }
            }
            match (self.countdown.is_paused, input.is_paused) {
                (false, true) => self.pause_countdown_at(now),
                (true, false) => self.resume_countdown_at(now),
                _ => {}
            }
            self.status = GameStatus::Countdown;
        }
        self.last_updated = now;

        let CountdownBreakdown {
            days,
            hours,
            minutes,
            seconds,
        } = input.budget;
        Ok(Transition::new(
            AdminActionKind::SetCountdown,
            format!("Countdown set: {days}:{hours}:{minutes}:{seconds}"),
        ))
    }

    /// Partial settings replacement.
    ///
    /// The round anchor is normalised afterwards so it is present exactly while
    /// a round is active or paused.
    pub fn replace_settings(
        &mut self,
        patch: SettingsPatch,
        now: SystemTime,
    ) -> Result<Transition, TransitionError> {
        if patch.current_round == Some(0) {
            return Err(TransitionError::InvalidInput(
                "currentRound must be at least 1".into(),
            ));
        }
        if patch.total_rounds == Some(0) {
            return Err(TransitionError::InvalidInput(
                "totalRounds must be at least 1".into(),
            ));
        }

        if let Some(value) = patch.round_name {
            self.round_name = value;
        }
        if let Some(value) = patch.round_details {
            self.round_details = value;
        }
        if let Some(value) = patch.attachments {
            self.attachments = value;
        }
        if let Some(value) = patch.current_timer {
            self.current_timer = value;
        }
        if let Some(value) = patch.next_timer {
            self.next_timer = value;
        }
        if let Some(value) = patch.next_round {
            self.next_round = value;
        }
        if let Some(value) = patch.current_round {
            self.current_round = value;
        }
        if let Some(value) = patch.total_rounds {
            self.total_rounds = value;
        }
        if let Some(value) = patch.cooldown_end_time {
            self.cooldown_end_time = Some(value);
        }
        if let Some(value) = patch.status {
            self.status = value;
        }

        match self.status {
            GameStatus::Active => {
                self.round_start_time.get_or_insert(now);
                self.paused_at = None;
            }
            GameStatus::Paused => {
                self.round_start_time.get_or_insert(now);
                self.paused_at.get_or_insert(now);
            }
            _ => {
                self.round_start_time = None;
                self.paused_at = None;
            }
        }
        self.last_updated = now;

        Ok(Transition::new(
            AdminActionKind::UpdateSettings,
            "Game settings updated",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    fn defaults() -> GameDefaults {
        GameDefaults::default()
    }

    fn fresh() -> GameState {
        GameState::initial(&defaults(), at(0))
    }

    fn running(start: u64) -> GameState {
        let mut state = fresh();
        state
            .apply_action(GameAction::StartGame, None, at(start), &defaults())
            .unwrap();
        state
    }

    #[test]
    fn action_keywords_parse() {
        assert_eq!("resume_game".parse::<GameAction>(), Ok(GameAction::ResumeGame));
        assert_eq!(
            "launch".parse::<GameAction>(),
            Err(UnknownAction("launch".into()))
        );
    }

    #[test]
    fn start_game_anchors_the_round() {
        let state = running(10);
        assert_eq!(state.status, GameStatus::Active);
        assert_eq!(state.round_start_time, Some(at(10)));
        assert!(state.is_active());
        assert!(state.current_round_started());
    }

    #[test]
    fn pause_requires_an_active_round() {
        let mut state = fresh();
        let err = state
            .apply_action(GameAction::PauseGame, None, at(1), &defaults())
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: GameStatus::Waiting,
                operation: "pause the game",
            }
        );
        assert_eq!(state, fresh());
    }

    #[test]
    fn resume_shifts_the_anchor_by_the_paused_span() {
        let mut state = running(0);
        state
            .apply_action(GameAction::PauseGame, None, at(100), &defaults())
            .unwrap();
        assert_eq!(state.round_timer(at(150)).reading.remaining, 200);

        state
            .apply_action(GameAction::ResumeGame, None, at(160), &defaults())
            .unwrap();
        assert_eq!(state.round_start_time, Some(at(60)));
        assert_eq!(state.round_timer(at(160)).reading.remaining, 200);
        assert!(state.paused_at.is_none());
    }

    #[test]
    fn expired_round_advances_once() {
        let mut state = running(0);
        let now = at(301);

        let transitions = state.observe(now);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind, AdminActionKind::AutoAdvanceRound);
        let record = transitions[0].archived.as_ref().unwrap();
        assert_eq!(record.round_number, 1);
        assert_eq!(record.status, RoundStatus::Completed);
        assert_eq!(record.end_time, Some(at(300)));

        assert_eq!(state.current_timer, 180);
        assert_eq!(state.round_start_time, Some(now));
        assert_eq!(state.current_round, 2);
        assert_eq!(state.round_timer(now).reading.remaining, 180);

        assert!(state.observe(now).is_empty());
    }

    #[test]
    fn zero_budget_round_never_advances() {
        let mut state = running(0);
        state.current_timer = 0;
        assert!(state.observe(at(10)).is_empty());
        assert_eq!(state.current_round, 1);
    }

    #[test]
    fn countdown_runs_from_its_frozen_duration() {
        let mut state = fresh();
        state.countdown.budget = CountdownBreakdown::from_seconds(3600);
        state
            .apply_action(GameAction::StartCountdown, None, at(0), &defaults())
            .unwrap();
        assert_eq!(state.status, GameStatus::Countdown);
        assert_eq!(state.countdown.original_duration, Some(3600));

        assert!(state.observe(at(1800)).is_empty());
        let view = state.countdown_view(at(1800));
        assert_eq!((view.breakdown.hours, view.breakdown.minutes), (0, 30));
        assert_eq!(view.remaining, 1800);
    }

    #[test]
    fn finished_countdown_waits_for_the_operator() {
        let mut state = fresh();
        state.countdown.budget = CountdownBreakdown::from_seconds(60);
        state
            .apply_action(GameAction::StartCountdown, None, at(0), &defaults())
            .unwrap();

        let transitions = state.observe(at(61));
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].kind, AdminActionKind::CountdownFinished);
        assert_eq!(state.status, GameStatus::CountdownFinished);
        assert!(state.countdown_finished());
        assert!(!state.countdown.is_active);
        assert!(state.round_start_time.is_none());

        let view = state.countdown_view(at(70));
        assert!(view.finished);
        assert_eq!(view.remaining, 0);
        assert!(state.observe(at(70)).is_empty());
    }

    #[test]
    fn paused_countdown_keeps_its_remainder() {
        let mut state = fresh();
        state.countdown.budget = CountdownBreakdown::from_seconds(600);
        state
            .apply_action(GameAction::StartCountdown, None, at(0), &defaults())
            .unwrap();
        state
            .apply_action(GameAction::PauseCountdown, None, at(100), &defaults())
            .unwrap();
        assert_eq!(state.countdown.budget.total_seconds(), 500);
        assert_eq!(state.countdown_view(at(400)).remaining, 500);

        state
            .apply_action(GameAction::StartCountdown, None, at(400), &defaults())
            .unwrap();
        assert_eq!(state.countdown.original_duration, Some(600));
        assert_eq!(state.countdown_view(at(450)).remaining, 450);
    }

    #[test]
    fn reset_countdown_restores_the_armed_budget() {
        let mut state = fresh();
        state.countdown.budget = CountdownBreakdown::from_seconds(600);
        state
            .apply_action(GameAction::StartCountdown, None, at(0), &defaults())
            .unwrap();
        state
            .apply_action(GameAction::PauseCountdown, None, at(100), &defaults())
            .unwrap();
        state
            .apply_action(GameAction::ResetCountdown, None, at(120), &defaults())
            .unwrap();

        assert_eq!(state.status, GameStatus::Waiting);
        assert!(!state.countdown.is_active);
        assert!(state.countdown.start_time.is_none());
        assert!(state.countdown.original_duration.is_none());
        assert_eq!(state.countdown.budget.total_seconds(), 600);
    }

    #[test]
    fn countdown_cannot_be_armed_during_a_round() {
        let mut state = running(0);
        let input = CountdownInput {
            budget: CountdownBreakdown::from_seconds(60),
            is_active: true,
            is_paused: false,
        };
        assert!(matches!(
            state.set_countdown(input, at(5)),
            Err(TransitionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            state.apply_action(GameAction::StartCountdown, None, at(5), &defaults()),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn set_countdown_freezes_duration_on_first_activation() {
        let mut state = fresh();
        let mut input = CountdownInput {
            budget: CountdownBreakdown {
                days: 0,
                hours: 1,
                minutes: 0,
                seconds: 0,
            },
            is_active: true,
            is_paused: false,
        };
        let transition = state.set_countdown(input, at(0)).unwrap();
        assert_eq!(transition.details, "Countdown set: 0:1:0:0");
        assert_eq!(state.countdown.start_time, Some(at(0)));
        assert_eq!(state.countdown.original_duration, Some(3600));

        input.budget = CountdownBreakdown::from_seconds(10);
        state.set_countdown(input, at(100)).unwrap();
        assert_eq!(state.countdown.original_duration, Some(3600));
        assert_eq!(state.countdown_view(at(100)).remaining, 3500);
    }

    #[test]
    fn empty_countdown_cannot_be_armed() {
        let mut state = fresh();
        let input = CountdownInput {
            budget: CountdownBreakdown::default(),
            is_active: true,
            is_paused: false,
        };
        assert!(matches!(
            state.set_countdown(input, at(0)),
            Err(TransitionError::InvalidInput(_))
        ));
        assert_eq!(state.countdown, fresh().countdown);
    }

    #[test]
    fn end_game_restores_defaults_from_any_state() {
        let mut state = running(0);
        state.round_name = "Reactor".into();
        state.current_round = 3;
        state.current_timer = 42;
        state.version = 9;

        let transition = state
            .apply_action(GameAction::EndGame, None, at(30), &defaults())
            .unwrap();
        assert_eq!(transition.kind, AdminActionKind::EndGame);
        assert_eq!(transition.details, "Game action: end_game");
        assert_eq!(
            transition.archived.as_ref().map(|record| record.status),
            Some(RoundStatus::Cancelled)
        );

        assert_eq!(state.round_name, "Mission Alpha");
        assert_eq!(state.current_round, 1);
        assert_eq!(state.current_timer, 300);
        assert_eq!(state.status, GameStatus::Waiting);
        assert_eq!(state.version, 9);

        let mut idle = fresh();
        let transition = idle
            .apply_action(GameAction::EndGame, Some("wrap up".into()), at(5), &defaults())
            .unwrap();
        assert!(transition.archived.is_none());
        assert_eq!(transition.details, "wrap up");
        assert_eq!(idle.round_name, "Mission Alpha");
    }

    #[test]
    fn reset_game_archives_the_interrupted_round() {
        let mut state = running(0);
        state.current_round = 2;
        let transition = state
            .apply_action(GameAction::ResetGame, None, at(50), &defaults())
            .unwrap();

        let record = transition.archived.unwrap();
        assert_eq!(record.status, RoundStatus::Incomplete);
        assert_eq!(record.round_number, 2);
        assert_eq!(state.current_round, 1);
        assert!(state.round_start_time.is_none());
        assert_eq!(state.status, GameStatus::Waiting);
    }

    #[test]
    fn promotion_advances_exactly_one_round() {
        let mut state = running(0);
        state.next_round = NextRound {
            name: "Reactor".into(),
            details: "Fix it".into(),
            attachments: Vec::new(),
            timer: 240,
        };

        let transition = state
            .promote_next_round(PromotionVariant::AtNaturalEnd, at(500), &defaults())
            .unwrap();
        assert_eq!(transition.kind, AdminActionKind::StartNextRound);
        assert_eq!(transition.details, "Started round 2: Reactor");
        let record = transition.archived.unwrap();
        assert_eq!(record.round_number, 1);
        assert_eq!(record.start_time, at(200));
        assert_eq!(record.end_time, Some(at(500)));

        assert_eq!(state.current_round, 2);
        assert_eq!(state.round_name, "Reactor");
        assert_eq!(state.current_timer, 240);
        assert_eq!(state.round_start_time, Some(at(500)));
        assert_eq!(state.next_round, NextRound::placeholder(&defaults()));
    }

    #[test]
    fn early_promotion_archives_from_the_stored_anchor() {
        let mut state = running(40);
        state.next_round.timer = 0;
        let transition = state
            .promote_next_round(PromotionVariant::Early, at(100), &defaults())
            .unwrap();

        assert_eq!(transition.kind, AdminActionKind::StartNextRoundEarly);
        assert_eq!(transition.archived.unwrap().start_time, at(40));
        assert_eq!(state.current_timer, 180);
        assert_eq!(state.current_round, 2);
    }

    #[test]
    fn round_counter_at_its_ceiling_is_not_wrapped() {
        let mut state = running(0);
        state.current_round = u32::MAX;

        let err = state
            .promote_next_round(PromotionVariant::Early, at(100), &defaults())
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidInput(_)));
        assert_eq!(state.current_round, u32::MAX);
        assert_eq!(state.round_start_time, Some(at(0)));

        assert!(state.observe(at(10_000)).is_empty());
        assert_eq!(state.current_round, u32::MAX);
    }

    #[test]
    fn timer_change_restarts_only_a_running_round() {
        let mut idle = fresh();
        idle.set_timers(120, 60, at(5));
        assert!(idle.round_start_time.is_none());

        let mut state = running(0);
        state.update_current_round(
            CurrentRoundPatch {
                current_timer: Some(300),
                ..Default::default()
            },
            at(30),
        );
        assert_eq!(state.round_start_time, Some(at(0)));

        state.update_current_round(
            CurrentRoundPatch {
                current_timer: Some(600),
                round_name: Some(String::new()),
                ..Default::default()
            },
            at(40),
        );
        assert_eq!(state.round_start_time, Some(at(40)));
        assert_eq!(state.round_name, "Mission Alpha");
    }

    #[test]
    fn settings_replacement_normalises_the_anchor() {
        let mut state = fresh();
        state
            .replace_settings(
                SettingsPatch {
                    status: Some(GameStatus::Active),
                    ..Default::default()
                },
                at(9),
            )
            .unwrap();
        assert_eq!(state.round_start_time, Some(at(9)));

        state
            .replace_settings(
                SettingsPatch {
                    status: Some(GameStatus::Ended),
                    ..Default::default()
                },
                at(10),
            )
            .unwrap();
        assert!(state.round_start_time.is_none());

        assert!(matches!(
            state.replace_settings(
                SettingsPatch {
                    current_round: Some(0),
                    ..Default::default()
                },
                at(11),
            ),
            Err(TransitionError::InvalidInput(_))
        ));
    }
}
