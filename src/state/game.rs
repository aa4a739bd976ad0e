use std::time::SystemTime;

use crate::{
    config::GameDefaults,
    dao::models::{AttachmentEntity, CountdownEntity, GameStateEntity, GameStatus, NextRoundEntity},
    state::timer::{CountdownBreakdown, TimerReading, remaining_seconds},
};

/// Pre-game countdown budget with its anchors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Countdown {
    /// Static value shown while the countdown is not running.
    pub budget: CountdownBreakdown,
    /// Countdown is armed.
    pub is_active: bool,
    /// Countdown is frozen.
    pub is_paused: bool,
    /// Anchor of the running countdown, shifted forward on resume.
    pub start_time: Option<SystemTime>,
    /// Instant the countdown was frozen.
    pub paused_at: Option<SystemTime>,
    /// Total seconds captured once when the countdown was armed.
    pub original_duration: Option<u64>,
}

impl Countdown {
    /// True when the remaining value must be derived from the anchor.
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused && self.start_time.is_some()
    }

    /// Remaining seconds at `now`.
    ///
    /// A running countdown derives from `original_duration` and `start_time`;
    /// otherwise the static fields are authoritative.
    pub fn remaining(&self, now: SystemTime) -> u64 {
        if self.is_running() {
            let budget = self
                .original_duration
                .unwrap_or_else(|| self.budget.total_seconds());
            remaining_seconds(budget, self.start_time, now)
        } else {
            self.budget.total_seconds()
        }
    }

    /// Drop every anchor and deactivate, keeping the static budget.
    pub fn disarm(&mut self) {
        self.is_active = false;
        self.is_paused = false;
        self.start_time = None;
        self.paused_at = None;
        self.original_duration = None;
    }
}

/// Round queued for promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRound {
    /// Display name.
    pub name: String,
    /// Briefing text.
    pub details: String,
    /// Files and links shown with the round.
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget (seconds); zero falls back to `next_timer` on promotion.
    pub timer: u64,
}

impl NextRound {
    /// Placeholder content used after a promotion and on a fresh game.
    pub fn placeholder(defaults: &GameDefaults) -> Self {
        Self {
            name: defaults.next_round_name.clone(),
            details: defaults.next_round_details.clone(),
            attachments: Vec::new(),
            timer: defaults.next_round_timer,
        }
    }
}

/// Runtime representation of the singleton game state record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Version of the stored record this value was read from (0 when never stored).
    pub version: u64,
    /// Display name of the live round.
    pub round_name: String,
    /// Briefing text of the live round.
    pub round_details: String,
    /// Files and links shown with the live round.
    pub attachments: Vec<AttachmentEntity>,
    /// Timer budget (seconds) of the current round.
    pub current_timer: u64,
    /// Timer budget (seconds) a naturally expired round continues with.
    pub next_timer: u64,
    /// Anchor of the running round; `Some` exactly while active or paused.
    pub round_start_time: Option<SystemTime>,
    /// Instant the round was paused.
    pub paused_at: Option<SystemTime>,
    /// Optional cooldown deadline shown between rounds.
    pub cooldown_end_time: Option<SystemTime>,
    /// Pre-game countdown.
    pub countdown: Countdown,
    /// Round queued for promotion.
    pub next_round: NextRound,
    /// 1-based round counter.
    pub current_round: u32,
    /// Planned number of rounds; informational only.
    pub total_rounds: u32,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Creation time of the stored record.
    pub created_at: SystemTime,
    /// Time of the last mutation.
    pub last_updated: SystemTime,
}

/// Derived round timer as seen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTimerView {
    /// Remaining time and its breakdown.
    pub reading: TimerReading,
    /// True while the round timer is actually counting down.
    pub is_round_active: bool,
}

/// Derived countdown as seen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownView {
    /// Remaining time split into days, hours, minutes and seconds.
    pub breakdown: CountdownBreakdown,
    /// Remaining seconds.
    pub remaining: u64,
    /// Countdown is armed.
    pub is_active: bool,
    /// Countdown is frozen.
    pub is_paused: bool,
    /// Countdown ran out.
    pub finished: bool,
}

impl GameState {
    /// Fresh state used on first read and restored by `end_game`.
    pub fn initial(defaults: &GameDefaults, now: SystemTime) -> Self {
        Self {
            version: 0,
            round_name: defaults.round_name.clone(),
            round_details: defaults.round_details.clone(),
            attachments: Vec::new(),
            current_timer: defaults.current_timer,
            next_timer: defaults.next_timer,
            round_start_time: None,
            paused_at: None,
            cooldown_end_time: None,
            countdown: Countdown::default(),
            next_round: NextRound::placeholder(defaults),
            current_round: 1,
            total_rounds: defaults.total_rounds,
            status: GameStatus::Waiting,
            created_at: now,
            last_updated: now,
        }
    }

    /// Mirrors `gameStatus == active`.
    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// A round has been started and not yet reset or ended.
    pub fn current_round_started(&self) -> bool {
        matches!(self.status, GameStatus::Active | GameStatus::Paused)
    }

    /// Mirrors `gameStatus == countdown_finished`.
    pub fn countdown_finished(&self) -> bool {
        self.status == GameStatus::CountdownFinished
    }

    /// Round timer remaining at `now`; a paused round reads as of the pause instant.
    pub fn round_timer(&self, now: SystemTime) -> RoundTimerView {
        match (self.status, self.round_start_time) {
            (GameStatus::Active, Some(start)) => RoundTimerView {
                reading: TimerReading::new(remaining_seconds(self.current_timer, Some(start), now)),
                is_round_active: true,
            },
            (GameStatus::Paused, Some(start)) => {
                let frozen_at = self.paused_at.unwrap_or(now);
                RoundTimerView {
                    reading: TimerReading::new(remaining_seconds(
                        self.current_timer,
                        Some(start),
                        frozen_at,
                    )),
                    is_round_active: false,
                }
            }
            _ => RoundTimerView {
                reading: TimerReading::new(self.current_timer),
                is_round_active: false,
            },
        }
    }

    /// Countdown remaining at `now`.
    pub fn countdown_view(&self, now: SystemTime) -> CountdownView {
        let countdown = &self.countdown;
        if countdown.is_running() {
            let remaining = countdown.remaining(now);
            CountdownView {
                breakdown: CountdownBreakdown::from_seconds(remaining),
                remaining,
                is_active: countdown.is_active,
                is_paused: countdown.is_paused,
                finished: remaining == 0,
            }
        } else {
            CountdownView {
                breakdown: countdown.budget,
                remaining: countdown.budget.total_seconds(),
                is_active: countdown.is_active,
                is_paused: countdown.is_paused,
                finished: self.countdown_finished(),
            }
        }
    }
}

impl From<CountdownEntity> for Countdown {
    fn from(value: CountdownEntity) -> Self {
        Self {
            budget: CountdownBreakdown {
                days: value.days,
                hours: value.hours,
                minutes: value.minutes,
                seconds: value.seconds,
            },
            is_active: value.is_active,
            is_paused: value.is_paused,
            start_time: value.start_time,
            paused_at: value.paused_at,
            original_duration: value.original_duration,
        }
    }
}

impl From<Countdown> for CountdownEntity {
    fn from(value: Countdown) -> Self {
        Self {
            days: value.budget.days,
            hours: value.budget.hours,
            minutes: value.budget.minutes,
            seconds: value.budget.seconds,
            is_active: value.is_active,
            is_paused: value.is_paused,
            start_time: value.start_time,
            paused_at: value.paused_at,
            original_duration: value.original_duration,
        }
    }
}

impl From<NextRoundEntity> for NextRound {
    fn from(value: NextRoundEntity) -> Self {
        Self {
            name: value.name,
            details: value.details,
            attachments: value.attachments,
            timer: value.timer,
        }
    }
}

impl From<NextRound> for NextRoundEntity {
    fn from(value: NextRound) -> Self {
        Self {
            name: value.name,
            details: value.details,
            attachments: value.attachments,
            timer: value.timer,
        }
    }
}

impl From<GameStateEntity> for GameState {
    fn from(value: GameStateEntity) -> Self {
        Self {
            version: value.version,
            round_name: value.round_name,
            round_details: value.round_details,
            attachments: value.attachments,
            current_timer: value.current_timer,
            next_timer: value.next_timer,
            round_start_time: value.round_start_time,
            paused_at: value.paused_at,
            cooldown_end_time: value.cooldown_end_time,
            countdown: value.pre_game_countdown.into(),
            next_round: value.next_round.into(),
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            status: value.game_status,
            created_at: value.created_at,
            last_updated: value.last_updated,
        }
    }
}

impl From<GameState> for GameStateEntity {
    fn from(value: GameState) -> Self {
        Self {
            version: value.version,
            round_name: value.round_name,
            round_details: value.round_details,
            attachments: value.attachments,
            current_timer: value.current_timer,
            next_timer: value.next_timer,
            round_start_time: value.round_start_time,
            paused_at: value.paused_at,
            cooldown_end_time: value.cooldown_end_time,
            pre_game_countdown: value.countdown.into(),
            next_round: value.next_round.into(),
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            game_status: value.status,
            created_at: value.created_at,
            last_updated: value.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs)
    }

    #[test]
    fn initial_state_uses_defaults() {
        let state = GameState::initial(&GameDefaults::default(), at(0));
        assert_eq!(state.round_name, "Mission Alpha");
        assert_eq!(state.current_round, 1);
        assert_eq!(state.status, GameStatus::Waiting);
        assert_eq!(state.next_round.name, "Mission Beta");
        assert!(state.round_start_time.is_none());
        assert!(!state.current_round_started());
    }

    #[test]
    fn waiting_round_timer_reports_full_budget() {
        let state = GameState::initial(&GameDefaults::default(), at(0));
        let view = state.round_timer(at(1_000));
        assert_eq!(view.reading.remaining, 300);
        assert!(!view.is_round_active);
    }

    #[test]
    fn paused_round_timer_is_frozen_at_pause_instant() {
        let mut state = GameState::initial(&GameDefaults::default(), at(0));
        state.status = GameStatus::Paused;
        state.round_start_time = Some(at(0));
        state.paused_at = Some(at(100));

        assert_eq!(state.round_timer(at(100)).reading.remaining, 200);
        assert_eq!(state.round_timer(at(250)).reading.remaining, 200);
    }

    #[test]
    fn running_countdown_derives_from_original_duration() {
        let mut state = GameState::initial(&GameDefaults::default(), at(0));
        state.countdown = Countdown {
            budget: CountdownBreakdown::from_seconds(3600),
            is_active: true,
            is_paused: false,
            start_time: Some(at(0)),
            paused_at: None,
            original_duration: Some(3600),
        };

        let view = state.countdown_view(at(1800));
        assert_eq!(view.remaining, 1800);
        assert_eq!(
            view.breakdown,
            CountdownBreakdown {
                days: 0,
                hours: 0,
                minutes: 30,
                seconds: 0
            }
        );
        assert!(!view.finished);
    }

    #[test]
    fn entity_conversion_preserves_fields() {
        let mut state = GameState::initial(&GameDefaults::default(), at(0));
        state.version = 7;
        state.round_start_time = Some(at(5));
        state.status = GameStatus::Active;

        let entity: GameStateEntity = state.clone().into();
        assert_eq!(entity.version, 7);
        assert_eq!(entity.game_status, GameStatus::Active);
        assert_eq!(GameState::from(entity), state);
    }
}
