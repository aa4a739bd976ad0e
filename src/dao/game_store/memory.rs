//! Process-local [`GameStore`] used by tests and by `STORAGE_BACKEND=memory`.
//!
//! One lock guards every collection, so a commit (state write plus its log
//! records) is observed atomically by concurrent readers.

use std::{collections::BTreeMap, sync::Arc, time::SystemTime};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    game_store::GameStore,
    models::{
        AdminActionEntity, GameCommit, GameStateEntity, ParticipantEntity, ParticipantStatsEntity,
        ParticipantStatus, RoundHistoryEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Game store kept entirely in memory; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    game_state: Option<GameStateEntity>,
    round_history: Vec<RoundHistoryEntity>,
    admin_actions: Vec<AdminActionEntity>,
    /// Keyed by roll number so listings come out sorted.
    participants: BTreeMap<String, ParticipantEntity>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T: Clone>(items: &[T], limit: i64) -> Vec<T> {
    let limit = usize::try_from(limit).unwrap_or(0);
    items.iter().rev().take(limit).cloned().collect()
}

impl GameStore for MemoryGameStore {
    fn load_game_state(&self) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.game_state.clone()) })
    }

    fn commit(&self, commit: GameCommit) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let found = guard.game_state.as_ref().map(|state| state.version);
            if found != commit.expected_version {
                return Err(StorageError::Conflict {
                    expected: commit.expected_version,
                    found,
                });
            }
            guard.game_state = Some(commit.state);
            guard.round_history.extend(commit.history);
            guard.admin_actions.extend(commit.actions);
            Ok(())
        })
    }

    fn list_round_history(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RoundHistoryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(newest_first(&inner.read().await.round_history, limit)) })
    }

    fn append_admin_action(
        &self,
        action: AdminActionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.admin_actions.push(action);
            Ok(())
        })
    }

    fn list_admin_actions(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AdminActionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(newest_first(&inner.read().await.admin_actions, limit)) })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            if guard.participants.contains_key(&participant.roll_number) {
                return Err(StorageError::Duplicate {
                    field: "rollNumber",
                    value: participant.roll_number,
                });
            }
            if guard
                .participants
                .values()
                .any(|existing| existing.email == participant.email)
            {
                return Err(StorageError::Duplicate {
                    field: "email",
                    value: participant.email,
                });
            }
            guard
                .participants
                .insert(participant.roll_number.clone(), participant);
            Ok(())
        })
    }

    fn find_participant(
        &self,
        roll_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.participants.get(&roll_number).cloned()) })
    }

    fn find_participant_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .participants
                .values()
                .find(|participant| participant.email == email)
                .cloned())
        })
    }

    fn list_participants(
        &self,
        status: Option<ParticipantStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .participants
                .values()
                .filter(|participant| status.is_none_or(|status| participant.status == status))
                .cloned()
                .collect())
        })
    }

    fn delete_participant(&self, roll_number: String) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.participants.remove(&roll_number).is_some()) })
    }

    fn eliminate_participant(
        &self,
        roll_number: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let Some(participant) = guard.participants.get_mut(&roll_number) else {
                return Ok(false);
            };
            participant.status = ParticipantStatus::Eliminated;
            participant.eliminated_at = Some(at);
            participant.last_updated = at;
            Ok(true)
        })
    }

    fn eliminate_team(
        &self,
        team: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let mut modified = 0;
            for participant in guard.participants.values_mut().filter(|participant| {
                participant.status == ParticipantStatus::Alive
                    && participant.team.as_deref() == Some(team.as_str())
            }) {
                participant.status = ParticipantStatus::Eliminated;
                participant.eliminated_at = Some(at);
                participant.last_updated = at;
                modified += 1;
            }
            Ok(modified)
        })
    }

    fn reset_participants(&self, at: SystemTime) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let mut modified = 0;
            for participant in guard
                .participants
                .values_mut()
                .filter(|participant| participant.status == ParticipantStatus::Eliminated)
            {
                participant.status = ParticipantStatus::Alive;
                participant.eliminated_at = None;
                participant.last_updated = at;
                modified += 1;
            }
            Ok(modified)
        })
    }

    fn participant_stats(&self) -> BoxFuture<'static, StorageResult<ParticipantStatsEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            let mut stats = ParticipantStatsEntity::default();
            for participant in guard.participants.values() {
                stats.total += 1;
                match participant.status {
                    ParticipantStatus::Alive => stats.alive += 1,
                    ParticipantStatus::Eliminated => stats.eliminated += 1,
                }
            }
            Ok(stats)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
