/// In-process store used for tests and single-node runs.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::time::SystemTime;

use crate::dao::models::{
    AdminActionEntity, GameCommit, GameStateEntity, ParticipantEntity, ParticipantStatsEntity,
    ParticipantStatus, RoundHistoryEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the document store holding the game state, its logs and the roster.
pub trait GameStore: Send + Sync {
    /// Read the singleton game state record, if one was ever written.
    fn load_game_state(&self) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;
    /// Write the game state (version checked) and append the produced log records.
    fn commit(&self, commit: GameCommit) -> BoxFuture<'static, StorageResult<()>>;
    /// Newest-first round history.
    fn list_round_history(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RoundHistoryEntity>>>;
    /// Append an audit record that carries no game state write.
    fn append_admin_action(
        &self,
        action: AdminActionEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Newest-first audit log.
    fn list_admin_actions(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AdminActionEntity>>>;

    /// Insert a participant; fails with `Duplicate` on a taken roll number or email.
    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a participant up by roll number.
    fn find_participant(
        &self,
        roll_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Look a participant up by (lowercased) email.
    fn find_participant_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>>;
    /// Participants sorted by roll number, optionally filtered by status.
    fn list_participants(
        &self,
        status: Option<ParticipantStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Remove a participant; `false` when the roll number is unknown.
    fn delete_participant(&self, roll_number: String) -> BoxFuture<'static, StorageResult<bool>>;
    /// Mark one participant eliminated; `false` when the roll number is unknown.
    fn eliminate_participant(
        &self,
        roll_number: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Eliminate every alive member of `team`, returning how many changed.
    fn eliminate_team(&self, team: String, at: SystemTime)
    -> BoxFuture<'static, StorageResult<u64>>;
    /// Bring every eliminated participant back, returning how many changed.
    fn reset_participants(&self, at: SystemTime) -> BoxFuture<'static, StorageResult<u64>>;
    /// Head counts per participant status.
    fn participant_stats(&self) -> BoxFuture<'static, StorageResult<ParticipantStatsEntity>>;

    /// Cheap round trip proving the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
