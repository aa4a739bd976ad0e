use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::{Bson, DateTime, Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use tracing::debug;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoAdminActionDocument, MongoGameStateDocument, MongoParticipantDocument,
        MongoRoundHistoryDocument, StatusCountDocument, game_state_filter,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{
        AdminActionEntity, GameCommit, GameStateEntity, ParticipantEntity, ParticipantStatsEntity,
        ParticipantStatus, RoundHistoryEntity,
    },
    storage::{StorageError, StorageResult},
};

const GAME_STATE_COLLECTION_NAME: &str = "game_state";
const ROUND_HISTORY_COLLECTION_NAME: &str = "round_history";
const ADMIN_ACTION_COLLECTION_NAME: &str = "admin_actions";
const PARTICIPANT_COLLECTION_NAME: &str = "participants";

fn single_key(field: &str, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(field, value);
    document
}

/// Game store backed by MongoDB, reconnecting in place when asked.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let participants = self.participant_collection().await;
        let indexes = [
            ("roll_number_idx", "roll_number", true),
            ("email_idx", "email", true),
            ("status_idx", "status", false),
            ("team_idx", "team", false),
        ];
        for (name, field, unique) in indexes {
            let model = mongodb::IndexModel::builder()
                .keys(single_key(field, 1))
                .options(
                    IndexOptions::builder()
                        .name(Some(name.to_owned()))
                        .unique(Some(unique))
                        .build(),
                )
                .build();
            participants
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection: PARTICIPANT_COLLECTION_NAME,
                    index: field,
                    source,
                })?;
        }

        let history = self.database().await.collection::<Document>(
            ROUND_HISTORY_COLLECTION_NAME,
        );
        history
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {"created_at": -1})
                    .build(),
            )
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROUND_HISTORY_COLLECTION_NAME,
                index: "created_at",
                source,
            })?;

        let actions = self.database().await.collection::<Document>(
            ADMIN_ACTION_COLLECTION_NAME,
        );
        actions
            .create_index(
                mongodb::IndexModel::builder()
                    .keys(doc! {"timestamp": -1})
                    .build(),
            )
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ADMIN_ACTION_COLLECTION_NAME,
                index: "timestamp",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn game_state_collection(&self) -> Collection<MongoGameStateDocument> {
        self.database()
            .await
            .collection::<MongoGameStateDocument>(GAME_STATE_COLLECTION_NAME)
    }

    async fn history_collection(&self) -> Collection<MongoRoundHistoryDocument> {
        self.database()
            .await
            .collection::<MongoRoundHistoryDocument>(ROUND_HISTORY_COLLECTION_NAME)
    }

    async fn action_collection(&self) -> Collection<MongoAdminActionDocument> {
        self.database()
            .await
            .collection::<MongoAdminActionDocument>(ADMIN_ACTION_COLLECTION_NAME)
    }

    async fn participant_collection(&self) -> Collection<MongoParticipantDocument> {
        self.database()
            .await
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME)
    }

    async fn load_game_state(&self) -> MongoResult<Option<GameStateEntity>> {
        let document = self
            .game_state_collection()
            .await
            .find_one(game_state_filter())
            .await
            .map_err(|source| MongoDaoError::LoadGameState { source })?;
        Ok(document.map(Into::into))
    }

    async fn current_version(&self) -> MongoResult<Option<u64>> {
        Ok(self.load_game_state().await?.map(|state| state.version))
    }

    async fn client(&self) -> Client {
        let guard = self.inner.state.read().await;
        guard.client.clone()
    }

    /// Version-checked write of the singleton together with the log appends.
    ///
    /// All three writes share one transaction: either the new state and every
    /// history and audit record land, or none of them do.
    async fn commit(&self, commit: GameCommit) -> StorageResult<()> {
        let version = commit.state.version;
        let expected_version = commit.expected_version;
        let transaction_err = |stage, source| MongoDaoError::Transaction {
            stage,
            version,
            source,
        };

        let mut session = self
            .client()
            .await
            .start_session()
            .await
            .map_err(|source| transaction_err("start session", source))?;
        session
            .start_transaction()
            .await
            .map_err(|source| transaction_err("start", source))?;

        let outcome = self.write_commit(&mut session, commit).await;
        match outcome {
            Ok(true) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|source| transaction_err("commit", source))?;
                debug!(version, "game state committed");
                Ok(())
            }
            Ok(false) => {
                self.abort(&mut session, version).await;
                Err(StorageError::Conflict {
                    expected: expected_version,
                    found: self.current_version().await?,
                })
            }
            Err(err) => {
                self.abort(&mut session, version).await;
                Err(err.into())
            }
        }
    }

    async fn abort(&self, session: &mut ClientSession, version: u64) {
        if let Err(err) = session.abort_transaction().await {
            debug!(version, error = %err, "game state transaction already closed");
        }
    }

    /// Stage the commit inside `session`; `Ok(false)` means the version check failed.
    async fn write_commit(
        &self,
        session: &mut ClientSession,
        commit: GameCommit,
    ) -> MongoResult<bool> {
        let GameCommit {
            state,
            expected_version,
            history,
            actions,
        } = commit;
        let version = state.version;
        let document: MongoGameStateDocument = state.into();
        let collection = self.game_state_collection().await;

        match expected_version {
            None => {
                if let Err(source) = collection.insert_one(&document).session(&mut *session).await
                {
                    if is_duplicate_key(&source) {
                        return Ok(false);
                    }
                    return Err(MongoDaoError::SaveGameState { version, source });
                }
            }
            Some(expected) => {
                let mut filter = game_state_filter();
                filter.insert("version", i64::try_from(expected).unwrap_or(i64::MAX));
                let result = collection
                    .replace_one(filter, &document)
                    .session(&mut *session)
                    .await
                    .map_err(|source| MongoDaoError::SaveGameState { version, source })?;
                if result.matched_count == 0 {
                    return Ok(false);
                }
            }
        }

        if !history.is_empty() {
            let documents: Vec<MongoRoundHistoryDocument> =
                history.into_iter().map(Into::into).collect();
            self.history_collection()
                .await
                .insert_many(documents)
                .session(&mut *session)
                .await
                .map_err(|source| MongoDaoError::AppendLog {
                    collection: ROUND_HISTORY_COLLECTION_NAME,
                    source,
                })?;
        }

        if !actions.is_empty() {
            let documents: Vec<MongoAdminActionDocument> =
                actions.into_iter().map(Into::into).collect();
            self.action_collection()
                .await
                .insert_many(documents)
                .session(&mut *session)
                .await
                .map_err(|source| MongoDaoError::AppendLog {
                    collection: ADMIN_ACTION_COLLECTION_NAME,
                    source,
                })?;
        }

        Ok(true)
    }

    async fn list_round_history(&self, limit: i64) -> MongoResult<Vec<RoundHistoryEntity>> {
        let map_err = |source| MongoDaoError::ListLog {
            collection: ROUND_HISTORY_COLLECTION_NAME,
            source,
        };
        let documents: Vec<MongoRoundHistoryDocument> = self
            .history_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .limit(limit)
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn append_admin_action(&self, action: AdminActionEntity) -> MongoResult<()> {
        let document: MongoAdminActionDocument = action.into();
        self.action_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendLog {
                collection: ADMIN_ACTION_COLLECTION_NAME,
                source,
            })?;
        Ok(())
    }

    async fn list_admin_actions(&self, limit: i64) -> MongoResult<Vec<AdminActionEntity>> {
        let map_err = |source| MongoDaoError::ListLog {
            collection: ADMIN_ACTION_COLLECTION_NAME,
            source,
        };
        let documents: Vec<MongoAdminActionDocument> = self
            .action_collection()
            .await
            .find(doc! {})
            .sort(doc! {"timestamp": -1})
            .limit(limit)
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_participant(&self, participant: ParticipantEntity) -> StorageResult<()> {
        let roll_number = participant.roll_number.clone();
        let email = participant.email.clone();
        let document: MongoParticipantDocument = participant.into();
        match self
            .participant_collection()
            .await
            .insert_one(&document)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => {
                // The index that fired is only named in the server message.
                let field_is_email = source.to_string().contains("email_idx");
                Err(StorageError::Duplicate {
                    field: if field_is_email { "email" } else { "rollNumber" },
                    value: if field_is_email { email } else { roll_number },
                })
            }
            Err(source) => Err(MongoDaoError::SaveParticipant {
                roll_number,
                source,
            }
            .into()),
        }
    }

    async fn find_participant_by(
        &self,
        field: &str,
        value: String,
    ) -> MongoResult<Option<ParticipantEntity>> {
        let document = self
            .participant_collection()
            .await
            .find_one(single_key(field, value))
            .await
            .map_err(|source| MongoDaoError::LoadParticipants { source })?;
        Ok(document.map(Into::into))
    }

    async fn list_participants(
        &self,
        status: Option<ParticipantStatus>,
    ) -> MongoResult<Vec<ParticipantEntity>> {
        let filter = match status {
            Some(status) => doc! {"status": status.as_str()},
            None => doc! {},
        };
        let documents: Vec<MongoParticipantDocument> = self
            .participant_collection()
            .await
            .find(filter)
            .sort(doc! {"roll_number": 1})
            .await
            .map_err(|source| MongoDaoError::LoadParticipants { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadParticipants { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_participant(&self, roll_number: String) -> MongoResult<bool> {
        let result = self
            .participant_collection()
            .await
            .delete_one(doc! {"roll_number": roll_number})
            .await
            .map_err(|source| MongoDaoError::UpdateParticipants { source })?;
        Ok(result.deleted_count > 0)
    }

    async fn eliminate_participant(&self, roll_number: String, at: SystemTime) -> MongoResult<bool> {
        let at = DateTime::from_system_time(at);
        let result = self
            .participant_collection()
            .await
            .update_one(
                doc! {"roll_number": roll_number},
                doc! {"$set": {
                    "status": ParticipantStatus::Eliminated.as_str(),
                    "eliminated_at": at,
                    "last_updated": at,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateParticipants { source })?;
        Ok(result.matched_count > 0)
    }

    async fn eliminate_team(&self, team: String, at: SystemTime) -> MongoResult<u64> {
        let at = DateTime::from_system_time(at);
        let result = self
            .participant_collection()
            .await
            .update_many(
                doc! {"team": team, "status": ParticipantStatus::Alive.as_str()},
                doc! {"$set": {
                    "status": ParticipantStatus::Eliminated.as_str(),
                    "eliminated_at": at,
                    "last_updated": at,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateParticipants { source })?;
        Ok(result.modified_count)
    }

    async fn reset_participants(&self, at: SystemTime) -> MongoResult<u64> {
        let at = DateTime::from_system_time(at);
        let result = self
            .participant_collection()
            .await
            .update_many(
                doc! {"status": ParticipantStatus::Eliminated.as_str()},
                doc! {"$set": {
                    "status": ParticipantStatus::Alive.as_str(),
                    "eliminated_at": null,
                    "last_updated": at,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateParticipants { source })?;
        Ok(result.modified_count)
    }

    async fn participant_stats(&self) -> MongoResult<ParticipantStatsEntity> {
        let rows: Vec<StatusCountDocument> = self
            .participant_collection()
            .await
            .aggregate([doc! {"$group": {"_id": "$status", "count": {"$sum": 1}}}])
            .with_type::<StatusCountDocument>()
            .await
            .map_err(|source| MongoDaoError::ParticipantStats { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ParticipantStats { source })?;

        let mut stats = ParticipantStatsEntity::default();
        for row in rows {
            let count = u64::try_from(row.count).unwrap_or(0);
            stats.total += count;
            match row.status {
                ParticipantStatus::Alive => stats.alive = count,
                ParticipantStatus::Eliminated => stats.eliminated = count,
            }
        }
        Ok(stats)
    }
}

impl GameStore for MongoGameStore {
    fn load_game_state(&self) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.load_game_state().await.map_err(Into::into) })
    }

    fn commit(&self, commit: GameCommit) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.commit(commit).await })
    }

    fn list_round_history(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<RoundHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_round_history(limit).await.map_err(Into::into) })
    }

    fn append_admin_action(
        &self,
        action: AdminActionEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append_admin_action(action).await.map_err(Into::into) })
    }

    fn list_admin_actions(
        &self,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AdminActionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_admin_actions(limit).await.map_err(Into::into) })
    }

    fn insert_participant(
        &self,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_participant(participant).await })
    }

    fn find_participant(
        &self,
        roll_number: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_participant_by("roll_number", roll_number)
                .await
                .map_err(Into::into)
        })
    }

    fn find_participant_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_participant_by("email", email)
                .await
                .map_err(Into::into)
        })
    }

    fn list_participants(
        &self,
        status: Option<ParticipantStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants(status).await.map_err(Into::into) })
    }

    fn delete_participant(&self, roll_number: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_participant(roll_number).await.map_err(Into::into) })
    }

    fn eliminate_participant(
        &self,
        roll_number: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .eliminate_participant(roll_number, at)
                .await
                .map_err(Into::into)
        })
    }

    fn eliminate_team(
        &self,
        team: String,
        at: SystemTime,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.eliminate_team(team, at).await.map_err(Into::into) })
    }

    fn reset_participants(&self, at: SystemTime) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.reset_participants(at).await.map_err(Into::into) })
    }

    fn participant_stats(&self) -> BoxFuture<'static, StorageResult<ParticipantStatsEntity>> {
        let store = self.clone();
        Box::pin(async move { store.participant_stats().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::GameDefaults,
        dao::models::{AdminActionKind, RoundStatus},
        state::game::GameState,
    };

    /// Needs `MONGO_URI` pointing at a replica set; run with `--ignored`.
    async fn scratch_store() -> Option<MongoGameStore> {
        let uri = std::env::var("MONGO_URI").ok()?;
        let database = format!("mission_control_test_{}", Uuid::new_v4().simple());
        let config = MongoConfig::from_uri(&uri, Some(&database)).await.unwrap();
        Some(MongoGameStore::connect(config).await.unwrap())
    }

    fn archived_round(id: Uuid, now: SystemTime) -> RoundHistoryEntity {
        RoundHistoryEntity {
            id,
            round_number: 1,
            round_name: "Mission Alpha".into(),
            round_details: String::new(),
            duration: 300,
            start_time: now,
            end_time: Some(now),
            attachments: Vec::new(),
            status: RoundStatus::Completed,
            created_at: now,
        }
    }

    #[tokio::test]
    #[ignore = "requires a MongoDB replica set"]
    async fn failed_log_append_rolls_back_the_state_write() {
        let Some(store) = scratch_store().await else {
            return;
        };
        let now = SystemTime::now();
        let mut game = GameState::initial(&GameDefaults::default(), now);
        game.version = 1;
        let taken = Uuid::new_v4();
        store
            .commit(GameCommit {
                state: game.clone().into(),
                expected_version: None,
                history: vec![archived_round(taken, now)],
                actions: Vec::new(),
            })
            .await
            .unwrap();

        game.version = 2;
        game.current_round = 2;
        let err = store
            .commit(GameCommit {
                state: game.clone().into(),
                expected_version: Some(1),
                history: vec![archived_round(taken, now)],
                actions: vec![AdminActionEntity {
                    id: Uuid::new_v4(),
                    action: AdminActionKind::StartNextRound,
                    details: "Started round 2".into(),
                    timestamp: now,
                    game_state: Some(game.into()),
                }],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));

        let stored = store.load_game_state().await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.current_round, 1);
        assert!(store.list_admin_actions(50).await.unwrap().is_empty());
        assert_eq!(store.list_round_history(50).await.unwrap().len(), 1);

        store.database().await.drop().await.unwrap();
    }
}
