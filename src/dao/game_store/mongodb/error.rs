use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failure talking to MongoDB, tagged with the operation that hit it.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI as configured.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of pings tried.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Indexed field.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading the game state record failed.
    #[error("failed to load the game state")]
    LoadGameState {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Writing the game state record failed.
    #[error("failed to save the game state (version {version})")]
    SaveGameState {
        /// Version being written.
        version: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Opening, committing or closing the commit transaction failed.
    #[error("game state transaction failed to {stage} (version {version})")]
    Transaction {
        /// Transaction step that failed.
        stage: &'static str,
        /// Version being written.
        version: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Appending to a log collection failed.
    #[error("failed to append to `{collection}`")]
    AppendLog {
        /// Collection name.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a log collection failed.
    #[error("failed to list `{collection}`")]
    ListLog {
        /// Collection name.
        collection: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a participant failed.
    #[error("failed to save participant `{roll_number}`")]
    SaveParticipant {
        /// Roll number of the participant.
        roll_number: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading participants failed.
    #[error("failed to load participants")]
    LoadParticipants {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Updating participants failed.
    #[error("failed to update participants")]
    UpdateParticipants {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The statistics aggregation failed.
    #[error("failed to aggregate participant statistics")]
    ParticipantStats {
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// True when the driver reports a unique index violation (E11000).
pub fn is_duplicate_key(err: &MongoError) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}
