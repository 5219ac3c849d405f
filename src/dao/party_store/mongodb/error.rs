use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

use crate::dao::storage::StorageError;

/// Result alias for Mongo DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB party store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The database never answered the bootstrap ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings attempted before giving up.
        attempts: u32,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A routine health probe failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Target collection.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Write of a party document failed.
    #[error("failed to save party `{id}`")]
    SaveParty {
        /// Party identifier.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Read of a party document failed.
    #[error("failed to load party")]
    LoadParty {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Cascade deletion of a party failed.
    #[error("failed to delete party `{id}`")]
    DeleteParty {
        /// Party identifier.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Write of a player document failed.
    #[error("failed to save player `{id}`")]
    SavePlayer {
        /// Player identifier.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Removal of a player document failed.
    #[error("failed to delete player `{id}`")]
    DeletePlayer {
        /// Player identifier.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Read of a player document failed.
    #[error("failed to load player")]
    LoadPlayer {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Roster listing failed.
    #[error("failed to list players of party `{party_id}`")]
    ListPlayers {
        /// Party identifier.
        party_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Write of a story document failed.
    #[error("failed to save story `{id}`")]
    SaveStory {
        /// Story identifier.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Read of a story document failed.
    #[error("failed to load story")]
    LoadStory {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Round story listing failed.
    #[error("failed to list stories of party `{party_id}`")]
    ListStories {
        /// Party identifier.
        party_id: Uuid,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        let message = err.to_string();
        StorageError::unavailable(message, err)
    }
}
