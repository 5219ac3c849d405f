use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoPartyDocument, MongoPlayerDocument, MongoStoryDocument, doc_id, uuid_as_binary},
};
use crate::dao::{
    models::{PartyEntity, PlayerEntity, StoryEntity},
    party_store::{PartyStore, PlayerFilter},
    storage::StorageResult,
};
use crate::state::lifecycle::PlayerStatus;

const PARTY_COLLECTION_NAME: &str = "parties";
const PLAYER_COLLECTION_NAME: &str = "players";
const STORY_COLLECTION_NAME: &str = "stories";

/// MongoDB-backed [`PartyStore`].
#[derive(Clone)]
pub struct MongoPartyStore {
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

impl MongoPartyStore {
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
        let database = self.database().await;

        let parties = database.collection::<MongoPartyDocument>(PARTY_COLLECTION_NAME);
        let code_index = IndexModel::builder()
            .keys(doc! { "code": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("party_code_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        parties
            .create_index(code_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PARTY_COLLECTION_NAME,
                index: "code",
                source,
            })?;

        let players = database.collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME);
        let roster_index = IndexModel::builder()
            .keys(doc! { "party_id": 1, "joined": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("player_roster_idx".to_owned()))
                    .build(),
            )
            .build();
        players
            .create_index(roster_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "party_id,joined",
                source,
            })?;

        let stories = database.collection::<MongoStoryDocument>(STORY_COLLECTION_NAME);
        let story_index = IndexModel::builder()
            .keys(doc! { "party_id": 1, "round": 1, "player_id": 1 })
            .options(
                IndexOptions::builder()
                    .name(Some("story_round_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        stories
            .create_index(story_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: STORY_COLLECTION_NAME,
                index: "party_id,round,player_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn parties(&self) -> Collection<MongoPartyDocument> {
        self.database()
            .await
            .collection::<MongoPartyDocument>(PARTY_COLLECTION_NAME)
    }

    async fn players(&self) -> Collection<MongoPlayerDocument> {
        self.database()
            .await
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn stories(&self) -> Collection<MongoStoryDocument> {
        self.database()
            .await
            .collection::<MongoStoryDocument>(STORY_COLLECTION_NAME)
    }
}

fn player_filter_doc(party_id: Uuid, filter: PlayerFilter) -> mongodb::bson::Document {
    let mut document = doc! { "party_id": uuid_as_binary(party_id) };
    match filter {
        PlayerFilter::All => {}
        PlayerFilter::Active => {
            document.insert("status", doc! { "$ne": PlayerStatus::Left.name() });
        }
        PlayerFilter::InLobby => {
            document.insert("status", PlayerStatus::InLobby.name());
        }
        PlayerFilter::ActiveInRound(round) => {
            document.insert("round", i64::from(round));
            document.insert(
                "status",
                doc! { "$in": [PlayerStatus::Playing.name(), PlayerStatus::Done.name()] },
            );
        }
    }
    document
}

impl PartyStore for MongoPartyStore {
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = party.id;
            let document: MongoPartyDocument = party.into();
            store
                .parties()
                .await
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::SaveParty { id, source })?;
            Ok(())
        })
    }

    fn find_party(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .parties()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::LoadParty { source })?;
            Ok(document.map(Into::into))
        })
    }

    fn find_party_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .parties()
                .await
                .find_one(doc! { "code": &code })
                .await
                .map_err(|source| MongoDaoError::LoadParty { source })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = party.id;
            let document: MongoPartyDocument = party.into();
            store
                .parties()
                .await
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveParty { id, source })?;
            Ok(())
        })
    }

    fn delete_party_cascade(&self, party_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .parties()
                .await
                .delete_one(doc_id(party_id))
                .await
                .map_err(|source| MongoDaoError::DeleteParty {
                    id: party_id,
                    source,
                })?;
            store
                .players()
                .await
                .delete_many(doc! { "party_id": uuid_as_binary(party_id) })
                .await
                .map_err(|source| MongoDaoError::DeleteParty {
                    id: party_id,
                    source,
                })?;
            store
                .stories()
                .await
                .delete_many(doc! { "party_id": uuid_as_binary(party_id) })
                .await
                .map_err(|source| MongoDaoError::DeleteParty {
                    id: party_id,
                    source,
                })?;
            Ok(())
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = player.id;
            let document: MongoPlayerDocument = player.into();
            store
                .players()
                .await
                .insert_one(&document)
                .await
                .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .players()
                .await
                .find_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::LoadPlayer { source })?;
            Ok(document.map(Into::into))
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = player.id;
            let document: MongoPlayerDocument = player.into();
            store
                .players()
                .await
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SavePlayer { id, source })?;
            Ok(())
        })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .players()
                .await
                .delete_one(doc_id(id))
                .await
                .map_err(|source| MongoDaoError::DeletePlayer { id, source })?;
            Ok(())
        })
    }

    fn players_for_party(
        &self,
        party_id: Uuid,
        filter: PlayerFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents: Vec<MongoPlayerDocument> = store
                .players()
                .await
                .find(player_filter_doc(party_id, filter))
                .sort(doc! { "joined": 1, "_id": 1 })
                .await
                .map_err(|source| MongoDaoError::ListPlayers { party_id, source })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListPlayers { party_id, source })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
    }

    fn insert_stories(&self, stories: Vec<StoryEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            if stories.is_empty() {
                return Ok(());
            }
            let first_id = stories[0].id;
            let documents: Vec<MongoStoryDocument> =
                stories.into_iter().map(Into::into).collect();
            store
                .stories()
                .await
                .insert_many(&documents)
                .await
                .map_err(|source| MongoDaoError::SaveStory {
                    id: first_id,
                    source,
                })?;
            Ok(())
        })
    }

    fn save_story(&self, story: StoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = story.id;
            let document: MongoStoryDocument = story.into();
            store
                .stories()
                .await
                .replace_one(doc_id(id), &document)
                .upsert(true)
                .await
                .map_err(|source| MongoDaoError::SaveStory { id, source })?;
            Ok(())
        })
    }

    fn find_story(
        &self,
        party_id: Uuid,
        player_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<StoryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document = store
                .stories()
                .await
                .find_one(doc! {
                    "party_id": uuid_as_binary(party_id),
                    "player_id": uuid_as_binary(player_id),
                    "round": i64::from(round),
                })
                .await
                .map_err(|source| MongoDaoError::LoadStory { source })?;
            Ok(document.map(Into::into))
        })
    }

    fn stories_for_round(
        &self,
        party_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<StoryEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let documents: Vec<MongoStoryDocument> = store
                .stories()
                .await
                .find(doc! {
                    "party_id": uuid_as_binary(party_id),
                    "round": i64::from(round),
                })
                .await
                .map_err(|source| MongoDaoError::ListStories { party_id, source })?
                .try_collect()
                .await
                .map_err(|source| MongoDaoError::ListStories { party_id, source })?;
            Ok(documents.into_iter().map(Into::into).collect())
        })
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
