use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{EntryEntity, PartyEntity, PlayerEntity, PronounsEntity, StoryEntity};
use crate::state::lifecycle::{PartyStatus, PlayerStatus};

/// Stored form of a [`PartyEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPartyDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    code: String,
    status: PartyStatus,
    round: i64,
    expiration: DateTime,
}

impl From<PartyEntity> for MongoPartyDocument {
    fn from(value: PartyEntity) -> Self {
        Self {
            id: value.id,
            code: value.code,
            status: value.status,
            round: i64::from(value.round),
            expiration: DateTime::from_system_time(value.expiration),
        }
    }
}

impl From<MongoPartyDocument> for PartyEntity {
    fn from(value: MongoPartyDocument) -> Self {
        Self {
            id: value.id,
            code: value.code,
            status: value.status,
            round: value.round as u32,
            expiration: value.expiration.to_system_time(),
        }
    }
}

/// Stored form of a [`PlayerEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    party_id: Uuid,
    name: String,
    pronouns: PronounsEntity,
    status: PlayerStatus,
    round: i64,
    joined: DateTime,
}

impl From<PlayerEntity> for MongoPlayerDocument {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            party_id: value.party_id,
            name: value.name,
            pronouns: value.pronouns,
            status: value.status,
            round: i64::from(value.round),
            joined: DateTime::from_system_time(value.joined),
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            party_id: value.party_id,
            name: value.name,
            pronouns: value.pronouns,
            status: value.status,
            round: value.round as u32,
            joined: value.joined.to_system_time(),
        }
    }
}

/// Stored form of a [`StoryEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStoryDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    party_id: Uuid,
    player_id: Uuid,
    round: i64,
    pronouns: PronounsEntity,
    entries: Vec<EntryEntity>,
    form: Vec<Uuid>,
}

impl From<StoryEntity> for MongoStoryDocument {
    fn from(value: StoryEntity) -> Self {
        Self {
            id: value.id,
            party_id: value.party_id,
            player_id: value.player_id,
            round: i64::from(value.round),
            pronouns: value.pronouns,
            entries: value.entries,
            form: value.form,
        }
    }
}

impl From<MongoStoryDocument> for StoryEntity {
    fn from(value: MongoStoryDocument) -> Self {
        Self {
            id: value.id,
            party_id: value.party_id,
            player_id: value.player_id,
            round: value.round as u32,
            pronouns: value.pronouns,
            entries: value.entries,
            form: value.form,
        }
    }
}

/// Encode a UUID the way the driver stores `uuid::Uuid` fields.
pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

/// Filter matching a document by `_id`.
pub fn doc_id(id: Uuid) -> Document {
    doc! { "_id": uuid_as_binary(id) }
}
