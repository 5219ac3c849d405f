use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PartyStore, PlayerFilter};
use crate::dao::{
    models::{PartyEntity, PlayerEntity, StoryEntity},
    storage::StorageResult,
};

/// Process-local [`PartyStore`] holding all documents in memory.
///
/// Backs the test suite and the `memory` storage mode. Documents live in
/// insertion-ordered vectors so join-order ties resolve the same way on
/// every read.
#[derive(Clone, Default)]
pub struct MemoryPartyStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    parties: Vec<PartyEntity>,
    players: Vec<PlayerEntity>,
    stories: Vec<StoryEntity>,
}

impl MemoryPartyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PartyStore for MemoryPartyStore {
    fn insert_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.parties.push(party);
            Ok(())
        })
    }

    fn find_party(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard.parties.iter().find(|p| p.id == id).cloned())
        })
    }

    fn find_party_by_code(
        &self,
        code: String,
    ) -> BoxFuture<'static, StorageResult<Option<PartyEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard.parties.iter().find(|p| p.code == code).cloned())
        })
    }

    fn save_party(&self, party: PartyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            match guard.parties.iter_mut().find(|p| p.id == party.id) {
                Some(slot) => *slot = party,
                None => guard.parties.push(party),
            }
            Ok(())
        })
    }

    fn delete_party_cascade(&self, party_id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            guard.parties.retain(|p| p.id != party_id);
            guard.players.retain(|p| p.party_id != party_id);
            guard.stories.retain(|s| s.party_id != party_id);
            Ok(())
        })
    }

    fn insert_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.players.push(player);
            Ok(())
        })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard.players.iter().find(|p| p.id == id).cloned())
        })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            match guard.players.iter_mut().find(|p| p.id == player.id) {
                Some(slot) => *slot = player,
                None => guard.players.push(player),
            }
            Ok(())
        })
    }

    fn delete_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.players.retain(|p| p.id != id);
            Ok(())
        })
    }

    fn players_for_party(
        &self,
        party_id: Uuid,
        filter: PlayerFilter,
    ) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            let mut players: Vec<PlayerEntity> = guard
                .players
                .iter()
                .filter(|p| p.party_id == party_id && filter.matches(p))
                .cloned()
                .collect();
            players.sort_by(|a, b| a.joined.cmp(&b.joined).then(a.id.cmp(&b.id)));
            Ok(players)
        })
    }

    fn insert_stories(&self, stories: Vec<StoryEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.stories.extend(stories);
            Ok(())
        })
    }

    fn save_story(&self, story: StoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            match guard.stories.iter_mut().find(|s| s.id == story.id) {
                Some(slot) => *slot = story,
                None => guard.stories.push(story),
            }
            Ok(())
        })
    }

    fn find_story(
        &self,
        party_id: Uuid,
        player_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Option<StoryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .stories
                .iter()
                .find(|s| s.party_id == party_id && s.player_id == player_id && s.round == round)
                .cloned())
        })
    }

    fn stories_for_round(
        &self,
        party_id: Uuid,
        round: u32,
    ) -> BoxFuture<'static, StorageResult<Vec<StoryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let guard = inner.read().await;
            Ok(guard
                .stories
                .iter()
                .filter(|s| s.party_id == party_id && s.round == round)
                .cloned()
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dao::models::PronounsEntity;
    use crate::state::lifecycle::{PlayerEvent, PlayerStatus};

    fn pronouns() -> PronounsEntity {
        PronounsEntity {
            subjective: "they".into(),
            objective: "them".into(),
        }
    }

    #[tokio::test]
    async fn players_are_join_ordered() {
        let store = MemoryPartyStore::new();
        let party = PartyEntity::new("BCDFGH".into(), Duration::from_secs(60));
        store.insert_party(party.clone()).await.unwrap();

        let mut ids = Vec::new();
        for name in ["a", "b", "c"] {
            let player = PlayerEntity::new(party.id, name.into(), pronouns());
            ids.push(player.id);
            store.insert_player(player).await.unwrap();
        }

        let listed = store
            .players_for_party(party.id, PlayerFilter::Active)
            .await
            .unwrap();
        let listed_ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(listed_ids, ids);
    }

    #[tokio::test]
    async fn filters_select_expected_subsets() {
        let store = MemoryPartyStore::new();
        let party = PartyEntity::new("BCDFGH".into(), Duration::from_secs(60));
        store.insert_party(party.clone()).await.unwrap();

        let mut lobby = PlayerEntity::new(party.id, "lobby".into(), pronouns());
        let mut playing = PlayerEntity::new(party.id, "playing".into(), pronouns());
        playing.status = PlayerStatus::Playing;
        playing.round = 2;
        let mut left = PlayerEntity::new(party.id, "left".into(), pronouns());
        left.status = left.status.transition(PlayerEvent::Leave).unwrap();

        for p in [&lobby, &playing, &left] {
            store.insert_player(p.clone()).await.unwrap();
        }

        let active = store
            .players_for_party(party.id, PlayerFilter::Active)
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        let in_lobby = store
            .players_for_party(party.id, PlayerFilter::InLobby)
            .await
            .unwrap();
        assert_eq!(in_lobby.len(), 1);
        assert_eq!(in_lobby[0].name, "lobby");

        let in_round = store
            .players_for_party(party.id, PlayerFilter::ActiveInRound(2))
            .await
            .unwrap();
        assert_eq!(in_round.len(), 1);
        assert_eq!(in_round[0].name, "playing");

        let all = store
            .players_for_party(party.id, PlayerFilter::All)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        lobby.name = "renamed".into();
        store.save_player(lobby).await.unwrap();
        let all = store
            .players_for_party(party.id, PlayerFilter::All)
            .await
            .unwrap();
        assert!(all.iter().any(|p| p.name == "renamed"));
    }

    #[tokio::test]
    async fn cascade_delete_removes_everything() {
        let store = MemoryPartyStore::new();
        let party = PartyEntity::new("BCDFGH".into(), Duration::from_secs(60));
        let player = PlayerEntity::new(party.id, "a".into(), pronouns());
        let story = StoryEntity {
            id: Uuid::new_v4(),
            party_id: party.id,
            player_id: player.id,
            round: 1,
            pronouns: pronouns(),
            entries: vec![],
            form: vec![],
        };
        store.insert_party(party.clone()).await.unwrap();
        store.insert_player(player.clone()).await.unwrap();
        store.insert_stories(vec![story]).await.unwrap();

        store.delete_party_cascade(party.id).await.unwrap();

        assert!(store.find_party(party.id).await.unwrap().is_none());
        assert!(store.find_player(player.id).await.unwrap().is_none());
        assert!(
            store
                .stories_for_round(party.id, 1)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
