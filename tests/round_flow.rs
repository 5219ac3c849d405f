//! End-to-end round lifecycle tests against the in-memory store.

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::time::sleep;
use uuid::Uuid;

use storyfold_back::{
    config::AppConfig,
    dao::{
        models::{PARTY_SIZE_MAX, PlayerEntity},
        party_store::{PlayerFilter, memory::MemoryPartyStore},
    },
    dto::{
        party::{CreatePartyRequest, JoinPartyRequest},
        player::PronounsDto,
    },
    error::ServiceError,
    services::{party_service, player_service, round_service},
    state::{
        AppState, SharedState,
        lifecycle::{PartyStatus, PlayerStatus},
    },
};

const GRACE: Duration = Duration::from_millis(20);

fn pronouns() -> PronounsDto {
    PronounsDto {
        subjective: "they".into(),
        objective: "them".into(),
    }
}

async fn new_state() -> SharedState {
    let state = AppState::new(AppConfig::with_timings(
        GRACE,
        Duration::from_secs(3_600),
        Duration::from_secs(3_600),
    ));
    state
        .set_party_store(Arc::new(MemoryPartyStore::new()))
        .await;
    state
}

/// Create a party with `n` players and return its id plus the join-ordered
/// player ids.
async fn party_of(state: &SharedState, n: usize) -> (Uuid, Vec<Uuid>) {
    let created = party_service::create_party(
        state,
        CreatePartyRequest {
            player_name: "player-0".into(),
            pronouns: pronouns(),
        },
    )
    .await
    .unwrap();

    for i in 1..n {
        party_service::join_party(
            state,
            JoinPartyRequest {
                party_code: Some(created.party_code.clone()),
                party_id: None,
                player_name: format!("player-{i}"),
                pronouns: pronouns(),
            },
            None,
        )
        .await
        .unwrap();
    }

    let store = state.require_store().await.unwrap();
    let players = store
        .players_for_party(created.party_id, PlayerFilter::Active)
        .await
        .unwrap();
    assert_eq!(players.len(), n);

    (created.party_id, players.iter().map(|p| p.id).collect())
}

async fn party_status(state: &SharedState, party_id: Uuid) -> Option<PartyStatus> {
    let store = state.require_store().await.unwrap();
    store
        .find_party(party_id)
        .await
        .unwrap()
        .map(|p| p.status)
}

async fn wait_for_status(state: &SharedState, party_id: Uuid, status: PartyStatus) {
    for _ in 0..200 {
        if party_status(state, party_id).await == Some(status) {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("party never reached {status:?}");
}

/// Start a round and wait until the assignment engine has built it.
async fn start_and_build(state: &SharedState, party_id: Uuid, entry_count: u32) {
    round_service::start_round(state, party_id, Some(entry_count))
        .await
        .unwrap();
    wait_for_status(state, party_id, PartyStatus::Playing).await;
}

/// Have one player submit every entry of their form.
async fn write_all_entries(state: &SharedState, party_id: Uuid, player_id: Uuid, count: u32) {
    for index in 0..count {
        round_service::submit_entry(
            state,
            party_id,
            player_id,
            index,
            &format!("entry {index} by {player_id}"),
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn scenario_two_players_write_a_full_round() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    start_and_build(&state, party_id, 8).await;

    for player_id in &players {
        let form = round_service::get_form(&state, party_id, *player_id)
            .await
            .unwrap();
        assert_eq!(form.pronouns.len(), 8);
        assert_eq!(form.start_index, 0);
    }

    write_all_entries(&state, party_id, players[0], 8).await;
    let form = round_service::get_form(&state, party_id, players[0])
        .await
        .unwrap();
    assert_eq!(form.start_index, 8);

    write_all_entries(&state, party_id, players[1], 8).await;
    wait_for_status(&state, party_id, PartyStatus::InLobby).await;

    let store = state.require_store().await.unwrap();
    let party = store.find_party(party_id).await.unwrap().unwrap();
    assert_eq!(party.round, 1);

    let results = round_service::results(&state, party_id).await.unwrap();
    assert_eq!(results.round, 1);
    assert_eq!(results.stories.len(), 2);
    assert_eq!(results.stories[0].player_name, "player-0");
    assert_eq!(results.stories[1].player_name, "player-1");
    for story in &results.stories {
        assert_eq!(story.entries.len(), 8);
        assert!(story.entries.iter().all(|e| !e.text.is_empty()));
    }
}

#[tokio::test]
async fn scenario_twelve_players_fill_every_author_slot() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 12).await;

    start_and_build(&state, party_id, 9).await;

    // The persisted round satisfies the round-robin invariant before any
    // text is written: entry j of the story targeted by writer i's form
    // credits writer i.
    let store = state.require_store().await.unwrap();
    let stories = store.stories_for_round(party_id, 1).await.unwrap();
    assert_eq!(stories.len(), 12);
    let by_owner: HashMap<Uuid, usize> = stories
        .iter()
        .enumerate()
        .map(|(i, s)| (s.player_id, i))
        .collect();
    for story in &stories {
        let writer_position = players
            .iter()
            .position(|id| *id == story.player_id)
            .unwrap();
        for (j, target) in story.form.iter().enumerate() {
            let target_story = &stories[by_owner[target]];
            assert_eq!(target_story.entries[j].author_index, writer_position as i32);
        }
    }

    for player_id in &players {
        write_all_entries(&state, party_id, *player_id, 9).await;
    }
    wait_for_status(&state, party_id, PartyStatus::InLobby).await;

    let results = round_service::results(&state, party_id).await.unwrap();
    assert_eq!(results.stories.len(), 12);
    for story in &results.stories {
        assert_eq!(story.entries.len(), 9);
        for entry in &story.entries {
            assert!(!entry.text.is_empty());
            assert_ne!(entry.author_index, -1);
        }
    }
}

#[tokio::test]
async fn scenario_departure_completes_the_round() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    start_and_build(&state, party_id, 3).await;

    write_all_entries(&state, party_id, players[0], 3).await;

    let store = state.require_store().await.unwrap();
    let finished = store.find_player(players[0]).await.unwrap().unwrap();
    assert_eq!(finished.status, PlayerStatus::Done);
    assert_eq!(
        party_status(&state, party_id).await,
        Some(PartyStatus::Playing)
    );

    // The other player walks away; the round has no outstanding writers
    // left and must close without further submissions.
    player_service::leave(&state, party_id, players[1])
        .await
        .unwrap();
    wait_for_status(&state, party_id, PartyStatus::InLobby).await;

    let finished = store.find_player(players[0]).await.unwrap().unwrap();
    assert_eq!(finished.status, PlayerStatus::InLobby);
}

#[tokio::test]
async fn scenario_second_start_conflicts() {
    let state = new_state().await;
    let (party_id, _) = party_of(&state, 2).await;

    round_service::start_round(&state, party_id, Some(4))
        .await
        .unwrap();

    // Still Starting: the build waits out the grace interval.
    let second = round_service::start_round(&state, party_id, Some(4)).await;
    assert!(matches!(second, Err(ServiceError::Conflict(_))));

    wait_for_status(&state, party_id, PartyStatus::Playing).await;
    let third = round_service::start_round(&state, party_id, Some(4)).await;
    assert!(matches!(third, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn scenario_out_of_range_index_mutates_nothing() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    start_and_build(&state, party_id, 4).await;

    let result =
        round_service::submit_entry(&state, party_id, players[0], 4, "past the end").await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let store = state.require_store().await.unwrap();
    let stories = store.stories_for_round(party_id, 1).await.unwrap();
    for story in stories {
        assert!(story.entries.iter().all(|e| e.text.is_empty()));
    }
}

#[tokio::test]
async fn duplicate_submission_keeps_the_first_text() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 3).await;

    start_and_build(&state, party_id, 2).await;

    round_service::submit_entry(&state, party_id, players[0], 0, "the first text")
        .await
        .unwrap();
    let duplicate =
        round_service::submit_entry(&state, party_id, players[0], 0, "the second text").await;
    assert!(matches!(duplicate, Err(ServiceError::EntryAlreadyExists)));

    let store = state.require_store().await.unwrap();
    let writer_story = store
        .find_story(party_id, players[0], 1)
        .await
        .unwrap()
        .unwrap();
    let target_story = store
        .find_story(party_id, writer_story.form[0], 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(target_story.entries[0].text, "the first text");
}

#[tokio::test]
async fn early_end_closes_a_partially_written_round() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    start_and_build(&state, party_id, 4).await;

    // A player who is not done yet cannot close the round.
    let premature = round_service::end_round(&state, party_id, players[0]).await;
    assert!(matches!(premature, Err(ServiceError::Conflict(_))));

    write_all_entries(&state, party_id, players[0], 4).await;
    round_service::end_round(&state, party_id, players[0])
        .await
        .unwrap();
    assert_eq!(
        party_status(&state, party_id).await,
        Some(PartyStatus::Ending)
    );

    wait_for_status(&state, party_id, PartyStatus::InLobby).await;

    let results = round_service::results(&state, party_id).await.unwrap();
    assert_eq!(results.stories.len(), 2);
    let filled: usize = results
        .stories
        .iter()
        .flat_map(|s| &s.entries)
        .filter(|e| !e.text.is_empty())
        .count();
    assert_eq!(filled, 4);
}

#[tokio::test]
async fn entries_are_accepted_while_ending() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    start_and_build(&state, party_id, 4).await;

    write_all_entries(&state, party_id, players[0], 4).await;
    round_service::end_round(&state, party_id, players[0])
        .await
        .unwrap();

    // The grace timer has not fired yet; the slower player can still write.
    round_service::submit_entry(&state, party_id, players[1], 0, "a late entry")
        .await
        .unwrap();

    wait_for_status(&state, party_id, PartyStatus::InLobby).await;
}

#[tokio::test]
async fn form_is_unavailable_while_starting_or_in_lobby() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    let lobby_form = round_service::get_form(&state, party_id, players[0]).await;
    assert!(matches!(lobby_form, Err(ServiceError::Conflict(_))));

    round_service::start_round(&state, party_id, Some(2))
        .await
        .unwrap();
    let starting_form = round_service::get_form(&state, party_id, players[0]).await;
    assert!(matches!(starting_form, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn results_require_a_completed_round() {
    let state = new_state().await;
    let (party_id, _) = party_of(&state, 2).await;

    let early = round_service::results(&state, party_id).await;
    assert!(matches!(early, Err(ServiceError::Conflict(_))));
}

#[tokio::test]
async fn start_requires_two_lobby_players() {
    let state = new_state().await;
    let (party_id, _) = party_of(&state, 1).await;

    let result = round_service::start_round(&state, party_id, None).await;
    assert!(matches!(result, Err(ServiceError::TooFewPlayers)));
}

#[tokio::test]
async fn join_boundary_enforces_names_and_capacity() {
    let state = new_state().await;
    let (party_id, _) = party_of(&state, 2).await;

    let store = state.require_store().await.unwrap();
    let party = store.find_party(party_id).await.unwrap().unwrap();

    let duplicate = party_service::join_party(
        &state,
        JoinPartyRequest {
            party_code: Some(party.code.clone()),
            party_id: None,
            player_name: "player-1".into(),
            pronouns: pronouns(),
        },
        None,
    )
    .await;
    assert!(matches!(duplicate, Err(ServiceError::NameNotAvailable)));

    for i in 2..PARTY_SIZE_MAX {
        party_service::join_party(
            &state,
            JoinPartyRequest {
                party_code: Some(party.code.clone()),
                party_id: None,
                player_name: format!("player-{i}"),
                pronouns: pronouns(),
            },
            None,
        )
        .await
        .unwrap();
    }

    let overflow = party_service::join_party(
        &state,
        JoinPartyRequest {
            party_code: Some(party.code.clone()),
            party_id: None,
            player_name: "one too many".into(),
            pronouns: pronouns(),
        },
        None,
    )
    .await;
    assert!(matches!(overflow, Err(ServiceError::PartyFull)));
}

#[tokio::test]
async fn rejoin_reissues_credentials_without_a_new_player() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    let store = state.require_store().await.unwrap();
    let caller: PlayerEntity = store.find_player(players[0]).await.unwrap().unwrap();
    let party = store.find_party(party_id).await.unwrap().unwrap();

    let rejoined = party_service::join_party(
        &state,
        JoinPartyRequest {
            party_code: Some(party.code.clone()),
            party_id: None,
            player_name: "player-0".into(),
            pronouns: pronouns(),
        },
        Some(caller),
    )
    .await
    .unwrap();
    assert_eq!(rejoined.party_id, party_id);

    let roster = store
        .players_for_party(party_id, PlayerFilter::Active)
        .await
        .unwrap();
    assert_eq!(roster.len(), 2);
}

#[tokio::test]
async fn last_departure_deletes_the_party() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 2).await;

    player_service::leave(&state, party_id, players[0])
        .await
        .unwrap();
    assert!(party_status(&state, party_id).await.is_some());

    player_service::leave(&state, party_id, players[1])
        .await
        .unwrap();
    assert!(party_status(&state, party_id).await.is_none());

    let store = state.require_store().await.unwrap();
    assert!(store.find_player(players[0]).await.unwrap().is_none());
}

#[tokio::test]
async fn status_reports_roster_and_round() {
    let state = new_state().await;
    let (party_id, players) = party_of(&state, 3).await;

    let status = party_service::party_status(&state, party_id, players[2])
        .await
        .unwrap();
    assert_eq!(status.code, PartyStatus::InLobby.code());
    assert_eq!(status.round, 0);
    assert_eq!(status.player_index, 2);
    assert_eq!(status.players.len(), 3);

    start_and_build(&state, party_id, 2).await;

    // A departed player stays on the roster while the round is underway.
    player_service::leave(&state, party_id, players[0])
        .await
        .unwrap();
    let status = party_service::party_status(&state, party_id, players[1])
        .await
        .unwrap();
    assert_eq!(status.players.len(), 3);
    assert_eq!(status.players[0].code, PlayerStatus::Left.code());
    assert_eq!(status.player_index, 1);
}
