use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use tokio::{sync::oneshot, time::sleep};
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    dao::{
        models::{PartyEntity, PlayerEntity},
        party_store::{PartyStore, PlayerFilter},
    },
    error::ServiceError,
    state::{
        SharedState,
        lifecycle::{PartyEvent, PartyStatus, PlayerEvent, PlayerStatus},
    },
};

/// Registry holding at most one in-flight completion check per party.
///
/// Triggering a check for a party that already has one swaps in a fresh
/// handle, signals the stale check, and waits for it to stop before the
/// replacement runs. The stale check polls its flag after every store read
/// and aborts without writing, so the most recent trigger's view of state
/// decides the transition and at most one `Playing -> Ending` commit can
/// happen per completion.
pub struct RoundWatch {
    checks: DashMap<Uuid, CheckHandle>,
}

struct CheckHandle {
    cancel: Arc<AtomicBool>,
    done: oneshot::Receiver<()>,
}

/// Why a single check run stopped early.
enum CheckAbort {
    /// A newer trigger superseded this check; not an error.
    Cancelled,
    /// The store failed or an invariant broke.
    Failed(ServiceError),
}

impl From<ServiceError> for CheckAbort {
    fn from(err: ServiceError) -> Self {
        CheckAbort::Failed(err)
    }
}

/// Cooperative cancellation flag observed at every suspension point.
struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    fn ensure_live(&self) -> Result<(), CheckAbort> {
        if self.0.load(Ordering::Acquire) {
            Err(CheckAbort::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl RoundWatch {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            checks: DashMap::new(),
        }
    }

    /// Start a completion check for `party_id`, superseding any in-flight one.
    ///
    /// Returns once the stale check (if any) has fully stopped and the
    /// replacement is scheduled; the check itself runs in the background.
    pub async fn trigger(&self, state: SharedState, party_id: Uuid) {
        let cancel = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = oneshot::channel();

        let previous = self.checks.insert(
            party_id,
            CheckHandle {
                cancel: cancel.clone(),
                done: done_rx,
            },
        );

        if let Some(previous) = previous {
            previous.cancel.store(true, Ordering::Release);
            // A dropped sender also counts as terminated.
            let _ = previous.done.await;
        }

        tokio::spawn(async move {
            let flag = CancelFlag(cancel);
            match run_check(&state, party_id, &flag).await {
                Ok(()) => {}
                Err(CheckAbort::Cancelled) => {
                    debug!(%party_id, "completion check superseded")
                }
                Err(CheckAbort::Failed(err)) => {
                    error!(%party_id, error = %err, "completion check failed")
                }
            }
            state.round_checks().forget(party_id, &flag.0);
            let _ = done_tx.send(());
        });
    }

    /// Drop the registry entry owned by the flag, if it is still current.
    fn forget(&self, party_id: Uuid, cancel: &Arc<AtomicBool>) {
        self.checks
            .remove_if(&party_id, |_, handle| Arc::ptr_eq(&handle.cancel, cancel));
    }

    #[cfg(test)]
    fn in_flight(&self, party_id: Uuid) -> bool {
        self.checks.contains_key(&party_id)
    }
}

impl Default for RoundWatch {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_check(
    state: &SharedState,
    party_id: Uuid,
    flag: &CancelFlag,
) -> Result<(), CheckAbort> {
    let store = state.require_store().await.map_err(CheckAbort::from)?;

    let Some(party) = store
        .find_party(party_id)
        .await
        .map_err(ServiceError::from)?
    else {
        return Ok(());
    };
    flag.ensure_live()?;

    if party.status != PartyStatus::Playing {
        return Ok(());
    }

    let writers = store
        .players_for_party(party_id, PlayerFilter::ActiveInRound(party.round))
        .await
        .map_err(ServiceError::from)?;
    flag.ensure_live()?;

    if writers.iter().all(|p| p.status == PlayerStatus::Done) {
        let mut party = party;
        party.status = party
            .status
            .transition(PartyEvent::AllWritersDone)
            .map_err(ServiceError::from)?;
        store
            .save_party(party.clone())
            .await
            .map_err(ServiceError::from)?;
        finish_round(&store, party, writers).await?;
    }

    Ok(())
}

/// Close the round unconditionally once a fixed delay has elapsed.
///
/// Scheduled by an explicit end-round request; unlike [`RoundWatch::trigger`]
/// this path carries no cancellation handle and does not require every
/// writer to be done.
pub fn schedule_forced_end(state: SharedState, party_id: Uuid) {
    tokio::spawn(async move {
        sleep(state.config().grace_interval()).await;
        if let Err(err) = run_forced_end(&state, party_id).await {
            error!(%party_id, error = %err, "forced round end failed");
        }
    });
}

async fn run_forced_end(state: &SharedState, party_id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let Some(party) = store.find_party(party_id).await? else {
        return Ok(());
    };
    if party.status != PartyStatus::Ending {
        debug!(%party_id, status = party.status.name(), "skipping stale end request");
        return Ok(());
    }

    let writers = store
        .players_for_party(party_id, PlayerFilter::ActiveInRound(party.round))
        .await?;
    finish_round(&store, party, writers).await
}

/// Return the party and its round's writers to the lobby.
///
/// Independent per-document writes; a partial failure is surfaced to the
/// caller and leaves the remaining documents untouched.
async fn finish_round(
    store: &Arc<dyn PartyStore>,
    mut party: PartyEntity,
    writers: Vec<PlayerEntity>,
) -> Result<(), ServiceError> {
    let party_id = party.id;
    party.status = party.status.transition(PartyEvent::ReturnToLobby)?;
    store.save_party(party).await?;

    for mut writer in writers {
        writer.status = writer.status.transition(PlayerEvent::ReturnToLobby)?;
        store.save_player(writer).await?;
    }

    debug!(%party_id, "round returned to lobby");
    Ok(())
}
