use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a party, cycling once per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartyStatus {
    /// Players gather between rounds; this is the initial state.
    InLobby,
    /// A round has been started and stories are being built.
    Starting,
    /// Stories exist and players are writing entries.
    Playing,
    /// The round is closing; late entries are still accepted.
    Ending,
}

/// Events that drive a party through its round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyEvent {
    /// A lobby member asked for a new round.
    StartRound,
    /// The assignment engine finished persisting the round's stories.
    StoriesBuilt,
    /// Every active writer reached `Done`.
    AllWritersDone,
    /// A finished player asked to close the round early.
    CloseEarly,
    /// The round wrap-up completed and the party returns to the lobby.
    ReturnToLobby,
}

/// Lifecycle status of a single player within a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Waiting in the lobby; the initial state.
    InLobby,
    /// Activated for the current round and still writing.
    Playing,
    /// All entries required by this player's form are written.
    Done,
    /// The player departed; terminal, but the record survives for stories.
    Left,
}

/// Events that drive a player's per-round lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The assignment engine activated the player for a new round.
    Activate,
    /// The player wrote the last entry their form requires.
    FinishWriting,
    /// The round ended and the player rejoins the lobby.
    ReturnToLobby,
    /// The player left the party.
    Leave,
}

/// Error returned when an event cannot be applied in the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event} cannot be applied while {status}")]
pub struct InvalidTransition {
    /// Status the entity was in when the event arrived.
    pub status: &'static str,
    /// Event that was rejected.
    pub event: &'static str,
}

impl PartyStatus {
    /// Apply `event`, returning the next status or the rejected transition.
    pub fn transition(self, event: PartyEvent) -> Result<PartyStatus, InvalidTransition> {
        match (self, event) {
            (PartyStatus::InLobby, PartyEvent::StartRound) => Ok(PartyStatus::Starting),
            (PartyStatus::Starting, PartyEvent::StoriesBuilt) => Ok(PartyStatus::Playing),
            (PartyStatus::Playing, PartyEvent::AllWritersDone) => Ok(PartyStatus::Ending),
            (PartyStatus::Playing, PartyEvent::CloseEarly) => Ok(PartyStatus::Ending),
            (PartyStatus::Ending, PartyEvent::ReturnToLobby) => Ok(PartyStatus::InLobby),
            (status, event) => Err(InvalidTransition {
                status: status.name(),
                event: event.name(),
            }),
        }
    }

    /// Whether entry submissions and form reads are allowed right now.
    pub fn accepts_entries(self) -> bool {
        matches!(self, PartyStatus::Playing | PartyStatus::Ending)
    }

    /// Numeric wire code exposed to clients.
    pub fn code(self) -> u8 {
        match self {
            PartyStatus::InLobby => 0,
            PartyStatus::Starting => 1,
            PartyStatus::Playing => 2,
            PartyStatus::Ending => 3,
        }
    }

    /// Stable name used in logs, errors, and store filters.
    pub fn name(self) -> &'static str {
        match self {
            PartyStatus::InLobby => "InLobby",
            PartyStatus::Starting => "Starting",
            PartyStatus::Playing => "Playing",
            PartyStatus::Ending => "Ending",
        }
    }
}

impl PlayerStatus {
    /// Apply `event`, returning the next status or the rejected transition.
    ///
    /// `Leave` is accepted from every status so departures stay idempotent.
    pub fn transition(self, event: PlayerEvent) -> Result<PlayerStatus, InvalidTransition> {
        match (self, event) {
            (_, PlayerEvent::Leave) => Ok(PlayerStatus::Left),
            (PlayerStatus::InLobby | PlayerStatus::Done, PlayerEvent::Activate) => {
                Ok(PlayerStatus::Playing)
            }
            (PlayerStatus::Playing, PlayerEvent::FinishWriting) => Ok(PlayerStatus::Done),
            (PlayerStatus::Playing | PlayerStatus::Done, PlayerEvent::ReturnToLobby) => {
                Ok(PlayerStatus::InLobby)
            }
            (status, event) => Err(InvalidTransition {
                status: status.name(),
                event: event.name(),
            }),
        }
    }

    /// Whether the player still counts against the party size limit.
    pub fn is_active(self) -> bool {
        self != PlayerStatus::Left
    }

    /// Numeric wire code exposed to clients.
    pub fn code(self) -> u8 {
        match self {
            PlayerStatus::InLobby => 0,
            PlayerStatus::Playing => 1,
            PlayerStatus::Done => 2,
            PlayerStatus::Left => 3,
        }
    }

    /// Stable name used in logs, errors, and store filters.
    pub fn name(self) -> &'static str {
        match self {
            PlayerStatus::InLobby => "InLobby",
            PlayerStatus::Playing => "Playing",
            PlayerStatus::Done => "Done",
            PlayerStatus::Left => "Left",
        }
    }
}

impl PartyEvent {
    fn name(self) -> &'static str {
        match self {
            PartyEvent::StartRound => "StartRound",
            PartyEvent::StoriesBuilt => "StoriesBuilt",
            PartyEvent::AllWritersDone => "AllWritersDone",
            PartyEvent::CloseEarly => "CloseEarly",
            PartyEvent::ReturnToLobby => "ReturnToLobby",
        }
    }
}

impl PlayerEvent {
    fn name(self) -> &'static str {
        match self {
            PlayerEvent::Activate => "Activate",
            PlayerEvent::FinishWriting => "FinishWriting",
            PlayerEvent::ReturnToLobby => "ReturnToLobby",
            PlayerEvent::Leave => "Leave",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_full_round_cycle() {
        let status = PartyStatus::InLobby;
        let status = status.transition(PartyEvent::StartRound).unwrap();
        assert_eq!(status, PartyStatus::Starting);
        let status = status.transition(PartyEvent::StoriesBuilt).unwrap();
        assert_eq!(status, PartyStatus::Playing);
        let status = status.transition(PartyEvent::AllWritersDone).unwrap();
        assert_eq!(status, PartyStatus::Ending);
        let status = status.transition(PartyEvent::ReturnToLobby).unwrap();
        assert_eq!(status, PartyStatus::InLobby);
    }

    #[test]
    fn party_close_early_from_playing() {
        assert_eq!(
            PartyStatus::Playing.transition(PartyEvent::CloseEarly),
            Ok(PartyStatus::Ending)
        );
    }

    #[test]
    fn party_rejects_start_outside_lobby() {
        for status in [
            PartyStatus::Starting,
            PartyStatus::Playing,
            PartyStatus::Ending,
        ] {
            assert!(status.transition(PartyEvent::StartRound).is_err());
        }
    }

    #[test]
    fn party_rejects_double_finish() {
        let err = PartyStatus::Ending
            .transition(PartyEvent::AllWritersDone)
            .unwrap_err();
        assert_eq!(err.status, "Ending");
        assert_eq!(err.event, "AllWritersDone");
    }

    #[test]
    fn entries_accepted_while_playing_or_ending() {
        assert!(!PartyStatus::InLobby.accepts_entries());
        assert!(!PartyStatus::Starting.accepts_entries());
        assert!(PartyStatus::Playing.accepts_entries());
        assert!(PartyStatus::Ending.accepts_entries());
    }

    #[test]
    fn player_write_cycle() {
        let status = PlayerStatus::InLobby;
        let status = status.transition(PlayerEvent::Activate).unwrap();
        assert_eq!(status, PlayerStatus::Playing);
        let status = status.transition(PlayerEvent::FinishWriting).unwrap();
        assert_eq!(status, PlayerStatus::Done);
        let status = status.transition(PlayerEvent::ReturnToLobby).unwrap();
        assert_eq!(status, PlayerStatus::InLobby);
    }

    #[test]
    fn player_reactivation_after_done() {
        assert_eq!(
            PlayerStatus::Done.transition(PlayerEvent::Activate),
            Ok(PlayerStatus::Playing)
        );
    }

    #[test]
    fn player_leave_is_unconditional() {
        for status in [
            PlayerStatus::InLobby,
            PlayerStatus::Playing,
            PlayerStatus::Done,
            PlayerStatus::Left,
        ] {
            assert_eq!(
                status.transition(PlayerEvent::Leave),
                Ok(PlayerStatus::Left)
            );
        }
    }

    #[test]
    fn player_rejects_finish_outside_playing() {
        assert!(
            PlayerStatus::InLobby
                .transition(PlayerEvent::FinishWriting)
                .is_err()
        );
        assert!(
            PlayerStatus::Done
                .transition(PlayerEvent::FinishWriting)
                .is_err()
        );
    }

    #[test]
    fn left_players_are_inactive() {
        assert!(PlayerStatus::InLobby.is_active());
        assert!(PlayerStatus::Playing.is_active());
        assert!(PlayerStatus::Done.is_active());
        assert!(!PlayerStatus::Left.is_active());
    }

    #[test]
    fn wire_codes_are_stable() {
        assert_eq!(PartyStatus::InLobby.code(), 0);
        assert_eq!(PartyStatus::Ending.code(), 3);
        assert_eq!(PlayerStatus::InLobby.code(), 0);
        assert_eq!(PlayerStatus::Left.code(), 3);
    }
}
