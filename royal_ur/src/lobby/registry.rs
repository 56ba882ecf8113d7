//! Lobby store.

use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::errors::{LobbyError, LobbyResult};
use crate::game::entities::{GameId, PlayerId, PlayerName};

/// A connected player as the lobby sees them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LobbyEntry {
    pub name: PlayerName,
    /// The game the player is currently in, if any.
    pub game: Option<GameId>,
}

/// Connected players and pending challenges.
#[derive(Debug, Default)]
pub struct Lobby {
    players: HashMap<PlayerId, LobbyEntry>,
    /// Pending `(challenger, challenged)` pairs.
    challenges: HashSet<(PlayerId, PlayerId)>,
}

impl Lobby {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly connected player. An empty name falls back to the
    /// player's id.
    ///
    /// # Errors
    ///
    /// [`LobbyError::PlayerAlreadyExists`] if `pid` is already registered.
    pub fn join(&mut self, pid: PlayerId, name: PlayerName) -> LobbyResult<()> {
        if self.players.contains_key(&pid) {
            return Err(LobbyError::PlayerAlreadyExists);
        }
        let name = if name.is_empty() {
            PlayerName::new(&pid.to_string())
        } else {
            name
        };
        info!("{name} ({pid}) has joined");
        self.players.insert(pid, LobbyEntry { name, game: None });
        Ok(())
    }

    /// Forgets a disconnected player along with any challenges they were
    /// part of.
    pub fn leave(&mut self, pid: &PlayerId) -> Option<LobbyEntry> {
        self.challenges
            .retain(|(from, to)| from != pid && to != pid);
        let entry = self.players.remove(pid);
        if let Some(entry) = &entry {
            info!("{} ({pid}) has left", entry.name);
        }
        entry
    }

    /// # Errors
    ///
    /// [`LobbyError::UnknownPlayer`] if `pid` isn't registered.
    pub fn rename(&mut self, pid: &PlayerId, name: PlayerName) -> LobbyResult<()> {
        let entry = self
            .players
            .get_mut(pid)
            .ok_or(LobbyError::UnknownPlayer)?;
        if !name.is_empty() {
            info!("{} has changed their name to {name}", entry.name);
            entry.name = name;
        }
        Ok(())
    }

    pub fn get(&self, pid: &PlayerId) -> Option<&LobbyEntry> {
        self.players.get(pid)
    }

    pub fn name_of(&self, pid: &PlayerId) -> Option<&PlayerName> {
        self.players.get(pid).map(|entry| &entry.name)
    }

    #[must_use]
    pub fn contains(&self, pid: &PlayerId) -> bool {
        self.players.contains_key(pid)
    }

    pub fn game_of(&self, pid: &PlayerId) -> Option<GameId> {
        self.players.get(pid).and_then(|entry| entry.game)
    }

    /// Records a challenge from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Self-challenges, unknown players and players already in a game are
    /// rejected.
    pub fn challenge(&mut self, from: &PlayerId, to: &PlayerId) -> LobbyResult<()> {
        if from == to {
            return Err(LobbyError::SelfChallenge);
        }
        self.ensure_available(from)?;
        self.ensure_available(to)?;
        self.challenges.insert((*from, *to));
        debug!("{from} challenged {to}");
        Ok(())
    }

    /// Consumes the pending challenge from `challenger` to `accepter`. Both
    /// must still be free to play.
    ///
    /// # Errors
    ///
    /// [`LobbyError::NoSuchChallenge`] if no such challenge is pending, or
    /// an availability error for either player.
    pub fn accept(&mut self, accepter: &PlayerId, challenger: &PlayerId) -> LobbyResult<()> {
        if !self.challenges.contains(&(*challenger, *accepter)) {
            return Err(LobbyError::NoSuchChallenge);
        }
        self.ensure_available(accepter)?;
        self.ensure_available(challenger)?;
        self.challenges.remove(&(*challenger, *accepter));
        Ok(())
    }

    /// # Errors
    ///
    /// [`LobbyError::NoSuchChallenge`] if no such challenge is pending.
    pub fn reject(&mut self, rejecter: &PlayerId, challenger: &PlayerId) -> LobbyResult<()> {
        if self.challenges.remove(&(*challenger, *rejecter)) {
            Ok(())
        } else {
            Err(LobbyError::NoSuchChallenge)
        }
    }

    /// Marks both players as playing `game`. Their other pending challenges
    /// are dropped.
    pub fn enter_game(&mut self, pid1: &PlayerId, pid2: &PlayerId, game: GameId) {
        self.challenges.retain(|(from, to)| {
            ![pid1, pid2].contains(&from) && ![pid1, pid2].contains(&to)
        });
        for pid in [pid1, pid2] {
            if let Some(entry) = self.players.get_mut(pid) {
                entry.game = Some(game);
            }
        }
    }

    /// Makes every player of `game` available again.
    pub fn finish_game(&mut self, game: GameId) {
        for entry in self.players.values_mut() {
            if entry.game == Some(game) {
                entry.game = None;
            }
        }
    }

    /// Players not currently in a game, by id.
    #[must_use]
    pub fn available_players(&self) -> BTreeMap<PlayerId, PlayerName> {
        self.players
            .iter()
            .filter(|(_, entry)| entry.game.is_none())
            .map(|(pid, entry)| (*pid, entry.name.clone()))
            .collect()
    }

    /// Every connected player, in no particular order.
    pub fn players(&self) -> impl Iterator<Item = (&PlayerId, &LobbyEntry)> {
        self.players.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn ensure_available(&self, pid: &PlayerId) -> LobbyResult<()> {
        match self.players.get(pid) {
            None => Err(LobbyError::UnknownPlayer),
            Some(entry) if entry.game.is_some() => Err(LobbyError::PlayerBusy),
            Some(_) => Ok(()),
        }
    }
}
