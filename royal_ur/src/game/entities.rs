use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};
use uuid::Uuid;

use super::constants::{COMBAT_CELLS, MAX_PLAYER_NAME_LENGTH, TOKENS_PER_PLAYER, TRACK_LEN};

/// Identity of a connected participant. One is minted per connection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier the match registry hands out for each game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Display name chosen by a player. Whitespace becomes underscores and
/// overly long names are cut short.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn new(s: &str) -> Self {
        let name: String = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .take(MAX_PLAYER_NAME_LENGTH)
            .collect();
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Seat of a player in a game. The discriminant doubles as the player's
/// flag on the track.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PlayerNumber {
    One = 1,
    Two = 2,
}

impl PlayerNumber {
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

impl fmt::Display for PlayerNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.bit())
    }
}

impl TryFrom<u8> for PlayerNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("no player number {other}")),
        }
    }
}

impl Serialize for PlayerNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bit())
    }
}

impl<'de> Deserialize<'de> for PlayerNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Set of players occupying one track cell.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cell(u8);

impl Cell {
    pub const EMPTY: Self = Self(0);
    const ALL: u8 = PlayerNumber::One.bit() | PlayerNumber::Two.bit();

    #[must_use]
    pub const fn contains(self, player: PlayerNumber) -> bool {
        self.0 & player.bit() == player.bit()
    }

    pub fn insert(&mut self, player: PlayerNumber) {
        self.0 |= player.bit();
    }

    pub fn remove(&mut self, player: PlayerNumber) {
        self.0 &= !player.bit();
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// The 15 stored cells of the race track.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Track([Cell; TRACK_LEN]);

impl Track {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` for the safe zone and anything past it.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.0.get(index).copied()
    }

    pub fn cells(&self) -> &[Cell; TRACK_LEN] {
        &self.0
    }

    /// Number of `player`'s tokens currently on the board.
    #[must_use]
    pub fn count(&self, player: PlayerNumber) -> usize {
        self.0.iter().filter(|cell| cell.contains(player)).count()
    }

    /// Whether both players may stand on `index` at the same time.
    #[must_use]
    pub fn is_shared(index: usize) -> bool {
        !COMBAT_CELLS.contains(&index)
    }

    /// Checks the flag invariants: no unknown bits, nothing parked on the
    /// start cell, and no combat cell holding both players.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.0[0].is_empty()
            && self.0.iter().enumerate().all(|(index, cell)| {
                cell.0 & !Cell::ALL == 0 && (Self::is_shared(index) || cell.0 != Cell::ALL)
            })
    }
}

impl Index<usize> for Track {
    type Output = Cell;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IndexMut<usize> for Track {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0[index]
    }
}

/// Lifecycle of a game. Serialized as 0, 1, 2.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum GameState {
    #[default]
    None = 0,
    InProgress = 1,
    Finished = 2,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::None => "waiting",
            Self::InProgress => "in progress",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

impl Serialize for GameState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for GameState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Self::None),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Finished),
            other => Err(serde::de::Error::custom(format!(
                "no game state {other}"
            ))),
        }
    }
}

/// Visual lane a client clicked on. Nobody may act on the enemy's lane.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lane {
    Player,
    Middle,
    Enemy,
}

/// One line of the game history.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LogEntry {
    pub message: String,
    pub turn: u32,
}

/// One participant's seat and token counts.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub pid: PlayerId,
    pub number: PlayerNumber,
    pub tokens_waiting: u8,
    pub tokens_done: u8,
    pub pre_game_roll: Option<u8>,
}

impl Player {
    #[must_use]
    pub fn new(pid: PlayerId, number: PlayerNumber) -> Self {
        Self {
            pid,
            number,
            tokens_waiting: TOKENS_PER_PLAYER,
            tokens_done: 0,
            pre_game_roll: None,
        }
    }
}

/// Legality of moving a token from each stored cell, indexed by origin.
pub type ValidMoves = [bool; TRACK_LEN];
