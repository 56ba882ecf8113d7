//! Game rules: turn sequencing, dice, move legality, captures and win
//! detection.
//!
//! Every mutating operation validates the request first and only then
//! touches state, so a rejected request leaves the game exactly as it was.

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::constants::{
    BONUS_CELLS, COMBAT_CELLS, DICE_COUNT, MAX_ROLL, PROTECTED_CELL, SAFE_ZONE, START_CELL,
    TOKENS_PER_PLAYER, TRACK_LEN,
};
use super::entities::{
    GameId, GameState, Lane, LogEntry, Player, PlayerId, PlayerNumber, Track, ValidMoves,
};

/// Errors that can occur when a player acts on a game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum UserError {
    #[error("already rolled this turn")]
    AlreadyRolled,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game is over")]
    GameFinished,
    #[error("game hasn't started")]
    GameNotStarted,
    #[error("can't move from cell {track}")]
    InvalidMove { track: usize },
    #[error("dice can't show {0}")]
    InvalidRoll(u8),
    #[error("roll before moving")]
    NoRoll,
    #[error("not your turn")]
    OutOfTurnAction,
    #[error("pre-game rolls tied at {0}")]
    TiedPreGameRoll(u8),
    #[error("user does not exist")]
    UserDoesNotExist,
}

/// Things that happen during a game, rendered into the message log.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GameEvent {
    PreGameRoll(PlayerNumber, u8),
    GoesFirst(PlayerNumber),
    Rolled(PlayerNumber, u8),
    MissedTurn(PlayerNumber),
    NoValidMoves(PlayerNumber),
    ExtraTurn(PlayerNumber),
    Captured {
        by: PlayerNumber,
        cell: usize,
    },
    TokenHome(PlayerNumber),
    TimedOut(PlayerNumber),
    Won(PlayerNumber),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::PreGameRoll(player, roll) => format!("{player} rolled a {roll}"),
            Self::GoesFirst(player) => format!("{player} goes first!"),
            Self::Rolled(player, roll) => format!("{player} rolled {roll}"),
            Self::MissedTurn(player) => format!("{player} misses a turn!"),
            Self::NoValidMoves(player) => format!("{player} has no valid moves"),
            Self::ExtraTurn(player) => {
                format!("{player} landed on a special square and gets another go")
            }
            Self::Captured { by, cell } => {
                format!("{by} knocked a {} token off cell {cell}", by.opponent())
            }
            Self::TokenHome(player) => format!("{player} moved a token to the safe zone"),
            Self::TimedOut(player) => format!("{player} ran out of time"),
            Self::Won(player) => format!("{player} wins!"),
        };
        write!(f, "{repr}")
    }
}

/// What happened after a successful roll.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RollOutcome {
    /// The roller must now pick a token to move.
    AwaitingMove(u8),
    /// A zero. The turn went straight to the opponent.
    MissedTurn,
    /// Nothing could move with this roll, so the turn passed.
    NoValidMoves(u8),
}

impl RollOutcome {
    #[must_use]
    pub fn value(&self) -> u8 {
        match self {
            Self::AwaitingMove(value) | Self::NoValidMoves(value) => *value,
            Self::MissedTurn => 0,
        }
    }
}

/// Summary of an applied move.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MoveOutcome {
    pub from: usize,
    pub to: usize,
    pub captured: bool,
    pub extra_turn: bool,
    pub finished: bool,
}

/// Plain snapshot of every game field. This is what gets broadcast to both
/// participants and what a game can be rebuilt from.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub player1: Player,
    pub player2: Player,
    pub current_player: Option<PlayerId>,
    pub current_roll: Option<u8>,
    pub id: Option<GameId>,
    pub turn: u32,
    pub messages: Vec<LogEntry>,
    pub state: GameState,
    pub track: Track,
}

/// A two-player race game.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    player1: Player,
    player2: Player,
    current_player: Option<PlayerId>,
    /// `None` until the current player rolls; reset after every move.
    current_roll: Option<u8>,
    id: Option<GameId>,
    turn: u32,
    messages: Vec<LogEntry>,
    state: GameState,
    track: Track,
}

impl Game {
    #[must_use]
    pub fn new(pid1: PlayerId, pid2: PlayerId) -> Self {
        Self {
            player1: Player::new(pid1, PlayerNumber::One),
            player2: Player::new(pid2, PlayerNumber::Two),
            current_player: None,
            current_roll: None,
            id: None,
            turn: 0,
            messages: Vec::new(),
            state: GameState::None,
            track: Track::new(),
        }
    }

    pub fn set_id(&mut self, id: GameId) {
        self.id = Some(id);
    }

    #[must_use]
    pub fn id(&self) -> Option<GameId> {
        self.id
    }

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn current_roll(&self) -> Option<u8> {
        self.current_roll
    }

    #[must_use]
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player
    }

    pub fn messages(&self) -> &[LogEntry] {
        &self.messages
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn player1(&self) -> &Player {
        &self.player1
    }

    pub fn player2(&self) -> &Player {
        &self.player2
    }

    /// Whether `pid` is one of the two participants.
    #[must_use]
    pub fn contains_player(&self, pid: &PlayerId) -> bool {
        self.player_by_id(pid).is_some()
    }

    pub fn player_by_id(&self, pid: &PlayerId) -> Option<&Player> {
        [&self.player1, &self.player2]
            .into_iter()
            .find(|player| player.pid == *pid)
    }

    pub fn player_by_number(&self, number: PlayerNumber) -> &Player {
        match number {
            PlayerNumber::One => &self.player1,
            PlayerNumber::Two => &self.player2,
        }
    }

    fn player_by_number_mut(&mut self, number: PlayerNumber) -> &mut Player {
        match number {
            PlayerNumber::One => &mut self.player1,
            PlayerNumber::Two => &mut self.player2,
        }
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player.and_then(|pid| self.player_by_id(&pid))
    }

    pub fn enemy_player(&self) -> Option<&Player> {
        self.current_player()
            .map(|player| self.player_by_number(player.number.opponent()))
    }

    /// The opponent of `pid`, if `pid` is playing this game.
    pub fn enemy_of(&self, pid: &PlayerId) -> Option<&Player> {
        self.player_by_id(pid)
            .map(|player| self.player_by_number(player.number.opponent()))
    }

    pub fn switch_current_player(&mut self) {
        self.current_player = self.enemy_player().map(|player| player.pid);
    }

    /// The player who got every token to the safe zone, if anyone has.
    pub fn winner(&self) -> Option<&Player> {
        [&self.player1, &self.player2]
            .into_iter()
            .find(|player| player.tokens_done == TOKENS_PER_PLAYER)
    }

    #[must_use]
    pub fn tokens_on_track(&self, number: PlayerNumber) -> usize {
        self.track.count(number)
    }

    /// Throws four coins and counts the heads, so 2 is six times as likely
    /// as 0 or 4.
    #[must_use]
    pub fn roll_dice() -> u8 {
        Self::roll_dice_with(&mut rand::rng())
    }

    pub fn roll_dice_with<R: Rng + ?Sized>(rng: &mut R) -> u8 {
        (0..DICE_COUNT).map(|_| u8::from(rng.random_bool(0.5))).sum()
    }

    /// Decides who goes first from one pair of pre-game rolls.
    ///
    /// # Errors
    ///
    /// Ties are rejected with [`UserError::TiedPreGameRoll`] and must be
    /// re-rolled; see [`Game::begin`].
    pub fn begin_with_rolls(&mut self, roll1: u8, roll2: u8) -> Result<PlayerId, UserError> {
        if self.state != GameState::None {
            return Err(UserError::GameAlreadyStarted);
        }
        if let Some(roll) = [roll1, roll2].into_iter().find(|roll| *roll > MAX_ROLL) {
            return Err(UserError::InvalidRoll(roll));
        }
        if roll1 == roll2 {
            return Err(UserError::TiedPreGameRoll(roll1));
        }

        self.turn += 1;
        self.player1.pre_game_roll = Some(roll1);
        self.player2.pre_game_roll = Some(roll2);
        self.log(GameEvent::PreGameRoll(PlayerNumber::One, roll1));
        self.log(GameEvent::PreGameRoll(PlayerNumber::Two, roll2));

        let first = if roll1 > roll2 {
            &self.player1
        } else {
            &self.player2
        };
        let (pid, number) = (first.pid, first.number);
        self.current_player = Some(pid);
        self.log(GameEvent::GoesFirst(number));
        self.state = GameState::InProgress;

        Ok(pid)
    }

    /// Rolls for both players until the results differ, then starts the
    /// game with the higher roller to move.
    ///
    /// # Errors
    ///
    /// [`UserError::GameAlreadyStarted`] if the game isn't fresh.
    pub fn begin<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<PlayerId, UserError> {
        loop {
            let roll1 = Self::roll_dice_with(rng);
            let roll2 = Self::roll_dice_with(rng);
            match self.begin_with_rolls(roll1, roll2) {
                Err(UserError::TiedPreGameRoll(roll)) => {
                    debug!("pre-game rolls tied at {roll}, rolling again");
                }
                result => return result,
            }
        }
    }

    /// Legality of moving from every stored cell for the current player and
    /// roll. Always 15 entries; all false before a roll.
    #[must_use]
    pub fn valid_moves(&self) -> ValidMoves {
        let mut moves = [false; TRACK_LEN];

        let (Some(roll), Some(player)) = (self.current_roll, self.current_player()) else {
            return moves;
        };
        // A zero never stays pending, but nothing can move with it anyway.
        if roll == 0 {
            return moves;
        }

        for (origin, valid) in moves.iter_mut().enumerate() {
            if origin == START_CELL && player.tokens_waiting == 0 {
                continue;
            }
            if origin != START_CELL && !self.track[origin].contains(player.number) {
                continue;
            }

            let destination = origin + usize::from(roll);

            // Overshooting the safe zone. Checked first so the cell lookups
            // below stay in bounds; each rule rejects independently.
            if destination > SAFE_ZONE {
                continue;
            }
            if let Some(cell) = self.track.get(destination) {
                if cell.contains(player.number) {
                    continue;
                }
                if destination == PROTECTED_CELL && !cell.is_empty() {
                    continue;
                }
            }

            *valid = true;
        }

        moves
    }

    #[must_use]
    pub fn is_valid_move(&self, track: usize, lane: Lane) -> bool {
        if lane == Lane::Enemy {
            return false;
        }
        self.valid_moves().get(track).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn has_valid_moves(&self) -> bool {
        self.valid_moves().into_iter().any(|valid| valid)
    }

    /// Rolls the dice for `pid` using `rng` and applies the result.
    ///
    /// # Errors
    ///
    /// See [`Game::apply_roll`].
    pub fn roll<R: Rng + ?Sized>(
        &mut self,
        pid: &PlayerId,
        rng: &mut R,
    ) -> Result<RollOutcome, UserError> {
        self.ensure_turn(pid)?;
        if self.current_roll.is_some() {
            return Err(UserError::AlreadyRolled);
        }
        self.apply_roll(pid, Self::roll_dice_with(rng))
    }

    /// Records a roll of `value` for `pid`.
    ///
    /// A zero passes the turn straight away. So does a roll no token can
    /// use, so the game never stalls waiting for an impossible move.
    ///
    /// # Errors
    ///
    /// Rejected when the game isn't running, `pid` isn't the current player,
    /// a roll is already pending, or `value` is off the dice.
    pub fn apply_roll(&mut self, pid: &PlayerId, value: u8) -> Result<RollOutcome, UserError> {
        let roller = self.ensure_turn(pid)?;
        if self.current_roll.is_some() {
            return Err(UserError::AlreadyRolled);
        }
        if value > MAX_ROLL {
            return Err(UserError::InvalidRoll(value));
        }

        self.current_roll = Some(value);
        self.log(GameEvent::Rolled(roller, value));

        if value == 0 {
            self.log(GameEvent::MissedTurn(roller));
            self.pass_turn();
            return Ok(RollOutcome::MissedTurn);
        }

        if !self.has_valid_moves() {
            self.log(GameEvent::NoValidMoves(roller));
            self.pass_turn();
            return Ok(RollOutcome::NoValidMoves(value));
        }

        Ok(RollOutcome::AwaitingMove(value))
    }

    /// Moves the current player's token from `track` by the pending roll.
    ///
    /// # Errors
    ///
    /// Rejected when the game isn't running, `pid` isn't the current player,
    /// there's no roll yet, or the move is illegal.
    pub fn move_token(
        &mut self,
        pid: &PlayerId,
        track: usize,
        lane: Lane,
    ) -> Result<MoveOutcome, UserError> {
        let mover = self.ensure_turn(pid)?;
        let roll = self.current_roll.ok_or(UserError::NoRoll)?;
        if !self.is_valid_move(track, lane) {
            return Err(UserError::InvalidMove { track });
        }

        let enemy = mover.opponent();
        let destination = track + usize::from(roll);

        // Neither the start cell nor the safe zone hold tokens.
        if destination != SAFE_ZONE {
            self.track[destination].insert(mover);
        }
        if track != START_CELL {
            self.track[track].remove(mover);
        }

        if destination == SAFE_ZONE {
            self.player_by_number_mut(mover).tokens_done += 1;
            self.log(GameEvent::TokenHome(mover));
        }

        let captured =
            COMBAT_CELLS.contains(&destination) && self.track[destination].contains(enemy);
        if captured {
            self.track[destination].remove(enemy);
            self.player_by_number_mut(enemy).tokens_waiting += 1;
            self.log(GameEvent::Captured {
                by: mover,
                cell: destination,
            });
        }

        if track == START_CELL {
            self.player_by_number_mut(mover).tokens_waiting -= 1;
        }

        self.turn += 1;

        let extra_turn = BONUS_CELLS.contains(&destination);
        if extra_turn {
            self.log(GameEvent::ExtraTurn(mover));
        } else {
            self.switch_current_player();
        }

        self.current_roll = None;

        let finished = self.winner().is_some();
        if finished {
            self.state = GameState::Finished;
            if let Some(winner) = self.winner().map(|player| player.number) {
                self.log(GameEvent::Won(winner));
            }
        }

        Ok(MoveOutcome {
            from: track,
            to: destination,
            captured,
            extra_turn,
            finished,
        })
    }

    /// Passes the turn of a player who stalled for too long. Returns who
    /// lost their turn, or `None` if the game isn't running.
    pub fn time_out(&mut self) -> Option<PlayerId> {
        if self.state != GameState::InProgress {
            return None;
        }
        let (pid, number) = self
            .current_player()
            .map(|player| (player.pid, player.number))?;
        self.log(GameEvent::TimedOut(number));
        self.pass_turn();
        Some(pid)
    }

    /// Appends a line to the game history.
    pub fn log(&mut self, message: impl fmt::Display) {
        let message = message.to_string();
        match self.id {
            Some(id) => info!("game {id}: {message}"),
            None => info!("{message}"),
        }
        self.messages.push(LogEntry {
            message,
            turn: self.turn,
        });
    }

    /// Snapshot of every field.
    #[must_use]
    pub fn view(&self) -> GameView {
        GameView {
            player1: self.player1.clone(),
            player2: self.player2.clone(),
            current_player: self.current_player,
            current_roll: self.current_roll,
            id: self.id,
            turn: self.turn,
            messages: self.messages.clone(),
            state: self.state,
            track: self.track.clone(),
        }
    }

    /// Replaces every field with the ones in `data`.
    pub fn hydrate(&mut self, data: GameView) {
        *self = data.into();
    }

    fn pass_turn(&mut self) {
        self.current_roll = None;
        self.switch_current_player();
    }

    fn ensure_turn(&self, pid: &PlayerId) -> Result<PlayerNumber, UserError> {
        match self.state {
            GameState::None => return Err(UserError::GameNotStarted),
            GameState::Finished => return Err(UserError::GameFinished),
            GameState::InProgress => {}
        }
        let player = self.player_by_id(pid).ok_or(UserError::UserDoesNotExist)?;
        if self.current_player != Some(player.pid) {
            return Err(UserError::OutOfTurnAction);
        }
        Ok(player.number)
    }
}

impl From<GameView> for Game {
    fn from(value: GameView) -> Self {
        Self {
            player1: value.player1,
            player2: value.player2,
            current_player: value.current_player,
            current_roll: value.current_roll,
            id: value.id,
            turn: value.turn,
            messages: value.messages,
            state: value.state,
            track: value.track,
        }
    }
}
