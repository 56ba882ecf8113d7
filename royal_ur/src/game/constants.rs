use std::ops::RangeInclusive;

/// Tokens each player starts with in their holding pool.
pub const TOKENS_PER_PLAYER: u8 = 7;

/// Number of physically stored cells on the track (indices 0..=14).
pub const TRACK_LEN: usize = 15;

/// Entry point. Tokens are never stored here, it stands in for the pool.
pub const START_CELL: usize = 0;

/// Move destination for a token leaving the board. Not a stored cell.
pub const SAFE_ZONE: usize = 15;

/// Occupants of this cell can't be displaced by anyone.
pub const PROTECTED_CELL: usize = 8;

/// Landing on any of these grants another go.
pub const BONUS_CELLS: [usize; 3] = [4, 8, 14];

/// The middle lane. Each cell holds one token at most, and landing on an
/// opponent captures it. Outside it both players may share an index, each
/// in their own lane.
pub const COMBAT_CELLS: RangeInclusive<usize> = 5..=12;

/// Number of two-sided dice (coins) thrown per roll.
pub const DICE_COUNT: usize = 4;

/// Highest value a roll can show.
pub const MAX_ROLL: u8 = DICE_COUNT as u8;

/// Longest display name accepted from a client.
pub const MAX_PLAYER_NAME_LENGTH: usize = 24;
