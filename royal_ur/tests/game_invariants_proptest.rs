/// Property-based tests for game invariants using proptest
///
/// Random games are played out from a seed, with moves picked by the
/// generated choices, and the rules' invariants are checked after every
/// action.
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use royal_ur::{
    Game, RollOutcome, UserError,
    constants::{BONUS_CELLS, MAX_ROLL, TOKENS_PER_PLAYER},
    entities::{GameState, Lane, PlayerId, PlayerNumber},
};

fn token_count(game: &Game, number: PlayerNumber) -> usize {
    let player = game.player_by_number(number);
    usize::from(player.tokens_waiting) + usize::from(player.tokens_done) + game.tokens_on_track(number)
}

fn new_game(seed: u64) -> (Game, StdRng) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new(PlayerId::generate(), PlayerId::generate());
    game.begin(&mut rng).unwrap();
    (game, rng)
}

proptest! {
    #[test]
    fn test_roll_dice_in_range(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..32 {
            prop_assert!(Game::roll_dice_with(&mut rng) <= MAX_ROLL);
        }
    }

    #[test]
    fn test_tokens_conserved_under_random_play(
        seed in any::<u64>(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..300),
    ) {
        let (mut game, mut rng) = new_game(seed);

        for pick in picks {
            if game.state() != GameState::InProgress {
                break;
            }
            let pid = game.current_player_id().unwrap();
            if let RollOutcome::AwaitingMove(_) = game.roll(&pid, &mut rng).unwrap() {
                let choices: Vec<usize> = game
                    .valid_moves()
                    .iter()
                    .enumerate()
                    .filter_map(|(origin, valid)| valid.then_some(origin))
                    .collect();
                prop_assert!(!choices.is_empty(), "a pending roll must have a move");
                game.move_token(&pid, *pick.get(&choices), Lane::Middle).unwrap();
            }

            for number in [PlayerNumber::One, PlayerNumber::Two] {
                prop_assert_eq!(token_count(&game, number), usize::from(TOKENS_PER_PLAYER));
            }
            prop_assert!(game.track().is_consistent());
        }
    }

    #[test]
    fn test_valid_moves_idempotent(seed in any::<u64>(), actions in 0usize..80) {
        let (mut game, mut rng) = new_game(seed);
        for _ in 0..actions {
            if game.state() != GameState::InProgress {
                break;
            }
            let pid = game.current_player_id().unwrap();
            if let RollOutcome::AwaitingMove(_) = game.roll(&pid, &mut rng).unwrap() {
                let first = game.valid_moves();
                prop_assert_eq!(first, game.valid_moves());
                let origin = first.iter().position(|valid| *valid).unwrap();
                game.move_token(&pid, origin, Lane::Player).unwrap();
            }
        }
        prop_assert_eq!(game.valid_moves(), game.valid_moves());
    }

    #[test]
    fn test_bonus_squares_decide_next_player(seed in any::<u64>(), actions in 1usize..120) {
        let (mut game, mut rng) = new_game(seed);
        for _ in 0..actions {
            if game.state() != GameState::InProgress {
                break;
            }
            let pid = game.current_player_id().unwrap();
            if let RollOutcome::AwaitingMove(_) = game.roll(&pid, &mut rng).unwrap() {
                let origin = game.valid_moves().iter().position(|valid| *valid).unwrap();
                let outcome = game.move_token(&pid, origin, Lane::Player).unwrap();
                if outcome.finished {
                    break;
                }
                let kept = game.current_player_id() == Some(pid);
                prop_assert_eq!(kept, BONUS_CELLS.contains(&outcome.to));
                prop_assert_eq!(kept, outcome.extra_turn);
            }
        }
    }

    #[test]
    fn test_waiting_player_can_never_act(seed in any::<u64>(), value in 0u8..=4) {
        let (mut game, _) = new_game(seed);
        let waiting = game.enemy_player().unwrap().pid;
        let before = game.view();

        prop_assert_eq!(game.apply_roll(&waiting, value), Err(UserError::OutOfTurnAction));
        prop_assert_eq!(
            game.move_token(&waiting, 0, Lane::Player),
            Err(UserError::OutOfTurnAction)
        );
        prop_assert_eq!(game.view(), before);
    }
}
