//! End-to-end: a game from the rook-endgame position must terminate within
//! the budget with every played move legal at the time it is played, and a
//! full training iteration must run clean.

use std::str::FromStr;

use chess::{Board, Color, Game, MoveGen};
use rand::rngs::StdRng;
use rand::SeedableRng;

use network::{NetConfig, Network};
use trainer::{Trainer, TrainerConfig};

const ROOK_ENDGAME: &str = "8/5K1k/8/8/8/8/8/R7 w - - 0 1";

#[test]
fn rook_endgame_at_depth_three_terminates_with_legal_moves() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut white = Network::random(NetConfig::default(), 255, &mut rng);
    let mut black = Network::random(NetConfig::default(), 255, &mut rng);

    white.new_game();
    black.new_game();

    let board = Board::from_str(ROOK_ENDGAME).unwrap();
    let mut game = Game::new_with_board(board);
    let budget = 24;
    let mut plies = 0;

    while game.result().is_none() && plies < budget {
        if game.can_declare_draw() {
            game.declare_draw();
            continue;
        }
        let position = game.current_position();
        let mover = if position.side_to_move() == Color::White {
            &mut white
        } else {
            &mut black
        };
        let mv = mover.search(&position, 3, &mut rng).unwrap();
        assert!(
            MoveGen::new_legal(&position).any(|legal| legal == mv),
            "played an illegal move: {mv}"
        );
        assert!(game.make_move(mv));
        plies += 1;
    }

    white.game_end();
    black.game_end();
}

#[test]
fn one_training_iteration_runs_clean_from_random() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = TrainerConfig {
        magnitudes: vec![10],
        depths: vec![1],
        positions: vec![ROOK_ENDGAME.to_string()],
        max_plies: 6,
        data_dir: dir.path().to_path_buf(),
        ..TrainerConfig::default()
    };
    let best_path = cfg.best_network_path();

    let mut trainer = Trainer::new(cfg.clone(), true, StdRng::seed_from_u64(77)).unwrap();
    trainer.acquire_lock().unwrap();
    trainer.step().unwrap();

    // The winner was persisted and reloads as the promoted incumbent.
    let loaded = Network::load(cfg.net, &best_path).unwrap();
    assert_eq!(
        loaded.content_hash(),
        trainer.state().incumbent.content_hash()
    );

    // A second session can resume from the persisted network.
    drop(trainer);
    let resumed = Trainer::new(cfg, false, StdRng::seed_from_u64(78)).unwrap();
    assert_eq!(
        resumed.state().incumbent.content_hash(),
        loaded.content_hash()
    );
}
