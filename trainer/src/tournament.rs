//! Round-robin tournament: every ordered pair of cohort members plays
//! every configured position at every configured depth.

use std::collections::HashMap;
use std::str::FromStr;

use chess::{Board, Color, Game, GameResult};
use log::{debug, trace};
use rand::Rng;

use network::NetworkId;

use crate::config::TrainerConfig;
use crate::error::{Result, TrainerErr};
use crate::pool::Member;

/// Accumulated scores for one iteration, keyed by network hash.
pub type ScoreMap = HashMap<NetworkId, i64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    Draw,
}

/// Applies one game result to the score map: a draw pays `depth` to each
/// side, a decisive game pays `3 * depth` to the winner only.
pub fn apply_outcome(
    scores: &mut ScoreMap,
    white: NetworkId,
    black: NetworkId,
    depth: usize,
    outcome: Outcome,
) {
    let depth = depth as i64;
    match outcome {
        Outcome::Draw => {
            *scores.entry(white).or_insert(0) += depth;
            *scores.entry(black).or_insert(0) += depth;
        }
        Outcome::WhiteWins => {
            *scores.entry(white).or_insert(0) += 3 * depth;
            scores.entry(black).or_insert(0);
        }
        Outcome::BlackWins => {
            *scores.entry(black).or_insert(0) += 3 * depth;
            scores.entry(white).or_insert(0);
        }
    }
}

fn outcome_of(result: GameResult) -> Outcome {
    match result {
        GameResult::WhiteCheckmates | GameResult::BlackResigns => Outcome::WhiteWins,
        GameResult::BlackCheckmates | GameResult::WhiteResigns => Outcome::BlackWins,
        GameResult::Stalemate | GameResult::DrawAccepted | GameResult::DrawDeclared => {
            Outcome::Draw
        }
    }
}

/// Plays one game to completion. Both networks are bracketed with
/// `new_game`/`game_end` no matter how the game ends, so drift corrections
/// never outlive it.
fn play_game(
    cfg: &TrainerConfig,
    white: &mut Member,
    black: &mut Member,
    fen: &str,
    depth: usize,
    rng: &mut impl Rng,
) -> Result<Outcome> {
    let board = Board::from_str(fen).map_err(|_| TrainerErr::InvalidPosition {
        fen: fen.to_string(),
    })?;

    white.network.new_game();
    black.network.new_game();

    let mut game = Game::new_with_board(board);
    let mut plies = 0usize;
    let outcome = loop {
        if let Some(result) = game.result() {
            break outcome_of(result);
        }
        if game.can_declare_draw() {
            game.declare_draw();
            continue;
        }
        if plies >= cfg.max_plies {
            trace!("ply budget exhausted, scoring as a draw");
            break Outcome::Draw;
        }

        let position = game.current_position();
        let mover = if position.side_to_move() == Color::White {
            &mut *white
        } else {
            &mut *black
        };
        match mover.network.search(&position, depth, rng) {
            Some(mv) => {
                game.make_move(mv);
                plies += 1;
            }
            // No legal move and no result: the rules engine will report
            // game over on the next check.
            None => break Outcome::Draw,
        }
    };

    white.network.game_end();
    black.network.game_end();
    Ok(outcome)
}

fn pair_mut(members: &mut [Member], i: usize, j: usize) -> (&mut Member, &mut Member) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = members.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = members.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Runs the full round robin and returns the iteration's score map.
pub fn run(
    cfg: &TrainerConfig,
    members: &mut [Member],
    rng: &mut impl Rng,
) -> Result<ScoreMap> {
    let mut scores = ScoreMap::new();
    for i in 0..members.len() {
        for j in 0..members.len() {
            if i == j {
                continue;
            }
            for &depth in &cfg.depths {
                for fen in &cfg.positions {
                    let (white, black) = pair_mut(members, i, j);
                    let (white_id, black_id) = (white.id, black.id);
                    let outcome = play_game(cfg, white, black, fen, depth, rng)?;
                    debug!(
                        "game {white_id} vs {black_id} at depth {depth}: {outcome:?}"
                    );
                    apply_outcome(&mut scores, white_id, black_id, depth, outcome);
                }
            }
        }
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{build_cohort, Provenance};
    use network::{DirectionDist, DirectionSet, Network};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn id_of(byte: u8) -> NetworkId {
        // Distinct ids from distinct single-element tweaks.
        let mut rng = StdRng::seed_from_u64(byte as u64);
        Network::random(network::NetConfig::default(), 255, &mut rng).content_hash()
    }

    #[test]
    fn decisive_game_pays_three_depth_to_the_winner_only() {
        let (a, b) = (id_of(1), id_of(2));
        let mut scores = ScoreMap::new();
        apply_outcome(&mut scores, a, b, 3, Outcome::WhiteWins);
        assert_eq!(scores[&a], 9);
        assert_eq!(scores[&b], 0);

        apply_outcome(&mut scores, a, b, 2, Outcome::BlackWins);
        assert_eq!(scores[&a], 9);
        assert_eq!(scores[&b], 6);
    }

    #[test]
    fn drawn_game_pays_depth_to_each_side() {
        let (a, b) = (id_of(3), id_of(4));
        let mut scores = ScoreMap::new();
        apply_outcome(&mut scores, a, b, 3, Outcome::Draw);
        assert_eq!(scores[&a], 3);
        assert_eq!(scores[&b], 3);
    }

    #[test]
    fn scores_accumulate_over_games() {
        let (a, b) = (id_of(5), id_of(6));
        let mut scores = ScoreMap::new();
        apply_outcome(&mut scores, a, b, 1, Outcome::Draw);
        apply_outcome(&mut scores, b, a, 1, Outcome::WhiteWins);
        assert_eq!(scores[&a], 1);
        assert_eq!(scores[&b], 4);
    }

    fn tiny_config() -> TrainerConfig {
        TrainerConfig {
            magnitudes: vec![10],
            depths: vec![1],
            positions: vec!["8/5K1k/8/8/8/8/8/R7 w - - 0 1".to_string()],
            max_plies: 6,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn round_robin_scores_every_member_and_preserves_hashes() {
        let cfg = tiny_config();
        let mut rng = StdRng::seed_from_u64(40);
        let incumbent = Network::random(cfg.net, cfg.random_bound, &mut rng);
        let directions =
            DirectionSet::sample(&cfg.net, &DirectionDist::Bernoulli { p: 0.5 }, &mut rng)
                .unwrap();
        let mut cohort = build_cohort(&cfg, &incumbent, &directions, &mut rng).unwrap();
        assert_eq!(cohort[0].provenance, Provenance::First);

        let scores = run(&cfg, &mut cohort, &mut rng).unwrap();

        // Every member appears in the score map.
        for member in &cohort {
            assert!(scores.contains_key(&member.id));
        }
        // Snapshot/restore kept every member's content at its build-time id.
        for member in &cohort {
            assert_eq!(member.network.content_hash(), member.id);
        }
    }
}
