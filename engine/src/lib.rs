pub mod uci;

use std::path::Path;

use chess::{Board, ChessMove};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use network::{NetConfig, Network, Result};

/// Live-play wrapper around a network. Thin glue: all evaluation logic
/// lives in the `network` crate.
pub struct Engine {
    network: Network,
    rng: StdRng,
}

impl Engine {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Loads the engine's network from a persisted file.
    pub fn from_file(cfg: NetConfig, path: &Path) -> Result<Self> {
        Ok(Self::new(Network::load(cfg, path)?))
    }

    /// A randomly initialised engine.
    pub fn from_random(cfg: NetConfig, bound: u8, rng: &mut impl Rng) -> Self {
        Self::new(Network::random(cfg, bound, rng))
    }

    /// Starts a new game: checkpoints the weights the evaluator drifts.
    pub fn new_game(&mut self) {
        self.network.game_end();
        self.network.new_game();
    }

    /// Picks a move. Guaranteed legal; `None` only without legal moves.
    pub fn best_move(&mut self, board: &Board, depth: usize) -> Option<ChessMove> {
        self.network.search(board, depth, &mut self.rng)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}
