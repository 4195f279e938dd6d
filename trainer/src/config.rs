use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use network::{DirectionDist, NetConfig};

use crate::error::Result;

/// Canonical training-session configuration.
///
/// Cumulative statistics are keyed by [`TrainerConfig::checksum`], so two
/// sessions share counters only when their whole configuration matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub net: NetConfig,
    /// Upper bound (exclusive) for random network elements.
    pub random_bound: u8,
    /// Mutation magnitudes; one cohort member per entry. A sparse set, not
    /// an exhaustive sweep.
    pub magnitudes: Vec<u8>,
    /// Element distribution for direction sampling.
    pub direction: DirectionDist,
    /// Search depths every pairing plays at.
    pub depths: Vec<usize>,
    /// Starting positions (FEN) every pairing plays from.
    pub positions: Vec<String>,
    /// Ply budget per game; hitting it scores the game as a draw.
    pub max_plies: usize,
    /// Directory holding the best network, the lock file and statistics.
    pub data_dir: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            net: NetConfig::default(),
            random_bound: 255,
            magnitudes: vec![10, 20, 240, 250],
            direction: DirectionDist::Bernoulli { p: 0.5 },
            depths: vec![3],
            positions: vec![
                "8/5K1k/8/8/8/8/8/R7 w - - 0 1".to_string(),
                "1k6/8/1K6/8/8/8/8/7R w - - 0 1".to_string(),
            ],
            max_plies: 512,
            data_dir: PathBuf::from("data/training"),
        }
    }
}

impl TrainerConfig {
    /// Reads a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reads a configuration from a JSON file, falling back to the
    /// canonical defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Content checksum of the configuration, used to key cumulative
    /// statistics.
    pub fn checksum(&self) -> String {
        let text = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    pub fn best_network_path(&self) -> PathBuf {
        self.data_dir.join("best-network.safetensors")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("training.lock")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join("statistics.json")
    }
}
