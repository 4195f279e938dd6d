use serde::{Deserialize, Serialize};

/// Side length of the board grid.
pub const GRID: usize = 8;
/// Side length of one per-square block.
pub const BLOCK: usize = 12;
/// Edge of the flattened hidden representation (`GRID * BLOCK`).
pub const EDGE: usize = GRID * BLOCK;
/// Number of candidate lines in the output tensor.
pub const LINES: usize = 16;
/// Width of one candidate line.
pub const LINE_WIDTH: usize = 14;

/// Canonical shape configuration for a network.
///
/// Every tensor shape in the system derives from this one object; the
/// constants that used to be scattered across call sites live here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Number of hidden layers (H). Weight lists hold H + 2 entries.
    pub hidden_layers: usize,
    /// Elementwise floor applied to every hidden layer.
    pub normalisation: i32,
    /// Minimum drift-signal delta that triggers a weight correction.
    pub rts_diff: i64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            hidden_layers: 8,
            normalisation: 32,
            rts_diff: 12,
        }
    }
}

impl NetConfig {
    /// Number of entries in each per-layer weight list.
    pub fn layer_count(&self) -> usize {
        self.hidden_layers + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layer_count() {
        let cfg = NetConfig::default();
        assert_eq!(cfg.layer_count(), 10);
    }

    #[test]
    fn json_round_trip() {
        let cfg = NetConfig {
            hidden_layers: 4,
            normalisation: 16,
            rts_diff: 3,
        };
        let text = serde_json::to_string(&cfg).unwrap();
        let back: NetConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
