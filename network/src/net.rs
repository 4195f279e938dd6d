use std::fmt;

use ndarray::{Array2, Array4, ArrayViewD};
use rand::Rng;

use crate::config::{NetConfig, BLOCK, EDGE, GRID, LINES, LINE_WIDTH};

/// Exact content identity of a network: blake3 over every tensor's raw
/// bytes in declared order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId([u8; 32]);

impl NetworkId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkId({self})")
    }
}

pub(crate) struct Snapshot {
    left: Vec<Array4<i8>>,
    right: Vec<Array4<i8>>,
}

/// A full weight bundle: per-layer left/right/bias grids, the four
/// scalar-reduction tensors, the two output-reduce matrices and the two
/// correction grids.
///
/// The evaluator mutates `left`/`right` in place while running; callers
/// bracket games with [`Network::new_game`] / [`Network::game_end`] to make
/// that mutation game-local.
pub struct Network {
    pub(crate) cfg: NetConfig,
    pub(crate) left: Vec<Array4<i8>>,
    pub(crate) right: Vec<Array4<i8>>,
    pub(crate) bias: Vec<Array4<i8>>,
    pub(crate) scalar_gi: Array4<i8>,
    pub(crate) scalar_di: Array4<i8>,
    pub(crate) scalar_ge: Array4<i8>,
    pub(crate) scalar_de: Array4<i8>,
    pub(crate) reduce_g: Array2<i8>,
    pub(crate) reduce_d: Array2<i8>,
    pub(crate) corr_g: Array4<i8>,
    pub(crate) corr_d: Array4<i8>,
    pub(crate) snapshot: Option<Snapshot>,
}

impl Network {
    /// Generates a fully random network with every element drawn uniformly
    /// from `[0, bound)` and reinterpreted into the signed storage domain.
    pub fn random(cfg: NetConfig, bound: u8, rng: &mut impl Rng) -> Self {
        let mut sample = |shape: (usize, usize, usize, usize)| {
            Array4::from_shape_simple_fn(shape, || rng.random_range(0..bound) as i8)
        };

        let layers = cfg.layer_count();
        let mut left = Vec::with_capacity(layers);
        let mut right = Vec::with_capacity(layers);
        let mut bias = Vec::with_capacity(layers);
        for _ in 0..layers {
            left.push(sample((GRID, GRID, BLOCK, BLOCK)));
            right.push(sample((GRID, GRID, BLOCK, BLOCK)));
            bias.push(sample((GRID, GRID, BLOCK, BLOCK)));
        }

        let scalar_gi = sample((GRID, GRID, 1, BLOCK));
        let scalar_di = sample((GRID, GRID, BLOCK, 1));
        let scalar_ge = sample((1, GRID, 1, 1));
        let scalar_de = sample((GRID, 1, 1, 1));
        let corr_g = sample((GRID, GRID, BLOCK, BLOCK));
        let corr_d = sample((GRID, GRID, BLOCK, BLOCK));

        let mut sample2 = |shape: (usize, usize)| {
            Array2::from_shape_simple_fn(shape, || rng.random_range(0..bound) as i8)
        };
        let reduce_g = sample2((LINES, EDGE));
        let reduce_d = sample2((EDGE, LINE_WIDTH));

        Self {
            cfg,
            left,
            right,
            bias,
            scalar_gi,
            scalar_di,
            scalar_ge,
            scalar_de,
            reduce_g,
            reduce_d,
            corr_g,
            corr_d,
            snapshot: None,
        }
    }

    pub fn config(&self) -> NetConfig {
        self.cfg
    }

    /// Every tensor as a named dynamic view, in the declared order used for
    /// hashing and equality: left, right, scalar (Gi, Di, Ge, De), reduce
    /// (G, D), bias, correction (G, D).
    pub(crate) fn tensors(&self) -> Vec<(String, ArrayViewD<'_, i8>)> {
        let mut out = Vec::with_capacity(3 * self.left.len() + 8);
        for (index, t) in self.left.iter().enumerate() {
            out.push((format!("M-G{index}"), t.view().into_dyn()));
        }
        for (index, t) in self.right.iter().enumerate() {
            out.push((format!("M-D{index}"), t.view().into_dyn()));
        }
        out.push(("R-Gi".to_string(), self.scalar_gi.view().into_dyn()));
        out.push(("R-Di".to_string(), self.scalar_di.view().into_dyn()));
        out.push(("R-Ge".to_string(), self.scalar_ge.view().into_dyn()));
        out.push(("R-De".to_string(), self.scalar_de.view().into_dyn()));
        out.push(("RM-G".to_string(), self.reduce_g.view().into_dyn()));
        out.push(("RM-D".to_string(), self.reduce_d.view().into_dyn()));
        for (index, t) in self.bias.iter().enumerate() {
            out.push((format!("B{index}"), t.view().into_dyn()));
        }
        out.push(("R-G".to_string(), self.corr_g.view().into_dyn()));
        out.push(("R-D".to_string(), self.corr_d.view().into_dyn()));
        out
    }

    /// Stable content hash, recomputed on demand.
    pub fn content_hash(&self) -> NetworkId {
        let mut hasher = blake3::Hasher::new();
        for (_, view) in self.tensors() {
            let data = view.to_slice().unwrap();
            hasher.update(bytemuck::cast_slice(data));
        }
        NetworkId(*hasher.finalize().as_bytes())
    }

    /// Elementwise near-equality across every tensor group. Networks of
    /// different shapes are never equal.
    pub fn approx_eq(&self, other: &Network, tolerance: i16) -> bool {
        let ours = self.tensors();
        let theirs = other.tensors();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.iter().zip(theirs.iter()).all(|((_, a), (_, b))| {
            a.shape() == b.shape()
                && a.iter()
                    .zip(b.iter())
                    .all(|(&x, &y)| (x as i16 - y as i16).abs() <= tolerance)
        })
    }

    /// Checkpoints the weight groups the evaluator mutates (left/right).
    /// Call at game start.
    pub fn new_game(&mut self) {
        self.snapshot = Some(Snapshot {
            left: self.left.clone(),
            right: self.right.clone(),
        });
    }

    /// Restores the left/right weights exactly as they were at the last
    /// [`Network::new_game`]. Call at game end; a no-op without a snapshot.
    pub fn game_end(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.left = snapshot.left;
            self.right = snapshot.right;
        }
    }
}

impl Clone for Network {
    fn clone(&self) -> Self {
        Self {
            cfg: self.cfg,
            left: self.left.clone(),
            right: self.right.clone(),
            bias: self.bias.clone(),
            scalar_gi: self.scalar_gi.clone(),
            scalar_di: self.scalar_di.clone(),
            scalar_ge: self.scalar_ge.clone(),
            scalar_de: self.scalar_de.clone(),
            reduce_g: self.reduce_g.clone(),
            reduce_d: self.reduce_d.clone(),
            corr_g: self.corr_g.clone(),
            corr_d: self.corr_d.clone(),
            snapshot: None,
        }
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Network({})", self.content_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn hash_is_stable_without_mutation() {
        let net = Network::random(NetConfig::default(), 255, &mut seeded(1));
        assert_eq!(net.content_hash(), net.content_hash());
    }

    #[test]
    fn hash_changes_on_any_element_change() {
        let mut net = Network::random(NetConfig::default(), 255, &mut seeded(2));
        let before = net.content_hash();
        let old = net.bias[3][[4, 4, 7, 7]];
        net.bias[3][[4, 4, 7, 7]] = old.wrapping_add(1);
        assert_ne!(net.content_hash(), before);
    }

    #[test]
    fn distinct_seeds_give_distinct_networks() {
        let a = Network::random(NetConfig::default(), 255, &mut seeded(3));
        let b = Network::random(NetConfig::default(), 255, &mut seeded(4));
        assert_ne!(a.content_hash(), b.content_hash());
        assert!(!a.approx_eq(&b, 0));
    }

    #[test]
    fn approx_eq_respects_tolerance() {
        let a = Network::random(NetConfig::default(), 100, &mut seeded(5));
        let mut b = a.clone();
        assert!(a.approx_eq(&b, 0));

        b.left[0][[0, 0, 0, 0]] = b.left[0][[0, 0, 0, 0]].wrapping_add(2);
        assert!(!a.approx_eq(&b, 0));
        assert!(!a.approx_eq(&b, 1));
        assert!(a.approx_eq(&b, 2));
    }

    #[test]
    fn snapshot_restores_left_right_exactly() {
        let mut net = Network::random(NetConfig::default(), 255, &mut seeded(6));
        let before = net.content_hash();

        net.new_game();
        for layer in 0..net.cfg.layer_count() {
            net.left[layer].mapv_inplace(|v| v.wrapping_add(17));
            net.right[layer].mapv_inplace(|v| v.wrapping_sub(5));
        }
        assert_ne!(net.content_hash(), before);

        net.game_end();
        assert_eq!(net.content_hash(), before);
    }

    #[test]
    fn game_end_without_snapshot_is_a_no_op() {
        let mut net = Network::random(NetConfig::default(), 255, &mut seeded(7));
        let before = net.content_hash();
        net.game_end();
        assert_eq!(net.content_hash(), before);
    }

    #[test]
    fn random_respects_bound() {
        let net = Network::random(NetConfig::default(), 10, &mut seeded(8));
        for (_, view) in net.tensors() {
            assert!(view.iter().all(|&v| (0..10).contains(&(v as i16))));
        }
    }
}
