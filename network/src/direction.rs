//! Per-iteration mutation directions: one network-shaped bundle of random
//! deltas, scaled by a magnitude to produce each mutated cohort member.

use ndarray::{Array2, Array4};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::config::{NetConfig, BLOCK, EDGE, GRID, LINES, LINE_WIDTH};
use crate::error::{NetworkErr, Result};
use crate::net::Network;

/// Element distribution for direction sampling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DirectionDist {
    /// Independent integers in `[low, high)`.
    Uniform { low: i8, high: i8 },
    /// Independent {0, 1} draws, 1 with probability `p`.
    Bernoulli { p: f64 },
}

enum Sampler {
    Uniform(Uniform<i8>),
    Bernoulli(Bernoulli),
}

impl Sampler {
    fn build(dist: &DirectionDist) -> Result<Self> {
        match *dist {
            DirectionDist::Uniform { low, high } => Ok(Self::Uniform(
                Uniform::new(low, high).map_err(|e| NetworkErr::InvalidDistribution(e.to_string()))?,
            )),
            DirectionDist::Bernoulli { p } => Ok(Self::Bernoulli(
                Bernoulli::new(p).map_err(|e| NetworkErr::InvalidDistribution(e.to_string()))?,
            )),
        }
    }

    fn draw(&self, rng: &mut impl Rng) -> i8 {
        match self {
            Self::Uniform(d) => d.sample(rng),
            Self::Bernoulli(d) => d.sample(rng) as i8,
        }
    }
}

/// One bundle of direction tensors, shaped exactly like a [`Network`].
/// Lifetime: one trainer iteration, shared by the whole cohort.
pub struct DirectionSet {
    left: Vec<Array4<i8>>,
    right: Vec<Array4<i8>>,
    bias: Vec<Array4<i8>>,
    scalar_gi: Array4<i8>,
    scalar_di: Array4<i8>,
    scalar_ge: Array4<i8>,
    scalar_de: Array4<i8>,
    reduce_g: Array2<i8>,
    reduce_d: Array2<i8>,
    corr_g: Array4<i8>,
    corr_d: Array4<i8>,
}

impl DirectionSet {
    /// Samples a fresh bundle with every element drawn independently from
    /// the configured distribution.
    pub fn sample(cfg: &NetConfig, dist: &DirectionDist, rng: &mut impl Rng) -> Result<Self> {
        let sampler = Sampler::build(dist)?;
        let mut grid = |shape: (usize, usize, usize, usize)| {
            Array4::from_shape_simple_fn(shape, || sampler.draw(rng))
        };

        let layers = cfg.layer_count();
        let mut left = Vec::with_capacity(layers);
        let mut right = Vec::with_capacity(layers);
        let mut bias = Vec::with_capacity(layers);
        for _ in 0..layers {
            left.push(grid((GRID, GRID, BLOCK, BLOCK)));
            right.push(grid((GRID, GRID, BLOCK, BLOCK)));
            bias.push(grid((GRID, GRID, BLOCK, BLOCK)));
        }
        let scalar_gi = grid((GRID, GRID, 1, BLOCK));
        let scalar_di = grid((GRID, GRID, BLOCK, 1));
        let scalar_ge = grid((1, GRID, 1, 1));
        let scalar_de = grid((GRID, 1, 1, 1));
        let corr_g = grid((GRID, GRID, BLOCK, BLOCK));
        let corr_d = grid((GRID, GRID, BLOCK, BLOCK));

        let mut flat = |shape: (usize, usize)| {
            Array2::from_shape_simple_fn(shape, || sampler.draw(rng))
        };
        let reduce_g = flat((LINES, EDGE));
        let reduce_d = flat((EDGE, LINE_WIDTH));

        Ok(Self {
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
        })
    }

    /// The all-zero bundle: mutating by it is the identity.
    pub fn zeros(cfg: &NetConfig) -> Self {
        let layers = cfg.layer_count();
        let grid = || Array4::<i8>::zeros((GRID, GRID, BLOCK, BLOCK));
        Self {
            left: (0..layers).map(|_| grid()).collect(),
            right: (0..layers).map(|_| grid()).collect(),
            bias: (0..layers).map(|_| grid()).collect(),
            scalar_gi: Array4::zeros((GRID, GRID, 1, BLOCK)),
            scalar_di: Array4::zeros((GRID, GRID, BLOCK, 1)),
            scalar_ge: Array4::zeros((1, GRID, 1, 1)),
            scalar_de: Array4::zeros((GRID, 1, 1, 1)),
            reduce_g: Array2::zeros((LINES, EDGE)),
            reduce_d: Array2::zeros((EDGE, LINE_WIDTH)),
            corr_g: grid(),
            corr_d: grid(),
        }
    }
}

fn offset4(target: &mut Array4<i8>, direction: &Array4<i8>, magnitude: u8) {
    target.zip_mut_with(direction, |t, &d| {
        *t = t.wrapping_add((d as u8).wrapping_mul(magnitude) as i8);
    });
}

fn offset2(target: &mut Array2<i8>, direction: &Array2<i8>, magnitude: u8) {
    target.zip_mut_with(direction, |t, &d| {
        *t = t.wrapping_add((d as u8).wrapping_mul(magnitude) as i8);
    });
}

impl Network {
    /// `self + magnitude * directions`, elementwise with wrapping
    /// arithmetic across every tensor group. Shapes must match; direction
    /// bundles are always built from the same configuration.
    pub fn mutated(&self, directions: &DirectionSet, magnitude: u8) -> Network {
        let mut out = self.clone();
        for layer in 0..out.cfg.layer_count() {
            offset4(&mut out.left[layer], &directions.left[layer], magnitude);
            offset4(&mut out.right[layer], &directions.right[layer], magnitude);
            offset4(&mut out.bias[layer], &directions.bias[layer], magnitude);
        }
        offset4(&mut out.scalar_gi, &directions.scalar_gi, magnitude);
        offset4(&mut out.scalar_di, &directions.scalar_di, magnitude);
        offset4(&mut out.scalar_ge, &directions.scalar_ge, magnitude);
        offset4(&mut out.scalar_de, &directions.scalar_de, magnitude);
        offset2(&mut out.reduce_g, &directions.reduce_g, magnitude);
        offset2(&mut out.reduce_d, &directions.reduce_d, magnitude);
        offset4(&mut out.corr_g, &directions.corr_g, magnitude);
        offset4(&mut out.corr_d, &directions.corr_d, magnitude);
        out
    }
}
