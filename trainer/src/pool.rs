//! Cohort generation: the incumbent, one mutation per configured
//! magnitude, and one fresh random network.

use std::fmt;

use rand::Rng;

use network::{DirectionSet, Network, NetworkId};

use crate::config::TrainerConfig;
use crate::error::Result;

/// Where a cohort member came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    First,
    Mutation,
    Random,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::First => "First",
            Provenance::Mutation => "Mutation",
            Provenance::Random => "Random",
        };
        f.write_str(name)
    }
}

/// One cohort member. The id is computed at build time; the
/// snapshot/restore bracket around every game keeps it valid for the whole
/// tournament.
pub struct Member {
    pub network: Network,
    pub id: NetworkId,
    pub provenance: Provenance,
}

impl Member {
    fn new(network: Network, provenance: Provenance) -> Self {
        let id = network.content_hash();
        Self {
            network,
            id,
            provenance,
        }
    }
}

/// Builds the iteration cohort from the incumbent and this iteration's
/// shared direction bundle. Order: incumbent first, mutations in magnitude
/// order, the random member last.
pub fn build_cohort(
    cfg: &TrainerConfig,
    incumbent: &Network,
    directions: &DirectionSet,
    rng: &mut impl Rng,
) -> Result<Vec<Member>> {
    let mut cohort = Vec::with_capacity(cfg.magnitudes.len() + 2);
    cohort.push(Member::new(incumbent.clone(), Provenance::First));
    for &magnitude in &cfg.magnitudes {
        cohort.push(Member::new(
            incumbent.mutated(directions, magnitude),
            Provenance::Mutation,
        ));
    }
    cohort.push(Member::new(
        Network::random(cfg.net, cfg.random_bound, rng),
        Provenance::Random,
    ));
    Ok(cohort)
}
