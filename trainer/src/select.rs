//! Winner selection and single-writer persistence.

use std::path::Path;

use log::info;

use network::NetworkId;

use crate::error::{Result, TrainerErr};
use crate::pool::{Member, Provenance};
use crate::tournament::ScoreMap;

/// The selected cohort member for one iteration.
#[derive(Debug, Clone, Copy)]
pub struct Selection {
    pub index: usize,
    pub id: NetworkId,
    pub provenance: Provenance,
    pub score: i64,
}

/// Picks the member with the maximal accumulated score. Ties resolve to the
/// earliest member in cohort order (incumbent, mutations, random).
pub fn pick_winner(members: &[Member], scores: &ScoreMap) -> Result<Selection> {
    let mut winner: Option<Selection> = None;
    for (index, member) in members.iter().enumerate() {
        let score = scores.get(&member.id).copied().unwrap_or(0);
        let beats = match winner {
            Some(current) => score > current.score,
            None => true,
        };
        if beats {
            winner = Some(Selection {
                index,
                id: member.id,
                provenance: member.provenance,
                score,
            });
        }
    }
    winner.ok_or(TrainerErr::EmptyScoreMap)
}

/// Persists the winner as the canonical best network. Only the session-lock
/// holder ever calls this.
pub fn persist_winner(path: &Path, member: &Member) -> Result<()> {
    member.network.save(path)?;
    info!(
        "saved best network {} [{}] to {}",
        member.id,
        member.provenance,
        path.display()
    );
    Ok(())
}
