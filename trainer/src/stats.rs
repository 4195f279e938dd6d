//! Aggregate statistics: per-iteration score summaries and cumulative
//! provenance counters persisted across sessions.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use network::NetworkId;

use crate::error::Result;
use crate::pool::Provenance;
use crate::select::Selection;
use crate::tournament::ScoreMap;

/// Score-map summary for one iteration, exposed for telemetry consumers.
#[derive(Debug, Clone, Copy)]
pub struct IterationStats {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub median: f64,
    pub winner: NetworkId,
    pub provenance: Provenance,
}

/// Summarizes an iteration's score map. An empty map (nothing played this
/// iteration) summarizes to all zeros.
pub fn summarize(scores: &ScoreMap, selection: &Selection) -> IterationStats {
    let mut values: Vec<i64> = scores.values().copied().collect();
    values.sort_unstable();

    if values.is_empty() {
        return IterationStats {
            min: 0,
            max: 0,
            mean: 0.0,
            median: 0.0,
            winner: selection.id,
            provenance: selection.provenance,
        };
    }

    let n = values.len();
    let min = values[0];
    let max = values[n - 1];
    let mean = values.iter().sum::<i64>() as f64 / n as f64;
    let median = if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        (values[n / 2 - 1] + values[n / 2]) as f64 / 2.0
    };

    IterationStats {
        min,
        max,
        mean,
        median,
        winner: selection.id,
        provenance: selection.provenance,
    }
}

/// Cumulative winner counts by provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceCounts {
    #[serde(rename = "First")]
    pub first: u64,
    #[serde(rename = "Mutation")]
    pub mutation: u64,
    #[serde(rename = "Random")]
    pub random: u64,
}

impl ProvenanceCounts {
    pub fn bump(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::First => self.first += 1,
            Provenance::Mutation => self.mutation += 1,
            Provenance::Random => self.random += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.first + self.mutation + self.random
    }

    fn merge(&mut self, other: &ProvenanceCounts) {
        self.first += other.first;
        self.mutation += other.mutation;
        self.random += other.random;
    }
}

type StatsFile = HashMap<String, ProvenanceCounts>;

/// Loads the cumulative counters recorded for a configuration checksum.
pub fn load_counts(path: &Path, checksum: &str) -> Result<ProvenanceCounts> {
    if !path.exists() {
        return Ok(ProvenanceCounts::default());
    }
    let text = fs::read_to_string(path)?;
    let file: StatsFile = serde_json::from_str(&text)?;
    Ok(file.get(checksum).copied().unwrap_or_default())
}

/// Merges this session's counters into the statistics file under the
/// configuration checksum.
pub fn flush_counts(path: &Path, checksum: &str, session: &ProvenanceCounts) -> Result<()> {
    let mut file: StatsFile = if path.exists() {
        serde_json::from_str(&fs::read_to_string(path)?)?
    } else {
        StatsFile::new()
    };
    file.entry(checksum.to_string())
        .or_default()
        .merge(session);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}
