//! The training loop: mutate, generate, play, select, repeat until
//! cancelled between iterations.

use log::{debug, info};
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;

use network::{DirectionSet, Network};

use crate::config::TrainerConfig;
use crate::error::{Result, TrainerErr};
use crate::lock::SessionLock;
use crate::pool::build_cohort;
use crate::select::{persist_winner, pick_winner};
use crate::state::{Phase, TrainerState};
use crate::stats::{flush_counts, summarize};
use crate::tournament;

pub struct Trainer {
    cfg: TrainerConfig,
    state: TrainerState,
    phase: Phase,
    rng: StdRng,
}

impl Trainer {
    /// Loads the incumbent and prepares a session. The incumbent comes from
    /// the persisted best network; a missing file is fatal unless
    /// `from_random` requests a fresh start.
    pub fn new(cfg: TrainerConfig, from_random: bool, mut rng: StdRng) -> Result<Self> {
        let best_path = cfg.best_network_path();
        let incumbent = if best_path.exists() {
            let network = Network::load(cfg.net, &best_path)?;
            info!("loaded network {}", network.content_hash());
            network
        } else if from_random {
            info!("no persisted network, starting from random");
            Network::random(cfg.net, cfg.random_bound, &mut rng)
        } else {
            return Err(TrainerErr::MissingBestNetwork { path: best_path });
        };

        Ok(Self {
            cfg,
            state: TrainerState::new(incumbent),
            phase: Phase::Idle,
            rng,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// Acquires the exclusive session lock, blocking until it is free.
    /// The loop never leaves `Idle` without it.
    pub fn acquire_lock(&mut self) -> Result<()> {
        let lock = SessionLock::acquire(&self.cfg.lock_path())?;
        self.state.lock = Some(lock);
        Ok(())
    }

    /// One full iteration: directions, cohort, tournament, selection and
    /// promotion. Callers hold the session lock (see [`Trainer::run`]).
    pub fn step(&mut self) -> Result<()> {
        self.state.iterations += 1;

        self.phase = Phase::Mutating;
        let directions =
            DirectionSet::sample(&self.cfg.net, &self.cfg.direction, &mut self.rng)?;

        self.phase = Phase::Generating;
        let mut cohort =
            build_cohort(&self.cfg, &self.state.incumbent, &directions, &mut self.rng)?;
        debug!("generated cohort of {}", cohort.len());

        self.phase = Phase::Playing;
        let scores = tournament::run(&self.cfg, &mut cohort, &mut self.rng)?;

        self.phase = Phase::Selecting;
        let selection = pick_winner(&cohort, &scores)?;
        persist_winner(&self.cfg.best_network_path(), &cohort[selection.index])?;

        let stats = summarize(&scores, &selection);
        info!(
            "iteration {}: winner {} [{}] score {} (min {} max {} mean {:.1} median {:.1})",
            self.state.iterations,
            selection.id,
            selection.provenance,
            selection.score,
            stats.min,
            stats.max,
            stats.mean,
            stats.median,
        );

        self.state.counts.bump(selection.provenance);
        self.state.series.push(stats);
        self.state.incumbent = cohort.swap_remove(selection.index).network;
        Ok(())
    }

    /// Runs iterations until the token cancels, then flushes statistics,
    /// releases the lock and returns the final state. Cancellation is
    /// observed only between iterations; a game in progress always
    /// completes.
    pub fn run(mut self, cancel: &CancellationToken) -> Result<TrainerState> {
        self.acquire_lock()?;
        info!(
            "starting training session ({} cohort slots, {} depths, {} positions)",
            self.cfg.magnitudes.len() + 2,
            self.cfg.depths.len(),
            self.cfg.positions.len(),
        );

        while !cancel.is_cancelled() {
            self.step()?;
        }

        self.phase = Phase::Stopped;
        flush_counts(
            &self.cfg.stats_path(),
            &self.cfg.checksum(),
            &self.state.counts,
        )?;

        let counts = self.state.counts;
        info!(
            "ending training session ({} iterations; winners: first {}, mutation {}, random {})",
            self.state.iterations, counts.first, counts.mutation, counts.random,
        );

        if let Some(lock) = self.state.lock.take() {
            lock.release();
        }
        Ok(self.state)
    }
}
