use std::path::PathBuf;
use std::{env, io};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use trainer::{Trainer, TrainerConfig};

const DEFAULT_CONFIG: &str = "data/training/config.json";

#[tokio::main]
async fn main() -> io::Result<()> {
    env_logger::init();

    let mut from_random = false;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--from-random" => from_random = true,
            "--config" => {
                config_path = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| io::Error::other("--config requires a path"))?;
            }
            other => {
                return Err(io::Error::other(format!("unknown argument: {other}")));
            }
        }
    }

    let cfg = TrainerConfig::load_or_default(&config_path)?;
    let trainer = Trainer::new(cfg, from_random, StdRng::from_os_rng())?;

    let token = CancellationToken::new();
    let loop_token = token.clone();
    let session = tokio::task::spawn_blocking(move || trainer.run(&loop_token));

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("received SIGINT, stopping after the current iteration");
            token.cancel();
        }
    });

    let state = session.await.map_err(io::Error::other)??;
    info!(
        "last saved network {}",
        state.incumbent.content_hash()
    );
    Ok(())
}
