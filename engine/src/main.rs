use std::io::{self, BufReader};
use std::path::PathBuf;
use std::{env, fs};

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use engine::{uci, Engine};
use network::NetConfig;

const DEFAULT_NETWORK: &str = "data/training/best-network.safetensors";

fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::var("ENGINE_NETWORK")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_NETWORK));

    let mut engine = if fs::metadata(&path).is_ok() {
        let engine = Engine::from_file(NetConfig::default(), &path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        info!("loaded network from {}", path.display());
        engine
    } else {
        info!("no network at {}, playing with random weights", path.display());
        Engine::from_random(NetConfig::default(), 255, &mut StdRng::from_os_rng())
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    uci::run(&mut engine, BufReader::new(stdin.lock()), stdout.lock())
}
