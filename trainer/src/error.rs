use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use network::NetworkErr;

/// The trainer crate's result type.
pub type Result<T> = std::result::Result<T, TrainerErr>;

/// Training-session failures.
#[derive(Debug)]
pub enum TrainerErr {
    Io(io::Error),
    Network(NetworkErr),
    Config(serde_json::Error),
    /// No persisted best network and `--from-random` was not requested.
    MissingBestNetwork {
        path: PathBuf,
    },
    InvalidPosition {
        fen: String,
    },
    /// A tournament produced no scores to select from.
    EmptyScoreMap,
}

impl Display for TrainerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainerErr::Io(e) => write!(f, "io error: {e}"),
            TrainerErr::Network(e) => write!(f, "network error: {e}"),
            TrainerErr::Config(e) => write!(f, "config error: {e}"),
            TrainerErr::MissingBestNetwork { path } => write!(
                f,
                "no best network at {}; pass --from-random to start a fresh session",
                path.display()
            ),
            TrainerErr::InvalidPosition { fen } => {
                write!(f, "invalid starting position: {fen}")
            }
            TrainerErr::EmptyScoreMap => {
                write!(f, "tournament finished without any scores")
            }
        }
    }
}

impl Error for TrainerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainerErr::Io(e) => Some(e),
            TrainerErr::Network(e) => Some(e),
            TrainerErr::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<NetworkErr> for TrainerErr {
    fn from(value: NetworkErr) -> Self {
        Self::Network(value)
    }
}

impl From<serde_json::Error> for TrainerErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}

/// Boundary conversion for the trainer binary.
impl From<TrainerErr> for io::Error {
    fn from(value: TrainerErr) -> Self {
        match value {
            TrainerErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
