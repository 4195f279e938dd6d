use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use safetensors::SafeTensorError;

/// The network crate's result type.
pub type Result<T> = std::result::Result<T, NetworkErr>;

/// Failures while building, persisting or loading a network.
#[derive(Debug)]
pub enum NetworkErr {
    Io(io::Error),
    Container(SafeTensorError),
    MissingTensor {
        name: String,
    },
    ShapeMismatch {
        name: String,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    UnsupportedDtype {
        name: String,
        dtype: String,
    },
    InvalidDistribution(String),
}

impl Display for NetworkErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErr::Io(e) => write!(f, "io error: {e}"),
            NetworkErr::Container(e) => write!(f, "tensor container error: {e}"),
            NetworkErr::MissingTensor { name } => {
                write!(f, "required tensor {name} is missing from the container")
            }
            NetworkErr::ShapeMismatch {
                name,
                got,
                expected,
            } => write!(
                f,
                "tensor {name} has shape {got:?}, expected {expected:?}"
            ),
            NetworkErr::UnsupportedDtype { name, dtype } => {
                write!(f, "tensor {name} has unsupported element type {dtype}")
            }
            NetworkErr::InvalidDistribution(detail) => {
                write!(f, "invalid direction distribution: {detail}")
            }
        }
    }
}

impl Error for NetworkErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NetworkErr::Io(e) => Some(e),
            NetworkErr::Container(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for NetworkErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<SafeTensorError> for NetworkErr {
    fn from(value: SafeTensorError) -> Self {
        Self::Container(value)
    }
}
