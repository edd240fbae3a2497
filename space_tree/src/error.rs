//! Crate-wide error type.
//!
//! Lookups that can legitimately miss (`find_by_begin_count`, child links) return `Option`
//! instead of an error; everything here is a genuine failure reported to the caller.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// An argument was outside the range the operation accepts.
    InvalidArgument(String),
    /// A tree archive does not describe a well-formed tree.
    MalformedArchive(String),
    Serialization(String),
    Io(String),
    Config(String),
    /// A wire frame could not be decoded.
    Frame(String),
    /// A distributed traversal was started without any worker.
    NoWorkers,
    /// The path identifier of a dispatched node pair does not name a worker.
    DispatchTarget { target: usize, workers: usize },
    /// Two node pairs mapped to the same worker.
    DuplicateDispatch { target: usize },
    /// A worker reported a failure while running its task.
    Worker { worker: usize, message: String },
    /// A worker went away without replying.
    WorkerLost(usize),
    WorkerTimeout(usize),
    Transport(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::MalformedArchive(msg) => write!(f, "malformed tree archive: {}", msg),
            Error::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Error::Io(msg) => write!(f, "io error: {}", msg),
            Error::Config(msg) => write!(f, "config error: {}", msg),
            Error::Frame(msg) => write!(f, "bad frame: {}", msg),
            Error::NoWorkers => write!(f, "distributed traversal needs at least one worker"),
            Error::DispatchTarget { target, workers } => write!(
                f,
                "path identifier {} does not name one of {} workers (unbalanced recursion?)",
                target, workers
            ),
            Error::DuplicateDispatch { target } => {
                write!(f, "worker {} was already given a task", target)
            }
            Error::Worker { worker, message } => write!(f, "worker {} failed: {}", worker, message),
            Error::WorkerLost(worker) => write!(f, "worker {} went away without replying", worker),
            Error::WorkerTimeout(worker) => write!(f, "timed out waiting for worker {}", worker),
            Error::Transport(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::Config(e.to_string())
    }
}
