use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code reserved for a missing clipboard helper.
pub const CLIPBOARD_UNAVAILABLE_EXIT: u8 = 2;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid number of arguments")]
    InvalidArgCount,

    #[error("unknown option: {0}")]
    UnknownOption(String),

    #[error("--print and --copy cannot be used together")]
    ConflictingModes,

    #[error("cannot derive a file name from {0:?}")]
    NoFileName(String),

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(
        "no clipboard utility found; install xclip, xsel, wl-clipboard (wl-copy) or Termux:API (termux-clipboard-set)"
    )]
    ClipboardUnavailable,

    #[error("Not overwriting {}. Exiting.", .0.display())]
    FileExists(PathBuf),

    #[error("clipboard helper {program} failed: {source}")]
    ChildProcess {
        program: String,
        source: std::io::Error,
    },

    #[error("clipboard helper {program} exited with {status}")]
    ChildExit { program: String, status: ExitStatus },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ClipboardUnavailable => CLIPBOARD_UNAVAILABLE_EXIT,
            _ => 1,
        }
    }
}
