//! Command-line scanning.
//!
//! The scan is a single pass over the arguments: every recognised flag is
//! collected first, then the result is turned into one immutable [`Command`].

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const HELP: &str = "\
Dl - Print, download or copy website content

Usage:
   dl [--no-overwrite/-o] <url>
   dl {--print/-p | --copy/-c} <url>
   dl {--help/-h | --version/-v}

Options:
   -p, --print          print the content to stdout
   -c, --copy           copy the content to the clipboard
   -o, --no-overwrite   refuse to replace an existing file (default)
   -h, --help           print this help message
   -v, --version        print the version

The scheme may be omitted: <url> is tried as given, then with https://,
then with http://.";

pub fn version() -> String {
    format!("dl {}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Fetch(FetchRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    File,
    Stdout,
    Clipboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overwrite {
    Allow,
    #[default]
    Refuse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub target: String,
    pub output: OutputMode,
    pub overwrite: Overwrite,
}

impl FetchRequest {
    /// Local file name for a plain download: the last segment of the target as typed.
    pub fn file_name(&self) -> Result<PathBuf> {
        file_name_for(&self.target)
    }
}

pub fn file_name_for(target: &str) -> Result<PathBuf> {
    Path::new(target)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| Error::NoFileName(target.to_owned()))
}

#[derive(Default)]
struct Scan {
    help: bool,
    version: bool,
    print: bool,
    copy: bool,
    unknown: Option<String>,
    positionals: Vec<String>,
}

/// Parse the arguments that follow the program name.
pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut scan = Scan::default();
    for arg in args {
        let arg = arg.into();
        match arg.as_str() {
            "-h" | "--help" => scan.help = true,
            "-v" | "--version" => scan.version = true,
            "-p" | "--print" => scan.print = true,
            "-c" | "--copy" => scan.copy = true,
            // refusing to overwrite is already the default
            "-o" | "--no-overwrite" => {}
            flag if flag.starts_with('-') && flag.len() > 1 => {
                scan.unknown.get_or_insert_with(|| flag.to_owned());
            }
            _ => scan.positionals.push(arg),
        }
    }

    if scan.help {
        return Ok(Command::Help);
    }
    if scan.version {
        return Ok(Command::Version);
    }
    if let Some(flag) = scan.unknown {
        return Err(Error::UnknownOption(flag));
    }
    if scan.print && scan.copy {
        return Err(Error::ConflictingModes);
    }

    let mut positionals = scan.positionals.into_iter();
    let target = match (positionals.next(), positionals.next()) {
        (Some(target), None) => target,
        _ => return Err(Error::InvalidArgCount),
    };

    let output = if scan.print {
        OutputMode::Stdout
    } else if scan.copy {
        OutputMode::Clipboard
    } else {
        OutputMode::File
    };
    Ok(Command::Fetch(FetchRequest {
        target,
        output,
        overwrite: Overwrite::default(),
    }))
}
