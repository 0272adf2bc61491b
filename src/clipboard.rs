//! Clipboard sink backed by a platform helper process.
//!
//! Bytes written to the sink go to the helper's stdin. Closing the sink
//! closes stdin first and only then waits for the helper, because most
//! helpers buffer until EOF.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardHelper {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

pub const PBCOPY: ClipboardHelper = ClipboardHelper {
    program: "pbcopy",
    args: &[],
};

pub const POWERSHELL: ClipboardHelper = ClipboardHelper {
    program: "powershell.exe",
    args: &[
        "-NoProfile",
        "-Command",
        "Set-Clipboard -Value ([Console]::In.ReadToEnd())",
    ],
};

/// Probed in order on everything that is neither macOS nor Windows.
pub const UNIX_HELPERS: [ClipboardHelper; 4] = [
    ClipboardHelper {
        program: "xclip",
        args: &["-in", "-selection", "clipboard"],
    },
    ClipboardHelper {
        program: "xsel",
        args: &["--input", "--clipboard"],
    },
    ClipboardHelper {
        program: "wl-copy",
        args: &[],
    },
    ClipboardHelper {
        program: "termux-clipboard-set",
        args: &[],
    },
];

/// Pick the helper for the current platform, probing `PATH` where needed.
pub fn detect() -> Result<ClipboardHelper> {
    if cfg!(target_os = "macos") {
        Ok(PBCOPY)
    } else if cfg!(target_os = "windows") {
        Ok(POWERSHELL)
    } else {
        first_available(&UNIX_HELPERS, |program| which::which(program).is_ok())
    }
}

/// First helper in `helpers` for which `is_installed` holds.
pub fn first_available<F>(helpers: &[ClipboardHelper], is_installed: F) -> Result<ClipboardHelper>
where
    F: Fn(&str) -> bool,
{
    helpers
        .iter()
        .copied()
        .find(|helper| is_installed(helper.program))
        .ok_or(Error::ClipboardUnavailable)
}

pub struct ClipboardSink {
    program: String,
    child: Child,
    stdin: ChildStdin,
}

impl ClipboardSink {
    pub fn spawn(helper: ClipboardHelper) -> Result<Self> {
        let program = helper.program.to_owned();
        let child_error = |source: std::io::Error| Error::ChildProcess {
            program: program.clone(),
            source,
        };

        // xclip forks and keeps stdout open; never hand it ours.
        let mut child = Command::new(helper.program)
            .args(helper.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(child_error)?;
        let stdin = child.stdin.take().ok_or_else(|| {
            child_error(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin was not captured",
            ))
        })?;

        tracing::debug!(program = %helper.program, "clipboard helper spawned");
        Ok(Self {
            program,
            child,
            stdin,
        })
    }

    #[cfg(test)]
    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    pub fn writer(&mut self) -> &mut ChildStdin {
        &mut self.stdin
    }

    /// Signal end of input, then wait for the helper to exit.
    pub async fn close(self) -> Result<()> {
        let Self {
            program,
            mut child,
            mut stdin,
        } = self;

        if let Err(source) = stdin.shutdown().await {
            return Err(Error::ChildProcess { program, source });
        }
        drop(stdin);

        let status = match child.wait().await {
            Ok(status) => status,
            Err(source) => return Err(Error::ChildProcess { program, source }),
        };
        if !status.success() {
            return Err(Error::ChildExit { program, status });
        }
        tracing::debug!(%program, "clipboard helper finished");
        Ok(())
    }

    /// Kill the helper so a partial body is not committed, and reap it.
    pub async fn abort(self) {
        let Self {
            program,
            mut child,
            stdin,
        } = self;
        drop(stdin);
        if let Err(err) = child.kill().await {
            tracing::warn!(%program, error = %err, "failed to stop clipboard helper");
        }
    }
}
