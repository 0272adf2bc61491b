//! Destination lifecycle: opened before any network activity, then either
//! committed after a complete transfer or rolled back.

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

use crate::cli::{FetchRequest, OutputMode, Overwrite};
use crate::clipboard::{self, ClipboardSink};
use crate::error::{Error, Result};
use crate::signal::InterruptGuard;

pub enum Destination {
    File(FileOutput),
    Stdout(Stdout),
    Clipboard(ClipboardSink),
}

impl Destination {
    /// Open the destination `request` asks for.
    pub async fn open(request: &FetchRequest) -> Result<Self> {
        match request.output {
            OutputMode::File => {
                let path = request.file_name()?;
                let file = FileOutput::create_guarded(path, request.overwrite).await?;
                Ok(Destination::File(file))
            }
            OutputMode::Stdout => Ok(Destination::Stdout(tokio::io::stdout())),
            OutputMode::Clipboard => {
                let helper = clipboard::detect()?;
                Ok(Destination::Clipboard(ClipboardSink::spawn(helper)?))
            }
        }
    }

    pub fn writer(&mut self) -> &mut (dyn AsyncWrite + Unpin + Send) {
        match self {
            Destination::File(file) => file.writer(),
            Destination::Stdout(stdout) => stdout,
            Destination::Clipboard(sink) => sink.writer(),
        }
    }

    pub async fn commit(self) -> Result<()> {
        match self {
            Destination::File(file) => file.commit().await,
            Destination::Stdout(mut stdout) => Ok(stdout.flush().await?),
            Destination::Clipboard(sink) => sink.close().await,
        }
    }

    pub async fn rollback(self) {
        match self {
            Destination::File(file) => file.rollback().await,
            Destination::Stdout(mut stdout) => {
                let _ = stdout.flush().await;
            }
            Destination::Clipboard(sink) => sink.abort().await,
        }
    }
}

pub struct FileOutput {
    path: PathBuf,
    file: File,
    guard: Option<InterruptGuard>,
}

impl FileOutput {
    /// Create `path`; with [`Overwrite::Refuse`] an existing file is left untouched.
    pub async fn create(path: PathBuf, overwrite: Overwrite) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true);
        match overwrite {
            Overwrite::Allow => options.create(true).truncate(true),
            Overwrite::Refuse => options.create_new(true),
        };

        let file = match options.open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::FileExists(path));
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), "output file created");
        Ok(Self {
            path,
            file,
            guard: None,
        })
    }

    /// Like [`create`](Self::create), but Ctrl-C before commit or rollback
    /// removes the file. The handler is installed before the file is opened.
    pub async fn create_guarded(path: PathBuf, overwrite: Overwrite) -> Result<Self> {
        let guard = match InterruptGuard::arm(path.clone()) {
            Ok(guard) => Some(guard),
            Err(err) => {
                tracing::warn!(error = %err, "cannot watch for Ctrl-C, partial file will not be cleaned up");
                None
            }
        };

        match Self::create(path, overwrite).await {
            Ok(mut out) => {
                if let Some(guard) = &guard {
                    guard.claim();
                }
                out.guard = guard;
                Ok(out)
            }
            Err(err) => {
                if let Some(guard) = guard {
                    guard.abandon().await;
                }
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn writer(&mut self) -> &mut File {
        &mut self.file
    }

    pub async fn commit(mut self) -> Result<()> {
        let written = async {
            self.file.flush().await?;
            self.file.sync_all().await
        }
        .await;
        match written {
            Ok(()) => {
                if let Some(guard) = self.guard.take() {
                    guard.disarm().await;
                }
                Ok(())
            }
            Err(err) => {
                self.rollback().await;
                Err(err.into())
            }
        }
    }

    pub async fn rollback(mut self) {
        if let Some(guard) = self.guard.take() {
            guard.disarm().await;
        }
        let Self { path, file, .. } = self;
        drop(file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "partial file removed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove partial file")
            }
        }
    }
}
