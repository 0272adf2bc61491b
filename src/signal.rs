//! Best-effort cleanup of a partial download on Ctrl-C.
//!
//! The guard is armed before the output file is opened, so there is no
//! moment where the file exists and Ctrl-C still has its default action.
//! The watcher races the main flow: it does not cancel the request, it
//! deletes the file and ends the process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Exit code used after an interrupt.
pub const INTERRUPTED_EXIT: i32 = 130;

#[derive(Default)]
struct Claim {
    created: bool,
    interrupted: bool,
}

struct Shared {
    path: PathBuf,
    claim: Mutex<Claim>,
    on_interrupt: Box<dyn Fn(&Path) + Send + Sync>,
}

impl Shared {
    fn remove(&self) {
        tracing::debug!(path = %self.path.display(), "interrupted, removing partial file");
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to remove partial file");
        }
    }

    fn interrupt(&self) {
        let mut claim = self.claim.lock().unwrap_or_else(PoisonError::into_inner);
        claim.interrupted = true;
        // Before the file is ours, the opener finishes the job in `claim`/`abandon`.
        if claim.created {
            self.remove();
            (self.on_interrupt)(&self.path);
        }
    }
}

pub struct InterruptGuard {
    shared: Arc<Shared>,
    disarm: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl InterruptGuard {
    /// Install the Ctrl-C handler now; once [`claim`](Self::claim)ed, an
    /// interrupt deletes `path` and exits the process.
    pub fn arm(path: PathBuf) -> std::io::Result<Self> {
        let trigger = interrupt_signal()?;
        Ok(Self::watch(path, trigger, |path| {
            eprintln!("\ninterrupted, removed {}", path.display());
            std::process::exit(INTERRUPTED_EXIT);
        }))
    }

    /// Watch `trigger`; when it resolves to `true` the guarded file is
    /// removed and `on_interrupt` runs.
    ///
    /// A trigger resolving to `false` leaves the file alone.
    pub fn watch<T, H>(path: PathBuf, trigger: T, on_interrupt: H) -> Self
    where
        T: Future<Output = bool> + Send + 'static,
        H: Fn(&Path) + Send + Sync + 'static,
    {
        let shared = Arc::new(Shared {
            path,
            claim: Mutex::new(Claim::default()),
            on_interrupt: Box::new(on_interrupt),
        });
        let (disarm, disarmed) = oneshot::channel::<()>();

        let watcher = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            tokio::select! {
                fired = trigger => {
                    if fired {
                        watcher.interrupt();
                    } else {
                        tracing::warn!("interrupt handler unavailable");
                    }
                }
                _ = disarmed => {}
            }
        });
        Self {
            shared,
            disarm: Some(disarm),
            task,
        }
    }

    /// The guarded file now exists and belongs to this run.
    ///
    /// An interrupt that arrived while it was being created is handled here.
    pub fn claim(&self) {
        let mut claim = self.shared.claim.lock().unwrap_or_else(PoisonError::into_inner);
        if claim.interrupted {
            self.shared.remove();
            (self.shared.on_interrupt)(&self.shared.path);
        } else {
            claim.created = true;
        }
    }

    /// The file could not be created; stop watching without touching `path`.
    ///
    /// An interrupt that already arrived still ends the run.
    pub async fn abandon(self) {
        let interrupted = self
            .shared
            .claim
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .interrupted;
        if interrupted {
            (self.shared.on_interrupt)(&self.shared.path);
        }
        self.disarm().await;
    }

    /// Stop watching; the file is no longer touched by the guard.
    pub async fn disarm(mut self) {
        if let Some(disarm) = self.disarm.take() {
            let _ = disarm.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.disarm.is_some() {
            self.task.abort();
        }
    }
}

#[cfg(unix)]
fn interrupt_signal() -> std::io::Result<impl Future<Output = bool> + Send + 'static> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    Ok(async move { interrupt.recv().await.is_some() })
}

#[cfg(windows)]
fn interrupt_signal() -> std::io::Result<impl Future<Output = bool> + Send + 'static> {
    let mut interrupt = tokio::signal::windows::ctrl_c()?;
    Ok(async move { interrupt.recv().await.is_some() })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::sync::mpsc;

    fn recorder() -> (
        impl Fn(&Path) + Send + Sync + 'static,
        mpsc::UnboundedReceiver<PathBuf>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (move |p: &Path| {
            let _ = tx.send(p.to_path_buf());
        }, rx)
    }

    #[tokio::test]
    async fn interrupt_removes_a_claimed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");

        let (fire, fired) = oneshot::channel::<()>();
        let (on_interrupt, mut interrupts) = recorder();
        let guard = InterruptGuard::watch(
            path.clone(),
            async move { fired.await.is_ok() },
            on_interrupt,
        );
        std::fs::write(&path, b"half").unwrap();
        guard.claim();

        fire.send(()).unwrap();
        let reported = interrupts.recv().await.unwrap();

        assert_eq!(reported, path);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn interrupt_while_creating_is_handled_on_claim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("racing.bin");

        let (fire, fired) = oneshot::channel::<()>();
        let (on_interrupt, mut interrupts) = recorder();
        let guard = InterruptGuard::watch(
            path.clone(),
            async move { fired.await.is_ok() },
            on_interrupt,
        );

        fire.send(()).unwrap();
        tokio::task::yield_now().await;
        while !guard.shared.claim.lock().unwrap().interrupted {
            tokio::task::yield_now().await;
        }
        assert!(interrupts.try_recv().is_err());

        std::fs::write(&path, b"").unwrap();
        guard.claim();

        assert_eq!(interrupts.recv().await.unwrap(), path);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn interrupt_before_failed_create_keeps_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theirs.txt");
        std::fs::write(&path, b"not ours").unwrap();

        let (fire, fired) = oneshot::channel::<()>();
        let (on_interrupt, mut interrupts) = recorder();
        let guard = InterruptGuard::watch(
            path.clone(),
            async move { fired.await.is_ok() },
            on_interrupt,
        );
        fire.send(()).unwrap();
        while !guard.shared.claim.lock().unwrap().interrupted {
            tokio::task::yield_now().await;
        }

        guard.abandon().await;

        assert_eq!(interrupts.recv().await.unwrap(), path);
        assert_eq!(std::fs::read(&path).unwrap(), b"not ours");
    }

    #[tokio::test]
    async fn disarmed_guard_leaves_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("complete.bin");
        std::fs::write(&path, b"whole").unwrap();

        let (fire, fired) = oneshot::channel::<()>();
        let guard = InterruptGuard::watch(
            path.clone(),
            async move { fired.await.is_ok() },
            |_| panic!("must not fire after disarm"),
        );
        guard.claim();
        guard.disarm().await;
        let _ = fire.send(());

        assert_eq!(std::fs::read(&path).unwrap(), b"whole");
    }

    #[tokio::test]
    async fn failed_trigger_leaves_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept.bin");
        std::fs::write(&path, b"data").unwrap();

        let guard = InterruptGuard::watch(path.clone(), async { false }, |_| {
            panic!("must not fire without a signal")
        });
        guard.claim();
        guard.disarm().await;

        assert!(path.exists());
    }

    #[tokio::test]
    async fn arm_installs_the_handler_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let guard = InterruptGuard::arm(dir.path().join("x")).unwrap();
        guard.disarm().await;
    }
}
