use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

// ~65ms between frames.
const REFRESH_HZ: u8 = 15;

const BAR_TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes} ({bytes_per_sec})";

pub(crate) fn calculate_speed_mbps(bytes_len_f64: f64, duration_secs_f64: f64) -> f64 {
    if duration_secs_f64 == 0.0 {
        return 0.0;
    }
    (bytes_len_f64 / 1024.0 / 1024.0) / duration_secs_f64
}

/// Byte counter rendered as a progress bar on stderr.
///
/// Rendering is throttled by indicatif's draw target and suppressed entirely
/// when stderr is not a terminal, so callers may tick it for every chunk.
pub struct ProgressSink {
    pb: ProgressBar,
}

impl ProgressSink {
    pub fn new(expected: Option<u64>) -> Self {
        let target = ProgressDrawTarget::stderr_with_hz(REFRESH_HZ);
        let pb = match expected {
            Some(len) => {
                let pb = ProgressBar::with_draw_target(Some(len), target);
                if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
                    pb.set_style(style.progress_chars("=> "));
                }
                pb
            }
            None => {
                let pb = ProgressBar::with_draw_target(None, target);
                if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
                    pb.set_style(style);
                }
                pb
            }
        };
        pb.set_message("Downloading");
        Self { pb }
    }

    /// A sink that never draws.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn inc(&self, n: u64) {
        self.pb.inc(n);
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(&self) {
        self.pb.finish();
    }

    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

pub fn done_line(copied: u64, elapsed: Duration) -> String {
    format!(
        "done in {:.2?} ({:.2} MB/s)",
        elapsed,
        calculate_speed_mbps(copied as f64, elapsed.as_secs_f64())
    )
}
