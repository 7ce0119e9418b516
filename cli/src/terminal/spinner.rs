use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// Rotating lens.
const TICK_STRINGS: &[&str] = &["(◐)", "(◓)", "(◑)", "(◒)", "(●)"];

fn active() -> MutexGuard<'static, Option<ProgressBar>> {
    SPINNER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shows a spinner until [`stop`] is called. Replaces any spinner already running.
pub fn start(msg: &str) {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(TICK_STRINGS));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    if let Some(previous) = active().replace(pb) {
        previous.finish_and_clear();
    }
}

pub fn report_progress(count: usize) {
    if let Some(pb) = active().as_ref() {
        pb.set_message(format!(
            "Identified {} devices so far...",
            count.to_string().green().bold()
        ));
    }
}

pub fn stop() {
    if let Some(pb) = active().take() {
        pb.finish_and_clear();
    }
}

/// Log sink that prints above the spinner while one is running.
pub struct SpinnerWriter;

impl std::io::Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf);
        let msg = msg.trim_end();
        match active().as_ref() {
            Some(pb) => pb.println(msg),
            None => println!("{msg}"),
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
