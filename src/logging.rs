use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::workspaces::state_dir;

const LOG_FILE: &str = "taskcation.log";
const LOG_ENV: &str = "TASKCATION_LOG";

pub fn log_path() -> PathBuf {
	state_dir().join(LOG_FILE)
}

/// Sends `tracing` output to the log file so the dashboard's screen stays clean.
/// Runs without logging when the file cannot be opened.
pub fn init() {
	let path = log_path();
	if let Err(err) = init_at(&path) {
		eprintln!("warning: logging disabled, cannot open {}: {err}", path.display());
	}
}

fn init_at(path: &Path) -> Result<(), std::io::Error> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	let file = OpenOptions::new().create(true).append(true).open(path)?;

	let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
	// A second init in the same process keeps the first subscriber.
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(Mutex::new(file))
		.with_ansi(false)
		.with_target(false)
		.try_init();
	Ok(())
}
